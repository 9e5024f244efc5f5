//! Entity declarations for the schedule domain.

use linkr::prelude::*;
use linkr::HalError;

/// Sports, halls, teachers, courses and enrollments.
///
/// Courses are read from the `v_course` view, which carries the sport's
/// shortcut next to the foreign key so sport links can use it.
pub fn registry() -> Result<SchemaRegistry, HalError> {
    let mut registry = SchemaRegistry::new();

    registry.register(
        EntityDef::new("sports")
            .source("sport")
            .describe("A sport, addressed by its shortcut (e.g. BAS)")
            .surrogate_id("sp_id")
            .natural_id("shortcut")
            .field(Field::text("shortcut").column("sp_code").filterable().sortable())
            .field(Field::text("name").column("sp_name").filterable().sortable()),
    )?;

    registry.register(
        EntityDef::new("halls")
            .source("hall")
            .surrogate_id("h_id")
            .field(Field::integer("id").column("h_id").sortable())
            .field(Field::text("name").column("h_name").filterable().sortable())
            .field(Field::text("address").column("h_address").nullable()),
    )?;

    registry.register(
        EntityDef::new("teachers")
            .source("teacher")
            .surrogate_id("t_id")
            .field(Field::integer("id").column("t_id").sortable())
            .field(Field::text("first_name").column("t_first_name"))
            .field(Field::text("last_name").column("t_last_name").filterable().sortable())
            // Only published addresses leave the building.
            .field(
                Field::text("email")
                    .computed(Computed::when_flag("t_email", "t_email_public"))
                    .nullable(),
            )
            .hidden("t_password"),
    )?;

    registry.register(
        EntityDef::new("courses")
            .source("v_course")
            .surrogate_id("c_id")
            .field(Field::integer("id").column("c_id").sortable())
            .field(Field::text("title").column("c_title").filterable().sortable())
            .field(Field::text("semester").column("c_semester"))
            .field(Field::integer("weekday").column("c_weekday").filterable().sortable())
            .field(Field::time("starts_at").column("c_start").sortable())
            .field(Field::time("ends_at").column("c_end"))
            .relation(
                Relationship::to_one("sport", "sports", "c_sport_id")
                    .via_natural_key("sport_code")
                    .describe("The sport taught"),
            )
            .relation(Relationship::to_one("hall", "halls", "c_hall_id"))
            .relation(Relationship::to_one("teacher", "teachers", "c_teacher_id")),
    )?;

    registry.register(
        EntityDef::new("enrollments")
            .source("enrollment")
            .describe("Who attends which course. Staff only.")
            .surrogate_id("e_id")
            .field(Field::integer("id").column("e_id").sortable())
            .field(Field::text("student").column("e_student").filterable())
            .relation(Relationship::to_one("course", "courses", "e_course_id")),
    )?;

    Ok(registry)
}

/// Enrollments are restricted to staff; everything else is public.
pub fn access_gate() -> RoleAccessGate {
    RoleAccessGate::allow_by_default().require("enrollments", &["staff"])
}
