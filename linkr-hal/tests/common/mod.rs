#![allow(dead_code)]

use std::sync::Arc;

use linkr_data::{EntityDef, Field, MemoryGateway, Relationship, Row, SchemaRegistry};

pub fn registry() -> Arc<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    registry
        .register(
            EntityDef::new("sports")
                .source("tbl_sport")
                .surrogate_id("sp_id")
                .natural_id("shortcut")
                .field(Field::text("shortcut").column("sp_code"))
                .field(Field::text("name").column("sp_name")),
        )
        .unwrap();
    registry
        .register(
            EntityDef::new("halls")
                .surrogate_id("h_id")
                .field(Field::integer("id").column("h_id"))
                .field(Field::text("name").column("h_name")),
        )
        .unwrap();
    registry
        .register(
            EntityDef::new("courses")
                .surrogate_id("c_id")
                .field(Field::integer("id").column("c_id").sortable())
                .field(Field::text("title").column("c_title").filterable().sortable())
                .field(Field::text("semester").column("c_semester"))
                .hidden("c_internal_note")
                .relation(Relationship::to_one("sport", "sports", "c_sport_id").via_natural_key("sport_code"))
                .relation(Relationship::to_one("hall", "halls", "c_hall_id")),
        )
        .unwrap();
    Arc::new(registry)
}

pub fn sport_row(id: i64, code: &str, name: &str) -> Row {
    Row::new().with("sp_id", id).with("sp_code", code).with("sp_name", name)
}

pub fn course_row(id: i64, title: &str, sport: Option<(i64, &str)>, hall: Option<i64>) -> Row {
    let mut row = Row::new()
        .with("c_id", id)
        .with("c_title", title)
        .with("c_semester", "2024S")
        .with("c_internal_note", "do not show");
    match sport {
        Some((sport_id, code)) => {
            row.insert("c_sport_id", sport_id);
            row.insert("sport_code", code);
        }
        None => {
            row.insert("c_sport_id", serde_json::Value::Null);
            row.insert("sport_code", serde_json::Value::Null);
        }
    }
    row.insert("c_hall_id", hall.map(serde_json::Value::from).unwrap_or_default());
    row
}

pub fn gateway() -> MemoryGateway {
    MemoryGateway::new()
        .with_table(
            "tbl_sport",
            vec![sport_row(7, "BAS", "Basketball"), sport_row(8, "VOL", "Volleyball")],
        )
        .with_table(
            "halls",
            vec![
                Row::new().with("h_id", 1).with("h_name", "North"),
                Row::new().with("h_id", 2).with("h_name", "South"),
            ],
        )
        .with_table(
            "courses",
            vec![
                course_row(1, "Basketball Beginners", Some((7, "BAS")), Some(2)),
                course_row(2, "Yoga", None, Some(1)),
                course_row(3, "Volleyball Mixed", Some((8, "VOL")), None),
                course_row(4, "Yoga", None, None),
                course_row(5, "Basketball Advanced", Some((7, "BAS")), Some(1)),
            ],
        )
}

pub fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
    raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}
