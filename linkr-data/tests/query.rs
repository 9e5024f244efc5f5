use linkr_data::schema::{EntityDef, Field, Relationship, SchemaRegistry};
use linkr_data::{DataError, PageLimits, QueryPlanner};
use serde_json::json;

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .register(
            EntityDef::new("sports")
                .natural_id("shortcut")
                .field(Field::text("shortcut").column("sp_code").filterable())
                .field(Field::text("name").column("sp_name").sortable()),
        )
        .unwrap();
    registry
        .register(
            EntityDef::new("courses")
                .source("course_view")
                .surrogate_id("crs_id")
                .field(Field::integer("id").column("crs_id"))
                .field(Field::integer("number").column("crs_nr").filterable().sortable())
                .field(Field::integer("semester").column("crs_sem"))
                .field(Field::boolean("cancelled").column("crs_cancel").filterable())
                .relation(Relationship::to_one("sport", "sports", "crs_sport").via_natural_key("sport_code")),
        )
        .unwrap();
    registry
}

fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
    raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn planner() -> QueryPlanner {
    QueryPlanner::new(PageLimits {
        default_size: 10,
        max_size: 50,
    })
}

fn validation_field(err: DataError) -> String {
    match err {
        DataError::Validation { field, .. } => field,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn defaults_to_first_page_sorted_by_identifier() {
    let registry = registry();
    let courses = registry.resolve("courses").unwrap();
    let q = planner().plan_collection(courses, &[]).unwrap();

    assert_eq!(q.entity(), "courses");
    assert_eq!(q.source(), "course_view");
    assert_eq!(q.page().offset(), 0);
    assert_eq!(q.page().limit(), 10);
    assert_eq!(q.page().number(), Some(1));
    assert_eq!(q.order().len(), 1);
    assert_eq!(q.order()[0].column, "crs_id");
    assert!(q.columns().contains(&"sport_code".to_string()));
}

#[test]
fn filters_are_coerced_and_mapped_to_columns() {
    let registry = registry();
    let courses = registry.resolve("courses").unwrap();
    let q = planner()
        .plan_collection(courses, &pairs(&[("filter[number]", "42"), ("filter[cancelled]", "false")]))
        .unwrap();

    assert_eq!(q.filters().len(), 2);
    assert_eq!(q.filters()[0].column, "crs_nr");
    assert_eq!(q.filters()[0].value, json!(42));
    assert_eq!(q.filters()[1].value, json!(false));
    assert_eq!(
        q.echo(),
        &[
            ("filter[number]".to_string(), "42".to_string()),
            ("filter[cancelled]".to_string(), "false".to_string()),
        ]
    );
}

#[test]
fn non_filterable_field_names_the_field() {
    let registry = registry();
    let courses = registry.resolve("courses").unwrap();
    let err = planner()
        .plan_collection(courses, &pairs(&[("filter[semester]", "9")]))
        .unwrap_err();
    assert_eq!(validation_field(err), "semester");
}

#[test]
fn unknown_field_and_bad_value_are_validation_errors() {
    let registry = registry();
    let courses = registry.resolve("courses").unwrap();
    let err = planner()
        .plan_collection(courses, &pairs(&[("filter[color]", "red")]))
        .unwrap_err();
    assert_eq!(validation_field(err), "color");

    let err = planner()
        .plan_collection(courses, &pairs(&[("filter[number]", "forty-two")]))
        .unwrap_err();
    assert_eq!(validation_field(err), "number");
}

#[test]
fn descending_sort_then_identifier_tiebreak() {
    let registry = registry();
    let courses = registry.resolve("courses").unwrap();
    let q = planner()
        .plan_collection(courses, &pairs(&[("sort", "-number")]))
        .unwrap();
    assert_eq!(q.order().len(), 2);
    assert_eq!(q.order()[0].column, "crs_nr");
    assert!(q.order()[0].descending);
    assert_eq!(q.order()[1].column, "crs_id");
    assert!(q.echo().contains(&("sort".to_string(), "-number".to_string())));
}

#[test]
fn sort_on_unsortable_field_rejected() {
    let registry = registry();
    let courses = registry.resolve("courses").unwrap();
    let err = planner()
        .plan_collection(courses, &pairs(&[("sort", "semester")]))
        .unwrap_err();
    assert_eq!(validation_field(err), "semester");

    let err = planner()
        .plan_collection(courses, &pairs(&[("sort", "number"), ("sort", "id")]))
        .unwrap_err();
    assert_eq!(validation_field(err), "sort");
}

#[test]
fn paging_parameters() {
    let registry = registry();
    let courses = registry.resolve("courses").unwrap();

    let q = planner()
        .plan_collection(courses, &pairs(&[("page", "3"), ("limit", "5")]))
        .unwrap();
    assert_eq!(q.page().offset(), 10);
    assert_eq!(q.page().limit(), 5);

    let q = planner()
        .plan_collection(courses, &pairs(&[("offset", "7"), ("size", "500")]))
        .unwrap();
    assert_eq!(q.page().offset(), 7);
    assert_eq!(q.page().limit(), 50);
    assert_eq!(q.page().number(), None);
}

#[test]
fn invalid_paging_rejected() {
    let registry = registry();
    let courses = registry.resolve("courses").unwrap();
    for (raw, field) in [
        (vec![("page", "0")], "page"),
        (vec![("limit", "0")], "limit"),
        (vec![("offset", "-1")], "offset"),
        (vec![("page", "2"), ("offset", "4")], "offset"),
        (vec![("cursor", "abc")], "cursor"),
        (vec![("offset", "18446744073709551615")], "offset"),
        (vec![("offset", "9223372036854775808")], "offset"),
        (vec![("page", "9223372036854775807")], "page"),
        (vec![("page", "4611686018427387905"), ("limit", "2")], "page"),
    ] {
        let err = planner().plan_collection(courses, &pairs(&raw)).unwrap_err();
        assert_eq!(validation_field(err), field);
    }
}

#[test]
fn largest_offsets_still_plan() {
    let registry = registry();
    let courses = registry.resolve("courses").unwrap();

    let q = planner()
        .plan_collection(courses, &pairs(&[("offset", "9223372036854775807")]))
        .unwrap();
    assert_eq!(q.page().offset(), i64::MAX as u64);

    // (page - 1) * 2 == i64::MAX - 1
    let q = planner()
        .plan_collection(courses, &pairs(&[("page", "4611686018427387904"), ("limit", "2")]))
        .unwrap();
    assert_eq!(q.page().offset(), i64::MAX as u64 - 1);
}

#[test]
fn lookup_by_natural_identifier() {
    let registry = registry();
    let sports = registry.resolve("sports").unwrap();
    let q = planner().plan_lookup(sports, "BAS").unwrap();
    assert_eq!(q.filters()[0].column, "sp_code");
    assert_eq!(q.filters()[0].value, json!("BAS"));
    assert_eq!(q.page().limit(), 2);
}

#[test]
fn natural_identifiers_have_one_spelling() {
    let registry = registry();
    let sports = registry.resolve("sports").unwrap();
    let q = planner().plan_lookup(sports, " BAS").unwrap();
    assert_eq!(q.filters()[0].value, json!(" BAS"));

    let q = planner()
        .plan_collection(sports, &pairs(&[("filter[shortcut]", "BAS ")]))
        .unwrap();
    assert_eq!(q.filters()[0].value, json!("BAS "));
}

#[test]
fn lookup_with_malformed_surrogate_is_not_found() {
    let registry = registry();
    let courses = registry.resolve("courses").unwrap();
    assert!(matches!(
        planner().plan_lookup(courses, "abc"),
        Err(DataError::NotFound(_))
    ));
    let q = planner().plan_lookup(courses, "1").unwrap();
    assert_eq!(q.filters()[0].value, json!(1));
}
