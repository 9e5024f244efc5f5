use http_body_util::BodyExt;
use linkr_core::http::{Body, Router, StatusCode};
use linkr_data::{Computed, EntityDef, Field, Relationship, SchemaRegistry};
use linkr_openapi::{build_spec, openapi_routes, OpenApiConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .register(
            EntityDef::new("sports")
                .surrogate_id("sp_id")
                .natural_id("shortcut")
                .field(Field::text("shortcut").column("sp_code").filterable())
                .field(Field::text("name").column("sp_name").sortable()),
        )
        .unwrap();
    registry
        .register(
            EntityDef::new("courses")
                .describe("Courses offered per semester")
                .surrogate_id("c_id")
                .field(Field::integer("id").column("c_id"))
                .field(Field::time("starts").column("c_start").nullable())
                .field(Field::text("contact").computed(Computed::when_flag("c_mail", "c_mail_public")))
                .relation(Relationship::to_one("sport", "sports", "c_sport").via_natural_key("sport_code")),
        )
        .unwrap();
    registry
}

#[test]
fn document_header() {
    let config = OpenApiConfig::new("Schedule", "1.2.0").with_description("Read-only schedule");
    let spec = build_spec(&config, &registry());
    assert_eq!(spec["openapi"], "3.1.0");
    assert_eq!(spec["info"]["title"], "Schedule");
    assert_eq!(spec["info"]["version"], "1.2.0");
    assert_eq!(spec["info"]["description"], "Read-only schedule");
}

#[test]
fn every_entity_has_collection_and_instance_paths() {
    let spec = build_spec(&OpenApiConfig::new("API", "1"), &registry());
    let paths = spec["paths"].as_object().unwrap();
    let keys: Vec<&str> = paths.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["/", "/sports/", "/sports/{id}", "/courses/", "/courses/{id}"]);

    let sport_id = &spec["paths"]["/sports/{id}"]["get"]["parameters"][0];
    assert_eq!(sport_id["schema"]["type"], "string");
    let course_id = &spec["paths"]["/courses/{id}"]["get"]["parameters"][0];
    assert_eq!(course_id["schema"]["type"], "integer");
}

#[test]
fn collection_parameters_follow_capabilities() {
    let spec = build_spec(&OpenApiConfig::new("API", "1"), &registry());
    let params = spec["paths"]["/sports/"]["get"]["parameters"].as_array().unwrap();
    let names: Vec<&str> = params.iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["filter[shortcut]", "sort", "page", "offset", "limit"]);
    assert_eq!(params[1]["schema"]["enum"], json!(["name", "-name"]));

    let course_params = spec["paths"]["/courses/"]["get"]["parameters"].as_array().unwrap();
    assert!(course_params.iter().all(|p| p["name"] != "sort"));
}

#[test]
fn entity_schemas_describe_exposed_fields() {
    let spec = build_spec(&OpenApiConfig::new("API", "1"), &registry());
    let course = &spec["components"]["schemas"]["Courses"];
    assert_eq!(course["description"], "Courses offered per semester");
    assert_eq!(course["properties"]["starts"]["type"], json!(["string", "null"]));
    assert_eq!(course["properties"]["starts"]["format"], "time");
    assert_eq!(course["properties"]["contact"]["readOnly"], true);
    assert!(course["properties"].get("c_sport").is_none());
    assert!(course["properties"].get("sport_code").is_none());
}

#[test]
fn responses_list_offered_media_types() {
    let config = OpenApiConfig::new("API", "1").with_media_types(vec!["application/json".into()]);
    let spec = build_spec(&config, &registry());
    let ok = &spec["paths"]["/courses/{id}"]["get"]["responses"]["200"]["content"];
    assert_eq!(ok.as_object().unwrap().len(), 1);
    assert_eq!(ok["application/json"]["schema"]["$ref"], "#/components/schemas/Courses");
    assert!(spec["paths"]["/courses/"]["get"]["responses"].get("400").is_some());
}

#[tokio::test]
async fn serves_document() {
    let spec = build_spec(&OpenApiConfig::new("API", "1"), &registry());
    let app: Router = openapi_routes(&spec);

    let response = app
        .oneshot(
            http::Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let served: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(served, spec);
}
