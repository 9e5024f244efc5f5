mod common;

use linkr_data::{PageMeta, PageRequest};
use linkr_hal::{
    Collection, EnvelopeSerializer, HalJson, LinkBase, LinkResolver, PlainJson, Resource, ResourceMapper,
};
use serde_json::{json, Value};

use common::{course_row, registry};

fn course(id: i64) -> Resource {
    let registry = registry();
    let courses = registry.resolve("courses").unwrap();
    let resolver = LinkResolver::new(registry.clone(), LinkBase::new("http://localhost/", false).unwrap());
    let row = course_row(id, "Basketball Beginners", Some((7, "BAS")), Some(2));
    Resource {
        entity: "courses".into(),
        fields: ResourceMapper.map(courses, &row).unwrap(),
        links: resolver.resource_links(courses, &row).unwrap(),
    }
}

fn collection() -> Collection {
    let registry = registry();
    let courses = registry.resolve("courses").unwrap();
    let resolver = LinkResolver::new(registry.clone(), LinkBase::new("http://localhost/", false).unwrap());
    let planner = linkr_data::QueryPlanner::default();
    let query = planner.plan_collection(courses, &[]).unwrap();
    let page = PageMeta::new(PageRequest::numbered(1, 20), 2, false, Some(2));
    Collection {
        entity: "courses".into(),
        rel: "courses".into(),
        items: vec![course(1), course(2)],
        links: resolver.collection_links(courses, &query, &page),
        page,
    }
}

fn parse(bytes: Vec<u8>) -> Value {
    serde_json::from_slice(&bytes).unwrap()
}

#[test]
fn hal_resource_shape() {
    let doc = parse(HalJson.resource(&course(1)).unwrap());
    assert_eq!(doc["id"], json!(1));
    assert_eq!(doc["title"], json!("Basketball Beginners"));
    assert_eq!(doc["_links"]["self"]["href"], json!("/courses/1"));
    assert_eq!(doc["_links"]["sport"]["href"], json!("/sports/BAS"));
    assert!(doc.get("links").is_none());
    assert!(doc.get("c_internal_note").is_none());
    assert!(doc.get("c_sport_id").is_none());
}

#[test]
fn hal_keeps_field_order() {
    let doc = parse(HalJson.resource(&course(1)).unwrap());
    let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["id", "title", "semester", "_links"]);
}

#[test]
fn hal_collection_embeds_items() {
    let doc = parse(HalJson.collection(&collection()).unwrap());
    let items = doc["_embedded"]["courses"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1]["_links"]["self"]["href"], json!("/courses/2"));
    assert_eq!(doc["_links"]["item"], json!({ "href": "/courses/{id}", "templated": true }));
    assert_eq!(doc["page"]["total"], json!(2));
    assert_eq!(doc["page"]["count"], json!(2));
    assert_eq!(doc["page"]["number"], json!(1));
}

#[test]
fn plain_resource_shape() {
    let doc = parse(PlainJson.resource(&course(1)).unwrap());
    assert_eq!(doc["links"]["self"], json!({ "href": "/courses/1" }));
    assert_eq!(doc["links"]["hall"], json!({ "href": "/halls/2" }));
    assert!(doc.get("_links").is_none());
}

#[test]
fn plain_collection_uses_results() {
    let doc = parse(PlainJson.collection(&collection()).unwrap());
    assert_eq!(doc["results"].as_array().unwrap().len(), 2);
    assert!(doc["links"].get("item").is_none());
    assert!(doc["links"]["first"]["href"].is_string());
    assert!(doc.get("_embedded").is_none());
}

#[test]
fn both_envelopes_carry_identical_fields() {
    let resource = course(3);
    let hal = parse(HalJson.resource(&resource).unwrap());
    let plain = parse(PlainJson.resource(&resource).unwrap());
    for (name, value) in &resource.fields {
        assert_eq!(&hal[name], value);
        assert_eq!(&plain[name], value);
    }
}

#[test]
fn serialization_is_deterministic() {
    let resource = course(1);
    assert_eq!(HalJson.resource(&resource).unwrap(), HalJson.resource(&resource).unwrap());
}
