mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use linkr_core::http::StatusCode;
use linkr_core::{AccessGate, Action, Decision, HttpError, Principal, RoleAccessGate};
use linkr_data::{MemoryGateway, PageLimits, Row};
use linkr_hal::{HalError, LinkBase, Pipeline, HAL_JSON, PLAIN_JSON};
use serde_json::{json, Value};

use common::{gateway, pairs, registry, sport_row};

fn pipeline(gateway: Arc<MemoryGateway>) -> Pipeline {
    Pipeline::builder(registry())
        .gateway(gateway)
        .limits(PageLimits { default_size: 2, max_size: 10 })
        .build()
        .unwrap()
}

fn body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn lists_a_page_with_links() {
    let pipeline = pipeline(Arc::new(gateway()));
    let out = pipeline
        .list(&Principal::Anonymous, "courses", &[], None)
        .await
        .unwrap();
    assert_eq!(out.media_type, HAL_JSON);

    let doc = body(&out.body);
    let items = doc["_embedded"]["courses"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["_links"]["sport"]["href"], json!("/sports/BAS"));
    assert!(items[1]["_links"].get("sport").is_none());
    assert_eq!(doc["_links"]["next"]["href"], json!("/courses/?page=2&limit=2"));
    assert_eq!(doc["_links"]["last"]["href"], json!("/courses/?page=3&limit=2"));
    assert_eq!(doc["page"]["total"], json!(5));
}

#[tokio::test]
async fn filters_are_applied_and_echoed() {
    let pipeline = pipeline(Arc::new(gateway()));
    let out = pipeline
        .list(&Principal::Anonymous, "courses", &pairs(&[("filter[title]", "Yoga")]), Some(PLAIN_JSON))
        .await
        .unwrap();
    assert_eq!(out.media_type, PLAIN_JSON);

    let doc = body(&out.body);
    let ids: Vec<&Value> = doc["results"].as_array().unwrap().iter().map(|r| &r["id"]).collect();
    assert_eq!(ids, vec![&json!(2), &json!(4)]);
    assert_eq!(doc["links"]["self"]["href"], json!("/courses/?filter%5Btitle%5D=Yoga&page=1&limit=2"));
}

#[tokio::test]
async fn retrieves_by_natural_identifier() {
    let pipeline = pipeline(Arc::new(gateway()));
    let out = pipeline
        .retrieve(&Principal::Anonymous, "sports", "BAS", None)
        .await
        .unwrap();
    let doc = body(&out.body);
    assert_eq!(doc["name"], json!("Basketball"));
    assert_eq!(doc["_links"]["self"]["href"], json!("/sports/BAS"));
}

#[tokio::test]
async fn retrieve_misses_are_not_found() {
    let pipeline = pipeline(Arc::new(gateway()));
    let err = pipeline
        .retrieve(&Principal::Anonymous, "courses", "99", None)
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::NotFound(_)));

    let err = pipeline
        .retrieve(&Principal::Anonymous, "courses", "abc", None)
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::NotFound(_)));

    let err = pipeline
        .list(&Principal::Anonymous, "nothing", &[], None)
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::NotFound(_)));
}

#[tokio::test]
async fn duplicate_natural_key_is_a_mapping_error() {
    let gateway = MemoryGateway::new().with_table(
        "tbl_sport",
        vec![sport_row(1, "BAS", "Basketball"), sport_row(2, "BAS", "Baseball")],
    );
    let pipeline = pipeline(Arc::new(gateway));
    let err = pipeline
        .retrieve(&Principal::Anonymous, "sports", "BAS", None)
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::Mapping(_)), "got {err:?}");
    assert_eq!(HttpError::from(err).status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn denial_happens_before_any_fetch() {
    let gateway = Arc::new(gateway());
    let pipeline = Pipeline::builder(registry())
        .gateway(gateway.clone())
        .gate(Arc::new(RoleAccessGate::allow_by_default().require("courses", &["staff"])))
        .build()
        .unwrap();

    let err = pipeline
        .list(&Principal::Anonymous, "courses", &pairs(&[("filter[bogus]", "1")]), Some("text/html"))
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::Forbidden));
    assert_eq!(gateway.fetches(), 0);

    let staff = Principal::authenticated("ana", ["staff"]);
    pipeline.list(&staff, "courses", &[], None).await.unwrap();
    assert_eq!(gateway.fetches(), 1);
}

struct DenyAll(AtomicUsize);

#[async_trait]
impl AccessGate for DenyAll {
    async fn authorize(&self, _principal: &Principal, _entity: &str, _action: Action) -> Decision {
        self.0.fetch_add(1, Ordering::SeqCst);
        Decision::Deny
    }
}

#[tokio::test]
async fn denial_does_not_reveal_existence() {
    let gate = Arc::new(DenyAll(AtomicUsize::new(0)));
    let pipeline = Pipeline::builder(registry())
        .gateway(Arc::new(gateway()))
        .gate(gate.clone())
        .build()
        .unwrap();

    let known = pipeline.retrieve(&Principal::Anonymous, "courses", "1", None).await.unwrap_err();
    let unknown = pipeline.retrieve(&Principal::Anonymous, "secrets", "1", None).await.unwrap_err();
    assert!(matches!(known, HalError::Forbidden));
    assert!(matches!(unknown, HalError::Forbidden));
    assert_eq!(gate.0.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn rejected_parameters_never_reach_the_gateway() {
    let gateway = Arc::new(gateway());
    let pipeline = pipeline(gateway.clone());

    let err = pipeline
        .list(&Principal::Anonymous, "courses", &pairs(&[("filter[semester]", "2024S")]), None)
        .await
        .unwrap_err();
    match err {
        HalError::Validation { field, .. } => assert_eq!(field, "semester"),
        other => panic!("expected validation error, got {other:?}"),
    }

    let err = pipeline
        .list(&Principal::Anonymous, "courses", &[], Some("text/csv"))
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::NotAcceptable { .. }));
    assert_eq!(gateway.fetches(), 0);
}

#[tokio::test]
async fn backend_outage_surfaces_as_unavailable() {
    let gateway = Arc::new(gateway());
    gateway.set_available(false);
    let pipeline = pipeline(gateway);

    let err = pipeline
        .list(&Principal::Anonymous, "halls", &[], None)
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::BackendUnavailable(_)));
    assert_eq!(HttpError::from(err).status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn rows_missing_declared_columns_fail_mapping() {
    let gateway = MemoryGateway::new().with_table("halls", vec![Row::new().with("h_id", 1)]);
    let pipeline = pipeline(Arc::new(gateway));

    let err = pipeline
        .retrieve(&Principal::Anonymous, "halls", "1", None)
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::Mapping(_)), "got {err:?}");
}

#[tokio::test]
async fn absolute_links_use_configured_base() {
    let pipeline = Pipeline::builder(registry())
        .gateway(Arc::new(gateway()))
        .link_base(LinkBase::new("https://sport.example.org/api/", true).unwrap())
        .build()
        .unwrap();
    let out = pipeline
        .retrieve(&Principal::Anonymous, "courses", "1", None)
        .await
        .unwrap();
    let doc = body(&out.body);
    assert_eq!(doc["_links"]["self"]["href"], json!("https://sport.example.org/api/courses/1"));
    assert_eq!(doc["_links"]["hall"]["href"], json!("https://sport.example.org/api/halls/2"));
}

#[test]
fn builder_requires_a_gateway() {
    let err = Pipeline::builder(registry()).build().unwrap_err();
    assert!(matches!(err, HalError::Config(_)));
}

#[tokio::test]
async fn index_lists_permitted_collections() {
    let pipeline = Pipeline::builder(registry())
        .gateway(Arc::new(gateway()))
        .gate(Arc::new(RoleAccessGate::allow_by_default().require("halls", &["staff"])))
        .build()
        .unwrap();

    let doc = body(&pipeline.index(&Principal::Anonymous, None).await.unwrap().body);
    assert_eq!(doc["_links"]["self"]["href"], json!("/"));
    assert_eq!(doc["_links"]["courses"]["href"], json!("/courses/"));
    assert_eq!(doc["_links"]["sports"]["href"], json!("/sports/"));
    assert!(doc["_links"].get("halls").is_none());

    let staff = Principal::authenticated("ana", ["staff"]);
    let doc = body(&pipeline.index(&staff, None).await.unwrap().body);
    assert_eq!(doc["_links"]["halls"]["href"], json!("/halls/"));
}
