use linkr_core::guards::{
    AccessGate, Action, AllowAll, AnonymousResolver, Decision, Identity, Principal,
    PrincipalResolver, RoleAccessGate, StaticTokenResolver,
};
use linkr_core::http::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use linkr_core::HttpError;

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

#[test]
fn anonymous_has_no_identity() {
    let p = Principal::Anonymous;
    assert_eq!(p.sub(), "");
    assert!(p.roles().is_empty());
    assert!(p.is_anonymous());
}

#[test]
fn authenticated_roles() {
    let p = Principal::authenticated("staff-1", ["staff"]);
    assert_eq!(p.sub(), "staff-1");
    assert!(p.has_role("staff"));
    assert!(!p.has_role("admin"));
}

#[tokio::test]
async fn allow_all_allows() {
    let decision = AllowAll
        .authorize(&Principal::Anonymous, "courses", Action::List)
        .await;
    assert_eq!(decision, Decision::Allow);
}

#[tokio::test]
async fn role_gate_requires_role_for_listed_entity() {
    let gate = RoleAccessGate::allow_by_default().require("enrollments", &["staff"]);

    let student = Principal::authenticated("s", ["student"]);
    let staff = Principal::authenticated("t", ["staff"]);

    assert_eq!(
        gate.authorize(&student, "enrollments", Action::List).await,
        Decision::Deny
    );
    assert_eq!(
        gate.authorize(&Principal::Anonymous, "enrollments", Action::Retrieve).await,
        Decision::Deny
    );
    assert_eq!(
        gate.authorize(&staff, "enrollments", Action::List).await,
        Decision::Allow
    );
    assert_eq!(
        gate.authorize(&student, "courses", Action::List).await,
        Decision::Allow
    );
}

#[tokio::test]
async fn role_gate_deny_by_default_covers_unknown_entities() {
    let gate = RoleAccessGate::deny_by_default().require("courses", &["student", "staff"]);
    let student = Principal::authenticated("s", ["student"]);
    assert!(gate.authorize(&student, "courses", Action::List).await.is_allowed());
    assert!(!gate.authorize(&student, "no-such-thing", Action::List).await.is_allowed());
}

#[test]
fn anonymous_resolver() {
    let p = AnonymousResolver.resolve(&bearer("whatever")).unwrap();
    assert!(p.is_anonymous());
}

#[test]
fn static_tokens_resolve() {
    let resolver = StaticTokenResolver::new()
        .with_token("t-staff", Principal::authenticated("t-staff", ["staff"]));

    assert!(resolver.resolve(&HeaderMap::new()).unwrap().is_anonymous());
    assert!(resolver.resolve(&bearer("t-staff")).unwrap().has_role("staff"));
    assert!(matches!(
        resolver.resolve(&bearer("nope")),
        Err(HttpError::Unauthorized(_))
    ));

    let mut basic = HeaderMap::new();
    basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
    assert!(matches!(
        resolver.resolve(&basic),
        Err(HttpError::Unauthorized(_))
    ));
}

#[test]
fn token_resolver_from_config() {
    let config = linkr_core::LinkrConfig::from_yaml_str(
        r#"
linkr:
  security:
    tokens:
      staff-token: "ana:staff,admin"
      guest-token: "guest"
"#,
        "test",
    )
    .unwrap();
    let resolver = StaticTokenResolver::from_config(&config).unwrap();
    assert_eq!(resolver.len(), 2);
    assert_eq!(
        resolver.resolve(&bearer("staff-token")).unwrap(),
        Principal::authenticated("ana", ["staff", "admin"])
    );
    let guest = resolver.resolve(&bearer("guest-token")).unwrap();
    assert_eq!(guest.sub(), "guest");
    assert!(guest.roles().is_empty());
}

#[test]
fn token_resolver_rejects_missing_subject() {
    let config = linkr_core::LinkrConfig::from_yaml_str(
        "linkr:\n  security:\n    tokens:\n      t1: \":staff\"\n",
        "test",
    )
    .unwrap();
    let err = StaticTokenResolver::from_config(&config).unwrap_err();
    assert!(matches!(err, linkr_core::ConfigError::Invalid { .. }));
}
