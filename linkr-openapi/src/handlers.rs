use std::sync::Arc;

use linkr_core::http::header::CONTENT_TYPE;
use linkr_core::http::response::IntoResponse;
use linkr_core::http::routing::get;
use linkr_core::http::Router;
use serde_json::Value;

/// Router serving a pre-built document at `GET /openapi.json`.
pub fn openapi_routes<T: Clone + Send + Sync + 'static>(spec: &Value) -> Router<T> {
    let spec_json: Arc<str> = serde_json::to_string_pretty(spec)
        .unwrap_or_else(|_| "{}".to_string())
        .into();

    Router::<T>::new().route(
        "/openapi.json",
        get(move || {
            let json = spec_json.to_string();
            async move { ([(CONTENT_TYPE, "application/json")], json).into_response() }
        }),
    )
}
