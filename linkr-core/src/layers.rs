use tower_http::catch_panic::CatchPanicLayer;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::http::header::{ACCEPT, AUTHORIZATION};
use crate::http::response::{IntoResponse, Response};
use crate::http::{Method, StatusCode};

/// Install a global `fmt` subscriber filtered by `RUST_LOG`.
///
/// Defaults to `info,tower_http=debug` when `RUST_LOG` is unset or invalid.
/// Calling it twice is harmless; the second install is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// A `TraceLayer` for HTTP request/response tracing.
pub fn default_trace() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// CORS for a read-only API: any origin, `GET`/`HEAD` only.
pub fn default_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD])
        .allow_headers([ACCEPT, AUTHORIZATION])
}

/// Converts handler panics into a JSON 500 response.
pub fn catch_panic_layer() -> CatchPanicLayer<fn(Box<dyn std::any::Any + Send>) -> Response> {
    CatchPanicLayer::custom(panic_handler as fn(_) -> _)
}

fn panic_handler(_err: Box<dyn std::any::Any + Send>) -> Response {
    tracing::error!("request handler panicked");
    let body = serde_json::json!({ "error": "Internal error" });
    (StatusCode::INTERNAL_SERVER_ERROR, crate::http::Json(body)).into_response()
}
