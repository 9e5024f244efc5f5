pub use axum::http::header::{
    HeaderName, HeaderValue,
    // Common header constants
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, VARY,
};
pub use axum::http::{HeaderMap, Method, StatusCode};
