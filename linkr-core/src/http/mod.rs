//! HTTP types used across linkr. This module is the only place that names `axum`.

pub mod header;

pub use axum::body::Body;
pub use axum::extract::{Path, RawQuery, State};
pub use axum::response;
pub use axum::routing;
pub use axum::{serve, Json, Router};

pub use self::header::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
