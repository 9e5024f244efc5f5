use crate::http::response::{IntoResponse, Response};
use crate::http::{Json, StatusCode};

/// Helper to create a JSON error response with a standard `{ "error": message }` body.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, Json(body)).into_response()
}

/// Transport-level error: every failure leaving a handler ends up here.
///
/// Domain crates keep their own error enums and convert into this one, which
/// owns the status code and the response body shape.
pub enum HttpError {
    NotFound(String),
    Unauthorized(String),
    Forbidden,
    BadRequest(String),
    /// A request parameter was rejected; `field` names the offending parameter.
    Validation { field: String, message: String },
    NotAcceptable { message: String, offered: Vec<String> },
    Internal(String),
    BadGateway(String),
    ServiceUnavailable(String),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HttpError::Forbidden => StatusCode::FORBIDDEN,
            HttpError::BadRequest(_) | HttpError::Validation { .. } => StatusCode::BAD_REQUEST,
            HttpError::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            HttpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HttpError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            HttpError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            // Denials say nothing beyond the denial itself.
            HttpError::Forbidden => error_response(status, "Forbidden"),
            HttpError::Validation { field, message } => {
                let body = serde_json::json!({ "error": message, "field": field });
                (status, Json(body)).into_response()
            }
            HttpError::NotAcceptable { message, offered } => {
                let body = serde_json::json!({ "error": message, "offered": offered });
                (status, Json(body)).into_response()
            }
            HttpError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                error_response(status, "Internal error")
            }
            HttpError::BadGateway(msg) => {
                tracing::error!(error = %msg, "backend error");
                error_response(status, "Bad gateway")
            }
            HttpError::ServiceUnavailable(msg) => {
                tracing::warn!(error = %msg, "backend unavailable");
                error_response(status, "Service unavailable")
            }
            HttpError::NotFound(msg) | HttpError::Unauthorized(msg) | HttpError::BadRequest(msg) => {
                error_response(status, msg)
            }
        }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            HttpError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            HttpError::Forbidden => write!(f, "Forbidden"),
            HttpError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            HttpError::Validation { field, message } => {
                write!(f, "Validation Error on '{field}': {message}")
            }
            HttpError::NotAcceptable { offered, .. } => {
                write!(f, "Not Acceptable: offered {}", offered.join(", "))
            }
            HttpError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            HttpError::BadGateway(msg) => write!(f, "Bad Gateway: {msg}"),
            HttpError::ServiceUnavailable(msg) => write!(f, "Service Unavailable: {msg}"),
        }
    }
}

impl std::fmt::Debug for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for HttpError {}

impl From<crate::params::ParamError> for HttpError {
    fn from(err: crate::params::ParamError) -> Self {
        HttpError::BadRequest(err.message)
    }
}
