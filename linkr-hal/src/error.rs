use linkr_core::HttpError;
use linkr_data::DataError;

/// Every way a hypermedia request can fail.
#[derive(Debug)]
pub enum HalError {
    /// Misdeclared schema or pipeline. Fatal at startup.
    Config(String),
    /// Rejected request parameter.
    Validation { field: String, message: String },
    /// The access gate denied the request.
    Forbidden,
    /// Unknown entity or identifier.
    NotFound(String),
    /// Fetched rows do not match the schema (missing columns, broken identifiers).
    Mapping(String),
    /// Identifier strategy and fetched data disagree; a configuration bug.
    LinkResolution(String),
    /// None of the client's media types can be produced.
    NotAcceptable { offered: Vec<String> },
    BackendUnavailable(String),
    Backend(Box<dyn std::error::Error + Send + Sync>),
    Serialization(serde_json::Error),
}

impl std::fmt::Display for HalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HalError::Config(msg) => write!(f, "Configuration error: {msg}"),
            HalError::Validation { message, .. } => write!(f, "{message}"),
            HalError::Forbidden => write!(f, "Forbidden"),
            HalError::NotFound(msg) => write!(f, "Not found: {msg}"),
            HalError::Mapping(msg) => write!(f, "Mapping error: {msg}"),
            HalError::LinkResolution(msg) => write!(f, "Link resolution error: {msg}"),
            HalError::NotAcceptable { offered } => {
                write!(f, "Not acceptable; offered: {}", offered.join(", "))
            }
            HalError::BackendUnavailable(msg) => write!(f, "Backend unavailable: {msg}"),
            HalError::Backend(err) => write!(f, "Backend error: {err}"),
            HalError::Serialization(err) => write!(f, "Serialization error: {err}"),
        }
    }
}

impl std::error::Error for HalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HalError::Backend(err) => Some(err.as_ref()),
            HalError::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DataError> for HalError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Config(msg) => HalError::Config(msg),
            DataError::Validation { field, message } => HalError::Validation { field, message },
            DataError::NotFound(msg) => HalError::NotFound(msg),
            DataError::BackendUnavailable(msg) => HalError::BackendUnavailable(msg),
            DataError::Backend(err) => HalError::Backend(err),
        }
    }
}

impl From<serde_json::Error> for HalError {
    fn from(err: serde_json::Error) -> Self {
        HalError::Serialization(err)
    }
}

impl From<HalError> for HttpError {
    fn from(err: HalError) -> Self {
        match err {
            HalError::Validation { field, message } => HttpError::Validation { field, message },
            HalError::Forbidden => HttpError::Forbidden,
            HalError::NotFound(msg) => HttpError::NotFound(msg),
            HalError::NotAcceptable { offered } => HttpError::NotAcceptable {
                message: "None of the requested media types can be produced".into(),
                offered,
            },
            HalError::BackendUnavailable(msg) => HttpError::ServiceUnavailable(msg),
            HalError::Backend(err) => HttpError::BadGateway(err.to_string()),
            other @ (HalError::Config(_)
            | HalError::Mapping(_)
            | HalError::LinkResolution(_)
            | HalError::Serialization(_)) => HttpError::Internal(other.to_string()),
        }
    }
}
