/// Errors produced by the schema registry, the query planner, and fetch gateways.
#[derive(Debug)]
pub enum DataError {
    /// The schema was declared inconsistently. Fatal at startup.
    Config(String),
    /// A request parameter was rejected; `field` names the offending parameter.
    Validation { field: String, message: String },
    /// Unknown entity or identifier.
    NotFound(String),
    /// The backend could not be reached; retrying later may help.
    BackendUnavailable(String),
    /// The backend rejected or failed the query.
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl DataError {
    /// Construct a `Backend` variant from any error type.
    ///
    /// Used by gateway crates (e.g. `linkr-data-sqlx`) to wrap driver errors.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Backend(Box::new(err))
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        DataError::Config(msg.into())
    }

    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DataError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Config(msg) => write!(f, "Schema configuration error: {msg}"),
            DataError::Validation { message, .. } => write!(f, "{message}"),
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::BackendUnavailable(msg) => write!(f, "Backend unavailable: {msg}"),
            DataError::Backend(err) => write!(f, "Backend error: {err}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Backend(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<DataError> for linkr_core::HttpError {
    fn from(err: DataError) -> Self {
        use linkr_core::HttpError;
        match err {
            DataError::Config(msg) => HttpError::Internal(msg),
            DataError::Validation { field, message } => HttpError::Validation { field, message },
            DataError::NotFound(msg) => HttpError::NotFound(msg),
            DataError::BackendUnavailable(msg) => HttpError::ServiceUnavailable(msg),
            DataError::Backend(e) => HttpError::BadGateway(e.to_string()),
        }
    }
}
