use linkr_data::DataError;

/// Sorts `sqlx` failures into the gateway's two failure classes.
///
/// Transient: the pool timed out or is closed, or the socket or file failed.
/// These become `DataError::BackendUnavailable` and surface as 503, since a
/// retry may succeed. Everything else means the database rejected the
/// statement and becomes `DataError::Backend` (502).
pub trait SqlxErrorExt {
    fn into_data_error(self) -> DataError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_data_error(self) -> DataError {
        if is_transient(&self) {
            return DataError::BackendUnavailable(self.to_string());
        }
        match self {
            sqlx::Error::RowNotFound => DataError::NotFound("No matching row".into()),
            other => DataError::backend(other),
        }
    }
}

fn is_transient(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
    )
}

pub type SqlxResult<T> = Result<T, DataError>;
