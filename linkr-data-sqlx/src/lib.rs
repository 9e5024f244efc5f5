//! # linkr-data-sqlx
//!
//! SQLx backend for the linkr data layer: a [`SqliteGateway`] implementing
//! `FetchGateway`, and [`SqlxErrorExt`] to bridge `sqlx::Error` into `DataError`.
//!
//! Connection failures and pool timeouts become `DataError::BackendUnavailable`
//! (HTTP 503); every other driver error becomes `DataError::Backend` (HTTP 502).
//!
//! ```ignore
//! use linkr_data_sqlx::SqliteGateway;
//!
//! let gateway = SqliteGateway::connect("sqlite://schedule.db").await?;
//! ```

pub mod error;
#[cfg(feature = "sqlite")]
pub mod gateway;
pub mod sql;

pub use error::{SqlxErrorExt, SqlxResult};
#[cfg(feature = "sqlite")]
pub use gateway::SqliteGateway;
pub use sql::{build_count, build_select, QueryError, Statement};

/// Re-exports of the most commonly used types from both `linkr-data` and this crate.
pub mod prelude {
    #[cfg(feature = "sqlite")]
    pub use crate::SqliteGateway;
    pub use crate::SqlxErrorExt;
    pub use linkr_data::prelude::*;
}
