use async_trait::async_trait;

use crate::error::DataError;
use crate::query::QueryDescriptor;
use crate::row::Row;

/// Result of executing one query descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    pub rows: Vec<Row>,
    /// Whether rows exist beyond this page.
    pub has_more: bool,
    /// Total matching rows, when the backend can report it cheaply.
    pub total: Option<u64>,
}

/// Boundary to the data store.
///
/// This is the only place a request may suspend. Implementations own their
/// connection handling and any retry policy; callers never retry.
#[async_trait]
pub trait FetchGateway: Send + Sync {
    async fn fetch(&self, query: &QueryDescriptor) -> Result<FetchResult, DataError>;
}
