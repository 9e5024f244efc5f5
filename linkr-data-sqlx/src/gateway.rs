use async_trait::async_trait;
use linkr_data::{DataError, FetchGateway, FetchResult, QueryDescriptor, Row};
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

use crate::error::{SqlxErrorExt, SqlxResult};
use crate::sql::{build_count, build_select, QueryError};

macro_rules! bind_values {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for value in $values {
            query = match value {
                Value::Null => query.bind(None::<String>),
                Value::Bool(b) => query.bind(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => query.bind(i),
                    None => query.bind(n.as_f64()),
                },
                Value::String(s) => query.bind(s.as_str()),
                other => query.bind(other.to_string()),
            };
        }
        query
    }};
}

/// [`FetchGateway`] over a SQLite pool.
///
/// Fetches one row past the page to learn whether more exist, and only runs a
/// `COUNT(*)` when the page alone cannot tell the total.
#[derive(Debug, Clone)]
pub struct SqliteGateway {
    pool: SqlitePool,
    count_totals: bool,
}

impl SqliteGateway {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            count_totals: true,
        }
    }

    /// Connect to `url` (e.g. `sqlite://data.db` or `sqlite::memory:`).
    pub async fn connect(url: &str) -> SqlxResult<Self> {
        let pool = SqlitePool::connect(url).await.map_err(|e| e.into_data_error())?;
        Ok(Self::new(pool))
    }

    /// Skip `COUNT(*)` queries; collections then carry no total.
    pub fn without_totals(mut self) -> Self {
        self.count_totals = false;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn count(&self, query: &QueryDescriptor) -> SqlxResult<u64> {
        let statement = build_count(query).map_err(invalid_schema)?;
        let total: i64 = bind_values!(sqlx::query_scalar::<_, i64>(&statement.sql), &statement.binds)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}

#[async_trait]
impl FetchGateway for SqliteGateway {
    async fn fetch(&self, query: &QueryDescriptor) -> Result<FetchResult, DataError> {
        let page = query.page();
        let statement =
            build_select(query, page.limit().saturating_add(1)).map_err(invalid_schema)?;
        tracing::debug!(sql = %statement.sql, binds = statement.binds.len(), "sqlite fetch");

        let fetched = bind_values!(sqlx::query(&statement.sql), &statement.binds)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;

        let mut rows = fetched
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.into_data_error())?;
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let has_more = rows.len() > limit;
        rows.truncate(limit);

        let total = if !has_more && (!rows.is_empty() || page.offset() == 0) {
            Some(page.offset() + rows.len() as u64)
        } else if self.count_totals {
            Some(self.count(query).await?)
        } else {
            None
        };
        Ok(FetchResult { rows, has_more, total })
    }
}

fn invalid_schema(err: QueryError) -> DataError {
    DataError::Config(err.to_string())
}

/// Decode by the storage class of each value, not the declared column type.
fn decode_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let mut out = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let info = raw.type_info();
            match info.name() {
                "INTEGER" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(index)?),
                "REAL" | "NUMERIC" => Value::from(row.try_get::<f64, _>(index)?),
                "BLOB" => Value::from(String::from_utf8_lossy(&row.try_get::<Vec<u8>, _>(index)?).into_owned()),
                _ => Value::from(row.try_get::<String, _>(index)?),
            }
        };
        out.insert(column.name(), value);
    }
    Ok(out)
}
