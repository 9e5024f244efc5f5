use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::DataError;
use crate::gateway::{FetchGateway, FetchResult};
use crate::query::{QueryDescriptor, SortKey};
use crate::row::Row;

/// Fetch gateway over in-process tables.
///
/// Evaluates filters, ordering, and paging the way a SQL backend would and
/// always reports an exact total. Tables are fixed at construction.
#[derive(Debug)]
pub struct MemoryGateway {
    tables: HashMap<String, Vec<Row>>,
    available: AtomicBool,
    fetches: AtomicUsize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            available: AtomicBool::new(true),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Add (or replace) the rows of one table.
    pub fn with_table(mut self, source: &str, rows: Vec<Row>) -> Self {
        self.tables.insert(source.to_string(), rows);
        self
    }

    /// Simulate an outage: while unavailable, every fetch fails with `BackendUnavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::SeqCst);
    }

    /// Number of fetches attempted so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(AtomicOrdering::SeqCst)
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FetchGateway for MemoryGateway {
    async fn fetch(&self, query: &QueryDescriptor) -> Result<FetchResult, DataError> {
        self.fetches.fetch_add(1, AtomicOrdering::SeqCst);
        if !self.available.load(AtomicOrdering::SeqCst) {
            return Err(DataError::BackendUnavailable("memory gateway is offline".into()));
        }
        let table = self.tables.get(query.source()).ok_or_else(|| {
            DataError::backend(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such table: {}", query.source()),
            ))
        })?;

        let mut matching: Vec<&Row> = table
            .iter()
            .filter(|row| {
                query
                    .filters()
                    .iter()
                    .all(|p| row.get(&p.column).is_some_and(|v| loosely_equal(v, &p.value)))
            })
            .collect();
        matching.sort_by(|a, b| compare_rows(a, b, query.order()));

        let total = matching.len() as u64;
        let page = query.page();
        let start = usize::try_from(page.offset()).unwrap_or(usize::MAX).min(matching.len());
        let end = usize::try_from(page.offset().saturating_add(page.limit()))
            .unwrap_or(usize::MAX)
            .min(matching.len());

        let rows = matching[start..end]
            .iter()
            .map(|row| project(row, query.columns()))
            .collect();
        Ok(FetchResult {
            rows,
            has_more: (end as u64) < total,
            total: Some(total),
        })
    }
}

/// Keep only the requested columns. Columns the table lacks stay absent.
fn project(row: &Row, columns: &[String]) -> Row {
    columns
        .iter()
        .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
        .collect()
}

fn loosely_equal(stored: &Value, wanted: &Value) -> bool {
    match (stored, wanted) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Bool(a), Value::Number(b)) | (Value::Number(b), Value::Bool(a)) => {
            b.as_f64() == Some(if *a { 1.0 } else { 0.0 })
        }
        _ => stored == wanted,
    }
}

fn compare_rows(a: &Row, b: &Row, order: &[SortKey]) -> Ordering {
    for key in order {
        let ord = compare_values(a.get(&key.column), b.get(&key.column));
        let ord = if key.descending { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Nulls sort first, as in SQLite.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
