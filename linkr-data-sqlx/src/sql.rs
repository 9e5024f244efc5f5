//! SQL text for query descriptors.
//!
//! Identifiers come from the schema registry, not from clients, but they are
//! still validated and quoted. Values are always bound, never interpolated.

use linkr_data::QueryDescriptor;
use serde_json::Value;

/// A statement and the values for its `?` placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    InvalidIdentifier { kind: &'static str, ident: String },
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidIdentifier { kind, ident } => {
                write!(f, "Invalid {kind} identifier: {ident}")
            }
        }
    }
}

impl std::error::Error for QueryError {}

/// `SELECT` for one page. `limit` is passed separately so callers can over-fetch.
pub fn build_select(query: &QueryDescriptor, limit: u64) -> Result<Statement, QueryError> {
    let columns = query
        .columns()
        .iter()
        .map(|c| quote_checked(c, "column"))
        .collect::<Result<Vec<_>, _>>()?
        .join(", ");
    let table = quote_checked(query.source(), "table")?;

    let mut sql = format!("SELECT {columns} FROM {table}");
    let binds = append_where(query, &mut sql)?;
    if !query.order().is_empty() {
        let clauses = query
            .order()
            .iter()
            .map(|key| {
                let col = quote_checked(&key.column, "column")?;
                Ok(format!("{col} {}", if key.descending { "DESC" } else { "ASC" }))
            })
            .collect::<Result<Vec<_>, QueryError>>()?;
        sql.push_str(" ORDER BY ");
        sql.push_str(&clauses.join(", "));
    }
    sql.push_str(&format!(" LIMIT {limit} OFFSET {}", query.page().offset()));
    Ok(Statement { sql, binds })
}

/// `SELECT COUNT(*)` over the same predicates.
pub fn build_count(query: &QueryDescriptor) -> Result<Statement, QueryError> {
    let table = quote_checked(query.source(), "table")?;
    let mut sql = format!("SELECT COUNT(*) FROM {table}");
    let binds = append_where(query, &mut sql)?;
    Ok(Statement { sql, binds })
}

fn append_where(query: &QueryDescriptor, sql: &mut String) -> Result<Vec<Value>, QueryError> {
    let mut binds = Vec::with_capacity(query.filters().len());
    let mut clauses = Vec::with_capacity(query.filters().len());
    for predicate in query.filters() {
        let col = quote_checked(&predicate.column, "column")?;
        clauses.push(format!("{col} = ?"));
        binds.push(predicate.value.clone());
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    Ok(binds)
}

fn quote_checked(ident: &str, kind: &'static str) -> Result<String, QueryError> {
    if !is_valid_identifier(ident) {
        return Err(QueryError::InvalidIdentifier {
            kind,
            ident: ident.to_string(),
        });
    }
    Ok(ident
        .split('.')
        .map(|part| format!("\"{part}\""))
        .collect::<Vec<_>>()
        .join("."))
}

pub(crate) fn is_valid_identifier(ident: &str) -> bool {
    !ident.is_empty() && ident.split('.').all(is_valid_segment)
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
