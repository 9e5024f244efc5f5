//! Query planning: request parameters in, backend-agnostic query descriptor out.

use linkr_core::params::split_bracketed;
use serde_json::Value;

use crate::error::DataError;
use crate::page::PageRequest;
use crate::schema::Entity;

/// An equality predicate on one source column.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

/// Everything a gateway needs to fetch one page (or one instance) of an entity.
///
/// Built only by [`QueryPlanner`]; every column it names exists on the entity.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    entity: String,
    source: String,
    columns: Vec<String>,
    filters: Vec<Predicate>,
    order: Vec<SortKey>,
    page: PageRequest,
    echo: Vec<(String, String)>,
}

impl QueryDescriptor {
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Table or view to read from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Columns to project.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Predicates, all of which must hold.
    pub fn filters(&self) -> &[Predicate] {
        &self.filters
    }

    /// Sort keys, most significant first. Always ends with the identifier column.
    pub fn order(&self) -> &[SortKey] {
        &self.order
    }

    pub fn page(&self) -> &PageRequest {
        &self.page
    }

    /// Normalized filter and sort parameters, for rebuilding pagination links.
    pub fn echo(&self) -> &[(String, String)] {
        &self.echo
    }
}

/// Largest row offset a descriptor may carry; SQL backends take signed 64-bit offsets.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Page size bounds applied to collection requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u64,
    pub max_size: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: 20,
            max_size: 100,
        }
    }
}

/// Validates request parameters against an entity and produces descriptors.
///
/// Never touches a data store.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryPlanner {
    limits: PageLimits,
}

impl QueryPlanner {
    pub fn new(limits: PageLimits) -> Self {
        let limits = PageLimits {
            default_size: limits.default_size.max(1),
            max_size: limits.max_size.max(1),
        };
        Self { limits }
    }

    pub fn limits(&self) -> PageLimits {
        self.limits
    }

    /// Plan a collection request from raw query pairs.
    ///
    /// Accepts `filter[field]=value`, `sort=field|-field`, `page`, `offset`,
    /// and `limit` (alias `size`).
    ///
    /// # Errors
    ///
    /// `DataError::Validation` naming the first rejected parameter.
    pub fn plan_collection(
        &self,
        entity: &Entity,
        params: &[(String, String)],
    ) -> Result<QueryDescriptor, DataError> {
        let mut filters = Vec::new();
        let mut sort: Option<(String, SortKey)> = None;
        let mut page_number = None;
        let mut offset = None;
        let mut limit = None;

        for (key, raw) in params {
            let (name, inner) = split_bracketed(key)
                .map_err(|e| DataError::validation(key.clone(), e.message))?;
            match (name, inner) {
                ("filter", Some(field_name)) => filters.push(plan_filter(entity, field_name, raw)?),
                ("sort", None) => {
                    if sort.is_some() {
                        return Err(DataError::validation("sort", "Only one sort key is supported"));
                    }
                    sort = Some(plan_sort(entity, raw)?);
                }
                ("page", None) => page_number = Some(parse_count(key, raw, 1)?),
                ("offset", None) => offset = Some(parse_count(key, raw, 0)?),
                ("limit" | "size", None) => limit = Some(parse_count(key, raw, 1)?),
                _ => {
                    return Err(DataError::validation(
                        key.clone(),
                        format!("Unknown query parameter '{key}'"),
                    ))
                }
            }
        }

        let limit = limit.unwrap_or(self.limits.default_size).min(self.limits.max_size);
        let page = match (page_number, offset) {
            (Some(_), Some(_)) => {
                return Err(DataError::validation(
                    "offset",
                    "Use either 'page' or 'offset', not both",
                ))
            }
            (None, Some(offset)) => {
                if offset > MAX_OFFSET {
                    return Err(DataError::validation(
                        "offset",
                        format!("'offset' must not exceed {MAX_OFFSET}"),
                    ));
                }
                PageRequest::at_offset(offset, limit)
            }
            (number, None) => {
                let number = number.unwrap_or(1);
                let reachable = (number - 1)
                    .checked_mul(limit)
                    .is_some_and(|offset| offset <= MAX_OFFSET);
                if !reachable {
                    return Err(DataError::validation(
                        "page",
                        format!("'page' {number} lies beyond the last addressable row"),
                    ));
                }
                PageRequest::numbered(number, limit)
            }
        };

        let mut echo: Vec<(String, String)> = filters
            .iter()
            .map(|p: &Predicate| (format!("filter[{}]", p.field), echo_value(&p.value)))
            .collect();
        let mut order = Vec::new();
        if let Some((raw, key)) = sort {
            echo.push(("sort".to_string(), raw));
            order.push(key);
        }
        let id_column = entity.identifier().column();
        if order.iter().all(|k| k.column != id_column) {
            order.push(SortKey {
                column: id_column.to_string(),
                descending: false,
            });
        }

        let descriptor = QueryDescriptor {
            entity: entity.name().to_string(),
            source: entity.source().to_string(),
            columns: entity.projection(),
            filters,
            order,
            page,
            echo,
        };
        tracing::debug!(
            entity = %descriptor.entity,
            filters = descriptor.filters.len(),
            offset = page.offset(),
            limit = page.limit(),
            "planned collection query"
        );
        Ok(descriptor)
    }

    /// Plan a single-instance lookup by the entity's identifier.
    ///
    /// The limit is 2 so that a duplicated natural key shows up as two rows.
    ///
    /// # Errors
    ///
    /// `DataError::NotFound` when `id` cannot be an identifier of this entity.
    pub fn plan_lookup(&self, entity: &Entity, id: &str) -> Result<QueryDescriptor, DataError> {
        let strategy = entity.identifier();
        let value = strategy.kind().coerce(id).ok_or_else(|| {
            DataError::NotFound(format!("No {} with identifier '{id}'", entity.name()))
        })?;
        let field = match strategy {
            crate::schema::IdentifierStrategy::Natural { field, .. } => field.clone(),
            crate::schema::IdentifierStrategy::Surrogate { column, .. } => column.clone(),
        };
        Ok(QueryDescriptor {
            entity: entity.name().to_string(),
            source: entity.source().to_string(),
            columns: entity.projection(),
            filters: vec![Predicate {
                field,
                column: strategy.column().to_string(),
                value,
            }],
            order: vec![SortKey {
                column: strategy.column().to_string(),
                descending: false,
            }],
            page: PageRequest::at_offset(0, 2),
            echo: Vec::new(),
        })
    }
}

fn plan_filter(entity: &Entity, field_name: &str, raw: &str) -> Result<Predicate, DataError> {
    let field = entity
        .field(field_name)
        .ok_or_else(|| DataError::validation(field_name, format!("Unknown field '{field_name}'")))?;
    if !field.is_filterable() {
        return Err(DataError::validation(
            field_name,
            format!("Field '{field_name}' is not filterable"),
        ));
    }
    let column = field.source_column().ok_or_else(|| {
        DataError::validation(field_name, format!("Field '{field_name}' is not filterable"))
    })?;
    let value = field.kind().coerce(raw).ok_or_else(|| {
        DataError::validation(
            field_name,
            format!("Invalid value '{raw}' for field '{field_name}'"),
        )
    })?;
    Ok(Predicate {
        field: field_name.to_string(),
        column: column.to_string(),
        value,
    })
}

fn plan_sort(entity: &Entity, raw: &str) -> Result<(String, SortKey), DataError> {
    let raw = raw.trim();
    let (field_name, descending) = match raw.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (raw, false),
    };
    let column = entity
        .field(field_name)
        .filter(|f| f.is_sortable())
        .and_then(|f| f.source_column())
        .ok_or_else(|| {
            DataError::validation(field_name, format!("Field '{field_name}' is not sortable"))
        })?;
    Ok((
        raw.to_string(),
        SortKey {
            column: column.to_string(),
            descending,
        },
    ))
}

fn parse_count(key: &str, raw: &str, min: u64) -> Result<u64, DataError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n >= min)
        .ok_or_else(|| {
            DataError::validation(key, format!("'{key}' must be an integer >= {min}"))
        })
}

fn echo_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
