//! Row to resource mapping.

use indexmap::IndexMap;
use linkr_data::{Entity, FieldSource, Row};
use serde_json::Value;

use crate::error::HalError;

/// Projects fetched rows onto an entity's exposed fields.
///
/// The key set of every mapped instance is exactly the entity's declared field
/// names, in declaration order. Hidden and relationship columns never appear.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceMapper;

impl ResourceMapper {
    pub fn new() -> Self {
        Self
    }

    /// # Errors
    ///
    /// `HalError::Mapping` when a column the entity declares is absent from the row.
    /// A present but null column maps to an explicit `null`.
    pub fn map(&self, entity: &Entity, row: &Row) -> Result<IndexMap<String, Value>, HalError> {
        let mut fields = IndexMap::with_capacity(entity.fields().len());
        for field in entity.fields() {
            let value = match field.source() {
                FieldSource::Column(column) => require(entity, row, column)?.clone(),
                FieldSource::Computed(computed) => {
                    for source in computed.sources() {
                        require(entity, row, source)?;
                    }
                    computed.evaluate(row)
                }
            };
            fields.insert(field.name().to_string(), value);
        }
        Ok(fields)
    }
}

fn require<'r>(entity: &Entity, row: &'r Row, column: &str) -> Result<&'r Value, HalError> {
    row.get(column).ok_or_else(|| {
        HalError::Mapping(format!(
            "row of '{}' is missing column '{column}'",
            entity.name()
        ))
    })
}
