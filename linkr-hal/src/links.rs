//! Link resolution.
//!
//! [`LinkResolver`] is the only code that turns rows into URL identifiers.
//! Everything that needs an instance URL, whether a self link or a relationship
//! link, goes through [`LinkResolver::identifier`].

use std::collections::HashSet;
use std::sync::Arc;

use linkr_core::params::encode_query_string;
use linkr_data::{Entity, IdentifierStrategy, PageMeta, PageRequest, QueryDescriptor, Row, SchemaRegistry};
use serde_json::Value;
use url::{Position, Url};

use crate::error::HalError;
use crate::resource::{Link, LinkSet};

/// Where generated links point.
///
/// Links are built against `base` and rendered either relative to its origin
/// (`/api/courses/1`) or absolute (`https://host/api/courses/1`).
#[derive(Debug, Clone)]
pub struct LinkBase {
    base: Url,
    absolute: bool,
}

impl LinkBase {
    /// # Errors
    ///
    /// `HalError::Config` when `base` is not a hierarchical absolute URL.
    pub fn new(base: &str, absolute: bool) -> Result<Self, HalError> {
        let base = Url::parse(base)
            .map_err(|e| HalError::Config(format!("invalid link base '{base}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(HalError::Config(format!("link base '{base}' cannot hold paths")));
        }
        Ok(Self { base, absolute })
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Href for `segments` below the base, each segment percent-encoded.
    pub fn href(&self, segments: &[&str], query: &str) -> String {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.set_query((!query.is_empty()).then_some(query));
        self.render(&url)
    }

    fn render(&self, url: &Url) -> String {
        if self.absolute {
            url.to_string()
        } else {
            url[Position::BeforePath..].to_string()
        }
    }
}

/// Builds self, relationship and pagination links.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    registry: Arc<SchemaRegistry>,
    base: LinkBase,
}

impl LinkResolver {
    pub fn new(registry: Arc<SchemaRegistry>, base: LinkBase) -> Self {
        Self { registry, base }
    }

    pub fn base(&self) -> &LinkBase {
        &self.base
    }

    /// URL identifier of the instance `row` belongs to.
    ///
    /// Surrogate entities use the surrogate column, natural entities their
    /// natural key column. There is no other path to an identifier.
    ///
    /// # Errors
    ///
    /// `HalError::Mapping` when the identifier column is absent, null, or not a scalar.
    pub fn identifier(&self, entity: &Entity, row: &Row) -> Result<String, HalError> {
        let column = entity.identifier().column();
        let value = row.get(column).ok_or_else(|| {
            HalError::Mapping(format!(
                "row of '{}' is missing identifier column '{column}'",
                entity.name()
            ))
        })?;
        scalar(value).ok_or_else(|| {
            HalError::Mapping(format!(
                "row of '{}' has no usable identifier in '{column}' ({value})",
                entity.name()
            ))
        })
    }

    /// Href of one instance.
    pub fn instance_href(&self, entity: &Entity, id: &str) -> String {
        self.base.href(&[entity.route(), id], "")
    }

    /// Href of an entity's collection, with optional query string.
    pub fn collection_href(&self, entity: &Entity, query: &str) -> String {
        self.base.href(&[entity.route(), ""], query)
    }

    /// Templated href addressing any instance of `entity`.
    pub fn item_template(&self, entity: &Entity) -> String {
        format!("{}{{id}}", self.collection_href(entity, ""))
    }

    /// Self link plus one link per relationship whose foreign key is set.
    ///
    /// # Errors
    ///
    /// `HalError::Mapping` for broken identifiers or absent foreign key columns,
    /// `HalError::LinkResolution` when a natural-key relationship cannot find
    /// the target's key in the row.
    pub fn resource_links(&self, entity: &Entity, row: &Row) -> Result<LinkSet, HalError> {
        let mut links = LinkSet::new();
        let id = self.identifier(entity, row)?;
        links.push(Link::new("self", self.instance_href(entity, &id)));

        for relation in entity.relations() {
            let fk = row.get(relation.column()).ok_or_else(|| {
                HalError::Mapping(format!(
                    "row of '{}' is missing column '{}' for relationship '{}'",
                    entity.name(),
                    relation.column(),
                    relation.name()
                ))
            })?;
            if fk.is_null() {
                continue;
            }
            let target = self.registry.resolve(relation.target()).map_err(|_| {
                HalError::LinkResolution(format!(
                    "relationship '{}' targets unregistered entity '{}'",
                    relation.name(),
                    relation.target()
                ))
            })?;
            let key = match target.identifier() {
                IdentifierStrategy::Surrogate { .. } => fk,
                IdentifierStrategy::Natural { .. } => {
                    let column = relation.natural_key_column().ok_or_else(|| {
                        HalError::LinkResolution(format!(
                            "relationship '{}' has no natural key column for '{}'",
                            relation.name(),
                            target.name()
                        ))
                    })?;
                    match row.get(column) {
                        Some(value) if !value.is_null() => value,
                        _ => {
                            return Err(HalError::LinkResolution(format!(
                                "relationship '{}' of '{}' has a foreign key but no natural key in '{column}'",
                                relation.name(),
                                entity.name()
                            )))
                        }
                    }
                }
            };
            let key = scalar(key).ok_or_else(|| {
                HalError::LinkResolution(format!(
                    "relationship '{}' of '{}' has a non-scalar key",
                    relation.name(),
                    entity.name()
                ))
            })?;
            links.push(Link::new(relation.name(), self.instance_href(target, &key)));
        }
        Ok(links)
    }

    /// Links for every row of a page, checking that identifiers are unique.
    ///
    /// # Errors
    ///
    /// As [`resource_links`](Self::resource_links), plus `HalError::Mapping`
    /// when two rows share an identifier.
    pub fn resolve_all(&self, entity: &Entity, rows: &[Row]) -> Result<Vec<LinkSet>, HalError> {
        let mut seen = HashSet::with_capacity(rows.len());
        rows.iter()
            .map(|row| {
                let id = self.identifier(entity, row)?;
                if !seen.insert(id.clone()) {
                    return Err(HalError::Mapping(format!(
                        "identifier '{id}' of '{}' is not unique",
                        entity.name()
                    )));
                }
                self.resource_links(entity, row)
            })
            .collect()
    }

    /// Self, navigation and item-template links for one page of a collection.
    ///
    /// Filter and sort parameters are carried into every navigation link.
    pub fn collection_links(&self, entity: &Entity, query: &QueryDescriptor, meta: &PageMeta) -> LinkSet {
        let request = meta.request();
        let page_href = |page: &PageRequest| {
            let paging = page.query_pairs();
            let pairs = query
                .echo()
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .chain(paging.iter().map(|(k, v)| (*k, v.as_str())));
            self.collection_href(entity, &encode_query_string(pairs))
        };

        let mut links = LinkSet::new();
        links.push(Link::new("self", page_href(request)));
        links.push(Link::new("first", page_href(&request.first())));
        if let Some(prev) = request.prev() {
            links.push(Link::new("prev", page_href(&prev)));
        }
        if meta.has_more {
            links.push(Link::new("next", page_href(&request.next())));
        }
        if let Some(total) = meta.total {
            links.push(Link::new("last", page_href(&request.last(total))));
        }
        links.push(Link::templated("item", self.item_template(entity)));
        links
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
