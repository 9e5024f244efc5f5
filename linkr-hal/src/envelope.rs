//! Envelope serializers: the wire shapes of resources and collections.

use serde_json::{Map, Value};

use crate::error::HalError;
use crate::resource::{Collection, LinkSet, Resource};

pub const HAL_JSON: &str = "application/hal+json";
pub const PLAIN_JSON: &str = "application/json";

/// One output format.
///
/// Implementations are pure: the same resource always yields the same bytes.
pub trait EnvelopeSerializer: Send + Sync {
    /// Media type written to `Content-Type`.
    fn media_type(&self) -> &'static str;

    fn resource(&self, resource: &Resource) -> Result<Vec<u8>, HalError>;

    fn collection(&self, collection: &Collection) -> Result<Vec<u8>, HalError>;
}

/// `application/hal+json`: links under `_links`, page items under `_embedded`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalJson;

impl HalJson {
    fn links(links: &LinkSet) -> Value {
        let mut out = Map::new();
        for link in links.iter() {
            let mut obj = Map::new();
            obj.insert("href".into(), Value::String(link.href.clone()));
            if link.templated {
                obj.insert("templated".into(), Value::Bool(true));
            }
            out.insert(link.rel.clone(), Value::Object(obj));
        }
        Value::Object(out)
    }

    fn document(resource: &Resource) -> Value {
        let mut doc: Map<String, Value> = resource.fields.clone().into_iter().collect();
        doc.insert("_links".into(), Self::links(&resource.links));
        Value::Object(doc)
    }
}

impl EnvelopeSerializer for HalJson {
    fn media_type(&self) -> &'static str {
        HAL_JSON
    }

    fn resource(&self, resource: &Resource) -> Result<Vec<u8>, HalError> {
        Ok(serde_json::to_vec(&Self::document(resource))?)
    }

    fn collection(&self, collection: &Collection) -> Result<Vec<u8>, HalError> {
        let items: Vec<Value> = collection.items.iter().map(Self::document).collect();
        let mut embedded = Map::new();
        embedded.insert(collection.rel.clone(), Value::Array(items));

        let mut doc = Map::new();
        doc.insert("_links".into(), Self::links(&collection.links));
        doc.insert("_embedded".into(), Value::Object(embedded));
        doc.insert("page".into(), serde_json::to_value(collection.page)?);
        Ok(serde_json::to_vec(&Value::Object(doc))?)
    }
}

/// `application/json`: links as a `links` object, page items under `results`.
///
/// Templated links are dropped; plain JSON clients have no template convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainJson;

impl PlainJson {
    fn links(links: &LinkSet) -> Value {
        let out: Map<String, Value> = links
            .iter()
            .filter(|l| !l.templated)
            .map(|l| (l.rel.clone(), serde_json::json!({ "href": l.href })))
            .collect();
        Value::Object(out)
    }

    fn document(resource: &Resource) -> Value {
        let mut doc: Map<String, Value> = resource.fields.clone().into_iter().collect();
        doc.insert("links".into(), Self::links(&resource.links));
        Value::Object(doc)
    }
}

impl EnvelopeSerializer for PlainJson {
    fn media_type(&self) -> &'static str {
        PLAIN_JSON
    }

    fn resource(&self, resource: &Resource) -> Result<Vec<u8>, HalError> {
        Ok(serde_json::to_vec(&Self::document(resource))?)
    }

    fn collection(&self, collection: &Collection) -> Result<Vec<u8>, HalError> {
        let results: Vec<Value> = collection.items.iter().map(Self::document).collect();
        let doc = serde_json::json!({
            "links": Self::links(&collection.links),
            "results": results,
            "page": collection.page,
        });
        Ok(serde_json::to_vec(&doc)?)
    }
}
