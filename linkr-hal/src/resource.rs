use indexmap::IndexMap;
use linkr_data::PageMeta;
use serde_json::Value;

/// One hypermedia link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub rel: String,
    pub href: String,
    /// The href is a URI template (e.g. `/courses/{id}`).
    pub templated: bool,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            templated: false,
        }
    }

    pub fn templated(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            templated: true,
            ..Self::new(rel, href)
        }
    }
}

/// Links of one representation, at most one per relation, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    links: Vec<Link>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a link, replacing any existing link with the same relation.
    pub fn push(&mut self, link: Link) {
        match self.links.iter_mut().find(|l| l.rel == link.rel) {
            Some(existing) => *existing = link,
            None => self.links.push(link),
        }
    }

    pub fn get(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.rel == rel)
    }

    pub fn href(&self, rel: &str) -> Option<&str> {
        self.get(rel).map(|l| l.href.as_str())
    }

    pub fn contains(&self, rel: &str) -> bool {
        self.get(rel).is_some()
    }

    pub fn rels(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|l| l.rel.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// One materialized entity instance: exposed fields plus links.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub entity: String,
    pub fields: IndexMap<String, Value>,
    pub links: LinkSet,
}

/// One page of resources with its pagination links.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub entity: String,
    /// Key under which items are embedded (the entity's route segment).
    pub rel: String,
    pub items: Vec<Resource>,
    pub links: LinkSet,
    pub page: PageMeta,
}
