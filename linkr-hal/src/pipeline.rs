//! The read path: gate, plan, negotiate, fetch, map, link, serialize.

use std::sync::Arc;

use bytes::Bytes;
use indexmap::IndexMap;
use linkr_core::{AccessGate, Action, AllowAll, Principal};
use linkr_data::{Entity, FetchGateway, PageLimits, PageMeta, QueryPlanner, SchemaRegistry};

use crate::envelope::{EnvelopeSerializer, HalJson, PlainJson};
use crate::error::HalError;
use crate::links::{LinkBase, LinkResolver};
use crate::mapper::ResourceMapper;
use crate::negotiate::ContentNegotiator;
use crate::resource::{Collection, Link, LinkSet, Resource};

/// A serialized response body and its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub media_type: &'static str,
    pub body: Bytes,
}

/// Request processing for list and retrieve operations.
///
/// Each call runs its stages in order and stops at the first failure. The only
/// suspension points are the access gate and the gateway fetch; dropping the
/// returned future abandons the request without producing output.
pub struct Pipeline {
    registry: Arc<SchemaRegistry>,
    planner: QueryPlanner,
    gateway: Arc<dyn FetchGateway>,
    gate: Arc<dyn AccessGate>,
    mapper: ResourceMapper,
    resolver: LinkResolver,
    negotiator: ContentNegotiator,
}

impl Pipeline {
    pub fn builder(registry: Arc<SchemaRegistry>) -> PipelineBuilder {
        PipelineBuilder::new(registry)
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> &LinkResolver {
        &self.resolver
    }

    pub fn negotiator(&self) -> &ContentNegotiator {
        &self.negotiator
    }

    pub fn planner(&self) -> &QueryPlanner {
        &self.planner
    }

    /// `GET /`: links to every collection the principal may list.
    pub async fn index(&self, principal: &Principal, accept: Option<&str>) -> Result<Rendered, HalError> {
        let serializer = self.negotiator.select(accept)?;
        let mut links = LinkSet::new();
        links.push(Link::new("self", self.resolver.base().href(&[""], "")));
        for entity in self.registry.entities() {
            if self.gate.authorize(principal, entity.name(), Action::List).await.is_allowed() {
                links.push(Link::new(entity.route(), self.resolver.collection_href(entity, "")));
            }
        }
        let index = Resource {
            entity: String::new(),
            fields: IndexMap::new(),
            links,
        };
        let body = serializer.resource(&index)?;
        Ok(Rendered {
            media_type: serializer.media_type(),
            body: Bytes::from(body),
        })
    }

    /// `GET /{route}/`: one page of an entity's collection.
    pub async fn list(
        &self,
        principal: &Principal,
        route: &str,
        params: &[(String, String)],
        accept: Option<&str>,
    ) -> Result<Rendered, HalError> {
        let entity = self.admit(principal, route, Action::List).await?;
        let query = self.planner.plan_collection(entity, params)?;
        let serializer = self.negotiator.select(accept)?;

        let fetched = self.gateway.fetch(&query).await?;
        let resources = self.materialize(entity, &fetched.rows)?;
        let page = PageMeta::new(*query.page(), resources.len(), fetched.has_more, fetched.total);
        let collection = Collection {
            entity: entity.name().to_string(),
            rel: entity.route().to_string(),
            links: self.resolver.collection_links(entity, &query, &page),
            items: resources,
            page,
        };
        tracing::debug!(
            entity = entity.name(),
            count = page.count,
            total = ?page.total,
            "rendering collection"
        );
        let body = serializer.collection(&collection)?;
        Ok(Rendered {
            media_type: serializer.media_type(),
            body: Bytes::from(body),
        })
    }

    /// `GET /{route}/{id}`: one instance by its URL identifier.
    pub async fn retrieve(
        &self,
        principal: &Principal,
        route: &str,
        id: &str,
        accept: Option<&str>,
    ) -> Result<Rendered, HalError> {
        let entity = self.admit(principal, route, Action::Retrieve).await?;
        let query = self.planner.plan_lookup(entity, id)?;
        let serializer = self.negotiator.select(accept)?;

        let fetched = self.gateway.fetch(&query).await?;
        let mut resources = self.materialize(entity, &fetched.rows)?;
        let resource = match resources.len() {
            1 => resources.remove(0),
            0 => {
                return Err(HalError::NotFound(format!(
                    "No {} with identifier '{id}'",
                    entity.name()
                )))
            }
            _ => {
                return Err(HalError::Mapping(format!(
                    "identifier '{id}' of '{}' matches more than one row",
                    entity.name()
                )))
            }
        };
        let body = serializer.resource(&resource)?;
        Ok(Rendered {
            media_type: serializer.media_type(),
            body: Bytes::from(body),
        })
    }

    /// Consult the gate before anything else, then resolve the route.
    ///
    /// The gate sees the entity name when the route is known and the raw route
    /// otherwise, so a denial never reveals whether an entity exists.
    async fn admit(&self, principal: &Principal, route: &str, action: Action) -> Result<&Entity, HalError> {
        let resolved = self.registry.resolve_route(route);
        let name = resolved.as_ref().map(|e| e.name()).unwrap_or(route);
        if !self.gate.authorize(principal, name, action).await.is_allowed() {
            tracing::info!(entity = name, %action, "request denied by access gate");
            return Err(HalError::Forbidden);
        }
        Ok(resolved?)
    }

    fn materialize(&self, entity: &Entity, rows: &[linkr_data::Row]) -> Result<Vec<Resource>, HalError> {
        let links = self.resolver.resolve_all(entity, rows)?;
        rows.iter()
            .zip(links)
            .map(|(row, links)| {
                Ok(Resource {
                    entity: entity.name().to_string(),
                    fields: self.mapper.map(entity, row)?,
                    links,
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("entities", &self.registry.len())
            .field("planner", &self.planner)
            .field("negotiator", &self.negotiator)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`Pipeline`]. Only the gateway is mandatory.
pub struct PipelineBuilder {
    registry: Arc<SchemaRegistry>,
    gateway: Option<Arc<dyn FetchGateway>>,
    gate: Arc<dyn AccessGate>,
    limits: PageLimits,
    base: Option<LinkBase>,
    serializers: Vec<Arc<dyn EnvelopeSerializer>>,
}

impl PipelineBuilder {
    fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            gateway: None,
            gate: Arc::new(AllowAll),
            limits: PageLimits::default(),
            base: None,
            serializers: Vec::new(),
        }
    }

    pub fn gateway(mut self, gateway: Arc<dyn FetchGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn gate(mut self, gate: Arc<dyn AccessGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn link_base(mut self, base: LinkBase) -> Self {
        self.base = Some(base);
        self
    }

    /// Add an output format. The first one added is the default.
    ///
    /// Without any, HAL+JSON (default) and plain JSON are offered.
    pub fn serializer(mut self, serializer: Arc<dyn EnvelopeSerializer>) -> Self {
        self.serializers.push(serializer);
        self
    }

    /// # Errors
    ///
    /// `HalError::Config` when no gateway was given or the serializers conflict.
    pub fn build(self) -> Result<Pipeline, HalError> {
        let gateway = self
            .gateway
            .ok_or_else(|| HalError::Config("pipeline requires a fetch gateway".into()))?;
        let serializers = if self.serializers.is_empty() {
            vec![Arc::new(HalJson) as Arc<dyn EnvelopeSerializer>, Arc::new(PlainJson)]
        } else {
            self.serializers
        };
        let base = match self.base {
            Some(base) => base,
            None => LinkBase::new("http://localhost/", false)?,
        };
        Ok(Pipeline {
            resolver: LinkResolver::new(self.registry.clone(), base),
            registry: self.registry,
            planner: QueryPlanner::new(self.limits),
            gateway,
            gate: self.gate,
            mapper: ResourceMapper::new(),
            negotiator: ContentNegotiator::new(serializers)?,
        })
    }
}
