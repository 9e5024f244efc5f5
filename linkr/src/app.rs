use std::sync::Arc;

use linkr_core::guards::{AccessGate, AllowAll, AnonymousResolver, PrincipalResolver};
use linkr_core::http::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, VARY};
use linkr_core::http::response::{IntoResponse, Response};
use linkr_core::http::routing::get;
use linkr_core::http::{Path, RawQuery, Router, State};
use linkr_core::{catch_panic_layer, default_cors, default_trace, parse_query_string, HttpError};
use linkr_data::{FetchGateway, SchemaRegistry};
use linkr_hal::{HalError, Pipeline, Rendered};

use crate::settings::ApiSettings;

#[derive(Clone)]
struct ApiState {
    pipeline: Arc<Pipeline>,
    principals: Arc<dyn PrincipalResolver>,
}

/// Assembles the HTTP surface: routes, state and layers around a [`Pipeline`].
///
/// Routes:
///
/// | Path              | Handler                         |
/// |-------------------|---------------------------------|
/// | `/`               | index of listable collections   |
/// | `/{entity}/`      | collection (trailing slash optional) |
/// | `/{entity}/{id}`  | single instance                 |
/// | `/openapi.json`   | generated document, if enabled  |
pub struct ApiBuilder {
    registry: SchemaRegistry,
    settings: ApiSettings,
    gateway: Option<Arc<dyn FetchGateway>>,
    gate: Arc<dyn AccessGate>,
    principals: Arc<dyn PrincipalResolver>,
    description: Option<String>,
}

impl ApiBuilder {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            registry,
            settings: ApiSettings::default(),
            gateway: None,
            gate: Arc::new(AllowAll),
            principals: Arc::new(AnonymousResolver),
            description: None,
        }
    }

    pub fn with_settings(mut self, settings: ApiSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn FetchGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn with_access_gate(mut self, gate: Arc<dyn AccessGate>) -> Self {
        self.gate = gate;
        self
    }

    /// How callers are identified. Defaults to treating everyone as anonymous.
    pub fn with_principal_resolver(mut self, principals: Arc<dyn PrincipalResolver>) -> Self {
        self.principals = principals;
        self
    }

    /// Description shown in the OpenAPI document.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    /// Build the router.
    ///
    /// # Errors
    ///
    /// `HalError::Config` when no gateway was set or the settings are unusable.
    pub fn build(self) -> Result<Router, HalError> {
        let settings = self.settings;
        let config_err = |e: linkr_core::ConfigError| HalError::Config(e.to_string());
        let gateway = self
            .gateway
            .ok_or_else(|| HalError::Config("no fetch gateway configured".into()))?;

        #[cfg(feature = "openapi")]
        let docs = settings.docs.then(|| {
            let mut config = linkr_openapi::OpenApiConfig::new(&settings.title, &settings.version)
                .with_media_types(settings.media_types.clone());
            if let Some(description) = &self.description {
                config = config.with_description(description);
            }
            linkr_openapi::build_spec(&config, &self.registry)
        });

        let registry = Arc::new(self.registry);
        let mut builder = Pipeline::builder(registry.clone())
            .gateway(gateway)
            .gate(self.gate)
            .limits(settings.limits)
            .link_base(settings.link_base().map_err(config_err)?);
        for serializer in settings.serializers().map_err(config_err)? {
            builder = builder.serializer(serializer);
        }
        let state = ApiState {
            pipeline: Arc::new(builder.build()?),
            principals: self.principals,
        };

        #[allow(unused_mut)]
        let mut router = Router::new()
            .route("/", get(index))
            .route("/{entity}", get(list))
            .route("/{entity}/", get(list))
            .route("/{entity}/{id}", get(retrieve))
            .with_state(state);

        #[cfg(feature = "openapi")]
        if let Some(doc) = docs {
            router = router.merge(linkr_openapi::openapi_routes(&doc));
        }

        let mut router = router.layer(catch_panic_layer()).layer(default_trace());
        if settings.cors {
            router = router.layer(default_cors());
        }
        tracing::info!(
            entities = registry.len(),
            media_types = ?settings.media_types,
            docs = settings.docs,
            "linkr router built"
        );
        Ok(router)
    }

    /// Build the router and serve it on `linkr.server.addr` until Ctrl-C or SIGTERM.
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.settings.addr.clone();
        let app = self.build()?;
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!(%addr, "linkr server listening");
        linkr_core::http::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("linkr server stopped");
        Ok(())
    }
}

async fn index(State(state): State<ApiState>, headers: HeaderMap) -> Result<Response, HttpError> {
    let principal = state.principals.resolve(&headers)?;
    let rendered = state.pipeline.index(&principal, accept(&headers)).await?;
    Ok(respond(rendered))
}

async fn list(
    State(state): State<ApiState>,
    Path(entity): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    let principal = state.principals.resolve(&headers)?;
    let params = parse_query_string(query.as_deref());
    let rendered = state
        .pipeline
        .list(&principal, &entity, &params, accept(&headers))
        .await?;
    Ok(respond(rendered))
}

async fn retrieve(
    State(state): State<ApiState>,
    Path((entity, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    let principal = state.principals.resolve(&headers)?;
    let rendered = state
        .pipeline
        .retrieve(&principal, &entity, &id, accept(&headers))
        .await?;
    Ok(respond(rendered))
}

fn accept(headers: &HeaderMap) -> Option<&str> {
    headers.get(ACCEPT).and_then(|v| v.to_str().ok())
}

fn respond(rendered: Rendered) -> Response {
    let mut response = rendered.body.into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(rendered.media_type));
    headers.insert(VARY, HeaderValue::from_static("Accept"));
    response
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
