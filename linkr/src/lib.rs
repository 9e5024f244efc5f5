//! linkr: read-only hypermedia REST APIs over declared entities.
//!
//! Declare entities in a [`SchemaRegistry`], hand it a [`FetchGateway`], and
//! [`ApiBuilder`] produces an axum `Router` serving HAL+JSON (or plain JSON)
//! collections and instances with self, relationship and pagination links.
//!
//! ```ignore
//! use linkr::prelude::*;
//!
//! let config = LinkrConfig::load("dev")?;
//! ApiBuilder::new(registry)
//!     .with_settings(ApiSettings::from_config(&config)?)
//!     .with_gateway(Arc::new(gateway))
//!     .serve()
//!     .await?;
//! ```
//!
//! # Feature flags
//!
//! | Feature   | Default | Crate                          |
//! |-----------|---------|--------------------------------|
//! | `openapi` | **yes** | `linkr-openapi`                |
//! | `sqlite`  | no      | `linkr-data-sqlx` (SQLite)     |

mod app;
mod settings;

pub use app::ApiBuilder;
pub use settings::ApiSettings;

pub use linkr_core;
pub use linkr_data;
#[cfg(feature = "sqlite")]
pub use linkr_data_sqlx;
pub use linkr_hal;
#[cfg(feature = "openapi")]
pub use linkr_openapi;

pub use linkr_core::{
    init_tracing, AccessGate, AllowAll, ConfigError, HttpError, LinkrConfig, Principal,
    PrincipalResolver, RoleAccessGate, StaticTokenResolver,
};
pub use linkr_data::{
    Computed, EntityDef, FetchGateway, Field, MemoryGateway, Relationship, Row, SchemaRegistry,
};
pub use linkr_hal::HalError;

pub mod prelude {
    //! Everything an application needs to declare and serve an API.
    pub use crate::{
        init_tracing, AccessGate, AllowAll, ApiBuilder, ApiSettings, Computed, EntityDef,
        FetchGateway, Field, LinkrConfig, MemoryGateway, Principal, Relationship, RoleAccessGate,
        Row, SchemaRegistry, StaticTokenResolver,
    };
    pub use std::sync::Arc;
}
