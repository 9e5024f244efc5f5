//! A read-only schedule API: sports, halls, teachers, courses and enrollments.

pub mod schema;
pub mod seed;

use std::sync::Arc;

use linkr::prelude::*;
use linkr::{ConfigError, HalError};
use sqlx::sqlite::SqlitePoolOptions;

pub use schema::{access_gate, registry};

/// Where the rows come from: `schedule.database.url` if set, the built-in seed otherwise.
pub async fn gateway(config: &LinkrConfig) -> Result<Arc<dyn FetchGateway>, Box<dyn std::error::Error + Send + Sync>> {
    let url: String = config.get_or("schedule.database.url", String::new())?;
    if url.trim().is_empty() {
        tracing::info!("serving built-in seed data from memory");
        return Ok(Arc::new(seed::memory_gateway()));
    }
    // Every connection to an in-memory database sees its own empty database.
    let max_connections = if url.contains(":memory:") {
        1
    } else {
        config.get_or("schedule.database.pool", 5u32)?
    };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(&url)
        .await?;
    tracing::info!(%url, "serving schedule data from SQLite");
    Ok(Arc::new(seed::sqlite_gateway(pool).await?))
}

/// The fully configured API, minus the gateway.
pub fn api(config: &LinkrConfig) -> Result<ApiBuilder, ConfigError> {
    let registry = registry().map_err(|e: HalError| ConfigError::Invalid {
        key: "schedule".into(),
        message: e.to_string(),
    })?;
    Ok(ApiBuilder::new(registry)
        .with_settings(ApiSettings::from_config(config)?)
        .with_access_gate(Arc::new(access_gate()))
        .with_principal_resolver(Arc::new(StaticTokenResolver::from_config(config)?))
        .with_description("Course schedule of the university sports centre"))
}
