pub mod config;
pub mod error;
pub mod guards;
pub mod http;
pub mod layers;
pub mod params;

pub use config::{ConfigError, ConfigValue, FromConfigValue, LinkrConfig};
pub use error::{error_response, HttpError};
pub use guards::{
    AccessGate, Action, AllowAll, AnonymousResolver, Decision, Identity, Principal,
    PrincipalResolver, RoleAccessGate, StaticTokenResolver,
};
pub use layers::{catch_panic_layer, default_cors, default_trace, init_tracing};
pub use params::{parse_query_string, ParamError};

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::{AccessGate, Action, Decision, HttpError, LinkrConfig, Principal, PrincipalResolver};
}
