use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::config::{ConfigError, FromConfigValue, LinkrConfig};
use crate::error::HttpError;
use crate::http::header::{HeaderMap, AUTHORIZATION};

/// Trait representing an authenticated identity (user, service account, etc.).
pub trait Identity: Send + Sync {
    /// Unique subject identifier.
    fn sub(&self) -> &str;

    /// Roles associated with this identity.
    fn roles(&self) -> &[String];
}

/// The caller of a request, as far as the access gate is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    Authenticated { sub: String, roles: Vec<String> },
}

impl Principal {
    pub fn authenticated(sub: impl Into<String>, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Principal::Authenticated {
            sub: sub.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Principal::Anonymous)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles().iter().any(|r| r == role)
    }
}

impl Identity for Principal {
    fn sub(&self) -> &str {
        match self {
            Principal::Anonymous => "",
            Principal::Authenticated { sub, .. } => sub,
        }
    }

    fn roles(&self) -> &[String] {
        match self {
            Principal::Anonymous => &[],
            Principal::Authenticated { roles, .. } => roles,
        }
    }
}

/// What the caller wants to do with an entity. The API is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Retrieve,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::List => f.write_str("list"),
            Action::Retrieve => f.write_str("retrieve"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Authorization check that runs before any query is planned or data fetched.
///
/// `entity` is the name the client asked for, which may not exist; gates must
/// not reveal whether it does.
#[async_trait]
pub trait AccessGate: Send + Sync {
    async fn authorize(&self, principal: &Principal, entity: &str, action: Action) -> Decision;
}

/// Gate that lets every request through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl AccessGate for AllowAll {
    async fn authorize(&self, _principal: &Principal, _entity: &str, _action: Action) -> Decision {
        Decision::Allow
    }
}

/// Gate that requires one of a set of roles per entity.
///
/// Entities without a rule fall back to the default decision.
#[derive(Debug, Clone)]
pub struct RoleAccessGate {
    rules: HashMap<String, HashSet<String>>,
    default: Decision,
}

impl RoleAccessGate {
    /// A gate that allows unlisted entities.
    pub fn allow_by_default() -> Self {
        Self {
            rules: HashMap::new(),
            default: Decision::Allow,
        }
    }

    /// A gate that denies unlisted entities.
    pub fn deny_by_default() -> Self {
        Self {
            rules: HashMap::new(),
            default: Decision::Deny,
        }
    }

    /// Require any of `roles` for every action on `entity`.
    pub fn require(mut self, entity: &str, roles: &[&str]) -> Self {
        self.rules
            .entry(entity.to_string())
            .or_default()
            .extend(roles.iter().map(|r| r.to_string()));
        self
    }

    fn decide(&self, principal: &Principal, entity: &str) -> Decision {
        match self.rules.get(entity) {
            None => self.default,
            Some(required) if principal.roles().iter().any(|r| required.contains(r)) => Decision::Allow,
            Some(_) => Decision::Deny,
        }
    }
}

#[async_trait]
impl AccessGate for RoleAccessGate {
    async fn authorize(&self, principal: &Principal, entity: &str, action: Action) -> Decision {
        let decision = self.decide(principal, entity);
        if !decision.is_allowed() {
            tracing::warn!(sub = principal.sub(), entity, %action, "access denied");
        }
        decision
    }
}

/// Turns request headers into a [`Principal`].
///
/// Token verification itself lives outside linkr; implementations only map an
/// already trusted credential to a subject and roles.
pub trait PrincipalResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Result<Principal, HttpError>;
}

/// Resolver that treats every caller as anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousResolver;

impl PrincipalResolver for AnonymousResolver {
    fn resolve(&self, _headers: &HeaderMap) -> Result<Principal, HttpError> {
        Ok(Principal::Anonymous)
    }
}

/// Resolver backed by a fixed table of bearer tokens.
///
/// No `Authorization` header means anonymous; an unknown token or a non-bearer
/// scheme is rejected with 401.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenResolver {
    tokens: HashMap<String, Principal>,
}

impl StaticTokenResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load tokens from `linkr.security.tokens.<token> = "<subject>:<role>,<role>"`.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` when a value has no subject part.
    pub fn from_config(config: &LinkrConfig) -> Result<Self, ConfigError> {
        let mut resolver = Self::new();
        for (token, value) in config.entries_with_prefix("linkr.security.tokens") {
            let key = format!("linkr.security.tokens.{token}");
            let raw = String::from_config_value(value, &key)?;
            let (sub, roles) = raw.split_once(':').unwrap_or((raw.as_str(), ""));
            if sub.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key,
                    message: "expected '<subject>:<role>,<role>'".into(),
                });
            }
            let roles = roles.split(',').map(str::trim).filter(|r| !r.is_empty());
            resolver = resolver.with_token(token, Principal::authenticated(sub.trim(), roles));
        }
        Ok(resolver)
    }

    pub fn with_token(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.tokens.insert(token.into(), principal);
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl PrincipalResolver for StaticTokenResolver {
    fn resolve(&self, headers: &HeaderMap) -> Result<Principal, HttpError> {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Ok(Principal::Anonymous);
        };
        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| HttpError::Unauthorized("Unauthorized".into()))?;
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| HttpError::Unauthorized("Unauthorized".into()))
    }
}
