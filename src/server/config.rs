use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use actix_web::http::Method;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::authn::config::TokenConfig;
use crate::authn::CredentialKind;
use crate::authz::config::{GuardConfig, RuleConfig};
use crate::authz::Operator;
use crate::claims::ClaimValue;
use crate::config::{expandenv, CommonConfig};
use crate::logs::LogConfig;

use super::handlers::HandlerKind;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_bind")]
    pub bind: String,

    /// Number of actix workers, 0 uses the number of CPUs.
    #[serde(default)]
    pub workers: u64,

    /// 0 keeps the actix default.
    #[serde(default)]
    pub keep_alive_secs: u64,

    #[serde(default = "LogConfig::default")]
    pub logs: LogConfig,

    #[serde(default = "TokenConfig::default")]
    pub token: TokenConfig,

    /// Route table. When omitted, the demo routes are served.
    #[serde(default = "ServerConfig::default_routes")]
    pub routes: Vec<RouteConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    #[serde(default = "RouteConfig::default_method")]
    pub method: RouteMethod,

    /// actix path pattern, `{name}` segments become request params.
    pub path: String,

    pub handler: HandlerKind,

    /// Every guard must permit. No guards means a public route.
    #[serde(default)]
    pub guards: Vec<GuardConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl CommonConfig for ServerConfig {
    fn default() -> Self {
        Self {
            bind: Self::default_bind(),
            workers: 0,
            keep_alive_secs: 0,
            logs: LogConfig::default(),
            token: TokenConfig::default(),
            routes: Self::default_routes(),
        }
    }

    fn complete(&mut self) -> Result<()> {
        self.bind = expandenv("bind", &self.bind)?;
        if self.bind.is_empty() {
            bail!("bind cannot be empty");
        }

        self.logs.complete().context("logs")?;
        self.token.complete().context("token")?;

        let mut seen = HashSet::new();
        for route in self.routes.iter_mut() {
            route.complete()?;
            if !seen.insert((route.method, route.path.clone())) {
                bail!("duplicate route {} {}", route.method, route.path);
            }
        }

        Ok(())
    }
}

impl ServerConfig {
    pub fn default_bind() -> String {
        String::from("127.0.0.1:3000")
    }

    pub fn default_routes() -> Vec<RouteConfig> {
        let mut user = GuardConfig::new(CredentialKind::User);
        user.rules = vec![
            RuleConfig {
                name: String::from("scopes"),
                key: None,
                operator: Operator::OneOf,
                value: ClaimValue::set(["user", "app/{id}:owner"]),
            },
            RuleConfig {
                name: String::from("rights"),
                key: None,
                operator: Operator::OneOf,
                value: ClaimValue::set(["SUPER_ADMIN"]),
            },
        ];

        vec![
            RouteConfig::new("/healthz", HandlerKind::Healthz),
            RouteConfig::new("/security", HandlerKind::Security),
            RouteConfig::new("/noauth", HandlerKind::Ping),
            RouteConfig::new("/ping", HandlerKind::Ping).with_guard(user),
            RouteConfig::new("/identity", HandlerKind::Identity)
                .with_guard(GuardConfig::new(CredentialKind::User)),
        ]
    }

    /// Finds the route serving `method` + `path` (the configured pattern,
    /// not a concrete request path).
    pub fn find_route(&self, method: RouteMethod, path: &str) -> Option<&RouteConfig> {
        self.routes
            .iter()
            .find(|route| route.method == method && route.path == path)
    }
}

impl RouteConfig {
    pub fn new(path: impl Into<String>, handler: HandlerKind) -> Self {
        Self {
            method: Self::default_method(),
            path: path.into(),
            handler,
            guards: vec![],
        }
    }

    pub fn with_guard(mut self, guard: GuardConfig) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn default_method() -> RouteMethod {
        RouteMethod::Get
    }

    fn complete(&mut self) -> Result<()> {
        if !self.path.starts_with('/') {
            bail!("route path '{}' must start with '/'", self.path);
        }
        // Surface guard errors (duplicate rules, empty keys) at load time
        for guard in self.guards.iter() {
            guard
                .build_guard()
                .with_context(|| format!("route {} {}", self.method, self.path))?;
        }
        Ok(())
    }
}

impl RouteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteMethod::Get => "get",
            RouteMethod::Post => "post",
            RouteMethod::Put => "put",
            RouteMethod::Patch => "patch",
            RouteMethod::Delete => "delete",
        }
    }

    pub fn to_method(self) -> Method {
        match self {
            RouteMethod::Get => Method::GET,
            RouteMethod::Post => Method::POST,
            RouteMethod::Put => Method::PUT,
            RouteMethod::Patch => Method::PATCH,
            RouteMethod::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for RouteMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_lowercase().as_str() {
            "get" => RouteMethod::Get,
            "post" => RouteMethod::Post,
            "put" => RouteMethod::Put,
            "patch" => RouteMethod::Patch,
            "delete" => RouteMethod::Delete,
            _ => bail!("unsupported route method '{s}'"),
        })
    }
}

impl TryFrom<String> for RouteMethod {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RouteMethod> for String {
    fn from(value: RouteMethod) -> Self {
        value.as_str().to_string()
    }
}
