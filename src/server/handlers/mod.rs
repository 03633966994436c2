mod healthz;
mod identity;
mod ping;
mod security;

use std::fmt;

use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};

use crate::authz::RequestParams;
use crate::decision::IdentityContext;

use super::response::Response;
use super::restful::{RestfulContext, Route};

/// Handlers a route can be bound to in the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    /// Bounces greeting, date, url and headers back.
    Ping,
    /// Returns the identities verified by the route's guards.
    Identity,
    Healthz,
    /// Lists the security requirements of every route.
    Security,
}

/// Everything a handler sees once the route's guards have permitted the
/// request.
pub struct GuardedRequest<'a> {
    pub req: &'a HttpRequest,
    pub route: &'a Route,
    pub params: RequestParams,
    pub identity: IdentityContext,
    pub ctx: &'a RestfulContext,
}

impl HandlerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::Ping => "ping",
            HandlerKind::Identity => "identity",
            HandlerKind::Healthz => "healthz",
            HandlerKind::Security => "security",
        }
    }

    pub fn handle(&self, greq: GuardedRequest) -> Response {
        match self {
            HandlerKind::Ping => ping::handle(greq),
            HandlerKind::Identity => identity::handle(greq),
            HandlerKind::Healthz => healthz::handle(greq),
            HandlerKind::Security => security::handle(greq),
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
