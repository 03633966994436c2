use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::server::openapi::{self, SecurityScheme};
use crate::server::response::Response;

use super::GuardedRequest;

#[derive(Debug, Serialize)]
pub struct SecurityListing {
    pub schemes: BTreeMap<&'static str, SecurityScheme>,
    pub routes: Vec<RouteSecurity>,
}

#[derive(Debug, Serialize)]
pub struct RouteSecurity {
    pub method: String,
    pub path: String,
    pub handler: String,
    pub security: Vec<Map<String, Value>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, Value>,
}

pub fn handle(greq: GuardedRequest) -> Response {
    let routes = greq
        .ctx
        .routes
        .iter()
        .map(|route| {
            let security: Vec<_> = route
                .chain
                .guards()
                .iter()
                .map(openapi::security_requirement)
                .collect();
            let mut responses = BTreeMap::new();
            if !security.is_empty() {
                responses.insert(String::from("401"), openapi::unauthorized_response());
            }
            RouteSecurity {
                method: route.method.to_string(),
                path: route.path.clone(),
                handler: route.handler.to_string(),
                security,
                responses,
            }
        })
        .collect();

    Response::json(SecurityListing {
        schemes: openapi::security_schemes(),
        routes,
    })
}
