use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::server::response::Response;

use super::GuardedRequest;

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub greeting: String,
    pub date: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

const GREETING: &str = "Hello from bige-guard";
const REDACTED: &str = "<redacted>";

pub fn handle(greq: GuardedRequest) -> Response {
    // Credential headers of this route are never echoed back
    let secret_headers: Vec<String> = greq
        .route
        .chain
        .guards()
        .iter()
        .map(|guard| guard.credential.key_name.to_lowercase())
        .collect();

    let headers = greq
        .req
        .headers()
        .iter()
        .map(|(name, value)| {
            let name = name.as_str().to_string();
            let value = if secret_headers.contains(&name) {
                String::from(REDACTED)
            } else {
                value.to_str().unwrap_or_default().to_string()
            };
            (name, value)
        })
        .collect();

    Response::json(PingResponse {
        name: greq.params.get("name").cloned(),
        greeting: String::from(GREETING),
        date: Utc::now().to_rfc3339(),
        url: greq.req.uri().to_string(),
        headers,
    })
}
