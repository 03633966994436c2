use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::server::response::Response;

use super::GuardedRequest;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub version: String,
    pub timestamp: u64,
}

pub fn handle(_greq: GuardedRequest) -> Response {
    let now = Utc::now().timestamp() as u64;
    Response::json(HealthResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now,
    })
}
