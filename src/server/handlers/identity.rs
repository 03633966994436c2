use crate::server::response::Response;

use super::GuardedRequest;

pub fn handle(greq: GuardedRequest) -> Response {
    Response::json(greq.identity)
}
