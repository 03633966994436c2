use std::collections::HashMap;

use actix_web::web::Query;
use actix_web::HttpRequest;
use log::debug;

use crate::authn::{TokenLocation, TokenSource};
use crate::authz::RequestParams;

impl TokenSource for HttpRequest {
    fn lookup(&self, location: TokenLocation, name: &str) -> Option<String> {
        match location {
            TokenLocation::Header => self
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(String::from),
            TokenLocation::Query => query_params(self).remove(name),
            TokenLocation::Cookie => self.cookie(name).map(|c| c.value().to_string()),
        }
    }
}

/// Params used for placeholder substitution: the query string, overridden by
/// the path segments matched by the route pattern.
pub fn request_params(req: &HttpRequest) -> RequestParams {
    let mut params = query_params(req);
    for (name, value) in req.match_info().iter() {
        params.insert(name.to_string(), value.to_string());
    }
    debug!(
        "- {} {}, params: {:?}, peer: {:?}",
        req.method(),
        req.path(),
        params,
        req.peer_addr()
    );
    params
}

fn query_params(req: &HttpRequest) -> HashMap<String, String> {
    match Query::<HashMap<String, String>>::from_query(req.query_string()) {
        Ok(query) => query.into_inner(),
        Err(e) => {
            debug!("Ignoring malformed query string: {e}");
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;

    use crate::authn::{Credential, CredentialKind};

    use super::*;

    #[test]
    fn test_lookup() {
        let req = TestRequest::with_uri("/ping?key=from-query")
            .insert_header(("Bige-Api-Key", "Bearer from-header"))
            .cookie(Cookie::new("session", "from-cookie"))
            .to_http_request();

        let user = Credential::new(CredentialKind::User);
        assert_eq!(user.extract(&req).as_deref(), Some("from-header"));

        assert_eq!(
            req.lookup(TokenLocation::Query, "key").as_deref(),
            Some("from-query")
        );
        assert_eq!(
            req.lookup(TokenLocation::Cookie, "session").as_deref(),
            Some("from-cookie")
        );
        assert_eq!(req.lookup(TokenLocation::Header, "bige-app-key"), None);
    }

    #[test]
    fn test_request_params() {
        let req = TestRequest::with_uri("/apps/42?id=7&name=demo")
            .param("id", "42")
            .to_http_request();

        let params = request_params(&req);
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert_eq!(params.get("name").map(String::as_str), Some("demo"));
    }
}
