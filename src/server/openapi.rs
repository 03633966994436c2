//! OpenAPI fragments describing the guarded routes: one `apiKey` security
//! scheme per credential kind, the per-route security requirement, and the
//! shared 401 response.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::authn::{Credential, CredentialKind};
use crate::authz::chain::Guard;
use crate::claims::ClaimValue;

/// Rule names copied into the security requirement when a guard has them.
const DOCUMENTED_RULES: [&str; 2] = ["scopes", "rights"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: &'static str,

    #[serde(rename = "in")]
    pub location: &'static str,

    #[serde(rename = "bearerFormat")]
    pub bearer_format: &'static str,

    pub name: String,
}

impl SecurityScheme {
    pub fn new(credential: &Credential) -> Self {
        Self {
            scheme_type: "apiKey",
            location: credential.location.as_str(),
            bearer_format: "JWT",
            name: credential.key_name.clone(),
        }
    }
}

/// Schemes for the conventional credential of every kind, keyed by kind.
pub fn security_schemes() -> BTreeMap<&'static str, SecurityScheme> {
    CredentialKind::ALL
        .iter()
        .map(|kind| (kind.as_str(), SecurityScheme::new(&Credential::new(*kind))))
        .collect()
}

/// Security requirement of one guard: its scheme, plus the expected values
/// of its `scopes` and `rights` rules so API consumers see what is checked.
pub fn security_requirement(guard: &Guard) -> Map<String, Value> {
    let scheme = SecurityScheme::new(&guard.credential);
    let mut requirement = match serde_json::to_value(scheme) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };

    for name in DOCUMENTED_RULES {
        if let Some(rule) = guard.policy.get(name) {
            let values = match &rule.value {
                ClaimValue::Scalar(value) => vec![Value::String(value.clone())],
                ClaimValue::Set(values) => values.iter().cloned().map(Value::String).collect(),
            };
            requirement.insert(name.to_string(), Value::Array(values));
        }
    }
    requirement
}

/// Response object documenting the 401 every guarded route may return.
pub fn unauthorized_response() -> Value {
    json!({
        "description": "UNAUTHORIZED, received an unvalidated access key",
        "content": {
            "application/json": {
                "schema": {
                    "type": "object",
                    "title": "unauthorized.access",
                    "properties": {
                        "statusCode": {"type": "number"},
                        "error": {
                            "type": "object",
                            "properties": {
                                "name": {"type": "string"},
                                "message": {"type": "string"},
                            },
                        },
                    },
                },
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use crate::authn::TokenLocation;
    use crate::authz::{ComparisonRule, Operator, Policy};

    use super::*;

    #[test]
    fn test_security_schemes() {
        let schemes = security_schemes();
        assert_eq!(schemes.len(), 4);
        assert_eq!(schemes["platform"].name, "bige-apim-key");

        let value = serde_json::to_value(&schemes["user"]).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "apiKey",
                "in": "header",
                "bearerFormat": "JWT",
                "name": "bige-api-key",
            })
        );
    }

    #[test]
    fn test_security_requirement() {
        let policy = Policy::new()
            .with_rule(
                "scopes",
                ComparisonRule::new("scopes", Operator::OneOf, ClaimValue::set(["user"])),
            )
            .unwrap()
            .with_rule("rights", ComparisonRule::new("rights", Operator::In, "SUPER_ADMIN"))
            .unwrap()
            .with_rule("org", ComparisonRule::new("org", Operator::Eq, "acme"))
            .unwrap();
        let credential = Credential::new(CredentialKind::App)
            .with_key_name("app-token")
            .with_location(TokenLocation::Query);
        let guard = Guard::new(credential, policy);

        let requirement = security_requirement(&guard);
        assert_eq!(
            Value::Object(requirement),
            json!({
                "type": "apiKey",
                "in": "query",
                "bearerFormat": "JWT",
                "name": "app-token",
                "scopes": ["user"],
                "rights": ["SUPER_ADMIN"],
            })
        );
    }
}
