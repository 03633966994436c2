use serde::{Deserialize, Serialize};

use crate::authn::{Credential, CredentialKind, TokenLocation};
use crate::claims::ClaimValue;
use crate::error::ConfigError;

use super::chain::Guard;
use super::{ComparisonRule, Operator, Policy};

/// One guard of a route: which credential to read and the rules its token
/// must pass.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Credential kind: `user`, `app`, `public` or `platform`.
    pub credential: CredentialKind,

    /// Header (or query/cookie) name carrying the token. Defaults to the
    /// kind's conventional header, e.g. `bige-api-key` for `user`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,

    #[serde(default = "GuardConfig::default_location")]
    pub location: TokenLocation,

    /// Rules that must all pass, checked in order. When empty, any valid
    /// token is accepted.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RuleConfig {
    pub name: String,

    /// Claim to compare. Defaults to the rule name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Operator name (case-insensitive) or ordinal.
    pub operator: Operator,

    pub value: ClaimValue,
}

impl GuardConfig {
    pub fn new(credential: CredentialKind) -> Self {
        Self {
            credential,
            key_name: None,
            location: Self::default_location(),
            rules: vec![],
        }
    }

    pub fn default_location() -> TokenLocation {
        TokenLocation::Header
    }

    pub fn build_guard(&self) -> Result<Guard, ConfigError> {
        let mut credential = Credential::new(self.credential).with_location(self.location);
        if let Some(key_name) = self.key_name.as_ref() {
            if key_name.trim().is_empty() {
                return Err(ConfigError::EmptyKeyName);
            }
            credential = credential.with_key_name(key_name.trim());
        }

        let mut policy = Policy::new();
        for rule in self.rules.iter() {
            policy.push(rule.name.clone(), rule.build_rule())?;
        }

        Ok(Guard::new(credential, policy))
    }
}

impl RuleConfig {
    pub fn build_rule(&self) -> ComparisonRule {
        let key = self.key.clone().unwrap_or_else(|| self.name.clone());
        ComparisonRule::new(key, self.operator, self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Guards {
        guards: Vec<GuardConfig>,
    }

    fn parse(s: &str) -> Vec<GuardConfig> {
        toml::from_str::<Guards>(s).unwrap().guards
    }

    #[test]
    fn test_build_guard() {
        let guards = parse(
            r#"
            [[guards]]
            credential = "user"

            [[guards.rules]]
            name = "scopes"
            operator = "OneOf"
            value = ["user", "app/{id}:owner"]

            [[guards.rules]]
            name = "is-admin"
            key = "role"
            operator = 2
            value = "admin"

            [[guards]]
            credential = "platform"
            key_name = "x-apim-token"
            location = "query"
            "#,
        );
        assert_eq!(guards.len(), 2);

        let guard = guards[0].build_guard().unwrap();
        assert_eq!(guard.credential, Credential::new(CredentialKind::User));
        assert_eq!(guard.policy.len(), 2);
        let scopes = guard.policy.get("scopes").unwrap();
        assert_eq!(scopes.key, "scopes");
        assert_eq!(scopes.operator, Operator::OneOf);
        let admin = guard.policy.get("is-admin").unwrap();
        assert_eq!(admin.key, "role");
        assert_eq!(admin.operator, Operator::Eq);
        assert_eq!(admin.value, ClaimValue::scalar("admin"));

        let guard = guards[1].build_guard().unwrap();
        assert_eq!(guard.credential.key_name, "x-apim-token");
        assert_eq!(guard.credential.location, TokenLocation::Query);
        assert!(guard.policy.is_empty());
    }

    #[test]
    fn test_invalid_guard() {
        let result = toml::from_str::<Guards>(
            r#"
            [[guards]]
            credential = "robot"
            "#,
        );
        assert!(result.is_err());

        let result = toml::from_str::<Guards>(
            r#"
            [[guards]]
            credential = "user"
            [[guards.rules]]
            name = "scopes"
            operator = "Between"
            value = "x"
            "#,
        );
        assert!(result.is_err());

        let mut guard = GuardConfig::new(CredentialKind::App);
        guard.key_name = Some(String::from("  "));
        assert!(matches!(guard.build_guard(), Err(ConfigError::EmptyKeyName)));

        let rule = RuleConfig {
            name: String::from("scopes"),
            key: None,
            operator: Operator::In,
            value: ClaimValue::scalar("user"),
        };
        let mut guard = GuardConfig::new(CredentialKind::App);
        guard.rules = vec![rule.clone(), rule];
        assert!(matches!(
            guard.build_guard(),
            Err(ConfigError::DuplicateRule(name)) if name == "scopes"
        ));

        let guards = parse(
            r#"
            [[guards]]
            credential = "user"
            [[guards.rules]]
            name = "scopes"
            operator = "OneOf"
            value = "admin"

            [[guards]]
            credential = "user"
            [[guards.rules]]
            name = "role"
            operator = "Like"
            value = ["admin"]
            "#,
        );
        assert!(matches!(
            guards[0].build_guard(),
            Err(ConfigError::InvalidRuleShape { rule, shape: "scalar", .. }) if rule == "scopes"
        ));
        assert!(matches!(
            guards[1].build_guard(),
            Err(ConfigError::InvalidRuleShape { rule, shape: "set", .. }) if rule == "role"
        ));
    }
}
