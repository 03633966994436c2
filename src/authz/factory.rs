use std::sync::Arc;

use log::{info, warn};

use crate::authn::config::TokenConfig;
use crate::authn::jwt::JwtVerifier;
use crate::authn::TokenVerifier;
use crate::error::ConfigError;

use super::chain::{Guard, GuardChain};
use super::config::GuardConfig;
use super::policy::PolicyEvaluator;

/// Builds guard chains that share one verifier and one policy evaluator.
pub struct GuardFactory<V: TokenVerifier> {
    evaluator: Arc<PolicyEvaluator<V>>,
}

impl GuardFactory<JwtVerifier> {
    /// Creates the factory from the token configuration. Fails if the secret
    /// is unset, so a misconfigured server never starts.
    pub fn from_config(cfg: &TokenConfig) -> Result<Self, ConfigError> {
        let verifier = cfg.build_verifier()?;
        if cfg.leeway_secs > 0 {
            info!("Token time checks allow {}s of clock skew", cfg.leeway_secs);
        }
        Ok(Self::new(Arc::new(verifier)))
    }
}

impl<V: TokenVerifier> GuardFactory<V> {
    pub fn new(verifier: Arc<V>) -> Self {
        Self {
            evaluator: Arc::new(PolicyEvaluator::new(verifier)),
        }
    }

    /// Builds the chain of a route from its guard configs, in order.
    pub fn build_chain(&self, cfgs: &[GuardConfig]) -> Result<GuardChain<V>, ConfigError> {
        let guards = cfgs
            .iter()
            .map(GuardConfig::build_guard)
            .collect::<Result<Vec<Guard>, ConfigError>>()?;

        for (idx, guard) in guards.iter().enumerate() {
            let duplicated = guards[..idx]
                .iter()
                .any(|other| other.credential.kind == guard.credential.kind);
            if duplicated {
                warn!(
                    "Credential kind {} is guarded twice, the last verified identity wins",
                    guard.credential.kind
                );
            }
        }

        Ok(GuardChain::new(self.evaluator.clone(), guards))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::authn::jwt::tests::{sign, TEST_SECRET};
    use crate::authn::{CredentialKind, RequestTokens};
    use crate::authz::config::RuleConfig;
    use crate::authz::{Operator, RequestParams};
    use crate::claims::ClaimValue;
    use crate::config::CommonConfig;

    use super::*;

    fn token_config() -> TokenConfig {
        let mut cfg = TokenConfig::default();
        cfg.secret = String::from(TEST_SECRET);
        cfg
    }

    #[test]
    fn test_build_chain() {
        let factory = GuardFactory::from_config(&token_config()).unwrap();

        let mut user = GuardConfig::new(CredentialKind::User);
        user.rules.push(RuleConfig {
            name: String::from("scopes"),
            key: None,
            operator: Operator::OneOf,
            value: ClaimValue::set(["app/{id}:owner"]),
        });
        let chain = factory.build_chain(&[user]).unwrap();
        assert_eq!(chain.guards().len(), 1);

        let token = sign(TEST_SECRET, json!({"scopes": ["app/9:owner"]}));
        let source = RequestTokens::new().header("bige-api-key", token);
        let params = RequestParams::from([(String::from("id"), String::from("9"))]);
        assert!(chain.check(&source, &params).is_ok());

        let params = RequestParams::from([(String::from("id"), String::from("10"))]);
        assert!(chain.check(&source, &params).is_err());
    }

    #[test]
    fn test_secret_unset() {
        let result = GuardFactory::from_config(&TokenConfig::default());
        assert!(matches!(result, Err(ConfigError::SecretUnset)));
    }
}
