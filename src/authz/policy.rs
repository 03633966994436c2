use std::sync::Arc;

use crate::authn::TokenVerifier;
use crate::claims::ClaimSet;
use crate::error::AuthError;

use super::{substitute_all, OperatorEvaluator, Policy, RequestParams, RuleEvaluator};

/// Verifies a token, then checks every rule of a policy against its claims.
///
/// Rules run in their defined order and the first failure stops evaluation,
/// so later rules are never invoked. The evaluator holds no per-request
/// state, it can be shared by every guard and worker.
pub struct PolicyEvaluator<V: TokenVerifier, E: RuleEvaluator = OperatorEvaluator> {
    verifier: Arc<V>,
    evaluator: E,
}

impl<V: TokenVerifier> PolicyEvaluator<V> {
    pub fn new(verifier: Arc<V>) -> Self {
        Self {
            verifier,
            evaluator: OperatorEvaluator,
        }
    }
}

impl<V: TokenVerifier, E: RuleEvaluator> PolicyEvaluator<V, E> {
    pub fn with_evaluator(verifier: Arc<V>, evaluator: E) -> Self {
        Self {
            verifier,
            evaluator,
        }
    }

    /// Verifies `token` as of `now` and applies `policy`. An empty policy
    /// permits any valid token. On success the verified claims are returned
    /// unchanged.
    pub fn evaluate(
        &self,
        token: &str,
        policy: &Policy,
        params: &RequestParams,
        now: u64,
    ) -> Result<ClaimSet, AuthError> {
        let claims = self.verifier.verify_token(token, now)?;
        self.check_rules(&claims, policy, params)?;
        Ok(claims)
    }

    /// Applies `policy` to already verified claims.
    pub fn check_rules(
        &self,
        claims: &ClaimSet,
        policy: &Policy,
        params: &RequestParams,
    ) -> Result<(), AuthError> {
        for (name, rule) in policy.rules() {
            let Some(actual) = claims.get(&rule.key) else {
                return Err(AuthError::RuleFailed {
                    rule: name.to_string(),
                    reason: AuthError::MISSING_CLAIM,
                });
            };

            let rule = substitute_all(rule, params);
            let ok = self
                .evaluator
                .evaluate_rule(&rule, actual)
                .map_err(|source| AuthError::Evaluation {
                    rule: name.to_string(),
                    source,
                })?;
            if !ok {
                return Err(AuthError::RuleFailed {
                    rule: name.to_string(),
                    reason: AuthError::NOT_SATISFIED,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use crate::authn::jwt::tests::{sign, TEST_SECRET};
    use crate::authn::jwt::JwtVerifier;
    use crate::authz::{evaluate, ComparisonRule, Operator};
    use crate::claims::ClaimValue;
    use crate::error::{EvaluationError, VerificationError};

    use super::*;

    const NOW: u64 = 1_700_000_000;

    /// Counts invocations, then delegates to the real operators.
    #[derive(Default)]
    struct CountingEvaluator {
        calls: AtomicUsize,
    }

    impl RuleEvaluator for CountingEvaluator {
        fn evaluate_rule(
            &self,
            rule: &ComparisonRule,
            actual: &ClaimValue,
        ) -> Result<bool, EvaluationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            evaluate(rule.operator, &rule.value, actual)
        }
    }

    fn verifier() -> Arc<JwtVerifier> {
        Arc::new(JwtVerifier::new(TEST_SECRET, 0).unwrap())
    }

    fn user_token() -> String {
        sign(
            TEST_SECRET,
            json!({
                "sub": "alice",
                "role": "member",
                "scopes": ["user", "app/42:owner"],
                "rights": ["READ"],
                "exp": NOW + 3600,
            }),
        )
    }

    fn app_policy() -> Policy {
        Policy::new()
            .with_rule(
                "scopes",
                ComparisonRule::new(
                    "scopes",
                    Operator::OneOf,
                    ClaimValue::set(["admin", "app/{id}:owner"]),
                ),
            )
            .unwrap()
            .with_rule(
                "rights",
                ComparisonRule::new("rights", Operator::In, ClaimValue::set(["READ"])),
            )
            .unwrap()
    }

    fn params(id: &str) -> RequestParams {
        RequestParams::from([(String::from("id"), id.to_string())])
    }

    #[test]
    fn test_permit() {
        let evaluator = PolicyEvaluator::new(verifier());
        let token = user_token();

        let claims = evaluator
            .evaluate(&token, &app_policy(), &params("42"), NOW)
            .unwrap();
        assert_eq!(claims.get("sub"), Some(&ClaimValue::scalar("alice")));

        let result = evaluator.evaluate(&token, &app_policy(), &params("43"), NOW);
        assert!(matches!(
            result,
            Err(AuthError::RuleFailed { ref rule, reason }) if rule == "scopes" && reason == AuthError::NOT_SATISFIED
        ));
    }

    #[test]
    fn test_empty_policy() {
        let evaluator = PolicyEvaluator::new(verifier());

        let claims = evaluator
            .evaluate(&user_token(), &Policy::new(), &RequestParams::new(), NOW)
            .unwrap();
        assert_eq!(claims.len(), 5);

        // A token is still required
        let result = evaluator.evaluate("", &Policy::new(), &RequestParams::new(), NOW);
        assert!(matches!(
            result,
            Err(AuthError::Verification(VerificationError::Missing))
        ));
    }

    #[test]
    fn test_verification_first() {
        let counting = CountingEvaluator::default();
        let evaluator = PolicyEvaluator::with_evaluator(verifier(), counting);

        let expired = sign(TEST_SECRET, json!({"scopes": ["admin"], "exp": NOW - 1}));
        let result = evaluator.evaluate(&expired, &app_policy(), &params("42"), NOW);
        assert!(matches!(
            result,
            Err(AuthError::Verification(VerificationError::Expired))
        ));

        let forged = sign("wrong-secret", json!({"scopes": ["admin"]}));
        let result = evaluator.evaluate(&forged, &app_policy(), &params("42"), NOW);
        assert!(matches!(
            result,
            Err(AuthError::Verification(VerificationError::Invalid(_)))
        ));

        assert_eq!(evaluator.evaluator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_short_circuit() {
        let evaluator = PolicyEvaluator::with_evaluator(verifier(), CountingEvaluator::default());
        let policy = Policy::new()
            .with_rule("role", ComparisonRule::new("role", Operator::Eq, "admin"))
            .unwrap()
            .with_rule("scopes", ComparisonRule::new("scopes", Operator::In, "user"))
            .unwrap()
            .with_rule("sub", ComparisonRule::new("sub", Operator::Eq, "alice"))
            .unwrap();
        assert_eq!(policy.len(), 3);

        let result = evaluator.evaluate(&user_token(), &policy, &RequestParams::new(), NOW);
        assert!(matches!(result, Err(AuthError::RuleFailed { ref rule, .. }) if rule == "role"));
        assert_eq!(evaluator.evaluator.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_claim() {
        let evaluator = PolicyEvaluator::with_evaluator(verifier(), CountingEvaluator::default());
        let policy = Policy::new()
            .with_rule("org", ComparisonRule::new("org", Operator::Eq, "acme"))
            .unwrap();

        let result = evaluator.evaluate(&user_token(), &policy, &RequestParams::new(), NOW);
        assert!(matches!(
            result,
            Err(AuthError::RuleFailed { reason, .. }) if reason == AuthError::MISSING_CLAIM
        ));
        assert_eq!(evaluator.evaluator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shape_mismatch() {
        let evaluator = PolicyEvaluator::new(verifier());
        let policy = Policy::new()
            .with_rule("scopes", ComparisonRule::new("scopes", Operator::Eq, "user"))
            .unwrap();

        let result = evaluator.evaluate(&user_token(), &policy, &RequestParams::new(), NOW);
        assert!(matches!(
            result,
            Err(AuthError::Evaluation { ref rule, source: EvaluationError::ShapeMismatch { .. } }) if rule == "scopes"
        ));
    }

    #[test]
    fn test_idempotent() {
        let evaluator = PolicyEvaluator::new(verifier());
        let token = user_token();
        let policy = app_policy();
        let params = params("42");

        let first = evaluator.evaluate(&token, &policy, &params, NOW).unwrap();
        let second = evaluator.evaluate(&token, &policy, &params, NOW).unwrap();
        assert_eq!(first, second);
        // Substitution never touches the shared policy
        assert_eq!(policy, app_policy());
    }
}
