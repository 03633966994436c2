use std::sync::Arc;

use chrono::Utc;

use crate::authn::{Credential, TokenSource, TokenVerifier};
use crate::decision::{Decision, Denial, IdentityContext};

use super::policy::PolicyEvaluator;
use super::{OperatorEvaluator, Policy, RequestParams, RuleEvaluator};

/// One credential plus the policy its token must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    pub credential: Credential,
    pub policy: Policy,
}

impl Guard {
    pub fn new(credential: Credential, policy: Policy) -> Self {
        Self { credential, policy }
    }

    pub fn decide<V, E, S>(
        &self,
        evaluator: &PolicyEvaluator<V, E>,
        source: &S,
        params: &RequestParams,
        now: u64,
    ) -> Decision
    where
        V: TokenVerifier,
        E: RuleEvaluator,
        S: TokenSource + ?Sized,
    {
        let token = self.credential.extract(source).unwrap_or_default();
        let result = evaluator.evaluate(&token, &self.policy, params, now);
        Decision::from_result(self.credential.kind, result)
    }
}

/// The guards of one route. Every guard must permit; the first denial stops
/// the chain. A chain without guards lets every request through with an
/// empty identity.
pub struct GuardChain<V: TokenVerifier, E: RuleEvaluator = OperatorEvaluator> {
    evaluator: Arc<PolicyEvaluator<V, E>>,
    guards: Vec<Guard>,
}

impl<V: TokenVerifier, E: RuleEvaluator> GuardChain<V, E> {
    pub fn new(evaluator: Arc<PolicyEvaluator<V, E>>, guards: Vec<Guard>) -> Self {
        Self { evaluator, guards }
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub fn is_public(&self) -> bool {
        self.guards.is_empty()
    }

    pub fn check<S: TokenSource + ?Sized>(
        &self,
        source: &S,
        params: &RequestParams,
    ) -> Result<IdentityContext, Denial> {
        let now = Utc::now().timestamp() as u64;
        self.check_at(source, params, now)
    }

    /// Runs every guard as of the unix timestamp `now`, collecting the
    /// verified claims of each credential kind.
    pub fn check_at<S: TokenSource + ?Sized>(
        &self,
        source: &S,
        params: &RequestParams,
        now: u64,
    ) -> Result<IdentityContext, Denial> {
        let mut ctx = IdentityContext::new();
        for guard in self.guards.iter() {
            match guard.decide(self.evaluator.as_ref(), source, params, now) {
                Decision::Permit(claims) => ctx.attach(guard.credential.kind, claims),
                Decision::Deny(denial) => return Err(denial),
            }
        }
        Ok(ctx)
    }
}
