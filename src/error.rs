use thiserror::Error;

use crate::authz::Operator;

/// Errors detected while loading guard configuration. All of them are fatal at
/// startup and never surface per request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("token secret is not set, configure `token.secret` or export BIGE_SECRET")]
    SecretUnset,

    #[error("unknown operator '{0}', expected one of In, Nin, Eq, Neq, OneOf, Like, Ilike")]
    UnknownOperator(String),

    #[error("unknown credential kind '{0}', expected one of user, app, public, platform")]
    UnknownCredential(String),

    #[error("unknown token location '{0}', expected one of header, query, cookie")]
    UnknownLocation(String),

    #[error("duplicate rule name '{0}'")]
    DuplicateRule(String),

    #[error("rule '{rule}' uses {operator} with a {shape} value, expected {expected}")]
    InvalidRuleShape {
        rule: String,
        operator: Operator,
        shape: &'static str,
        expected: &'static str,
    },

    #[error("rule '{0}' has an empty claim key")]
    EmptyRuleKey(String),

    #[error("credential key name cannot be empty")]
    EmptyKeyName,
}

/// Token verification failures. The cause is kept for logs only, callers get a
/// uniform denial whatever the variant.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("token is missing")]
    Missing,

    #[error("token expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// The operand shapes do not fit the operator. This is a configuration bug, not
/// a semantic denial.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("operator {operator} cannot compare {expected} (expected) with {actual} (actual)")]
    ShapeMismatch {
        operator: Operator,
        expected: &'static str,
        actual: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("verification failed: {0}")]
    Verification(#[from] VerificationError),

    #[error("rule '{rule}' misconfigured: {source}")]
    Evaluation {
        rule: String,
        #[source]
        source: EvaluationError,
    },

    #[error("rule '{rule}' failed: {reason}")]
    RuleFailed { rule: String, reason: &'static str },
}

impl AuthError {
    pub const MISSING_CLAIM: &'static str = "missing claim";
    pub const NOT_SATISFIED: &'static str = "comparison not satisfied";

    /// Stable taxonomy name, used in logs to tell the failure classes apart.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Verification(_) => "verification",
            AuthError::Evaluation { .. } => "evaluation",
            AuthError::RuleFailed { .. } => "rule_failed",
        }
    }
}
