mod operator;
mod placeholder;

pub mod chain;
pub mod config;
pub mod factory;
pub mod policy;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::claims::ClaimValue;
use crate::error::{ConfigError, EvaluationError};

pub use operator::{evaluate, OperatorEvaluator};
pub use placeholder::{substitute, substitute_all};

/// Path and query parameters of the current request, used for placeholder
/// substitution only.
pub type RequestParams = HashMap<String, String>;

/// Trait that defines how a single comparison rule is checked against the
/// claim it names.
///
/// The policy evaluator calls it once per rule, in order, and stops at the
/// first `false` or error. It is shared across workers, so implementations must
/// be thread-safe.
pub trait RuleEvaluator: Send + Sync {
    /// Compares the (already substituted) rule value with the actual claim.
    fn evaluate_rule(
        &self,
        rule: &ComparisonRule,
        actual: &ClaimValue,
    ) -> Result<bool, EvaluationError>;
}

/// The closed set of comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    In,
    Nin,
    Eq,
    Neq,
    OneOf,
    Like,
    Ilike,
}

impl Operator {
    /// In ordinal order, matching the numeric encoding accepted in configs.
    pub const ALL: [Operator; 7] = [
        Operator::In,
        Operator::Nin,
        Operator::Eq,
        Operator::Neq,
        Operator::OneOf,
        Operator::Like,
        Operator::Ilike,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::In => "In",
            Operator::Nin => "Nin",
            Operator::Eq => "Eq",
            Operator::Neq => "Neq",
            Operator::OneOf => "OneOf",
            Operator::Like => "Like",
            Operator::Ilike => "Ilike",
        }
    }

    /// Shape the configured value must have: `None` accepts both.
    pub fn expected_shape(&self) -> Option<&'static str> {
        match self {
            Operator::In | Operator::Nin => None,
            Operator::OneOf => Some("set"),
            Operator::Eq | Operator::Neq | Operator::Like | Operator::Ilike => Some("scalar"),
        }
    }

    pub fn from_ordinal(n: u64) -> Result<Self, ConfigError> {
        match Self::ALL.get(n as usize) {
            Some(op) => Ok(*op),
            None => Err(ConfigError::UnknownOperator(n.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| ConfigError::UnknownOperator(s.to_string()))
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OperatorVisitor;

        impl Visitor<'_> for OperatorVisitor {
            type Value = Operator;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an operator name or its ordinal (0-6)")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Operator::from_ordinal(v).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                match u64::try_from(v) {
                    Ok(v) => self.visit_u64(v),
                    Err(_) => Err(E::custom(ConfigError::UnknownOperator(v.to_string()))),
                }
            }
        }

        deserializer.deserialize_any(OperatorVisitor)
    }
}

/// One named constraint on a claim, e.g. `scopes OneOf ["user", "app/{id}:owner"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRule {
    /// Claim name looked up in the verified token.
    pub key: String,
    pub operator: Operator,
    /// Expected value, may contain `{param}` placeholders.
    pub value: ClaimValue,
}

impl ComparisonRule {
    pub fn new(key: impl Into<String>, operator: Operator, value: impl Into<ClaimValue>) -> Self {
        Self {
            key: key.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Ordered, uniquely named comparison rules. All of them must pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    rules: Vec<(String, ComparisonRule)>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(
        mut self,
        name: impl Into<String>,
        rule: ComparisonRule,
    ) -> Result<Self, ConfigError> {
        self.push(name, rule)?;
        Ok(self)
    }

    pub fn push(&mut self, name: impl Into<String>, rule: ComparisonRule) -> Result<(), ConfigError> {
        let name = name.into();
        if rule.key.is_empty() {
            return Err(ConfigError::EmptyRuleKey(name));
        }
        if self.get(&name).is_some() {
            return Err(ConfigError::DuplicateRule(name));
        }
        if let Some(expected) = rule.operator.expected_shape() {
            let shape = rule.value.shape();
            if shape != expected {
                return Err(ConfigError::InvalidRuleShape {
                    rule: name,
                    operator: rule.operator,
                    shape,
                    expected,
                });
            }
        }
        self.rules.push((name, rule));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ComparisonRule> {
        self.rules
            .iter()
            .find(|(rule_name, _)| rule_name == name)
            .map(|(_, rule)| rule)
    }

    /// Rules in their defined order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &ComparisonRule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
