use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A claim or rule operand: either one string or a set of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Scalar(String),
    Set(BTreeSet<String>),
}

impl ClaimValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        ClaimValue::Scalar(value.into())
    }

    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ClaimValue::Set(items.into_iter().map(Into::into).collect())
    }

    /// Shape name used in evaluation error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            ClaimValue::Scalar(_) => "scalar",
            ClaimValue::Set(_) => "set",
        }
    }

    /// Converts a decoded JSON claim. `null` and objects have no
    /// representation and yield `None`; nested values inside arrays are
    /// skipped the same way.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(ClaimValue::Set(
                items.iter().filter_map(json_scalar).collect(),
            )),
            other => json_scalar(other).map(ClaimValue::Scalar),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ClaimValue::Scalar(s) => Value::String(s.clone()),
            ClaimValue::Set(set) => Value::Array(set.iter().cloned().map(Value::String).collect()),
        }
    }
}

fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        ClaimValue::Scalar(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        ClaimValue::Scalar(value)
    }
}

impl From<BTreeSet<String>> for ClaimValue {
    fn from(value: BTreeSet<String>) -> Self {
        ClaimValue::Set(value)
    }
}

/// Identity attributes decoded from a verified token. Lives for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet {
    claims: BTreeMap<String, ClaimValue>,
}

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(payload: Map<String, Value>) -> Self {
        let mut claims = BTreeMap::new();
        for (name, value) in payload {
            match ClaimValue::from_json(&value) {
                Some(value) => {
                    claims.insert(name, value);
                }
                None => debug!("Dropping claim '{name}': no string or set representation"),
            }
        }
        Self { claims }
    }

    pub fn to_json(&self) -> Map<String, Value> {
        self.claims
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ClaimValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ClaimValue>) {
        self.claims.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ClaimValue> {
        self.claims.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ClaimValue> {
        self.claims.iter()
    }
}
