use log::debug;

use crate::claims::ClaimValue;

use super::{ComparisonRule, RequestParams};

/// Replaces every `{key}` marker in the rule value with `params[key]`. For a
/// set value, each element is rewritten. The source rule is left untouched.
///
/// When the request has no such parameter the marker stays as literal text,
/// so the rule can only match a claim that literally contains it.
pub fn substitute(rule: &ComparisonRule, key: &str, params: &RequestParams) -> ComparisonRule {
    let Some(replacement) = params.get(key) else {
        debug!("No request param '{key}' for rule on claim '{}'", rule.key);
        return rule.clone();
    };
    let marker = format!("{{{key}}}");
    map_value(rule, |s| s.replace(&marker, replacement))
}

/// Replaces all `{name}` markers in one pass. Substituted text is never
/// scanned again, so a parameter value containing braces stays as is.
pub fn substitute_all(rule: &ComparisonRule, params: &RequestParams) -> ComparisonRule {
    map_value(rule, |s| expand(s, params))
}

fn map_value<F>(rule: &ComparisonRule, f: F) -> ComparisonRule
where
    F: Fn(&str) -> String,
{
    let value = match &rule.value {
        ClaimValue::Scalar(s) => ClaimValue::Scalar(f(s)),
        ClaimValue::Set(items) => ClaimValue::Set(items.iter().map(|s| f(s)).collect()),
    };
    ComparisonRule {
        key: rule.key.clone(),
        operator: rule.operator,
        value,
    }
}

fn expand(s: &str, params: &RequestParams) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            // Unclosed brace, keep the tail verbatim
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &after[..end];
        match params.get(name) {
            Some(value) if !name.is_empty() && !name.contains('{') => out.push_str(value),
            _ => {
                if !name.is_empty() && !name.contains('{') {
                    debug!("No request param '{name}', keeping placeholder");
                }
                // Keep the opening brace and continue right after it, so a
                // nested `{{id}` still resolves its inner marker.
                out.push('{');
                rest = after;
                continue;
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}
