use std::collections::BTreeSet;

use crate::claims::ClaimValue;
use crate::error::EvaluationError;

use super::{ComparisonRule, Operator, RuleEvaluator};

/// The default rule evaluator: applies the rule's operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorEvaluator;

impl RuleEvaluator for OperatorEvaluator {
    fn evaluate_rule(
        &self,
        rule: &ComparisonRule,
        actual: &ClaimValue,
    ) -> Result<bool, EvaluationError> {
        evaluate(rule.operator, &rule.value, actual)
    }
}

/// Compares an `expected` (configured) value with the `actual` claim value.
///
/// Shapes the operator does not accept are an [`EvaluationError`], never a
/// silent `false`:
///
/// | Operator          | expected      | actual |
/// |-------------------|---------------|--------|
/// | `In`, `Nin`       | scalar or set | set    |
/// | `Eq`, `Neq`       | scalar        | scalar |
/// | `OneOf`           | set           | set    |
/// | `Like`, `Ilike`   | scalar        | scalar |
pub fn evaluate(
    operator: Operator,
    expected: &ClaimValue,
    actual: &ClaimValue,
) -> Result<bool, EvaluationError> {
    use ClaimValue::{Scalar, Set};

    let result = match (operator, expected, actual) {
        (Operator::In, Scalar(value), Set(actual)) => actual.contains(value),
        (Operator::In, Set(values), Set(actual)) => contains_all(values, actual),

        (Operator::Nin, Scalar(value), Set(actual)) => !actual.contains(value),
        // A configured set is checked element by element and denies as soon as
        // one element is missing from the claim, the same way `In` does.
        (Operator::Nin, Set(values), Set(actual)) => contains_all(values, actual),

        (Operator::Eq, Scalar(value), Scalar(actual)) => value == actual,
        (Operator::Neq, Scalar(value), Scalar(actual)) => value != actual,

        (Operator::OneOf, Set(values), Set(actual)) => !values.is_disjoint(actual),

        (Operator::Like | Operator::Ilike, Scalar(value), Scalar(actual)) => {
            actual.to_lowercase().contains(&value.to_lowercase())
        }

        _ => {
            return Err(EvaluationError::ShapeMismatch {
                operator,
                expected: expected.shape(),
                actual: actual.shape(),
            })
        }
    };

    Ok(result)
}

fn contains_all(values: &BTreeSet<String>, actual: &BTreeSet<String>) -> bool {
    values.iter().all(|value| actual.contains(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> ClaimValue {
        ClaimValue::set(items.iter().copied())
    }

    fn scalar(value: &str) -> ClaimValue {
        ClaimValue::scalar(value)
    }

    #[test]
    fn test_in() {
        let expected = set(&["a", "b"]);
        assert!(evaluate(Operator::In, &expected, &set(&["a", "b", "c"])).unwrap());
        assert!(!evaluate(Operator::In, &expected, &set(&["a"])).unwrap());

        assert!(evaluate(Operator::In, &scalar("a"), &set(&["a", "c"])).unwrap());
        assert!(!evaluate(Operator::In, &scalar("b"), &set(&["a", "c"])).unwrap());

        // Empty expectation is vacuously satisfied
        assert!(evaluate(Operator::In, &set(&[]), &set(&[])).unwrap());
    }

    #[test]
    fn test_nin() {
        assert!(evaluate(Operator::Nin, &scalar("banned"), &set(&["user"])).unwrap());
        assert!(!evaluate(Operator::Nin, &scalar("banned"), &set(&["user", "banned"])).unwrap());

        assert!(evaluate(Operator::Nin, &set(&["a", "b"]), &set(&["a", "b", "c"])).unwrap());
        assert!(!evaluate(Operator::Nin, &set(&["a", "b"]), &set(&["a"])).unwrap());
    }

    #[test]
    fn test_eq_neq() {
        assert!(evaluate(Operator::Eq, &scalar("admin"), &scalar("admin")).unwrap());
        assert!(!evaluate(Operator::Eq, &scalar("admin"), &scalar("Admin")).unwrap());

        assert!(evaluate(Operator::Neq, &scalar("admin"), &scalar("guest")).unwrap());
        assert!(!evaluate(Operator::Neq, &scalar("admin"), &scalar("admin")).unwrap());
    }

    #[test]
    fn test_one_of() {
        let expected = set(&["admin", "owner"]);
        assert!(evaluate(Operator::OneOf, &expected, &set(&["user", "owner"])).unwrap());
        assert!(!evaluate(Operator::OneOf, &expected, &set(&["user", "guest"])).unwrap());
        assert!(!evaluate(Operator::OneOf, &set(&[]), &set(&["user"])).unwrap());
    }

    #[test]
    fn test_like() {
        let actual = scalar("this-is-an-admin-role");
        for op in [Operator::Like, Operator::Ilike] {
            assert!(evaluate(op, &scalar("ADMIN"), &actual).unwrap());
            assert!(evaluate(op, &scalar("admin"), &actual).unwrap());
            assert!(!evaluate(op, &scalar("xyz"), &actual).unwrap());
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let cases = [
            (Operator::In, scalar("a"), scalar("a")),
            (Operator::Nin, set(&["a"]), scalar("a")),
            (Operator::Eq, set(&["a"]), scalar("a")),
            (Operator::Neq, scalar("a"), set(&["a"])),
            (Operator::OneOf, scalar("a"), set(&["a"])),
            (Operator::OneOf, set(&["a"]), scalar("a")),
            (Operator::Like, set(&["a"]), scalar("a")),
            (Operator::Ilike, scalar("a"), set(&["a"])),
        ];
        for (op, expected, actual) in cases {
            let result = evaluate(op, &expected, &actual);
            assert!(
                matches!(result, Err(EvaluationError::ShapeMismatch { operator, .. }) if operator == op),
                "{op} should reject {} / {}",
                expected.shape(),
                actual.shape()
            );
        }
    }
}
