//! Condition Evaluator
//!
//! A rule condition is a template that renders to one of:
//!
//! - `""` - never satisfied
//! - `all` - always satisfied
//! - `A__OP__B` - a binary comparison, `OP` being `equals` or `startswith`

use super::attributes::NodeAttributes;
use super::template::render;
use crate::error::{Error, Result};
use std::fmt;

/// Expression that matches every node
pub const MATCH_ALL: &str = "all";

/// Separator between the operands and operator of a comparison
pub const SEPARATOR: &str = "__";

/// Comparison operator of an `A__OP__B` condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `A` starts with `B`
    StartsWith,
    /// `A` equals `B`
    Equals,
}

impl Operator {
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "startswith" => Some(Operator::StartsWith),
            "equals" => Some(Operator::Equals),
            _ => None,
        }
    }

    pub fn apply(&self, left: &str, right: &str) -> bool {
        match self {
            Operator::StartsWith => left.starts_with(right),
            Operator::Equals => left == right,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::StartsWith => write!(f, "startswith"),
            Operator::Equals => write!(f, "equals"),
        }
    }
}

/// A rendered condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Never,
    Always,
    Compare {
        left: String,
        op: Operator,
        right: String,
    },
}

impl Condition {
    /// Parse an already rendered expression
    ///
    /// Segments after the third `__`-separated one are ignored.
    pub fn parse(expression: &str) -> Result<Self> {
        if expression.is_empty() {
            return Ok(Condition::Never);
        }
        if expression == MATCH_ALL {
            return Ok(Condition::Always);
        }

        let mut parts = expression.split(SEPARATOR);
        let (Some(left), Some(op), Some(right)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(Error::malformed(expression, "expected A__OP__B"));
        };

        let op = Operator::parse(op).ok_or_else(|| {
            Error::malformed(expression, format!("unsupported operator '{}'", op))
        })?;

        Ok(Condition::Compare {
            left: left.to_string(),
            op,
            right: right.to_string(),
        })
    }

    pub fn is_satisfied(&self) -> bool {
        match self {
            Condition::Never => false,
            Condition::Always => true,
            Condition::Compare { left, op, right } => op.apply(left, right),
        }
    }
}

/// Render a condition template and evaluate it against node attributes
pub fn evaluate(attrs: &NodeAttributes, expression: &str) -> Result<bool> {
    let rendered = render(expression, attrs);
    Condition::parse(&rendered).map(|condition| condition.is_satisfied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn attrs(pairs: &[(&str, &str)]) -> NodeAttributes {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_empty_is_never() {
        assert!(!evaluate(&attrs(&[]), "").unwrap());
    }

    #[test]
    fn test_all_is_always() {
        assert!(evaluate(&attrs(&[]), "all").unwrap());
        assert!(evaluate(&attrs(&[("env", "dev")]), "all").unwrap());
    }

    #[test]
    fn test_rendered_all_is_always() {
        assert!(evaluate(&attrs(&[("scope", "all")]), "<<scope>>").unwrap());
    }

    #[test]
    fn test_equals() {
        let expr = "<<env>>__equals__prod";
        assert!(evaluate(&attrs(&[("env", "prod")]), expr).unwrap());
        assert!(!evaluate(&attrs(&[("env", "dev")]), expr).unwrap());
        assert!(!evaluate(&attrs(&[("env", "production")]), expr).unwrap());
    }

    #[test]
    fn test_equals_between_attributes() {
        let expr = "<<a>>__equals__<<b>>";
        assert!(evaluate(&attrs(&[("a", "x1"), ("b", "x1")]), expr).unwrap());
        assert!(!evaluate(&attrs(&[("a", "x1"), ("b", "x2")]), expr).unwrap());
    }

    #[test]
    fn test_startswith_checks_left_prefix() {
        let expr = "<<host>>__startswith__web";
        assert!(evaluate(&attrs(&[("host", "web01")]), expr).unwrap());
        assert!(!evaluate(&attrs(&[("host", "db01")]), expr).unwrap());

        // Left operand is the haystack
        assert!(!evaluate(&attrs(&[("host", "we")]), expr).unwrap());
        assert!(evaluate(&attrs(&[]), "abc__startswith__").unwrap());
    }

    #[test]
    fn test_unresolved_placeholder_compares_literally() {
        assert!(!evaluate(&attrs(&[]), "<<env>>__equals__prod").unwrap());
        assert!(evaluate(&attrs(&[]), "<<env>>__equals__${env}").unwrap());
    }

    #[test]
    fn test_bool_attribute_compares_as_capitalized() {
        let value: serde_yaml::Value = serde_yaml::from_str("virtual: true").unwrap();
        let attrs = NodeAttributes::from_yaml(&value);

        assert!(evaluate(&attrs, "<<virtual>>__equals__True").unwrap());
        assert!(!evaluate(&attrs, "<<virtual>>__equals__true").unwrap());
    }

    #[test]
    fn test_extra_segments_ignored() {
        assert!(evaluate(&attrs(&[]), "a__equals__a__trailing__junk").unwrap());
    }

    #[test]
    fn test_malformed_triple() {
        assert_matches!(
            evaluate(&attrs(&[]), "prod"),
            Err(Error::MalformedCondition { .. })
        );
        assert_matches!(
            evaluate(&attrs(&[("env", "prod")]), "<<env>>__equals"),
            Err(Error::MalformedCondition { expression, .. }) if expression == "prod__equals"
        );
    }

    #[test]
    fn test_unsupported_operator() {
        assert_matches!(
            evaluate(&attrs(&[]), "a__contains__a"),
            Err(Error::MalformedCondition { reason, .. }) if reason.contains("contains")
        );
    }
}
