//! Typed override values
//!
//! Every value in an override file is coerced to one of two forms:
//! - `true` / `false`
//! - `version <op> <integer>`, evaluated against the configured revision
//!
//! Anything else is rejected.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a version predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
        }
    }

    /// Apply the operator as `lhs <op> rhs`
    pub fn evaluate(&self, lhs: i64, rhs: i64) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Le => lhs <= rhs,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompareOp {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::Ne),
            ">" => Ok(CompareOp::Gt),
            "<" => Ok(CompareOp::Lt),
            ">=" => Ok(CompareOp::Ge),
            "<=" => Ok(CompareOp::Le),
            _ => Err(ValueError::UnsupportedOperator(s.to_string())),
        }
    }
}

/// A coerced override value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OverrideValue {
    /// Literal `true` or `false`
    Bool(bool),
    /// `version <op> <operand>` with its outcome against the revision
    Version {
        op: CompareOp,
        operand: i64,
        outcome: bool,
    },
}

impl OverrideValue {
    pub fn as_bool(&self) -> bool {
        match self {
            OverrideValue::Bool(value) => *value,
            OverrideValue::Version { outcome, .. } => *outcome,
        }
    }
}

impl fmt::Display for OverrideValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideValue::Bool(value) => write!(f, "{}", value),
            OverrideValue::Version {
                op,
                operand,
                outcome,
            } => write!(f, "version {} {} ({})", op, operand, outcome),
        }
    }
}

/// Reasons a raw override value is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("expected 'true', 'false' or 'version <op> <integer>'")]
    Unrecognized,

    #[error("unsupported version operator '{0}'")]
    UnsupportedOperator(String),

    #[error("version operand '{0}' is not an integer")]
    NonIntegerOperand(String),

    #[error("revision '{0}' is not an integer")]
    NonNumericRevision(String),
}

/// Coerce a raw override value.
///
/// The value is trimmed, lower-cased and split on whitespace before
/// matching. `revision` is only parsed when a version predicate needs it.
pub fn parse_override_value(raw: &str, revision: &str) -> Result<OverrideValue, ValueError> {
    let lowered = raw.trim().to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();

    match tokens.as_slice() {
        ["true"] => Ok(OverrideValue::Bool(true)),
        ["false"] => Ok(OverrideValue::Bool(false)),
        ["version", op, operand] => {
            let op: CompareOp = op.parse()?;
            let operand: i64 = operand
                .parse()
                .map_err(|_| ValueError::NonIntegerOperand(operand.to_string()))?;
            let revision: i64 = revision
                .trim()
                .parse()
                .map_err(|_| ValueError::NonNumericRevision(revision.to_string()))?;
            Ok(OverrideValue::Version {
                op,
                operand,
                outcome: op.evaluate(revision, operand),
            })
        }
        _ => Err(ValueError::Unrecognized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booleans() {
        assert_eq!(parse_override_value("true", "6"), Ok(OverrideValue::Bool(true)));
        assert_eq!(parse_override_value(" FALSE ", "6"), Ok(OverrideValue::Bool(false)));
        assert_eq!(parse_override_value("True", "x"), Ok(OverrideValue::Bool(true)));
    }

    #[test]
    fn test_version_ge() {
        assert!(parse_override_value("version >= 6", "6").unwrap().as_bool());
        assert!(!parse_override_value("version >= 6", "5").unwrap().as_bool());
    }

    #[test]
    fn test_version_all_operators() {
        let cases = [
            ("==", 6, true),
            ("==", 5, false),
            ("!=", 5, true),
            ("!=", 6, false),
            (">", 5, true),
            (">", 6, false),
            ("<", 7, true),
            ("<", 6, false),
            (">=", 6, true),
            (">=", 7, false),
            ("<=", 6, true),
            ("<=", 5, false),
        ];
        for (op, operand, expected) in cases {
            let value = parse_override_value(&format!("version {} {}", op, operand), "6").unwrap();
            assert_eq!(value.as_bool(), expected, "revision 6 {} {}", op, operand);
        }
    }

    #[test]
    fn test_version_keeps_expression() {
        let value = parse_override_value("VERSION   <  7", "6").unwrap();
        assert_eq!(
            value,
            OverrideValue::Version {
                op: CompareOp::Lt,
                operand: 7,
                outcome: true
            }
        );
        assert_eq!(value.to_string(), "version < 7 (true)");
    }

    #[test]
    fn test_non_integer_operand_rejected() {
        assert_eq!(
            parse_override_value("version >= six", "6"),
            Err(ValueError::NonIntegerOperand("six".to_string()))
        );
    }

    #[test]
    fn test_unsupported_operator_rejected() {
        assert_eq!(
            parse_override_value("version => 6", "6"),
            Err(ValueError::UnsupportedOperator("=>".to_string()))
        );
    }

    #[test]
    fn test_non_numeric_revision_rejected() {
        assert_eq!(
            parse_override_value("version == 6", "6-modified"),
            Err(ValueError::NonNumericRevision("6-modified".to_string()))
        );
    }

    #[test]
    fn test_other_forms_rejected() {
        for raw in ["yes", "1", "", "version 6", "version >= 6 7", "arm-rtems6"] {
            assert_eq!(parse_override_value(raw, "6"), Err(ValueError::Unrecognized), "{}", raw);
        }
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serde_json::to_value(OverrideValue::Bool(true)).unwrap(), serde_json::json!(true));
        let version = OverrideValue::Version {
            op: CompareOp::Ge,
            operand: 6,
            outcome: false,
        };
        assert_eq!(
            serde_json::to_value(version).unwrap(),
            serde_json::json!({"op": ">=", "operand": 6, "outcome": false})
        );
    }
}
