// SPDX-License-Identifier: MIT

//! Typed error handling for branching-rs
//!
//! `EvalError` covers everything that can go wrong while loading, compiling
//! or evaluating one branch expression. `BranchingError` wraps it together
//! with the I/O and parsing failures of the outer surfaces.

use thiserror::Error;

/// Top-level error type for branching-rs
#[derive(Debug, Error)]
pub enum BranchingError {
    /// Configuration errors (bad env vars, unsupported file types)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Expression loading or evaluation failed
    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Failures local to a single branch evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Operator tag outside the catalog
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// Referenced step has no recorded output
    #[error("No result recorded for step {index}")]
    MissingStepResult { index: usize },

    /// Referenced step recorded an empty sequence
    #[error("Result for step {index} is an empty sequence")]
    EmptyStepResult { index: usize },

    /// Operator needs more operands than the stack holds
    #[error("Operator '{operator}' needs {expected} operand(s), stack holds {available}")]
    ArityUnderflow {
        operator: String,
        expected: usize,
        available: usize,
    },

    /// Stack did not end with exactly one value
    #[error("Evaluation left {remaining} value(s) on the stack, expected exactly 1")]
    MalformedResult { remaining: usize },

    /// Final value is a sequence or an unresolved step reference
    #[error("Expression resolved to a non-scalar value: {0}")]
    NonScalarResult(String),

    /// Numeric aggregate has no defined result
    #[error("Domain error in '{operator}': {reason}")]
    DomainError { operator: String, reason: String },

    /// Operand has the wrong kind for the operator
    #[error("Operator '{operator}' expected {expected}, found {found}")]
    TypeMismatch {
        operator: String,
        expected: String,
        found: String,
    },

    /// Expression tree does not have a recognised shape
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),
}

impl EvalError {
    /// Create a type mismatch error
    pub fn type_mismatch(
        operator: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            operator: operator.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a malformed expression error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedExpression(message.into())
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            EvalError::UnknownOperator(_) => "UnknownOperator",
            EvalError::MissingStepResult { .. } => "MissingStepResult",
            EvalError::EmptyStepResult { .. } => "EmptyStepResult",
            EvalError::ArityUnderflow { .. } => "ArityUnderflow",
            EvalError::MalformedResult { .. } => "MalformedResult",
            EvalError::NonScalarResult(_) => "NonScalarResult",
            EvalError::DomainError { .. } => "DomainError",
            EvalError::TypeMismatch { .. } => "TypeMismatch",
            EvalError::MalformedExpression(_) => "MalformedExpression",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EvalError::MissingStepResult { index: 3 };
        assert_eq!(err.to_string(), "No result recorded for step 3");

        let err = EvalError::ArityUnderflow {
            operator: "isGreaterThan".to_string(),
            expected: 2,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "Operator 'isGreaterThan' needs 2 operand(s), stack holds 1"
        );
    }

    #[test]
    fn test_wraps_into_top_level() {
        let err: BranchingError = EvalError::UnknownOperator("isBogus".to_string()).into();
        assert_eq!(err.to_string(), "Evaluation error: Unknown operator: isBogus");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(EvalError::malformed("x").kind(), "MalformedExpression");
        assert_eq!(
            EvalError::type_mismatch("totalOf", "number", "string").kind(),
            "TypeMismatch"
        );
    }
}
