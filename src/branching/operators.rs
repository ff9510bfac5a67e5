// SPDX-License-Identifier: MIT

//! Operator catalog
//!
//! Every operator the evaluator understands, the tag it is written with,
//! the number of operands it takes off the stack and the function it applies.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::value::{Operand, Scalar, StepSelector, TaskResults};
use crate::error::EvalError;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    EqualTo,
    NotEqualTo,
    GreaterThan,
    AtLeast,
    LessThan,
    AtMost,
}

/// Boolean combinators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    AllOf,
    AnyOf,
}

/// Numeric aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathOp {
    Sum,
    Average,
}

/// Any operator that can appear in a postfix program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Compare(CompareOp),
    Logical(LogicalOp),
    Math(MathOp),
    /// Resolves raw step indices against the task results
    StepIndex,
}

/// How many operands an operator takes off the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many of the topmost values
    Fixed(usize),
    /// Everything on the stack, bottom to top
    ConsumeAll,
}

/// Tag of the step accessor
pub const STEP_INDEX_TAG: &str = "stepIndex";

/// Canonical tags plus the accepted short aliases
static CATALOG: Lazy<HashMap<&'static str, Operator>> = Lazy::new(|| {
    use CompareOp::*;
    use LogicalOp::*;
    use MathOp::*;

    let mut m = HashMap::new();
    for (tag, alias, op) in [
        ("isEqualTo", "equalTo", Operator::Compare(EqualTo)),
        ("isNotEqualTo", "notEqualTo", Operator::Compare(NotEqualTo)),
        ("isGreaterThan", "greaterThan", Operator::Compare(GreaterThan)),
        ("isAtLeast", "atLeast", Operator::Compare(AtLeast)),
        ("isLessThan", "lessThan", Operator::Compare(LessThan)),
        ("isAtMost", "atMost", Operator::Compare(AtMost)),
        ("allConditionsMet", "allOf", Operator::Logical(AllOf)),
        ("anyConditionMet", "anyOf", Operator::Logical(AnyOf)),
        ("totalOf", "sum", Operator::Math(Sum)),
        ("averageOf", "average", Operator::Math(Average)),
    ] {
        m.insert(tag, op);
        m.insert(alias, op);
    }
    m.insert(STEP_INDEX_TAG, Operator::StepIndex);
    m
});

impl CompareOp {
    pub fn tag(&self) -> &'static str {
        match self {
            CompareOp::EqualTo => "isEqualTo",
            CompareOp::NotEqualTo => "isNotEqualTo",
            CompareOp::GreaterThan => "isGreaterThan",
            CompareOp::AtLeast => "isAtLeast",
            CompareOp::LessThan => "isLessThan",
            CompareOp::AtMost => "isAtMost",
        }
    }

    fn apply(&self, left: &Operand, right: &Operand) -> Result<bool, EvalError> {
        match self {
            CompareOp::EqualTo => Ok(operands_equal(left, right)),
            CompareOp::NotEqualTo => Ok(!operands_equal(left, right)),
            CompareOp::GreaterThan => self.compare_numbers(left, right, |a, b| a > b),
            CompareOp::AtLeast => self.compare_numbers(left, right, |a, b| a >= b),
            CompareOp::LessThan => self.compare_numbers(left, right, |a, b| a < b),
            CompareOp::AtMost => self.compare_numbers(left, right, |a, b| a <= b),
        }
    }

    fn compare_numbers<F>(&self, left: &Operand, right: &Operand, cmp: F) -> Result<bool, EvalError>
    where
        F: Fn(f64, f64) -> bool,
    {
        let a = expect_number(self.tag(), left)?;
        let b = expect_number(self.tag(), right)?;
        Ok(cmp(a, b))
    }
}

impl LogicalOp {
    pub fn tag(&self) -> &'static str {
        match self {
            LogicalOp::AllOf => "allConditionsMet",
            LogicalOp::AnyOf => "anyConditionMet",
        }
    }

    fn apply(&self, conditions: &[Operand]) -> bool {
        match self {
            LogicalOp::AllOf => conditions.iter().all(Operand::is_truthy),
            LogicalOp::AnyOf => conditions.iter().any(Operand::is_truthy),
        }
    }
}

impl MathOp {
    pub fn tag(&self) -> &'static str {
        match self {
            MathOp::Sum => "totalOf",
            MathOp::Average => "averageOf",
        }
    }

    fn apply(&self, operand: &Operand) -> Result<f64, EvalError> {
        let numbers = self.numbers(operand)?;
        let total: f64 = numbers.iter().sum();
        let value = match self {
            MathOp::Sum => total,
            MathOp::Average if numbers.is_empty() => {
                return Err(self.domain_error("average of an empty sequence"))
            }
            MathOp::Average => total / numbers.len() as f64,
        };
        if !value.is_finite() {
            return Err(self.domain_error("result is not finite"));
        }
        Ok(value)
    }

    fn domain_error(&self, reason: &str) -> EvalError {
        EvalError::DomainError {
            operator: self.tag().to_string(),
            reason: reason.to_string(),
        }
    }

    /// A lone number counts as a one-element sequence
    fn numbers(&self, operand: &Operand) -> Result<Vec<f64>, EvalError> {
        match operand {
            Operand::Sequence(items) => items
                .iter()
                .map(|s| {
                    s.as_f64().ok_or_else(|| {
                        EvalError::type_mismatch(self.tag(), "number", s.kind())
                    })
                })
                .collect(),
            Operand::Scalar(Scalar::Number(n)) => Ok(vec![*n]),
            other => Err(EvalError::type_mismatch(
                self.tag(),
                "sequence of numbers",
                other.kind(),
            )),
        }
    }
}

impl Operator {
    /// Look up an operator by canonical tag or alias
    pub fn from_tag(tag: &str) -> Result<Operator, EvalError> {
        CATALOG
            .get(tag)
            .copied()
            .ok_or_else(|| EvalError::UnknownOperator(tag.to_string()))
    }

    /// Whether `tag` names an operator
    pub fn is_known(tag: &str) -> bool {
        CATALOG.contains_key(tag)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Operator::Compare(op) => op.tag(),
            Operator::Logical(op) => op.tag(),
            Operator::Math(op) => op.tag(),
            Operator::StepIndex => STEP_INDEX_TAG,
        }
    }

    /// Declared operand count. Logical operators take the whole stack.
    pub fn arity(&self) -> Arity {
        match self {
            Operator::Compare(_) => Arity::Fixed(2),
            Operator::Logical(_) => Arity::ConsumeAll,
            Operator::Math(_) | Operator::StepIndex => Arity::Fixed(1),
        }
    }

    /// Apply the operator to arguments popped from the stack, in stack order
    pub fn apply(&self, args: &[Operand], results: &TaskResults) -> Result<Operand, EvalError> {
        if let Arity::Fixed(n) = self.arity() {
            if args.len() != n {
                return Err(EvalError::ArityUnderflow {
                    operator: self.tag().to_string(),
                    expected: n,
                    available: args.len(),
                });
            }
        }

        let value = match self {
            Operator::Compare(op) => Scalar::Bool(op.apply(&args[0], &args[1])?),
            Operator::Logical(op) => Scalar::Bool(op.apply(args)),
            Operator::Math(op) => Scalar::Number(op.apply(&args[0])?),
            Operator::StepIndex => return resolve_steps(&args[0], results),
        };
        Ok(Operand::Scalar(value))
    }
}

fn resolve_steps(operand: &Operand, results: &TaskResults) -> Result<Operand, EvalError> {
    match operand {
        Operand::Steps(StepSelector::Single(index)) => {
            results.resolve_one(*index).map(Operand::Scalar)
        }
        Operand::Steps(StepSelector::Many(indices)) => {
            results.resolve_many(indices).map(Operand::Sequence)
        }
        other => Err(EvalError::type_mismatch(
            STEP_INDEX_TAG,
            "step index",
            other.kind(),
        )),
    }
}

fn expect_number(tag: &str, operand: &Operand) -> Result<f64, EvalError> {
    match operand {
        Operand::Scalar(Scalar::Number(n)) => Ok(*n),
        other => Err(EvalError::type_mismatch(tag, "number", other.kind())),
    }
}

fn operands_equal(left: &Operand, right: &Operand) -> bool {
    match (left, right) {
        (Operand::Scalar(a), Operand::Scalar(b)) => a.loosely_equals(b),
        (Operand::Sequence(a), Operand::Sequence(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_equals(y))
        }
        (Operand::Steps(a), Operand::Steps(b)) => a == b,
        _ => false,
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Operand {
        Operand::Scalar(Scalar::Number(n))
    }

    fn boolean(b: bool) -> Operand {
        Operand::Scalar(Scalar::Bool(b))
    }

    #[test]
    fn test_from_tag_canonical_and_alias() {
        assert_eq!(
            Operator::from_tag("isGreaterThan").unwrap(),
            Operator::Compare(CompareOp::GreaterThan)
        );
        assert_eq!(
            Operator::from_tag("greaterThan").unwrap(),
            Operator::Compare(CompareOp::GreaterThan)
        );
        assert_eq!(
            Operator::from_tag("allOf").unwrap(),
            Operator::Logical(LogicalOp::AllOf)
        );
        assert_eq!(Operator::from_tag("stepIndex").unwrap(), Operator::StepIndex);
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(
            Operator::from_tag("isRoughly"),
            Err(EvalError::UnknownOperator("isRoughly".to_string()))
        );
        assert!(!Operator::is_known("isRoughly"));
    }

    #[test]
    fn test_alias_displays_canonical_tag() {
        let op = Operator::from_tag("average").unwrap();
        assert_eq!(op.to_string(), "averageOf");
    }

    #[test]
    fn test_arity() {
        assert_eq!(
            Operator::Compare(CompareOp::EqualTo).arity(),
            Arity::Fixed(2)
        );
        assert_eq!(Operator::Math(MathOp::Sum).arity(), Arity::Fixed(1));
        assert_eq!(Operator::StepIndex.arity(), Arity::Fixed(1));
        assert_eq!(
            Operator::Logical(LogicalOp::AnyOf).arity(),
            Arity::ConsumeAll
        );
    }

    #[test]
    fn test_numeric_comparisons() {
        let results = TaskResults::new();
        let cases = [
            (CompareOp::GreaterThan, 10.0, 5.0, true),
            (CompareOp::GreaterThan, 5.0, 5.0, false),
            (CompareOp::AtLeast, 5.0, 5.0, true),
            (CompareOp::LessThan, 3.0, 5.0, true),
            (CompareOp::AtMost, 6.0, 5.0, false),
        ];
        for (op, a, b, expected) in cases {
            let out = Operator::Compare(op)
                .apply(&[num(a), num(b)], &results)
                .unwrap();
            assert_eq!(out, boolean(expected), "{} {} {}", a, op.tag(), b);
        }
    }

    #[test]
    fn test_ordering_rejects_strings() {
        let results = TaskResults::new();
        let err = Operator::Compare(CompareOp::LessThan)
            .apply(&[Operand::Scalar(Scalar::from("a")), num(1.0)], &results)
            .unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
    }

    #[test]
    fn test_equality_across_kinds() {
        let results = TaskResults::new();
        let eq = Operator::Compare(CompareOp::EqualTo);
        assert_eq!(eq.apply(&[boolean(true), boolean(true)], &results).unwrap(), boolean(true));
        assert_eq!(eq.apply(&[num(1.0), boolean(true)], &results).unwrap(), boolean(false));

        let ne = Operator::Compare(CompareOp::NotEqualTo);
        assert_eq!(
            ne.apply(
                &[Operand::Scalar(Scalar::from("a")), Operand::Scalar(Scalar::from("b"))],
                &results
            )
            .unwrap(),
            boolean(true)
        );
    }

    #[test]
    fn test_logical_vacuous() {
        let results = TaskResults::new();
        assert_eq!(
            Operator::Logical(LogicalOp::AllOf).apply(&[], &results).unwrap(),
            boolean(true)
        );
        assert_eq!(
            Operator::Logical(LogicalOp::AnyOf).apply(&[], &results).unwrap(),
            boolean(false)
        );
    }

    #[test]
    fn test_math_over_sequence() {
        let results = TaskResults::new();
        let seq = Operand::Sequence(vec![
            Scalar::Number(1.0),
            Scalar::Number(2.0),
            Scalar::Number(3.0),
        ]);
        assert_eq!(
            Operator::Math(MathOp::Sum).apply(&[seq.clone()], &results).unwrap(),
            num(6.0)
        );
        assert_eq!(
            Operator::Math(MathOp::Average).apply(&[seq], &results).unwrap(),
            num(2.0)
        );
    }

    #[test]
    fn test_math_empty_sequence() {
        let results = TaskResults::new();
        let empty = Operand::Sequence(vec![]);
        assert_eq!(
            Operator::Math(MathOp::Sum).apply(&[empty.clone()], &results).unwrap(),
            num(0.0)
        );
        let err = Operator::Math(MathOp::Average)
            .apply(&[empty], &results)
            .unwrap_err();
        assert_eq!(err.kind(), "DomainError");
    }

    #[test]
    fn test_math_overflow_is_domain_error() {
        let results = TaskResults::new();
        let huge = Operand::Sequence(vec![Scalar::Number(1e308), Scalar::Number(1e308)]);
        for op in [MathOp::Sum, MathOp::Average] {
            let err = Operator::Math(op).apply(&[huge.clone()], &results).unwrap_err();
            assert_eq!(
                err,
                EvalError::DomainError {
                    operator: op.tag().to_string(),
                    reason: "result is not finite".to_string(),
                }
            );
        }
    }

    #[test]
    fn test_math_rejects_non_numbers() {
        let results = TaskResults::new();
        let seq = Operand::Sequence(vec![Scalar::Number(1.0), Scalar::from("two")]);
        let err = Operator::Math(MathOp::Sum).apply(&[seq], &results).unwrap_err();
        assert_eq!(
            err,
            EvalError::type_mismatch("totalOf", "number", "string")
        );
    }

    #[test]
    fn test_step_index_resolution() {
        let mut results = TaskResults::new();
        results.insert(0, Scalar::Number(4.0));
        results.insert(1, vec![Scalar::Number(9.0), Scalar::Number(1.0)]);

        let single = Operator::StepIndex
            .apply(&[Operand::Steps(StepSelector::Single(1))], &results)
            .unwrap();
        assert_eq!(single, num(9.0));

        let many = Operator::StepIndex
            .apply(&[Operand::Steps(StepSelector::Many(vec![0, 1]))], &results)
            .unwrap();
        assert_eq!(
            many,
            Operand::Sequence(vec![Scalar::Number(4.0), Scalar::Number(9.0)])
        );
    }

    #[test]
    fn test_fixed_arity_checked() {
        let results = TaskResults::new();
        let err = Operator::Compare(CompareOp::AtMost)
            .apply(&[num(1.0)], &results)
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::ArityUnderflow {
                operator: "isAtMost".to_string(),
                expected: 2,
                available: 1,
            }
        );
    }
}
