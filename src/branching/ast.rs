// SPDX-License-Identifier: MIT

//! Expression tree for branching conditions

use super::operators::{CompareOp, LogicalOp, MathOp};
use super::value::{Scalar, StepSelector};

/// A branching condition
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant value
    Literal(Scalar),
    /// Output of one or more earlier steps, resolved at evaluation time
    Step(StepSelector),
    /// Binary comparison: left op right
    Compare {
        op: CompareOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Boolean combinator over any number of conditions
    Logical {
        op: LogicalOp,
        operands: Vec<Expression>,
    },
    /// Aggregate over a sequence of numbers
    Math { op: MathOp, operand: Box<Expression> },
}

impl Expression {
    pub fn literal(value: impl Into<Scalar>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn step(index: usize) -> Self {
        Expression::Step(StepSelector::Single(index))
    }

    pub fn steps(indices: Vec<usize>) -> Self {
        Expression::Step(StepSelector::Many(indices))
    }

    pub fn compare(op: CompareOp, left: Expression, right: Expression) -> Self {
        Expression::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn all_of(operands: Vec<Expression>) -> Self {
        Expression::Logical {
            op: LogicalOp::AllOf,
            operands,
        }
    }

    pub fn any_of(operands: Vec<Expression>) -> Self {
        Expression::Logical {
            op: LogicalOp::AnyOf,
            operands,
        }
    }

    pub fn math(op: MathOp, operand: Expression) -> Self {
        Expression::Math {
            op,
            operand: Box::new(operand),
        }
    }
}
