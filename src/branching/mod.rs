// SPDX-License-Identifier: MIT

//! Branch condition evaluation
//!
//! A branching condition is a tree of comparisons, boolean combinators and
//! aggregates over the outputs of earlier steps, for example:
//! - `{"isGreaterThan": [{"stepIndex": 0}, 5]}`
//! - `{"allConditionsMet": [true, {"isAtMost": [{"totalOf": {"stepIndex": [0, 1]}}, 10]}]}`
//!
//! The tree is flattened into postfix order and run on a stack machine
//! against a results mapping supplied with each call.

mod ast;
mod evaluator;
mod loader;
mod operators;
mod postfix;
mod value;

pub use ast::Expression;
pub use evaluator::{evaluate_branch, evaluate_postfix};
pub use loader::{expression_from_value, BranchLoader};
pub use operators::{Arity, CompareOp, LogicalOp, MathOp, Operator, STEP_INDEX_TAG};
pub use postfix::{compile, render, Token};
pub use value::{Operand, Scalar, StepSelector, StepValue, TaskResults};
