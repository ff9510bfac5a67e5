// SPDX-License-Identifier: MIT

pub mod branching;
pub mod error;
pub mod server;

pub use branching::{evaluate_branch, Expression, Scalar, TaskResults};
pub use error::{BranchingError, EvalError};
