//! Stack evaluator for postfix programs

use super::ast::Expression;
use super::operators::Arity;
use super::postfix::{self, Token};
use super::value::{Operand, Scalar, TaskResults};
use crate::error::EvalError;

/// Evaluate a branching condition against the results of earlier steps
pub fn evaluate_branch(results: &TaskResults, expr: &Expression) -> Result<Scalar, EvalError> {
    let program = postfix::compile(expr);
    log::debug!("Compiled branch: {}", postfix::render(&program));
    evaluate_postfix(program, results)
}

/// Run a postfix program to completion.
///
/// Fixed-arity operators pop their operands from the top of the stack.
/// Consume-all operators take the whole stack, so anything left unconsumed
/// before them becomes one of their arguments.
pub fn evaluate_postfix(
    program: impl IntoIterator<Item = Token>,
    results: &TaskResults,
) -> Result<Scalar, EvalError> {
    let mut stack: Vec<Operand> = Vec::with_capacity(16);

    for token in program {
        match token {
            Token::Operand(operand) => {
                log::trace!("push {}", operand);
                stack.push(operand);
            }
            Token::Operator(op) => {
                let args = match op.arity() {
                    Arity::Fixed(n) => {
                        if stack.len() < n {
                            return Err(EvalError::ArityUnderflow {
                                operator: op.tag().to_string(),
                                expected: n,
                                available: stack.len(),
                            });
                        }
                        stack.split_off(stack.len() - n)
                    }
                    Arity::ConsumeAll => std::mem::take(&mut stack),
                };
                let result = op.apply(&args, results)?;
                log::debug!("{} over {} operand(s) -> {}", op, args.len(), result);
                stack.push(result);
            }
        }
    }

    finish(stack)
}

fn finish(mut stack: Vec<Operand>) -> Result<Scalar, EvalError> {
    if stack.len() != 1 {
        return Err(EvalError::MalformedResult {
            remaining: stack.len(),
        });
    }
    match stack.pop() {
        Some(Operand::Scalar(value)) => Ok(value),
        Some(other) => Err(EvalError::NonScalarResult(other.to_string())),
        None => Err(EvalError::MalformedResult { remaining: 0 }),
    }
}
