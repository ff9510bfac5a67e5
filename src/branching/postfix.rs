//! Expression tree to postfix conversion

use super::ast::Expression;
use super::operators::Operator;
use super::value::Operand;

/// One entry of a postfix program
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Pushed onto the stack as-is
    Operand(Operand),
    /// Pops its arguments and pushes its result
    Operator(Operator),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Operand(operand) => write!(f, "{}", operand),
            Token::Operator(op) => write!(f, "{}", op),
        }
    }
}

/// Flatten an expression into postfix order.
///
/// Operands come first, followed by their operator. Step references emit the
/// raw indices and then `stepIndex`, so lookups happen during evaluation.
pub fn compile(expr: &Expression) -> Vec<Token> {
    let mut out = Vec::new();
    compile_into(expr, &mut out);
    out
}

fn compile_into(expr: &Expression, out: &mut Vec<Token>) {
    match expr {
        Expression::Literal(value) => {
            out.push(Token::Operand(Operand::Scalar(value.clone())));
        }
        Expression::Step(selector) => {
            out.push(Token::Operand(Operand::Steps(selector.clone())));
            out.push(Token::Operator(Operator::StepIndex));
        }
        Expression::Compare { op, left, right } => {
            compile_into(left, out);
            compile_into(right, out);
            out.push(Token::Operator(Operator::Compare(*op)));
        }
        Expression::Logical { op, operands } => {
            for operand in operands {
                compile_into(operand, out);
            }
            out.push(Token::Operator(Operator::Logical(*op)));
        }
        Expression::Math { op, operand } => {
            compile_into(operand, out);
            out.push(Token::Operator(Operator::Math(*op)));
        }
    }
}

/// Render a program as space-separated tokens
pub fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
