//! Sandboxed arithmetic evaluator
//!
//! Turns untrusted text such as `(234 * 12) + 98` into a number without ever
//! handing it to an interpreter. The input is tokenized and parsed into a tiny
//! AST whose node kinds are exactly the allowed grammar, so anything outside it
//! (names, calls, attributes, strings, statements) fails before evaluation
//! starts.
//!
//! Integers stay exact (`i128`, checked). A decimal literal anywhere in the
//! input promotes the whole evaluation to `f64`; a non-integral division or a
//! negative exponent promotes from that operation onwards. `%` is floored, matching
//! Python, and `**` is right-associative and binds tighter than a unary minus
//! on its left.

mod lexer;
mod parser;

use std::fmt;

use sdk::errors::EngineError;
use serde_json::Value;
use thiserror::Error;

use self::parser::{BinaryOp, Expr, Parser, UnaryOp};

/// Longest accepted expression, in bytes
pub const MAX_INPUT_LEN: usize = 1024;

/// Deepest accepted nesting of parentheses and unary operators
pub const MAX_DEPTH: usize = 64;

/// Largest accepted exponent magnitude
pub const MAX_EXPONENT: i128 = 1024;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("expression is empty")]
    Empty,

    #[error("expression exceeds {0} bytes")]
    TooLong(usize),

    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("{0} is not allowed")]
    Disallowed(&'static str),

    #[error("operator '{0}' is not allowed")]
    DisallowedOperator(String),

    #[error("name '{0}' is not allowed; only numbers and + - * / % ** ( ) are accepted")]
    NameReference(String),

    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },

    #[error("unexpected {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("zero cannot be raised to a negative power")]
    ZeroToNegativePower,

    #[error("exponent magnitude exceeds {MAX_EXPONENT}")]
    ExponentTooLarge,

    #[error("negative number raised to a fractional power has no real result")]
    ComplexResult,

    #[error("integer overflow")]
    Overflow,

    #[error("result is not a finite number")]
    NonFinite,
}

impl From<EvaluationError> for EngineError {
    fn from(err: EvaluationError) -> Self {
        EngineError::Evaluation(err.to_string())
    }
}

/// Result of an evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i128),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// JSON rendering used as the math tool's output.
    ///
    /// Integers outside the `i64` range are rendered as decimal strings so no
    /// precision is lost.
    pub fn to_json(self) -> Value {
        match self {
            Number::Int(i) => match i64::try_from(i) {
                Ok(small) => Value::from(small),
                Err(_) => Value::String(i.to_string()),
            },
            Number::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(f.to_string())),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) if x.fract() == 0.0 && x.abs() < 1e16 => write!(f, "{:.1}", x),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(input: &str) -> Result<Number, EvaluationError> {
    if input.len() > MAX_INPUT_LEN {
        return Err(EvaluationError::TooLong(MAX_INPUT_LEN));
    }
    let tokens = lexer::tokenize(input)?;
    let ast = Parser::new(tokens).parse()?;
    eval(&ast, has_float_literal(&ast))
}

fn has_float_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(n) => matches!(n, Number::Float(_)),
        Expr::Group(inner) => has_float_literal(inner),
        Expr::Unary { operand, .. } => has_float_literal(operand),
        Expr::Binary { left, right, .. } => has_float_literal(left) || has_float_literal(right),
    }
}

fn eval(expr: &Expr, promote: bool) -> Result<Number, EvaluationError> {
    match expr {
        Expr::Literal(n) if promote => Ok(Number::Float(n.as_f64())),
        Expr::Literal(n) => Ok(*n),
        Expr::Group(inner) => eval(inner, promote),
        Expr::Unary { op, operand } => {
            let value = eval(operand, promote)?;
            match op {
                UnaryOp::Plus => Ok(value),
                UnaryOp::Neg => match value {
                    Number::Int(i) => i.checked_neg().map(Number::Int).ok_or(EvaluationError::Overflow),
                    Number::Float(f) => Ok(Number::Float(-f)),
                },
            }
        }
        Expr::Binary { op, left, right } => {
            let lhs = eval(left, promote)?;
            let rhs = eval(right, promote)?;
            apply(*op, lhs, rhs)
        }
    }
}

fn apply(op: BinaryOp, lhs: Number, rhs: Number) -> Result<Number, EvaluationError> {
    match (lhs, rhs) {
        (Number::Int(a), Number::Int(b)) => apply_int(op, a, b),
        _ => apply_float(op, lhs.as_f64(), rhs.as_f64()),
    }
}

fn apply_int(op: BinaryOp, a: i128, b: i128) -> Result<Number, EvaluationError> {
    let exact = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => {
            if b == 0 {
                return Err(EvaluationError::DivisionByZero);
            }
            match a.checked_rem(b) {
                Some(0) => a.checked_div(b),
                Some(_) => return finite(a as f64 / b as f64),
                None => None,
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(EvaluationError::ModuloByZero);
            }
            a.checked_rem(b).map(|r| if r != 0 && (r < 0) != (b < 0) { r + b } else { r })
        }
        BinaryOp::Pow => {
            if b.abs() > MAX_EXPONENT {
                return Err(EvaluationError::ExponentTooLarge);
            }
            if b < 0 {
                if a == 0 {
                    return Err(EvaluationError::ZeroToNegativePower);
                }
                return finite((a as f64).powf(b as f64));
            }
            // b is in 0..=MAX_EXPONENT here
            a.checked_pow(b as u32)
        }
    };
    exact.map(Number::Int).ok_or(EvaluationError::Overflow)
}

fn apply_float(op: BinaryOp, a: f64, b: f64) -> Result<Number, EvaluationError> {
    match op {
        BinaryOp::Add => finite(a + b),
        BinaryOp::Sub => finite(a - b),
        BinaryOp::Mul => finite(a * b),
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvaluationError::DivisionByZero);
            }
            finite(a / b)
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(EvaluationError::ModuloByZero);
            }
            let r = a % b;
            finite(if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r })
        }
        BinaryOp::Pow => {
            if b.abs() > MAX_EXPONENT as f64 {
                return Err(EvaluationError::ExponentTooLarge);
            }
            if a == 0.0 && b < 0.0 {
                return Err(EvaluationError::ZeroToNegativePower);
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err(EvaluationError::ComplexResult);
            }
            finite(a.powf(b))
        }
    }
}

fn finite(value: f64) -> Result<Number, EvaluationError> {
    if value.is_finite() {
        Ok(Number::Float(value))
    } else {
        Err(EvaluationError::NonFinite)
    }
}
