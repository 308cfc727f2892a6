//! Restricted arithmetic formulas for parameters.
//!
//! Parameter formulas are small arithmetic expressions over other parameter
//! names: numeric literals, symbols, `+ - * / % **`, parentheses and a fixed
//! set of math functions. Nothing else is accepted, so a formula can never
//! reach beyond arithmetic.

mod eval;
mod lexer;
mod parser;
mod set;

pub use eval::{evaluate, Arity, Function, FUNCTIONS};
pub use lexer::{tokenize, Token};
pub use parser::{parse, BinaryOp, Expr, Formula, UnaryOp, MAX_DEPTH};
pub use set::FormulaSet;

use thiserror::Error;

/// Errors produced while parsing or evaluating a formula.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("Unexpected character '{found}' at position {position}")]
    UnexpectedCharacter {
        found: String,
        position: usize,
    },

    #[error("Unexpected token '{found}' at position {position}")]
    UnexpectedToken {
        found: String,
        position: usize,
    },

    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    #[error("Empty formula")]
    Empty,

    #[error("Unknown function '{name}'")]
    UnknownFunction {
        name: String,
    },

    #[error("Function '{name}' takes {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: &'static str,
        actual: usize,
    },

    #[error("Name '{name}' is not defined")]
    UnknownSymbol {
        name: String,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Formula '{formula}' of parameter '{parameter}' evaluated to a non-finite value")]
    NonFinite {
        parameter: String,
        formula: String,
    },

    #[error("Formula for parameter '{parameter}' is invalid: {reason}")]
    InvalidFormula {
        parameter: String,
        reason: Box<FormulaError>,
    },

    #[error("Formula nests deeper than {limit} levels")]
    TooDeep {
        limit: usize,
    },

    #[error("Dependency cycle between parameters: {}", .names.join(", "))]
    Cycle {
        names: Vec<String>,
    },
}

/// Built-in constants. Parameters or globals with the same name shadow them.
pub const CONSTANTS: [(&str, f64); 2] = [("pi", std::f64::consts::PI), ("e", std::f64::consts::E)];

/// Returns the value of a built-in constant.
#[must_use]
pub fn constant(name: &str) -> Option<f64> {
    CONSTANTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| *v)
}
