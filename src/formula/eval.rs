//! Formula evaluation.

use super::parser::{BinaryOp, Expr, UnaryOp};
use super::{constant, FormulaError};

/// Accepted argument counts of a built-in function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Between(usize, usize),
    AtLeast(usize),
}

/// A built-in function available to formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Function {
    /// Name used in formulas.
    pub name: &'static str,
    /// Accepted argument counts.
    pub arity: Arity,
}

impl Arity {
    fn accepts(self, actual: usize) -> bool {
        match self {
            Self::Exact(n) => actual == n,
            Self::Between(lo, hi) => (lo..=hi).contains(&actual),
            Self::AtLeast(n) => actual >= n,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Exact(1) => "1",
            Self::Exact(2) => "2",
            Self::Between(1, 2) => "1 or 2",
            Self::AtLeast(1) => "at least 1",
            _ => "a different number of",
        }
    }
}

impl Function {
    pub(crate) fn check_arity(&self, actual: usize) -> Result<(), FormulaError> {
        if self.arity.accepts(actual) {
            return Ok(());
        }
        Err(FormulaError::Arity {
            name: self.name.to_string(),
            expected: self.arity.describe(),
            actual,
        })
    }
}

const fn unary(name: &'static str) -> Function {
    Function {
        name,
        arity: Arity::Exact(1),
    }
}

/// Every function a formula may call.
pub const FUNCTIONS: [Function; 18] = [
    unary("abs"),
    unary("sqrt"),
    unary("exp"),
    Function {
        name: "log",
        arity: Arity::Between(1, 2),
    },
    unary("log10"),
    unary("log2"),
    unary("sin"),
    unary("cos"),
    unary("tan"),
    unary("asin"),
    unary("acos"),
    unary("atan"),
    Function {
        name: "min",
        arity: Arity::AtLeast(1),
    },
    Function {
        name: "max",
        arity: Arity::AtLeast(1),
    },
    Function {
        name: "pow",
        arity: Arity::Exact(2),
    },
    unary("floor"),
    unary("ceil"),
    unary("round"),
];

pub(crate) fn lookup_function(name: &str) -> Option<Function> {
    FUNCTIONS.iter().copied().find(|f| f.name == name)
}

fn apply_function(name: &str, args: &[f64]) -> Result<f64, FormulaError> {
    let x = args.first().copied().unwrap_or(f64::NAN);
    let value = match name {
        "abs" => x.abs(),
        "sqrt" => x.sqrt(),
        "exp" => x.exp(),
        "log" => match args.get(1) {
            Some(base) => x.ln() / base.ln(),
            None => x.ln(),
        },
        "log10" => x.log10(),
        "log2" => x.log2(),
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "asin" => x.asin(),
        "acos" => x.acos(),
        "atan" => x.atan(),
        "min" => args.iter().copied().fold(f64::INFINITY, f64::min),
        "max" => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        "pow" => x.powf(args.get(1).copied().unwrap_or(f64::NAN)),
        "floor" => x.floor(),
        "ceil" => x.ceil(),
        "round" => x.round(),
        other => {
            return Err(FormulaError::UnknownFunction {
                name: other.to_string(),
            })
        }
    };
    Ok(value)
}

/// Floored remainder: the result takes the sign of the divisor.
fn floored_rem(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

/// Evaluates an expression, resolving symbols through `lookup` first and
/// the built-in constants second.
pub fn evaluate(expr: &Expr, lookup: &dyn Fn(&str) -> Option<f64>) -> Result<f64, FormulaError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Symbol(name) => lookup(name.as_str())
            .or_else(|| constant(name))
            .ok_or_else(|| FormulaError::UnknownSymbol { name: name.clone() }),
        Expr::Unary { op, operand } => {
            let v = evaluate(operand, lookup)?;
            Ok(match op {
                UnaryOp::Neg => -v,
                UnaryOp::Plus => v,
            })
        }
        Expr::Binary { op, left, right } => {
            let a = evaluate(left, lookup)?;
            let b = evaluate(right, lookup)?;
            match op {
                BinaryOp::Add => Ok(a + b),
                BinaryOp::Sub => Ok(a - b),
                BinaryOp::Mul => Ok(a * b),
                BinaryOp::Div | BinaryOp::Rem if b == 0.0 => Err(FormulaError::DivisionByZero),
                BinaryOp::Div => Ok(a / b),
                BinaryOp::Rem => Ok(floored_rem(a, b)),
                BinaryOp::Pow => Ok(a.powf(b)),
            }
        }
        Expr::Call { name, args } => {
            let values = args
                .iter()
                .map(|arg| evaluate(arg, lookup))
                .collect::<Result<Vec<_>, _>>()?;
            lookup_function(name)
                .ok_or_else(|| FormulaError::UnknownFunction { name: name.clone() })?
                .check_arity(values.len())?;
            apply_function(name, &values)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::formula::parse;

    fn eval_with(source: &str, vars: &[(&str, f64)]) -> Result<f64, FormulaError> {
        let vars: HashMap<String, f64> = vars.iter().map(|(k, v)| ((*k).to_string(), *v)).collect();
        let expr = parse(source)?;
        evaluate(&expr, &|name| vars.get(name).copied())
    }

    fn eval(source: &str) -> f64 {
        eval_with(source, &[]).unwrap()
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(eval("1 + 2 * 3"), 7.0);
        assert_eq!(eval("(1 + 2) * 3"), 9.0);
        assert_eq!(eval("10 / 4"), 2.5);
        assert_eq!(eval("2 ** 3 ** 2"), 512.0);
        assert_eq!(eval("-2 ** 2"), -4.0);
        assert_eq!(eval("2 ** -1"), 0.5);
        assert_eq!(eval("--3"), 3.0);
    }

    #[test]
    fn remainder_follows_divisor_sign() {
        assert_eq!(eval("7 % 3"), 1.0);
        assert_eq!(eval("-7 % 3"), 2.0);
        assert_eq!(eval("7 % -3"), -2.0);
    }

    #[test]
    fn functions_and_constants() {
        assert_eq!(eval("sqrt(16)"), 4.0);
        assert_eq!(eval("max(1, 5, 3)"), 5.0);
        assert_eq!(eval("min(4, -2)"), -2.0);
        assert_eq!(eval("abs(-2.5)"), 2.5);
        assert_eq!(eval("pow(2, 10)"), 1024.0);
        assert!((eval("log(100, 10)") - 2.0).abs() < 1e-12);
        assert!((eval("log(e)") - 1.0).abs() < 1e-12);
        assert!((eval("cos(pi)") + 1.0).abs() < 1e-12);
        assert_eq!(eval("floor(2.7) + ceil(2.2) + round(2.5)"), 8.0);
    }

    #[test]
    fn symbols_shadow_constants() {
        assert_eq!(eval_with("e * 2", &[("e", 5.0)]).unwrap(), 10.0);
        assert_eq!(eval_with("a + b", &[("a", 1.5), ("b", 2.0)]).unwrap(), 3.5);
    }

    #[test]
    fn unknown_symbol_and_division_by_zero() {
        assert_eq!(
            eval_with("a + 1", &[]).unwrap_err(),
            FormulaError::UnknownSymbol {
                name: "a".to_string()
            }
        );
        assert_eq!(eval_with("1 / 0", &[]).unwrap_err(), FormulaError::DivisionByZero);
        assert_eq!(eval_with("1 % 0", &[]).unwrap_err(), FormulaError::DivisionByZero);
    }
}
