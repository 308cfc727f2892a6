//! Recursive-descent formula parser.
//!
//! Precedence, lowest first:
//! `+ -` < `* / %` < unary `+ -` < `**` (right-associative) < atoms.
//! As in the usual scientific notation `-2 ** 2` is `-(2 ** 2)` and
//! `2 ** -1` is accepted.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;

use super::eval::lookup_function;
use super::lexer::{tokenize, Token};
use super::FormulaError;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
}

/// Formula syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// Reference to a parameter, global or constant.
    Symbol(String),
    /// Unary operation.
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Binary operation.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Call of a built-in function.
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    fn collect_symbols<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Self::Number(_) => {}
            Self::Symbol(name) => {
                out.insert(name.as_str());
            }
            Self::Unary { operand, .. } => operand.collect_symbols(out),
            Self::Binary { left, right, .. } => {
                left.collect_symbols(out);
                right.collect_symbols(out);
            }
            Self::Call { args, .. } => {
                for arg in args {
                    arg.collect_symbols(out);
                }
            }
        }
    }
}

/// A parsed formula together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parses a formula.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        Ok(Self {
            source: source.to_string(),
            expr: parse(source)?,
        })
    }

    /// The original formula text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The syntax tree.
    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.expr
    }

    /// All symbol names referenced by the formula (function names excluded).
    #[must_use]
    pub fn symbols(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.expr.collect_symbols(&mut out);
        out
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Deepest expression tree a formula may produce.
pub const MAX_DEPTH: usize = 256;

/// Parses a formula into an expression tree.
///
/// Fails with `FormulaError::TooDeep` when nesting or operator chains would
/// build a tree deeper than [`MAX_DEPTH`].
pub fn parse(source: &str) -> Result<Expr, FormulaError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        nesting: 0,
    };
    let (expr, _) = parser.additive()?;
    if let Some((token, span)) = parser.peek_with_span() {
        return Err(FormulaError::UnexpectedToken {
            found: token.to_string(),
            position: span.start,
        });
    }
    Ok(expr)
}

/// An expression with the depth of its tree.
type Parsed = (Expr, usize);

fn checked_depth(depth: usize) -> Result<usize, FormulaError> {
    if depth > MAX_DEPTH {
        Err(FormulaError::TooDeep { limit: MAX_DEPTH })
    } else {
        Ok(depth)
    }
}

fn binary(op: BinaryOp, (left, ld): Parsed, (right, rd): Parsed) -> Result<Parsed, FormulaError> {
    let depth = checked_depth(ld.max(rd) + 1)?;
    Ok((
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        depth,
    ))
}

struct Parser<'src> {
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
    nesting: usize,
}

impl<'src> Parser<'src> {
    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).map(|(t, _)| *t)
    }

    fn peek_with_span(&self) -> Option<(Token<'src>, Range<usize>)> {
        self.tokens.get(self.pos).cloned()
    }

    fn bump(&mut self) -> Option<(Token<'src>, Range<usize>)> {
        let next = self.tokens.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn expect(&mut self, expected: Token<'src>) -> Result<(), FormulaError> {
        match self.bump() {
            Some((token, _)) if token == expected => Ok(()),
            Some((token, span)) => Err(FormulaError::UnexpectedToken {
                found: token.to_string(),
                position: span.start,
            }),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    /// Runs `rule` one nesting level deeper.
    fn nested(
        &mut self,
        rule: fn(&mut Self) -> Result<Parsed, FormulaError>,
    ) -> Result<Parsed, FormulaError> {
        self.nesting = checked_depth(self.nesting + 1)?;
        let parsed = rule(self)?;
        self.nesting -= 1;
        Ok(parsed)
    }

    fn additive(&mut self) -> Result<Parsed, FormulaError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.multiplicative()?;
            left = binary(op, left, right)?;
        }
    }

    fn multiplicative(&mut self) -> Result<Parsed, FormulaError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = binary(op, left, right)?;
        }
    }

    fn unary(&mut self) -> Result<Parsed, FormulaError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            _ => return self.power(),
        };
        self.pos += 1;
        let (operand, depth) = self.nested(Self::unary)?;
        Ok((
            Expr::Unary {
                op,
                operand: Box::new(operand),
            },
            checked_depth(depth + 1)?,
        ))
    }

    fn power(&mut self) -> Result<Parsed, FormulaError> {
        let base = self.atom()?;
        if self.peek() == Some(Token::Pow) {
            self.pos += 1;
            // Right operand may itself carry a sign: `2 ** -1`.
            let exponent = self.nested(Self::unary)?;
            return binary(BinaryOp::Pow, base, exponent);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Parsed, FormulaError> {
        let Some((token, span)) = self.bump() else {
            return Err(FormulaError::UnexpectedEnd);
        };
        match token {
            Token::Number(n) => Ok((Expr::Number(n), 1)),
            Token::Ident(name) => {
                if self.peek() == Some(Token::LParen) {
                    self.pos += 1;
                    self.nesting = checked_depth(self.nesting + 1)?;
                    let args = self.arguments()?;
                    self.nesting -= 1;
                    let function = lookup_function(name).ok_or_else(|| {
                        FormulaError::UnknownFunction {
                            name: name.to_string(),
                        }
                    })?;
                    function.check_arity(args.len())?;
                    let depth = args.iter().map(|(_, d)| *d).max().unwrap_or(0) + 1;
                    Ok((
                        Expr::Call {
                            name: name.to_string(),
                            args: args.into_iter().map(|(arg, _)| arg).collect(),
                        },
                        checked_depth(depth)?,
                    ))
                } else {
                    Ok((Expr::Symbol(name.to_string()), 1))
                }
            }
            Token::LParen => {
                let inner = self.nested(Self::additive)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            other => Err(FormulaError::UnexpectedToken {
                found: other.to_string(),
                position: span.start,
            }),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Parsed>, FormulaError> {
        let mut args = Vec::new();
        if self.peek() == Some(Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.additive()?);
            match self.bump() {
                Some((Token::Comma, _)) => {}
                Some((Token::RParen, _)) => return Ok(args),
                Some((token, span)) => {
                    return Err(FormulaError::UnexpectedToken {
                        found: token.to_string(),
                        position: span.start,
                    })
                }
                None => return Err(FormulaError::UnexpectedEnd),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                left: num(1.0),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: num(2.0),
                    right: num(3.0),
                }),
            }
        );
    }

    #[test]
    fn power_is_right_associative_and_binds_over_negation() {
        let expr = parse("-2 ** 3 ** 2").unwrap();
        let Expr::Unary { op: UnaryOp::Neg, operand } = expr else {
            panic!("expected negation at the root");
        };
        assert_eq!(
            *operand,
            Expr::Binary {
                op: BinaryOp::Pow,
                left: num(2.0),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Pow,
                    left: num(3.0),
                    right: num(2.0),
                }),
            }
        );
    }

    #[test]
    fn function_calls_are_checked_at_parse_time() {
        assert!(parse("max(a, b, 3)").is_ok());
        assert_eq!(
            parse("system(1)").unwrap_err(),
            FormulaError::UnknownFunction {
                name: "system".to_string()
            }
        );
        assert!(matches!(
            parse("sqrt(1, 2)").unwrap_err(),
            FormulaError::Arity { .. }
        ));
    }

    #[test]
    fn symbols_exclude_function_names() {
        let formula = Formula::parse("sqrt(a) + b * log(c, 10) + a").unwrap();
        let symbols: Vec<&str> = formula.symbols().into_iter().collect();
        assert_eq!(symbols, vec!["a", "b", "c"]);
        assert_eq!(formula.source(), "sqrt(a) + b * log(c, 10) + a");
    }

    #[test]
    fn nesting_is_bounded() {
        let unary = format!("{}1", "-".repeat(100_000));
        assert_eq!(parse(&unary).unwrap_err(), FormulaError::TooDeep { limit: MAX_DEPTH });

        let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(parse(&parens).unwrap_err(), FormulaError::TooDeep { limit: MAX_DEPTH });

        let chain = vec!["1"; 10_000].join(" + ");
        assert_eq!(parse(&chain).unwrap_err(), FormulaError::TooDeep { limit: MAX_DEPTH });

        let powers = vec!["2"; 10_000].join(" ** ");
        assert_eq!(parse(&powers).unwrap_err(), FormulaError::TooDeep { limit: MAX_DEPTH });

        let calls = format!("{}1{}", "abs(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(parse(&calls).unwrap_err(), FormulaError::TooDeep { limit: MAX_DEPTH });

        let shallow = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse(&shallow).unwrap(), Expr::Number(1.0));
        assert!(parse(&vec!["a"; 200].join(" * ")).is_ok());
    }

    #[test]
    fn reports_malformed_input() {
        assert_eq!(parse("").unwrap_err(), FormulaError::Empty);
        assert_eq!(parse("1 +").unwrap_err(), FormulaError::UnexpectedEnd);
        assert_eq!(parse("(1 + 2").unwrap_err(), FormulaError::UnexpectedEnd);
        assert_eq!(
            parse("1 2").unwrap_err(),
            FormulaError::UnexpectedToken {
                found: "2".to_string(),
                position: 2,
            }
        );
        assert!(matches!(
            parse("* 2").unwrap_err(),
            FormulaError::UnexpectedToken { position: 0, .. }
        ));
    }
}
