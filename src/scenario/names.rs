//! Scenario names from a resource description.
//!
//! A description may hold a literal tuple, list or dict of names, e.g.
//! `('low', 'mid', 'high')` or `{"2030": 1, "2050": 2}` (dict keys are the
//! names). Anything else falls back to `Scenario0..Scenario{n-1}`.

use logos::Logos;
use tracing::warn;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Literal {
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| unescape(lex.slice()))]
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),

    #[regex(r"[-+]?[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice().trim_start_matches('+').to_string())]
    #[regex(r"[-+]?\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().trim_start_matches('+').to_string())]
    Number(String),

    #[token("True", |_| "True".to_string())]
    #[token("False", |_| "False".to_string())]
    #[token("None", |_| "None".to_string())]
    Keyword(String),

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
}

fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn scalar(token: Option<Literal>) -> Result<String, String> {
    match token {
        Some(Literal::Str(s) | Literal::Number(s) | Literal::Keyword(s)) => Ok(s),
        Some(other) => Err(format!("unexpected {other:?}")),
        None => Err("unexpected end of description".to_string()),
    }
}

/// Consumes one dict value: a scalar or a bracketed literal of any depth.
fn skip_value(iter: &mut impl Iterator<Item = Literal>) -> Result<(), String> {
    let mut closers = Vec::new();
    loop {
        let token = iter.next();
        match token.as_ref() {
            Some(Literal::LParen) => closers.push(Literal::RParen),
            Some(Literal::LBracket) => closers.push(Literal::RBracket),
            Some(Literal::LBrace) => closers.push(Literal::RBrace),
            Some(Literal::RParen | Literal::RBracket | Literal::RBrace)
                if closers.last() == token.as_ref() =>
            {
                closers.pop();
            }
            Some(Literal::Str(_) | Literal::Number(_) | Literal::Keyword(_)) if closers.is_empty() => {
                return Ok(());
            }
            Some(Literal::Str(_) | Literal::Number(_) | Literal::Keyword(_) | Literal::Comma | Literal::Colon)
                if !closers.is_empty() => {}
            Some(other) => return Err(format!("unexpected {other:?}")),
            None => return Err("unterminated literal".to_string()),
        }
        if closers.is_empty() {
            return Ok(());
        }
    }
}

/// Parses a tuple, list or dict literal into its element (or key) names.
fn parse_literal(description: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    for token in Literal::lexer(description) {
        tokens.push(token.map_err(|()| "unrecognized character".to_string())?);
    }
    let mut iter = tokens.into_iter().peekable();

    let (close, is_dict) = match iter.next() {
        Some(Literal::LParen) => (Literal::RParen, false),
        Some(Literal::LBracket) => (Literal::RBracket, false),
        Some(Literal::LBrace) => (Literal::RBrace, true),
        _ => return Err(format!("'{description}' is not a tuple, list or dict")),
    };

    let mut names = Vec::new();
    let mut saw_comma = false;
    loop {
        if iter.peek() == Some(&close) {
            iter.next();
            break;
        }
        names.push(scalar(iter.next())?);
        if is_dict {
            if iter.next() != Some(Literal::Colon) {
                return Err("expected ':' in dict".to_string());
            }
            skip_value(&mut iter)?;
        }
        match iter.next() {
            Some(Literal::Comma) => saw_comma = true,
            Some(token) if token == close => break,
            Some(token) => return Err(format!("unexpected {token:?}")),
            None => return Err("unterminated literal".to_string()),
        }
    }
    if iter.next().is_some() {
        return Err("trailing input after literal".to_string());
    }
    // `('a')` is a parenthesized string, not a tuple.
    if close == Literal::RParen && names.len() == 1 && !saw_comma {
        return Err(format!("'{description}' is not a tuple, list or dict"));
    }
    Ok(names)
}

/// Synthetic names `Scenario0..Scenario{total-1}`.
#[must_use]
pub fn default_names(total: usize) -> Vec<String> {
    (0..total).map(|i| format!("Scenario{i}")).collect()
}

/// Scenario names for a resource description, falling back to
/// [`default_names`] when the description is absent or unusable.
#[must_use]
pub fn scenario_names(description: Option<&str>, total: usize) -> Vec<String> {
    let Some(description) = description else {
        return default_names(total);
    };
    match parse_literal(description) {
        Ok(names) => names,
        Err(reason) => {
            warn!(%reason, "can't process scenario description, using default names");
            default_names(total)
        }
    }
}
