//! Arithmetic expression evaluator.
//!
//! Only numeric literals and the operators below are understood, so user
//! input can never reach anything but arithmetic:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '//' | '%') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := primary ('**' unary)?
//! primary := NUMBER | '(' expr ')'
//! ```
//!
//! Integers stay integers under `+ - * // % **` (with a non-negative
//! exponent); `/` always produces a float. `//` and `%` round towards
//! negative infinity.

use super::format_float;
use crate::error::UserFacing;
use std::fmt;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character {0:?} at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("invalid number literal {0:?}")]
    InvalidNumber(String),
    #[error("unexpected {0}")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("division by zero")]
    DivisionByZero,
    #[error("numeric overflow")]
    Overflow,
    #[error("expression nested too deeply")]
    TooDeep,
}

impl UserFacing for CalcError {
    fn user_message(&self) -> String {
        "Invalid expression".to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(v) => f.write_str(&format_float(*v)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(n) => write!(f, "number {}", n),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::StarStar => f.write_str("'**'"),
            Token::Slash => f.write_str("'/'"),
            Token::SlashSlash => f.write_str("'//'"),
            Token::Percent => f.write_str("'%'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent part: e, optional sign, digits.
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Num(parse_literal(&literal)?));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::StarStar);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    tokens.push(Token::SlashSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            other => return Err(CalcError::UnexpectedChar(other, i)),
        }
    }

    Ok(tokens)
}

fn parse_literal(literal: &str) -> Result<Number, CalcError> {
    let invalid = || CalcError::InvalidNumber(literal.to_string());
    if literal == "." {
        return Err(invalid());
    }
    if literal.contains(['.', 'e', 'E']) {
        literal.parse::<f64>().map(Number::Float).map_err(|_| invalid())
    } else {
        literal.parse::<i64>().map(Number::Int).map_err(|_| invalid())
    }
}

/// Bound on nested parentheses, unary signs and `**` chains, so the
/// recursion stays within the thread's stack.
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<Number, CalcError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = binary(op, value, rhs)?;
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<Number, CalcError> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::SlashSlash | Token::Percent)) =
            self.peek()
        {
            self.pos += 1;
            let rhs = self.unary()?;
            value = binary(op, value, rhs)?;
        }
        Ok(value)
    }

    // Every level of nesting passes through here.
    fn unary(&mut self) -> Result<Number, CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<Number, CalcError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                negate(self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Number, CalcError> {
        let base = self.primary()?;
        if self.peek() == Some(Token::StarStar) {
            self.pos += 1;
            let exponent = self.unary()?;
            return pow(base, exponent);
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Number, CalcError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    Some(other) => Err(CalcError::UnexpectedToken(other.to_string())),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(other) => Err(CalcError::UnexpectedToken(other.to_string())),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

fn finite(value: f64) -> Result<Number, CalcError> {
    if value.is_finite() {
        Ok(Number::Float(value))
    } else {
        Err(CalcError::Overflow)
    }
}

fn negate(value: Number) -> Result<Number, CalcError> {
    match value {
        Number::Int(i) => i.checked_neg().map(Number::Int).ok_or(CalcError::Overflow),
        Number::Float(f) => Ok(Number::Float(-f)),
    }
}

fn floor_div_int(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

fn floor_mod_int(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

fn floor_mod_float(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
        r + b
    } else {
        r
    }
}

fn binary(op: Token, lhs: Number, rhs: Number) -> Result<Number, CalcError> {
    if matches!(op, Token::Slash | Token::SlashSlash | Token::Percent) && rhs.is_zero() {
        return Err(CalcError::DivisionByZero);
    }

    if let (Number::Int(a), Number::Int(b)) = (lhs, rhs) {
        let result = match op {
            Token::Plus => a.checked_add(b),
            Token::Minus => a.checked_sub(b),
            Token::Star => a.checked_mul(b),
            Token::SlashSlash => floor_div_int(a, b),
            Token::Percent => floor_mod_int(a, b),
            Token::Slash => return finite(a as f64 / b as f64),
            _ => return Err(CalcError::UnexpectedToken(op.to_string())),
        };
        return result.map(Number::Int).ok_or(CalcError::Overflow);
    }

    let (a, b) = (lhs.as_f64(), rhs.as_f64());
    match op {
        Token::Plus => finite(a + b),
        Token::Minus => finite(a - b),
        Token::Star => finite(a * b),
        Token::Slash => finite(a / b),
        Token::SlashSlash => finite((a / b).floor()),
        Token::Percent => finite(floor_mod_float(a, b)),
        _ => Err(CalcError::UnexpectedToken(op.to_string())),
    }
}

fn pow(base: Number, exponent: Number) -> Result<Number, CalcError> {
    match (base, exponent) {
        (Number::Int(b), Number::Int(e)) if e >= 0 => {
            let e = u32::try_from(e).map_err(|_| CalcError::Overflow)?;
            b.checked_pow(e).map(Number::Int).ok_or(CalcError::Overflow)
        }
        _ => {
            if base.is_zero() && exponent.as_f64() < 0.0 {
                return Err(CalcError::DivisionByZero);
            }
            finite(base.as_f64().powf(exponent.as_f64()))
        }
    }
}

pub fn evaluate(expression: &str) -> Result<Number, CalcError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    match parser.next() {
        None => Ok(value),
        Some(extra) => Err(CalcError::UnexpectedToken(extra.to_string())),
    }
}
