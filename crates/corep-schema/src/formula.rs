//! Master-rule formulas
//!
//! A [`Formula`] is `target <cmp> expression`, parsed once from text such as
//! `Tier1_capital == CET1_capital + AT1_capital` into a typed [`Expr`] tree.
//!
//! # Grammar
//!
//! ```text
//! formula := IDENT cmp expr
//! cmp     := "==" | "=" | "!=" | "<" | "<=" | ">" | ">="
//! expr    := term (("+" | "-") term)*
//! term    := factor ("*" factor)*
//! factor  := "-" factor | NUMBER | IDENT | "(" expr ")"
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Arithmetic expression over field references
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Reference to a payload field
    Field(String),
    /// Numeric literal
    Const(f64),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Field reference
    #[inline]
    pub fn field(id: impl Into<String>) -> Self {
        Self::Field(id.into())
    }

    /// Left-folded sum of field references
    ///
    /// An empty list sums to zero.
    #[must_use]
    pub fn sum<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ids.into_iter()
            .map(Self::field)
            .reduce(|acc, next| Self::Add(Box::new(acc), Box::new(next)))
            .unwrap_or(Self::Const(0.0))
    }

    /// Referenced field ids, first appearance order, no duplicates
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Field(id) => {
                if !out.contains(&id.as_str()) {
                    out.push(id);
                }
            }
            Self::Const(_) => {}
            Self::Neg(inner) => inner.collect_fields(out),
            Self::Add(a, b) | Self::Sub(a, b) | Self::Mul(a, b) => {
                a.collect_fields(out);
                b.collect_fields(out);
            }
        }
    }

    /// Evaluate against resolved field values
    ///
    /// Returns `None` if a referenced field is absent from `values`.
    #[must_use]
    pub fn evaluate(&self, values: &HashMap<&str, f64>) -> Option<f64> {
        Some(match self {
            Self::Field(id) => *values.get(id.as_str())?,
            Self::Const(c) => *c,
            Self::Neg(inner) => -inner.evaluate(values)?,
            Self::Add(a, b) => a.evaluate(values)? + b.evaluate(values)?,
            Self::Sub(a, b) => a.evaluate(values)? - b.evaluate(values)?,
            Self::Mul(a, b) => a.evaluate(values)? * b.evaluate(values)?,
        })
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Add(..) | Self::Sub(..) => 1,
            Self::Mul(..) => 2,
            Self::Neg(_) => 3,
            Self::Field(_) | Self::Const(_) => 4,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(id) => f.write_str(id),
            Self::Const(c) => write!(f, "{c}"),
            Self::Neg(inner) => {
                f.write_str("-")?;
                inner.fmt_operand(f, 3)
            }
            Self::Add(a, b) => {
                a.fmt_operand(f, 1)?;
                f.write_str(" + ")?;
                b.fmt_operand(f, 1)
            }
            // right operand needs parens at equal precedence: a - (b + c)
            Self::Sub(a, b) => {
                a.fmt_operand(f, 1)?;
                f.write_str(" - ")?;
                b.fmt_operand(f, 2)
            }
            Self::Mul(a, b) => {
                a.fmt_operand(f, 2)?;
                f.write_str(" * ")?;
                b.fmt_operand(f, 3)
            }
        }
    }
}

/// Comparison between the target field and the expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparator {
    /// Operator text
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Whether `target <cmp> computed` holds within an absolute tolerance
    ///
    /// Equality passes when `|target - computed| <= tolerance`. Ordering
    /// comparisons let the target miss the bound by at most `tolerance`.
    #[must_use]
    pub fn holds(self, target: f64, computed: f64, tolerance: f64) -> bool {
        let diff = target - computed;
        match self {
            Self::Eq => diff.abs() <= tolerance,
            Self::Ne => diff.abs() > tolerance,
            Self::Lt => diff < tolerance,
            Self::Le => diff <= tolerance,
            Self::Gt => diff > -tolerance,
            Self::Ge => diff >= -tolerance,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Parsed master-rule formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Formula {
    target: String,
    comparator: Comparator,
    expression: Expr,
}

impl Formula {
    /// Build from parts
    pub fn new(target: impl Into<String>, comparator: Comparator, expression: Expr) -> Self {
        Self {
            target: target.into(),
            comparator,
            expression,
        }
    }

    /// Shorthand for `target == expression`
    pub fn equals(target: impl Into<String>, expression: Expr) -> Self {
        Self::new(target, Comparator::Eq, expression)
    }

    /// Parse formula text
    ///
    /// # Errors
    /// Returns [`SchemaError::FormulaParse`] on malformed input
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        let tokens = tokenize(text).map_err(|reason| SchemaError::formula(text, reason))?;
        Parser { tokens, pos: 0 }
            .formula()
            .map_err(|reason| SchemaError::formula(text, reason))
    }

    /// Target field id
    #[inline]
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[inline]
    #[must_use]
    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    #[inline]
    #[must_use]
    pub fn expression(&self) -> &Expr {
        &self.expression
    }

    /// All referenced field ids, target first
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut out = vec![self.target.as_str()];
        for id in self.expression.fields() {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.target, self.comparator, self.expression)
    }
}

impl FromStr for Formula {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Formula {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Formula> for String {
    fn from(value: Formula) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Cmp(Comparator),
    Plus,
    Minus,
    Star,
    LParen,
    RParen,
}

fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
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
            '=' | '!' | '<' | '>' => {
                let next_is_eq = chars.get(i + 1) == Some(&'=');
                let cmp = match (c, next_is_eq) {
                    ('=', _) => Comparator::Eq,
                    ('!', true) => Comparator::Ne,
                    ('<', true) => Comparator::Le,
                    ('<', false) => Comparator::Lt,
                    ('>', true) => Comparator::Ge,
                    ('>', false) => Comparator::Gt,
                    _ => return Err(format!("unexpected '{c}' at position {i}")),
                };
                tokens.push(Token::Cmp(cmp));
                i += if next_is_eq { 2 } else { 1 };
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{literal}'"))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected '{other}' at position {i}")),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn formula(mut self) -> Result<Formula, String> {
        let target = match self.next() {
            Some(Token::Ident(id)) => id,
            Some(other) => return Err(format!("expected target field, found {other:?}")),
            None => return Err("empty formula".to_string()),
        };
        let comparator = match self.next() {
            Some(Token::Cmp(cmp)) => cmp,
            Some(other) => return Err(format!("expected comparison, found {other:?}")),
            None => return Err("unexpected end of formula".to_string()),
        };
        let expression = self.expr()?;
        if let Some(extra) = self.peek() {
            return Err(format!("unexpected trailing {extra:?}"));
        }
        Ok(Formula::new(target, comparator, expression))
    }

    fn expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    lhs = Expr::Add(Box::new(lhs), Box::new(self.term()?));
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    lhs = Expr::Sub(Box::new(lhs), Box::new(self.term()?));
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn term(&mut self) -> Result<Expr, String> {
        let mut lhs = self.factor()?;
        while self.peek() == Some(&Token::Star) {
            self.pos += 1;
            lhs = Expr::Mul(Box::new(lhs), Box::new(self.factor()?));
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Minus) => Ok(Expr::Neg(Box::new(self.factor()?))),
            Some(Token::Number(n)) => Ok(Expr::Const(n)),
            Some(Token::Ident(id)) => Ok(Expr::Field(id)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("missing ')'".to_string()),
                }
            }
            Some(other) => Err(format!("unexpected {other:?}")),
            None => Err("unexpected end of formula".to_string()),
        }
    }
}
