// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Filter expression parsing and evaluation.
//!
//! Prefix (LDAP style) syntax:
//!
//! ```text
//! filter     = "(" ( and | or | not | item ) ")"
//! and        = "&" filter+
//! or         = "|" filter+
//! not        = "!" filter
//! item       = attr ( "=" | "~=" | ">=" | "<=" ) value
//! ```
//!
//! `(attr=*)` tests presence, an `=` value containing unescaped `*` is a
//! substring match. A backslash escapes `(`, `)`, `*` and `\` in values.

use std::fmt;

use super::attributes::{lookup, AttributeValue, Attributes, Version};
use crate::types::{RegionError, RegionResult};

/// Comparison operator of a simple item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    Approx,
    GreaterEq,
    LessEq,
}

impl Comparison {
    fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::Approx => "~=",
            Self::GreaterEq => ">=",
            Self::LessEq => "<=",
        }
    }
}

/// Parsed filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
    Not(Box<FilterExpr>),
    Compare {
        attr: String,
        op: Comparison,
        value: String,
    },
    Present {
        attr: String,
    },
    /// `parts` holds the literal text between wildcards; first and last may be empty
    Substring {
        attr: String,
        parts: Vec<String>,
    },
}

impl FilterExpr {
    /// Parse a filter expression
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidFilterSyntax`] describing the first problem found
    pub fn parse(input: &str) -> RegionResult<Self> {
        let mut parser = Parser {
            input,
            chars: input.chars().collect(),
            pos: 0,
        };
        let expr = parser.parse_filter()?;
        parser.skip_whitespace();
        if parser.pos != parser.chars.len() {
            return Err(parser.error("unexpected trailing characters"));
        }
        Ok(expr)
    }

    /// Evaluate the expression against an attribute map
    pub fn matches(&self, attributes: &Attributes) -> bool {
        match self {
            Self::And(children) => children.iter().all(|c| c.matches(attributes)),
            Self::Or(children) => children.iter().any(|c| c.matches(attributes)),
            Self::Not(child) => !child.matches(attributes),
            Self::Present { attr } => lookup(attributes, attr).is_some(),
            Self::Compare { attr, op, value } => lookup(attributes, attr)
                .map(|actual| compare(actual, *op, value))
                .unwrap_or(false),
            Self::Substring { attr, parts } => lookup(attributes, attr)
                .map(|actual| substring(actual, parts))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(children) | Self::Or(children) => {
                let op = if matches!(self, Self::And(_)) { '&' } else { '|' };
                write!(f, "({}", op)?;
                for child in children {
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            Self::Not(child) => write!(f, "(!{})", child),
            Self::Present { attr } => write!(f, "({}=*)", attr),
            Self::Compare { attr, op, value } => {
                write!(f, "({}{}{})", attr, op.symbol(), escape(value))
            }
            Self::Substring { attr, parts } => {
                let escaped: Vec<String> = parts.iter().map(|p| escape(p)).collect();
                write!(f, "({}={})", attr, escaped.join("*"))
            }
        }
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '(' | ')' | '*' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn compare(actual: &AttributeValue, op: Comparison, literal: &str) -> bool {
    match actual {
        AttributeValue::String(s) => match op {
            Comparison::Equal => s == literal,
            Comparison::Approx => normalize(s) == normalize(literal),
            Comparison::GreaterEq => s.as_str() >= literal,
            Comparison::LessEq => s.as_str() <= literal,
        },
        AttributeValue::Long(n) => match literal.trim().parse::<i64>() {
            Ok(rhs) => ordered(n.cmp(&rhs), op),
            Err(_) => false,
        },
        AttributeValue::Boolean(b) => match literal.trim().to_ascii_lowercase().parse::<bool>() {
            Ok(rhs) => matches!(op, Comparison::Equal | Comparison::Approx) && *b == rhs,
            Err(_) => false,
        },
        AttributeValue::Version(v) => match literal.parse::<Version>() {
            Ok(rhs) => ordered(v.cmp(&rhs), op),
            Err(_) => false,
        },
        AttributeValue::List(items) => items.iter().any(|item| compare(item, op, literal)),
    }
}

fn ordered(ordering: std::cmp::Ordering, op: Comparison) -> bool {
    use std::cmp::Ordering::*;
    match op {
        Comparison::Equal | Comparison::Approx => ordering == Equal,
        Comparison::GreaterEq => ordering != Less,
        Comparison::LessEq => ordering != Greater,
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn substring(actual: &AttributeValue, parts: &[String]) -> bool {
    match actual {
        AttributeValue::List(items) => items.iter().any(|item| substring(item, parts)),
        AttributeValue::String(s) => substring_str(s, parts),
        other => substring_str(&other.to_string(), parts),
    }
}

fn substring_str(s: &str, parts: &[String]) -> bool {
    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return false,
    };
    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return s == first,
    };

    if !s.starts_with(first.as_str()) {
        return false;
    }
    let mut pos = first.len();
    for part in middle {
        match s[pos..].find(part.as_str()) {
            Some(idx) => pos += idx + part.len(),
            None => return false,
        }
    }
    s[pos..].ends_with(last.as_str())
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &str) -> RegionError {
        RegionError::InvalidFilterSyntax(format!(
            "{} at position {} in \"{}\"",
            message, self.pos, self.input
        ))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> RegionResult<()> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", expected)))
        }
    }

    fn parse_filter(&mut self) -> RegionResult<FilterExpr> {
        self.skip_whitespace();
        self.expect('(')?;
        self.skip_whitespace();

        let expr = match self.peek() {
            Some('&') => {
                self.pos += 1;
                FilterExpr::And(self.parse_list()?)
            }
            Some('|') => {
                self.pos += 1;
                FilterExpr::Or(self.parse_list()?)
            }
            Some('!') => {
                self.pos += 1;
                FilterExpr::Not(Box::new(self.parse_filter()?))
            }
            Some(_) => self.parse_item()?,
            None => return Err(self.error("unexpected end of filter")),
        };

        self.skip_whitespace();
        self.expect(')')?;
        Ok(expr)
    }

    fn parse_list(&mut self) -> RegionResult<Vec<FilterExpr>> {
        let mut children = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() != Some('(') {
                break;
            }
            children.push(self.parse_filter()?);
        }
        if children.is_empty() {
            return Err(self.error("expected at least one operand"));
        }
        Ok(children)
    }

    fn parse_item(&mut self) -> RegionResult<FilterExpr> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '=' | '~' | '<' | '>' | '(' | ')') {
                break;
            }
            self.pos += 1;
        }
        let attr: String = self.chars[start..self.pos].iter().collect::<String>().trim().to_string();
        if attr.is_empty() {
            return Err(self.error("missing attribute name"));
        }

        let op = match self.peek() {
            Some('=') => {
                self.pos += 1;
                Comparison::Equal
            }
            Some(c @ ('~' | '<' | '>')) => {
                self.pos += 1;
                self.expect('=')?;
                match c {
                    '~' => Comparison::Approx,
                    '<' => Comparison::LessEq,
                    _ => Comparison::GreaterEq,
                }
            }
            _ => return Err(self.error("expected comparison operator")),
        };

        // Literal text split at unescaped wildcards
        let mut parts = vec![String::new()];
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated value")),
                Some(')') => break,
                Some('(') => return Err(self.error("unescaped '(' in value")),
                Some('\\') => {
                    self.pos += 1;
                    let escaped = self.peek().ok_or_else(|| self.error("dangling escape"))?;
                    if let Some(last) = parts.last_mut() {
                        last.push(escaped);
                    }
                    self.pos += 1;
                }
                Some('*') if op == Comparison::Equal => {
                    self.pos += 1;
                    parts.push(String::new());
                }
                Some(c) => {
                    if let Some(last) = parts.last_mut() {
                        last.push(c);
                    }
                    self.pos += 1;
                }
            }
        }

        if parts.len() == 1 {
            let value = parts.pop().unwrap_or_default();
            return Ok(FilterExpr::Compare { attr, op, value });
        }
        if parts.len() == 2 && parts.iter().all(String::is_empty) {
            return Ok(FilterExpr::Present { attr });
        }
        Ok(FilterExpr::Substring { attr, parts })
    }
}
