//! Condition expressions
//!
//! A condition is a single predicate over one pull request attribute:
//!
//! ```text
//! [-][#]attribute[ OP value]
//! ```
//!
//! - `-` negates the whole condition
//! - `#` compares the length of the attribute rather than its value
//! - OP is one of `=` `==` `!=` `≠` `<` `<=` `≤` `>` `>=` `≥` `~=` (regex
//!   search) `*=` (substring) or `in [a, b, ...]`
//! - with no operator the attribute is tested for truthiness
//!
//! Attributes missing from the bag make the condition false; only the `-`
//! prefix can turn that into true.

use crate::error::{Error, Result};
use crate::value::{Mapping, Value};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

/// Comparison operator with its compiled operand
#[derive(Debug, Clone)]
enum Operator {
    Truthy,
    Eq(Operand),
    Ne(Operand),
    Lt(Operand),
    Le(Operand),
    Gt(Operand),
    Ge(Operand),
    Search(Regex),
    Contains(String),
    In(Vec<Operand>),
}

/// Right-hand value: the text as written and its typed interpretation
#[derive(Debug, Clone)]
struct Operand {
    raw: String,
    value: Value,
}

/// A compiled, immutable condition
#[derive(Debug, Clone)]
pub struct Condition {
    expression: String,
    path: String,
    negate: bool,
    length: bool,
    op: Operator,
}

impl Condition {
    /// Compile a condition expression
    pub fn compile(expression: &str) -> Result<Self> {
        let expression = expression.trim();
        let fail = |message: &str| Error::InvalidCondition {
            expression: expression.to_string(),
            message: message.to_string(),
        };

        let mut rest = expression;
        let negate = rest.starts_with('-');
        if negate {
            rest = &rest[1..];
        }
        let length = rest.starts_with('#');
        if length {
            rest = &rest[1..];
        }

        let name_len = attribute_len(rest);
        if name_len == 0 {
            return Err(fail("expected an attribute name"));
        }
        let path = &rest[..name_len];
        if path.ends_with('.') || path.contains("..") {
            return Err(fail("malformed attribute path"));
        }

        let rest = rest[name_len..].trim_start();
        let op = if rest.is_empty() {
            Operator::Truthy
        } else {
            parse_operator(rest).map_err(|message| fail(&message))?
        };

        Ok(Self {
            expression: expression.to_string(),
            path: path.to_string(),
            negate,
            length,
            op,
        })
    }

    /// Root attribute this condition reads (first segment of a dotted path)
    pub fn attribute_name(&self) -> &str {
        self.path.split('.').next().unwrap_or(&self.path)
    }

    /// Full attribute path, including nested segments
    pub fn attribute_path(&self) -> &str {
        &self.path
    }

    /// The expression this condition was compiled from
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Evaluate against an attribute bag
    pub fn matches(&self, attributes: &Mapping) -> bool {
        let mut segments = self.path.split('.');
        let actual = segments
            .next()
            .and_then(|root| attributes.get(root))
            .and_then(|root| segments.try_fold(root, |node, segment| node.get(segment)));

        let result = actual.is_some_and(|value| {
            if self.length {
                value
                    .len()
                    .is_some_and(|n| self.test(&Value::from(n as u64)))
            } else {
                self.test(value)
            }
        });

        result != self.negate
    }

    fn test(&self, actual: &Value) -> bool {
        if let (Value::Sequence(items), false) = (actual, matches!(self.op, Operator::Truthy)) {
            return match &self.op {
                Operator::Ne(expected) => !items.iter().any(|item| expected.equals(item)),
                _ => items.iter().any(|item| self.test_scalar(item)),
            };
        }
        self.test_scalar(actual)
    }

    fn test_scalar(&self, actual: &Value) -> bool {
        match &self.op {
            Operator::Truthy => actual.is_truthy(),
            Operator::Eq(expected) => expected.equals(actual),
            Operator::Ne(expected) => !actual.is_null() && !expected.equals(actual),
            Operator::Lt(expected) => expected.compare(actual) == Some(Ordering::Less),
            Operator::Le(expected) => matches!(
                expected.compare(actual),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::Gt(expected) => expected.compare(actual) == Some(Ordering::Greater),
            Operator::Ge(expected) => matches!(
                expected.compare(actual),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Search(re) => scalar_text(actual).is_some_and(|s| re.is_match(&s)),
            Operator::Contains(needle) => actual.as_str().is_some_and(|s| s.contains(needle.as_str())),
            Operator::In(choices) => choices.iter().any(|c| c.equals(actual)),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl Operand {
    fn parse(text: &str) -> std::result::Result<Self, String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("expected a value".to_string());
        }
        let value = if let Some(quote) = text.chars().next().filter(|c| *c == '"' || *c == '\'') {
            let inner = text[1..]
                .strip_suffix(quote)
                .ok_or_else(|| format!("unterminated string {text}"))?;
            return Ok(Self {
                raw: inner.to_string(),
                value: Value::from(inner),
            });
        } else if text == "true" || text == "false" {
            Value::Bool(text == "true")
        } else if let Ok(i) = text.parse::<i64>() {
            Value::Integer(i)
        } else if looks_numeric(text)
            && let Ok(f) = text.parse::<f64>()
        {
            Value::Float(f)
        } else {
            Value::from(text)
        };
        Ok(Self {
            raw: text.to_string(),
            value,
        })
    }

    /// Equality with numeric widening; a string attribute compares against
    /// the operand as written.
    fn equals(&self, actual: &Value) -> bool {
        match (actual, &self.value) {
            (Value::String(s), _) => *s == self.raw,
            (a, e) => numeric(a)
                .zip(numeric(e))
                .map_or_else(|| a == e, |(a, e)| a == e),
        }
    }

    /// Ordering of `actual` relative to this operand
    fn compare(&self, actual: &Value) -> Option<Ordering> {
        match (actual, &self.value) {
            (Value::String(a), Value::String(e)) => Some(a.as_str().cmp(e.as_str())),
            (a, e) => numeric(a).zip(numeric(e)).and_then(|(a, e)| a.partial_cmp(&e)),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
const fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn looks_numeric(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

/// Byte length of the attribute name at the start of `s`
fn attribute_len(s: &str) -> usize {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return 0,
    }
    chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
        .map_or(s.len(), |(i, _)| i)
}

fn parse_operator(s: &str) -> std::result::Result<Operator, String> {
    // Longest tokens first so `==` is not read as `=` followed by `=value`.
    const TOKENS: &[&str] = &["==", "!=", "<=", ">=", "~=", "*=", "≠", "≤", "≥", "=", "<", ">"];

    if let Some(list) = s.strip_prefix("in").filter(|r| r.starts_with([' ', '['])) {
        return parse_list(list.trim()).map(Operator::In);
    }

    let token = TOKENS
        .iter()
        .find(|t| s.starts_with(**t))
        .ok_or_else(|| format!("unexpected '{s}', expected an operator"))?;
    let operand = &s[token.len()..];

    Ok(match *token {
        "=" | "==" => Operator::Eq(Operand::parse(operand)?),
        "!=" | "≠" => Operator::Ne(Operand::parse(operand)?),
        "<" => Operator::Lt(Operand::parse(operand)?),
        "<=" | "≤" => Operator::Le(Operand::parse(operand)?),
        ">" => Operator::Gt(Operand::parse(operand)?),
        ">=" | "≥" => Operator::Ge(Operand::parse(operand)?),
        "~=" => {
            let pattern = Operand::parse(operand)?.raw;
            Operator::Search(Regex::new(&pattern).map_err(|e| e.to_string())?)
        }
        _ => Operator::Contains(Operand::parse(operand)?.raw),
    })
}

fn parse_list(s: &str) -> std::result::Result<Vec<Operand>, String> {
    let inner = s
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .ok_or_else(|| format!("expected [value, ...] after 'in', found '{s}'"))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    split_items(inner).into_iter().map(Operand::parse).collect()
}

/// Split on commas outside quoted strings
fn split_items(s: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut quote = None;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            (None, ',') => {
                items.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&s[start..]);
    items
}
