//! Path expressions.
//!
//! Syntax: `( step* )` with whitespace-separated steps.
//! - bare or quoted (`'a b'`, `"a b"`) text is a field name; a quoted `'*'` is
//!   the literal field named `*`,
//! - `*` is a wildcard over list/sexp elements and struct field values,
//! - a non-negative integer indexes into a list/sexp.
//!
//! `()` addresses the root value itself.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path expression is empty")]
    Empty,

    #[error("path expression must start with '(' (found '{0}')")]
    MissingOpenParen(char),

    #[error("missing closing ')'")]
    Unterminated,

    #[error("unterminated quoted field starting at offset {0}")]
    UnterminatedQuote(usize),

    #[error("nested expression at offset {0} is not a valid step")]
    Nested(usize),

    #[error("unexpected input after ')' at offset {0}")]
    TrailingInput(usize),

    #[error("invalid index '{0}': indices must be non-negative integers")]
    InvalidIndex(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathStep {
    Field(String),
    Wildcard,
    Index(usize),
}

/// Canonical form of a field name under the case policy. Every comparison of
/// field names goes through this fold.
pub fn fold_field_name(name: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(name.to_lowercase())
    }
}

pub fn field_names_eq(a: &str, b: &str, case_sensitive: bool) -> bool {
    a == b || (!case_sensitive && fold_field_name(a, false) == fold_field_name(b, false))
}

impl PathStep {
    fn normalized(&self, case_sensitive: bool) -> PathStep {
        match self {
            PathStep::Field(name) if !case_sensitive => {
                PathStep::Field(fold_field_name(name, false).into_owned())
            }
            other => other.clone(),
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Wildcard => write!(f, "*"),
            PathStep::Index(i) => write!(f, "{}", i),
            PathStep::Field(name) => {
                let bare = !name.is_empty()
                    && name != "*"
                    && !name.chars().all(|c| c.is_ascii_digit())
                    && !name.starts_with('-')
                    && !name
                        .chars()
                        .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '\'' | '"' | '\\'));
                if bare {
                    write!(f, "{}", name)
                } else {
                    write!(f, "'{}'", name.replace('\\', "\\\\").replace('\'', "\\'"))
                }
            }
        }
    }
}

/// Sequence of steps identifying zero, one, or many locations in a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PathSpec {
    pub steps: Vec<PathStep>,
}

impl PathSpec {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    /// Single field step; the default binding for a column.
    pub fn field(name: impl Into<String>) -> Self {
        Self::new(vec![PathStep::Field(name.into())])
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(src: &str) -> Result<Self, PathError> {
        Parser::new(src).parse()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Field names when every step is a field step; such paths can be inverted
    /// into nested structs on write.
    pub fn field_names(&self) -> Option<Vec<&str>> {
        self.steps
            .iter()
            .map(|s| match s {
                PathStep::Field(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Structural identity under the given field-name case sensitivity.
    pub fn same_target(&self, other: &PathSpec, case_sensitive: bool) -> bool {
        self.steps.len() == other.steps.len()
            && self
                .steps
                .iter()
                .zip(&other.steps)
                .all(|(a, b)| a.normalized(case_sensitive) == b.normalized(case_sensitive))
    }

    /// Key usable for grouping identical targets.
    pub fn normalized(&self, case_sensitive: bool) -> PathSpec {
        PathSpec::new(
            self.steps
                .iter()
                .map(|s| s.normalized(case_sensitive))
                .collect(),
        )
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", step)?;
        }
        write!(f, ")")
    }
}

impl FromStr for PathSpec {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathSpec::parse(s)
    }
}

struct Parser<'a> {
    src: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn parse(mut self) -> Result<PathSpec, PathError> {
        self.skip_ws();
        match self.chars.next() {
            None => return Err(PathError::Empty),
            Some((_, '(')) => {}
            Some((_, c)) => return Err(PathError::MissingOpenParen(c)),
        }

        let mut steps = Vec::new();
        loop {
            self.skip_ws();
            let Some(&(pos, c)) = self.chars.peek() else {
                return Err(PathError::Unterminated);
            };
            match c {
                ')' => {
                    self.chars.next();
                    break;
                }
                '(' => return Err(PathError::Nested(pos)),
                '\'' | '"' => {
                    self.chars.next();
                    steps.push(PathStep::Field(self.quoted(pos, c)?));
                }
                _ => steps.push(self.bare(pos)?),
            }
        }

        self.skip_ws();
        if let Some((pos, _)) = self.chars.next() {
            return Err(PathError::TrailingInput(pos));
        }
        Ok(PathSpec::new(steps))
    }

    fn quoted(&mut self, start: usize, quote: char) -> Result<String, PathError> {
        let mut out = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '\\' => match self.chars.next() {
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                c if c == quote => return Ok(out),
                c => out.push(c),
            }
        }
        Err(PathError::UnterminatedQuote(start))
    }

    fn bare(&mut self, start: usize) -> Result<PathStep, PathError> {
        let mut end = self.src.len();
        while let Some(&(pos, c)) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '(' | ')' | '\'' | '"') {
                end = pos;
                break;
            }
            self.chars.next();
        }
        let token = &self.src[start..end];
        if token == "*" {
            return Ok(PathStep::Wildcard);
        }
        let digits = token.strip_prefix('-').unwrap_or(token);
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            if token.starts_with('-') {
                return Err(PathError::InvalidIndex(token.to_string()));
            }
            return token
                .parse()
                .map(PathStep::Index)
                .map_err(|_| PathError::InvalidIndex(token.to_string()));
        }
        Ok(PathStep::Field(token.to_string()))
    }
}
