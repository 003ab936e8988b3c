//! Splitting of input lines into raw text tokens
//!
//! The separator is matched literally. Quoting and escaping are not
//! interpreted, so a separator can never appear inside a field, and tokens
//! are not trimmed.

use std::fmt;
use std::str::FromStr;

/// Literal field separator, comma by default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter(String);

impl Delimiter {
    pub fn new<S: Into<String>>(separator: S) -> Result<Self, InvalidDelimiter> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(InvalidDelimiter);
        }
        Ok(Self(separator))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self(",".to_string())
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepts `\t` as a spelled-out tab
impl FromStr for Delimiter {
    type Err = InvalidDelimiter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "\\t" => Self::new("\t"),
            other => Self::new(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDelimiter;

impl fmt::Display for InvalidDelimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("delimiter must not be empty")
    }
}

impl std::error::Error for InvalidDelimiter {}

/// Raw tokens of one input line, in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord<'a> {
    tokens: Vec<&'a str>,
}

impl<'a> RawRecord<'a> {
    /// Token at a 0-based column index, `None` if the line is too short
    pub fn get(&self, ordinal: usize) -> Option<&'a str> {
        self.tokens.get(ordinal).copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[&'a str] {
        &self.tokens
    }
}

/// Split a line on the literal separator, keeping every token
pub fn tokenize<'a>(line: &'a str, separator: &Delimiter) -> RawRecord<'a> {
    RawRecord {
        tokens: line.split(separator.as_str()).collect(),
    }
}
