//! Case-insensitive text matchers for anchors and section keywords.
//!
//! In configuration a bare string is a substring match and a table with a
//! `regex` key is a regular expression:
//!
//! ```toml
//! anchors = ["housing loans", { regex = "^owner[- ]occupied" }]
//! ```
//!
//! Both forms compile to a case-insensitive [`Regex`] so match offsets are
//! always byte offsets into the original line text.

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::error::{Error, Result};

/// A compiled, case-insensitive matcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawPattern")]
pub struct Pattern {
    source: String,
    literal: bool,
    regex: Regex,
}

/// Configuration form of a [`Pattern`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawPattern {
    Literal(String),
    Regex { regex: String },
}

impl TryFrom<RawPattern> for Pattern {
    type Error = Error;

    fn try_from(raw: RawPattern) -> Result<Self> {
        match raw {
            RawPattern::Literal(text) => Self::literal(&text),
            RawPattern::Regex { regex } => Self::regex(&regex),
        }
    }
}

impl Pattern {
    /// Substring matcher.
    pub fn literal(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::Config("empty literal pattern".into()));
        }
        Ok(Self {
            source: trimmed.to_string(),
            literal: true,
            regex: compile(&regex::escape(trimmed))?,
        })
    }

    /// Regular-expression matcher.
    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(Self {
            source: pattern.to_string(),
            literal: false,
            regex: compile(pattern)?,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Byte offset just past the first match in `text`.
    pub fn match_end(&self, text: &str) -> Option<usize> {
        self.regex.find(text).map(|m| m.end())
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.literal {
            write!(f, "\"{}\"", self.source)
        } else {
            write!(f, "/{}/i", self.source)
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// True when any pattern in `patterns` matches `text`.
pub fn any_match(patterns: &[Pattern], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

/// Earliest match end among `patterns`, for the first pattern that matches.
pub fn first_match_end(patterns: &[Pattern], text: &str) -> Option<usize> {
    patterns.iter().find_map(|p| p.match_end(text))
}
