//! Declarative field rules.
//!
//! A [`FieldRule`] describes how one labeled figure is found and validated.
//! Rules are configuration data: each bank's report becomes a list of rules,
//! not a code path.

use std::fmt;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::pattern::Pattern;

/// Default number of lines scanned after an anchor line.
pub const DEFAULT_LOOKAHEAD: usize = 3;

/// Currency markers a number may be written against, as in `LKR361,002`.
pub const DEFAULT_CURRENCY_PREFIXES: &[&str] = &["AUD", "USD", "NZD", "LKR", "INR", "Rs"];

/// How to locate and validate one numeric field.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldRule {
    pub label: String,
    pub anchors: Vec<Pattern>,
    #[serde(default = "default_lookahead", alias = "lookahead_lines")]
    pub lookahead: usize,
    #[serde(default)]
    pub numeric: NumericPattern,
    #[serde(alias = "plausible_range")]
    pub range: PlausibleRange,
    #[serde(default)]
    pub column: ColumnSelector,
    #[serde(default = "default_currency_prefixes", alias = "currency")]
    pub currency_prefixes: Vec<String>,
}

fn default_lookahead() -> usize {
    DEFAULT_LOOKAHEAD
}

fn default_currency_prefixes() -> Vec<String> {
    DEFAULT_CURRENCY_PREFIXES
        .iter()
        .map(|p| (*p).to_string())
        .collect()
}

impl FieldRule {
    pub fn new(label: impl Into<String>, anchors: Vec<Pattern>, range: PlausibleRange) -> Self {
        Self {
            label: label.into(),
            anchors,
            lookahead: DEFAULT_LOOKAHEAD,
            numeric: NumericPattern::default(),
            range,
            column: ColumnSelector::default(),
            currency_prefixes: default_currency_prefixes(),
        }
    }

    #[must_use]
    pub fn with_column(mut self, column: ColumnSelector) -> Self {
        self.column = column;
        self
    }

    #[must_use]
    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }

    #[must_use]
    pub fn with_currency_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.currency_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_numeric(mut self, numeric: NumericPattern) -> Self {
        self.numeric = numeric;
        self
    }

    /// Check the rule is usable.
    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(Error::Config("field rule with empty label".into()));
        }
        if self.anchors.is_empty() {
            return Err(Error::Config(format!(
                "field '{}' has no anchor patterns",
                self.label
            )));
        }
        if self.range.min > self.range.max {
            return Err(Error::Config(format!(
                "field '{}' has inverted range {}",
                self.label, self.range
            )));
        }
        if let ColumnSelector::Nth(0) = self.column {
            return Err(Error::Config(format!(
                "field '{}': column nth is 1-based",
                self.label
            )));
        }
        Ok(())
    }
}

/// Inclusive magnitude bounds a value must fall in.
///
/// Written as `range = [min, max]` in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f64; 2]")]
pub struct PlausibleRange {
    pub min: f64,
    pub max: f64,
}

impl PlausibleRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Accepts any finite value.
    pub fn unbounded() -> Self {
        Self {
            min: f64::MIN,
            max: f64::MAX,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl From<[f64; 2]> for PlausibleRange {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl fmt::Display for PlausibleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Which in-range candidate of an anchor occurrence is the field's value.
///
/// `first`/`second` cover the usual "current period, prior period" column
/// pair; `nth` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSelector {
    #[default]
    First,
    Second,
    Nth(usize),
    Rightmost,
}

/// What counts as a numeric candidate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericPattern {
    /// Plain amounts: thousands separators, decimals, `(1,234)` and `-1,234`
    /// negatives. Percentages are skipped.
    #[default]
    Amount,
    /// Only values followed by `%`.
    Percent,
    /// Amounts and percentages.
    Any,
    /// A custom expression. A `value` capture group, if present, is the
    /// candidate text; otherwise the whole match is.
    Regex(#[serde(with = "serde_regex_str")] Regex),
}

mod serde_regex_str {
    use regex::Regex;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Regex, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Regex::new(&raw).map_err(serde::de::Error::custom)
    }
}
