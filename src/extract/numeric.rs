//! Numeric candidates and range-guarded disambiguation.
//!
//! A line near an anchor usually carries several numbers: the current and
//! prior period, a note reference, sometimes a page number. Candidates are
//! collected in reading order, normalized, and the configured column is picked
//! among those inside the field's plausible range.

use once_cell::sync::Lazy;
use regex::Regex;

use super::rules::{ColumnSelector, NumericPattern, PlausibleRange};

/// Amounts with optional thousands separators, decimals, sign, parentheses
/// and percent suffix. The `%` may sit inside or outside the parentheses.
static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(?[-−]?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?(?:\s?%)?\)?(?:\s?%)?")
        .expect("numeric candidate regex is valid")
});

/// A raw numeric string found near an anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Matched text, e.g. `"(1,234)"` or `"4.5%"`.
    pub raw: String,
    /// Index of the originating line in the document.
    pub line: usize,
}

/// A candidate chosen by [`select`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    pub candidate: &'a Candidate,
    pub value: f64,
}

/// Append all candidates in `text` (left to right) to `out`.
///
/// A number directly after one of `prefixes` (a currency marker such as
/// `LKR` or `Rs`) is kept even though it touches a word.
pub fn scan_candidates(
    text: &str,
    line: usize,
    pattern: &NumericPattern,
    prefixes: &[String],
    out: &mut Vec<Candidate>,
) {
    match pattern {
        NumericPattern::Regex(re) => {
            for caps in re.captures_iter(text) {
                if let Some(m) = caps.name("value").or_else(|| caps.get(0)) {
                    out.push(Candidate {
                        raw: m.as_str().to_string(),
                        line,
                    });
                }
            }
        }
        _ => {
            for m in NUMBER.find_iter(text) {
                if glued_to_word(&text[..m.start()], prefixes) {
                    continue;
                }
                let raw = m.as_str();
                let is_percent = raw.contains('%');
                let wanted = match pattern {
                    NumericPattern::Amount => !is_percent,
                    NumericPattern::Percent => is_percent,
                    _ => true,
                };
                if wanted {
                    out.push(Candidate {
                        raw: raw.to_string(),
                        line,
                    });
                }
            }
        }
    }
}

/// True when a number after `before` continues a word, as in `Q4` or
/// `FY2024`, or continues another number, as in `1.2.3`.
fn glued_to_word(before: &str, prefixes: &[String]) -> bool {
    if prefixes.iter().any(|p| ends_with_word(before, p)) {
        return false;
    }
    let mut rev = before.chars().rev();
    match rev.next() {
        Some('.') => rev.next().is_some_and(|c| c.is_ascii_digit()),
        Some(c) => c.is_alphanumeric() || c == ',',
        None => false,
    }
}

/// `text` ends with `word`, and `word` does not start mid-word.
fn ends_with_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    text.strip_suffix(word)
        .is_some_and(|head| !head.chars().next_back().is_some_and(char::is_alphanumeric))
}

/// Normalize a candidate to a number.
///
/// Thousands separators, whitespace and `%` are stripped. A value wrapped in
/// parentheses, as in `(1,234)` or `(1.5%)`, or led by a minus sign is
/// negated.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && *c != '%' && !c.is_whitespace())
        .collect();
    let mut s = cleaned.as_str();

    let mut negative = false;
    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        negative = true;
        s = inner;
    }
    s = s.trim_matches(|c| c == '(' || c == ')');

    if let Some(rest) = s.strip_prefix('-').or_else(|| s.strip_prefix('−')) {
        negative = !negative;
        s = rest;
    }

    let value: f64 = s.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Pick the configured column among the in-range candidates.
///
/// Out-of-range and unparseable candidates are skipped. Returns `None` when
/// the selector cannot be satisfied.
pub fn select<'a>(
    candidates: &'a [Candidate],
    range: PlausibleRange,
    column: ColumnSelector,
) -> Option<Selection<'a>> {
    let mut in_range = candidates.iter().filter_map(|candidate| {
        parse_number(&candidate.raw)
            .filter(|v| range.contains(*v))
            .map(|value| Selection { candidate, value })
    });

    match column {
        ColumnSelector::First => in_range.next(),
        ColumnSelector::Second => in_range.nth(1),
        ColumnSelector::Nth(0) => None,
        ColumnSelector::Nth(n) => in_range.nth(n - 1),
        ColumnSelector::Rightmost => in_range.last(),
    }
}
