//! Anchor field scanner.
//!
//! For every line matching one of a rule's anchors, the scanner opens a window
//! of that line plus up to `lookahead` following lines and collects numeric
//! candidates from it. The window closes early at the next anchor line so one
//! field's numbers do not bleed into the next field.

use super::numeric::{scan_candidates, select, Candidate};
use super::result::ExtractedField;
use super::rules::FieldRule;
use crate::layout::Section;
use crate::pattern::{first_match_end, Pattern};

/// Candidates collected for one anchor occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorMatch {
    /// Document line index of the anchor line.
    pub line: usize,
    pub candidates: Vec<Candidate>,
}

/// Scans a section for one field.
#[derive(Debug, Clone)]
pub struct FieldScanner<'r> {
    rule: &'r FieldRule,
    stops: Vec<&'r Pattern>,
}

impl<'r> FieldScanner<'r> {
    /// Scanner whose windows stop only at the rule's own anchors.
    pub fn new(rule: &'r FieldRule) -> Self {
        Self {
            rule,
            stops: rule.anchors.iter().collect(),
        }
    }

    /// Scanner whose windows also stop at any of `stops`, typically the
    /// anchors of every field in the same rule set.
    pub fn with_stops(rule: &'r FieldRule, stops: impl IntoIterator<Item = &'r Pattern>) -> Self {
        let mut scanner = Self::new(rule);
        scanner.stops.extend(stops);
        scanner
    }

    pub fn rule(&self) -> &FieldRule {
        self.rule
    }

    fn is_stop(&self, text: &str) -> bool {
        self.stops.iter().any(|p| p.is_match(text))
    }

    /// Collect candidates for every anchor occurrence in the section.
    ///
    /// On the anchor line only text after the anchor match is scanned, so
    /// digits inside the label itself are not candidates.
    pub fn occurrences(&self, section: &Section<'_>) -> Vec<AnchorMatch> {
        let lines = section.lines;
        let mut matches = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let Some(anchor_end) = first_match_end(&self.rule.anchors, &line.text) else {
                continue;
            };

            let mut candidates = Vec::new();
            let anchor_line = section.start_index + i;
            scan_candidates(
                &line.text[anchor_end..],
                anchor_line,
                &self.rule.numeric,
                &self.rule.currency_prefixes,
                &mut candidates,
            );

            let window_end = lines.len().min(i + 1 + self.rule.lookahead);
            for (j, next) in lines.iter().enumerate().take(window_end).skip(i + 1) {
                if self.is_stop(&next.text) {
                    break;
                }
                scan_candidates(
                    &next.text,
                    section.start_index + j,
                    &self.rule.numeric,
                    &self.rule.currency_prefixes,
                    &mut candidates,
                );
            }

            matches.push(AnchorMatch {
                line: anchor_line,
                candidates,
            });
        }

        matches
    }

    /// Extract the field: the first anchor occurrence whose candidates satisfy
    /// the rule's range and column selector wins.
    ///
    /// Returns `None` when no occurrence yields a value; that is an expected
    /// outcome, not an error.
    pub fn extract(&self, section: &Section<'_>) -> Option<ExtractedField> {
        let occurrences = self.occurrences(section);
        if occurrences.is_empty() {
            tracing::debug!("Field '{}': no anchor found", self.rule.label);
            return None;
        }

        for occurrence in &occurrences {
            if occurrence.candidates.is_empty() {
                tracing::debug!(
                    "Field '{}': anchor at line {} has no numeric candidates",
                    self.rule.label,
                    occurrence.line
                );
                continue;
            }

            if let Some(selection) =
                select(&occurrence.candidates, self.rule.range, self.rule.column)
            {
                tracing::debug!(
                    "Field '{}' = {} (raw '{}', line {})",
                    self.rule.label,
                    selection.value,
                    selection.candidate.raw,
                    selection.candidate.line
                );
                return Some(ExtractedField {
                    label: self.rule.label.clone(),
                    raw_text: selection.candidate.raw.clone(),
                    value: selection.value,
                    source_line: selection.candidate.line,
                });
            }

            tracing::debug!(
                "Field '{}': {} candidates at line {} outside {} or short of {:?}",
                self.rule.label,
                occurrence.candidates.len(),
                occurrence.line,
                self.rule.range,
                self.rule.column
            );
        }

        None
    }
}
