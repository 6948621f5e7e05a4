//! Section location by start/end keyword anchors.

use serde::Deserialize;

use super::Line;
use crate::pattern::{any_match, Pattern};

/// Upper bound on section length when no end keyword is found.
pub const DEFAULT_MAX_SECTION_LINES: usize = 200;

/// A contiguous run of document lines.
///
/// `start_index..end_index` indexes the document's line list (end exclusive).
/// An empty section means the start keyword was not found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section<'a> {
    pub start_index: usize,
    pub end_index: usize,
    pub lines: &'a [Line],
}

impl<'a> Section<'a> {
    pub fn empty() -> Self {
        Self {
            start_index: 0,
            end_index: 0,
            lines: &[],
        }
    }

    /// The whole document as one section.
    pub fn whole(lines: &'a [Line]) -> Self {
        Self {
            start_index: 0,
            end_index: lines.len(),
            lines,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Finds the span between a start keyword and an end keyword.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionLocator {
    pub start: Vec<Pattern>,
    #[serde(default)]
    pub end: Vec<Pattern>,
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
}

fn default_max_lines() -> usize {
    DEFAULT_MAX_SECTION_LINES
}

impl SectionLocator {
    pub fn new(start: Vec<Pattern>, end: Vec<Pattern>) -> Self {
        Self {
            start,
            end,
            max_lines: DEFAULT_MAX_SECTION_LINES,
        }
    }

    #[must_use]
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    /// Locate the section in `lines`.
    ///
    /// The first line matching a start pattern opens the section. Following
    /// lines are appended until one matches an end pattern (included), the
    /// section holds `max_lines` lines, or the document ends.
    pub fn locate<'a>(&self, lines: &'a [Line]) -> Section<'a> {
        let Some(start) = lines.iter().position(|l| any_match(&self.start, &l.text)) else {
            tracing::debug!("Section start not found ({} start patterns)", self.start.len());
            return Section::empty();
        };

        let limit = lines.len().min(start.saturating_add(self.max_lines));
        let mut end = start + 1;
        while end < limit {
            let closes = any_match(&self.end, &lines[end].text);
            end += 1;
            if closes {
                break;
            }
        }
        let end = end.min(limit);

        tracing::debug!("Section located at lines {}..{}", start, end);

        Section {
            start_index: start,
            end_index: end,
            lines: &lines[start..end],
        }
    }
}
