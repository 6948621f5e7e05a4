//! Single-document extraction: tokens in, [`ExtractionResult`] out.
//!
//! ```text
//! tokens → lines → section → per-field scan + disambiguation → confidence → result
//! ```
//!
//! The pipeline is synchronous, pure and deterministic for a given token list
//! and rule set; only the timestamp differs between runs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::confidence::{ConfidencePolicy, ResultBuilder};
use super::result::{ExtractedField, ExtractionResult};
use super::rules::FieldRule;
use super::scanner::FieldScanner;
use crate::error::{Error, Result};
use crate::layout::{Line, LineReconstructor, Section, SectionLocator, Token};
use crate::pattern::Pattern;

/// Everything needed to extract one kind of document.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSet {
    /// Region of the document holding the fields. Without it the whole
    /// document is scanned.
    #[serde(default)]
    pub section: Option<SectionLocator>,
    pub fields: Vec<FieldRule>,
    pub confidence: ConfidencePolicy,
}

impl RuleSet {
    pub fn new(
        section: Option<SectionLocator>,
        fields: Vec<FieldRule>,
        confidence: ConfidencePolicy,
    ) -> Self {
        Self {
            section,
            fields,
            confidence,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(Error::Config("rule set has no fields".into()));
        }
        for (i, rule) in self.fields.iter().enumerate() {
            rule.validate()?;
            if self.fields[..i].iter().any(|r| r.label == rule.label) {
                return Err(Error::Config(format!("duplicate field label '{}'", rule.label)));
            }
        }
        if !self.fields.iter().any(|r| r.label == self.confidence.total_field) {
            return Err(Error::Config(format!(
                "total field '{}' is not a declared field",
                self.confidence.total_field
            )));
        }
        if let Some(section) = &self.section {
            if section.start.is_empty() {
                return Err(Error::Config("section has no start patterns".into()));
            }
            if section.max_lines == 0 {
                return Err(Error::Config("section max_lines must be at least 1".into()));
            }
        }
        Ok(())
    }

    /// Anchors of every field, used to close scan windows.
    fn all_anchors(&self) -> impl Iterator<Item = &Pattern> {
        self.fields.iter().flat_map(|r| r.anchors.iter())
    }
}

/// Runs a [`RuleSet`] over documents.
#[derive(Debug, Clone)]
pub struct Pipeline<'r> {
    rules: &'r RuleSet,
    reconstructor: LineReconstructor,
    scan_whole_document_on_miss: bool,
}

impl<'r> Pipeline<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            reconstructor: LineReconstructor::default(),
            scan_whole_document_on_miss: true,
        }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.reconstructor = LineReconstructor::new(tolerance);
        self
    }

    /// Whether a missing section falls back to scanning the whole document.
    #[must_use]
    pub fn with_whole_document_fallback(mut self, enabled: bool) -> Self {
        self.scan_whole_document_on_miss = enabled;
        self
    }

    pub fn lines(&self, tokens: &[Token]) -> Vec<Line> {
        self.reconstructor.reconstruct(tokens)
    }

    /// The span the fields are searched in.
    pub fn section<'a>(&self, lines: &'a [Line]) -> Section<'a> {
        let Some(locator) = &self.rules.section else {
            return Section::whole(lines);
        };
        let section = locator.locate(lines);
        if section.is_empty() && self.scan_whole_document_on_miss {
            tracing::debug!("Section not found, scanning whole document");
            return Section::whole(lines);
        }
        section
    }

    /// Extract every configured field from reconstructed lines.
    pub fn extract_fields(&self, lines: &[Line]) -> BTreeMap<String, Option<ExtractedField>> {
        let section = self.section(lines);
        self.rules
            .fields
            .iter()
            .map(|rule| {
                let scanner = FieldScanner::with_stops(rule, self.rules.all_anchors());
                (rule.label.clone(), scanner.extract(&section))
            })
            .collect()
    }

    /// Run the pipeline on one document's tokens.
    ///
    /// Returns `Ok(None)` when the mandatory total is missing and
    /// [`Error::NoTokens`] when the document has no text at all.
    pub fn run(
        &self,
        entity_id: &str,
        source_description: &str,
        tokens: &[Token],
    ) -> Result<Option<ExtractionResult>> {
        self.run_at(entity_id, source_description, tokens, Utc::now())
    }

    /// [`Pipeline::run`] with an explicit timestamp.
    pub fn run_at(
        &self,
        entity_id: &str,
        source_description: &str,
        tokens: &[Token],
        extracted_at: DateTime<Utc>,
    ) -> Result<Option<ExtractionResult>> {
        let lines = self.lines(tokens);
        if lines.is_empty() {
            return Err(Error::NoTokens);
        }

        let fields = self.extract_fields(&lines);
        let found = fields.values().filter(|f| f.is_some()).count();
        tracing::debug!(
            "{entity_id}: {found}/{} fields from {} lines",
            fields.len(),
            lines.len()
        );

        Ok(ResultBuilder::new(&self.rules.confidence, entity_id, source_description)
            .build(fields, extracted_at))
    }
}
