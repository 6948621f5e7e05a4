//! Typed extraction output.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One extracted figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub label: String,
    /// Candidate text as it appeared in the document.
    pub raw_text: String,
    /// Normalized value, in the document's own units.
    pub value: f64,
    /// Index of the line the value came from.
    pub source_line: usize,
}

/// Coarse quality label for a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// Where a result's figures came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Extracted from the source document on this run.
    #[default]
    Live,
    /// Taken from the static reference dataset after live extraction failed.
    Fallback,
}

/// Fields, confidence and provenance for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Short name of the entity, e.g. the bank.
    pub entity_id: String,
    /// Every configured label; absent fields are `None`.
    pub fields: BTreeMap<String, Option<ExtractedField>>,
    pub confidence: Confidence,
    pub extracted_at: DateTime<Utc>,
    pub source_description: String,
    #[serde(default)]
    pub origin: Origin,
}

impl ExtractionResult {
    pub fn value(&self, label: &str) -> Option<f64> {
        self.field(label).map(|f| f.value)
    }

    pub fn field(&self, label: &str) -> Option<&ExtractedField> {
        self.fields.get(label).and_then(Option::as_ref)
    }

    /// Number of labels with a value.
    pub fn populated(&self) -> usize {
        self.fields.values().filter(|f| f.is_some()).count()
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == Origin::Fallback
    }
}
