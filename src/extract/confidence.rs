//! Confidence scoring and result assembly.
//!
//! Confidence comes from two signals: how many sub-fields were populated with
//! a non-zero value, and the magnitude of the designated total field.
//!
//! | Tier | Condition |
//! |------|-----------|
//! | `high` | total ≥ `high.min_total` and sub-fields ≥ `high.min_fields` |
//! | `medium` | total ≥ `medium.min_total` and sub-fields ≥ `medium.min_fields` |
//! | `low` | otherwise |
//!
//! A document without its total yields no result at all.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::result::{Confidence, ExtractedField, ExtractionResult, Origin};

/// Thresholds for one confidence tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Tier {
    pub min_total: f64,
    pub min_fields: usize,
}

/// Per-source confidence thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfidencePolicy {
    /// Label of the mandatory total field.
    pub total_field: String,
    pub high: Tier,
    pub medium: Tier,
}

impl ConfidencePolicy {
    pub fn new(total_field: impl Into<String>, high: Tier, medium: Tier) -> Self {
        Self {
            total_field: total_field.into(),
            high,
            medium,
        }
    }

    /// Count of non-total fields with a non-zero value.
    pub fn populated_sub_fields(&self, fields: &BTreeMap<String, Option<ExtractedField>>) -> usize {
        fields
            .iter()
            .filter(|(label, _)| **label != self.total_field)
            .filter_map(|(_, field)| field.as_ref())
            .filter(|field| field.value != 0.0)
            .count()
    }

    /// Score a field map. `None` when the total field is absent.
    pub fn score(&self, fields: &BTreeMap<String, Option<ExtractedField>>) -> Option<Confidence> {
        let total = fields.get(&self.total_field)?.as_ref()?.value;
        let sub_fields = self.populated_sub_fields(fields);

        let confidence = if total >= self.high.min_total && sub_fields >= self.high.min_fields {
            Confidence::High
        } else if total >= self.medium.min_total && sub_fields >= self.medium.min_fields {
            Confidence::Medium
        } else {
            Confidence::Low
        };
        Some(confidence)
    }
}

/// Packages scored fields into an [`ExtractionResult`].
#[derive(Debug, Clone)]
pub struct ResultBuilder<'p> {
    policy: &'p ConfidencePolicy,
    entity_id: String,
    source_description: String,
}

impl<'p> ResultBuilder<'p> {
    pub fn new(
        policy: &'p ConfidencePolicy,
        entity_id: impl Into<String>,
        source_description: impl Into<String>,
    ) -> Self {
        Self {
            policy,
            entity_id: entity_id.into(),
            source_description: source_description.into(),
        }
    }

    /// Build the result, or `None` when the mandatory total is missing.
    pub fn build(
        &self,
        fields: BTreeMap<String, Option<ExtractedField>>,
        extracted_at: DateTime<Utc>,
    ) -> Option<ExtractionResult> {
        let Some(confidence) = self.policy.score(&fields) else {
            tracing::info!(
                "{}: total field '{}' not found, discarding partial result",
                self.entity_id,
                self.policy.total_field
            );
            return None;
        };

        Some(ExtractionResult {
            entity_id: self.entity_id.clone(),
            fields,
            confidence,
            extracted_at,
            source_description: self.source_description.clone(),
            origin: Origin::Live,
        })
    }
}
