//! Source and rule configuration loaded from `~/.config/ratelens/sources.toml`.
//!
//! Each bank report is a `[[sources]]` entry: where the document lives, which
//! section to search, the field rules and the confidence thresholds. The
//! static reference dataset used when live extraction fails sits alongside.
//!
//! ```toml
//! [settings]
//! cache_ttl_secs = 3600
//! max_concurrency = 2
//!
//! [[sources]]
//! id = "nab"
//! description = "NAB annual report, note 12"
//! document = { path = "reports/nab-2024.pdf" }
//!
//! [sources.section]
//! start = ["loans and advances"]
//! end = ["total equity"]
//!
//! [[sources.fields]]
//! label = "housing"
//! anchors = ["housing loans"]
//! range = [300000, 450000]
//!
//! [[sources.fields]]
//! label = "total"
//! anchors = ["total gross loans"]
//! range = [500000, 900000]
//!
//! [sources.confidence]
//! total_field = "total"
//! high = { min_total = 500000, min_fields = 4 }
//! medium = { min_total = 100000, min_fields = 3 }
//!
//! [[reference]]
//! entity_id = "nab"
//! description = "NAB 2023 annual report (static)"
//! fields = { housing = 330000, total = 700000 }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::extract::{Confidence, ExtractedField, ExtractionResult, Origin, RuleSet};
use crate::fetch::DocumentLocation;
use crate::layout::DEFAULT_LINE_TOLERANCE;
use crate::source::DocumentFormat;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub reference: Vec<ReferenceEntry>,
}

/// Engine and orchestrator settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Vertical tolerance for line reconstruction.
    pub line_tolerance: f64,
    /// How long an aggregate snapshot stays fresh.
    pub cache_ttl_secs: u64,
    /// Sources processed at once; 1 runs them sequentially.
    pub max_concurrency: usize,
    /// Scan the whole document when a source's section is not found.
    pub scan_whole_document_on_miss: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            line_tolerance: DEFAULT_LINE_TOLERANCE,
            cache_ttl_secs: 3600,
            max_concurrency: 1,
            scan_whole_document_on_miss: true,
        }
    }
}

/// One bank report and the rules for reading it.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Entity short name; also keys the reference dataset.
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub document: DocumentLocation,
    /// Defaults to a guess from the document path, else `tokens`.
    #[serde(default)]
    pub format: Option<DocumentFormat>,
    #[serde(flatten)]
    pub rules: RuleSet,
}

impl SourceConfig {
    pub fn format(&self) -> DocumentFormat {
        self.format.unwrap_or_else(|| {
            let name = self.document.to_string();
            DocumentFormat::from_path(&name).unwrap_or_default()
        })
    }

    pub fn description(&self) -> String {
        if self.description.is_empty() {
            format!("{} ({})", self.id, self.document)
        } else {
            self.description.clone()
        }
    }
}

/// Static figures used when live extraction fails.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceEntry {
    pub entity_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: BTreeMap<String, f64>,
    #[serde(default)]
    pub confidence: Confidence,
    /// When the reference figures were compiled.
    #[serde(default)]
    pub as_of: Option<chrono::DateTime<chrono::Utc>>,
}

impl ReferenceEntry {
    /// Build a fallback result covering `labels`; labels missing from the
    /// reference data are absent.
    pub fn to_result(&self, labels: &[String]) -> ExtractionResult {
        let mut fields: BTreeMap<String, Option<ExtractedField>> =
            labels.iter().map(|l| (l.clone(), None)).collect();
        for (label, value) in &self.fields {
            fields.insert(
                label.clone(),
                Some(ExtractedField {
                    label: label.clone(),
                    raw_text: value.to_string(),
                    value: *value,
                    source_line: 0,
                }),
            );
        }

        let description = if self.description.is_empty() {
            format!("{} reference data", self.entity_id)
        } else {
            self.description.clone()
        };

        ExtractionResult {
            entity_id: self.entity_id.clone(),
            fields,
            confidence: self.confidence,
            extracted_at: self.as_of.unwrap_or_else(chrono::Utc::now),
            source_description: description,
            origin: Origin::Fallback,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing default file yields an empty configuration; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (config_path(), false),
        };
        if !explicit && !path.exists() {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(
            "Loaded {} sources and {} reference entries from {}",
            config.sources.len(),
            config.reference.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.settings;
        if !s.line_tolerance.is_finite() || s.line_tolerance < 0.0 {
            return Err(Error::Config(format!(
                "line_tolerance must be a non-negative number, got {}",
                s.line_tolerance
            )));
        }
        if s.max_concurrency == 0 {
            return Err(Error::Config("max_concurrency must be at least 1".into()));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.id.as_str()) {
                return Err(Error::Config(format!("duplicate source id '{}'", source.id)));
            }
            source
                .rules
                .validate()
                .map_err(|e| Error::Config(format!("source '{}': {e}", source.id)))?;
        }
        Ok(())
    }

    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn reference_for(&self, entity_id: &str) -> Option<&ReferenceEntry> {
        self.reference.iter().find(|r| r.entity_id == entity_id)
    }
}

/// Return the path to the default config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ratelens")
        .join("sources.toml")
}
