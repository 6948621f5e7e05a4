//! Field extraction from reconstructed lines.
//!
//! # Architecture
//!
//! - [`FieldRule`]: declarative description of one labeled figure
//! - [`FieldScanner`]: anchor search and candidate windows
//! - [`numeric`]: candidate normalization and range-guarded column selection
//! - [`ConfidencePolicy`] / [`ResultBuilder`]: tiers and result assembly
//! - [`Pipeline`]: runs a [`RuleSet`] over one document
//!
//! # Example
//!
//! ```rust
//! use ratelens::extract::{ConfidencePolicy, FieldRule, Pipeline, PlausibleRange, RuleSet, Tier};
//! use ratelens::layout::Token;
//! use ratelens::pattern::Pattern;
//!
//! let rules = RuleSet::new(
//!     None,
//!     vec![FieldRule::new(
//!         "total",
//!         vec![Pattern::literal("total loans").unwrap()],
//!         PlausibleRange::new(1_000.0, 1_000_000.0),
//!     )],
//!     ConfidencePolicy::new(
//!         "total",
//!         Tier { min_total: 500_000.0, min_fields: 4 },
//!         Tier { min_total: 100_000.0, min_fields: 3 },
//!     ),
//! );
//!
//! let tokens = vec![
//!     Token::new("Total loans", 10.0, 500.0, 0),
//!     Token::new("120,500", 200.0, 500.0, 0),
//! ];
//! let result = Pipeline::new(&rules).run("nab", "Annual report", &tokens).unwrap();
//! assert_eq!(result.unwrap().value("total"), Some(120_500.0));
//! ```

pub mod confidence;
pub mod numeric;
pub mod pipeline;
pub mod result;
pub mod rules;
pub mod scanner;

pub use confidence::{ConfidencePolicy, ResultBuilder, Tier};
pub use numeric::{parse_number, select, Candidate};
pub use pipeline::{Pipeline, RuleSet};
pub use result::{Confidence, ExtractedField, ExtractionResult, Origin};
pub use rules::{ColumnSelector, FieldRule, NumericPattern, PlausibleRange};
pub use scanner::{AnchorMatch, FieldScanner};
