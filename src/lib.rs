//! `RateLens` - figures from positional document text
//!
//! # Features
//!
//! - **Line Reconstruction**: Clusters positioned text fragments into reading-order lines
//! - **Section Location**: Bounded start/end pattern search over reconstructed lines
//! - **Anchored Fields**: Label anchors, lookahead windows, plausibility-guarded column selection
//! - **Confidence Tiers**: Total and populated-field thresholds per source
//! - **Orchestration**: Concurrent sources, TTL cache, reference-data fallback
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ratelens::{Config, DefaultFetcher, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fetcher = Arc::new(DefaultFetcher::new()?);
//!     let orchestrator = Orchestrator::init(Config::load(None)?, fetcher)?;
//!     let snapshot = orchestrator.get(false).await;
//!     println!("{}", serde_json::to_string_pretty(&*snapshot)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod layout;
pub mod orchestrator;
pub mod pattern;
pub mod source;

pub use config::{Config, ReferenceEntry, Settings, SourceConfig};
pub use error::{Error, Result};
pub use extract::{
    Confidence, ExtractedField, ExtractionResult, FieldRule, Origin, Pipeline, RuleSet,
};
pub use fetch::{DefaultFetcher, DocumentFetcher, DocumentLocation};
pub use layout::{reconstruct_lines, Line, LineReconstructor, Section, SectionLocator, Token};
pub use orchestrator::{Orchestrator, Snapshot, SourceReport, SourceStatus};
pub use pattern::Pattern;
pub use source::{DocumentFormat, TokenSource};

/// Version of ratelens
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
