//! Extraction orchestrator.
//!
//! Runs every configured source through fetch → token source → pipeline,
//! independently: one source failing never aborts the others. Sources that
//! fail or yield no result are filled from the static reference dataset and
//! tagged as fallback. The aggregate [`Snapshot`] is cached with a TTL.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ratelens::config::Config;
//! use ratelens::fetch::DefaultFetcher;
//! use ratelens::orchestrator::Orchestrator;
//!
//! # async fn example() -> ratelens::Result<()> {
//! let config = Config::load(None)?;
//! let orchestrator = Orchestrator::init(config, Arc::new(DefaultFetcher::new()?))?;
//! let snapshot = orchestrator.get(false).await;
//! println!("{} sources live", snapshot.count(ratelens::orchestrator::SourceStatus::Live));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, Semaphore};
use tracing::{info, instrument, warn};

use crate::config::{Config, ReferenceEntry, Settings, SourceConfig};
use crate::error::{Error, Result};
use crate::extract::{ExtractionResult, Pipeline};
use crate::fetch::DocumentFetcher;

/// How a source's entry in the snapshot was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    /// Extracted from the live document.
    Live,
    /// Live extraction failed; reference data used.
    Fallback,
    /// Live extraction failed and no reference data exists.
    Unavailable,
}

/// Outcome for one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReport {
    pub source_id: String,
    pub status: SourceStatus,
    pub result: Option<ExtractionResult>,
    /// Why live extraction did not produce a result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate of all sources from one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub reports: Vec<SourceReport>,
}

impl Snapshot {
    pub fn report(&self, source_id: &str) -> Option<&SourceReport> {
        self.reports.iter().find(|r| r.source_id == source_id)
    }

    pub fn count(&self, status: SourceStatus) -> usize {
        self.reports.iter().filter(|r| r.status == status).count()
    }
}

/// A cached snapshot with its expiry.
#[derive(Debug, Clone)]
pub struct CachedSnapshot {
    pub data: Arc<Snapshot>,
    pub timestamp: DateTime<Utc>,
    pub ttl: Duration,
}

impl CachedSnapshot {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.timestamp) < self.ttl
    }
}

/// Coordinates extraction across all configured sources.
pub struct Orchestrator {
    sources: Vec<Arc<SourceConfig>>,
    reference: Vec<ReferenceEntry>,
    settings: Settings,
    fetcher: Arc<dyn DocumentFetcher>,
    cache: RwLock<Option<CachedSnapshot>>,
}

impl Orchestrator {
    /// Validate the configuration and build an orchestrator with an empty cache.
    pub fn init(config: Config, fetcher: Arc<dyn DocumentFetcher>) -> Result<Self> {
        config.validate()?;
        info!(
            "Orchestrator ready: {} sources, {} reference entries",
            config.sources.len(),
            config.reference.len()
        );
        Ok(Self {
            sources: config.sources.into_iter().map(Arc::new).collect(),
            reference: config.reference,
            settings: config.settings,
            fetcher,
            cache: RwLock::new(None),
        })
    }

    fn ttl(&self) -> Duration {
        i64::try_from(self.settings.cache_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    /// Return the cached snapshot, refreshing when stale or when forced.
    pub async fn get(&self, force_refresh: bool) -> Arc<Snapshot> {
        if !force_refresh {
            if let Some(cached) = self.cache.read().await.as_ref() {
                if cached.is_fresh(Utc::now()) {
                    return Arc::clone(&cached.data);
                }
            }
        }

        // Holding the write lock serializes concurrent refreshes.
        let mut cache = self.cache.write().await;
        if !force_refresh {
            if let Some(cached) = cache.as_ref() {
                if cached.is_fresh(Utc::now()) {
                    return Arc::clone(&cached.data);
                }
            }
        }

        let snapshot = Arc::new(self.collect().await);
        *cache = Some(CachedSnapshot {
            data: Arc::clone(&snapshot),
            timestamp: snapshot.generated_at,
            ttl: self.ttl(),
        });
        snapshot
    }

    /// Drop the cached snapshot.
    pub async fn invalidate(&self) {
        self.cache.write().await.take();
    }

    /// The cache entry, if any.
    pub async fn cached(&self) -> Option<CachedSnapshot> {
        self.cache.read().await.clone()
    }

    /// Run a single source without touching the cache or the fallback data.
    pub async fn run_source(&self, id: &str) -> Result<Option<ExtractionResult>> {
        let source = self
            .sources
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::UnknownSource(id.to_string()))?;
        self.extract_source(source).await
    }

    /// Run every source, at most `max_concurrency` at a time.
    async fn collect(&self) -> Snapshot {
        let semaphore = Semaphore::new(self.settings.max_concurrency.max(1));
        info!(
            "Extracting {} sources (concurrency: {})",
            self.sources.len(),
            self.settings.max_concurrency
        );

        let tasks = self.sources.iter().map(|source| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore.acquire().await.ok();
                (source, self.extract_source(source).await)
            }
        });
        let outcomes = futures::future::join_all(tasks).await;

        let reports: Vec<SourceReport> = outcomes
            .into_iter()
            .map(|(source, outcome)| self.report(source, outcome))
            .collect();

        let snapshot = Snapshot {
            generated_at: Utc::now(),
            reports,
        };
        info!(
            "Snapshot: {} live, {} fallback, {} unavailable",
            snapshot.count(SourceStatus::Live),
            snapshot.count(SourceStatus::Fallback),
            snapshot.count(SourceStatus::Unavailable)
        );
        snapshot
    }

    /// Turn a live outcome into a report, applying reference fallback.
    fn report(
        &self,
        source: &SourceConfig,
        outcome: Result<Option<ExtractionResult>>,
    ) -> SourceReport {
        let error = match outcome {
            Ok(Some(result)) => {
                return SourceReport {
                    source_id: source.id.clone(),
                    status: SourceStatus::Live,
                    result: Some(result),
                    error: None,
                };
            }
            Ok(None) => format!(
                "mandatory field '{}' not found",
                source.rules.confidence.total_field
            ),
            Err(e) => e.to_string(),
        };

        match self.reference.iter().find(|r| r.entity_id == source.id) {
            Some(entry) => {
                warn!("{}: {error}; using reference data", source.id);
                let labels: Vec<String> =
                    source.rules.fields.iter().map(|f| f.label.clone()).collect();
                SourceReport {
                    source_id: source.id.clone(),
                    status: SourceStatus::Fallback,
                    result: Some(entry.to_result(&labels)),
                    error: Some(error),
                }
            }
            None => {
                warn!("{}: {error}; no reference data", source.id);
                SourceReport {
                    source_id: source.id.clone(),
                    status: SourceStatus::Unavailable,
                    result: None,
                    error: Some(error),
                }
            }
        }
    }

    #[instrument(skip(self, source), fields(source = %source.id))]
    async fn extract_source(&self, source: &Arc<SourceConfig>) -> Result<Option<ExtractionResult>> {
        let bytes = self.fetcher.fetch(&source.document).await?;

        let source = Arc::clone(source);
        let settings = self.settings.clone();
        let result =
            tokio::task::spawn_blocking(move || extract_document(&source, &settings, &bytes))
                .await
                .map_err(|e| Error::Task(e.to_string()))??;

        match &result {
            Some(r) => info!(
                "Extracted {}/{} fields ({})",
                r.populated(),
                r.fields.len(),
                r.confidence
            ),
            None => info!("No result"),
        }
        Ok(result)
    }
}

/// Run one source's rules over already-fetched document bytes.
pub fn extract_document(
    source: &SourceConfig,
    settings: &Settings,
    bytes: &[u8],
) -> Result<Option<ExtractionResult>> {
    let tokens = source.format().source()?.tokens(bytes)?;
    Pipeline::new(&source.rules)
        .with_tolerance(settings.line_tolerance)
        .with_whole_document_fallback(settings.scan_whole_document_on_miss)
        .run(&source.id, &source.description(), &tokens)
}
