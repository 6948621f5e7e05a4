//! Integration tests for the orchestrator: independent sources, reference
//! fallback and the snapshot cache.
//!
//! Documents are served from memory so the tests need no network or files.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ratelens::fetch::{DocumentFetcher, DocumentLocation};
use ratelens::layout::Token;
use ratelens::{Config, Confidence, Error, Orchestrator, Origin, SourceStatus};

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Serves documents keyed by their location string and counts fetches.
#[derive(Default)]
struct MemoryFetcher {
    documents: HashMap<String, Vec<u8>>,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Option<Duration>,
}

impl MemoryFetcher {
    fn with(mut self, location: &str, tokens: &[Token]) -> Self {
        self.documents
            .insert(location.to_string(), serde_json::to_vec(tokens).unwrap());
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for MemoryFetcher {
    async fn fetch(&self, location: &DocumentLocation) -> ratelens::Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.documents
            .get(&location.to_string())
            .cloned()
            .ok_or_else(|| Error::Fetch(format!("{location}: 404 Not Found")))
    }
}

fn rows(rows: &[(&str, &str)]) -> Vec<Token> {
    rows.iter()
        .enumerate()
        .flat_map(|(i, (label, value))| {
            let y = 700.0 - i as f64 * 20.0;
            [Token::new(*label, 10.0, y, 0), Token::new(*value, 250.0, y, 0)]
        })
        .collect()
}

fn nab_document() -> Vec<Token> {
    rows(&[
        ("Loans and advances", "2024"),
        ("Housing loans", "380,214"),
        ("Personal loans", "12,507"),
        ("Total gross loans", "613,123"),
    ])
}

fn anz_document() -> Vec<Token> {
    // Total row missing.
    rows(&[("Loans and advances", "2024"), ("Housing loans", "301,422")])
}

fn source(id: &str) -> String {
    format!(
        r#"
[[sources]]
id = "{id}"
description = "{id} annual report"
document = {{ path = "mem/{id}.json" }}

[sources.section]
start = ["loans and advances"]

[[sources.fields]]
label = "housing"
anchors = ["housing loans"]
range = [300000, 450000]

[[sources.fields]]
label = "personal"
anchors = ["personal loans"]
range = [5000, 30000]

[[sources.fields]]
label = "total"
anchors = ["total gross loans"]
range = [500000, 900000]

[sources.confidence]
total_field = "total"
high = {{ min_total = 500000, min_fields = 2 }}
medium = {{ min_total = 100000, min_fields = 1 }}
"#
    )
}

fn config(settings: &str) -> Config {
    let toml = format!(
        r#"{settings}
{}{}{}
[[reference]]
entity_id = "westpac"
description = "Westpac 2023 annual report (static)"
confidence = "medium"
fields = {{ housing = 470000, total = 720000 }}
"#,
        source("nab"),
        source("westpac"),
        source("anz"),
    );
    Config::from_toml(&toml).unwrap()
}

fn fetcher() -> MemoryFetcher {
    MemoryFetcher::default()
        .with("mem/nab.json", &nab_document())
        .with("mem/anz.json", &anz_document())
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn one_failing_source_does_not_abort_the_others() {
    let orchestrator = Orchestrator::init(config(""), Arc::new(fetcher())).unwrap();
    let snapshot = orchestrator.get(false).await;

    assert_eq!(snapshot.reports.len(), 3);
    let ids: Vec<_> = snapshot.reports.iter().map(|r| r.source_id.as_str()).collect();
    assert_eq!(ids, vec!["nab", "westpac", "anz"]);

    let nab = snapshot.report("nab").unwrap();
    assert_eq!(nab.status, SourceStatus::Live);
    assert!(nab.error.is_none());
    let result = nab.result.as_ref().unwrap();
    assert_eq!(result.origin, Origin::Live);
    assert_eq!(result.value("total"), Some(613_123.0));
    assert_eq!(result.confidence, Confidence::High);
}

#[tokio::test]
async fn failed_source_uses_tagged_reference_data() {
    let orchestrator = Orchestrator::init(config(""), Arc::new(fetcher())).unwrap();
    let snapshot = orchestrator.get(false).await;

    let westpac = snapshot.report("westpac").unwrap();
    assert_eq!(westpac.status, SourceStatus::Fallback);
    assert!(westpac.error.as_deref().unwrap().contains("404"));

    let result = westpac.result.as_ref().unwrap();
    assert!(result.is_fallback());
    assert_eq!(result.confidence, Confidence::Medium);
    assert_eq!(result.value("housing"), Some(470_000.0));
    assert_eq!(result.value("personal"), None);
    assert!(result.fields.contains_key("personal"));
    assert_eq!(result.source_description, "Westpac 2023 annual report (static)");
}

#[tokio::test]
async fn missing_total_without_reference_is_unavailable() {
    let orchestrator = Orchestrator::init(config(""), Arc::new(fetcher())).unwrap();
    let snapshot = orchestrator.get(false).await;

    let anz = snapshot.report("anz").unwrap();
    assert_eq!(anz.status, SourceStatus::Unavailable);
    assert!(anz.result.is_none());
    assert!(anz.error.as_deref().unwrap().contains("total"));
    assert_eq!(snapshot.count(SourceStatus::Unavailable), 1);
}

#[tokio::test]
async fn snapshot_serializes_with_status_tags() {
    let orchestrator = Orchestrator::init(config(""), Arc::new(fetcher())).unwrap();
    let snapshot = orchestrator.get(false).await;
    let json = serde_json::to_value(&*snapshot).unwrap();

    assert_eq!(json["reports"][0]["status"], "live");
    assert_eq!(json["reports"][1]["status"], "fallback");
    assert_eq!(json["reports"][1]["result"]["origin"], "fallback");
    assert!(json["reports"][0].get("error").is_none());
}

// ─── Cache ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_cache_is_reused() {
    let fetcher = Arc::new(fetcher());
    let orchestrator = Orchestrator::init(config(""), fetcher.clone()).unwrap();

    let first = orchestrator.get(false).await;
    let second = orchestrator.get(false).await;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(fetcher.fetch_count(), 3);
}

#[tokio::test]
async fn force_refresh_bypasses_cache() {
    let fetcher = Arc::new(fetcher());
    let orchestrator = Orchestrator::init(config(""), fetcher.clone()).unwrap();

    let first = orchestrator.get(false).await;
    let second = orchestrator.get(true).await;
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(fetcher.fetch_count(), 6);

    let cached = orchestrator.cached().await.unwrap();
    assert!(Arc::ptr_eq(&cached.data, &second));
}

#[tokio::test]
async fn zero_ttl_refreshes_every_time() {
    let fetcher = Arc::new(fetcher());
    let orchestrator =
        Orchestrator::init(config("[settings]\ncache_ttl_secs = 0"), fetcher.clone()).unwrap();

    orchestrator.get(false).await;
    orchestrator.get(false).await;
    assert_eq!(fetcher.fetch_count(), 6);
}

#[tokio::test]
async fn invalidate_clears_cache() {
    let fetcher = Arc::new(fetcher());
    let orchestrator = Orchestrator::init(config(""), fetcher.clone()).unwrap();

    orchestrator.get(false).await;
    assert!(orchestrator.cached().await.is_some());

    orchestrator.invalidate().await;
    assert!(orchestrator.cached().await.is_none());

    orchestrator.get(false).await;
    assert_eq!(fetcher.fetch_count(), 6);
}

// ─── Single source & concurrency ─────────────────────────────────────────────

#[tokio::test]
async fn run_source_skips_cache_and_fallback() {
    let fetcher = Arc::new(fetcher());
    let orchestrator = Orchestrator::init(config(""), fetcher.clone()).unwrap();

    let nab = orchestrator.run_source("nab").await.unwrap().unwrap();
    assert_eq!(nab.value("housing"), Some(380_214.0));
    assert!(orchestrator.cached().await.is_none());

    assert!(orchestrator.run_source("anz").await.unwrap().is_none());
    assert!(matches!(
        orchestrator.run_source("westpac").await,
        Err(Error::Fetch(_))
    ));
    assert!(matches!(
        orchestrator.run_source("cba").await,
        Err(Error::UnknownSource(_))
    ));
}

#[tokio::test]
async fn sequential_by_default() {
    let fetcher = Arc::new(fetcher().with_delay(Duration::from_millis(20)));
    let orchestrator = Orchestrator::init(config(""), fetcher.clone()).unwrap();

    orchestrator.get(false).await;
    assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn bounded_concurrency() {
    let fetcher = Arc::new(fetcher().with_delay(Duration::from_millis(20)));
    let orchestrator =
        Orchestrator::init(config("[settings]\nmax_concurrency = 2"), fetcher.clone()).unwrap();

    let snapshot = orchestrator.get(false).await;
    assert_eq!(snapshot.reports.len(), 3);
    let max = fetcher.max_in_flight.load(Ordering::SeqCst);
    assert!((1..=2).contains(&max), "max in flight: {max}");
}

#[test]
fn init_rejects_invalid_config() {
    let mut config = config("");
    config.settings.max_concurrency = 0;
    assert!(Orchestrator::init(config, Arc::new(MemoryFetcher::default())).is_err());
}
