//! Document acquisition.
//!
//! Fetching sits outside the extraction engine: the orchestrator asks a
//! [`DocumentFetcher`] for bytes and hands them to a token source. Timeouts
//! and transport errors live here.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};

/// Where a source's document lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DocumentLocation {
    Path { path: PathBuf },
    Url { url: String },
}

impl fmt::Display for DocumentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path { path } => write!(f, "{}", path.display()),
            Self::Url { url } => f.write_str(url),
        }
    }
}

/// Retrieves raw document bytes.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, location: &DocumentLocation) -> Result<Vec<u8>>;
}

/// Reads local files with `tokio::fs` and downloads `http(s)` URLs.
pub struct DefaultFetcher {
    client: Client,
}

impl DefaultFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("ratelens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Fetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    #[instrument(skip(self))]
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::UnsupportedLocation(url.to_string()));
        }

        debug!("Downloading document");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::Fetch(format!("{url}: {e}")))?;

        info!(status = %response.status(), "Response received");

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("{url}: failed to read body: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl DocumentFetcher for DefaultFetcher {
    async fn fetch(&self, location: &DocumentLocation) -> Result<Vec<u8>> {
        match location {
            DocumentLocation::Path { path } => {
                debug!("Reading {}", path.display());
                Ok(tokio::fs::read(path).await?)
            }
            DocumentLocation::Url { url } => self.download(url).await,
        }
    }
}
