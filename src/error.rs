//! Crate error type.
//!
//! Only document-level failures are errors. Soft outcomes of the pipeline
//! (section not found, field absent, total missing) are ordinary values.

use thiserror::Error;

/// Extraction and configuration errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("document contains no text tokens")]
    NoTokens,

    #[error("HTML error: {0}")]
    Html(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("unsupported document location: {0}")]
    UnsupportedLocation(String),

    #[error("unknown source: {0}")]
    UnknownSource(String),

    #[error("extraction task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, Error>;
