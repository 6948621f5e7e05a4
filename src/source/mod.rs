//! Token sources: document bytes to positioned text tokens.
//!
//! Each source implements [`TokenSource`]. The engine only needs coordinates
//! that are comparable within a page, so sources are free to synthesize them.
//!
//! # Supported Formats
//!
//! | Format | Source | Feature Flag |
//! |--------|--------|-------------|
//! | `tokens` (JSON array of `{text, x, y, page}`) | [`JsonTokenSource`] | always |
//! | `html` (table cells) | [`HtmlTableSource`] | always |
//! | `pdf` (text layer) | `PdfTokenSource` | `pdf` |
//!
//! # Example
//!
//! ```rust
//! use ratelens::source::{DocumentFormat, TokenSource};
//!
//! let html = b"<table><tr><td>Housing loans</td><td>66,148</td></tr></table>";
//! let tokens = DocumentFormat::Html.source().unwrap().tokens(html).unwrap();
//! assert_eq!(tokens.len(), 2);
//! ```

pub mod html;
pub mod json;
#[cfg(feature = "pdf")]
pub mod pdf;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::Token;

pub use html::HtmlTableSource;
pub use json::JsonTokenSource;

/// Turns raw document bytes into tokens.
///
/// Implementations are stateless and synchronous. The orchestrator runs them
/// inside `tokio::task::spawn_blocking`.
pub trait TokenSource: Send + Sync {
    /// Short name for logs (e.g., `"html"`).
    fn name(&self) -> &'static str;

    /// Extract tokens from the document bytes.
    fn tokens(&self, bytes: &[u8]) -> Result<Vec<Token>>;
}

/// Document formats a source can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Pre-extracted tokens as JSON.
    #[default]
    Tokens,
    Html,
    Pdf,
}

impl DocumentFormat {
    /// The token source for this format.
    ///
    /// PDF requires the `pdf` feature.
    pub fn source(self) -> Result<Box<dyn TokenSource>> {
        match self {
            Self::Tokens => Ok(Box::new(JsonTokenSource)),
            Self::Html => Ok(Box::new(HtmlTableSource)),
            #[cfg(feature = "pdf")]
            Self::Pdf => Ok(Box::new(pdf::PdfTokenSource::new())),
            #[cfg(not(feature = "pdf"))]
            Self::Pdf => Err(Error::Pdf(
                "PDF support not compiled in (enable the `pdf` feature)".into(),
            )),
        }
    }

    /// Guess the format from a file name.
    pub fn from_path(path: &str) -> Option<Self> {
        let lower = path.to_lowercase();
        if lower.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if lower.ends_with(".html") || lower.ends_with(".htm") {
            Some(Self::Html)
        } else if lower.ends_with(".json") {
            Some(Self::Tokens)
        } else {
            None
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Tokens => "tokens",
            Self::Html => "html",
            Self::Pdf => "pdf",
        })
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tokens" | "json" => Ok(Self::Tokens),
            "html" | "htm" => Ok(Self::Html),
            "pdf" => Ok(Self::Pdf),
            other => Err(Error::Config(format!("unknown document format '{other}'"))),
        }
    }
}
