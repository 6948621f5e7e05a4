//! Line reconstruction from positioned text tokens.
//!
//! Token sources emit fragments in whatever order the document's text layer
//! stores them. This module rebuilds logical rows:
//!
//! ```text
//! tokens → group by page → cluster by y → sort by x → join → order top-to-bottom
//! ```
//!
//! The result is deterministic for a given token list, which keeps extraction
//! reproducible and lets documents be diffed over time.

pub mod section;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use section::{Section, SectionLocator};

/// Default vertical tolerance, in document coordinate units.
pub const DEFAULT_LINE_TOLERANCE: f64 = 3.0;

/// A positioned text fragment from a document's text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Left edge.
    pub x: f64,
    /// Baseline (bottom-up coordinate system, larger is higher on the page).
    pub y: f64,
    /// Page index (0-based).
    #[serde(default)]
    pub page: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, x: f64, y: f64, page: usize) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            page,
        }
    }
}

/// A reconstructed row of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub page: usize,
    /// Representative y: the first token seen for this row.
    pub y: f64,
    /// Tokens in ascending x order.
    pub tokens: Vec<Token>,
    /// Token texts joined by single spaces.
    pub text: String,
}

/// Clusters tokens into [`Line`]s.
#[derive(Debug, Clone, Copy)]
pub struct LineReconstructor {
    tolerance: f64,
}

/// Working state for one row while tokens are being assigned.
struct Cluster {
    y: f64,
    min_y: f64,
    max_y: f64,
    tokens: Vec<Token>,
}

impl Cluster {
    fn new(token: Token) -> Self {
        Self {
            y: token.y,
            min_y: token.y,
            max_y: token.y,
            tokens: vec![token],
        }
    }

    /// A token fits when the row's whole y-span, including it, stays within
    /// tolerance. This keeps any two tokens of a row within `tolerance`.
    fn accepts(&self, y: f64, tolerance: f64) -> bool {
        self.max_y.max(y) - self.min_y.min(y) <= tolerance
    }

    fn push(&mut self, token: Token) {
        self.min_y = self.min_y.min(token.y);
        self.max_y = self.max_y.max(token.y);
        self.tokens.push(token);
    }

    fn into_line(mut self, page: usize) -> Line {
        // Stable sort: tokens sharing an x keep their input order.
        self.tokens.sort_by(|a, b| a.x.total_cmp(&b.x));
        let text = join_tokens(&self.tokens);
        Line {
            page,
            y: self.y,
            tokens: self.tokens,
            text,
        }
    }
}

impl LineReconstructor {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Rebuild ordered lines from the tokens of one document.
    ///
    /// 1. Drop tokens whose text is empty or whitespace.
    /// 2. Group by page, pages in ascending order.
    /// 3. Within a page, assign each token (input order) to the first existing
    ///    row that accepts it, else open a new row.
    /// 4. Sort each row by x and join the texts.
    /// 5. Order rows by y descending; rows with equal y keep creation order.
    pub fn reconstruct(&self, tokens: &[Token]) -> Vec<Line> {
        let mut pages: BTreeMap<usize, Vec<&Token>> = BTreeMap::new();
        for token in tokens.iter().filter(|t| !t.text.trim().is_empty()) {
            pages.entry(token.page).or_default().push(token);
        }

        let mut lines = Vec::new();
        for (page, page_tokens) in pages {
            let mut clusters: Vec<Cluster> = Vec::new();

            for token in page_tokens {
                match clusters
                    .iter_mut()
                    .find(|c| c.accepts(token.y, self.tolerance))
                {
                    Some(cluster) => cluster.push(token.clone()),
                    None => clusters.push(Cluster::new(token.clone())),
                }
            }

            clusters.sort_by(|a, b| b.y.total_cmp(&a.y));
            lines.extend(clusters.into_iter().map(|c| c.into_line(page)));
        }

        tracing::debug!(
            "Reconstructed {} lines from {} tokens (tolerance {})",
            lines.len(),
            tokens.len(),
            self.tolerance
        );

        lines
    }
}

impl Default for LineReconstructor {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_TOLERANCE)
    }
}

/// Join token texts with single spaces, collapsing inner whitespace runs.
fn join_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .flat_map(|t| t.text.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reconstruct lines with the default tolerance.
pub fn reconstruct_lines(tokens: &[Token]) -> Vec<Line> {
    LineReconstructor::default().reconstruct(tokens)
}
