//! HTML rate tables flattened to tokens.
//!
//! Banks publish rate and fee tables as HTML. Every `<tr>` becomes one
//! synthetic row: cell `i` of row `r` is placed at `x = i * CELL_PITCH`,
//! `y = -(r * ROW_PITCH)`, so line reconstruction rebuilds exactly one line
//! per table row, in document order.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::TokenSource;
use crate::error::{Error, Result};
use crate::layout::Token;

/// Horizontal spacing between cells.
pub const CELL_PITCH: f64 = 100.0;
/// Vertical spacing between rows; well above any sensible line tolerance.
pub const ROW_PITCH: f64 = 10.0;

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("table tr").expect("row selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").expect("cell selector"));

/// Flattens `<table>` rows into positioned tokens.
pub struct HtmlTableSource;

impl TokenSource for HtmlTableSource {
    fn name(&self) -> &'static str {
        "html"
    }

    fn tokens(&self, bytes: &[u8]) -> Result<Vec<Token>> {
        let html = std::str::from_utf8(bytes)
            .map_err(|e| Error::Html(format!("document is not valid UTF-8: {e}")))?;
        Ok(table_tokens(html))
    }
}

/// Tokens for every table cell in `html`.
pub fn table_tokens(html: &str) -> Vec<Token> {
    let document = Html::parse_document(html);
    let mut tokens = Vec::new();

    for (row_idx, row) in document.select(&ROW).enumerate() {
        let y = -(row_idx as f64 * ROW_PITCH);
        for (col_idx, cell) in row.select(&CELL).enumerate() {
            let text = cell.text().collect::<Vec<_>>().join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                continue;
            }
            tokens.push(Token::new(text, col_idx as f64 * CELL_PITCH, y, 0));
        }
    }

    tracing::debug!("Flattened HTML tables into {} tokens", tokens.len());
    tokens
}
