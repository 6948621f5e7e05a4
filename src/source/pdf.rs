//! PDF text layer via `pdfium-render` (Chromium's PDF library).
//!
//! Characters are read with their bounding rectangles and grouped into word
//! tokens: consecutive characters on the same baseline with no visible gap.
//! Line reconstruction then works on words, not characters.
//!
//! Scanned PDFs (no text layer) produce no tokens; OCR is out of scope.

use pdfium_render::prelude::*;

use super::TokenSource;
use crate::error::{Error, Result};
use crate::layout::Token;

/// A positioned character from a PDF page.
#[derive(Debug, Clone)]
pub struct PdfChar {
    pub ch: char,
    /// Left edge in PDF points (1pt = 1/72 inch).
    pub x: f64,
    /// Bottom edge (bottom-up coordinate system).
    pub y: f64,
    pub width: f64,
    /// Glyph height, a font size approximation.
    pub height: f64,
    /// Page index (0-based).
    pub page: usize,
}

/// Reads word tokens from a PDF's text layer.
pub struct PdfTokenSource {
    /// Fraction of the average glyph width that still counts as "no gap".
    gap_ratio: f64,
}

impl PdfTokenSource {
    pub fn new() -> Self {
        Self { gap_ratio: 0.3 }
    }

    /// Extract all characters with their bounding rectangles.
    #[allow(deprecated)] // PdfRect field access deprecated in 0.8.28, removed in 0.9.0
    fn extract_chars(bytes: &[u8]) -> Result<Vec<PdfChar>> {
        let pdfium = Pdfium::default();
        let doc = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| Error::Pdf(format!("failed to parse PDF: {e}")))?;
        let mut chars = Vec::new();

        for (page_idx, page) in doc.pages().iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| Error::Pdf(format!("failed to read text of page {page_idx}: {e}")))?;
            for ch in text.chars().iter() {
                if let (Some(unicode_ch), Ok(rect)) = (ch.unicode_char(), ch.tight_bounds()) {
                    chars.push(PdfChar {
                        ch: unicode_ch,
                        x: f64::from(rect.left.value),
                        y: f64::from(rect.bottom.value),
                        width: f64::from((rect.right.value - rect.left.value).abs()),
                        height: f64::from((rect.top.value - rect.bottom.value).abs()),
                        page: page_idx,
                    });
                }
            }
        }

        Ok(chars)
    }

    /// Group characters into word tokens, in text-layer order.
    fn group_words(&self, chars: &[PdfChar]) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut word: Vec<&PdfChar> = Vec::new();

        for ch in chars {
            if ch.ch.is_whitespace() {
                flush_word(&mut word, &mut tokens);
                continue;
            }
            if let Some(last) = word.last() {
                let same_baseline = ch.page == last.page
                    && (ch.y - last.y).abs() < last.height.max(ch.height) * 0.4;
                let avg_width = (ch.width + last.width) / 2.0;
                let gap = ch.x - (last.x + last.width);
                if !same_baseline || gap > avg_width * self.gap_ratio || gap < -avg_width {
                    flush_word(&mut word, &mut tokens);
                }
            }
            word.push(ch);
        }
        flush_word(&mut word, &mut tokens);

        tokens
    }
}

impl Default for PdfTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

fn flush_word(word: &mut Vec<&PdfChar>, tokens: &mut Vec<Token>) {
    if let Some(first) = word.first() {
        let text: String = word.iter().map(|c| c.ch).collect();
        tokens.push(Token::new(text, first.x, first.y, first.page));
    }
    word.clear();
}

impl TokenSource for PdfTokenSource {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn tokens(&self, bytes: &[u8]) -> Result<Vec<Token>> {
        let chars = Self::extract_chars(bytes)?;
        let tokens = self.group_words(&chars);
        tracing::debug!("PDF text layer: {} chars, {} word tokens", chars.len(), tokens.len());
        Ok(tokens)
    }
}
