//! Pre-extracted tokens stored as JSON.

use super::TokenSource;
use crate::error::Result;
use crate::layout::Token;

/// Reads a JSON array of `{ "text", "x", "y", "page" }` objects.
pub struct JsonTokenSource;

impl TokenSource for JsonTokenSource {
    fn name(&self) -> &'static str {
        "tokens"
    }

    fn tokens(&self, bytes: &[u8]) -> Result<Vec<Token>> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn parses_token_array() {
        let json = br#"[
            {"text": "Housing loans", "x": 10, "y": 500.5, "page": 0},
            {"text": "66,148", "x": 200.0, "y": 500}
        ]"#;
        let tokens = JsonTokenSource.tokens(json).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], Token::new("Housing loans", 10.0, 500.5, 0));
        assert_eq!(tokens[1].page, 0);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = JsonTokenSource.tokens(b"{not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
