//! Word tokenizer used for phrase mining.
//!
//! Produces lowercase, punctuation-stripped word tokens in reading order.
//! URLs are dropped before splitting so link fragments never become phrases.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

#[allow(clippy::unwrap_used)]
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").unwrap());

#[allow(clippy::unwrap_used)]
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+(?:['’][\p{L}\p{N}]+)*").unwrap());

/// Token list for a single message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedMessage {
    /// Lowercase tokens in reading order
    pub tokens: Vec<String>,
}

/// Lowercasing word tokenizer with no external state
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTokenizer;

impl SimpleTokenizer {
    /// Create a tokenizer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Tokenize a single text. Missing text yields an empty token list.
    #[must_use]
    pub fn tokenize(&self, text: Option<&str>) -> Vec<String> {
        let Some(text) = text else {
            return Vec::new();
        };
        if text.trim().is_empty() {
            return Vec::new();
        }

        let normalized = text.nfc().collect::<String>().to_lowercase();
        let without_urls = URL_RE.replace_all(&normalized, " ");

        WORD_RE
            .find_iter(&without_urls)
            .map(|m| m.as_str().replace('’', "'"))
            .collect()
    }

    /// Tokenize a batch of texts, one entry per input (possibly empty)
    #[must_use]
    pub fn tokenize_messages<S: AsRef<str>>(&self, texts: &[S]) -> Vec<TokenizedMessage> {
        texts
            .iter()
            .map(|text| TokenizedMessage {
                tokens: self.tokenize(Some(text.as_ref())),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_strips_punctuation() {
        let tokenizer = SimpleTokenizer::new();
        assert_eq!(
            tokenizer.tokenize(Some("On my WAY, home... now!!")),
            vec!["on", "my", "way", "home", "now"]
        );
    }

    #[test]
    fn test_tokenize_keeps_contractions() {
        let tokenizer = SimpleTokenizer::new();
        assert_eq!(
            tokenizer.tokenize(Some("I can’t wait, don't stop")),
            vec!["i", "can't", "wait", "don't", "stop"]
        );
    }

    #[test]
    fn test_tokenize_drops_urls() {
        let tokenizer = SimpleTokenizer::new();
        assert_eq!(
            tokenizer.tokenize(Some("look https://example.com/a-b here")),
            vec!["look", "here"]
        );
    }

    #[test]
    fn test_tokenize_empty_and_missing() {
        let tokenizer = SimpleTokenizer::new();
        assert!(tokenizer.tokenize(None).is_empty());
        assert!(tokenizer.tokenize(Some("   ")).is_empty());
        assert!(tokenizer.tokenize(Some("?!... 😂")).is_empty());
    }

    #[test]
    fn test_tokenize_composes_but_keeps_compatibility_forms() {
        let tokenizer = SimpleTokenizer::new();
        assert_eq!(
            tokenizer.tokenize(Some("Cafe\u{301} time")),
            vec!["caf\u{e9}", "time"]
        );
        // The "fi" ligature is not folded
        assert_eq!(tokenizer.tokenize(Some("\u{fb01}ne")), vec!["\u{fb01}ne"]);
    }

    #[test]
    fn test_tokenize_messages_preserves_alignment() {
        let tokenizer = SimpleTokenizer::new();
        let batch = tokenizer.tokenize_messages(&["hi there", "", "ok"]);
        assert_eq!(batch.len(), 3);
        assert!(batch[1].tokens.is_empty());
        assert_eq!(batch[2].tokens, vec!["ok"]);
    }
}
