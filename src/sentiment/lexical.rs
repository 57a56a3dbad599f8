//! Rule-based lexicon sentiment scorer.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::lexicon::{BOOSTER_WORDS, LEXICON, NEGATIONS};
use super::{BackendKind, ModelInfo, SentimentAnalyzer, SentimentLabel, SentimentResult};
use crate::utils::round_to;

#[allow(clippy::unwrap_used)]
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9']+").unwrap());

const SENTIMENT_THRESHOLD: f64 = 0.12;
const NORMALIZER: f64 = 3.5;
const MAX_EXCLAMATION_EMPHASIS: usize = 4;
const EXCLAMATION_STEP: f64 = 0.02;
const NEGATION_WINDOW: u8 = 2;
const NEGATION_FACTOR: f64 = -0.75;
const CAPS_BONUS: f64 = 0.15;

/// Lexicon scorer with negation, booster and emphasis rules
#[derive(Debug, Clone, Default)]
pub struct LexicalSentimentAnalyzer {
    custom_lexicon: Option<HashMap<String, f64>>,
}

impl LexicalSentimentAnalyzer {
    /// Scorer using the built-in lexicon
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scorer using a caller-supplied lexicon (keys are lowercased)
    #[must_use]
    pub fn with_lexicon(lexicon: HashMap<String, f64>) -> Self {
        Self {
            custom_lexicon: Some(
                lexicon
                    .into_iter()
                    .map(|(k, v)| (k.to_lowercase(), v))
                    .collect(),
            ),
        }
    }

    fn valence(&self, token: &str) -> Option<f64> {
        match &self.custom_lexicon {
            Some(custom) => custom.get(token).copied(),
            None => LEXICON.get(token).copied(),
        }
    }

    fn label_for(score: f64) -> SentimentLabel {
        if score >= SENTIMENT_THRESHOLD {
            SentimentLabel::Positive
        } else if score <= -SENTIMENT_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

fn is_all_caps(token: &str) -> bool {
    token.chars().any(char::is_alphabetic) && !token.chars().any(char::is_lowercase)
}

impl SentimentAnalyzer for LexicalSentimentAnalyzer {
    fn analyze(&self, text: Option<&str>) -> SentimentResult {
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return SentimentResult::neutral();
        };

        let mut total = 0.0;
        let mut hits = 0_usize;
        let mut negate_window = 0_u8;
        let mut previous: Option<String> = None;

        for m in WORD_RE.find_iter(text) {
            let token = m.as_str();
            let lower = token.to_lowercase();

            if NEGATIONS.contains(lower.as_str()) {
                negate_window = NEGATION_WINDOW;
                previous = Some(lower);
                continue;
            }

            let mut modifier = 1.0;
            if let Some(boost) = previous
                .as_deref()
                .and_then(|p| BOOSTER_WORDS.get(p))
            {
                modifier += boost;
            }

            let Some(valence) = self.valence(&lower) else {
                previous = Some(lower);
                negate_window = negate_window.saturating_sub(1);
                continue;
            };

            if negate_window > 0 {
                modifier *= NEGATION_FACTOR;
                negate_window -= 1;
            }
            if token.chars().count() > 1 && is_all_caps(token) {
                modifier += CAPS_BONUS;
            }

            total += valence * modifier;
            hits += 1;
            previous = Some(lower);
        }

        if hits == 0 {
            return SentimentResult::neutral();
        }

        let mut normalized = (total / (hits as f64 * NORMALIZER)).clamp(-1.0, 1.0);
        let exclamations = text.matches('!').count().min(MAX_EXCLAMATION_EMPHASIS);
        if exclamations > 0 && normalized != 0.0 {
            normalized += (exclamations as f64 * EXCLAMATION_STEP).copysign(normalized);
        }
        let normalized = normalized.clamp(-1.0, 1.0);

        SentimentResult {
            score: round_to(normalized, 3),
            label: Self::label_for(normalized),
        }
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Lexical
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: "lexical".to_string(),
            backend: BackendKind::Lexical,
            max_length: None,
            sample_rate: 1.0,
            embedding_sample_rate: None,
            axis_seeds: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(text: &str) -> SentimentResult {
        LexicalSentimentAnalyzer::new().analyze(Some(text))
    }

    #[test]
    fn test_positive_message() {
        let result = score("I love you so much!");
        assert_eq!(result.label, SentimentLabel::Positive);
        assert!(result.score > 0.12);
    }

    #[test]
    fn test_empty_and_missing_are_neutral() {
        let analyzer = LexicalSentimentAnalyzer::new();
        assert_eq!(analyzer.analyze(Some("")), SentimentResult::neutral());
        assert_eq!(analyzer.analyze(None), SentimentResult::neutral());
        assert_eq!(analyzer.analyze(Some("the table")), SentimentResult::neutral());
    }

    #[test]
    fn test_negation_lowers_score() {
        assert!(score("not good").score < score("good").score);
        assert_eq!(score("not good").label, SentimentLabel::Negative);
    }

    #[test]
    fn test_negation_window_expires() {
        // Two unscored tokens consume the window.
        assert!((score("not at all good").score - score("good").score).abs() < 1e-9);
    }

    #[test]
    fn test_booster_and_caps() {
        assert!(score("very good").score > score("good").score);
        assert!(score("GOOD").score > score("good").score);
    }

    #[test]
    fn test_exclamation_emphasis_is_capped() {
        let base = score("good").score;
        assert!((score("good!!").score - (base + 0.04)).abs() < 1e-9);
        assert!((score("good!!!!!!!!").score - (base + 0.08)).abs() < 1e-9);
        assert!(score("bad!!").score < score("bad").score);
    }

    #[test]
    fn test_custom_lexicon() {
        let mut lexicon = HashMap::new();
        lexicon.insert("Sunny".to_string(), 3.5);
        let analyzer = LexicalSentimentAnalyzer::with_lexicon(lexicon);
        let result = analyzer.analyze(Some("sunny"));
        assert!((result.score - 1.0).abs() < 1e-9);
        assert_eq!(analyzer.analyze(Some("love")), SentimentResult::neutral());
    }
}
