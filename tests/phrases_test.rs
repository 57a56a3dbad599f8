//! Integration tests for phrase extraction

use std::collections::{BTreeMap, HashMap};

use imessage_wrapped_rust::error::WrappedError;
use imessage_wrapped_rust::phrases::{PhraseExtractionConfig, PhraseExtractor};
use imessage_wrapped_rust::scoring::ScoringMethod;
use imessage_wrapped_rust::stopwords;
use proptest::prelude::*;

fn small_config() -> PhraseExtractionConfig {
    PhraseExtractionConfig::builder()
        .ngram_range(2, 4)
        .min_occurrences(2)
        .min_characters(3)
        .min_text_messages(1)
        .per_contact_min_text_messages(Some(1))
        .max_phrases(10)
        .build()
        .unwrap()
}

#[test]
fn test_invalid_configs_fail_fast() {
    let cases = [
        PhraseExtractionConfig::builder().ngram_range(4, 3).build(),
        PhraseExtractionConfig::builder().ngram_range(0, 3).build(),
        PhraseExtractionConfig::builder().max_phrases(0).build(),
    ];
    for case in cases {
        assert!(matches!(case, Err(WrappedError::InvalidConfig(_))));
    }
}

#[test]
fn test_longer_phrase_absorbs_shorter() {
    let config = PhraseExtractionConfig::builder()
        .ngram_range(3, 4)
        .min_occurrences(2)
        .min_text_messages(1)
        .build()
        .unwrap();
    let extractor = PhraseExtractor::new(config);
    let texts = [
        "on my way home",
        "on my way home",
        "on my way home",
    ];
    let result = extractor.extract(&texts, None, None);

    let phrases: Vec<&str> = result.overall.iter().map(|p| p.text.as_str()).collect();
    assert!(phrases.contains(&"on my way home"));
    assert!(!phrases.contains(&"on my way"));
}

#[test]
fn test_undersized_input_is_empty_not_error() {
    let extractor = PhraseExtractor::new(PhraseExtractionConfig::default());
    let result = extractor.extract(&["just one message here"], None, None);
    assert!(result.overall.is_empty());
    assert_eq!(result.analyzed_messages, 1);
}

#[test]
fn test_per_contact_breakdown_uses_names() {
    let extractor = PhraseExtractor::new(small_config());
    let mut per_contact = BTreeMap::new();
    per_contact.insert(
        "+1555".to_string(),
        vec!["see you soon".to_string(), "see you soon friend".to_string()],
    );
    per_contact.insert("+1666".to_string(), vec!["nothing repeats".to_string()]);
    let names = HashMap::from([("+1555".to_string(), "Sam".to_string())]);

    let all: Vec<String> = per_contact.values().flatten().cloned().collect();
    let result = extractor.extract(&all, Some(&per_contact), Some(&names));

    assert_eq!(result.by_contact.len(), 1);
    assert_eq!(result.by_contact[0].contact_name.as_deref(), Some("Sam"));
    assert_eq!(result.by_contact[0].top_phrases[0].text, "see you soon");
}

#[test]
fn test_custom_stopwords_are_injected() {
    let extractor = PhraseExtractor::with_stopwords(
        small_config(),
        stopwords::from_words(["pizza", "night"]),
    );
    let result = extractor.extract(&["pizza night", "pizza night"], None, None);
    assert!(result.overall.is_empty());
}

#[test]
fn test_tfidf_scoring_is_deterministic() {
    let config = PhraseExtractionConfig::builder()
        .ngram_range(2, 3)
        .min_occurrences(2)
        .min_text_messages(1)
        .scoring(ScoringMethod::Tfidf)
        .build()
        .unwrap();
    let extractor = PhraseExtractor::new(config);
    let texts = ["good night love", "good night love", "happy birthday mom", "happy birthday mom"];
    assert_eq!(
        extractor.extract(&texts, None, None),
        extractor.extract(&texts, None, None)
    );
}

fn corpus() -> impl Strategy<Value = Vec<String>> {
    let words = prop::sample::select(vec![
        "on", "my", "way", "home", "see", "you", "soon", "love", "pizza", "tonight", "lol",
    ]);
    prop::collection::vec(prop::collection::vec(words, 1..8).prop_map(|w| w.join(" ")), 0..25)
}

/// At most six messages of four words: no more than 18 phrases can reach two
/// occurrences, so 4-decimal rounding drifts the share total by under 1e-3.
fn short_corpus() -> impl Strategy<Value = Vec<String>> {
    let words = prop::sample::select(vec![
        "on", "my", "way", "home", "see", "you", "soon", "love", "pizza", "tonight", "lol",
    ]);
    prop::collection::vec(prop::collection::vec(words, 1..5).prop_map(|w| w.join(" ")), 0..7)
}

fn exhaustive_config() -> PhraseExtractionConfig {
    PhraseExtractionConfig::builder()
        .ngram_range(2, 4)
        .min_occurrences(2)
        .min_characters(3)
        .min_text_messages(1)
        .dedupe_overlap(false)
        .max_phrases(1_000)
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_extraction_is_deterministic(texts in corpus()) {
        let extractor = PhraseExtractor::new(small_config());
        let first = extractor.extract(&texts, None, None);
        let second = extractor.extract(&texts, None, None);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_shares_are_bounded(texts in corpus()) {
        let extractor = PhraseExtractor::new(small_config());
        let result = extractor.extract(&texts, None, None);
        let total: f64 = result.overall.iter().map(|p| p.share).sum();
        prop_assert!(total <= 1.0 + 1e-3);
        for phrase in &result.overall {
            prop_assert!(phrase.occurrences >= 2);
            prop_assert!(phrase.share > 0.0);
        }
    }

    #[test]
    fn prop_shares_sum_to_one_without_dedupe(texts in short_corpus()) {
        let extractor = PhraseExtractor::new(exhaustive_config());
        let result = extractor.extract(&texts, None, None);
        if !result.overall.is_empty() {
            let total: f64 = result.overall.iter().map(|p| p.share).sum();
            prop_assert!((total - 1.0).abs() < 1e-3, "shares summed to {}", total);
        }
    }
}
