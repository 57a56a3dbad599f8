//! Integration tests for configuration loading and validation

mod common;

use common::temp_file;
use imessage_wrapped_rust::config::{AppConfig, FiltersConfig, GhostsConfig, LoggingConfig};
use imessage_wrapped_rust::scoring::ScoringMethod;
use imessage_wrapped_rust::sentiment::sampling::SentimentInterval;
use imessage_wrapped_rust::sentiment::BackendKind;
use imessage_wrapped_rust::stopwords::StopwordSource;

#[test]
fn test_default_logging_config() {
    let config = LoggingConfig::default();
    assert_eq!(config.level, "info");
    assert_eq!(config.file_path, None);
    assert_eq!(config.format, "text");
}

#[test]
fn test_default_phrase_config_matches_extractor_defaults() {
    let config = AppConfig::default();
    let extraction = config.phrases.to_extraction_config().unwrap();

    assert_eq!(extraction.ngram_range(), (3, 6));
    assert_eq!(extraction.min_occurrences(), 3);
    assert_eq!(extraction.max_phrases(), 5);
    assert_eq!(extraction.scoring(), ScoringMethod::Frequency);
    assert_eq!(config.phrases.stopwords, StopwordSource::Bundled);
}

#[test]
fn test_default_sentiment_ghost_and_filter_config() {
    let config = AppConfig::default();
    assert!(config.sentiment.enabled);
    assert_eq!(config.sentiment.backend, BackendKind::Lexical);
    assert_eq!(config.sentiment.interval().unwrap(), SentimentInterval::Month);
    assert_eq!(config.sentiment.scatter_max_per_period, 25);
    assert_eq!(config.ghosts, GhostsConfig::default());
    assert_eq!(config.ghosts.to_ghost_config().unwrap().timeline().num_days(), 7);
    assert_eq!(config.filters, FiltersConfig::default());
}

#[test]
fn test_invalid_values_are_rejected() {
    let mut config = AppConfig::default();
    config.logging.level = "loud".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.logging.format = "xml".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.phrases.ngram_min = 7;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.sentiment.interval = "fortnight".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.sentiment.sample_rate = Some(1.5);
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.sentiment.scatter_max_per_period = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.ghosts.timeline_days = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.filters.max_received_ratio = -1.0;
    assert!(config.validate().is_err());
}

#[test]
fn test_load_from_yaml_file() {
    let file = temp_file(
        ".yaml",
        "phrases:\n  ngram_max: 4\n  scoring: tfidf\nsentiment:\n  interval: week\nghosts:\n  timeline_days: 30\n",
    );
    let config = AppConfig::load_from(Some(file.path())).unwrap();

    assert_eq!(config.phrases.ngram_max, 4);
    assert_eq!(config.phrases.scoring, ScoringMethod::Tfidf);
    assert_eq!(config.phrases.ngram_min, 3);
    assert_eq!(config.sentiment.interval().unwrap(), SentimentInterval::Week);
    assert_eq!(config.ghosts.timeline_days, 30);
}

#[test]
fn test_load_from_rejects_invalid_file_values() {
    let file = temp_file(".yaml", "ghosts:\n  timeline_days: -2\n");
    assert!(AppConfig::load_from(Some(file.path())).is_err());
}

#[test]
fn test_yaml_rendering_round_trips() {
    let config = AppConfig::default();
    let yaml = config.to_yaml().unwrap();
    assert!(yaml.contains("ngram_min: 3"));
    assert!(yaml.contains("timeline_days: 7"));

    let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, config);
}
