use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, WrappedError};
use crate::ghost::GhostConfig;
use crate::phrases::PhraseExtractionConfig;
use crate::scoring::ScoringMethod;
use crate::sentiment::{BackendKind, SentimentInterval, SentimentSettings};
use crate::stopwords::StopwordSource;

/// Application configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub phrases: PhrasesConfig,
    pub sentiment: SentimentConfig,
    pub ghosts: GhostsConfig,
    pub filters: FiltersConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhrasesConfig {
    pub ngram_min: usize,
    pub ngram_max: usize,
    pub min_occurrences: usize,
    pub min_characters: usize,
    pub min_text_messages: usize,
    pub per_contact_min_text_messages: Option<usize>,
    pub max_phrases: usize,
    pub per_contact_limit: usize,
    pub scoring: ScoringMethod,
    pub dedupe_overlap: bool,
    pub overlap_tolerance: f64,
    pub length_bias: f64,
    pub stopwords: StopwordSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub enabled: bool,
    pub backend: BackendKind,
    pub model_dir: Option<PathBuf>,
    pub interval: String,
    pub sample_rate: Option<f64>,
    pub neutral_margin: f64,
    pub max_length: usize,
    pub scatter_max_per_period: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhostsConfig {
    pub timeline_days: i64,
    pub include_group_chats: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    pub max_received_ratio: f64,
    pub min_sent_messages: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            format: "text".to_string(),
        }
    }
}

impl Default for PhrasesConfig {
    fn default() -> Self {
        let defaults = PhraseExtractionConfig::default();
        let (ngram_min, ngram_max) = defaults.ngram_range();
        Self {
            ngram_min,
            ngram_max,
            min_occurrences: defaults.min_occurrences(),
            min_characters: defaults.min_characters(),
            min_text_messages: defaults.min_text_messages(),
            per_contact_min_text_messages: defaults.per_contact_min_text_messages(),
            max_phrases: defaults.max_phrases(),
            per_contact_limit: defaults.per_contact_limit(),
            scoring: defaults.scoring(),
            dedupe_overlap: defaults.dedupe_overlap(),
            overlap_tolerance: defaults.overlap_tolerance(),
            length_bias: defaults.length_bias(),
            stopwords: StopwordSource::Bundled,
        }
    }
}

impl Default for SentimentConfig {
    fn default() -> Self {
        let defaults = SentimentSettings::default();
        Self {
            enabled: true,
            backend: defaults.backend,
            model_dir: None,
            interval: SentimentInterval::Month.as_str().to_string(),
            sample_rate: None,
            neutral_margin: defaults.neutral_margin,
            max_length: defaults.max_length,
            scatter_max_per_period: 25,
        }
    }
}

impl Default for GhostsConfig {
    fn default() -> Self {
        Self {
            timeline_days: 7,
            include_group_chats: false,
        }
    }
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            max_received_ratio: 9.0,
            min_sent_messages: 2,
        }
    }
}

impl PhrasesConfig {
    /// Build the validated extractor configuration
    pub fn to_extraction_config(&self) -> Result<PhraseExtractionConfig> {
        PhraseExtractionConfig::builder()
            .ngram_range(self.ngram_min, self.ngram_max)
            .min_occurrences(self.min_occurrences)
            .min_characters(self.min_characters)
            .min_text_messages(self.min_text_messages)
            .per_contact_min_text_messages(self.per_contact_min_text_messages)
            .max_phrases(self.max_phrases)
            .per_contact_limit(self.per_contact_limit)
            .scoring(self.scoring)
            .dedupe_overlap(self.dedupe_overlap)
            .overlap_tolerance(self.overlap_tolerance)
            .length_bias(self.length_bias)
            .build()
    }
}

impl SentimentConfig {
    /// Parsed trend interval
    pub fn interval(&self) -> Result<SentimentInterval> {
        self.interval.parse()
    }

    /// Backend resolution inputs, before environment overrides
    #[must_use]
    pub fn to_settings(&self) -> SentimentSettings {
        SentimentSettings {
            backend: self.backend,
            model_dir: self.model_dir.clone(),
            sample_rate: self.sample_rate,
            neutral_margin: self.neutral_margin,
            max_length: self.max_length,
        }
    }
}

impl GhostsConfig {
    /// Validated ghost settings
    pub fn to_ghost_config(&self) -> Result<GhostConfig> {
        GhostConfig::from_days(self.timeline_days, self.include_group_chats)
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, optionally adding an explicit file with highest file precedence
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            // Start with default values
            .add_source(Config::try_from(&Self::default())?)
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("wrapped").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Add environment variables with prefix
        let config = builder
            .add_source(
                Environment::with_prefix("WRAPPED")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(WrappedError::InvalidConfig(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, valid_levels
            )));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(WrappedError::InvalidConfig(format!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format, valid_formats
            )));
        }

        // Validate phrase config
        self.phrases.to_extraction_config()?;

        // Validate sentiment config
        self.sentiment.interval()?;
        self.sentiment.to_settings().validate()?;
        if self.sentiment.scatter_max_per_period == 0 {
            return Err(WrappedError::InvalidConfig(
                "scatter_max_per_period must be greater than 0".to_string(),
            ));
        }

        // Validate ghost config
        self.ghosts.to_ghost_config()?;

        // Validate filter config
        if !self.filters.max_received_ratio.is_finite() || self.filters.max_received_ratio <= 0.0 {
            return Err(WrappedError::InvalidConfig(
                "max_received_ratio must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the effective configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}
