//! Sentiment scoring behind a capability interface.
//!
//! Every backend implements [`SentimentAnalyzer`]. Backends that can also
//! produce embeddings expose [`EmbeddingAnalyzer`] through
//! [`SentimentAnalyzer::as_embedding`]. [`SentimentEngine::resolve`] picks the
//! backend once, falling back from neural to lexical when the model cannot be
//! loaded, and keeps the reason so it can be reported with the statistics.

pub mod lexical;
pub mod lexicon;
pub mod neural;
pub mod sampling;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, WrappedError};

pub use lexical::LexicalSentimentAnalyzer;
pub use neural::NeuralSentimentAnalyzer;
pub use sampling::SentimentInterval;

/// Environment key selecting the backend
pub const ENV_BACKEND: &str = "IMESSAGE_WRAPPED_SENTIMENT_BACKEND";
/// Environment key pointing at the model bundle directory
pub const ENV_MODEL_DIR: &str = "IMESSAGE_WRAPPED_SENTIMENT_MODEL_DIR";
/// Environment key overriding the neural subsample rate
pub const ENV_SUBSAMPLE: &str = "IMESSAGE_WRAPPED_SENTIMENT_SUBSAMPLE";

/// Default subsample rate for the neural backend
pub const DEFAULT_NEURAL_SAMPLE_RATE: f64 = 0.25;

/// Categorical sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    /// Score at or above the positive threshold
    Positive,
    /// Score between thresholds
    Neutral,
    /// Score at or below the negative threshold
    Negative,
}

impl SentimentLabel {
    /// Lowercase label name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score in [-1, 1] plus its label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// Signed score
    pub score: f64,
    /// Label derived from the score
    pub label: SentimentLabel,
}

impl SentimentResult {
    /// The (0.0, neutral) result used for empty input
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Neutral,
        }
    }
}

/// Backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Rule-based lexicon scorer
    #[default]
    Lexical,
    /// Pretrained sequence classifier
    Neural,
}

impl BackendKind {
    /// Configuration name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lexical => "lexical",
            Self::Neural => "neural",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = WrappedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lexical" | "lexicon" => Ok(Self::Lexical),
            "neural" | "distilbert" | "onnx" => Ok(Self::Neural),
            other => Err(WrappedError::InvalidConfig(format!(
                "sentiment backend must be 'lexical' or 'neural', got '{other}'"
            ))),
        }
    }
}

/// Descriptive metadata about the active model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model or scorer name
    pub name: String,
    /// Backend family
    pub backend: BackendKind,
    /// Maximum input length in subword tokens (neural only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Rate at which messages are scored
    pub sample_rate: f64,
    /// Rate at which embeddings are extracted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_sample_rate: Option<f64>,
    /// Scatter axes as (id, seed phrase)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub axis_seeds: Vec<(String, String)>,
}

/// Reference axis for embedding projection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    /// Axis identifier (`AX1`, `AX2`)
    pub id: String,
    /// Seed phrase the axis vector was computed from
    pub seed: String,
}

/// Core sentiment capability
pub trait SentimentAnalyzer: Send + Sync {
    /// Score one text; missing or empty text yields (0.0, neutral)
    fn analyze(&self, text: Option<&str>) -> SentimentResult;

    /// Backend family
    fn backend(&self) -> BackendKind;

    /// Metadata for reporting
    fn model_info(&self) -> ModelInfo;

    /// Declared subsample rate in [0, 1]
    fn sample_rate(&self) -> f64 {
        1.0
    }

    /// Extended capability, when supported
    fn as_embedding(&self) -> Option<&dyn EmbeddingAnalyzer> {
        None
    }
}

/// Embedding extraction and 2D projection
pub trait EmbeddingAnalyzer: SentimentAnalyzer {
    /// Score one text and return its embedding, if one could be computed
    fn analyze_with_embedding(&self, text: Option<&str>) -> (SentimentResult, Option<Vec<f32>>);

    /// Project an embedding onto every reference axis
    fn project_embedding(&self, embedding: &[f32]) -> BTreeMap<String, f64>;

    /// Reference axes in id order
    fn axes(&self) -> Vec<Axis>;

    /// Rate at which embeddings are extracted
    fn embedding_sample_rate(&self) -> f64 {
        1.0
    }
}

/// Inputs for backend resolution
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentSettings {
    /// Requested backend
    pub backend: BackendKind,
    /// Directory holding `vocab.txt`, `config.json` and the weights
    pub model_dir: Option<PathBuf>,
    /// Override for the backend's declared sample rate
    pub sample_rate: Option<f64>,
    /// Margin below which neural scores are labeled neutral
    pub neutral_margin: f64,
    /// Maximum subword sequence length
    pub max_length: usize,
}

impl Default for SentimentSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Lexical,
            model_dir: None,
            sample_rate: None,
            neutral_margin: 0.1,
            max_length: 128,
        }
    }
}

impl SentimentSettings {
    /// Apply environment-style overrides read through `lookup`.
    ///
    /// An unknown backend name is ignored with a warning. An unparsable
    /// subsample value falls back to the neural default, and zero means
    /// every message is scored.
    #[must_use]
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_BACKEND) {
            match raw.parse::<BackendKind>() {
                Ok(kind) => self.backend = kind,
                Err(e) => warn!(value = %raw, error = %e, "Ignoring sentiment backend override"),
            }
        }
        if let Some(dir) = lookup(ENV_MODEL_DIR).filter(|d| !d.trim().is_empty()) {
            self.model_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = lookup(ENV_SUBSAMPLE) {
            self.sample_rate = Some(parse_subsample(&raw));
        }
        self
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn from_process_env(self) -> Self {
        self.with_env_lookup(|key| std::env::var(key).ok())
    }

    /// Validate numeric fields
    pub fn validate(&self) -> Result<()> {
        if let Some(rate) = self.sample_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(WrappedError::InvalidConfig(format!(
                    "sentiment sample_rate must be within [0, 1], got {rate}"
                )));
            }
        }
        if !(0.0..1.0).contains(&self.neutral_margin) {
            return Err(WrappedError::InvalidConfig(format!(
                "neutral_margin must be within [0, 1), got {}",
                self.neutral_margin
            )));
        }
        if self.max_length < 3 {
            return Err(WrappedError::InvalidConfig(
                "max_length must leave room for [CLS] and [SEP]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a subsample rate: clamp to [0, 1], garbage means the default, 0 means 1
#[must_use]
pub fn parse_subsample(raw: &str) -> f64 {
    let rate = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
        .unwrap_or(DEFAULT_NEURAL_SAMPLE_RATE)
        .clamp(0.0, 1.0);
    if rate > 0.0 {
        rate
    } else {
        1.0
    }
}

/// Which backend was asked for, which one runs, and why they differ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendReport {
    /// Backend named in configuration
    pub requested: BackendKind,
    /// Backend actually in use
    pub active: BackendKind,
    /// True when `active` differs from `requested`
    pub downgraded: bool,
    /// Why the requested backend could not be used
    pub downgrade_reason: Option<String>,
    /// Active model metadata
    pub model: ModelInfo,
}

/// Resolved sentiment backend
pub struct SentimentEngine {
    analyzer: Box<dyn SentimentAnalyzer>,
    report: BackendReport,
    sample_rate: f64,
}

impl fmt::Debug for SentimentEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentimentEngine")
            .field("report", &self.report)
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

impl SentimentEngine {
    /// Resolve the backend named in `settings`.
    ///
    /// A neural backend that fails to load is replaced by the lexical one;
    /// the failure is logged and carried in [`BackendReport`]. The subsample
    /// override only applies to the neural backend; the lexical scorer
    /// always sees every message.
    #[must_use]
    pub fn resolve(settings: &SentimentSettings) -> Self {
        let requested = settings.backend;
        match requested {
            BackendKind::Lexical => Self::with_analyzer(
                Box::new(LexicalSentimentAnalyzer::new()),
                requested,
                None,
                None,
            ),
            BackendKind::Neural => match NeuralSentimentAnalyzer::load(settings) {
                Ok(analyzer) => {
                    info!(model = %analyzer.model_info().name, "Neural sentiment backend loaded");
                    Self::with_analyzer(Box::new(analyzer), requested, None, settings.sample_rate)
                }
                Err(e) => {
                    warn!(error = %e, "Neural sentiment backend unavailable, using lexical scorer");
                    crate::metrics::MetricsCollector::default()
                        .record_backend_downgrade(requested.as_str(), BackendKind::Lexical.as_str());
                    Self::with_analyzer(
                        Box::new(LexicalSentimentAnalyzer::new()),
                        requested,
                        Some(e.to_string()),
                        None,
                    )
                }
            },
        }
    }

    /// Wrap an already-built analyzer
    #[must_use]
    pub fn with_analyzer(
        analyzer: Box<dyn SentimentAnalyzer>,
        requested: BackendKind,
        downgrade_reason: Option<String>,
        sample_rate_override: Option<f64>,
    ) -> Self {
        let active = analyzer.backend();
        let sample_rate = sample_rate_override
            .unwrap_or_else(|| analyzer.sample_rate())
            .clamp(0.0, 1.0);
        let mut model = analyzer.model_info();
        model.sample_rate = sample_rate;
        let report = BackendReport {
            requested,
            active,
            downgraded: active != requested,
            downgrade_reason,
            model,
        };
        Self {
            analyzer,
            report,
            sample_rate,
        }
    }

    /// Active analyzer
    #[must_use]
    pub fn analyzer(&self) -> &dyn SentimentAnalyzer {
        self.analyzer.as_ref()
    }

    /// Resolution report
    #[must_use]
    pub const fn report(&self) -> &BackendReport {
        &self.report
    }

    /// Effective subsample rate
    #[must_use]
    pub const fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}
