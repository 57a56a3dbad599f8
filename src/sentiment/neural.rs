//! Neural sentiment backend: subword encoding plus a two-class logit model.
//!
//! The model bundle is a directory holding `vocab.txt`, `config.json` and
//! (with the `advanced-nlp` feature) DistilBERT weights in `rust_model.ot`.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;

use rust_tokenizers::tokenizer::{BertTokenizer, Tokenizer, TruncationStrategy};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{
    Axis, BackendKind, EmbeddingAnalyzer, ModelInfo, SentimentAnalyzer, SentimentLabel,
    SentimentResult, SentimentSettings, DEFAULT_NEURAL_SAMPLE_RATE,
};
use crate::error::{Result, WrappedError};
use crate::utils::round_to;

/// Seed phrase for the affection axis
pub const AX1_SEED_PHRASE: &str = "I love you so much and can't wait to hug you.";
/// Seed phrase for the historical-fact axis
pub const AX2_SEED_PHRASE: &str = "George washington was the first president of the United States.";

/// Scatter axes as (id, seed)
pub const SCATTER_AXIS_SEEDS: [(&str, &str); 2] = [("AX1", AX1_SEED_PHRASE), ("AX2", AX2_SEED_PHRASE)];

/// Subword ids and mask for one text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
    /// Token ids including `[CLS]` and `[SEP]`
    pub input_ids: Vec<i64>,
    /// One per id
    pub attention_mask: Vec<i64>,
}

/// WordPiece encoder backed by `rust_tokenizers`
pub struct SubwordEncoder {
    tokenizer: BertTokenizer,
    max_length: usize,
}

impl std::fmt::Debug for SubwordEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubwordEncoder")
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

impl SubwordEncoder {
    /// Load a lowercasing, accent-stripping WordPiece vocabulary
    pub fn from_vocab_file(path: &Path, max_length: usize) -> Result<Self> {
        let tokenizer = BertTokenizer::from_file(path, true, true)?;
        Ok(Self {
            tokenizer,
            max_length,
        })
    }

    /// Encode `text`, truncated to the configured length
    #[must_use]
    pub fn encode(&self, text: &str) -> Encoding {
        let tokenized = self.tokenizer.encode(
            text,
            None,
            self.max_length,
            &TruncationStrategy::LongestFirst,
            0,
        );
        let attention_mask = vec![1; tokenized.token_ids.len()];
        Encoding {
            input_ids: tokenized.token_ids,
            attention_mask,
        }
    }
}

/// Anything that turns encoded input into class logits
#[cfg_attr(test, mockall::automock)]
pub trait LogitModel: Send + Sync {
    /// Raw logits for one sequence
    fn logits(&self, input_ids: &[i64], attention_mask: &[i64]) -> Result<Vec<f32>>;

    /// Model name for reporting
    fn name(&self) -> String;
}

/// Class indices of the positive and negative labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelIndices {
    /// Index of the positive class
    pub positive: usize,
    /// Index of the negative class
    pub negative: usize,
}

impl Default for LabelIndices {
    fn default() -> Self {
        Self {
            positive: 1,
            negative: 0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ModelConfigFile {
    #[serde(default)]
    id2label: BTreeMap<String, String>,
    #[serde(default, rename = "_name_or_path")]
    name_or_path: Option<String>,
}

impl LabelIndices {
    /// Read `id2label` from a model `config.json`
    ///
    /// Falls back to (0 = negative, 1 = positive) when either label is missing.
    pub fn from_config_json(raw: &str) -> Result<Self> {
        let config: ModelConfigFile = serde_json::from_str(raw)?;
        Ok(Self::from_id2label(&config.id2label))
    }

    fn from_id2label(id2label: &BTreeMap<String, String>) -> Self {
        let find = |names: &[&str]| {
            id2label.iter().find_map(|(id, label)| {
                let label = label.to_lowercase();
                names
                    .contains(&label.as_str())
                    .then(|| id.parse::<usize>().ok())
                    .flatten()
            })
        };
        match (find(&["positive", "pos"]), find(&["negative", "neg"])) {
            (Some(positive), Some(negative)) => Self { positive, negative },
            _ => Self::default(),
        }
    }
}

fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f64> = logits.iter().map(|l| f64::from(l - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

fn l2_normalize(values: &[f32]) -> Option<Vec<f32>> {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if values.is_empty() || norm == 0.0 || !norm.is_finite() {
        return None;
    }
    Some(values.iter().map(|v| v / norm).collect())
}

/// Loaded model resources: encoder, classifier, label order and axis vectors
pub struct ModelBundle {
    encoder: SubwordEncoder,
    model: Box<dyn LogitModel>,
    labels: LabelIndices,
    name: String,
    axes: Vec<(Axis, Vec<f32>)>,
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("name", &self.name)
            .field("labels", &self.labels)
            .field("axes", &self.axes.len())
            .finish_non_exhaustive()
    }
}

impl ModelBundle {
    /// Assemble from already-loaded parts and compute the axis vectors
    #[must_use]
    pub fn new(encoder: SubwordEncoder, model: Box<dyn LogitModel>, labels: LabelIndices) -> Self {
        let mut axes = Vec::with_capacity(SCATTER_AXIS_SEEDS.len());
        for (id, seed) in SCATTER_AXIS_SEEDS {
            let encoding = encoder.encode(seed);
            let vector = model
                .logits(&encoding.input_ids, &encoding.attention_mask)
                .ok()
                .and_then(|logits| l2_normalize(&logits));
            match vector {
                Some(vector) => axes.push((
                    Axis {
                        id: id.to_string(),
                        seed: seed.to_string(),
                    },
                    vector,
                )),
                None => warn!(axis = id, "Could not compute scatter axis vector"),
            }
        }

        Self {
            name: model.name(),
            encoder,
            model,
            labels,
            axes,
        }
    }

    /// Read `vocab.txt`, `config.json` and the weights from `dir`
    pub fn load(dir: &Path, max_length: usize) -> Result<Self> {
        let vocab = dir.join("vocab.txt");
        if !vocab.is_file() {
            return Err(WrappedError::BackendUnavailable(format!(
                "missing vocabulary {}",
                vocab.display()
            )));
        }
        let encoder = SubwordEncoder::from_vocab_file(&vocab, max_length)?;

        let (labels, name) = match fs::read_to_string(dir.join("config.json")) {
            Ok(raw) => {
                let config: ModelConfigFile = serde_json::from_str(&raw)?;
                (
                    LabelIndices::from_id2label(&config.id2label),
                    config.name_or_path.filter(|n| !n.is_empty()),
                )
            }
            Err(e) => {
                debug!(error = %e, "No model config.json, using default label order");
                (LabelIndices::default(), None)
            }
        };

        let mut bundle = Self::new(encoder, load_model(dir)?, labels);
        if let Some(name) = name {
            bundle.name = name;
        }
        info!(model = %bundle.name, dir = %dir.display(), "Sentiment model bundle loaded");
        Ok(bundle)
    }
}

/// Model bundles keyed by (directory, max sequence length).
///
/// Entries are created on first successful load and never evicted; failed
/// loads are not cached.
#[derive(Debug, Default)]
pub struct ModelCache {
    bundles: Mutex<HashMap<(PathBuf, usize), Arc<ModelBundle>>>,
}

impl ModelCache {
    /// Cached bundle for `dir`, running `load` only on a miss
    pub fn get_or_try_load<F>(&self, dir: &Path, max_length: usize, load: F) -> Result<Arc<ModelBundle>>
    where
        F: FnOnce() -> Result<ModelBundle>,
    {
        let key = (
            dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf()),
            max_length,
        );
        let mut bundles = self.bundles.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bundle) = bundles.get(&key) {
            debug!(dir = %key.0.display(), "Reusing cached sentiment model");
            return Ok(Arc::clone(bundle));
        }

        let bundle = Arc::new(load()?);
        bundles.insert(key, Arc::clone(&bundle));
        Ok(bundle)
    }

    /// Number of cached bundles
    #[must_use]
    pub fn len(&self) -> usize {
        self.bundles.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True when nothing has been loaded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static MODEL_CACHE: Lazy<ModelCache> = Lazy::new(ModelCache::default);

/// Sequence-classifier sentiment with embedding projection
pub struct NeuralSentimentAnalyzer {
    bundle: Arc<ModelBundle>,
    neutral_margin: f64,
    sample_rate: f64,
}

impl std::fmt::Debug for NeuralSentimentAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeuralSentimentAnalyzer")
            .field("bundle", &self.bundle)
            .field("neutral_margin", &self.neutral_margin)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

impl NeuralSentimentAnalyzer {
    /// Load the model bundle named by `settings.model_dir`.
    ///
    /// The bundle is read from disk once per process; later calls with the
    /// same directory share it.
    pub fn load(settings: &SentimentSettings) -> Result<Self> {
        let dir = settings.model_dir.as_deref().ok_or_else(|| {
            WrappedError::BackendUnavailable("no sentiment model directory configured".to_string())
        })?;
        if !dir.is_dir() {
            return Err(WrappedError::BackendUnavailable(format!(
                "model directory {} does not exist",
                dir.display()
            )));
        }

        let bundle = MODEL_CACHE.get_or_try_load(dir, settings.max_length, || {
            ModelBundle::load(dir, settings.max_length)
        })?;
        Ok(Self::with_bundle(bundle, settings))
    }

    /// Assemble from already-loaded parts and compute the axis vectors
    #[must_use]
    pub fn from_parts(
        encoder: SubwordEncoder,
        model: Box<dyn LogitModel>,
        labels: LabelIndices,
        settings: &SentimentSettings,
    ) -> Self {
        Self::with_bundle(Arc::new(ModelBundle::new(encoder, model, labels)), settings)
    }

    /// Analyzer over a shared bundle with per-run margin and sample rate
    #[must_use]
    pub fn with_bundle(bundle: Arc<ModelBundle>, settings: &SentimentSettings) -> Self {
        Self {
            bundle,
            neutral_margin: settings.neutral_margin,
            sample_rate: settings.sample_rate.unwrap_or(DEFAULT_NEURAL_SAMPLE_RATE),
        }
    }

    fn score(&self, text: Option<&str>, include_embedding: bool) -> (SentimentResult, Option<Vec<f32>>) {
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return (SentimentResult::neutral(), None);
        };

        let encoding = self.bundle.encoder.encode(text);
        let logits = match self.bundle.model.logits(&encoding.input_ids, &encoding.attention_mask) {
            Ok(logits) => logits,
            Err(e) => {
                warn!(error = %e, "Sentiment inference failed, scoring as neutral");
                return (SentimentResult::neutral(), None);
            }
        };

        let probs = softmax(&logits);
        let (Some(pos), Some(neg)) = (probs.get(self.bundle.labels.positive), probs.get(self.bundle.labels.negative))
        else {
            warn!(classes = probs.len(), "Model returned too few classes");
            return (SentimentResult::neutral(), None);
        };

        let score = pos - neg;
        let label = if score.abs() < self.neutral_margin {
            SentimentLabel::Neutral
        } else if score > 0.0 {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Negative
        };

        let embedding = include_embedding.then_some(logits);
        (
            SentimentResult {
                score: round_to(score, 3),
                label,
            },
            embedding,
        )
    }
}

impl SentimentAnalyzer for NeuralSentimentAnalyzer {
    fn analyze(&self, text: Option<&str>) -> SentimentResult {
        self.score(text, false).0
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Neural
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: self.bundle.name.clone(),
            backend: BackendKind::Neural,
            max_length: Some(self.bundle.encoder.max_length),
            sample_rate: self.sample_rate,
            embedding_sample_rate: Some(self.embedding_sample_rate()),
            axis_seeds: self
                .bundle
                .axes
                .iter()
                .map(|(axis, _)| (axis.id.clone(), axis.seed.clone()))
                .collect(),
        }
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn as_embedding(&self) -> Option<&dyn EmbeddingAnalyzer> {
        Some(self)
    }
}

impl EmbeddingAnalyzer for NeuralSentimentAnalyzer {
    fn analyze_with_embedding(&self, text: Option<&str>) -> (SentimentResult, Option<Vec<f32>>) {
        self.score(text, true)
    }

    fn project_embedding(&self, embedding: &[f32]) -> BTreeMap<String, f64> {
        let Some(normalized) = l2_normalize(embedding) else {
            return BTreeMap::new();
        };
        self.bundle
            .axes
            .iter()
            .filter(|(_, vector)| vector.len() == normalized.len())
            .map(|(axis, vector)| {
                let dot: f32 = vector.iter().zip(&normalized).map(|(a, b)| a * b).sum();
                (axis.id.clone(), f64::from(dot))
            })
            .collect()
    }

    fn axes(&self) -> Vec<Axis> {
        self.bundle.axes.iter().map(|(axis, _)| axis.clone()).collect()
    }
}

#[cfg(feature = "advanced-nlp")]
fn load_model(dir: &Path) -> Result<Box<dyn LogitModel>> {
    Ok(Box::new(distilbert::DistilBertLogitModel::load(dir)?))
}

#[cfg(not(feature = "advanced-nlp"))]
fn load_model(_dir: &Path) -> Result<Box<dyn LogitModel>> {
    Err(WrappedError::BackendUnavailable(
        "built without the advanced-nlp feature".to_string(),
    ))
}

#[cfg(feature = "advanced-nlp")]
mod distilbert {
    use std::path::Path;
    use std::sync::Mutex;

    use rust_bert::distilbert::{DistilBertConfig, DistilBertModelClassifier};
    use rust_bert::Config;
    use tch::{nn, Device, Kind, Tensor};

    use super::LogitModel;
    use crate::error::{Result, WrappedError};

    /// DistilBERT sequence classifier on CPU
    pub(super) struct DistilBertLogitModel {
        model: Mutex<DistilBertModelClassifier>,
        _var_store: nn::VarStore,
    }

    impl DistilBertLogitModel {
        pub(super) fn load(dir: &Path) -> Result<Self> {
            let weights = dir.join("rust_model.ot");
            let config_path = dir.join("config.json");
            for required in [&weights, &config_path] {
                if !required.is_file() {
                    return Err(WrappedError::BackendUnavailable(format!(
                        "missing model file {}",
                        required.display()
                    )));
                }
            }

            let config = DistilBertConfig::from_file(&config_path);
            let mut var_store = nn::VarStore::new(Device::Cpu);
            let model = DistilBertModelClassifier::new(var_store.root(), &config)
                .map_err(|e| WrappedError::BackendUnavailable(e.to_string()))?;
            var_store
                .load(&weights)
                .map_err(|e| WrappedError::BackendUnavailable(e.to_string()))?;

            Ok(Self {
                model: Mutex::new(model),
                _var_store: var_store,
            })
        }
    }

    impl LogitModel for DistilBertLogitModel {
        fn logits(&self, input_ids: &[i64], attention_mask: &[i64]) -> Result<Vec<f32>> {
            let model = self
                .model
                .lock()
                .map_err(|_| WrappedError::Inference("model lock poisoned".to_string()))?;
            let ids = Tensor::from_slice(input_ids).unsqueeze(0);
            let mask = Tensor::from_slice(attention_mask).unsqueeze(0);
            let output = tch::no_grad(|| model.forward_t(Some(&ids), Some(&mask), None, false))
                .map_err(|e| WrappedError::Inference(e.to_string()))?;
            let logits = output.logits.squeeze_dim(0).to_kind(Kind::Float);
            Vec::<f32>::try_from(&logits).map_err(|e| WrappedError::Inference(e.to_string()))
        }

        fn name(&self) -> String {
            "DistilBERT".to_string()
        }
    }
}
