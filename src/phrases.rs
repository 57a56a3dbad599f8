//! Phrase extraction: n-gram mining, scoring, ranking, and overlap de-duplication.
//!
//! The extractor works on plain text batches. An aggregate bucket covers all
//! texts, and optional per-contact buckets are ranked against each other by
//! their strongest phrase.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WrappedError};
use crate::scoring::{PhraseScorer, ScoredPhrase, ScoringMethod};
use crate::stopwords::{self, StopwordSet, StopwordSource};
use crate::tokenizer::{SimpleTokenizer, TokenizedMessage};
use crate::utils::round_to;

/// A ranked phrase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseStat {
    /// Lowercase n-gram
    pub text: String,
    /// Occurrences within the analyzed texts
    pub occurrences: usize,
    /// Share of all occurrences that survived the minimum-occurrence filter
    pub share: f64,
}

/// Phrase summary for one conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactPhraseStats {
    /// Chat identifier
    pub contact_id: String,
    /// Display name, when known
    pub contact_name: Option<String>,
    /// Number of texts analyzed for this contact
    pub total_messages: usize,
    /// Ranked phrases (bounded by `per_contact_limit`)
    pub top_phrases: Vec<PhraseStat>,
}

/// Result of one extraction run
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseExtractionResult {
    /// Top phrases across all texts
    pub overall: Vec<PhraseStat>,
    /// Per-contact breakdown, strongest first; contacts without phrases omitted
    pub by_contact: Vec<ContactPhraseStats>,
    /// Number of texts in the aggregate bucket
    pub analyzed_messages: usize,
    /// Configuration used
    pub config: PhraseExtractionConfig,
}

/// Validated, immutable phrase extraction settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhraseExtractionConfig {
    ngram_range: (usize, usize),
    min_occurrences: usize,
    min_characters: usize,
    min_text_messages: usize,
    per_contact_min_text_messages: Option<usize>,
    max_phrases: usize,
    per_contact_limit: usize,
    scoring: ScoringMethod,
    dedupe_overlap: bool,
    overlap_tolerance: f64,
    length_bias: f64,
}

impl Default for PhraseExtractionConfig {
    fn default() -> Self {
        Self {
            ngram_range: (3, 6),
            min_occurrences: 3,
            min_characters: 4,
            min_text_messages: 50,
            per_contact_min_text_messages: Some(20),
            max_phrases: 10,
            per_contact_limit: 5,
            scoring: ScoringMethod::Frequency,
            dedupe_overlap: true,
            overlap_tolerance: 0.1,
            length_bias: 0.45,
        }
    }
}

impl PhraseExtractionConfig {
    /// Start from the defaults
    #[must_use]
    pub fn builder() -> PhraseExtractionConfigBuilder {
        PhraseExtractionConfigBuilder {
            inner: Self::default(),
        }
    }

    /// Inclusive n-gram length range
    #[must_use]
    pub const fn ngram_range(&self) -> (usize, usize) {
        self.ngram_range
    }

    /// Minimum occurrences for a phrase to be kept
    #[must_use]
    pub const fn min_occurrences(&self) -> usize {
        self.min_occurrences
    }

    /// Minimum total characters across a candidate's tokens
    #[must_use]
    pub const fn min_characters(&self) -> usize {
        self.min_characters
    }

    /// Minimum texts for the aggregate bucket
    #[must_use]
    pub const fn min_text_messages(&self) -> usize {
        self.min_text_messages
    }

    /// Minimum texts for a per-contact bucket (falls back to `min_text_messages`)
    #[must_use]
    pub const fn per_contact_min_text_messages(&self) -> Option<usize> {
        self.per_contact_min_text_messages
    }

    /// Maximum phrases in the aggregate result
    #[must_use]
    pub const fn max_phrases(&self) -> usize {
        self.max_phrases
    }

    /// Maximum phrases per contact (0 = unlimited)
    #[must_use]
    pub const fn per_contact_limit(&self) -> usize {
        self.per_contact_limit
    }

    /// Scoring strategy
    #[must_use]
    pub const fn scoring(&self) -> ScoringMethod {
        self.scoring
    }

    /// Whether overlapping sub/super-phrases are collapsed
    #[must_use]
    pub const fn dedupe_overlap(&self) -> bool {
        self.dedupe_overlap
    }

    /// Occurrence tolerance (fraction) for overlap de-duplication
    #[must_use]
    pub const fn overlap_tolerance(&self) -> f64 {
        self.overlap_tolerance
    }

    /// Bonus per extra token applied to the ranking score
    #[must_use]
    pub const fn length_bias(&self) -> f64 {
        self.length_bias
    }

    fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(invalid(format!(
                "ngram_range must satisfy 1 <= min <= max, got ({min_n}, {max_n})"
            )));
        }
        if self.min_occurrences < 1 {
            return Err(invalid("min_occurrences must be >= 1"));
        }
        if self.min_characters < 1 {
            return Err(invalid("min_characters must be >= 1"));
        }
        if self.min_text_messages < 1 {
            return Err(invalid("min_text_messages must be >= 1"));
        }
        if self.per_contact_min_text_messages == Some(0) {
            return Err(invalid("per_contact_min_text_messages must be >= 1"));
        }
        if self.max_phrases < 1 {
            return Err(invalid("max_phrases must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.overlap_tolerance) {
            return Err(invalid(format!(
                "overlap_tolerance must be within [0, 1], got {}",
                self.overlap_tolerance
            )));
        }
        if !self.length_bias.is_finite() || self.length_bias < 0.0 {
            return Err(invalid(format!(
                "length_bias must be a finite value >= 0, got {}",
                self.length_bias
            )));
        }
        Ok(())
    }

    fn length_multiplier(&self, phrase: &str) -> f64 {
        let extra_tokens = phrase.matches(' ').count();
        self.length_bias.mul_add(extra_tokens as f64, 1.0)
    }
}

fn invalid(message: impl Into<String>) -> WrappedError {
    WrappedError::InvalidConfig(message.into())
}

/// Builder that validates on `build`
#[derive(Debug, Clone)]
pub struct PhraseExtractionConfigBuilder {
    inner: PhraseExtractionConfig,
}

impl PhraseExtractionConfigBuilder {
    /// Inclusive n-gram length range
    #[must_use]
    pub const fn ngram_range(mut self, min: usize, max: usize) -> Self {
        self.inner.ngram_range = (min, max);
        self
    }

    /// Minimum occurrences
    #[must_use]
    pub const fn min_occurrences(mut self, value: usize) -> Self {
        self.inner.min_occurrences = value;
        self
    }

    /// Minimum characters per candidate
    #[must_use]
    pub const fn min_characters(mut self, value: usize) -> Self {
        self.inner.min_characters = value;
        self
    }

    /// Minimum texts for the aggregate bucket
    #[must_use]
    pub const fn min_text_messages(mut self, value: usize) -> Self {
        self.inner.min_text_messages = value;
        self
    }

    /// Minimum texts per contact
    #[must_use]
    pub const fn per_contact_min_text_messages(mut self, value: Option<usize>) -> Self {
        self.inner.per_contact_min_text_messages = value;
        self
    }

    /// Maximum aggregate phrases
    #[must_use]
    pub const fn max_phrases(mut self, value: usize) -> Self {
        self.inner.max_phrases = value;
        self
    }

    /// Maximum phrases per contact (0 = unlimited)
    #[must_use]
    pub const fn per_contact_limit(mut self, value: usize) -> Self {
        self.inner.per_contact_limit = value;
        self
    }

    /// Scoring strategy
    #[must_use]
    pub const fn scoring(mut self, value: ScoringMethod) -> Self {
        self.inner.scoring = value;
        self
    }

    /// Toggle overlap de-duplication
    #[must_use]
    pub const fn dedupe_overlap(mut self, value: bool) -> Self {
        self.inner.dedupe_overlap = value;
        self
    }

    /// Overlap tolerance fraction
    #[must_use]
    pub const fn overlap_tolerance(mut self, value: f64) -> Self {
        self.inner.overlap_tolerance = value;
        self
    }

    /// Length bias multiplier
    #[must_use]
    pub const fn length_bias(mut self, value: f64) -> Self {
        self.inner.length_bias = value;
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> Result<PhraseExtractionConfig> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

#[derive(Debug, Default)]
struct PhraseBucket {
    total_messages: usize,
    top_phrases: Vec<PhraseStat>,
}

/// Mines recurring phrases from text batches
pub struct PhraseExtractor {
    config: PhraseExtractionConfig,
    tokenizer: SimpleTokenizer,
    stopwords: StopwordSet,
    scorer: Box<dyn PhraseScorer>,
}

impl std::fmt::Debug for PhraseExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhraseExtractor")
            .field("config", &self.config)
            .field("stopwords", &self.stopwords.len())
            .finish_non_exhaustive()
    }
}

impl PhraseExtractor {
    /// Extractor using the bundled English stopword list
    #[must_use]
    pub fn new(config: PhraseExtractionConfig) -> Self {
        Self::with_stopwords(config, stopwords::english(StopwordSource::Bundled))
    }

    /// Extractor with an injected stopword set
    #[must_use]
    pub fn with_stopwords(config: PhraseExtractionConfig, stopwords: StopwordSet) -> Self {
        let scorer = config.scoring.scorer();
        Self {
            config,
            tokenizer: SimpleTokenizer::new(),
            stopwords,
            scorer,
        }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &PhraseExtractionConfig {
        &self.config
    }

    /// Extract aggregate phrases from `messages`, plus per-contact phrases
    /// when `per_contact_messages` is given.
    pub fn extract<S: AsRef<str>>(
        &self,
        messages: &[S],
        per_contact_messages: Option<&BTreeMap<String, Vec<String>>>,
        contact_names: Option<&HashMap<String, String>>,
    ) -> PhraseExtractionResult {
        let overall = self.extract_bucket(messages, self.config.min_text_messages);

        let mut by_contact = Vec::new();
        if let Some(per_contact) = per_contact_messages {
            let min_messages = self
                .config
                .per_contact_min_text_messages
                .unwrap_or(self.config.min_text_messages);

            for (contact_id, texts) in per_contact {
                let bucket = self.extract_bucket(texts, min_messages);
                if bucket.top_phrases.is_empty() {
                    continue;
                }
                by_contact.push(ContactPhraseStats {
                    contact_id: contact_id.clone(),
                    contact_name: contact_names.and_then(|names| names.get(contact_id).cloned()),
                    total_messages: bucket.total_messages,
                    top_phrases: self.contact_slice(bucket.top_phrases),
                });
            }

            // Stable sort keeps contact-id order among equal keys.
            by_contact.sort_by(|a, b| {
                let a_top = a.top_phrases.first().map_or(0, |p| p.occurrences);
                let b_top = b.top_phrases.first().map_or(0, |p| p.occurrences);
                b_top
                    .cmp(&a_top)
                    .then_with(|| b.total_messages.cmp(&a.total_messages))
            });
        }

        let mut top = overall.top_phrases;
        top.truncate(self.config.max_phrases);

        PhraseExtractionResult {
            overall: top,
            by_contact,
            analyzed_messages: overall.total_messages,
            config: self.config.clone(),
        }
    }

    fn extract_bucket<S: AsRef<str>>(&self, messages: &[S], min_messages: usize) -> PhraseBucket {
        let tokenized = self.tokenizer.tokenize_messages(messages);
        let total_messages = tokenized.len();
        if total_messages < min_messages {
            return PhraseBucket {
                total_messages,
                top_phrases: Vec::new(),
            };
        }

        let (counts, doc_frequencies) = self.count_phrases(&tokenized);
        let filtered: HashMap<String, usize> = counts
            .into_iter()
            .filter(|(_, count)| *count >= self.config.min_occurrences)
            .collect();
        if filtered.is_empty() {
            return PhraseBucket {
                total_messages,
                top_phrases: Vec::new(),
            };
        }

        let total_occurrences: usize = filtered.values().sum();
        let mut ranked = self.scorer.score(&filtered, &doc_frequencies, total_messages);
        ranked.sort_by(|a, b| self.rank_order(a, b));

        if self.config.dedupe_overlap {
            ranked = self.dedupe_overlaps(ranked);
        }

        let denominator = total_occurrences.max(1) as f64;
        let top_phrases = ranked
            .into_iter()
            .map(|item| PhraseStat {
                share: round_to(item.occurrences as f64 / denominator, 4),
                occurrences: item.occurrences,
                text: item.text,
            })
            .collect();

        PhraseBucket {
            total_messages,
            top_phrases,
        }
    }

    /// Descending by (weighted score, occurrences, length, text)
    fn rank_order(&self, a: &ScoredPhrase, b: &ScoredPhrase) -> Ordering {
        let a_weighted = a.score * self.config.length_multiplier(&a.text);
        let b_weighted = b.score * self.config.length_multiplier(&b.text);
        b_weighted
            .total_cmp(&a_weighted)
            .then_with(|| b.occurrences.cmp(&a.occurrences))
            .then_with(|| b.text.chars().count().cmp(&a.text.chars().count()))
            .then_with(|| b.text.cmp(&a.text))
    }

    fn count_phrases(
        &self,
        tokenized: &[TokenizedMessage],
    ) -> (HashMap<String, usize>, HashMap<String, usize>) {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut doc_frequencies: HashMap<String, usize> = HashMap::new();

        for message in tokenized {
            let mut seen_in_message: HashSet<String> = HashSet::new();
            for phrase in self.generate_phrases(&message.tokens) {
                *counts.entry(phrase.clone()).or_insert(0) += 1;
                if seen_in_message.insert(phrase.clone()) {
                    *doc_frequencies.entry(phrase).or_insert(0) += 1;
                }
            }
        }

        (counts, doc_frequencies)
    }

    fn generate_phrases(&self, tokens: &[String]) -> Vec<String> {
        let (min_n, max_n) = self.config.ngram_range;
        let mut phrases = Vec::new();
        for n in min_n..=max_n {
            if tokens.len() < n {
                break;
            }
            for window in tokens.windows(n) {
                if self.valid_ngram(window) {
                    phrases.push(window.join(" "));
                }
            }
        }
        phrases
    }

    fn valid_ngram(&self, window: &[String]) -> bool {
        if window.is_empty() {
            return false;
        }
        let characters: usize = window.iter().map(|t| t.chars().count()).sum();
        if characters < self.config.min_characters {
            return false;
        }
        !window.iter().all(|t| self.stopwords.contains(t))
    }

    fn dedupe_overlaps(&self, ranked: Vec<ScoredPhrase>) -> Vec<ScoredPhrase> {
        let mut kept: Vec<ScoredPhrase> = Vec::with_capacity(ranked.len());
        for candidate in ranked {
            let redundant = kept.iter().any(|existing| {
                if !phrases_overlap(&existing.text, &candidate.text) {
                    return false;
                }
                let delta = existing.occurrences.abs_diff(candidate.occurrences);
                let tolerance =
                    ((existing.occurrences as f64 * self.config.overlap_tolerance).round() as usize).max(1);
                let shorter = candidate.text.chars().count() <= existing.text.chars().count();
                shorter && delta <= tolerance
            });
            if !redundant {
                kept.push(candidate);
            }
        }
        kept
    }

    fn contact_slice(&self, mut phrases: Vec<PhraseStat>) -> Vec<PhraseStat> {
        if self.config.per_contact_limit > 0 {
            phrases.truncate(self.config.per_contact_limit);
        }
        phrases
    }
}

fn phrases_overlap(left: &str, right: &str) -> bool {
    left.contains(right) || right.contains(left)
}
