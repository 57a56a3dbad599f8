//! Phrase scoring strategies.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WrappedError};

/// A candidate phrase with its score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPhrase {
    /// Normalized phrase text (tokens joined by a single space)
    pub text: String,
    /// Strategy-specific score
    pub score: f64,
    /// Raw occurrence count
    pub occurrences: usize,
}

/// Assigns a score to every counted phrase.
///
/// Output is ordered by phrase text so equal inputs always produce equal
/// output regardless of hash map iteration order.
pub trait PhraseScorer: Send + Sync {
    /// Score each phrase in `counts`
    fn score(
        &self,
        counts: &HashMap<String, usize>,
        doc_frequencies: &HashMap<String, usize>,
        total_docs: usize,
    ) -> Vec<ScoredPhrase>;
}

/// Score equals raw occurrence count
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyScorer;

impl PhraseScorer for FrequencyScorer {
    fn score(
        &self,
        counts: &HashMap<String, usize>,
        _doc_frequencies: &HashMap<String, usize>,
        _total_docs: usize,
    ) -> Vec<ScoredPhrase> {
        sorted_entries(counts)
            .map(|(text, occurrences)| ScoredPhrase {
                text: text.clone(),
                score: occurrences as f64,
                occurrences,
            })
            .collect()
    }
}

/// `count * ln(total_docs / (1 + df))`
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfScorer;

impl PhraseScorer for TfIdfScorer {
    fn score(
        &self,
        counts: &HashMap<String, usize>,
        doc_frequencies: &HashMap<String, usize>,
        total_docs: usize,
    ) -> Vec<ScoredPhrase> {
        sorted_entries(counts)
            .map(|(text, occurrences)| {
                let score = if total_docs == 0 {
                    0.0
                } else {
                    let df = doc_frequencies.get(text).copied().unwrap_or(0);
                    let idf = (total_docs as f64 / (1.0 + df as f64)).ln();
                    occurrences as f64 * idf
                };
                ScoredPhrase {
                    text: text.clone(),
                    score,
                    occurrences,
                }
            })
            .collect()
    }
}

fn sorted_entries(counts: &HashMap<String, usize>) -> impl Iterator<Item = (&String, usize)> {
    let mut entries: Vec<(&String, usize)> = counts.iter().map(|(k, v)| (k, *v)).collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries.into_iter()
}

/// Scoring strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMethod {
    /// Raw frequency
    #[default]
    Frequency,
    /// Term frequency weighted by inverse document frequency
    Tfidf,
}

impl ScoringMethod {
    /// Configuration name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Frequency => "frequency",
            Self::Tfidf => "tfidf",
        }
    }

    /// Instantiate the scorer for this method
    #[must_use]
    pub fn scorer(&self) -> Box<dyn PhraseScorer> {
        match self {
            Self::Frequency => Box::new(FrequencyScorer),
            Self::Tfidf => Box::new(TfIdfScorer),
        }
    }
}

impl fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringMethod {
    type Err = WrappedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "frequency" => Ok(Self::Frequency),
            "tfidf" => Ok(Self::Tfidf),
            other => Err(WrappedError::InvalidConfig(format!(
                "scoring must be 'frequency' or 'tfidf', got '{other}'"
            ))),
        }
    }
}
