//! Period bucketing and deterministic subsampling for sentiment scoring.
//!
//! Whether a message is scored depends only on a SHA-256 hash of its
//! identity, so serial and parallel runs (and repeated runs) pick the same
//! messages.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, WrappedError};
use crate::models::Message;

/// Hash tag used when choosing which messages to score
pub const SENTIMENT_TAG: &str = "sentiment";
/// Hash tag used when choosing scatter points
pub const SCATTER_TAG: &str = "scatter";

/// Trend-series granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentInterval {
    /// `YYYY-MM-DD`
    Day,
    /// ISO week, `YYYY-Www`
    Week,
    /// `YYYY-MM`
    #[default]
    Month,
}

impl SentimentInterval {
    /// Configuration name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Bucket key for `timestamp`
    #[must_use]
    pub fn period_key(&self, timestamp: &DateTime<Utc>) -> String {
        match self {
            Self::Day => timestamp.format("%Y-%m-%d").to_string(),
            Self::Week => {
                let week = timestamp.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Self::Month => timestamp.format("%Y-%m").to_string(),
        }
    }
}

impl fmt::Display for SentimentInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentInterval {
    type Err = WrappedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(WrappedError::InvalidInterval(s.to_string())),
        }
    }
}

/// Map a message identity to a stable value in [0, 1)
#[must_use]
pub fn sample_fraction(
    tag: &str,
    guid: &str,
    stage: &str,
    period: &str,
    timestamp: &DateTime<Utc>,
) -> f64 {
    let key = format!(
        "{tag}|{guid}|{stage}|{period}|{}",
        timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    let digest = Sha256::digest(key.as_bytes());
    let mut prefix = [0_u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    // 2^64
    u64::from_be_bytes(prefix) as f64 / 18_446_744_073_709_551_616.0
}

/// True when the message falls under `rate`
#[must_use]
pub fn should_sample(
    rate: f64,
    tag: &str,
    guid: &str,
    stage: &str,
    period: &str,
    timestamp: &DateTime<Utc>,
) -> bool {
    if rate >= 1.0 {
        return true;
    }
    if rate <= 0.0 {
        return false;
    }
    sample_fraction(tag, guid, stage, period, timestamp) < rate
}

/// A message chosen for scoring, with its period and reweighting factor
#[derive(Debug, Clone)]
pub struct SampledMessage<'a> {
    /// The message
    pub message: &'a Message,
    /// Period bucket key
    pub period: String,
    /// Messages represented by this one (`period_total / period_selected`)
    pub weight: f64,
}

/// Per-period bookkeeping of a stage selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodCounts {
    /// Messages in the period
    pub total: usize,
    /// Messages selected for scoring
    pub selected: usize,
}

/// Result of selecting one stage's messages
#[derive(Debug, Clone, Default)]
pub struct StageSelection<'a> {
    /// Selected messages ordered by period, then timestamp
    pub messages: Vec<SampledMessage<'a>>,
    /// Counts keyed by period
    pub periods: BTreeMap<String, PeriodCounts>,
}

impl StageSelection<'_> {
    /// Number of messages the selection stands for
    #[must_use]
    pub fn represented(&self) -> usize {
        self.periods.values().map(|p| p.total).sum()
    }
}

/// Select which of `messages` to score for `stage`.
///
/// Every non-empty period keeps at least one message: when the hash selects
/// none, the earliest message of the period (guid breaks ties) is used.
#[must_use]
pub fn select_stage<'a>(
    messages: &[&'a Message],
    stage: &str,
    interval: SentimentInterval,
    rate: f64,
) -> StageSelection<'a> {
    let mut by_period: BTreeMap<String, Vec<&'a Message>> = BTreeMap::new();
    for message in messages {
        by_period
            .entry(interval.period_key(&message.timestamp))
            .or_default()
            .push(*message);
    }

    let mut selection = StageSelection::default();
    for (period, mut bucket) in by_period {
        crate::models::sort_chronologically(&mut bucket);
        let mut chosen: Vec<&'a Message> = bucket
            .iter()
            .copied()
            .filter(|m| should_sample(rate, SENTIMENT_TAG, &m.guid, stage, &period, &m.timestamp))
            .collect();
        if chosen.is_empty() {
            if let Some(first) = bucket.first().copied() {
                chosen.push(first);
            }
        }

        let weight = bucket.len() as f64 / chosen.len().max(1) as f64;
        selection.periods.insert(
            period.clone(),
            PeriodCounts {
                total: bucket.len(),
                selected: chosen.len(),
            },
        );
        selection
            .messages
            .extend(chosen.into_iter().map(|message| SampledMessage {
                message,
                period: period.clone(),
                weight,
            }));
    }
    selection
}
