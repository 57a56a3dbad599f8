//! Sentiment summary: reweighted label counts, per-period trends and the
//! optional embedding scatter.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{report_progress, AnalysisContext, ProgressCallback, SentimentOptions};
use crate::metrics::MetricsCollector;
use crate::models::Message;
use crate::sentiment::sampling::{sample_fraction, select_stage, should_sample, SCATTER_TAG};
use crate::sentiment::{
    Axis, BackendReport, EmbeddingAnalyzer, SentimentInterval, SentimentLabel, SentimentResult,
};
use crate::utils::{percentage, round_to};

const STAGE_SENT: &str = "sent";
const STAGE_RECEIVED: &str = "received";
const STAGE_SCATTER: &str = "scatter";

/// Reweighted label counts for one slice of messages
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SentimentSummary {
    pub avg_score: f64,
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    pub positive_percentage: f64,
    pub neutral_percentage: f64,
    pub negative_percentage: f64,
    /// Messages actually scored
    pub analyzed_messages: usize,
    /// Messages the scored ones stand for
    pub represented_messages: usize,
}

/// One point of a trend series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodPoint {
    pub period: String,
    pub avg_score: f64,
    pub messages: usize,
    pub sampled: usize,
}

/// Trend series per slice
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodSeries {
    pub overall: Vec<PeriodPoint>,
    pub sent: Vec<PeriodPoint>,
    pub received: Vec<PeriodPoint>,
}

/// Bounds applied when picking scatter points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterLimit {
    pub max_messages: usize,
    pub stage: String,
    pub interval: SentimentInterval,
}

/// A projected message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub score: f64,
    pub label: SentimentLabel,
    pub period: String,
    pub stage: String,
}

/// Messages projected onto the backend's reference axes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPayload {
    pub axes: Vec<Axis>,
    pub sample_rate: f64,
    pub limit: ScatterLimit,
    pub points: Vec<ScatterPoint>,
}

/// `content.sentiment`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentSection {
    pub backend: BackendReport,
    pub sample_rate: f64,
    pub interval: SentimentInterval,
    pub overall: SentimentSummary,
    pub sent: SentimentSummary,
    pub received: SentimentSummary,
    pub overall_score: f64,
    pub positive_percentage: f64,
    pub neutral_percentage: f64,
    pub negative_percentage: f64,
    pub periods: PeriodSeries,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scatter: Option<ScatterPayload>,
}

#[derive(Debug, Clone, Copy, Default)]
struct PeriodTally {
    weighted_score: f64,
    weight: f64,
    messages: usize,
    sampled: usize,
}

#[derive(Debug, Clone, Default)]
struct Tally {
    weighted_score: f64,
    weight: f64,
    positive: f64,
    neutral: f64,
    negative: f64,
    analyzed: usize,
    represented: usize,
    periods: BTreeMap<String, PeriodTally>,
}

impl Tally {
    fn add(&mut self, result: &SentimentResult, weight: f64, period: &str) {
        self.weighted_score += result.score * weight;
        self.weight += weight;
        match result.label {
            SentimentLabel::Positive => self.positive += weight,
            SentimentLabel::Neutral => self.neutral += weight,
            SentimentLabel::Negative => self.negative += weight,
        }
        self.analyzed += 1;
        let slot = self.periods.entry(period.to_string()).or_default();
        slot.weighted_score += result.score * weight;
        slot.weight += weight;
    }

    fn merge(&mut self, other: &Self) {
        self.weighted_score += other.weighted_score;
        self.weight += other.weight;
        self.positive += other.positive;
        self.neutral += other.neutral;
        self.negative += other.negative;
        self.analyzed += other.analyzed;
        self.represented += other.represented;
        for (period, tally) in &other.periods {
            let slot = self.periods.entry(period.clone()).or_default();
            slot.weighted_score += tally.weighted_score;
            slot.weight += tally.weight;
            slot.messages += tally.messages;
            slot.sampled += tally.sampled;
        }
    }

    fn summary(&self) -> SentimentSummary {
        let avg_score = if self.weight > 0.0 {
            round_to(self.weighted_score / self.weight, 3)
        } else {
            0.0
        };
        SentimentSummary {
            avg_score,
            positive: round_to(self.positive, 2),
            neutral: round_to(self.neutral, 2),
            negative: round_to(self.negative, 2),
            positive_percentage: percentage(self.positive, self.weight),
            neutral_percentage: percentage(self.neutral, self.weight),
            negative_percentage: percentage(self.negative, self.weight),
            analyzed_messages: self.analyzed,
            represented_messages: self.represented,
        }
    }

    fn series(&self) -> Vec<PeriodPoint> {
        self.periods
            .iter()
            .map(|(period, tally)| PeriodPoint {
                period: period.clone(),
                avg_score: if tally.weight > 0.0 {
                    round_to(tally.weighted_score / tally.weight, 3)
                } else {
                    0.0
                },
                messages: tally.messages,
                sampled: tally.sampled,
            })
            .collect()
    }
}

fn with_text<'a>(messages: &[&'a Message]) -> Vec<&'a Message> {
    messages
        .iter()
        .copied()
        .filter(|m| !m.text_or_empty().trim().is_empty())
        .collect()
}

fn score_stage(
    messages: &[&Message],
    stage: &'static str,
    options: &SentimentOptions,
    progress: Option<&ProgressCallback>,
    metrics: &MetricsCollector,
) -> Tally {
    let selection = select_stage(messages, stage, options.interval, options.engine.sample_rate());
    let analyzer = options.engine.analyzer();
    let backend = analyzer.backend().as_str();
    let total = selection.messages.len();

    let mut tally = Tally {
        represented: selection.represented(),
        ..Tally::default()
    };
    for (period, counts) in &selection.periods {
        let slot = tally.periods.entry(period.clone()).or_default();
        slot.messages = counts.total;
        slot.sampled = counts.selected;
    }

    report_progress(progress, stage, 0, total);
    for (done, sampled) in selection.messages.iter().enumerate() {
        let result = analyzer.analyze(sampled.message.text.as_deref());
        metrics.record_sentiment_score(stage, backend, result.score);
        tally.add(&result, sampled.weight, &sampled.period);
        report_progress(progress, stage, done + 1, total);
    }

    tally
}

fn scatter(
    sent: &[&Message],
    embedder: &dyn EmbeddingAnalyzer,
    options: &SentimentOptions,
    progress: Option<&ProgressCallback>,
) -> Option<ScatterPayload> {
    let axes = embedder.axes();
    if axes.len() < 2 {
        return None;
    }
    let (x_axis, y_axis) = (axes[0].id.clone(), axes[1].id.clone());
    let rate = embedder.embedding_sample_rate();

    let mut by_period: BTreeMap<String, Vec<(f64, &Message)>> = BTreeMap::new();
    for message in sent {
        let period = options.interval.period_key(&message.timestamp);
        if !should_sample(rate, SCATTER_TAG, &message.guid, STAGE_SENT, &period, &message.timestamp) {
            continue;
        }
        let rank = sample_fraction(SCATTER_TAG, &message.guid, STAGE_SENT, &period, &message.timestamp);
        by_period.entry(period).or_default().push((rank, message));
    }

    let chosen: Vec<(String, &Message)> = by_period
        .into_iter()
        .flat_map(|(period, mut candidates)| {
            candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.guid.cmp(&b.1.guid)));
            candidates.truncate(options.scatter_max_per_period);
            candidates.into_iter().map(move |(_, m)| (period.clone(), m))
        })
        .collect();

    let total = chosen.len();
    report_progress(progress, STAGE_SCATTER, 0, total);
    let mut points = Vec::with_capacity(total);
    for (done, (period, message)) in chosen.into_iter().enumerate() {
        let (result, embedding) = embedder.analyze_with_embedding(message.text.as_deref());
        if let Some(embedding) = embedding {
            let projected = embedder.project_embedding(&embedding);
            if let (Some(x), Some(y)) = (projected.get(&x_axis), projected.get(&y_axis)) {
                points.push(ScatterPoint {
                    x: round_to(*x, 4),
                    y: round_to(*y, 4),
                    score: result.score,
                    label: result.label,
                    period,
                    stage: STAGE_SENT.to_string(),
                });
            }
        }
        report_progress(progress, STAGE_SCATTER, done + 1, total);
    }

    Some(ScatterPayload {
        axes,
        sample_rate: rate,
        limit: ScatterLimit {
            max_messages: options.scatter_max_per_period,
            stage: STAGE_SENT.to_string(),
            interval: options.interval,
        },
        points,
    })
}

pub(crate) fn compute(
    ctx: &AnalysisContext<'_>,
    options: &SentimentOptions,
    progress: Option<&ProgressCallback>,
    metrics: &MetricsCollector,
) -> SentimentSection {
    let sent_messages = with_text(&ctx.sent);
    let received_messages = with_text(&ctx.received);

    let sent = score_stage(&sent_messages, STAGE_SENT, options, progress, metrics);
    let received = score_stage(&received_messages, STAGE_RECEIVED, options, progress, metrics);
    let mut overall = sent.clone();
    overall.merge(&received);

    let scatter = options
        .engine
        .analyzer()
        .as_embedding()
        .and_then(|embedder| scatter(&sent_messages, embedder, options, progress));

    let overall_summary = overall.summary();
    SentimentSection {
        backend: options.engine.report().clone(),
        sample_rate: options.engine.sample_rate(),
        interval: options.interval,
        overall_score: overall_summary.avg_score,
        positive_percentage: overall_summary.positive_percentage,
        neutral_percentage: overall_summary.neutral_percentage,
        negative_percentage: overall_summary.negative_percentage,
        periods: PeriodSeries {
            overall: overall.series(),
            sent: sent.series(),
            received: received.series(),
        },
        overall: overall_summary,
        sent: sent.summary(),
        received: received.summary(),
        scatter,
    }
}
