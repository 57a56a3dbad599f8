use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Metrics collection and management
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    // Run metrics
    pub analyze_runs_total: &'static str,
    pub analyze_duration: &'static str,
    pub section_duration: &'static str,
    pub conversations_analyzed: &'static str,
    pub conversations_filtered_total: &'static str,

    // Phrase metrics
    pub phrases_kept_total: &'static str,

    // Sentiment metrics
    pub sentiment_messages_scored_total: &'static str,
    pub sentiment_scores: &'static str,
    pub sentiment_backend_downgrades_total: &'static str,

    // Error metrics
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            analyze_runs_total: "imessage_wrapped_analyze_runs_total",
            analyze_duration: "imessage_wrapped_analyze_duration_seconds",
            section_duration: "imessage_wrapped_section_duration_seconds",
            conversations_analyzed: "imessage_wrapped_conversations_analyzed",
            conversations_filtered_total: "imessage_wrapped_conversations_filtered_total",

            phrases_kept_total: "imessage_wrapped_phrases_kept_total",

            sentiment_messages_scored_total: "imessage_wrapped_sentiment_messages_scored_total",
            sentiment_scores: "imessage_wrapped_sentiment_scores",
            sentiment_backend_downgrades_total: "imessage_wrapped_sentiment_backend_downgrades_total",

            errors_total: "imessage_wrapped_errors_total",
        }
    }
}

impl MetricsCollector {
    /// Record a completed `analyze` run
    pub fn record_analyze_run(&self, duration: Duration, conversations: usize, filtered_out: usize) {
        counter!(self.analyze_runs_total).increment(1);
        histogram!(self.analyze_duration).record(duration.as_secs_f64());
        gauge!(self.conversations_analyzed).set(conversations as f64);
        counter!(self.conversations_filtered_total).increment(filtered_out as u64);
    }

    /// Record how long one statistics section took
    pub fn record_section(&self, section: &'static str, duration: Duration) {
        histogram!(self.section_duration, "section" => section).record(duration.as_secs_f64());
    }

    /// Record phrases kept by the extractor
    pub fn record_phrases(&self, scope: &'static str, kept: usize) {
        counter!(self.phrases_kept_total, "scope" => scope).increment(kept as u64);
    }

    /// Record one scored message
    pub fn record_sentiment_score(&self, stage: &str, backend: &'static str, score: f64) {
        counter!(
            self.sentiment_messages_scored_total,
            "stage" => stage.to_owned(),
            "backend" => backend
        )
        .increment(1);
        histogram!(self.sentiment_scores, "backend" => backend).record(score);
    }

    /// Record a fallback from one sentiment backend to another
    pub fn record_backend_downgrade(&self, requested: &'static str, active: &'static str) {
        counter!(
            self.sentiment_backend_downgrades_total,
            "requested" => requested,
            "active" => active
        )
        .increment(1);
    }

    /// Record error metrics
    pub fn record_error(&self, error_type: &'static str, operation: &'static str) {
        counter!(self.errors_total, "type" => error_type, "operation" => operation).increment(1);
    }
}

/// Performance timing wrapper for section metrics
pub struct MetricsTimer {
    collector: MetricsCollector,
    section: &'static str,
    start: std::time::Instant,
}

impl MetricsTimer {
    pub fn new(collector: MetricsCollector, section: &'static str) -> Self {
        Self {
            collector,
            section,
            start: std::time::Instant::now(),
        }
    }

    pub fn finish(self) -> Duration {
        let duration = self.start.elapsed();
        self.collector.record_section(self.section, duration);
        duration
    }
}
