//! Statistics orchestrator.
//!
//! [`StatisticsAnalyzer::analyze`] filters conversations once, flattens the
//! survivors into sorted in-year message streams, and computes each section
//! from that shared [`AnalysisContext`]. Sections are pure functions of the
//! context; only the content section calls out to phrase extraction and
//! sentiment scoring.

pub mod contacts;
pub mod content;
pub mod conversations;
pub mod ghosts;
pub mod response_times;
pub mod sentiment_stats;
pub mod streaks;
pub mod tapbacks;
pub mod temporal;
pub mod volume;

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::Result;
use crate::filters::{self, ConversationFilter};
use crate::ghost::GhostConfig;
use crate::logging::OperationTimer;
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::models::{sort_chronologically, Conversation, ExportData, Message};
use crate::phrases::{PhraseExtractionConfig, PhraseExtractor};
use crate::sentiment::{SentimentEngine, SentimentInterval, SentimentSettings};
use crate::stopwords::{self, StopwordSet, StopwordSource};

pub use contacts::ContactsStats;
pub use content::ContentStats;
pub use conversations::ConversationStats;
pub use ghosts::GhostSection;
pub use response_times::ResponseTimeStats;
pub use sentiment_stats::SentimentSection;
pub use streaks::StreakStats;
pub use tapbacks::TapbackStats;
pub use temporal::TemporalStats;
pub use volume::VolumeStats;

/// Progress hook: (stage, completed, total). Errors are logged and ignored.
pub type ProgressCallback = Box<dyn Fn(&str, usize, usize) -> anyhow::Result<()> + Send + Sync>;

/// The complete statistics document
#[derive(Debug, Clone, Serialize)]
pub struct WrappedStatistics {
    pub volume: VolumeStats,
    pub temporal: TemporalStats,
    pub contacts: ContactsStats,
    pub content: ContentStats,
    pub conversations: ConversationStats,
    pub response_times: ResponseTimeStats,
    pub tapbacks: TapbackStats,
    pub streaks: StreakStats,
    pub ghosts: GhostSection,
}

/// Filtered, flattened view of one export shared by all sections
#[derive(Debug)]
pub struct AnalysisContext<'a> {
    /// Target year
    pub year: i32,
    /// Conversations that passed every filter, in chat-identifier order
    pub conversations: Vec<&'a Conversation>,
    /// In-year messages of those conversations, chronological
    pub messages: Vec<&'a Message>,
    /// Subset sent by the user
    pub sent: Vec<&'a Message>,
    /// Subset received by the user
    pub received: Vec<&'a Message>,
}

impl<'a> AnalysisContext<'a> {
    /// Apply `filters` and flatten the export
    #[must_use]
    pub fn build(export: &'a ExportData, filters: &[Box<dyn ConversationFilter>]) -> Self {
        let year = export.year;
        let conversations: Vec<&'a Conversation> = export
            .conversations
            .values()
            .filter(|c| filters::passes_all(filters, c, year))
            .collect();

        let mut messages: Vec<&'a Message> = conversations
            .iter()
            .flat_map(|c| c.messages.iter())
            .filter(|m| m.is_in_year(year))
            .collect();
        sort_chronologically(&mut messages);

        let (sent, received): (Vec<&'a Message>, Vec<&'a Message>) =
            messages.iter().copied().partition(|m| m.is_from_me);

        Self {
            year,
            conversations,
            messages,
            sent,
            received,
        }
    }
}

/// Sentiment settings resolved for an analyzer
#[derive(Debug)]
pub struct SentimentOptions {
    /// Resolved backend
    pub engine: SentimentEngine,
    /// Trend granularity
    pub interval: SentimentInterval,
    /// Scatter points kept per period
    pub scatter_max_per_period: usize,
}

/// Computes [`WrappedStatistics`] from an export
pub struct StatisticsAnalyzer {
    extractor: PhraseExtractor,
    sentiment: Option<SentimentOptions>,
    ghost: GhostConfig,
    filters: Vec<Box<dyn ConversationFilter>>,
    reference_time: Option<DateTime<Utc>>,
    progress: Option<ProgressCallback>,
    metrics: MetricsCollector,
}

impl fmt::Debug for StatisticsAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatisticsAnalyzer")
            .field("extractor", &self.extractor)
            .field("sentiment", &self.sentiment)
            .field("ghost", &self.ghost)
            .field("filters", &self.filters.iter().map(|f| f.name()).collect::<Vec<_>>())
            .field("reference_time", &self.reference_time)
            .finish_non_exhaustive()
    }
}

impl Default for StatisticsAnalyzer {
    fn default() -> Self {
        Self::new(PhraseExtractionConfig::default(), stopwords::english(StopwordSource::Bundled))
    }
}

impl StatisticsAnalyzer {
    /// Analyzer with the lexical sentiment backend, a 7-day ghost timeline
    /// and the default conversation filters
    #[must_use]
    pub fn new(phrase_config: PhraseExtractionConfig, stopwords: StopwordSet) -> Self {
        Self {
            extractor: PhraseExtractor::with_stopwords(phrase_config, stopwords),
            sentiment: Some(SentimentOptions {
                engine: SentimentEngine::resolve(&SentimentSettings::default()),
                interval: SentimentInterval::Month,
                scatter_max_per_period: 25,
            }),
            ghost: GhostConfig::default(),
            filters: filters::default_filters(),
            reference_time: None,
            progress: None,
            metrics: MetricsCollector::default(),
        }
    }

    /// Build everything from application configuration.
    ///
    /// Environment-style sentiment overrides are read through `env_lookup`.
    pub fn from_config<F>(config: &AppConfig, env_lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        config.validate()?;
        let phrase_config = config.phrases.to_extraction_config()?;
        let stopwords = stopwords::english(config.phrases.stopwords);

        let sentiment = if config.sentiment.enabled {
            let settings = config.sentiment.to_settings().with_env_lookup(env_lookup);
            settings.validate()?;
            Some(SentimentOptions {
                engine: SentimentEngine::resolve(&settings),
                interval: config.sentiment.interval()?,
                scatter_max_per_period: config.sentiment.scatter_max_per_period,
            })
        } else {
            None
        };

        let filters = filters::configured_filters(
            config.filters.max_received_ratio,
            config.filters.min_sent_messages,
        )?;

        Ok(Self {
            extractor: PhraseExtractor::with_stopwords(phrase_config, stopwords),
            sentiment,
            ghost: config.ghosts.to_ghost_config()?,
            filters,
            reference_time: None,
            progress: None,
            metrics: MetricsCollector::default(),
        })
    }

    /// Replace the conversation filter chain
    #[must_use]
    pub fn with_filters(mut self, filters: Vec<Box<dyn ConversationFilter>>) -> Self {
        self.filters = filters;
        self
    }

    /// Replace the sentiment options (`None` disables the sentiment summary)
    #[must_use]
    pub fn with_sentiment(mut self, sentiment: Option<SentimentOptions>) -> Self {
        self.sentiment = sentiment;
        self
    }

    /// Replace the ghost settings
    #[must_use]
    pub const fn with_ghost_config(mut self, ghost: GhostConfig) -> Self {
        self.ghost = ghost;
        self
    }

    /// Pin "now" for ghost detection
    #[must_use]
    pub const fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = Some(reference_time);
        self
    }

    /// Install a progress hook for sentiment scoring
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Active phrase configuration
    #[must_use]
    pub const fn phrase_config(&self) -> &PhraseExtractionConfig {
        self.extractor.config()
    }

    /// Active sentiment options
    #[must_use]
    pub const fn sentiment(&self) -> Option<&SentimentOptions> {
        self.sentiment.as_ref()
    }

    /// Compute every statistics section for `export`
    pub fn analyze(&self, export: &ExportData) -> WrappedStatistics {
        let started = Instant::now();
        let run_timer = OperationTimer::new("analyze");
        info!(
            year = export.year,
            conversations = export.conversations.len(),
            messages = export.total_messages(),
            "Starting analysis"
        );

        let ctx = AnalysisContext::build(export, &self.filters);
        let filtered_out = export.conversations.len() - ctx.conversations.len();
        debug!(
            kept = ctx.conversations.len(),
            filtered_out,
            in_year_messages = ctx.messages.len(),
            "Conversations filtered"
        );

        let volume = self.timed("volume", || volume::compute(&ctx));
        let temporal = self.timed("temporal", || temporal::compute(&ctx));
        let contacts = self.timed("contacts", || contacts::compute(&ctx));
        let content = self.timed("content", || {
            content::compute(
                &ctx,
                &self.extractor,
                self.sentiment.as_ref(),
                self.progress.as_ref(),
                &self.metrics,
            )
        });
        let conversations = self.timed("conversations", || conversations::compute(&ctx));
        let response_times = self.timed("response_times", || response_times::compute(&ctx));
        let tapbacks = self.timed("tapbacks", || tapbacks::compute(&ctx));
        let streaks = self.timed("streaks", || streaks::compute(&ctx));
        let ghosts = self.timed("ghosts", || ghosts::compute(&ctx, &self.ghost, self.reference_time));

        self.metrics
            .record_analyze_run(started.elapsed(), ctx.conversations.len(), filtered_out);
        run_timer.finish();

        WrappedStatistics {
            volume,
            temporal,
            contacts,
            content,
            conversations,
            response_times,
            tapbacks,
            streaks,
            ghosts,
        }
    }

    /// Like [`analyze`](Self::analyze), rendered as a JSON value
    pub fn analyze_value(&self, export: &ExportData) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.analyze(export))?)
    }

    fn timed<T>(&self, section: &'static str, compute: impl FnOnce() -> T) -> T {
        let timer = MetricsTimer::new(self.metrics.clone(), section);
        let value = compute();
        let elapsed = timer.finish();
        debug!(section, duration_ms = elapsed.as_millis(), "Section computed");
        value
    }
}

/// Invoke the progress hook, logging and swallowing its failures
pub(crate) fn report_progress(
    progress: Option<&ProgressCallback>,
    stage: &str,
    completed: usize,
    total: usize,
) {
    if let Some(callback) = progress {
        if let Err(e) = callback(stage, completed, total) {
            debug!(stage, completed, total, error = %e, "Progress callback failed");
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Utc};

    use super::AnalysisContext;
    use crate::models::{Conversation, ExportData, Message, Tapback, TapbackKind, ME};

    pub fn ts(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    pub fn msg(guid: &str, at: &str, from_me: bool, text: Option<&str>) -> Message {
        Message {
            id: 0,
            guid: guid.to_string(),
            timestamp: ts(at),
            is_from_me: from_me,
            sender: if from_me { ME.to_string() } else { "them".to_string() },
            text: text.map(str::to_string),
            service: "iMessage".to_string(),
            has_attachment: false,
            date_read_after_seconds: None,
            tapbacks: Vec::new(),
            is_context_only: false,
        }
    }

    pub fn with_tapbacks(mut message: Message, tapbacks: &[(TapbackKind, &str)]) -> Message {
        message.tapbacks = tapbacks
            .iter()
            .map(|(kind, by)| Tapback {
                kind: *kind,
                by: (*by).to_string(),
            })
            .collect();
        message
    }

    pub fn one_on_one(id: &str, messages: Vec<Message>) -> Conversation {
        Conversation {
            chat_identifier: id.to_string(),
            display_name: None,
            participants: vec![id.to_string()],
            is_group_chat: false,
            messages,
        }
    }

    pub fn group(id: &str, name: &str, messages: Vec<Message>) -> Conversation {
        Conversation {
            chat_identifier: id.to_string(),
            display_name: Some(name.to_string()),
            participants: vec!["p1".to_string(), "p2".to_string()],
            is_group_chat: true,
            messages,
        }
    }

    pub fn export(conversations: Vec<Conversation>) -> ExportData {
        let mut data = ExportData::new(2024, ts("2025-01-02T00:00:00Z"));
        for conversation in conversations {
            data.insert(conversation);
        }
        data
    }

    /// Run `f` over an unfiltered context
    pub fn context_for<T>(data: &ExportData, f: impl FnOnce(&AnalysisContext<'_>) -> T) -> T {
        let ctx = AnalysisContext::build(data, &[]);
        f(&ctx)
    }
}
