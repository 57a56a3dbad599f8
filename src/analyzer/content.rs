//! Text statistics over the user's and their contacts' messages, plus the
//! phrase and sentiment summaries.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::sentiment_stats::{self, SentimentSection};
use super::{AnalysisContext, ProgressCallback, SentimentOptions};
use crate::metrics::MetricsCollector;
use crate::models::Message;
use crate::phrases::{ContactPhraseStats, PhraseExtractionConfig, PhraseExtractor, PhraseStat};
use crate::utils::{percentage, round_to};

const TOP_EMOJIS: usize = 10;
const DOUBLE_TEXT_WINDOW_SECS: i64 = 300;

#[allow(clippy::unwrap_used)]
static EMOJI_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Regional_Indicator}{2}|\p{Extended_Pictographic}").unwrap());

#[allow(clippy::unwrap_used)]
static PUNCTUATION_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[.!?,;:\-'"()]"#).unwrap());

#[allow(clippy::unwrap_used)]
static LINK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://").unwrap());

/// Modifiers and joiners that never count as an emoji on their own
fn is_excluded_emoji(emoji: &str) -> bool {
    emoji.chars().any(|c| {
        matches!(c,
            '\u{1F3FB}'..='\u{1F3FF}' | '\u{2640}' | '\u{2642}' | '\u{FE0F}' | '\u{200D}' | '\u{FFFC}')
    })
}

/// One row of the emoji leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmojiCount {
    pub emoji: String,
    pub count: usize,
}

/// A ranked phrase as rendered in the document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhraseEntry {
    pub phrase: String,
    pub text: String,
    pub occurrences: usize,
    pub share: f64,
}

impl From<PhraseStat> for PhraseEntry {
    fn from(stat: PhraseStat) -> Self {
        Self {
            phrase: stat.text.clone(),
            text: stat.text,
            occurrences: stat.occurrences,
            share: stat.share,
        }
    }
}

/// The user's signature phrases
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhraseSummary {
    pub overall: Vec<PhraseEntry>,
    pub analyzed_messages: usize,
    pub config: PhraseExtractionConfig,
}

/// Message content statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentStats {
    pub avg_message_length_sent: f64,
    pub avg_message_length_received: f64,
    pub avg_punctuation_sent: f64,
    pub avg_punctuation_received: f64,
    pub most_used_emojis: Vec<EmojiCount>,
    pub questions_asked: usize,
    pub exclamations_sent: usize,
    pub enthusiasm_percentage: f64,
    pub question_percentage: f64,
    pub links_shared: usize,
    pub link_percentage: f64,
    pub attachments_sent: usize,
    pub attachments_received: usize,
    pub double_text_count: usize,
    pub double_text_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phrases: Option<PhraseSummary>,
    #[serde(rename = "_phrases_by_contact", skip_serializing_if = "Vec::is_empty")]
    pub phrases_by_contact: Vec<ContactPhraseStats>,
}

fn texts<'a>(messages: &[&'a Message]) -> Vec<&'a str> {
    messages
        .iter()
        .map(|m| m.text_or_empty())
        .filter(|t| !t.is_empty())
        .collect()
}

fn average(values: impl Iterator<Item = usize>) -> f64 {
    let (sum, count) = values.fold((0_usize, 0_usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        round_to(sum as f64 / count as f64, 2)
    }
}

fn top_emojis(sent_texts: &[&str]) -> Vec<EmojiCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for text in sent_texts {
        for found in EMOJI_REGEX.find_iter(text) {
            let emoji = found.as_str();
            if !is_excluded_emoji(emoji) {
                *counts.entry(emoji).or_insert(0) += 1;
            }
        }
    }
    let mut ranked: Vec<EmojiCount> = counts
        .into_iter()
        .map(|(emoji, count)| EmojiCount {
            emoji: emoji.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.emoji.cmp(&b.emoji)));
    ranked.truncate(TOP_EMOJIS);
    ranked
}

/// Bursts of two or more of the user's messages, each within five minutes
/// of the previous and uninterrupted by anyone else
pub(crate) fn count_double_texts(ctx: &AnalysisContext<'_>) -> usize {
    let mut bursts = 0;
    for conversation in &ctx.conversations {
        let mut run = 0_usize;
        let mut last_sent = None;
        for message in conversation.year_messages(ctx.year) {
            if !message.is_from_me {
                if run >= 2 {
                    bursts += 1;
                }
                run = 0;
                last_sent = None;
                continue;
            }
            let continues = last_sent.is_some_and(|prev: chrono::DateTime<chrono::Utc>| {
                (message.timestamp - prev).num_seconds() < DOUBLE_TEXT_WINDOW_SECS
            });
            if continues {
                run += 1;
            } else {
                if run >= 2 {
                    bursts += 1;
                }
                run = 1;
            }
            last_sent = Some(message.timestamp);
        }
        if run >= 2 {
            bursts += 1;
        }
    }
    bursts
}

fn phrases(
    ctx: &AnalysisContext<'_>,
    extractor: &PhraseExtractor,
    sent_texts: &[&str],
    metrics: &MetricsCollector,
) -> (Option<PhraseSummary>, Vec<ContactPhraseStats>) {
    let mut per_contact: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut names: HashMap<String, String> = HashMap::new();
    for conversation in &ctx.conversations {
        let own: Vec<String> = conversation
            .messages
            .iter()
            .filter(|m| m.is_from_me && m.is_in_year(ctx.year))
            .map(|m| m.text_or_empty())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if own.is_empty() {
            continue;
        }
        if let Some(name) = conversation.display_name.as_ref().filter(|n| !n.is_empty()) {
            names.insert(conversation.chat_identifier.clone(), name.clone());
        }
        per_contact.insert(conversation.chat_identifier.clone(), own);
    }

    let result = extractor.extract(sent_texts, Some(&per_contact), Some(&names));
    metrics.record_phrases("overall", result.overall.len());
    metrics.record_phrases(
        "contact",
        result.by_contact.iter().map(|c| c.top_phrases.len()).sum(),
    );

    let summary = (!result.overall.is_empty()).then(|| PhraseSummary {
        overall: result.overall.into_iter().map(PhraseEntry::from).collect(),
        analyzed_messages: result.analyzed_messages,
        config: result.config,
    });
    (summary, result.by_contact)
}

pub(crate) fn compute(
    ctx: &AnalysisContext<'_>,
    extractor: &PhraseExtractor,
    sentiment: Option<&SentimentOptions>,
    progress: Option<&ProgressCallback>,
    metrics: &MetricsCollector,
) -> ContentStats {
    let sent_texts = texts(&ctx.sent);
    let received_texts = texts(&ctx.received);

    let questions_asked = sent_texts.iter().filter(|t| t.contains('?')).count();
    let exclamations_sent = sent_texts.iter().filter(|t| t.contains('!')).count();
    let links_shared = sent_texts.iter().filter(|t| LINK_REGEX.is_match(t)).count();
    let with_text = sent_texts.len() as f64;

    let double_text_count = count_double_texts(ctx);
    let (phrases, phrases_by_contact) = phrases(ctx, extractor, &sent_texts, metrics);

    ContentStats {
        avg_message_length_sent: average(sent_texts.iter().map(|t| t.chars().count())),
        avg_message_length_received: average(received_texts.iter().map(|t| t.chars().count())),
        avg_punctuation_sent: average(sent_texts.iter().map(|t| PUNCTUATION_REGEX.find_iter(t).count())),
        avg_punctuation_received: average(
            received_texts
                .iter()
                .map(|t| PUNCTUATION_REGEX.find_iter(t).count()),
        ),
        most_used_emojis: top_emojis(&sent_texts),
        questions_asked,
        exclamations_sent,
        enthusiasm_percentage: percentage(exclamations_sent as f64, with_text),
        question_percentage: percentage(questions_asked as f64, with_text),
        links_shared,
        link_percentage: percentage(links_shared as f64, with_text),
        attachments_sent: ctx.sent.iter().filter(|m| m.has_attachment).count(),
        attachments_received: ctx.received.iter().filter(|m| m.has_attachment).count(),
        double_text_count,
        double_text_percentage: percentage(double_text_count as f64, ctx.sent.len() as f64),
        sentiment: sentiment.map(|options| sentiment_stats::compute(ctx, options, progress, metrics)),
        phrases,
        phrases_by_contact,
    }
}
