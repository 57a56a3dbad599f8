//! Ghosting detection: who was left without a reply, and by whom.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::{Result, WrappedError};
use crate::models::{Conversation, Message};

/// Validated ghost detection settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostConfig {
    timeline: Duration,
    include_group_chats: bool,
}

impl GhostConfig {
    /// Settings with a silence threshold of `timeline`
    pub fn new(timeline: Duration, include_group_chats: bool) -> Result<Self> {
        if timeline <= Duration::zero() {
            return Err(WrappedError::InvalidConfig(format!(
                "ghost timeline must be positive, got {}s",
                timeline.num_seconds()
            )));
        }
        Ok(Self {
            timeline,
            include_group_chats,
        })
    }

    /// Settings with a threshold in whole days
    pub fn from_days(days: i64, include_group_chats: bool) -> Result<Self> {
        if days <= 0 {
            return Err(WrappedError::InvalidConfig(format!(
                "ghost timeline_days must be positive, got {days}"
            )));
        }
        Self::new(Duration::days(days), include_group_chats)
    }

    /// Silence threshold
    #[must_use]
    pub const fn timeline(&self) -> Duration {
        self.timeline
    }

    /// Whether group chats are scanned
    #[must_use]
    pub const fn include_group_chats(&self) -> bool {
        self.include_group_chats
    }
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            timeline: Duration::days(7),
            include_group_chats: false,
        }
    }
}

/// Ghosting events per contact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GhostStats {
    /// Silence threshold
    #[serde(skip)]
    pub timeline: Duration,
    /// Stand-in for "the next reply" when none exists
    pub reference_time: DateTime<Utc>,
    /// Contact -> inbound message the user never answered in time
    pub you_ghosted: BTreeMap<String, DateTime<Utc>>,
    /// Contact -> user message that never got a timely answer
    pub ghosted_you: BTreeMap<String, DateTime<Utc>>,
}

impl GhostStats {
    /// Scan `conversations` for in-year ghosting events.
    ///
    /// `reference_time` defaults to now.
    pub fn compute<'a, I>(
        conversations: I,
        year: i32,
        config: &GhostConfig,
        reference_time: Option<DateTime<Utc>>,
    ) -> Self
    where
        I: IntoIterator<Item = &'a Conversation>,
    {
        let mut stats = Self {
            timeline: config.timeline,
            reference_time: reference_time.unwrap_or_else(Utc::now),
            you_ghosted: BTreeMap::new(),
            ghosted_you: BTreeMap::new(),
        };

        for conversation in conversations {
            if conversation.is_group_chat && !config.include_group_chats {
                continue;
            }
            let messages = conversation.year_messages(year);
            if messages.is_empty() {
                continue;
            }

            let (unanswered_inbound, unanswered_outbound) =
                classify(&messages, config.timeline, stats.reference_time);
            if let Some(ts) = unanswered_inbound {
                stats
                    .you_ghosted
                    .entry(conversation.chat_identifier.clone())
                    .or_insert(ts);
            }
            if let Some(ts) = unanswered_outbound {
                stats
                    .ghosted_you
                    .entry(conversation.chat_identifier.clone())
                    .or_insert(ts);
            }
        }

        stats
    }

    /// Contacts the user left hanging
    #[must_use]
    pub fn ghosts(&self) -> usize {
        self.you_ghosted.len()
    }

    /// Contacts who left the user hanging
    #[must_use]
    pub fn ghostees(&self) -> usize {
        self.ghosted_you.len()
    }

    /// `ghosts / ghostees`, or `None` when nobody ghosted the user
    #[must_use]
    pub fn ghost_ratio(&self) -> Option<f64> {
        (self.ghostees() > 0).then(|| self.ghosts() as f64 / self.ghostees() as f64)
    }
}

/// Newest-first scan returning (latest unanswered inbound, latest unanswered outbound)
fn classify(
    messages: &[&Message],
    timeline: Duration,
    reference_time: DateTime<Utc>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let mut unanswered_inbound = None;
    let mut unanswered_outbound = None;
    let mut next_from_me: Option<DateTime<Utc>> = None;
    let mut next_from_them: Option<DateTime<Utc>> = None;

    for message in messages.iter().rev() {
        if message.is_from_me {
            if unanswered_outbound.is_none() {
                unanswered_outbound = gap_exceeds(message.timestamp, next_from_them, reference_time, timeline);
            }
            next_from_me = Some(message.timestamp);
        } else {
            if unanswered_inbound.is_none() {
                unanswered_inbound = gap_exceeds(message.timestamp, next_from_me, reference_time, timeline);
            }
            next_from_them = Some(message.timestamp);
        }

        if unanswered_inbound.is_some() && unanswered_outbound.is_some() {
            break;
        }
    }

    (unanswered_inbound, unanswered_outbound)
}

fn gap_exceeds(
    candidate: DateTime<Utc>,
    next_response: Option<DateTime<Utc>>,
    fallback: DateTime<Utc>,
    timeline: Duration,
) -> Option<DateTime<Utc>> {
    let response = next_response.unwrap_or(fallback);
    (response - candidate > timeline).then_some(candidate)
}
