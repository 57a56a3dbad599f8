//! Conversation filters applied before any statistics are computed.
//!
//! A filter is a predicate over (conversation, year). The analyzer keeps a
//! conversation only if every filter in its chain keeps it.

use std::fmt;

use crate::error::{Result, WrappedError};
use crate::models::Conversation;

/// Predicate deciding whether a conversation takes part in the statistics
pub trait ConversationFilter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// True to keep `conversation` when analyzing `year`
    fn keep(&self, conversation: &Conversation, year: i32) -> bool;
}

fn in_year_counts(conversation: &Conversation, year: i32) -> (usize, usize) {
    conversation
        .messages
        .iter()
        .filter(|m| m.is_in_year(year))
        .fold((0, 0), |(sent, received), m| {
            if m.is_from_me {
                (sent + 1, received)
            } else {
                (sent, received + 1)
            }
        })
}

/// Drops spam-like threads where received messages dwarf sent ones
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReciprocityFilter {
    max_received_ratio: f64,
}

impl ReciprocityFilter {
    /// Drop when `received / sent > max_received_ratio` (and total >= 2)
    pub fn new(max_received_ratio: f64) -> Result<Self> {
        if !max_received_ratio.is_finite() || max_received_ratio <= 0.0 {
            return Err(WrappedError::InvalidConfig(format!(
                "max_received_ratio must be a positive number, got {max_received_ratio}"
            )));
        }
        Ok(Self { max_received_ratio })
    }
}

impl Default for ReciprocityFilter {
    fn default() -> Self {
        Self {
            max_received_ratio: 9.0,
        }
    }
}

impl ConversationFilter for ReciprocityFilter {
    fn name(&self) -> &str {
        "reciprocity"
    }

    fn keep(&self, conversation: &Conversation, year: i32) -> bool {
        let (sent, received) = in_year_counts(conversation, year);
        if sent + received < 2 {
            return true;
        }
        if sent == 0 {
            return false;
        }
        received as f64 / sent as f64 <= self.max_received_ratio
    }
}

/// Drops threads where the user replied fewer than `min_sent` times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinSentFilter {
    min_sent: usize,
}

impl MinSentFilter {
    /// Keep conversations with at least `min_sent` in-year messages from the user
    #[must_use]
    pub const fn new(min_sent: usize) -> Self {
        Self { min_sent }
    }
}

impl Default for MinSentFilter {
    fn default() -> Self {
        Self::new(2)
    }
}

impl ConversationFilter for MinSentFilter {
    fn name(&self) -> &str {
        "min_sent"
    }

    fn keep(&self, conversation: &Conversation, year: i32) -> bool {
        in_year_counts(conversation, year).0 >= self.min_sent
    }
}

/// Adapts a closure into a filter
pub struct FnFilter<F> {
    name: String,
    predicate: F,
}

impl<F> FnFilter<F>
where
    F: Fn(&Conversation, i32) -> bool + Send + Sync,
{
    /// Named closure filter
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

impl<F> fmt::Debug for FnFilter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFilter").field("name", &self.name).finish()
    }
}

impl<F> ConversationFilter for FnFilter<F>
where
    F: Fn(&Conversation, i32) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn keep(&self, conversation: &Conversation, year: i32) -> bool {
        (self.predicate)(conversation, year)
    }
}

/// The standard chain: reciprocity, then minimum replies
#[must_use]
pub fn default_filters() -> Vec<Box<dyn ConversationFilter>> {
    vec![
        Box::new(ReciprocityFilter::default()),
        Box::new(MinSentFilter::default()),
    ]
}

/// Chain built from configured thresholds
pub fn configured_filters(
    max_received_ratio: f64,
    min_sent_messages: usize,
) -> Result<Vec<Box<dyn ConversationFilter>>> {
    Ok(vec![
        Box::new(ReciprocityFilter::new(max_received_ratio)?),
        Box::new(MinSentFilter::new(min_sent_messages)),
    ])
}

/// True when every filter keeps the conversation
#[must_use]
pub fn passes_all(filters: &[Box<dyn ConversationFilter>], conversation: &Conversation, year: i32) -> bool {
    filters.iter().all(|f| {
        let keep = f.keep(conversation, year);
        if !keep {
            tracing::debug!(
                filter = f.name(),
                conversation = %conversation.chat_identifier,
                "Conversation filtered out"
            );
        }
        keep
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Message, ME};
    use chrono::{TimeZone, Utc};

    fn conversation(sent: usize, received: usize) -> Conversation {
        let mut messages = Vec::new();
        for i in 0..sent + received {
            let from_me = i < sent;
            messages.push(Message {
                id: i as i64,
                guid: format!("g{i}"),
                timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
                is_from_me: from_me,
                sender: if from_me { ME.to_string() } else { "bob".to_string() },
                text: None,
                service: "SMS".to_string(),
                has_attachment: false,
                date_read_after_seconds: None,
                tapbacks: Vec::new(),
                is_context_only: false,
            });
        }
        Conversation {
            chat_identifier: "bob".to_string(),
            display_name: None,
            participants: vec!["bob".to_string()],
            is_group_chat: false,
            messages,
        }
    }

    #[test]
    fn test_reciprocity_boundary() {
        let filter = ReciprocityFilter::default();
        assert!(filter.keep(&conversation(1, 9), 2024));
        assert!(!filter.keep(&conversation(1, 10), 2024));
        assert!(!filter.keep(&conversation(0, 2), 2024));
        assert!(filter.keep(&conversation(0, 1), 2024));
    }

    #[test]
    fn test_min_sent() {
        let filter = MinSentFilter::default();
        assert!(!filter.keep(&conversation(1, 1), 2024));
        assert!(filter.keep(&conversation(2, 0), 2024));
        assert!(!filter.keep(&conversation(2, 0), 2023));
    }

    #[test]
    fn test_invalid_ratio() {
        assert!(ReciprocityFilter::new(0.0).is_err());
        assert!(ReciprocityFilter::new(f64::NAN).is_err());
    }

    #[test]
    fn test_closure_filter_in_chain() {
        let mut chain = default_filters();
        chain.push(Box::new(FnFilter::new("not_bob", |c: &Conversation, _| {
            c.chat_identifier != "bob"
        })));
        assert!(!passes_all(&chain, &conversation(5, 5), 2024));
        assert!(passes_all(&default_filters(), &conversation(5, 5), 2024));
    }
}
