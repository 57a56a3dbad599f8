//! Data models for exported message histories
//!
//! This module contains the normalized export produced by the ingestion side
//! (conversations of messages with tapbacks) that every statistics section
//! consumes. All types are plain immutable snapshots; analysis never mutates them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Sender identifier used for messages and tapbacks authored by the export owner
pub const ME: &str = "Me";

/// Reaction type attached to a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TapbackKind {
    /// Heart
    Love,
    /// Thumbs up
    Like,
    /// Thumbs down
    Dislike,
    /// Ha ha
    Laugh,
    /// Double exclamation
    Emphasize,
    /// Question mark
    Question,
}

impl TapbackKind {
    /// Lowercase name used in the statistics document
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Love => "love",
            Self::Like => "like",
            Self::Dislike => "dislike",
            Self::Laugh => "laugh",
            Self::Emphasize => "emphasize",
            Self::Question => "question",
        }
    }
}

impl fmt::Display for TapbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reaction left on a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tapback {
    /// Reaction type
    #[serde(rename = "type")]
    pub kind: TapbackKind,
    /// Who reacted (`"Me"` for the export owner)
    pub by: String,
}

impl Tapback {
    /// True if the export owner left this reaction
    #[must_use]
    pub fn is_from_me(&self) -> bool {
        self.by == ME
    }
}

/// A single message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Source row identifier
    pub id: i64,
    /// Globally unique identifier, unique within an export
    pub guid: String,
    /// Timestamp when the message was sent
    pub timestamp: DateTime<Utc>,
    /// True if message was sent by the export owner
    pub is_from_me: bool,
    /// Sender identifier
    pub sender: String,
    /// Message text content
    #[serde(default)]
    pub text: Option<String>,
    /// Transport (iMessage, SMS, ...)
    #[serde(default = "default_service")]
    pub service: String,
    /// True if message carries at least one attachment
    #[serde(default)]
    pub has_attachment: bool,
    /// Seconds between delivery and read receipt
    #[serde(default)]
    pub date_read_after_seconds: Option<f64>,
    /// Reactions attached to this message
    #[serde(default)]
    pub tapbacks: Vec<Tapback>,
    /// Present for cross-year continuity only; excluded from in-year aggregates
    #[serde(default)]
    pub is_context_only: bool,
}

fn default_service() -> String {
    "iMessage".to_string()
}

impl Message {
    /// Message text, with missing payloads treated as empty
    #[must_use]
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// True if the message counts towards statistics for `year`
    #[must_use]
    pub fn is_in_year(&self, year: i32) -> bool {
        !self.is_context_only && self.timestamp.year() == year
    }
}

/// A chat thread with one or more participants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique chat identifier (phone number, email, or group id)
    pub chat_identifier: String,
    /// Optional display name
    #[serde(default)]
    pub display_name: Option<String>,
    /// Participant identifiers (excluding the export owner)
    #[serde(default)]
    pub participants: Vec<String>,
    /// True iff the chat has more than one participant
    #[serde(default)]
    pub is_group_chat: bool,
    /// Messages in arbitrary order
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Total number of messages, including context-only ones
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Display name, falling back to the chat identifier
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.chat_identifier)
    }

    /// In-year messages sorted by timestamp (guid breaks ties)
    #[must_use]
    pub fn year_messages(&self, year: i32) -> Vec<&Message> {
        let mut messages: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| m.is_in_year(year))
            .collect();
        sort_chronologically(&mut messages);
        messages
    }

    /// All messages, context-only included, sorted by timestamp
    #[must_use]
    pub fn sorted_messages(&self) -> Vec<&Message> {
        let mut messages: Vec<&Message> = self.messages.iter().collect();
        sort_chronologically(&mut messages);
        messages
    }
}

/// Sort message references by timestamp, then guid
pub fn sort_chronologically(messages: &mut [&Message]) {
    messages.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.guid.cmp(&b.guid))
    });
}

/// Root aggregate handed to the analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    /// When the export was generated
    pub export_date: DateTime<Utc>,
    /// Target year
    pub year: i32,
    /// Conversations keyed by chat identifier
    #[serde(default)]
    pub conversations: BTreeMap<String, Conversation>,
    /// Display name of the export owner
    #[serde(default)]
    pub owner_name: Option<String>,
}

impl ExportData {
    /// Create an empty export for `year`
    #[must_use]
    pub fn new(year: i32, export_date: DateTime<Utc>) -> Self {
        Self {
            export_date,
            year,
            conversations: BTreeMap::new(),
            owner_name: None,
        }
    }

    /// Insert a conversation keyed by its chat identifier
    pub fn insert(&mut self, conversation: Conversation) {
        self.conversations
            .insert(conversation.chat_identifier.clone(), conversation);
    }

    /// Total number of messages across all conversations
    #[must_use]
    pub fn total_messages(&self) -> usize {
        self.conversations.values().map(Conversation::message_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message(guid: &str, ts: DateTime<Utc>) -> Message {
        Message {
            id: 1,
            guid: guid.to_string(),
            timestamp: ts,
            is_from_me: true,
            sender: ME.to_string(),
            text: None,
            service: default_service(),
            has_attachment: false,
            date_read_after_seconds: None,
            tapbacks: Vec::new(),
            is_context_only: false,
        }
    }

    #[test]
    fn test_year_messages_excludes_context_and_other_years() {
        let mut context = message("c", Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        context.is_context_only = true;
        let conversation = Conversation {
            chat_identifier: "chat".to_string(),
            display_name: None,
            participants: vec!["alice".to_string()],
            is_group_chat: false,
            messages: vec![
                message("b", Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
                message("a", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                message("old", Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap()),
                context,
            ],
        };

        let guids: Vec<&str> = conversation
            .year_messages(2024)
            .iter()
            .map(|m| m.guid.as_str())
            .collect();
        assert_eq!(guids, vec!["a", "b"]);
        assert_eq!(conversation.message_count(), 4);
    }

    #[test]
    fn test_label_falls_back_to_identifier() {
        let mut conversation = Conversation {
            chat_identifier: "+15550100".to_string(),
            display_name: Some(String::new()),
            participants: Vec::new(),
            is_group_chat: false,
            messages: Vec::new(),
        };
        assert_eq!(conversation.label(), "+15550100");
        conversation.display_name = Some("Alice".to_string());
        assert_eq!(conversation.label(), "Alice");
    }

    #[test]
    fn test_tapback_kind_serializes_lowercase() {
        let tapback = Tapback {
            kind: TapbackKind::Emphasize,
            by: ME.to_string(),
        };
        let json = serde_json::to_string(&tapback).unwrap();
        assert_eq!(json, r#"{"type":"emphasize","by":"Me"}"#);
        assert!(tapback.is_from_me());
    }
}
