//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::io::Write;

use chrono::{DateTime, Utc};
use imessage_wrapped_rust::models::{Conversation, ExportData, Message, Tapback, TapbackKind, ME};

/// Parse an RFC 3339 timestamp
pub fn ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
}

/// Message sent by the user
pub fn sent(guid: &str, at: &str, text: &str) -> Message {
    message(guid, at, true, Some(text))
}

/// Message received from the other party
pub fn received(guid: &str, at: &str, text: &str) -> Message {
    message(guid, at, false, Some(text))
}

pub fn message(guid: &str, at: &str, from_me: bool, text: Option<&str>) -> Message {
    Message {
        id: 0,
        guid: guid.to_string(),
        timestamp: ts(at),
        is_from_me: from_me,
        sender: if from_me { ME.to_string() } else { "contact".to_string() },
        text: text.map(str::to_string),
        service: "iMessage".to_string(),
        has_attachment: false,
        date_read_after_seconds: None,
        tapbacks: Vec::new(),
        is_context_only: false,
    }
}

pub fn tapback(kind: TapbackKind, by: &str) -> Tapback {
    Tapback {
        kind,
        by: by.to_string(),
    }
}

pub fn conversation(id: &str, messages: Vec<Message>) -> Conversation {
    Conversation {
        chat_identifier: id.to_string(),
        display_name: None,
        participants: vec![id.to_string()],
        is_group_chat: false,
        messages,
    }
}

pub fn group_chat(id: &str, name: &str, messages: Vec<Message>) -> Conversation {
    Conversation {
        chat_identifier: id.to_string(),
        display_name: Some(name.to_string()),
        participants: vec!["p1".to_string(), "p2".to_string()],
        is_group_chat: true,
        messages,
    }
}

/// Export for 2024 holding `conversations`
pub fn export(conversations: Vec<Conversation>) -> ExportData {
    let mut data = ExportData::new(2024, ts("2025-01-02T00:00:00Z"));
    for conversation in conversations {
        data.insert(conversation);
    }
    data
}

/// Two-way chat that passes the default filters
pub fn friendly_chat(id: &str, day: &str) -> Conversation {
    conversation(
        id,
        vec![
            sent(&format!("{id}-1"), &format!("{day}T09:00:00Z"), "good morning!"),
            received(&format!("{id}-2"), &format!("{day}T09:02:00Z"), "morning, coffee later?"),
            sent(&format!("{id}-3"), &format!("{day}T09:03:00Z"), "yes, see you at ten"),
        ],
    )
}

/// Write `body` to a temp file with the given suffix
pub fn temp_file(suffix: &str, body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}
