use std::collections::HashSet;
use std::path::Path;

use chrono::{Datelike, Utc};

use crate::error::{Result, WrappedError};
use crate::models::ExportData;

/// Earliest year an export may target
const MIN_YEAR: i32 = 2000;

/// Validation utilities for export input and output paths
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Check the structural invariants of an export.
    ///
    /// Guids must be unique across the whole export, every map key must equal
    /// its conversation's chat identifier, and the year must be plausible.
    /// A group flag that disagrees with the participant count only warns.
    pub fn validate_export(export: &ExportData) -> Result<()> {
        Self::validate_year(export.year)?;

        let mut guids = HashSet::new();
        for (key, conversation) in &export.conversations {
            if key != &conversation.chat_identifier {
                return Err(WrappedError::InvalidExport(format!(
                    "conversation keyed as {key:?} has chat_identifier {:?}",
                    conversation.chat_identifier
                )));
            }

            if conversation.is_group_chat != (conversation.participants.len() > 1) {
                tracing::warn!(
                    conversation = %key,
                    participants = conversation.participants.len(),
                    is_group_chat = conversation.is_group_chat,
                    "Group flag disagrees with participant count"
                );
            }

            for message in &conversation.messages {
                if message.guid.trim().is_empty() {
                    return Err(WrappedError::InvalidExport(format!(
                        "message {} in {key:?} has an empty guid",
                        message.id
                    )));
                }
                if !guids.insert(message.guid.as_str()) {
                    return Err(WrappedError::InvalidExport(format!(
                        "duplicate message guid {:?}",
                        message.guid
                    )));
                }
            }
        }

        Ok(())
    }

    /// Validate the target year
    pub fn validate_year(year: i32) -> Result<()> {
        let latest = Utc::now().year() + 1;
        if !(MIN_YEAR..=latest).contains(&year) {
            return Err(WrappedError::InvalidExport(format!(
                "year {year} is outside {MIN_YEAR}..={latest}"
            )));
        }
        Ok(())
    }

    /// Validate an output file path
    pub fn validate_output_path(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.trim().is_empty() {
            return Err(WrappedError::InvalidConfig("Output path cannot be empty".to_string()));
        }

        if path_str.len() > 4096 {
            return Err(WrappedError::InvalidConfig(
                "Output path too long (max 4096 characters)".to_string(),
            ));
        }

        if path.is_dir() {
            return Err(WrappedError::InvalidConfig(format!(
                "Output path is a directory: {}",
                path.display()
            )));
        }

        Ok(())
    }

    /// Validate an input file path
    pub fn validate_input_path(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(WrappedError::InvalidExport(format!(
                "input path does not exist: {}",
                path.display()
            )));
        }

        if !path.is_file() {
            return Err(WrappedError::InvalidExport(format!(
                "input path is not a file: {}",
                path.display()
            )));
        }

        Ok(())
    }

    /// Strip control characters (except whitespace) and trim
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
            .collect::<String>()
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Conversation, Message, ME};
    use chrono::TimeZone;

    fn message(guid: &str) -> Message {
        Message {
            id: 1,
            guid: guid.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            is_from_me: true,
            sender: ME.to_string(),
            text: None,
            service: "iMessage".to_string(),
            has_attachment: false,
            date_read_after_seconds: None,
            tapbacks: Vec::new(),
            is_context_only: false,
        }
    }

    fn conversation(id: &str, guids: &[&str]) -> Conversation {
        Conversation {
            chat_identifier: id.to_string(),
            display_name: None,
            participants: vec![id.to_string()],
            is_group_chat: false,
            messages: guids.iter().map(|g| message(g)).collect(),
        }
    }

    #[test]
    fn test_duplicate_guid_across_conversations() {
        let mut export = ExportData::new(2024, Utc::now());
        export.insert(conversation("a", &["g1", "g2"]));
        export.insert(conversation("b", &["g2"]));
        assert!(matches!(
            InputValidator::validate_export(&export),
            Err(WrappedError::InvalidExport(_))
        ));
    }

    #[test]
    fn test_mismatched_key() {
        let mut export = ExportData::new(2024, Utc::now());
        export
            .conversations
            .insert("wrong".to_string(), conversation("right", &["g1"]));
        assert!(InputValidator::validate_export(&export).is_err());
    }

    #[test]
    fn test_valid_export_and_year_bounds() {
        let mut export = ExportData::new(2024, Utc::now());
        export.insert(conversation("a", &["g1"]));
        assert!(InputValidator::validate_export(&export).is_ok());
        assert!(InputValidator::validate_year(1999).is_err());
        assert!(InputValidator::validate_year(Utc::now().year() + 5).is_err());
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(InputValidator::sanitize_text("  hi\u{0007} there \n"), "hi there");
    }
}
