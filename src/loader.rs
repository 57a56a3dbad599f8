//! Export loading.
//!
//! Two layouts are accepted:
//! - `.json`: one [`ExportData`] document
//! - `.jsonl`: a metadata line (`export_date`, `year`, optional `owner_name`)
//!   followed by one [`Conversation`] per line

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, WrappedError};
use crate::models::{Conversation, ExportData};
use crate::validation::InputValidator;

#[derive(Debug, Deserialize)]
struct ExportHeader {
    export_date: DateTime<Utc>,
    year: i32,
    #[serde(default)]
    owner_name: Option<String>,
}

/// Reads exports from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportLoader;

impl ExportLoader {
    /// Load and validate an export, choosing the layout from the extension
    pub fn load(path: &Path) -> Result<ExportData> {
        InputValidator::validate_input_path(path)?;

        let export = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") => Self::load_jsonl(path)?,
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::load_json(path)?,
            other => {
                return Err(WrappedError::InvalidExport(format!(
                    "unsupported export extension {:?} (expected .json or .jsonl)",
                    other.unwrap_or("")
                )))
            }
        };

        InputValidator::validate_export(&export)?;
        info!(
            path = %path.display(),
            year = export.year,
            conversations = export.conversations.len(),
            messages = export.total_messages(),
            "Export loaded"
        );
        Ok(export)
    }

    fn load_json(path: &Path) -> Result<ExportData> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn load_jsonl(path: &Path) -> Result<ExportData> {
        let reader = BufReader::new(File::open(path)?);
        let mut lines = reader
            .lines()
            .enumerate()
            .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()));

        let header: ExportHeader = match lines.next() {
            Some((_, line)) => serde_json::from_str(&line?)?,
            None => return Err(WrappedError::InvalidExport("empty export file".to_string())),
        };

        let mut conversations = BTreeMap::new();
        for (index, line) in lines {
            let conversation: Conversation = serde_json::from_str(&line?).map_err(|e| {
                WrappedError::InvalidExport(format!("line {}: {e}", index + 1))
            })?;
            debug!(
                conversation = %conversation.chat_identifier,
                messages = conversation.messages.len(),
                "Conversation read"
            );
            if conversations
                .insert(conversation.chat_identifier.clone(), conversation)
                .is_some()
            {
                return Err(WrappedError::InvalidExport(format!(
                    "line {}: duplicate conversation",
                    index + 1
                )));
            }
        }

        Ok(ExportData {
            export_date: header.export_date,
            year: header.year,
            conversations,
            owner_name: header.owner_name,
        })
    }
}
