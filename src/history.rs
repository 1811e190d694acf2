use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Store, StoreError};

/// Storage key holding the serialised history array.
pub const HISTORY_KEY: &str = "healthbot_history";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Bot => "HealthBot AI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub text: String,
    pub sender: Sender,
    pub intent: Option<String>,
    pub confidence: Option<f64>,
    pub timestamp: String,
}

impl ChatEntry {
    pub fn new(text: impl Into<String>, sender: Sender, intent: Option<String>, confidence: Option<f64>) -> Self {
        ChatEntry {
            text: text.into(),
            sender,
            intent,
            confidence,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User, None, None)
    }

    pub fn bot(text: impl Into<String>, intent: Option<String>, confidence: Option<f64>) -> Self {
        Self::new(text, Sender::Bot, intent, confidence)
    }

    /// Local `HH:MM` for display; empty when the stored timestamp is unreadable.
    pub fn display_time(&self) -> String {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatHistory {
    entries: Vec<ChatEntry>,
}

impl ChatHistory {
    /// Reads the saved history. A corrupt blob is logged and treated as empty
    /// so a bad write never locks the user out of the chat.
    pub fn load(store: &Store) -> Result<Self, StoreError> {
        match store.get_json::<Vec<ChatEntry>>(HISTORY_KEY) {
            Ok(entries) => Ok(ChatHistory {
                entries: entries.unwrap_or_default(),
            }),
            Err(StoreError::Json { source, .. }) => {
                tracing::warn!(error = %source, "discarding unreadable chat history");
                Ok(ChatHistory::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, store: &Store) -> Result<(), StoreError> {
        store.set_json(HISTORY_KEY, &self.entries)
    }

    pub fn push(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatExport {
    pub timestamp: String,
    pub messages: Vec<ChatEntry>,
}

pub fn export(history: &ChatHistory, now: DateTime<Utc>) -> ChatExport {
    ChatExport {
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        messages: history.entries().to_vec(),
    }
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("healthbot-chat-{}.json", date.format("%Y-%m-%d"))
}

/// Writes a pretty-printed export into `dir` and returns the file path.
pub fn write_export(dir: &Path, history: &ChatHistory, now: DateTime<Utc>) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(now.date_naive()));
    let json = serde_json::to_string_pretty(&export(history, now))?;
    std::fs::write(&path, json)?;
    tracing::info!(path = %path.display(), messages = history.len(), "chat exported");
    Ok(path)
}
