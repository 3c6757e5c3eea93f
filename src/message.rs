use crate::people::UserId;
use crate::streams::StreamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub type MessageId = u64;

#[derive(Debug, Error)]
pub enum MessageLoadError {
    #[error("Failed to read messages file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse message in '{path}' (line {line}): {source}")]
    Parse {
        path: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Stream,
    Private,
}

/// One recipient of a private message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipient {
    #[serde(alias = "user_id")]
    pub id: UserId,
    pub email: String,
    pub full_name: String,
}

/// Stream messages carry the stream name, private messages the recipient list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayRecipient {
    Stream(String),
    Users(Vec<Recipient>),
}

impl Default for DisplayRecipient {
    fn default() -> Self {
        DisplayRecipient::Users(Vec::new())
    }
}

impl DisplayRecipient {
    pub fn users(&self) -> &[Recipient] {
        match self {
            DisplayRecipient::Users(users) => users,
            DisplayRecipient::Stream(_) => &[],
        }
    }
}

/// A chat message as seen by the narrow predicate.
///
/// Every field is optional on the wire, so `{}` is a valid (empty) message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub id: MessageId,
    #[serde(rename = "type")]
    pub kind: Option<MessageKind>,
    pub stream: String,
    pub stream_id: Option<StreamId>,
    #[serde(alias = "subject")]
    pub topic: String,
    pub display_recipient: DisplayRecipient,
    pub sender_id: Option<UserId>,
    pub sender_email: String,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub timestamp: Option<DateTime<Utc>>,
    pub content: String,
    pub starred: bool,
    pub unread: bool,
    pub alerted: bool,
    pub mentioned: bool,
}

impl Message {
    pub fn is_stream(&self) -> bool {
        self.kind == Some(MessageKind::Stream)
    }

    pub fn is_private(&self) -> bool {
        self.kind == Some(MessageKind::Private)
    }
}

/// Lookup of locally cached messages by id
pub trait MessageStore {
    fn get(&self, id: MessageId) -> Option<&Message>;
}

impl MessageStore for HashMap<MessageId, Message> {
    fn get(&self, id: MessageId) -> Option<&Message> {
        HashMap::get(self, &id)
    }
}

/// Messages in arrival order, indexed by id
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    index: HashMap<MessageId, usize>,
}

impl MessageLog {
    /// Index messages by id; a repeated id resolves to its last occurrence
    pub fn new(messages: Vec<Message>) -> Self {
        let index = messages
            .iter()
            .enumerate()
            .map(|(idx, message)| (message.id, idx))
            .collect();
        Self { messages, index }
    }

    /// Messages in the order they were loaded
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Ids in load order, including duplicates
    pub fn ids(&self) -> Vec<MessageId> {
        self.messages.iter().map(|m| m.id).collect()
    }

    /// Number of loaded messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl MessageStore for MessageLog {
    fn get(&self, id: MessageId) -> Option<&Message> {
        self.index.get(&id).map(|idx| &self.messages[*idx])
    }
}

/// Parse messages from either a JSON array or JSON lines
pub fn parse_messages(raw: &str, path: &str) -> Result<Vec<Message>, MessageLoadError> {
    if raw.trim_start().starts_with('[') {
        return serde_json::from_str(raw).map_err(|source| MessageLoadError::Parse {
            path: path.to_string(),
            line: source.line(),
            source,
        });
    }

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| MessageLoadError::Parse {
                path: path.to_string(),
                line: idx + 1,
                source,
            })
        })
        .collect()
}

pub fn load_messages(path: &Path) -> Result<MessageLog, MessageLoadError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| MessageLoadError::Read {
        path: path_display.clone(),
        source,
    })?;
    let messages = parse_messages(&raw, &path_display)?;
    tracing::debug!(count = messages.len(), path = %path_display, "loaded messages");
    Ok(MessageLog::new(messages))
}
