//! Transport abstraction: where inbound events come from and replies go.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;

use crate::error::ChannelError;
use crate::session::ConversationId;

/// Transport-specific reference to an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle(pub String);

/// Something that happened in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub conversation_id: ConversationId,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `/name args...`
    Command { name: String, args: Vec<String> },
    /// Free text.
    Text { text: String },
    /// An uploaded file, with whatever metadata the transport declared.
    Document {
        file: FileHandle,
        mime_type: Option<String>,
        size: Option<u64>,
        file_name: Option<String>,
    },
}

impl InboundEvent {
    /// Classify a line of user text: `/`-prefixed input is a command,
    /// anything else is free text.
    ///
    /// A Telegram-style `@botname` suffix on the command token is dropped.
    pub fn from_text(conversation_id: ConversationId, text: &str) -> Self {
        let kind = match text.trim_start().strip_prefix('/') {
            Some(rest) if !rest.is_empty() && !rest.starts_with(char::is_whitespace) => {
                let mut parts = rest.split_whitespace();
                let token = parts.next().unwrap_or_default();
                let name = token.split('@').next().unwrap_or(token).to_string();
                EventKind::Command {
                    name,
                    args: parts.map(str::to_string).collect(),
                }
            }
            _ => EventKind::Text {
                text: text.to_string(),
            },
        };
        Self {
            conversation_id,
            kind,
        }
    }

    pub fn document(
        conversation_id: ConversationId,
        file: FileHandle,
        mime_type: Option<String>,
        size: Option<u64>,
        file_name: Option<String>,
    ) -> Self {
        Self {
            conversation_id,
            kind: EventKind::Document {
                file,
                mime_type,
                size,
                file_name,
            },
        }
    }
}

/// A reply keyboard: rows of button labels that send their label as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<String>>,
}

impl Keyboard {
    pub fn new(rows: Vec<Vec<&str>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(str::to_string).collect())
                .collect(),
        }
    }

    /// Shortcuts for the main coaching commands.
    pub fn main_menu() -> Self {
        Self::new(vec![
            vec!["/mock", "/plan"],
            vec!["/resume", "/explain"],
            vec!["/help", "/cancel"],
        ])
    }

    /// Single escape hatch while a question is open.
    pub fn cancel_only() -> Self {
        Self::new(vec![vec!["/cancel"]])
    }
}

/// Stream of inbound events from a transport.
pub type EventStream = Pin<Box<dyn Stream<Item = InboundEvent> + Send>>;

/// A chat transport (Telegram, CLI, ...).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name, for logging.
    fn name(&self) -> &str;

    /// Begin receiving events.
    async fn start(&self) -> Result<EventStream, ChannelError>;

    /// Send `text` to a conversation, optionally replacing its keyboard.
    async fn send_message(
        &self,
        conversation_id: &ConversationId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError>;

    /// Download the content of an uploaded file.
    async fn resolve_file(&self, file: &FileHandle) -> Result<Vec<u8>, ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
