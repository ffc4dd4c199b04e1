//! Telegram channel: long-polls the Bot API for updates.
//!
//! Text messages become command or text events, uploaded files become
//! document events. Replies are sent as plain text.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::channels::{EventStream, FileHandle, InboundEvent, Keyboard, Transport};
use crate::dispatcher::Command;
use crate::error::ChannelError;
use crate::session::ConversationId;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Long-poll timeout passed to getUpdates, in seconds.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed poll before trying again.
const POLL_BACKOFF: std::time::Duration = std::time::Duration::from_secs(5);

/// Telegram settings.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
}

impl TelegramConfig {
    /// Read `TELEGRAM_BOT_TOKEN`. `None` when unset or blank.
    pub fn from_env() -> Option<Self> {
        std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(|t| Self {
                bot_token: SecretString::from(t.trim().to_string()),
            })
    }
}

/// Telegram channel. Connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: SecretString,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            bot_token: config.bot_token,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{method}",
            self.bot_token.expose_secret()
        )
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "https://api.telegram.org/file/bot{}/{file_path}",
            self.bot_token.expose_secret()
        )
    }

    /// Publish the command list shown in Telegram's command menu.
    pub async fn register_commands(&self) -> Result<(), ChannelError> {
        let commands: Vec<Value> = Command::ALL
            .iter()
            .map(|c| {
                serde_json::json!({
                    "command": c.name(),
                    "description": c.description(),
                })
            })
            .collect();

        let resp = self
            .client
            .post(self.api_url("setMyCommands"))
            .json(&serde_json::json!({ "commands": commands }))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("setMyCommands returned {status}: {body}"),
            });
        }

        tracing::info!(count = Command::ALL.len(), "Telegram commands registered");
        Ok(())
    }

    /// Send a single message chunk (≤4096 chars).
    async fn send_message_chunk(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = reply_markup(keyboard);
        }

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!("sendMessage returned {status}: {err}"),
            });
        }

        Ok(())
    }

    async fn file_path(&self, file: &FileHandle) -> Result<String, ChannelError> {
        let download_err = |reason: String| ChannelError::Download {
            name: "telegram".into(),
            file_id: file.0.clone(),
            reason,
        };

        let data: Value = self
            .client
            .post(self.api_url("getFile"))
            .json(&serde_json::json!({ "file_id": file.0 }))
            .send()
            .await
            .map_err(|e| download_err(e.to_string()))?
            .json()
            .await
            .map_err(|e| download_err(e.to_string()))?;

        data.get("result")
            .and_then(|r| r.get("file_path"))
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| {
                let description = data
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("getFile returned no file_path");
                download_err(description.to_string())
            })
    }
}

#[async_trait]
impl Transport for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let url = self.api_url("getUpdates");
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for messages...");

            loop {
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": POLL_TIMEOUT_SECS,
                    "allowed_updates": ["message"]
                });

                let resp = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(POLL_BACKOFF).await;
                        continue;
                    }
                };

                let data: Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(POLL_BACKOFF).await;
                        continue;
                    }
                };

                let Some(results) = data.get("result").and_then(Value::as_array) else {
                    let description = api_error_description(&data);
                    tracing::warn!(description, "Telegram getUpdates returned no result");
                    tokio::time::sleep(POLL_BACKOFF).await;
                    continue;
                };

                for update in results {
                    // Advance offset past this update
                    if let Some(uid) = update.get("update_id").and_then(Value::as_i64) {
                        offset = uid + 1;
                    }

                    let Some(event) = parse_update(update) else {
                        continue;
                    };

                    if tx.send(event).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn send_message(
        &self,
        conversation_id: &ConversationId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        let chunks = split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH);
        let last = chunks.len().saturating_sub(1);

        // The keyboard rides on the final chunk.
        for (i, chunk) in chunks.iter().enumerate() {
            let keyboard = if i == last { keyboard } else { None };
            self.send_message_chunk(conversation_id.as_str(), chunk, keyboard)
                .await?;
        }
        Ok(())
    }

    async fn resolve_file(&self, file: &FileHandle) -> Result<Vec<u8>, ChannelError> {
        let path = self.file_path(file).await?;
        let download_err = |reason: String| ChannelError::Download {
            name: "telegram".into(),
            file_id: file.0.clone(),
            reason,
        };

        let resp = self
            .client
            .get(self.file_url(&path))
            .send()
            .await
            .map_err(|e| download_err(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(download_err(format!("file download returned {}", resp.status())));
        }

        let bytes = resp.bytes().await.map_err(|e| download_err(e.to_string()))?;
        tracing::debug!(file_id = %file.0, size = bytes.len(), "Telegram file downloaded");
        Ok(bytes.to_vec())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            tracing::warn!(status = %resp.status(), "Telegram getMe failed");
            Err(ChannelError::HealthCheckFailed {
                name: "telegram".into(),
            })
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Map one getUpdates entry to an event.
///
/// Updates without a message, or messages carrying neither text nor a
/// document (stickers, photos, edits), are skipped.
fn parse_update(update: &Value) -> Option<InboundEvent> {
    let message = update.get("message")?;
    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(Value::as_i64)?;
    let conversation_id = ConversationId::new(chat_id.to_string());

    if let Some(text) = message.get("text").and_then(Value::as_str) {
        return Some(InboundEvent::from_text(conversation_id, text));
    }

    let document = message.get("document")?;
    let file_id = document.get("file_id").and_then(Value::as_str)?;
    let field = |key: &str| document.get(key).and_then(Value::as_str).map(String::from);

    Some(InboundEvent::document(
        conversation_id,
        FileHandle(file_id.to_string()),
        field("mime_type"),
        document.get("file_size").and_then(Value::as_u64),
        field("file_name"),
    ))
}

/// Error description from a failed Bot API response, or "" when absent.
fn api_error_description(data: &Value) -> &str {
    data.get("description")
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Bot API `ReplyKeyboardMarkup` for a keyboard.
fn reply_markup(keyboard: &Keyboard) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|label| serde_json::json!({ "text": label }))
                .collect()
        })
        .collect();
    serde_json::json!({
        "keyboard": rows,
        "resize_keyboard": true,
    })
}

/// Split a message into chunks of at most `max_len` characters.
/// Tries to split on newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        // Byte offset of the first character past the limit
        let Some((limit, _)) = remaining.char_indices().nth(max_len) else {
            chunks.push(remaining.to_string());
            break;
        };

        // Find a good split point
        let chunk = &remaining[..limit];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(limit);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { limit } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::EventKind;

    fn channel(token: &str) -> TelegramChannel {
        TelegramChannel::new(TelegramConfig {
            bot_token: SecretString::from(token),
        })
    }

    // ── Basic channel tests ─────────────────────────────────────────

    #[test]
    fn telegram_channel_name() {
        assert_eq!(channel("fake-token").name(), "telegram");
    }

    #[test]
    fn telegram_api_url() {
        let ch = channel("123:ABC");
        assert_eq!(
            ch.api_url("getMe"),
            "https://api.telegram.org/bot123:ABC/getMe"
        );
    }

    #[test]
    fn telegram_file_url() {
        let ch = channel("123:ABC");
        assert_eq!(
            ch.file_url("documents/file_7.pdf"),
            "https://api.telegram.org/file/bot123:ABC/documents/file_7.pdf"
        );
    }

    // ── Update parsing tests ────────────────────────────────────────

    #[test]
    fn parse_text_update() {
        let update = serde_json::json!({
            "update_id": 10,
            "message": {
                "chat": { "id": 4242 },
                "from": { "id": 1, "username": "dana" },
                "text": "Backend Engineer"
            }
        });

        let event = parse_update(&update).unwrap();
        assert_eq!(event.conversation_id.as_str(), "4242");
        assert_eq!(
            event.kind,
            EventKind::Text {
                text: "Backend Engineer".into()
            }
        );
    }

    #[test]
    fn parse_command_update_strips_bot_name() {
        let update = serde_json::json!({
            "update_id": 11,
            "message": { "chat": { "id": -100 }, "text": "/mock@CoachBot" }
        });

        let event = parse_update(&update).unwrap();
        assert_eq!(event.conversation_id.as_str(), "-100");
        assert_eq!(
            event.kind,
            EventKind::Command {
                name: "mock".into(),
                args: vec![]
            }
        );
    }

    #[test]
    fn parse_document_update() {
        let update = serde_json::json!({
            "update_id": 12,
            "message": {
                "chat": { "id": 7 },
                "document": {
                    "file_id": "BQACAgIAAxk",
                    "file_name": "cv.pdf",
                    "mime_type": "application/pdf",
                    "file_size": 48213
                }
            }
        });

        let event = parse_update(&update).unwrap();
        assert_eq!(
            event.kind,
            EventKind::Document {
                file: FileHandle("BQACAgIAAxk".into()),
                mime_type: Some("application/pdf".into()),
                size: Some(48213),
                file_name: Some("cv.pdf".into()),
            }
        );
    }

    #[test]
    fn parse_document_without_metadata() {
        let update = serde_json::json!({
            "message": { "chat": { "id": 7 }, "document": { "file_id": "abc" } }
        });

        let event = parse_update(&update).unwrap();
        assert_eq!(
            event.kind,
            EventKind::Document {
                file: FileHandle("abc".into()),
                mime_type: None,
                size: None,
                file_name: None,
            }
        );
    }

    #[test]
    fn parse_skips_unsupported_updates() {
        let sticker = serde_json::json!({
            "update_id": 13,
            "message": { "chat": { "id": 7 }, "sticker": { "file_id": "x" } }
        });
        let edited = serde_json::json!({
            "update_id": 14,
            "edited_message": { "chat": { "id": 7 }, "text": "typo" }
        });
        let no_chat = serde_json::json!({ "message": { "text": "hi" } });

        assert!(parse_update(&sticker).is_none());
        assert!(parse_update(&edited).is_none());
        assert!(parse_update(&no_chat).is_none());
    }

    #[test]
    fn api_error_description_reads_description() {
        let failed = serde_json::json!({
            "ok": false,
            "error_code": 409,
            "description": "Conflict: terminated by other getUpdates request"
        });
        assert_eq!(
            api_error_description(&failed),
            "Conflict: terminated by other getUpdates request"
        );
        assert_eq!(api_error_description(&serde_json::json!({ "ok": false })), "");
    }

    // ── Keyboard markup ─────────────────────────────────────────────

    #[test]
    fn reply_markup_wraps_labels() {
        let markup = reply_markup(&Keyboard::cancel_only());
        assert_eq!(
            markup,
            serde_json::json!({
                "keyboard": [[{ "text": "/cancel" }]],
                "resize_keyboard": true
            })
        );
    }

    #[test]
    fn reply_markup_keeps_row_layout() {
        let markup = reply_markup(&Keyboard::main_menu());
        let rows = markup["keyboard"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0]["text"], "/mock");
        assert_eq!(rows[0][1]["text"], "/plan");
    }

    // ── Message splitting tests ─────────────────────────────────────

    #[test]
    fn split_message_short() {
        let chunks = split_message("Hello", 4096);
        assert_eq!(chunks, vec!["Hello"]);
    }

    #[test]
    fn split_message_exact_limit() {
        let msg = "a".repeat(4096);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 4096);
    }

    #[test]
    fn split_message_over_limit_on_newline() {
        let msg = format!("{}\n{}", "a".repeat(2000), "b".repeat(3000));
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a".repeat(2000));
        assert_eq!(chunks[1], "b".repeat(3000));
    }

    #[test]
    fn split_message_over_limit_on_space() {
        let msg = format!("{} {}", "a".repeat(2000), "b".repeat(3000));
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a".repeat(2000));
        assert_eq!(chunks[1], "b".repeat(3000));
    }

    #[test]
    fn split_message_no_good_split_point() {
        let msg = "a".repeat(5000);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4096);
        assert_eq!(chunks[1].len(), 904);
    }

    #[test]
    fn split_message_counts_characters_not_bytes() {
        let msg = "é".repeat(4100);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 4096);
        assert_eq!(chunks[1].chars().count(), 4);
    }
}
