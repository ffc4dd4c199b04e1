//! CLI channel: stdin/stdout REPL for local testing.
//!
//! `@path/to/resume.pdf` uploads a local file as a document.

use std::path::Path;

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{EventStream, FileHandle, InboundEvent, Keyboard, Transport};
use crate::document::PDF_MIME_TYPE;
use crate::error::ChannelError;
use crate::session::ConversationId;

/// The single local conversation.
pub const CLI_CONVERSATION_ID: &str = "local-user";

/// A simple CLI channel that reads from stdin and writes to stdout.
#[derive(Default)]
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            // Print prompt
            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let Some(event) = parse_line(&line).await else {
                            eprint!("> ");
                            continue;
                        };
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn send_message(
        &self,
        _conversation_id: &ConversationId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        println!("\n{text}\n");
        if let Some(keyboard) = keyboard {
            println!("{}\n", render_keyboard(keyboard));
        }
        eprint!("> ");
        Ok(())
    }

    async fn resolve_file(&self, file: &FileHandle) -> Result<Vec<u8>, ChannelError> {
        tokio::fs::read(&file.0)
            .await
            .map_err(|e| ChannelError::Download {
                name: "cli".into(),
                file_id: file.0.clone(),
                reason: e.to_string(),
            })
    }
}

/// Turn one stdin line into an event. Blank lines produce nothing.
async fn parse_line(line: &str) -> Option<InboundEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let id = ConversationId::from(CLI_CONVERSATION_ID);

    let Some(path) = line.strip_prefix('@').map(str::trim).filter(|p| !p.is_empty()) else {
        return Some(InboundEvent::from_text(id, line));
    };

    let path_ref = Path::new(path);
    let mime_type = path_ref
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.eq_ignore_ascii_case("pdf"))
        .map(|_| PDF_MIME_TYPE.to_string());
    let size = tokio::fs::metadata(path_ref).await.ok().map(|m| m.len());
    let file_name = path_ref
        .file_name()
        .and_then(|n| n.to_str())
        .map(String::from);

    Some(InboundEvent::document(
        id,
        FileHandle(path.to_string()),
        mime_type,
        size,
        file_name,
    ))
}

fn render_keyboard(keyboard: &Keyboard) -> String {
    keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|label| format!("[{label}]"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
