//! Test doubles for the external collaborators.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::channels::{EventStream, FileHandle, Keyboard, Transport};
use crate::document::DocumentExtractor;
use crate::error::{ChannelError, ExtractionError, GenerationError};
use crate::llm::GenerationGateway;
use crate::session::ConversationId;

/// Gateway that replays scripted responses and records every prompt.
///
/// Once the script runs out, every call succeeds with `"generated text"`.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, text: &str) {
        self.responses.lock().unwrap().push_back(Ok(text.to_string()));
    }

    pub fn push_err(&self) {
        self.responses.lock().unwrap().push_back(Err(failure()));
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

pub fn failure() -> GenerationError {
    GenerationError::RequestFailed {
        provider: "scripted".into(),
        reason: "quota exceeded".into(),
    }
}

#[async_trait]
impl GenerationGateway for ScriptedGateway {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("generated text".to_string()))
    }
}

/// Extractor that returns fixed text, or fails when constructed with `failing`.
pub struct FakeExtractor {
    result: Option<String>,
}

impl FakeExtractor {
    pub fn returning(text: &str) -> Self {
        Self {
            result: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { result: None }
    }
}

#[async_trait]
impl DocumentExtractor for FakeExtractor {
    async fn extract_text(&self, _bytes: Vec<u8>) -> Result<String, ExtractionError> {
        self.result
            .clone()
            .ok_or_else(|| ExtractionError::Malformed("bad xref table".into()))
    }
}

/// A message captured by [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub conversation_id: ConversationId,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

/// Transport that records outbound messages and serves canned file bytes.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    file_bytes: Option<Vec<u8>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(bytes: &[u8]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            file_bytes: Some(bytes.to_vec()),
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.text).collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.sent().pop().map(|s| s.text)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        Ok(Box::pin(futures::stream::empty()))
    }

    async fn send_message(
        &self,
        conversation_id: &ConversationId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push(Sent {
            conversation_id: conversation_id.clone(),
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn resolve_file(&self, file: &FileHandle) -> Result<Vec<u8>, ChannelError> {
        self.file_bytes.clone().ok_or_else(|| ChannelError::Download {
            name: "recording".into(),
            file_id: file.0.clone(),
            reason: "no file configured".into(),
        })
    }
}
