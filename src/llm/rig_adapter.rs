//! Bridges a rig-core `CompletionModel` to [`GenerationGateway`].

use async_trait::async_trait;
use rig::completion::{AssistantContent, CompletionModel};

use super::GenerationGateway;
use crate::error::GenerationError;

/// A rig completion model with a fixed temperature and token budget.
pub struct RigGateway<M: CompletionModel> {
    model: M,
    provider: String,
    model_name: String,
    temperature: f64,
    max_tokens: u64,
}

impl<M: CompletionModel> RigGateway<M> {
    pub fn new(model: M, provider: &str, model_name: &str) -> Self {
        Self {
            model,
            provider: provider.to_string(),
            model_name: model_name.to_string(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    pub fn with_sampling(mut self, temperature: f64, max_tokens: u64) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl<M> GenerationGateway for RigGateway<M>
where
    M: CompletionModel + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        tracing::debug!(
            provider = %self.provider,
            model = %self.model_name,
            prompt_len = prompt.len(),
            "Sending generation request"
        );

        let response = self
            .model
            .completion_request(prompt.to_string())
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed {
                provider: self.provider.clone(),
                reason: e.to_string(),
            })?;

        let text = response
            .choice
            .iter()
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse {
                provider: self.provider.clone(),
            });
        }
        Ok(text)
    }
}
