//! Generation gateway: the text-generation capability behind every
//! coaching feature.
//!
//! Supports:
//! - **Anthropic**: Direct API access via rig-core
//! - **OpenAI**: Direct API access via rig-core
//!
//! The coach only ever needs "prompt in, text out", so the seam is the
//! narrow [`GenerationGateway`] trait and `RigGateway` adapts a rig completion model to it.

mod rig_adapter;

pub use rig_adapter::RigGateway;

use std::sync::Arc;

use async_trait::async_trait;
use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::config::env_or;
use crate::error::{ConfigError, GenerationError};

/// Produces natural-language text from a single prompt.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

impl LlmBackend {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Some(Self::Anthropic),
            "openai" | "gpt" => Some(Self::OpenAi),
            _ => None,
        }
    }

    fn api_key_var(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4o-mini",
        }
    }
}

/// Configuration for creating a generation gateway.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u64,
}

impl LlmConfig {
    /// Read `COACH_LLM_BACKEND`, the backend's API key, `COACH_MODEL`,
    /// `COACH_TEMPERATURE` and `COACH_MAX_TOKENS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match std::env::var("COACH_LLM_BACKEND") {
            Ok(raw) => LlmBackend::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "COACH_LLM_BACKEND".to_string(),
                message: format!("{raw:?}: expected \"anthropic\" or \"openai\""),
            })?,
            Err(_) => LlmBackend::Anthropic,
        };

        let key_var = backend.api_key_var();
        let api_key = std::env::var(key_var)
            .map_err(|_| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let model =
            std::env::var("COACH_MODEL").unwrap_or_else(|_| backend.default_model().to_string());

        Ok(Self {
            backend,
            api_key: secrecy::SecretString::from(api_key),
            model,
            temperature: env_or("COACH_TEMPERATURE", 0.7)?,
            max_tokens: env_or("COACH_MAX_TOKENS", 1024)?,
        })
    }
}

/// Create a generation gateway from configuration.
pub fn create_gateway(config: &LlmConfig) -> Result<Arc<dyn GenerationGateway>, GenerationError> {
    match config.backend {
        LlmBackend::Anthropic => create_anthropic_gateway(config),
        LlmBackend::OpenAi => create_openai_gateway(config),
    }
}

fn create_anthropic_gateway(
    config: &LlmConfig,
) -> Result<Arc<dyn GenerationGateway>, GenerationError> {
    use rig::providers::anthropic;

    let client: rig::client::Client<anthropic::client::AnthropicExt> =
        anthropic::Client::new(config.api_key.expose_secret()).map_err(|e| {
            GenerationError::Config {
                provider: "anthropic".to_string(),
                reason: format!("Failed to create Anthropic client: {}", e),
            }
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Using Anthropic (model: {})", config.model);
    Ok(Arc::new(
        RigGateway::new(model, "anthropic", &config.model)
            .with_sampling(config.temperature, config.max_tokens),
    ))
}

fn create_openai_gateway(config: &LlmConfig) -> Result<Arc<dyn GenerationGateway>, GenerationError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::new(config.api_key.expose_secret()).map_err(|e| {
            GenerationError::Config {
                provider: "openai".to_string(),
                reason: format!("Failed to create OpenAI client: {}", e),
            }
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Using OpenAI (model: {})", config.model);
    Ok(Arc::new(
        RigGateway::new(model, "openai", &config.model)
            .with_sampling(config.temperature, config.max_tokens),
    ))
}
