//! Error types for the interview coach.

/// Top-level error type, used at process startup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Coach error: {0}")]
    Coach(#[from] CoachError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send message on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Failed to download file {file_id} on channel {name}: {reason}")]
    Download {
        name: String,
        file_id: String,
        reason: String,
    },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("Channel health check failed: {name}")]
    HealthCheckFailed { name: String },
}

/// Failures of the external text-generation service.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} returned an empty response")]
    EmptyResponse { provider: String },

    #[error("Provider {provider} is misconfigured: {reason}")]
    Config { provider: String, reason: String },
}

/// Failures of the document extractor.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Document contains no extractable text")]
    Empty,

    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// User input that cannot be acted on.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InputValidationError {
    #[error("Unsupported document type: {}", .0.as_deref().unwrap_or("unknown"))]
    UnsupportedMimeType(Option<String>),

    #[error("Document is {size} bytes, limit is {limit}")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Errors surfaced by the orchestration functions in [`crate::coach`].
#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    InputValidation(#[from] InputValidationError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Result type alias for startup code.
pub type Result<T> = std::result::Result<T, Error>;
