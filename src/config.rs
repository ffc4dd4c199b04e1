//! Configuration types.
//!
//! Everything is read from environment variables; only the API key for the
//! selected LLM backend is required.

use crate::error::ConfigError;

/// Default number of follow-up questions per mock session.
pub const DEFAULT_FOLLOW_UP_LIMIT: u32 = 1;

/// Resume text beyond this many characters is dropped before prompting.
pub const DEFAULT_RESUME_CHAR_BUDGET: usize = 20_000;

/// Largest resume upload accepted, in bytes.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Coach configuration.
#[derive(Debug, Clone)]
pub struct CoachConfig {
    /// Follow-up questions allowed after the first answer of a mock session.
    pub follow_up_limit: u32,
    /// Maximum characters of extracted resume text sent to the model.
    pub resume_char_budget: usize,
    /// Maximum declared size of an uploaded resume.
    pub max_upload_bytes: u64,
    /// Port for the status HTTP server. `None` disables it.
    pub http_port: Option<u16>,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            follow_up_limit: DEFAULT_FOLLOW_UP_LIMIT,
            resume_char_budget: DEFAULT_RESUME_CHAR_BUDGET,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            http_port: Some(8080),
        }
    }
}

impl CoachConfig {
    /// Build from `COACH_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let http_port = match std::env::var("COACH_HTTP_PORT") {
            Ok(v) if v.trim() == "off" => None,
            Ok(v) => Some(parse_value("COACH_HTTP_PORT", &v)?),
            Err(_) => defaults.http_port,
        };

        Ok(Self {
            follow_up_limit: env_or("COACH_FOLLOW_UP_LIMIT", defaults.follow_up_limit)?,
            resume_char_budget: env_or("COACH_RESUME_CHAR_BUDGET", defaults.resume_char_budget)?,
            max_upload_bytes: env_or("COACH_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            http_port,
        })
    }
}

/// Read `key` and parse it, or return `default` when unset.
pub(crate) fn env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) => parse_value(key, &v),
        Err(_) => Ok(default),
    }
}

pub(crate) fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })
}
