//! Per-conversation dialogue state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier for one conversation, supplied by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How the next free-text message in a conversation is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Idle,
    AwaitingName,
    AwaitingRole,
    AwaitingExperience,
    AwaitingStrengths,
    AwaitingWeaknesses,
    AwaitingRoleForMock,
    AwaitingProfileForPlan,
    AwaitingAnswer,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::AwaitingName => "awaiting_name",
            Self::AwaitingRole => "awaiting_role",
            Self::AwaitingExperience => "awaiting_experience",
            Self::AwaitingStrengths => "awaiting_strengths",
            Self::AwaitingWeaknesses => "awaiting_weaknesses",
            Self::AwaitingRoleForMock => "awaiting_role_for_mock",
            Self::AwaitingProfileForPlan => "awaiting_profile_for_plan",
            Self::AwaitingAnswer => "awaiting_answer",
        };
        write!(f, "{s}")
    }
}

/// Everything the bot remembers about one conversation.
///
/// Created idle on first access and only ever reset, never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strengths: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weaknesses: Option<Vec<String>>,
    /// Most recently issued interview question (initial or follow-up).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_question: Option<String>,
    /// The user's answer to `last_question`, cleared when a new question is issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_answer: Option<String>,
    /// Follow-up questions issued in the current mock session.
    pub follow_ups: u32,
    pub updated_at: DateTime<Utc>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            mode: Mode::Idle,
            name: None,
            role: None,
            experience: None,
            strengths: None,
            weaknesses: None,
            last_question: None,
            last_answer: None,
            follow_ups: 0,
            updated_at: Utc::now(),
        }
    }
}

impl ConversationState {
    /// Discard every profile and question field and return to idle.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.touch();
    }

    /// Record a newly issued question, dropping any answer to the previous one.
    pub fn issue_question(&mut self, question: String) {
        self.last_question = Some(question);
        self.last_answer = None;
        self.mode = Mode::AwaitingAnswer;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Split comma-separated input into trimmed items, preserving order.
///
/// Empty items produced by stray commas are kept as empty strings.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',').map(|s| s.trim().to_string()).collect()
}
