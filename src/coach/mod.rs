//! Coach: orchestration of the generation-backed features.
//!
//! Each function composes one or two gateway calls with the state updates
//! that make up a user-facing feature. Results are typed; deciding what the
//! user sees is left to the dispatcher.

pub mod prompts;

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::CoachConfig;
use crate::document::{DocumentExtractor, PDF_MIME_TYPE, truncate_chars};
use crate::error::{CoachError, GenerationError, InputValidationError};
use crate::format::strip_markup;
use crate::llm::GenerationGateway;
use crate::session::{ConversationState, Mode};

/// Result of asking for a mock question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// No role on file; the conversation now waits for one.
    NeedsRole,
    /// A new question is open and awaiting an answer.
    Question(String),
}

/// Result of the second feedback step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    Question(String),
    /// The follow-up limit was already reached.
    SessionComplete,
}

/// Result of asking for a prep plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Name or role missing; the conversation now waits for a role.
    NeedsProfile,
    Plan(String),
}

/// Result of asking for an explanation of the open question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplainOutcome {
    NoQuestion,
    Explanation(String),
}

pub struct Coach {
    gateway: Arc<dyn GenerationGateway>,
    extractor: Arc<dyn DocumentExtractor>,
    config: CoachConfig,
}

impl Coach {
    pub fn new(
        gateway: Arc<dyn GenerationGateway>,
        extractor: Arc<dyn DocumentExtractor>,
        config: CoachConfig,
    ) -> Self {
        Self {
            gateway,
            extractor,
            config,
        }
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    /// Generate and open a mock interview question.
    ///
    /// On failure nothing is stored and `mode` is left as the caller set it.
    pub async fn mock_question(
        &self,
        state: &mut ConversationState,
    ) -> Result<MockOutcome, CoachError> {
        if state.role.is_none() {
            state.set_mode(Mode::AwaitingRoleForMock);
            return Ok(MockOutcome::NeedsRole);
        }

        let question = self.generate(&prompts::mock_question_prompt(state)).await?;
        state.issue_question(question.clone());
        state.follow_ups = 0;

        info!(role = state.role.as_deref().unwrap_or_default(), "Mock question issued");
        Ok(MockOutcome::Question(question))
    }

    /// Step one of feedback: critique `last_answer`. Does not touch state.
    pub async fn critique(&self, state: &ConversationState) -> Result<String, CoachError> {
        let (question, answer) = open_exchange(state)?;
        let critique = self
            .generate(&prompts::critique_prompt(question, answer))
            .await?;
        Ok(critique)
    }

    /// Step two of feedback: ask a follow-up unless the session limit is reached.
    pub async fn follow_up(&self, state: &mut ConversationState) -> Result<FollowUp, CoachError> {
        if state.follow_ups >= self.config.follow_up_limit {
            debug!(follow_ups = state.follow_ups, "Follow-up limit reached");
            state.set_mode(Mode::Idle);
            return Ok(FollowUp::SessionComplete);
        }

        let (question, answer) = open_exchange(state)?;
        let prompt = prompts::follow_up_prompt(state, question, answer);
        let next = self.generate(&prompt).await?;

        state.issue_question(next.clone());
        state.follow_ups += 1;
        info!(follow_ups = state.follow_ups, "Follow-up question issued");
        Ok(FollowUp::Question(next))
    }

    /// Entry point for an explicit plan request.
    ///
    /// Requires both name and role, but only the role is re-collected when
    /// either is missing; the plan generated after that may lack a name.
    pub async fn request_plan(
        &self,
        state: &mut ConversationState,
    ) -> Result<PlanOutcome, CoachError> {
        if state.name.is_none() || state.role.is_none() {
            state.set_mode(Mode::AwaitingProfileForPlan);
            return Ok(PlanOutcome::NeedsProfile);
        }
        Ok(PlanOutcome::Plan(self.plan(state).await?))
    }

    /// Generate a 10-day preparation plan from whatever profile is on file.
    pub async fn plan(&self, state: &ConversationState) -> Result<String, CoachError> {
        let plan = self.generate(&prompts::plan_prompt(state)).await?;
        info!("Prep plan generated");
        Ok(plan)
    }

    /// Explain what the open question is probing.
    pub async fn explain(&self, state: &ConversationState) -> Result<ExplainOutcome, CoachError> {
        let Some(question) = state.last_question.as_deref() else {
            return Ok(ExplainOutcome::NoQuestion);
        };
        let explanation = self
            .generate(&prompts::explain_prompt(state, question))
            .await?;
        Ok(ExplainOutcome::Explanation(explanation))
    }

    /// Check an upload's declared type and size before downloading it.
    pub fn validate_upload(
        &self,
        mime_type: Option<&str>,
        size: Option<u64>,
    ) -> Result<(), InputValidationError> {
        if mime_type != Some(PDF_MIME_TYPE) {
            return Err(InputValidationError::UnsupportedMimeType(
                mime_type.map(str::to_string),
            ));
        }
        match size {
            Some(size) if size > self.config.max_upload_bytes => {
                Err(InputValidationError::FileTooLarge {
                    size,
                    limit: self.config.max_upload_bytes,
                })
            }
            _ => Ok(()),
        }
    }

    /// Review a resume. Stateless with respect to the conversation.
    pub async fn review_resume(&self, bytes: Vec<u8>) -> Result<String, CoachError> {
        let text = self.extractor.extract_text(bytes).await?;
        let budget = self.config.resume_char_budget;
        let resume = truncate_chars(&text, budget);
        if resume.len() < text.len() {
            debug!(budget, "Resume text truncated");
        }

        let review = self
            .generate(&prompts::resume_review_prompt(resume))
            .await?;
        info!("Resume reviewed");
        Ok(review)
    }

    /// Generate and format. Output that is blank once markup is removed
    /// counts as an empty response.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let raw = self.gateway.generate(prompt).await?;
        let text = strip_markup(&raw);
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse {
                provider: self.gateway.model_name().to_string(),
            });
        }
        Ok(text)
    }
}

/// The open question and the user's answer to it.
fn open_exchange(state: &ConversationState) -> Result<(&str, &str), InputValidationError> {
    let question = state
        .last_question
        .as_deref()
        .ok_or(InputValidationError::MissingField("last_question"))?;
    let answer = state
        .last_answer
        .as_deref()
        .ok_or(InputValidationError::MissingField("last_answer"))?;
    Ok((question, answer))
}
