//! Dispatcher: routes commands to handlers, documents to the resume
//! reviewer, and free text through the dialogue state machine.
//!
//! This is the only layer that turns coach results into user-visible text.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::channels::{EventKind, FileHandle, InboundEvent, Keyboard, Transport};
use crate::coach::{Coach, ExplainOutcome, FollowUp, MockOutcome, PlanOutcome};
use crate::error::{CoachError, InputValidationError};
use crate::replies;
use crate::session::{ConversationId, ConversationState, ConversationStore, Effect, Mode, apply};

/// The fixed command surface. Names are case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Cancel,
    Resume,
    Mock,
    Plan,
    Explain,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::Start,
        Command::Help,
        Command::Cancel,
        Command::Resume,
        Command::Mock,
        Command::Plan,
        Command::Explain,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Cancel => "cancel",
            Self::Resume => "resume",
            Self::Mock => "mock",
            Self::Plan => "plan",
            Self::Explain => "explain",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Start => "Build your candidate profile and get a prep plan",
            Self::Help => "Show available commands",
            Self::Cancel => "Clear your profile and stop the current session",
            Self::Resume => "Get a recruiter-style review of your PDF resume",
            Self::Mock => "Answer a mock interview question and get feedback",
            Self::Plan => "Generate a 10-day interview prep plan",
            Self::Explain => "Explain what the last question is testing",
        }
    }
}

pub struct Dispatcher {
    store: Arc<ConversationStore>,
    coach: Arc<Coach>,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<ConversationStore>,
        coach: Arc<Coach>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            store,
            coach,
            transport,
        }
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// Handle one inbound event to completion.
    ///
    /// The conversation's state is locked for the whole handler.
    pub async fn handle(&self, event: InboundEvent) {
        let id = event.conversation_id;
        match event.kind {
            EventKind::Document {
                file,
                mime_type,
                size,
                file_name,
            } => {
                info!(
                    conversation_id = %id,
                    file_name = file_name.as_deref().unwrap_or("unnamed"),
                    mime_type = mime_type.as_deref().unwrap_or("unknown"),
                    "Document received"
                );
                self.handle_document(&id, &file, mime_type.as_deref(), size)
                    .await;
            }
            EventKind::Command { name, .. } => {
                let slot = self.store.get_or_create(&id).await;
                let mut state = slot.lock().await;
                info!(conversation_id = %id, command = %name, mode = %state.mode, "Command received");
                self.handle_command(&id, &mut state, &name).await;
            }
            EventKind::Text { text } => {
                let slot = self.store.get_or_create(&id).await;
                let mut state = slot.lock().await;
                self.handle_text(&id, &mut state, &text).await;
            }
        }
    }

    async fn handle_command(&self, id: &ConversationId, state: &mut ConversationState, name: &str) {
        let Some(command) = Command::parse(name) else {
            self.reply(id, replies::UNKNOWN_COMMAND, None).await;
            return;
        };

        match command {
            Command::Start => {
                state.reset();
                state.set_mode(Mode::AwaitingName);
                self.reply(id, replies::GREETING, None).await;
            }
            Command::Help => {
                self.reply(id, &replies::help(), Some(&Keyboard::main_menu()))
                    .await;
            }
            Command::Cancel => {
                state.reset();
                self.reply(id, replies::CANCELLED, Some(&Keyboard::main_menu()))
                    .await;
            }
            Command::Resume => {
                state.reset();
                self.reply(id, replies::UPLOAD_RESUME, None).await;
            }
            Command::Mock => self.run_mock(id, state).await,
            Command::Plan => self.run_plan_request(id, state).await,
            Command::Explain => self.run_explain(id, state).await,
        }
    }

    async fn handle_text(&self, id: &ConversationId, state: &mut ConversationState, text: &str) {
        let from = state.mode;
        match apply(state, text) {
            Effect::Stored => {
                if let Some(prompt) = replies::profile_prompt(state.mode) {
                    self.reply(id, prompt, None).await;
                }
            }
            Effect::GenerateMockQuestion => self.run_mock(id, state).await,
            Effect::GeneratePlan => self.run_plan(id, state).await,
            Effect::GenerateFeedback => self.run_feedback(id, state).await,
            Effect::Ignored => {
                debug!(conversation_id = %id, mode = %from, "Ignoring text outside a dialogue");
            }
        }
    }

    async fn run_mock(&self, id: &ConversationId, state: &mut ConversationState) {
        match self.coach.mock_question(state).await {
            Ok(MockOutcome::NeedsRole) => {
                self.reply(id, replies::ASK_ROLE_FOR_MOCK, None).await;
            }
            Ok(MockOutcome::Question(question)) => {
                let text = format!("{question}\n\n{}", replies::ANSWER_PROMPT);
                self.reply(id, &text, Some(&Keyboard::cancel_only())).await;
            }
            Err(e) => {
                warn!(conversation_id = %id, error = %e, "Mock question failed");
                self.reply(id, replies::MOCK_FAILED, None).await;
            }
        }
    }

    async fn run_plan_request(&self, id: &ConversationId, state: &mut ConversationState) {
        match self.coach.request_plan(state).await {
            Ok(PlanOutcome::NeedsProfile) => {
                self.reply(id, replies::ASK_ROLE_FOR_PLAN, None).await;
            }
            Ok(PlanOutcome::Plan(plan)) => {
                self.reply(id, &plan, Some(&Keyboard::main_menu())).await;
            }
            Err(e) => {
                warn!(conversation_id = %id, error = %e, "Plan generation failed");
                self.reply(id, replies::PLAN_FAILED, None).await;
            }
        }
    }

    async fn run_plan(&self, id: &ConversationId, state: &ConversationState) {
        match self.coach.plan(state).await {
            Ok(plan) => self.reply(id, &plan, Some(&Keyboard::main_menu())).await,
            Err(e) => {
                warn!(conversation_id = %id, error = %e, "Plan generation failed");
                self.reply(id, replies::PLAN_FAILED, None).await;
            }
        }
    }

    async fn run_feedback(&self, id: &ConversationId, state: &mut ConversationState) {
        match self.coach.critique(state).await {
            Ok(critique) => self.reply(id, &critique, None).await,
            Err(CoachError::InputValidation(e)) => {
                warn!(conversation_id = %id, error = %e, "Answer without an open question");
                self.reply(id, replies::NO_ACTIVE_QUESTION, None).await;
                return;
            }
            Err(e) => {
                warn!(conversation_id = %id, error = %e, "Critique failed");
                self.reply(id, replies::FEEDBACK_FAILED, None).await;
                return;
            }
        }

        match self.coach.follow_up(state).await {
            Ok(FollowUp::Question(question)) => {
                let text = format!("Follow-up: {question}\n\n{}", replies::FOLLOW_UP_PROMPT);
                self.reply(id, &text, Some(&Keyboard::cancel_only())).await;
            }
            Ok(FollowUp::SessionComplete) => {
                self.reply(id, replies::SESSION_COMPLETE, Some(&Keyboard::main_menu()))
                    .await;
            }
            Err(e) => {
                warn!(conversation_id = %id, error = %e, "Follow-up failed");
                self.reply(id, replies::FOLLOW_UP_FAILED, None).await;
            }
        }
    }

    async fn run_explain(&self, id: &ConversationId, state: &ConversationState) {
        match self.coach.explain(state).await {
            Ok(ExplainOutcome::NoQuestion) => {
                self.reply(id, replies::NO_QUESTION_TO_EXPLAIN, None).await;
            }
            Ok(ExplainOutcome::Explanation(text)) => self.reply(id, &text, None).await,
            Err(e) => {
                warn!(conversation_id = %id, error = %e, "Explain failed");
                self.reply(id, replies::EXPLAIN_FAILED, None).await;
            }
        }
    }

    async fn handle_document(
        &self,
        id: &ConversationId,
        file: &FileHandle,
        mime_type: Option<&str>,
        size: Option<u64>,
    ) {
        if let Err(e) = self.coach.validate_upload(mime_type, size) {
            debug!(conversation_id = %id, error = %e, "Rejected upload");
            let text = match e {
                InputValidationError::FileTooLarge { limit, .. } => replies::file_too_large(limit),
                _ => replies::NOT_A_PDF.to_string(),
            };
            self.reply(id, &text, None).await;
            return;
        }

        let result = match self.transport.resolve_file(file).await {
            Ok(bytes) => self.coach.review_resume(bytes).await,
            Err(e) => Err(CoachError::from(e)),
        };

        match result {
            Ok(review) => self.reply(id, &review, Some(&Keyboard::main_menu())).await,
            Err(e) => {
                warn!(conversation_id = %id, error = %e, "Resume review failed");
                self.reply(id, replies::RESUME_FAILED, None).await;
            }
        }
    }

    async fn reply(&self, id: &ConversationId, text: &str, keyboard: Option<&Keyboard>) {
        if let Err(e) = self.transport.send_message(id, text, keyboard).await {
            warn!(
                conversation_id = %id,
                transport = self.transport.name(),
                error = %e,
                "Failed to deliver reply"
            );
        }
    }
}
