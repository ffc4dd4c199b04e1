//! Dialogue state machine: decides what a free-text message means.
//!
//! Pure: it only mutates the state it is handed and reports which
//! generation step, if any, the caller must run next.

use super::state::{ConversationState, Mode, split_list};

/// What the caller must do after a text message has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// A profile field was stored; ask for the one the new mode expects.
    Stored,
    /// Generate a mock interview question.
    GenerateMockQuestion,
    /// Generate a preparation plan.
    GeneratePlan,
    /// Critique `last_answer` and possibly ask a follow-up.
    GenerateFeedback,
    /// The message means nothing in the current mode.
    Ignored,
}

/// Apply one inbound text message to `state`.
pub fn apply(state: &mut ConversationState, text: &str) -> Effect {
    let (next, effect) = match state.mode {
        Mode::AwaitingName => {
            state.name = Some(text.to_string());
            (Mode::AwaitingRole, Effect::Stored)
        }
        Mode::AwaitingRole => {
            state.role = Some(text.to_string());
            (Mode::AwaitingExperience, Effect::Stored)
        }
        Mode::AwaitingExperience => {
            state.experience = Some(text.to_string());
            (Mode::AwaitingStrengths, Effect::Stored)
        }
        Mode::AwaitingStrengths => {
            state.strengths = Some(split_list(text));
            (Mode::AwaitingWeaknesses, Effect::Stored)
        }
        Mode::AwaitingWeaknesses => {
            state.weaknesses = Some(split_list(text));
            (Mode::Idle, Effect::GeneratePlan)
        }
        Mode::AwaitingRoleForMock => {
            state.role = Some(text.to_string());
            (Mode::Idle, Effect::GenerateMockQuestion)
        }
        Mode::AwaitingProfileForPlan => {
            state.role = Some(text.to_string());
            (Mode::Idle, Effect::GeneratePlan)
        }
        Mode::AwaitingAnswer => {
            state.last_answer = Some(text.to_string());
            (Mode::Idle, Effect::GenerateFeedback)
        }
        Mode::Idle => return Effect::Ignored,
    };

    tracing::debug!(from = %state.mode, to = %next, ?effect, "Dialogue transition");
    state.set_mode(next);
    effect
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_mode(mode: Mode) -> ConversationState {
        ConversationState {
            mode,
            ..Default::default()
        }
    }

    #[test]
    fn transition_table() {
        use Mode::*;
        let table = [
            (AwaitingName, AwaitingRole, Effect::Stored),
            (AwaitingRole, AwaitingExperience, Effect::Stored),
            (AwaitingExperience, AwaitingStrengths, Effect::Stored),
            (AwaitingStrengths, AwaitingWeaknesses, Effect::Stored),
            (AwaitingWeaknesses, Idle, Effect::GeneratePlan),
            (AwaitingRoleForMock, Idle, Effect::GenerateMockQuestion),
            (AwaitingProfileForPlan, Idle, Effect::GeneratePlan),
            (AwaitingAnswer, Idle, Effect::GenerateFeedback),
            (Idle, Idle, Effect::Ignored),
        ];
        for (from, to, expected) in table {
            let mut state = in_mode(from);
            let effect = apply(&mut state, "input");
            assert_eq!(state.mode, to, "{from} should move to {to}");
            assert_eq!(effect, expected, "{from} should yield {expected:?}");
        }
    }

    #[test]
    fn scalar_fields_are_stored_verbatim() {
        let mut state = in_mode(Mode::AwaitingName);
        apply(&mut state, "Dana");
        apply(&mut state, "Backend Engineer");
        apply(&mut state, "3");
        assert_eq!(state.name.as_deref(), Some("Dana"));
        assert_eq!(state.role.as_deref(), Some("Backend Engineer"));
        assert_eq!(state.experience.as_deref(), Some("3"));
    }

    #[test]
    fn list_fields_are_split() {
        let mut state = in_mode(Mode::AwaitingStrengths);
        apply(&mut state, "Go, distributed systems");
        apply(&mut state, "Testing");
        assert_eq!(
            state.strengths,
            Some(vec!["Go".to_string(), "distributed systems".to_string()])
        );
        assert_eq!(state.weaknesses, Some(vec!["Testing".to_string()]));
    }

    #[test]
    fn role_for_mock_and_plan_store_role() {
        for mode in [Mode::AwaitingRoleForMock, Mode::AwaitingProfileForPlan] {
            let mut state = in_mode(mode);
            apply(&mut state, "Data Scientist");
            assert_eq!(state.role.as_deref(), Some("Data Scientist"));
            assert!(state.name.is_none(), "{mode} must not collect a name");
        }
    }

    #[test]
    fn answer_is_stored() {
        let mut state = in_mode(Mode::AwaitingAnswer);
        state.last_question = Some("Tell me about a failure.".into());
        apply(&mut state, "We lost a database once.");
        assert_eq!(state.last_answer.as_deref(), Some("We lost a database once."));
        assert_eq!(state.last_question.as_deref(), Some("Tell me about a failure."));
    }

    #[test]
    fn idle_leaves_state_untouched() {
        let mut state = in_mode(Mode::Idle);
        state.role = Some("PM".into());
        let before = state.clone();
        assert_eq!(apply(&mut state, "hello?"), Effect::Ignored);
        assert_eq!(state, before);
    }
}
