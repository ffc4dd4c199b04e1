//! User-facing text. Error replies are fixed per call site and never carry
//! error details.

use crate::dispatcher::Command;
use crate::session::Mode;

pub const GREETING: &str = "Hi! I'm your interview prep coach. Let's build your profile first.\n\
What's your name?";

pub const CANCELLED: &str = "Cancelled. Your profile and session were cleared.";

pub const UPLOAD_RESUME: &str = "Send me your resume as a PDF and I'll review it.";

pub const ASK_ROLE_FOR_MOCK: &str = "Which role should I interview you for?";

pub const ASK_ROLE_FOR_PLAN: &str = "Which role are you preparing for?";

pub const ANSWER_PROMPT: &str = "Reply with your answer when you're ready.";

pub const FOLLOW_UP_PROMPT: &str = "Answer the follow-up, or send /cancel to stop.";

pub const SESSION_COMPLETE: &str =
    "That's the end of this mock session. Send /mock for a new question or /plan for a prep plan.";

pub const NO_QUESTION_TO_EXPLAIN: &str = "There's no question to explain yet. Send /mock first.";

pub const UNKNOWN_COMMAND: &str = "I don't know that command. Send /help to see what I can do.";

pub const MOCK_FAILED: &str = "Sorry, I couldn't generate a question right now. Please try /mock again.";

pub const FEEDBACK_FAILED: &str = "Sorry, I couldn't review your answer right now. Please try again.";

pub const FOLLOW_UP_FAILED: &str = "Sorry, I couldn't come up with a follow-up question.";

pub const PLAN_FAILED: &str = "Sorry, I couldn't build your plan right now. Please try /plan again.";

pub const EXPLAIN_FAILED: &str = "Sorry, I couldn't explain that question right now.";

pub const RESUME_FAILED: &str =
    "Sorry, I couldn't read or review that resume. Make sure it's a text-based PDF.";

pub const NOT_A_PDF: &str = "Please upload your resume as a PDF file.";

pub const NO_ACTIVE_QUESTION: &str = "There's no open question right now. Send /mock to start.";

/// Question asked after a profile field has been stored, keyed by the mode
/// the conversation moved into.
pub fn profile_prompt(mode: Mode) -> Option<&'static str> {
    match mode {
        Mode::AwaitingRole => Some("Nice to meet you! What role are you targeting?"),
        Mode::AwaitingExperience => Some("How many years of experience do you have?"),
        Mode::AwaitingStrengths => Some("What are your main strengths? Separate them with commas."),
        Mode::AwaitingWeaknesses => {
            Some("And which areas would you like to improve? Separate them with commas.")
        }
        _ => None,
    }
}

pub fn file_too_large(limit: u64) -> String {
    format!(
        "That file is too large. Please send a PDF under {} MB.",
        limit.div_ceil(1024 * 1024)
    )
}

pub fn help() -> String {
    let mut lines = vec!["Here's what I can do:".to_string()];
    lines.extend(
        Command::ALL
            .iter()
            .map(|c| format!("/{} - {}", c.name(), c.description())),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_lists_every_command() {
        let text = help();
        for command in Command::ALL {
            assert!(text.contains(&format!("/{}", command.name())));
            assert!(text.contains(command.description()));
        }
    }

    #[test]
    fn profile_prompts_cover_collection_modes() {
        assert!(profile_prompt(Mode::AwaitingRole).is_some());
        assert!(profile_prompt(Mode::AwaitingExperience).is_some());
        assert!(profile_prompt(Mode::AwaitingStrengths).unwrap().contains("commas"));
        assert!(profile_prompt(Mode::AwaitingWeaknesses).unwrap().contains("commas"));
        assert!(profile_prompt(Mode::Idle).is_none());
    }

    #[test]
    fn file_too_large_rounds_up_megabytes() {
        assert!(file_too_large(5 * 1024 * 1024).contains("5 MB"));
        assert!(file_too_large(1).contains("1 MB"));
    }

    #[test]
    fn error_replies_carry_no_details() {
        for text in [MOCK_FAILED, FEEDBACK_FAILED, PLAN_FAILED, RESUME_FAILED, EXPLAIN_FAILED] {
            assert!(text.starts_with("Sorry"));
        }
    }
}
