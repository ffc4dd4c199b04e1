//! Prompt builders for every generation request the coach makes.

use crate::session::ConversationState;

const NOT_PROVIDED: &str = "not provided";

const PLAIN_TEXT: &str = "Respond in plain text only. Do not use Markdown, asterisks, \
underscores, backticks or any other styling.";

/// Render the candidate profile as a bullet list for prompt injection.
pub fn profile_section(state: &ConversationState) -> String {
    let list = |items: &Option<Vec<String>>| match items {
        Some(items) if !items.is_empty() => items.join(", "),
        _ => NOT_PROVIDED.to_string(),
    };

    format!(
        "Candidate profile:\n\
         - Name: {name}\n\
         - Target role: {role}\n\
         - Experience: {experience}\n\
         - Strengths: {strengths}\n\
         - Weaknesses: {weaknesses}",
        name = state.name.as_deref().unwrap_or(NOT_PROVIDED),
        role = state.role.as_deref().unwrap_or(NOT_PROVIDED),
        experience = state.experience.as_deref().unwrap_or(NOT_PROVIDED),
        strengths = list(&state.strengths),
        weaknesses = list(&state.weaknesses),
    )
}

/// Ask for one mock interview question tailored to the candidate.
pub fn mock_question_prompt(state: &ConversationState) -> String {
    format!(
        "You are an experienced interviewer.\n\n\
         {profile}\n\n\
         Write exactly one challenging interview question for this candidate. \
         Make it specific to the target role, test at least one listed strength, \
         and give the candidate a chance to address a listed weakness. \
         Output only the question, with no preamble or numbering.\n\n\
         {PLAIN_TEXT}",
        profile = profile_section(state),
    )
}

/// Ask for a short critique of an answer.
pub fn critique_prompt(question: &str, answer: &str) -> String {
    format!(
        "You are an interview coach reviewing a candidate's answer.\n\n\
         Question: {question}\n\n\
         Answer: {answer}\n\n\
         Give exactly 3 short positives, then exactly 3 short points to improve, \
         then 1 follow-up question an interviewer might ask next. \
         Keep each point to one sentence.\n\n\
         {PLAIN_TEXT}"
    )
}

/// Ask for one follow-up question building on the previous exchange.
pub fn follow_up_prompt(state: &ConversationState, question: &str, answer: &str) -> String {
    format!(
        "You are an experienced interviewer continuing a mock interview.\n\n\
         {profile}\n\n\
         Previous question: {question}\n\n\
         Candidate's answer: {answer}\n\n\
         Ask exactly one new follow-up question that digs deeper into the answer \
         or exposes a gap in it. Output only the question.\n\n\
         {PLAIN_TEXT}",
        profile = profile_section(state),
    )
}

/// Ask for a 10-day preparation plan.
pub fn plan_prompt(state: &ConversationState) -> String {
    format!(
        "You are an interview preparation coach.\n\n\
         {profile}\n\n\
         Create a concise 10-day interview preparation plan for this candidate. \
         For each day list the topics to study, 1-2 practical tasks, and one mock \
         question to practise. Lean on the strengths and spend extra time on the \
         weaknesses.\n\n\
         {PLAIN_TEXT}",
        profile = profile_section(state),
    )
}

/// Ask for a recruiter-style review of resume text.
pub fn resume_review_prompt(resume_text: &str) -> String {
    format!(
        "You are a technical recruiter reviewing a resume.\n\n\
         Resume:\n{resume_text}\n\n\
         List exactly 3 strengths and exactly 3 concrete fixes. \
         Keep the whole review under 120 words.\n\n\
         {PLAIN_TEXT}"
    )
}

/// Ask what a question is probing and how to structure a strong answer.
pub fn explain_prompt(state: &ConversationState, question: &str) -> String {
    format!(
        "You are an interview coach.\n\n\
         {profile}\n\n\
         Question: {question}\n\n\
         Briefly explain what the interviewer is trying to learn with this question, \
         then outline the structure of a strong answer for this candidate in 3-5 steps. \
         Keep it under 150 words.\n\n\
         {PLAIN_TEXT}",
        profile = profile_section(state),
    )
}
