use serde::{Deserialize, Serialize};
use validator::Validate;

use super::StringOrList;

/// Body of `POST /api/debug`: fill-in-the-blank debugging context plus the
/// caller-owned hint counter for this question in the current session.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DebugHintRequest {
    #[validate(length(min = 1, message = "problemStatement is required"))]
    pub problem_statement: String,
    #[validate(length(min = 1, message = "templateCode is required"))]
    pub template_code: String,
    pub user_answers: Vec<String>,
    pub correct_answers: Vec<String>,
    #[serde(default)]
    pub conversation_history: String,
    #[serde(default)]
    pub hint_counter_frontend: u32,
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub suggestion: String,
}

/// Body of `POST /api/mcq-feedback`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct McqFeedbackRequest {
    #[validate(length(min = 1, message = "problemStatement is required"))]
    pub problem_statement: String,
    #[validate(length(min = 1, message = "code is required"))]
    pub code: String,
    pub options: Vec<String>,
    #[validate(length(min = 1, message = "userAnswer is required"))]
    pub user_answer: String,
    pub correct_answers: StringOrList,
    #[serde(default)]
    pub conversation_history: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub feedback: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body of `POST /api/chat`: the running transcript plus the code the
/// student is working on.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[validate(length(min = 1, message = "messages are required"))]
    pub messages: Vec<ChatMessage>,
    #[validate(length(min = 1, message = "code is required"))]
    pub code: String,
    pub correct_answers: StringOrList,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckQuestionRequest {
    #[validate(length(min = 1, message = "question is required"))]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct CheckQuestionResponse {
    pub answer: String,
}
