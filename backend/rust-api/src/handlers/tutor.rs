use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    metrics::HINTS_GENERATED_TOTAL,
    models::hint::{
        ChatRequest, ChatResponse, CheckQuestionRequest, CheckQuestionResponse, DebugHintRequest,
        FeedbackResponse, McqFeedbackRequest, SuggestionResponse,
    },
    services::{
        answer_locator,
        hint_engine::{render_transcript, HintPrompt, SafeHintGenerator},
        AppState,
    },
};

const ALL_CORRECT_MESSAGE: &str = "All answers are correct! Great job!";
const MCQ_CORRECT_MESSAGE: &str = "🎉 Congratulations! You got the right answer! You can move on.";

/// Debugging hints for fill-in-the-blank code questions. The first wrong
/// blank drives the prompt; when every blank agrees no model call happens.
pub async fn debug_hint(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<DebugHintRequest>,
) -> Result<Json<SuggestionResponse>, TutorApiError> {
    req.validate()
        .map_err(|e| TutorApiError::bad_request(e.to_string()))?;

    let mismatch = answer_locator::locate(&req.user_answers, &req.correct_answers)
        .map_err(|e| TutorApiError::bad_request(e.to_string()))?;

    let Some(mismatch) = mismatch else {
        return Ok(Json(SuggestionResponse {
            suggestion: ALL_CORRECT_MESSAGE.to_string(),
        }));
    };

    tracing::info!(
        blank = mismatch.index + 1,
        hint_counter = req.hint_counter_frontend,
        "Generating debugging hint"
    );

    let prompt = HintPrompt::debugging(
        &req.problem_statement,
        &req.template_code,
        &req.conversation_history,
        req.hint_counter_frontend,
        &mismatch,
    );

    let generator = SafeHintGenerator::new(&state.openai, &state.openai);
    let suggestion = generator
        .generate(&prompt)
        .await
        .map_err(|e| TutorApiError::upstream(e, "Failed to fetch debugging suggestions."))?;

    HINTS_GENERATED_TOTAL.with_label_values(&["debug"]).inc();
    Ok(Json(SuggestionResponse { suggestion }))
}

/// Feedback on a wrong MCQ selection. A correct selection short-circuits to
/// the congratulations message; the hint path never names the right option.
pub async fn mcq_feedback(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<McqFeedbackRequest>,
) -> Result<Response, TutorApiError> {
    req.validate()
        .map_err(|e| TutorApiError::bad_request(e.to_string()))?;

    let accepted = req.correct_answers.clone().into_vec();
    if answer_locator::mcq_answer_is_correct(&req.user_answer, &accepted) {
        return Ok(Json(FeedbackResponse {
            feedback: MCQ_CORRECT_MESSAGE.to_string(),
        })
        .into_response());
    }

    let prompt = HintPrompt::mcq(
        &req.problem_statement,
        &req.code,
        &req.options,
        &req.user_answer,
        &accepted,
        &req.conversation_history,
    );

    let generator = SafeHintGenerator::new(&state.openai, &state.openai);
    let suggestion = generator
        .generate(&prompt)
        .await
        .map_err(|e| TutorApiError::upstream(e, "Failed to fetch MCQ feedback."))?;

    HINTS_GENERATED_TOTAL.with_label_values(&["mcq"]).inc();
    Ok(Json(SuggestionResponse { suggestion }).into_response())
}

/// Free-form chat over the question's code.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<ChatRequest>,
) -> Result<Json<ChatResponse>, TutorApiError> {
    req.validate()
        .map_err(|e| TutorApiError::bad_request(e.to_string()))?;

    let transcript = render_transcript(
        req.messages
            .iter()
            .map(|m| (m.role.as_str(), m.content.as_str())),
    );
    let reference_answer = req.correct_answers.clone().into_vec().join(", ");

    let prompt = HintPrompt::chat(&req.code, &transcript, reference_answer);

    let generator = SafeHintGenerator::new(&state.openai, &state.openai);
    let response = generator
        .generate(&prompt)
        .await
        .map_err(|e| TutorApiError::upstream(e, "Failed to fetch response from the tutor."))?;

    HINTS_GENERATED_TOTAL.with_label_values(&["chat"]).inc();
    Ok(Json(ChatResponse { response }))
}

/// Classifies whether the student is directly asking for the answer. The
/// model's verdict is passed through verbatim.
pub async fn check_question(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CheckQuestionRequest>,
) -> Result<Json<CheckQuestionResponse>, TutorApiError> {
    req.validate()
        .map_err(|e| TutorApiError::bad_request(e.to_string()))?;

    let answer = state
        .openai
        .classify_direct_answer_request(&req.question)
        .await
        .map_err(|e| TutorApiError::upstream(e, "Failed to check question."))?;

    Ok(Json(CheckQuestionResponse { answer }))
}

#[derive(Debug)]
pub enum TutorApiError {
    BadRequest(String),
    Upstream(&'static str),
}

impl TutorApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        TutorApiError::BadRequest(message.into())
    }

    /// Internal failures get logged in full; the client sees only the
    /// route's generic error message.
    fn upstream<E: std::fmt::Display>(err: E, message: &'static str) -> Self {
        tracing::error!("Tutoring call failed: {}", err);
        TutorApiError::Upstream(message)
    }
}

impl IntoResponse for TutorApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            TutorApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            TutorApiError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
