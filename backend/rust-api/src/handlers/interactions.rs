use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    extractors::AppJson,
    models::interaction::{LogAttemptRequest, LogInteractionRequest, LogTestEventRequest},
    services::{interaction_service::InteractionService, AppState},
};

pub async fn log_attempt(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LogAttemptRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = InteractionService::new(state.mongo.clone());

    match service.log_attempt(&req).await {
        Ok(()) => Ok((StatusCode::OK, "Attempt logged")),
        Err(e) => {
            tracing::error!("Error logging attempt: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to log attempt".to_string(),
            ))
        }
    }
}

pub async fn log_interaction(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LogInteractionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = InteractionService::new(state.mongo.clone());

    match service.log_interaction(&req).await {
        Ok(()) => Ok((StatusCode::OK, "Bot message logged")),
        Err(e) => {
            tracing::error!("Error logging bot message: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to log bot message".to_string(),
            ))
        }
    }
}

pub async fn log_test_event(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LogTestEventRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = InteractionService::new(state.mongo.clone());

    match service.log_test_event(&req).await {
        Ok(()) => Ok((StatusCode::OK, "Test event logged")),
        Err(e) => {
            tracing::error!("Error logging test event: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to log test event".to_string(),
            ))
        }
    }
}

/// Sessions are stateless: a fresh id is all the client needs, and every
/// logged interaction carries it from then on.
pub async fn create_session() -> impl IntoResponse {
    let session_id = Uuid::new_v4().to_string();
    Json(json!({ "sessionId": session_id }))
}
