use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{extractors::AppJson, models::execution::ExecuteRequest, services::AppState};

/// Relays a code-execution request to the judge and passes its status and
/// body back to the client unchanged.
pub async fn execute(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<ExecuteRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        ));
    }

    match state.judge.execute(&req).await {
        Ok((status, body)) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            Ok((status, Json(body)))
        }
        Err(e) => {
            tracing::error!("Error communicating with the judge: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to execute code" })),
            ))
        }
    }
}
