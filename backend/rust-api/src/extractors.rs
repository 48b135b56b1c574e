use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// JSON extractor that returns JSON error responses instead of HTML, and
/// additionally accepts JSON carried in `text/plain` bodies. Browsers'
/// `navigator.sendBeacon` posts exactly that shape on page unload.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("application/json"))
            .unwrap_or(false);

        if is_json {
            return match Json::<T>::from_request(req, state).await {
                Ok(Json(value)) => Ok(AppJson(value)),
                Err(rejection) => Err(reject(format!(
                    "Failed to parse JSON request body: {}",
                    rejection
                ))),
            };
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| reject(format!("Failed to read request body: {}", rejection)))?;

        serde_json::from_slice(&bytes)
            .map(AppJson)
            .map_err(|e| reject(format!("Failed to parse request body as JSON: {}", e)))
    }
}

fn reject(message: String) -> Response {
    tracing::warn!("{}", message);
    let error_response = json!({
        "message": message,
        "status": 400
    });
    (StatusCode::BAD_REQUEST, Json(error_response)).into_response()
}
