mod common;

use axum::body::to_bytes;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn body_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn root_announces_liveness() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"Backend is live!");
}

#[tokio::test]
async fn create_session_returns_a_fresh_uuid() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/create-session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let session_id = json["sessionId"].as_str().unwrap();
    Uuid::parse_str(session_id).expect("session id must be a UUID");
}

#[tokio::test]
async fn debug_with_all_correct_answers_never_calls_the_model() {
    let app = common::create_test_app().await;

    // The configured OpenAI key is empty in tests; reaching the model would
    // fail loudly, so a 200 here proves the short-circuit.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/debug")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&json!({
                        "problemStatement": "Fix the loop",
                        "templateCode": "for (int i = 0; i < n; ___) {}",
                        "userAnswers": ["i++"],
                        "correctAnswers": ["i++"],
                        "hintCounterFrontend": 0
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["suggestion"], "All answers are correct! Great job!");
}

#[tokio::test]
async fn debug_with_unequal_answer_counts_is_a_bad_request() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/debug")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&json!({
                        "problemStatement": "Fix the loop",
                        "templateCode": "...",
                        "userAnswers": ["a", "b"],
                        "correctAnswers": ["a", "b", "c"]
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("answer count"));
}

#[tokio::test]
async fn debug_with_missing_fields_is_rejected_with_a_json_error() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/debug")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["status"], 400);
    assert!(json["message"].as_str().is_some());
}

#[tokio::test]
async fn debug_accepts_json_sent_as_text_plain() {
    let app = common::create_test_app().await;

    // sendBeacon posts JSON with a text/plain content type.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/debug")
                .header("content-type", "text/plain;charset=UTF-8")
                .body(Body::from(
                    serde_json::to_string(&json!({
                        "problemStatement": "Fix the loop",
                        "templateCode": "...",
                        "userAnswers": ["x"],
                        "correctAnswers": ["x"]
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["suggestion"], "All answers are correct! Great job!");
}

#[tokio::test]
async fn mcq_with_the_right_answer_congratulates_without_a_model_call() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/mcq-feedback")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&json!({
                        "problemStatement": "Capital of France?",
                        "code": "// n/a",
                        "options": ["Paris", "Lyon"],
                        "userAnswer": "Paris ",
                        "correctAnswers": ["Paris"]
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["feedback"],
        "🎉 Congratulations! You got the right answer! You can move on."
    );
}

#[tokio::test]
async fn mcq_accepts_a_bare_string_for_correct_answers() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/mcq-feedback")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&json!({
                        "problemStatement": "Capital of France?",
                        "code": "// n/a",
                        "options": ["Paris", "Lyon"],
                        "userAnswer": "Paris",
                        "correctAnswers": "Paris"
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["feedback"].as_str().is_some());
}

#[tokio::test]
async fn metrics_requires_basic_auth() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
