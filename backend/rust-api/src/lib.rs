use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    // The client is served from another origin during the study, so the API
    // stays permissive like the deployment always has been.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any);

    let serve_client = app_state.config.app_env == "prod";
    let client_build_dir = app_state.config.client_build_dir.clone();

    let router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        // Interaction logging
        .route("/api/log-attempt", post(handlers::interactions::log_attempt))
        .route(
            "/api/log-interaction",
            post(handlers::interactions::log_interaction),
        )
        .route(
            "/api/log-test-event",
            post(handlers::interactions::log_test_event),
        )
        .route(
            "/api/create-session",
            get(handlers::interactions::create_session),
        )
        // Student records
        .route(
            "/api/student-progress/{student_id}",
            get(handlers::students::get_progress),
        )
        .route(
            "/api/student-progress",
            post(handlers::students::update_progress),
        )
        .route(
            "/api/student-test-progress/{student_id}",
            get(handlers::students::get_test_progress),
        )
        .route(
            "/api/student-test-progress",
            post(handlers::students::update_test_progress),
        )
        .route("/api/student/{id}", get(handlers::students::get_student))
        .route(
            "/api/storeConversation",
            post(handlers::students::store_conversation),
        )
        .route(
            "/api/checkConsent/{student_id}",
            get(handlers::students::check_consent),
        )
        .route("/api/storeConsent", post(handlers::students::store_consent))
        .route("/api/login", post(handlers::students::login))
        .route("/api/submit-test", post(handlers::students::submit_test))
        .route("/api/reveal-answer", post(handlers::students::reveal_answer))
        // Code execution proxy
        .route("/api/execute", post(handlers::execution::execute))
        // Tutoring endpoints
        .route("/api/debug", post(handlers::tutor::debug_hint))
        .route("/api/mcq-feedback", post(handlers::tutor::mcq_feedback))
        .route("/api/check-question", post(handlers::tutor::check_question))
        .route("/api/chat", post(handlers::tutor::chat))
        .with_state(app_state)
        .layer(cors)
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(TraceLayer::new_for_http());

    if serve_client {
        let index = format!("{}/index.html", client_build_dir);
        router.fallback_service(ServeDir::new(client_build_dir).fallback(ServeFile::new(index)))
    } else {
        router
    }
}
