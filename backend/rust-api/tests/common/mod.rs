use axum::Router;
use std::sync::Arc;

use javatutor_api::{config::Config, create_router, services::AppState};

/// Builds the full router with a lazy MongoDB client. No connection is made
/// until a route actually queries the store, and the tests here only drive
/// routes that never do.
pub async fn create_test_app() -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let config = Config::load().expect("Failed to load test configuration");

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to create test MongoDB client");

    let app_state = Arc::new(
        AppState::new(config, mongo_client).expect("Failed to initialize test app state"),
    );

    create_router(app_state)
}
