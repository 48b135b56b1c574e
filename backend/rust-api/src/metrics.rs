use axum::{extract::Request, middleware::Next, response::Response};
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Business Metrics
    pub static ref HINTS_GENERATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "hints_generated_total",
        "Total number of hints returned to students",
        &["kind"]
    )
    .unwrap();

    pub static ref HINT_LEAK_RETRIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "hint_leak_retries_total",
        "Candidate hints rejected for containing the reference answer",
        &["kind"]
    )
    .unwrap();

    pub static ref LLM_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "llm_requests_total",
        "Total number of model API calls",
        &["status"]
    )
    .unwrap();

    pub static ref INTERACTIONS_LOGGED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "interactions_logged_total",
        "Interaction documents written to the store",
        &["collection"]
    )
    .unwrap();

    pub static ref JUDGE_EXECUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "judge_executions_total",
        "Code executions relayed to the judge",
        &["status"]
    )
    .unwrap();
}

/// Records request count and duration for every route.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .start_timer();
    let response = next.run(request).await;
    timer.observe_duration();

    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Renders the registry in the Prometheus text exposition format.
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;

    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Invalid UTF-8 in metrics: {}", e)))
}
