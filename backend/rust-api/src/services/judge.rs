use anyhow::Context;
use reqwest::Client;
use serde_json::json;

use crate::metrics::JUDGE_EXECUTIONS_TOTAL;
use crate::models::execution::ExecuteRequest;

/// Proxy to the hosted code-execution judge. Credentials ride in the body,
/// the way the upstream API wants them; status and body are relayed to the
/// caller unchanged.
pub struct JudgeClient {
    http_client: Client,
    url: String,
    client_id: String,
    client_secret: String,
}

impl JudgeClient {
    pub fn new(url: String, client_id: String, client_secret: String) -> Self {
        Self {
            http_client: Client::new(),
            url,
            client_id,
            client_secret,
        }
    }

    /// Runs the submitted script upstream and returns the judge's HTTP status
    /// together with its JSON body.
    pub async fn execute(&self, req: &ExecuteRequest) -> anyhow::Result<(u16, serde_json::Value)> {
        let body = json!({
            "clientId": self.client_id,
            "clientSecret": self.client_secret,
            "script": req.script,
            "stdin": req.stdin,
            "language": req.language,
            "versionIndex": req.version_index,
        });

        let response = self
            .http_client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .context("Failed to reach code execution judge")?;

        let status = response.status().as_u16();
        let body: serde_json::Value = response
            .json()
            .await
            .context("Failed to decode judge response")?;

        let outcome = if (200..300).contains(&status) {
            "ok"
        } else {
            "error"
        };
        JUDGE_EXECUTIONS_TOTAL.with_label_values(&[outcome]).inc();
        tracing::info!(status, language = %req.language, "Code execution relayed");

        Ok((status, body))
    }
}
