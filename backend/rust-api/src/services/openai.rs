//! Minimal OpenAI chat-completions client for the tutoring endpoints.
//!
//! Only plain-text completions are used. Calls log model, latency and token
//! usage, never payload contents or the API key.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::metrics::LLM_REQUESTS_TOTAL;
use crate::services::hint_engine::{HintCompletion, LeakEvaluator};

const EVALUATOR_SYSTEM: &str = "You are an evaluator.";
const CHECK_QUESTION_SYSTEM: &str = "You are a helpful assistant.";

#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String, model: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build OpenAI HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url,
            model,
        })
    }

    async fn chat(&self, system: &str, user: &str) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessageReq {
                    role: "system".into(),
                    content: system.into(),
                },
                ChatMessageReq {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
        };

        let started = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .header(USER_AGENT, "javatutor-api/0.1")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .context("OpenAI request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = extract_api_error(&body).unwrap_or(body);
            LLM_REQUESTS_TOTAL.with_label_values(&["error"]).inc();
            return Err(anyhow!("OpenAI HTTP {}: {}", status, message));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to decode OpenAI response")?;

        if let Some(usage) = &body.usage {
            tracing::info!(
                model = %self.model,
                elapsed_ms = started.elapsed().as_millis() as u64,
                prompt_tokens = ?usage.prompt_tokens,
                completion_tokens = ?usage.completion_tokens,
                "OpenAI usage"
            );
        }
        LLM_REQUESTS_TOTAL.with_label_values(&["ok"]).inc();

        let text = body
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(text)
    }

    /// Classifies whether the student is explicitly asking for the answer.
    /// The raw model verdict is returned so the route can pass it through.
    pub async fn classify_direct_answer_request(&self, question: &str) -> anyhow::Result<String> {
        let prompt = format!(
            "You are an evaluator. Based on the student's question, determine whether it is explicitly asking for the correct answer (i.e., directly requesting the solution or asking for code or an explanation to solve the problem, rather than asking for help or clarification). Respond with only:\n\
             Yes — if the student is explicitly asking for the answer or asking for code or an explanation that would give them the answer.\n\
             No — if the student is asking for help, guidance, or clarification but not directly asking for the answer or code.\n\
             Do not provide explanations or partial answers. Respond with only \"Yes\" or \"No.\"\n\
             Question: {question}"
        );

        self.chat(CHECK_QUESTION_SYSTEM, &prompt).await
    }
}

#[async_trait]
impl HintCompletion for OpenAiClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<String> {
        self.chat(system_prompt, user_prompt).await
    }
}

#[async_trait]
impl LeakEvaluator for OpenAiClient {
    async fn leaks_answer(&self, reference_answer: &str, candidate: &str) -> anyhow::Result<bool> {
        let prompt = format!(
            "You are an evaluator.\n\
             Based on the reference answer below, determine whether the given paragraph explicitly contains the correct answer(s) — that is,\n\
             the exact keyword(s) or phrase(s) as given. If the reference answer is not explicitly written in the paragraph,\n\
             respond with only: No. If it is explicitly written, respond with only: Yes.\n\
             Do not make inferences or accept paraphrased descriptions. Do not include any explanation.\n\
             \n\
             Reference Answer:\n\
             {reference_answer}\n\
             \n\
             Student Paragraph:\n\
             {candidate}"
        );

        let verdict = self.chat(EVALUATOR_SYSTEM, &prompt).await?;

        // Anything other than an explicit Yes counts as safe.
        Ok(verdict.contains("Yes"))
    }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessageReq>,
}

#[derive(Serialize)]
struct ChatMessageReq {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResp,
}

#[derive(Deserialize)]
struct ChatMessageResp {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}

/// Pulls the human-readable message out of an OpenAI error body, if any.
fn extract_api_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorWrap {
        error: ErrorObj,
    }
    #[derive(Deserialize)]
    struct ErrorObj {
        message: String,
    }

    serde_json::from_str::<ErrorWrap>(body)
        .ok()
        .map(|wrap| wrap.error.message)
}
