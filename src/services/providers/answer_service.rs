/// HTTP client for the external answering service
///
/// API Flow:
/// 1. POST /ask with `{prompt, max_iterations?}`
/// 2. Reply is `{"response": ...}` on success or `{"error": ...}` / `{"detail": ...}`
///    on failure
use crate::{
    error::{AppError, AppResult},
    services::providers::AnswerService,
};
use reqwest::Client as HttpClient;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const NO_RESPONSE: &str = "No response received";

#[derive(Clone)]
pub struct HttpAnswerService {
    http_client: HttpClient,
    api_url: String,
}

#[derive(Debug, Serialize)]
struct AskPayload<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_iterations: Option<u32>,
}

impl HttpAnswerService {
    pub fn new(api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Pulls the answer text out of a successful reply body
///
/// A string response is used as is, an object's `result` field is preferred,
/// any other object is pretty-printed. A reply carrying only an `error` is a
/// failure; an empty reply yields a fixed placeholder.
pub fn extract_answer(body: &Value) -> AppResult<String> {
    match body.get("response") {
        Some(Value::String(text)) if !text.is_empty() => Ok(text.clone()),
        Some(Value::Object(map)) => Ok(match map.get("result") {
            Some(result) if is_truthy(result) => value_to_text(result),
            _ => serde_json::to_string_pretty(map).unwrap_or_else(|_| NO_RESPONSE.to_string()),
        }),
        _ => match body.get("error").and_then(Value::as_str) {
            Some(error) if !error.is_empty() => Err(AppError::AnswerService(error.to_string())),
            _ => Ok(NO_RESPONSE.to_string()),
        },
    }
}

/// Error text from a failed reply body: `detail`, then `error`
pub fn extract_error(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["detail", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

#[async_trait::async_trait]
impl AnswerService for HttpAnswerService {
    async fn answer(&self, prompt: &str, max_iterations: Option<u32>) -> AppResult<String> {
        let url = format!("{}/ask", self.api_url);

        let response = self
            .http_client
            .post(&url)
            .json(&AskPayload {
                prompt,
                max_iterations,
            })
            .send()
            .await
            .map_err(|e| AppError::AnswerService(format!("Answer service unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Answer service returned an error");
            return Err(AppError::AnswerService(extract_error(status, &body)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::AnswerService(format!("Invalid answer service reply: {}", e)))?;

        extract_answer(&body)
    }

    fn name(&self) -> &'static str {
        "http-answer-service"
    }
}
