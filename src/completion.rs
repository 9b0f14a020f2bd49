//! Chat-completion client used by the conversational fallback
//!
//! Speaks the OpenAI-compatible `/v1/chat/completions` protocol (x.ai Grok by default).
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::config::CompletionConfig;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Failure classification for a completion call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionErrorKind {
    /// No API key configured
    NotConfigured,
    /// Connection or transport failure
    Network,
    /// No answer within the deadline
    Timeout,
    /// Non-success HTTP status
    Status,
    /// Body did not contain a usable message
    Parse,
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct CompletionError {
    pub kind: CompletionErrorKind,
    pub message: String,
}

impl CompletionError {
    pub fn new(kind: CompletionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_configured() -> Self {
        Self::new(
            CompletionErrorKind::NotConfigured,
            "GROK_API_KEY not configured",
        )
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(CompletionErrorKind::Network, message)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            CompletionErrorKind::Timeout,
            format!("no completion after {}ms", after.as_millis()),
        )
    }

    pub fn status(message: impl Into<String>) -> Self {
        Self::new(CompletionErrorKind::Status, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(CompletionErrorKind::Parse, message)
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(CompletionErrorKind::Timeout, err.to_string())
        } else if err.is_decode() {
            Self::parse(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

/// Text-in, text-out language model
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> std::result::Result<String, CompletionError>;
}

/// Reusable chat-completions client (connection-pooled)
pub struct ChatCompletionsClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionService for ChatCompletionsClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> std::result::Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(CompletionError::not_configured)?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
        };

        debug!(model = %self.model, "Calling chat completions API");

        let response = self
            .client
            .post(self.api_url.as_str())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Completion request failed: {}", e);
                CompletionError::from_reqwest(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Completion API error response: {}", error_text);
            return Err(CompletionError::status(format!(
                "completion API returned {}",
                status
            )));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse completion response: {}", e);
            CompletionError::from_reqwest(e)
        })?;

        extract_answer(body)
    }
}

fn extract_answer(body: ChatResponse) -> std::result::Result<String, CompletionError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| CompletionError::parse("completion response had no message content"))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "grok-2",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a loan assistant.",
                },
                ChatMessage {
                    role: "user",
                    content: "what documents do I need?",
                },
            ],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "grok-2");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "what documents do I need?");
    }

    #[test]
    fn test_extract_answer() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Pick a loan type to begin."}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_answer(body).unwrap(), "Pick a loan type to begin.");
    }

    #[test]
    fn test_extract_answer_malformed() {
        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(extract_answer(empty).unwrap_err().kind, CompletionErrorKind::Parse);

        let missing: ChatResponse = serde_json::from_str(r#"{"error":"bad"}"#).unwrap();
        assert_eq!(extract_answer(missing).unwrap_err().kind, CompletionErrorKind::Parse);

        let null_content: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(
            extract_answer(null_content).unwrap_err().kind,
            CompletionErrorKind::Parse
        );
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = ChatCompletionsClient::new(&CompletionConfig::default()).unwrap();

        let err = client.complete("system", "hi").await.unwrap_err();

        assert_eq!(err.kind, CompletionErrorKind::NotConfigured);
        assert!(err.to_string().to_lowercase().contains("api_key"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let config = CompletionConfig {
            api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            api_key: Some("test".to_string()),
            timeout: Duration::from_secs(2),
            ..CompletionConfig::default()
        };
        let client = ChatCompletionsClient::new(&config).unwrap();

        let err = client.complete("system", "hi").await.unwrap_err();

        assert!(matches!(
            err.kind,
            CompletionErrorKind::Network | CompletionErrorKind::Timeout
        ));
    }
}
