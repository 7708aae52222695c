// src/services/ai.rs

//! Chat-completion client for the structuring engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::AiConfig;

/// A text-generation backend that answers one system + user prompt pair.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
}

impl OpenAiClient {
    pub fn new(config: &AiConfig, http_client: reqwest::Client) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AppError::config(
                "AI API key is not set (ai.api_key or OPENAI_API_KEY)",
            ));
        }
        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn request<'a>(&'a self, system: &'a str, user: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request(system, user))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::warn!("AI API error {}: {}", status, error_text);
            return Err(AppError::ai(format!("{status}: {error_text}")));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::ai("response contained no choices"))?;

        log::debug!(
            "AI completion with {} took {}ms",
            self.model,
            start.elapsed().as_millis()
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AiConfig {
        AiConfig {
            api_key: "sk-test".into(),
            base_url: "https://llm.example/v1/".into(),
            ..AiConfig::default()
        }
    }

    #[test]
    fn test_requires_api_key() {
        let err = OpenAiClient::new(&AiConfig::default(), reqwest::Client::new());
        assert!(matches!(err, Err(AppError::Config(_))));
    }

    #[test]
    fn test_request_shape() {
        let client = OpenAiClient::new(&config(), reqwest::Client::new()).unwrap();
        assert_eq!(client.base_url, "https://llm.example/v1");

        let body = serde_json::to_value(client.request("rules", "{\"title\":\"x\"}")).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "rules");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_response_decoding() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"{}"}}]}"#;
        let chat: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(chat.choices[0].message.content.as_deref(), Some("{}"));

        let empty: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.choices.is_empty());
    }
}
