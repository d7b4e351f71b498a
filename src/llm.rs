use crate::config::LlmConfig;
use crate::http::build_client;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("http error: {0}")]
    Http(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }
}

/// Narrow chat-completion capability so tests can substitute a
/// deterministic fake for the remote provider. Text generation is always
/// JSON-object constrained; only the vision path returns free text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete a chat in JSON-object response mode and return the raw
    /// message text.
    async fn complete_json(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Describe an inline image (data URI) given a text instruction.
    async fn describe_image(
        &self,
        instruction: &str,
        image_data_uri: &str,
    ) -> Result<String, LlmError>;
}

pub struct OpenAiClient {
    http: Client,
    config: LlmConfig,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            http: build_client(),
            config,
        }
    }

    async fn post_completion(&self, body: Value) -> Result<String, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| LlmError::Http(err.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::Http(format!("HTTP {}", response.status())));
        }

        let payload: CompletionResponse = response
            .json()
            .await
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("missing message content".into()))
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete_json(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let body = json!({
            "model": self.config.model,
            "response_format": {"type": "json_object"},
            "messages": messages,
        });
        self.post_completion(body).await
    }

    async fn describe_image(
        &self,
        instruction: &str,
        image_data_uri: &str,
    ) -> Result<String, LlmError> {
        let body = json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": instruction},
                    {"type": "image_url", "image_url": {"url": image_data_uri}},
                ],
            }],
        });
        self.post_completion(body).await
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_response_takes_first_choice() {
        let raw = r#"{"choices":[{"message":{"content":"hola"}},{"message":{"content":"no"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);
        assert_eq!(text.as_deref(), Some("hola"));
    }

    #[test]
    fn completion_response_tolerates_null_content() {
        let raw = r#"{"choices":[{"message":{"content":null}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
