use crate::config::HubConfig;
use crate::http::build_client;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response: {0}")]
    Deserialize(String),
}

/// Keyed lookup of prompt templates from the remote store.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn pull(&self, name: &str) -> Result<String, HubError>;
}

#[derive(Debug, Clone)]
pub struct PromptHubClient {
    config: HubConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct TemplatePayload {
    template: String,
}

impl PromptHubClient {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            http: build_client(),
        }
    }
}

#[async_trait]
impl TemplateStore for PromptHubClient {
    async fn pull(&self, name: &str) -> Result<String, HubError> {
        let url = format!("{}/templates/{}", self.config.base_url, name);
        let mut request = self.http.get(url);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|err| HubError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(HubError::Request(format!("HTTP {}", response.status())));
        }

        let payload: TemplatePayload = response
            .json()
            .await
            .map_err(|err| HubError::Deserialize(err.to_string()))?;
        Ok(payload.template)
    }
}

/// Substitute `{key}` placeholders in a pulled template. Unknown
/// placeholders are left in place so a template/parameter mismatch is
/// visible in the rendered prompt rather than silently blanked.
pub fn render(template: &str, params: &[(&str, &str)]) -> String {
    let mut rendered = template.to_string();
    for (key, value) in params {
        rendered = rendered.replace(&format!("{{{key}}}"), value);
    }
    rendered
}
