use crate::http::{browser_headers, build_client};
use crate::hub::TemplateStore;
use crate::llm::ChatModel;
use crate::models::Enrichment;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("{0}")]
    Transport(String),
}

/// Raw image download, fakeable in tests.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpImageFetcher {
    http: Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self {
            http: build_client(),
        }
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .http
            .get(url)
            .headers(browser_headers())
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Fetches an image, inlines it as a base64 data URI and asks the vision
/// model for a natural-language description. Every failure degrades to a
/// recorded `Enrichment::Failed`; a bad image never aborts the batch.
pub struct ImageDescriber {
    fetcher: Arc<dyn ImageFetcher>,
    llm: Arc<dyn ChatModel>,
    hub: Arc<dyn TemplateStore>,
    prompt_name: String,
}

impl ImageDescriber {
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        llm: Arc<dyn ChatModel>,
        hub: Arc<dyn TemplateStore>,
        prompt_name: String,
    ) -> Self {
        Self {
            fetcher,
            llm,
            hub,
            prompt_name,
        }
    }

    pub async fn describe(&self, url: &str) -> Enrichment {
        let bytes = match self.fetcher.fetch(url).await {
            Ok(bytes) => bytes,
            Err(FetchError::Status(code)) => {
                warn!(target = "seosheet.describer", url = url, status = code, "image_fetch_failed");
                return Enrichment::Failed(format!(
                    "Error {code}: unable to download the image"
                ));
            }
            Err(FetchError::Transport(reason)) => {
                warn!(target = "seosheet.describer", url = url, error = %reason, "image_fetch_failed");
                return Enrichment::Failed(format!(
                    "Error: unable to download the image ({reason})"
                ));
            }
        };

        let instruction = match self.hub.pull(&self.prompt_name).await {
            Ok(template) => template,
            Err(err) => {
                warn!(target = "seosheet.describer", error = %err, "prompt_pull_failed");
                return Enrichment::Failed(err.to_string());
            }
        };

        let data_uri = format!("data:image/jpeg;base64,{}", BASE64.encode(&bytes));
        match self.llm.describe_image(&instruction, &data_uri).await {
            Ok(text) => Enrichment::Value(text),
            Err(err) => {
                warn!(target = "seosheet.describer", url = url, error = %err, "vision_call_failed");
                Enrichment::Failed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatMessage, LlmError};

    struct StaticFetcher(Result<Vec<u8>, u16>);

    #[async_trait]
    impl ImageFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            match &self.0 {
                Ok(bytes) => Ok(bytes.clone()),
                Err(code) => Err(FetchError::Status(*code)),
            }
        }
    }

    struct EchoModel;

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn complete_json(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
            Ok(String::new())
        }

        async fn describe_image(
            &self,
            _instruction: &str,
            image_data_uri: &str,
        ) -> Result<String, LlmError> {
            Ok(format!("described {image_data_uri}"))
        }
    }

    struct FixedHub;

    #[async_trait]
    impl TemplateStore for FixedHub {
        async fn pull(&self, _name: &str) -> Result<String, crate::hub::HubError> {
            Ok("Describe the product image.".into())
        }
    }

    fn describer(fetcher: StaticFetcher) -> ImageDescriber {
        ImageDescriber::new(
            Arc::new(fetcher),
            Arc::new(EchoModel),
            Arc::new(FixedHub),
            "read_images".into(),
        )
    }

    #[tokio::test]
    async fn unreachable_image_reports_status_in_failure() {
        let describer = describer(StaticFetcher(Err(404)));
        let outcome = describer.describe("https://example.com/missing.jpg").await;
        let reason = outcome.failure().expect("should record failure");
        assert!(reason.contains("404"));
        assert!(reason.contains("unable to download the image"));
    }

    #[tokio::test]
    async fn fetched_image_is_inlined_as_data_uri() {
        let describer = describer(StaticFetcher(Ok(vec![1, 2, 3])));
        let outcome = describer.describe("https://example.com/a.jpg").await;
        let text = outcome.value().expect("should describe");
        assert!(text.starts_with("described data:image/jpeg;base64,"));
        assert!(text.contains(&BASE64.encode([1u8, 2, 3])));
    }
}
