use crate::describer::ImageDescriber;
use crate::flatten::strip_markdown_fence;
use crate::hub::{self, HubError, TemplateStore};
use crate::llm::{ChatMessage, ChatModel, LlmError};
use crate::models::Enrichment;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("template pull failed: {0}")]
    Hub(#[from] HubError),
    #[error("llm request failed: {0}")]
    Llm(#[from] LlmError),
    #[error("evaluation response is not valid JSON: {0}")]
    Parse(String),
}

/// Re-scores generated output against a fixed rubric via a second model
/// call: either a spec sheet against its source row, or an image
/// description (regenerated first) against the description rubric.
pub struct Evaluator {
    llm: Arc<dyn ChatModel>,
    hub: Arc<dyn TemplateStore>,
    sheet_prompt: String,
    description_prompt: String,
}

impl Evaluator {
    pub fn new(
        llm: Arc<dyn ChatModel>,
        hub: Arc<dyn TemplateStore>,
        sheet_prompt: String,
        description_prompt: String,
    ) -> Self {
        Self {
            llm,
            hub,
            sheet_prompt,
            description_prompt,
        }
    }

    /// Score a generated sheet against the source product JSON.
    pub async fn evaluate_sheet(&self, source: &Value, sheet: &str) -> Result<Value, EvalError> {
        let template = self.hub.pull(&self.sheet_prompt).await?;
        let example = crate::prompts::sheet_evaluation_example().to_string();
        let source_text = source.to_string();
        let prompt = hub::render(
            &template,
            &[
                ("json_data", source_text.as_str()),
                ("seo_technical_sheet", sheet),
                ("json_example", example.as_str()),
            ],
        );
        self.score(prompt).await
    }

    /// Regenerate a description for the image URL and score it against the
    /// description rubric. A failed fetch is scored on its error string,
    /// mirroring what the generation prompt would have seen.
    pub async fn evaluate_description(
        &self,
        describer: &ImageDescriber,
        url: &str,
    ) -> Result<Value, EvalError> {
        let description = match describer.describe(url).await {
            Enrichment::Value(text) => text,
            Enrichment::Failed(reason) => reason,
        };
        let template = self.hub.pull(&self.description_prompt).await?;
        let example = crate::prompts::description_evaluation_example().to_string();
        let prompt = hub::render(
            &template,
            &[
                ("description", description.as_str()),
                ("json_example", example.as_str()),
            ],
        );
        self.score(prompt).await
    }

    async fn score(&self, prompt: String) -> Result<Value, EvalError> {
        let raw = self.llm.complete_json(&[ChatMessage::system(prompt)]).await?;
        let cleaned = strip_markdown_fence(&raw);
        serde_json::from_str(&cleaned).map_err(|err| EvalError::Parse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describer::{FetchError, ImageFetcher};
    use async_trait::async_trait;
    use serde_json::json;

    struct CannedModel(&'static str);

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn complete_json(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
            assert_eq!(messages[0].role, "system");
            Ok(self.0.to_string())
        }

        async fn describe_image(&self, _: &str, _: &str) -> Result<String, LlmError> {
            Ok("Una bota marrón sobre fondo blanco".into())
        }
    }

    struct FixedHub;

    #[async_trait]
    impl TemplateStore for FixedHub {
        async fn pull(&self, name: &str) -> Result<String, HubError> {
            Ok(match name {
                "eval_sheet" => "Fuente: {json_data}\nFicha: {seo_technical_sheet}\nEjemplo: {json_example}".into(),
                _ => "Descripción: {description}\nEjemplo: {json_example}".into(),
            })
        }
    }

    struct NotFoundFetcher;

    #[async_trait]
    impl ImageFetcher for NotFoundFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::Status(503))
        }
    }

    fn evaluator(reply: &'static str) -> Evaluator {
        Evaluator::new(
            Arc::new(CannedModel(reply)),
            Arc::new(FixedHub),
            "eval_sheet".into(),
            "eval_description".into(),
        )
    }

    #[tokio::test]
    async fn sheet_evaluation_parses_scores() {
        let evaluator = evaluator(r#"{"evaluation":{"SEO_Title":4},"comments":{"SEO_Title":"bien"}}"#);
        let source = json!({"sku":"123","name":"Botas"});
        let scores = evaluator
            .evaluate_sheet(&source, r#"{"SEO_Title":"Botas de montaña"}"#)
            .await
            .expect("evaluate");
        assert_eq!(scores["evaluation"]["SEO_Title"], 4);
        assert_eq!(scores["comments"]["SEO_Title"], "bien");
    }

    #[tokio::test]
    async fn fenced_evaluation_response_is_accepted() {
        let evaluator = evaluator("```json\n{\"evaluation\":{}}\n```");
        let scores = evaluator
            .evaluate_sheet(&json!({}), "{}")
            .await
            .expect("evaluate");
        assert!(scores["evaluation"].is_object());
    }

    #[tokio::test]
    async fn non_json_evaluation_is_a_parse_error() {
        let evaluator = evaluator("lo siento, no puedo");
        let err = evaluator
            .evaluate_sheet(&json!({}), "{}")
            .await
            .expect_err("should fail");
        assert!(matches!(err, EvalError::Parse(_)));
    }

    #[tokio::test]
    async fn description_evaluation_scores_fetch_errors_too() {
        let evaluator = evaluator(r#"{"evaluation":{"Overall_Coherence":1}}"#);
        let describer = ImageDescriber::new(
            Arc::new(NotFoundFetcher),
            Arc::new(CannedModel("{}")),
            Arc::new(FixedHub),
            "read_images".into(),
        );
        let scores = evaluator
            .evaluate_description(&describer, "https://example.com/gone.jpg")
            .await
            .expect("evaluate");
        assert_eq!(scores["evaluation"]["Overall_Coherence"], 1);
    }
}
