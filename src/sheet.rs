use crate::hub::{self, HubError, TemplateStore};
use crate::llm::{ChatMessage, ChatModel, LlmError};
use crate::models::EnrichedRow;
use crate::prompts;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("template pull failed: {0}")]
    Hub(#[from] HubError),
    #[error("llm request failed: {0}")]
    Llm(#[from] LlmError),
}

/// Renders the generation template with the enriched row and asks the text
/// model for a JSON-object spec sheet. Returns the raw JSON text; schema
/// conformance is deferred to the flattening stage, which fails soft.
pub struct SpecGenerator {
    llm: Arc<dyn ChatModel>,
    hub: Arc<dyn TemplateStore>,
    prompt_name: String,
}

impl SpecGenerator {
    pub fn new(llm: Arc<dyn ChatModel>, hub: Arc<dyn TemplateStore>, prompt_name: String) -> Self {
        Self {
            llm,
            hub,
            prompt_name,
        }
    }

    pub async fn generate(&self, row: &EnrichedRow) -> Result<String, SheetError> {
        let template = self.hub.pull(&self.prompt_name).await?;
        let product_data = row.product_data_json().to_string();
        let example = prompts::seo_generation_example().to_string();
        let prompt = hub::render(
            &template,
            &[
                ("product_data", product_data.as_str()),
                ("example_response", example.as_str()),
            ],
        );

        let text = self.llm.complete_json(&[ChatMessage::system(prompt)]).await?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Enrichment;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct RecordingModel {
        seen: Mutex<Vec<(String, String)>>,
        reply: String,
    }

    #[async_trait]
    impl ChatModel for RecordingModel {
        async fn complete_json(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
            let mut seen = self.seen.lock().unwrap();
            for message in messages {
                seen.push((message.role.clone(), message.content.clone()));
            }
            Ok(self.reply.clone())
        }

        async fn describe_image(&self, _: &str, _: &str) -> Result<String, LlmError> {
            unreachable!("generator never sends images")
        }
    }

    struct FixedHub(&'static str);

    #[async_trait]
    impl TemplateStore for FixedHub {
        async fn pull(&self, _name: &str) -> Result<String, HubError> {
            Ok(self.0.to_string())
        }
    }

    fn sample_row() -> EnrichedRow {
        let mut fields = BTreeMap::new();
        fields.insert("name".into(), "Botas de montaña".into());
        EnrichedRow {
            sku: "123".into(),
            url: "https://example.com/a.jpg".into(),
            fields,
            top_title: Enrichment::Value("1 - A".into()),
            image_description: Enrichment::Value("Bota marrón".into()),
        }
    }

    #[tokio::test]
    async fn generate_renders_row_and_example_into_system_prompt() {
        let model = Arc::new(RecordingModel {
            seen: Mutex::new(Vec::new()),
            reply: r#"{"SEO_Title":"x"}"#.into(),
        });
        let generator = SpecGenerator::new(
            model.clone(),
            Arc::new(FixedHub("Producto: {product_data}\nEjemplo: {example_response}")),
            "generate".into(),
        );

        let raw = generator.generate(&sample_row()).await.expect("generate");
        assert_eq!(raw, r#"{"SEO_Title":"x"}"#);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (role, content) = &seen[0];
        assert_eq!(role, "system");
        assert!(content.contains("Botas de montaña"));
        assert!(content.contains("JSON-LD_Marker"));
        assert!(!content.contains("{product_data}"));
    }
}
