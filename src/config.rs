use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var `{0}`")]
    MissingVar(&'static str),
}

/// Chat/vision model endpoint settings (OpenAI-compatible).
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl LlmConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            api_key: require("OPENAI_API_KEY")?,
            model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()),
        })
    }
}

/// Shopping-search provider settings. Locale parameters are fixed to the
/// Spanish storefront the catalog targets.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub base_url: String,
    pub api_key: String,
    pub language: String,
    pub region: String,
    pub location: String,
    pub result_count: u32,
}

impl SearchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env::var("SERPAPI_BASE_URL")
                .unwrap_or_else(|_| "https://serpapi.com".into()),
            api_key: require("SERPAPI_API_KEY")?,
            language: "es".into(),
            region: "es".into(),
            location: "Spain".into(),
            result_count: 9,
        })
    }
}

/// Remote prompt-template store settings.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl HubConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: require("PROMPT_HUB_URL")?.trim_end_matches('/').to_string(),
            api_key: env::var("PROMPT_HUB_API_KEY").ok(),
        })
    }
}

/// Names of the four templates pulled from the hub.
#[derive(Debug, Clone)]
pub struct PromptNames {
    pub generate_sheet: String,
    pub read_images: String,
    pub evaluate_sheet: String,
    pub evaluate_description: String,
}

impl PromptNames {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            generate_sheet: require("ID_GENERATE_SEO_SPEC_SHEET_PROMPT")?,
            read_images: require("ID_READ_IMAGES_PROMPT")?,
            evaluate_sheet: env::var("ID_EVALUATE_SEO_SPEC_SHEET_PROMPT")
                .unwrap_or_else(|_| "evaluation_generate_seo_spec_sheet_prompt".into()),
            evaluate_description: env::var("ID_EVALUATE_READ_IMAGES_PROMPT")
                .unwrap_or_else(|_| "evaluation_read_images".into()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct FilePaths {
    pub product_data: PathBuf,
    pub product_images: PathBuf,
    pub output: PathBuf,
}

impl FilePaths {
    pub fn from_env() -> Self {
        Self {
            product_data: env::var("PRODUCT_DATA_CSV")
                .unwrap_or_else(|_| "resources/product-data.csv".into())
                .into(),
            product_images: env::var("PRODUCT_IMAGES_CSV")
                .unwrap_or_else(|_| "resources/product-images.csv".into())
                .into(),
            output: env::var("OUTPUT_CSV")
                .unwrap_or_else(|_| "result/seo_technical_sheet.csv".into())
                .into(),
        }
    }
}

/// Optional re-scoring passes over the generated output.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationFlags {
    pub sheets: bool,
    pub descriptions: bool,
}

impl EvaluationFlags {
    pub fn from_env() -> Self {
        Self {
            sheets: parse_env_bool("EVALUATE_SHEETS"),
            descriptions: parse_env_bool("EVALUATE_DESCRIPTIONS"),
        }
    }
}

/// Full process configuration, built once at startup and passed into each
/// component at construction. Missing credentials fail here rather than
/// surfacing later as provider-side auth errors.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub hub: HubConfig,
    pub prompts: PromptNames,
    pub paths: FilePaths,
    pub evaluation: EvaluationFlags,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            llm: LlmConfig::from_env()?,
            search: SearchConfig::from_env()?,
            hub: HubConfig::from_env()?,
            prompts: PromptNames::from_env()?,
            paths: FilePaths::from_env(),
            evaluation: EvaluationFlags::from_env(),
        })
    }
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingVar(key))
}

pub fn parse_env_bool(key: &str) -> bool {
    match env::var(key) {
        Ok(value) => matches!(
            value.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => false,
    }
}
