use crate::config::AppConfig;
use crate::describer::{HttpImageFetcher, ImageDescriber, ImageFetcher};
use crate::evaluator::Evaluator;
use crate::flatten::flatten_response;
use crate::hub::{PromptHubClient, TemplateStore};
use crate::llm::{ChatModel, OpenAiClient};
use crate::models::{BatchReport, Enrichment, FlatRow, OutputRow, RowReport, StageReport};
use crate::search::{self, SerpClient, ShoppingSearch};
use crate::sheet::SpecGenerator;
use crate::table::{self, TableError};
use chrono::Utc;
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("stage `{stage}` failed: {message}")]
pub struct PipelineError {
    stage: &'static str,
    message: String,
    kind: PipelineErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    InvalidInput,
    Internal,
}

impl PipelineError {
    pub fn invalid_input(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::InvalidInput,
        }
    }

    pub fn internal(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::Internal,
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn kind(&self) -> PipelineErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.message
    }
}

fn table_error(stage: &'static str, err: TableError) -> PipelineError {
    match err {
        TableError::MissingColumn { .. } => PipelineError::invalid_input(stage, err.to_string()),
        other => PipelineError::internal(stage, other.to_string()),
    }
}

/// Sequential per-row orchestration: load and join the two tables, then per
/// product describe the main image, look up competitors, generate the spec
/// sheet and flatten it. Per-row failures degrade that row and are recorded
/// in its transcript; only configuration and file I/O abort the batch.
pub struct Pipeline {
    config: Arc<AppConfig>,
    describer: ImageDescriber,
    search: Arc<dyn ShoppingSearch>,
    generator: SpecGenerator,
    evaluator: Evaluator,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        let llm: Arc<dyn ChatModel> = Arc::new(OpenAiClient::new(config.llm.clone()));
        let hub: Arc<dyn TemplateStore> = Arc::new(PromptHubClient::new(config.hub.clone()));
        let search: Arc<dyn ShoppingSearch> = Arc::new(SerpClient::new(config.search.clone()));
        let fetcher: Arc<dyn ImageFetcher> = Arc::new(HttpImageFetcher::new());
        Self::with_clients(config, llm, hub, search, fetcher)
    }

    /// Wire explicit clients; tests pass deterministic fakes here.
    pub fn with_clients(
        config: AppConfig,
        llm: Arc<dyn ChatModel>,
        hub: Arc<dyn TemplateStore>,
        search: Arc<dyn ShoppingSearch>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        let describer = ImageDescriber::new(
            fetcher,
            llm.clone(),
            hub.clone(),
            config.prompts.read_images.clone(),
        );
        let generator = SpecGenerator::new(
            llm.clone(),
            hub.clone(),
            config.prompts.generate_sheet.clone(),
        );
        let evaluator = Evaluator::new(
            llm,
            hub,
            config.prompts.evaluate_sheet.clone(),
            config.prompts.evaluate_description.clone(),
        );
        Self {
            config: Arc::new(config),
            describer,
            search,
            generator,
            evaluator,
        }
    }

    pub async fn run(&self) -> Result<BatchReport, PipelineError> {
        let started = Utc::now();
        let run_id = Uuid::new_v4();

        let products = table::load_products(&self.config.paths.product_data)
            .map_err(|err| table_error("load_tables", err))?;
        let images = table::load_images(&self.config.paths.product_images)
            .map_err(|err| table_error("load_tables", err))?;
        let (joined, dropped) = table::join_main_images(products, &images);
        if dropped > 0 {
            info!(
                target = "seosheet.pipeline",
                dropped = dropped,
                "products_without_main_image_dropped"
            );
        }

        let mut reports = Vec::new();
        let mut outputs = Vec::new();
        for row in joined {
            let mut report = RowReport::new(&row.sku);

            let image_description = capture(
                &mut report,
                "describe_image",
                self.describer.describe(&row.url),
                enrichment_output,
            )
            .await;

            let name = row.fields.get("name").cloned().unwrap_or_default();
            let top_title = capture(
                &mut report,
                "competitor_lookup",
                self.lookup_competitors(&name),
                enrichment_output,
            )
            .await;

            let enriched = row.into_enriched(top_title, image_description);
            let raw_sheet = capture(
                &mut report,
                "generate_sheet",
                async {
                    match self.generator.generate(&enriched).await {
                        Ok(raw) => Some(raw),
                        Err(err) => {
                            warn!(
                                target = "seosheet.pipeline",
                                sku = %enriched.sku,
                                error = %err,
                                "sheet_generation_failed"
                            );
                            None
                        }
                    }
                },
                |raw: &Option<String>| match raw {
                    Some(text) => json!({"bytes": text.len()}),
                    None => json!({"failure": "sheet_generation_failed"}),
                },
            )
            .await;

            let flat = capture(
                &mut report,
                "flatten",
                async {
                    match &raw_sheet {
                        Some(raw) => flatten_response(raw),
                        None => FlatRow::empty(),
                    }
                },
                |flat: &FlatRow| {
                    if flat.is_empty() {
                        json!({"failure": "empty_row", "columns": 0})
                    } else {
                        json!({"columns": flat.columns.len()})
                    }
                },
            )
            .await;

            if self.config.evaluation.sheets
                && let Some(raw) = &raw_sheet
            {
                let source = enriched.product_data_json();
                capture(
                    &mut report,
                    "evaluate_sheet",
                    async {
                        match self.evaluator.evaluate_sheet(&source, raw).await {
                            Ok(scores) => json!({"scores": scores}),
                            Err(err) => json!({"failure": err.to_string()}),
                        }
                    },
                    Value::clone,
                )
                .await;
            }

            if self.config.evaluation.descriptions {
                capture(
                    &mut report,
                    "evaluate_description",
                    async {
                        match self
                            .evaluator
                            .evaluate_description(&self.describer, &enriched.url)
                            .await
                        {
                            Ok(scores) => json!({"scores": scores}),
                            Err(err) => json!({"failure": err.to_string()}),
                        }
                    },
                    Value::clone,
                )
                .await;
            }

            outputs.push(OutputRow {
                sku: enriched.sku,
                url: enriched.url,
                flat,
            });
            reports.push(report);
        }

        table::write_output(&self.config.paths.output, &outputs)
            .map_err(|err| table_error("write_output", err))?;
        crate::metrics::rows_processed(outputs.len());

        Ok(BatchReport {
            run_id,
            started,
            rows: reports,
            dropped_without_main_image: dropped,
            output_path: self.config.paths.output.clone(),
        })
    }

    async fn lookup_competitors(&self, name: &str) -> Enrichment {
        match self.search.search(name).await {
            Ok(data) => match search::summarize(&data) {
                Some(summary) => Enrichment::Value(summary),
                None => {
                    warn!(
                        target = "seosheet.pipeline",
                        query = name,
                        "search_response_missing_shopping_results"
                    );
                    Enrichment::Failed("missing shopping_results".into())
                }
            },
            Err(err) => {
                warn!(target = "seosheet.pipeline", query = name, error = %err, "competitor_lookup_failed");
                Enrichment::Failed(err.to_string())
            }
        }
    }
}

async fn capture<T, Fut>(
    report: &mut RowReport,
    name: &'static str,
    fut: Fut,
    describe: impl FnOnce(&T) -> Value,
) -> T
where
    Fut: Future<Output = T>,
{
    let started = Instant::now();
    let value = fut.await;
    let elapsed_ms = started.elapsed().as_millis();
    crate::metrics::stage_elapsed(name, elapsed_ms);
    report
        .stages
        .push(StageReport::new(name, elapsed_ms, describe(&value)));
    value
}

fn enrichment_output(outcome: &Enrichment) -> Value {
    match outcome.failure() {
        Some(reason) => json!({"failure": reason}),
        None => json!({"chars": outcome.value().map_or(0, str::len)}),
    }
}
