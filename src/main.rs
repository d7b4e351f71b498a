mod config;
mod describer;
mod evaluator;
mod flatten;
mod http;
mod hub;
mod llm;
mod metrics;
mod models;
mod pipeline;
mod prompts;
mod search;
mod sheet;
mod table;

use config::AppConfig;
use pipeline::Pipeline;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(target = "seosheet.cli", "run failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> eyre::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let pipeline = Pipeline::new(config);
    let report = match pipeline.run().await {
        Ok(report) => report,
        Err(err) => {
            error!(
                target = "seosheet.cli",
                stage = err.stage(),
                kind = ?err.kind(),
                detail = err.detail(),
                "pipeline failed"
            );
            return Err(err.into());
        }
    };

    let failed_rows = report
        .rows
        .iter()
        .filter(|row| !row.failures().is_empty())
        .count();
    info!(
        target = "seosheet.cli",
        run_id = %report.run_id,
        rows = report.rows.len(),
        degraded = failed_rows,
        dropped = report.dropped_without_main_image,
        "batch complete"
    );
    println!(
        "Run complete, the CSV is at {}",
        report.output_path.display()
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
