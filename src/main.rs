mod client;
mod config;
mod dispatch;
mod error;
mod gemini;
mod io;
mod parser;
mod pipeline;
mod planner;
mod prompt;
mod store;
mod types;

use clap::Parser;

use config::{Config, DispatchConfig, LogFormat};
use gemini::{GeminiClient, GeminiConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format);

    config.validate()?;
    tracing::debug!("Starting with config: {:?}", redacted(&config));

    let client = GeminiClient::new(GeminiConfig::from(&config))?;
    let outcome = pipeline::run(
        &client,
        &config.input,
        &config.output,
        DispatchConfig::from(&config),
    )
    .await?;

    let report = &outcome.report;
    tracing::info!(
        run_id = %report.run_id,
        stop_reason = %report.stop_reason,
        requests_made = report.requests_made,
        batches_dispatched = report.batches_dispatched,
        batches_skipped = report.batches_skipped,
        entries_dropped = report.entries_dropped,
        classifications = report.classifications,
        items_not_reached = report.items_not_reached,
        elapsed_secs = (report.finished_at - report.started_at).num_seconds(),
        output = %config.output.display(),
        "Run finished"
    );

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,logtagger=info".into());

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    if config.api_key.is_some() {
        config.api_key = Some("***".into());
    }
    config
}
