use std::path::Path;

use crate::client::ModelClient;
use crate::config::DispatchConfig;
use crate::dispatch::{Dispatcher, RunOutcome};
use crate::error::Result;
use crate::io;

/// Reads `input`, dispatches it through `client` and writes the results to
/// `output`. Output is only written when the run stops cleanly; on any error
/// an existing `output` is left as it was.
pub async fn run<C: ModelClient>(
    client: &C,
    input: &Path,
    output: &Path,
    config: DispatchConfig,
) -> Result<RunOutcome> {
    let items = io::read_log_items(input)?;
    tracing::info!(total = items.len(), input = %input.display(), "Log lines detected");

    let dispatcher = Dispatcher::new(client, &items, config)?;
    tracing::info!(batch_size = dispatcher.plan().batch_size, "Logs per batch");

    let outcome = dispatcher.run().await?;
    if outcome.results.is_empty() {
        tracing::warn!("No classifications were produced");
    }

    io::write_results(output, outcome.results.snapshot())?;
    Ok(outcome)
}
