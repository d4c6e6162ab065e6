use chrono::{DateTime, Utc};
use metrics::counter;
use serde_json::Value;
use tokio::time::{Instant, sleep};
use uuid::Uuid;

use crate::client::{ClientError, ModelClient};
use crate::config::DispatchConfig;
use crate::error::{Result, TaggerError};
use crate::parser;
use crate::planner::{self, BatchPlan};
use crate::prompt::build_prompt;
use crate::store::ResultStore;
use crate::types::{Classification, LogItem, RawEntry, StopReason};

/// Counters and results for one run. Owned by the dispatcher and advanced
/// one batch at a time by [`Dispatcher::step`].
#[derive(Debug)]
pub struct RunState {
    pub requests_made: usize,
    pub quota_daily: usize,
    pub quota_per_minute: u32,
    /// Index of the first item not yet dispatched.
    pub cursor: usize,
    pub batches_dispatched: usize,
    pub batches_skipped: usize,
    pub entries_dropped: usize,
    pub results: ResultStore,
}

impl RunState {
    pub fn new(config: &DispatchConfig) -> Self {
        Self {
            requests_made: 0,
            quota_daily: config.max_daily_requests,
            quota_per_minute: config.max_requests_per_minute,
            cursor: 0,
            batches_dispatched: 0,
            batches_skipped: 0,
            entries_dropped: 0,
            results: ResultStore::new(),
        }
    }

    fn quota_spent(&self) -> bool {
        self.requests_made >= self.quota_daily
    }
}

/// Outcome of a single loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stopped(StopReason),
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub stop_reason: StopReason,
    pub items_total: usize,
    pub items_not_reached: usize,
    pub batch_size: usize,
    pub requests_made: usize,
    pub batches_dispatched: usize,
    pub batches_skipped: usize,
    pub entries_dropped: usize,
    pub classifications: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub results: ResultStore,
    pub report: RunReport,
}

pub struct Dispatcher<'a, C: ModelClient> {
    client: &'a C,
    items: &'a [LogItem],
    config: DispatchConfig,
    plan: BatchPlan,
}

impl<'a, C: ModelClient> Dispatcher<'a, C> {
    pub fn new(client: &'a C, items: &'a [LogItem], config: DispatchConfig) -> Result<Self> {
        if items.is_empty() {
            return Err(TaggerError::EmptyInput("input".into()));
        }

        let plan = planner::plan_summary(
            items.len(),
            config.max_items_per_batch,
            config.max_daily_requests,
        );

        Ok(Self {
            client,
            items,
            config,
            plan,
        })
    }

    pub fn plan(&self) -> &BatchPlan {
        &self.plan
    }

    /// Drives [`step`](Self::step) until the input is exhausted or a quota
    /// stops the run. Fatal client errors are returned as-is and the partial
    /// results are discarded.
    #[tracing::instrument(
        skip_all,
        fields(run_id = tracing::field::Empty, items = self.items.len())
    )]
    pub async fn run(self) -> Result<RunOutcome> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        let started_at = Utc::now();
        let mut state = RunState::new(&self.config);

        tracing::info!(
            batch_size = self.plan.batch_size,
            requests_needed = self.plan.requests_needed,
            requests_to_use = self.plan.requests_to_use,
            coverable_items = self.plan.coverable_items,
            quota_daily = state.quota_daily,
            quota_per_minute = state.quota_per_minute,
            delay_secs = self.config.effective_delay().as_secs_f64(),
            "Planned dispatch"
        );
        if self.plan.coverable_items < self.items.len() {
            tracing::warn!(
                skipped = self.items.len() - self.plan.coverable_items,
                "Daily quota cannot cover the whole input"
            );
        }

        let stop_reason = loop {
            match self.step(&mut state).await? {
                Step::Continue => continue,
                Step::Stopped(reason) => break reason,
            }
        };

        match stop_reason {
            StopReason::InputExhausted => tracing::info!("All batches dispatched"),
            StopReason::DailyQuotaReached => {
                tracing::warn!(
                    requests_made = state.requests_made,
                    "Daily limit reached, stopping"
                )
            }
            StopReason::QuotaRejected => tracing::warn!("Quota exhausted (429), stopping"),
        }

        let report = RunReport {
            run_id,
            stop_reason,
            items_total: self.items.len(),
            items_not_reached: self.items.len() - state.cursor,
            batch_size: self.plan.batch_size,
            requests_made: state.requests_made,
            batches_dispatched: state.batches_dispatched,
            batches_skipped: state.batches_skipped,
            entries_dropped: state.entries_dropped,
            classifications: state.results.len(),
            started_at,
            finished_at: Utc::now(),
        };

        Ok(RunOutcome {
            results: state.results,
            report,
        })
    }

    /// Dispatches at most one batch and applies its outcome to `state`.
    #[tracing::instrument(
        skip_all,
        fields(cursor = state.cursor, requests_made = state.requests_made)
    )]
    pub async fn step(&self, state: &mut RunState) -> Result<Step> {
        if state.cursor >= self.items.len() {
            return Ok(Step::Stopped(StopReason::InputExhausted));
        }
        if state.quota_spent() {
            return Ok(Step::Stopped(StopReason::DailyQuotaReached));
        }

        let start = state.cursor;
        let end = (start + self.plan.batch_size).min(self.items.len());
        let batch = &self.items[start..end];
        let batch_index = state.batches_dispatched + 1;
        let batch_start = Instant::now();

        let prompt = build_prompt(batch);
        tracing::debug!(batch = batch_index, batch_size = batch.len(), "Sending batch");

        let raw = match self.client.classify(&prompt).await {
            Ok(raw) => raw,
            Err(ClientError::QuotaExceeded(message)) => {
                tracing::warn!(batch = batch_index, %message, "Remote quota exceeded");
                return Ok(Step::Stopped(StopReason::QuotaRejected));
            }
            Err(err @ ClientError::Other(_)) => {
                tracing::error!(batch = batch_index, error = %err, "Model call failed");
                return Err(err.into());
            }
        };

        // Every answered call is charged, whether or not the body parses.
        state.requests_made += 1;
        state.batches_dispatched += 1;
        state.cursor = end;
        counter!("logtagger_requests_total").increment(1);

        match parser::parse(&raw) {
            Ok(entries) => {
                let merged = self.merge(entries, state);
                counter!("logtagger_classifications_total").increment(merged.len() as u64);
                tracing::info!(
                    batch = batch_index,
                    batch_size = batch.len(),
                    classifications = merged.len(),
                    processing_time_ms = batch_start.elapsed().as_millis(),
                    "Batch processed"
                );
                state.results.extend(merged);
            }
            Err(err) => {
                state.batches_skipped += 1;
                counter!("logtagger_batches_skipped_total").increment(1);
                tracing::warn!(
                    batch = batch_index,
                    first_id = batch[0].id,
                    batch_size = batch.len(),
                    error = %err,
                    "Could not interpret response, batch skipped"
                );
            }
        }

        if state.cursor < self.items.len() && !state.quota_spent() {
            sleep(self.config.effective_delay()).await;
        }

        Ok(Step::Continue)
    }

    /// Pairs each decoded entry with the input item carrying its id. Ids are
    /// run-wide, so an entry may name an item from an earlier batch. Entries
    /// that are not well-formed or whose id is not in the input are dropped.
    fn merge(&self, entries: Vec<Value>, state: &mut RunState) -> Vec<Classification> {
        let mut merged = Vec::with_capacity(entries.len());

        for value in entries {
            let entry: RawEntry = match serde_json::from_value(value) {
                Ok(entry) => entry,
                Err(err) => {
                    state.entries_dropped += 1;
                    tracing::warn!(error = %err, "Dropping response entry without log_id/tags");
                    continue;
                }
            };

            match self.items.iter().find(|item| item.id == entry.log_id) {
                Some(item) => merged.push(Classification::merge(item, entry)),
                None => {
                    state.entries_dropped += 1;
                    tracing::warn!(
                        log_id = entry.log_id,
                        "Dropping response entry for an unknown log_id"
                    );
                }
            }
        }

        merged
    }
}
