//! Batch sizing under a per-request item ceiling and a daily request quota.

/// Figures derived while planning a run, kept for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub batch_size: usize,
    pub requests_needed: usize,
    pub requests_to_use: usize,
    /// How many items the quota can cover at `batch_size`.
    pub coverable_items: usize,
}

/// Computes the number of items to put in each request.
///
/// Uses as few requests as possible without exceeding `max_items_per_batch`
/// and without planning for more requests than `max_daily_requests`. When the
/// quota is too small to cover `total_items`, the ceiling wins and the
/// dispatch loop stops early. The result is always in
/// `1..=max_items_per_batch`.
pub fn plan(total_items: usize, max_items_per_batch: usize, max_daily_requests: usize) -> usize {
    let max_items_per_batch = max_items_per_batch.max(1);
    let total_items = total_items.max(1);

    let requests_needed = total_items.div_ceil(max_items_per_batch);
    let requests_to_use = requests_needed.min(max_daily_requests).max(1);

    total_items
        .div_ceil(requests_to_use)
        .min(max_items_per_batch)
}

pub fn plan_summary(
    total_items: usize,
    max_items_per_batch: usize,
    max_daily_requests: usize,
) -> BatchPlan {
    let batch_size = plan(total_items, max_items_per_batch, max_daily_requests);
    let requests_needed = total_items.div_ceil(max_items_per_batch.max(1));
    let requests_to_use = requests_needed.min(max_daily_requests);

    BatchPlan {
        batch_size,
        requests_needed,
        requests_to_use,
        coverable_items: total_items.min(batch_size.saturating_mul(max_daily_requests)),
    }
}
