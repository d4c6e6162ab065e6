use crate::types::Classification;

/// Append-only collection of merged results, in merge order.
#[derive(Debug, Default)]
pub struct ResultStore {
    results: Vec<Classification>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, batch: impl IntoIterator<Item = Classification>) {
        self.results.extend(batch);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn snapshot(&self) -> &[Classification] {
        &self.results
    }
}
