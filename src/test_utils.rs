//! In-memory stores backing the unit and integration test suites.

use crate::graph::ProcId;
use crate::store::{Dependencies, DescriptionStore, ProcSummary, SummaryStore};
use std::collections::BTreeMap;
use std::sync::Arc;

/// An in-memory summary and description store.
///
/// Backed by `BTreeMap` so iteration order, and therefore caller-list order,
/// is stable across runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    summaries: BTreeMap<ProcId, Arc<ProcSummary>>,
    descriptions: BTreeMap<ProcId, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Persists a summary for a procedure.
    pub fn add_summary(&mut self, proc: ProcId, summary: ProcSummary) {
        self.summaries.insert(proc, Arc::new(summary));
    }

    /// Records a human-readable description for a procedure.
    pub fn add_description(&mut self, proc: ProcId, description: impl Into<String>) {
        self.descriptions.insert(proc, description.into());
    }
}

impl SummaryStore for MemoryStore {
    fn load(&self, proc: &ProcId) -> Option<Arc<ProcSummary>> {
        self.summaries.get(proc).cloned()
    }

    fn iter_dependencies(&self) -> Box<dyn Iterator<Item = (ProcId, Dependencies)> + '_> {
        Box::new(
            self.summaries
                .iter()
                .map(|(proc, summary)| (proc.clone(), summary.dependencies.clone())),
        )
    }
}

impl DescriptionStore for MemoryStore {
    fn resolve(&self, proc: &ProcId) -> Option<String> {
        self.descriptions.get(proc).cloned()
    }
}
