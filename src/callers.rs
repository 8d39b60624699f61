//! Caller index: the precomputed inverse of the call relation.

use crate::error::TaintError;
use crate::graph::ProcId;
use crate::store::{Dependencies, SummaryStore};
use rustc_hash::FxHashMap;

/// Maps each known procedure to its direct callers.
///
/// Built once from the persisted dependency sets and read-only afterwards.
/// A callee may list the same caller more than once; consumers iterate
/// tolerantly.
#[derive(Debug, Default)]
pub struct CallerIndex {
    callers: FxHashMap<ProcId, Vec<ProcId>>,
}

impl CallerIndex {
    /// Builds the index by scanning every persisted summary once.
    ///
    /// # Errors
    ///
    /// Returns [`TaintError::CorruptSummary`] when a summary's dependency
    /// set is marked incomplete.
    pub fn build(store: &impl SummaryStore) -> Result<Self, TaintError> {
        let mut callers: FxHashMap<ProcId, Vec<ProcId>> = FxHashMap::default();
        for (owner, dependencies) in store.iter_dependencies() {
            let deps = match dependencies {
                Dependencies::Known(deps) => deps,
                Dependencies::Incomplete => return Err(TaintError::CorruptSummary(owner)),
            };
            for dep in deps {
                callers.entry(dep).or_default().push(owner.clone());
            }
        }
        Ok(Self { callers })
    }

    /// Returns the direct callers of a procedure, empty if none are recorded.
    #[must_use]
    pub fn callers_of(&self, proc: &ProcId) -> &[ProcId] {
        self.callers.get(proc).map_or(&[], Vec::as_slice)
    }
}
