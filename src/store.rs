//! External collaborator interfaces.
//!
//! The extractor consumes persisted per-procedure summaries through
//! [`SummaryStore`] and resolves human-readable procedure descriptions
//! through [`DescriptionStore`]. Both are implemented by the host; the
//! bundled [`crate::test_utils::MemoryStore`] serves the test suites.

use crate::graph::{LineageGraph, ProcId};
use crate::shape::ShapeSummary;
use std::sync::Arc;

/// The declared dependency set of a persisted summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependencies {
    /// The complete set of procedures the owner called or referenced.
    Known(Vec<ProcId>),
    /// The producer could not determine the full set.
    Incomplete,
}

/// The payloads a persisted summary offers to the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcSummary {
    /// Procedures the owner called or otherwise referenced.
    pub dependencies: Dependencies,
    /// Field-path refinements of the owner's formals and callsites.
    pub shape: Option<ShapeSummary>,
    /// The owner's lineage graph.
    pub lineage: Option<LineageGraph>,
}

impl ProcSummary {
    /// Creates a summary with no dependencies and no payloads.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for ProcSummary {
    fn default() -> Self {
        Self {
            dependencies: Dependencies::Known(Vec::new()),
            shape: None,
            lineage: None,
        }
    }
}

/// Read access to the persisted summary store.
///
/// Implementations must yield a stable iteration order so that equal inputs
/// produce byte-identical output.
pub trait SummaryStore {
    /// Loads the summary for one procedure, if any is persisted.
    fn load(&self, proc: &ProcId) -> Option<Arc<ProcSummary>>;

    /// Streams every persisted summary's owner and dependency set.
    ///
    /// Used once, to build the caller index.
    fn iter_dependencies(&self) -> Box<dyn Iterator<Item = (ProcId, Dependencies)> + '_>;
}

/// Read access to human-readable procedure descriptions.
pub trait DescriptionStore {
    /// Resolves a procedure to its description, if one is recorded.
    fn resolve(&self, proc: &ProcId) -> Option<String>;
}
