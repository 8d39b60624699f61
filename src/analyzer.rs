//! Extraction orchestration: parse, index, forward, backward.

use crate::callers::CallerIndex;
use crate::config::TaintOptions;
use crate::endpoint::Endpoint;
use crate::error::TaintError;
use crate::flow::{CoreachabilityEngine, ReachabilityEngine};
use crate::graph::{ProcId, Subgraph};
use crate::store::SummaryStore;
use std::collections::BTreeMap;

/// A parsed taint query: source, sink, and sanitizer procedures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaintQuery {
    /// Where taint enters.
    pub source: Endpoint,
    /// Where taint must not arrive.
    pub sink: Endpoint,
    /// Procedures whose flows are excluded entirely.
    pub sanitizers: Vec<ProcId>,
}

impl TaintQuery {
    /// Parses the raw endpoint strings of a query.
    ///
    /// # Errors
    ///
    /// Returns [`TaintError::BadEndpoint`] for the first malformed literal.
    pub fn parse(source: &str, sink: &str, sanitizers: &[String]) -> Result<Self, TaintError> {
        Ok(Self {
            source: Endpoint::parse(source)?,
            sink: Endpoint::parse(sink)?,
            sanitizers: sanitizers
                .iter()
                .map(|text| ProcId::parse(text))
                .collect::<Result<_, _>>()?,
        })
    }
}

/// The per-procedure decomposition of all source-to-sink dataflow paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaintFlow {
    /// Edges forward-reachable from the source under the realizability rule.
    pub reachable: BTreeMap<ProcId, Subgraph>,
    /// Reachable edges from which the sink is backward-reachable.
    pub coreachable: BTreeMap<ProcId, Subgraph>,
}

impl TaintFlow {
    /// Returns `true` when no taint path was found.
    ///
    /// An empty result can also mean an endpoint resolved to no vertex;
    /// whether to warn about that is left to the host.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coreachable.values().all(|graph| !graph.has_edges())
    }
}

/// Runs taint queries against a summary store.
pub struct TaintExtractor<'a, S: SummaryStore> {
    store: &'a S,
    options: TaintOptions,
}

impl<'a, S: SummaryStore> TaintExtractor<'a, S> {
    /// Creates an extractor over the given store.
    #[must_use]
    pub fn new(store: &'a S, options: TaintOptions) -> Self {
        Self { store, options }
    }

    /// Computes the reachable and coreachable maps for one query.
    ///
    /// # Errors
    ///
    /// Returns [`TaintError::CorruptSummary`] from caller-index construction.
    pub fn extract(&self, query: &TaintQuery) -> Result<TaintFlow, TaintError> {
        let callers = CallerIndex::build(self.store)?;

        let sources = [query.source.node()];
        let reachable = ReachabilityEngine::new(
            self.store,
            &callers,
            &query.sanitizers,
            self.options.lineage_limit,
        )
        .collect(&sources);

        let sinks = [query.sink.node()];
        let coreachable =
            CoreachabilityEngine::new(self.store, &callers, &reachable).collect(&sinks);

        Ok(TaintFlow {
            reachable,
            coreachable,
        })
    }
}
