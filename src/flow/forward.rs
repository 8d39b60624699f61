//! Forward reachability under the realizability rule.

use crate::callers::CallerIndex;
use crate::flow::EdgeBudget;
use crate::graph::{Edge, EdgeKind, Locator, ProcId, Subgraph, TaintNode, Vertex};
use crate::shape::expand;
use crate::store::{ProcSummary, SummaryStore};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// Collects, per procedure, the subgraph of edges forward-reachable from the
/// source nodes.
///
/// A realizable path may follow returns out of the initial call stack, but
/// once it has descended through a call it may not follow a return again;
/// matched call/return pairs arrive pre-elided as `Summary` edges. The engine
/// enforces this with two phases: descents through `ArgumentOf` vertices are
/// parked on a deferred worklist while return-following is enabled, and once
/// the primary worklist drains the deferred items run with return-following
/// disabled for good.
pub struct ReachabilityEngine<'a, S: SummaryStore> {
    store: &'a S,
    callers: &'a CallerIndex,
    sanitizers: FxHashSet<ProcId>,
    budget: EdgeBudget,
    primary: VecDeque<TaintNode>,
    deferred: VecDeque<TaintNode>,
    follow_return: bool,
    queued: FxHashSet<TaintNode>,
    summaries: FxHashMap<ProcId, Option<Arc<ProcSummary>>>,
    graphs: BTreeMap<ProcId, Subgraph>,
}

impl<'a, S: SummaryStore> ReachabilityEngine<'a, S> {
    /// Creates an engine over the given collaborators.
    #[must_use]
    pub fn new(
        store: &'a S,
        callers: &'a CallerIndex,
        sanitizers: &[ProcId],
        lineage_limit: Option<usize>,
    ) -> Self {
        Self {
            store,
            callers,
            sanitizers: sanitizers.iter().cloned().collect(),
            budget: EdgeBudget::new(lineage_limit),
            primary: VecDeque::new(),
            deferred: VecDeque::new(),
            follow_return: true,
            queued: FxHashSet::default(),
            summaries: FxHashMap::default(),
            graphs: BTreeMap::new(),
        }
    }

    /// Runs both phases from the source nodes and returns the reachable map.
    #[must_use]
    pub fn collect(mut self, sources: &[TaintNode]) -> BTreeMap<ProcId, Subgraph> {
        for source in sources {
            self.enqueue_primary(source.clone());
        }
        loop {
            while let Some(node) = self.primary.pop_front() {
                self.visit(&node);
            }
            if self.follow_return && !self.deferred.is_empty() {
                self.primary = std::mem::take(&mut self.deferred);
                self.follow_return = false;
            } else {
                break;
            }
        }
        self.graphs
    }

    fn visit(&mut self, node: &TaintNode) {
        if self.sanitizers.contains(&node.proc) {
            return;
        }
        let summary = self.summary(&node.proc);
        let shape = summary.as_ref().and_then(|s| s.shape.as_ref());
        let seeds = expand(&node.locator, shape);

        // A procedure without lineage still gets an entry over its seeds.
        self.graphs.entry(node.proc.clone()).or_default();

        let mut visited: FxHashSet<Vertex> = FxHashSet::default();
        let mut stack = seeds;
        while let Some(vertex) = stack.pop() {
            if !visited.insert(vertex.clone()) {
                continue;
            }
            self.note_vertex(&node.proc, &vertex);
            self.continuations(&node.proc, &vertex);
            let Some(summary) = summary.as_ref() else {
                continue;
            };
            let Some(lineage) = summary.lineage.as_ref() else {
                continue;
            };
            for (target, kind) in lineage.successors(&vertex) {
                if let EdgeKind::Summary { callee } = kind {
                    if self.sanitizers.contains(callee) {
                        continue;
                    }
                }
                let edge = Edge::new(vertex.clone(), kind.clone(), target.clone());
                if self.record_edge(&node.proc, edge) {
                    stack.push(target.clone());
                }
            }
        }
    }

    /// Generates interprocedural continuations for a visited vertex.
    fn continuations(&mut self, proc: &ProcId, vertex: &Vertex) {
        match vertex {
            Vertex::Return(fp) if self.follow_return => {
                let callers = self.callers;
                for caller in callers.callers_of(proc) {
                    self.enqueue_primary(TaintNode::new(
                        caller.clone(),
                        Locator::ReturnOf(proc.clone(), fp.clone()),
                    ));
                }
            }
            Vertex::ArgumentOf(callee, index, fp) => {
                self.enqueue_descent(TaintNode::new(
                    callee.clone(),
                    Locator::Argument(*index, fp.clone()),
                ));
            }
            _ => {}
        }
    }

    /// Records an edge unless already present or over budget.
    ///
    /// Returns `true` when the target should be traversed through.
    fn record_edge(&mut self, proc: &ProcId, edge: Edge) -> bool {
        let graph = self.graphs.entry(proc.clone()).or_default();
        if graph.contains_edge(&edge) {
            return true;
        }
        if !self.budget.draw() {
            return false;
        }
        graph.insert_edge(edge);
        true
    }

    fn note_vertex(&mut self, proc: &ProcId, vertex: &Vertex) {
        self.graphs
            .entry(proc.clone())
            .or_default()
            .add_vertex(vertex.clone());
    }

    fn enqueue_primary(&mut self, node: TaintNode) {
        if self.queued.insert(node.clone()) {
            self.primary.push_back(node);
        }
    }

    /// Call descents wait for the deferred phase while returns are live.
    fn enqueue_descent(&mut self, node: TaintNode) {
        if self.queued.insert(node.clone()) {
            if self.follow_return {
                self.deferred.push_back(node);
            } else {
                self.primary.push_back(node);
            }
        }
    }

    fn summary(&mut self, proc: &ProcId) -> Option<Arc<ProcSummary>> {
        if let Some(cached) = self.summaries.get(proc) {
            return cached.clone();
        }
        let loaded = self.store.load(proc);
        self.summaries.insert(proc.clone(), loaded.clone());
        loaded
    }
}
