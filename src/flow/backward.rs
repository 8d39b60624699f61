//! Backward coreachability over the reachable subgraph.

use crate::callers::CallerIndex;
use crate::graph::{Edge, Locator, ProcId, Subgraph, TaintNode, Vertex};
use crate::shape::expand;
use crate::store::{ProcSummary, SummaryStore};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// Collects, per procedure, the subgraph of reachable edges from which some
/// sink is backward-reachable.
///
/// The realizability rule is not replayed here: the reachable map already
/// enforces it, so every edge it contains may be followed backwards freely.
pub struct CoreachabilityEngine<'a, S: SummaryStore> {
    store: &'a S,
    callers: &'a CallerIndex,
    reachable: &'a BTreeMap<ProcId, Subgraph>,
    worklist: VecDeque<TaintNode>,
    queued: FxHashSet<TaintNode>,
    summaries: FxHashMap<ProcId, Option<Arc<ProcSummary>>>,
    graphs: BTreeMap<ProcId, Subgraph>,
}

impl<'a, S: SummaryStore> CoreachabilityEngine<'a, S> {
    /// Creates an engine restricted to the given reachable map.
    #[must_use]
    pub fn new(
        store: &'a S,
        callers: &'a CallerIndex,
        reachable: &'a BTreeMap<ProcId, Subgraph>,
    ) -> Self {
        Self {
            store,
            callers,
            reachable,
            worklist: VecDeque::new(),
            queued: FxHashSet::default(),
            summaries: FxHashMap::default(),
            graphs: BTreeMap::new(),
        }
    }

    /// Drains the worklist from the sink nodes and returns the coreachable map.
    #[must_use]
    pub fn collect(mut self, sinks: &[TaintNode]) -> BTreeMap<ProcId, Subgraph> {
        for sink in sinks {
            self.enqueue(sink.clone());
        }
        while let Some(node) = self.worklist.pop_front() {
            self.visit(&node);
        }
        self.graphs
    }

    fn visit(&mut self, node: &TaintNode) {
        let reachable = self.reachable;
        // A caller that never reaches the source has nothing to coreach.
        let Some(reach) = reachable.get(&node.proc) else {
            return;
        };
        let summary = self.summary(&node.proc);
        let shape = summary.as_ref().and_then(|s| s.shape.as_ref());
        // Expanded sink vertices missing from the reachable subgraph are
        // silently dropped.
        let seeds: Vec<Vertex> = expand(&node.locator, shape)
            .into_iter()
            .filter(|vertex| reach.contains_vertex(vertex))
            .collect();
        if seeds.is_empty() {
            return;
        }

        let predecessors = predecessor_map(reach);
        let mut visited: FxHashSet<Vertex> = FxHashSet::default();
        let mut stack = seeds;
        while let Some(vertex) = stack.pop() {
            if !visited.insert(vertex.clone()) {
                continue;
            }
            self.note_vertex(&node.proc, &vertex);
            self.continuations(&node.proc, &vertex);
            let Some(incoming) = predecessors.get(&vertex) else {
                continue;
            };
            for edge in incoming {
                let edge = (*edge).clone();
                let source = edge.source.clone();
                self.graphs
                    .entry(node.proc.clone())
                    .or_default()
                    .insert_edge(edge);
                stack.push(source);
            }
        }
    }

    /// Generates interprocedural continuations for a visited vertex.
    fn continuations(&mut self, proc: &ProcId, vertex: &Vertex) {
        match vertex {
            Vertex::Argument(index, fp) => {
                let callers = self.callers;
                for caller in callers.callers_of(proc) {
                    self.enqueue(TaintNode::new(
                        caller.clone(),
                        Locator::ArgumentOf(proc.clone(), *index, fp.clone()),
                    ));
                }
            }
            Vertex::ReturnOf(callee, fp) => {
                self.enqueue(TaintNode::new(callee.clone(), Locator::Return(fp.clone())));
            }
            _ => {}
        }
    }

    fn note_vertex(&mut self, proc: &ProcId, vertex: &Vertex) {
        self.graphs
            .entry(proc.clone())
            .or_default()
            .add_vertex(vertex.clone());
    }

    fn enqueue(&mut self, node: TaintNode) {
        if self.queued.insert(node.clone()) {
            self.worklist.push_back(node);
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

/// Incoming-edge adjacency of a reachable subgraph.
fn predecessor_map(reach: &Subgraph) -> FxHashMap<&Vertex, Vec<&Edge>> {
    let mut predecessors: FxHashMap<&Vertex, Vec<&Edge>> = FxHashMap::default();
    for edge in reach.edges() {
        predecessors.entry(&edge.target).or_default().push(edge);
    }
    predecessors
}
