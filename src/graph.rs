//! Lineage graph data model.
//!
//! Per-procedure lineage graphs are directed multigraphs whose vertices are
//! dataflow locations (formals, locals, callsite materializations) and whose
//! edges carry a semantic kind. Result subgraphs are accumulated in ordered
//! sets so that equal inputs always serialize identically.

use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifies a procedure by module, function name, and arity.
///
/// An empty module denotes the default module and is omitted when rendering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcId {
    /// Module name, empty for the default module.
    pub module: String,
    /// Function name.
    pub name: String,
    /// Number of formal parameters.
    pub arity: u32,
}

impl ProcId {
    /// Creates a procedure identifier.
    #[must_use]
    pub fn new(module: impl Into<String>, name: impl Into<String>, arity: u32) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            arity,
        }
    }
}

impl fmt::Display for ProcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_empty() {
            write!(f, "{}/{}", self.name, self.arity)
        } else {
            write!(f, "{}:{}/{}", self.module, self.name, self.arity)
        }
    }
}

/// An ordered sequence of record-field selectors applied to a base location.
///
/// The empty sequence denotes the whole value.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(SmallVec<[String; 2]>);

impl FieldPath {
    /// The whole-value path.
    #[must_use]
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    /// Builds a path from field selectors.
    #[must_use]
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    /// Returns `true` for the whole-value path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Elementwise prefix test.
    #[must_use]
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.0 {
            write!(f, ".{field}")?;
        }
        Ok(())
    }
}

/// A dataflow location in one procedure's lineage graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Vertex {
    /// A local storage location.
    Local(String, FieldPath),
    /// A formal parameter, or a subfield of one.
    Argument(usize, FieldPath),
    /// The formal return, or a subfield of it.
    Return(FieldPath),
    /// A callsite-materialized actual at an outgoing call.
    ArgumentOf(ProcId, usize, FieldPath),
    /// A callsite-materialized return at an outgoing call.
    ReturnOf(ProcId, FieldPath),
    /// A closure capture slot.
    Captured(usize),
    /// A capture slot materialized at an outgoing closure creation.
    CapturedBy(ProcId, usize),
    /// The receiver node used by some front-ends.
    SelfRef,
    /// A first-class procedure value.
    Function(ProcId),
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(name, fp) => write!(f, "{name}{fp}"),
            Self::Argument(index, fp) => write!(f, "arg{index}{fp}"),
            Self::Return(fp) => write!(f, "ret{fp}"),
            Self::ArgumentOf(callee, index, fp) => write!(f, "arg{index}@{callee}{fp}"),
            Self::ReturnOf(callee, fp) => write!(f, "ret@{callee}{fp}"),
            Self::Captured(index) => write!(f, "cap{index}"),
            Self::CapturedBy(callee, index) => write!(f, "cap{index}@{callee}"),
            Self::SelfRef => write!(f, "self"),
            Self::Function(proc) => write!(f, "fun({proc})"),
        }
    }
}

/// Semantic label of a directed lineage edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeKind {
    /// In-procedure data movement.
    Direct,
    /// Formal-to-actual crossing into a callee.
    Call,
    /// Callee-formal-to-caller crossing out of a callee.
    Return,
    /// Closure-capture movement.
    Capture,
    /// Pre-matched call/return pair elided into an intra-procedural shortcut.
    Summary {
        /// The callee the shortcut flows through.
        callee: ProcId,
    },
    /// Opaque flow through a builtin.
    Builtin,
    /// Opaque flow through a dynamic call by function value.
    DynamicCallFunction,
    /// Opaque flow through a dynamic call by module value.
    DynamicCallModule,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Call => write!(f, "call"),
            Self::Return => write!(f, "return"),
            Self::Capture => write!(f, "capture"),
            Self::Summary { callee } => write!(f, "summary({callee})"),
            Self::Builtin => write!(f, "builtin"),
            Self::DynamicCallFunction => write!(f, "dynamic_call_function"),
            Self::DynamicCallModule => write!(f, "dynamic_call_module"),
        }
    }
}

/// A directed, kind-labeled edge between two vertices of one procedure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    /// Tail vertex.
    pub source: Vertex,
    /// Edge kind.
    pub kind: EdgeKind,
    /// Head vertex.
    pub target: Vertex,
}

impl Edge {
    /// Creates an edge.
    #[must_use]
    pub fn new(source: Vertex, kind: EdgeKind, target: Vertex) -> Self {
        Self {
            source,
            kind,
            target,
        }
    }
}

/// Locates an interprocedural work item inside a procedure's graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// The formal return, refined by a field path.
    Return(FieldPath),
    /// A formal parameter, refined by a field path.
    Argument(usize, FieldPath),
    /// A callsite-materialized return of the named callee.
    ReturnOf(ProcId, FieldPath),
    /// A callsite-materialized actual of the named callee.
    ArgumentOf(ProcId, usize, FieldPath),
}

impl Locator {
    /// The single vertex that trivially matches this locator.
    ///
    /// Used when no shape summary is available for the procedure.
    #[must_use]
    pub fn vertex(&self) -> Vertex {
        match self {
            Self::Return(fp) => Vertex::Return(fp.clone()),
            Self::Argument(index, fp) => Vertex::Argument(*index, fp.clone()),
            Self::ReturnOf(callee, fp) => Vertex::ReturnOf(callee.clone(), fp.clone()),
            Self::ArgumentOf(callee, index, fp) => {
                Vertex::ArgumentOf(callee.clone(), *index, fp.clone())
            }
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Return(fp) => write!(f, "ret{fp}"),
            Self::Argument(index, fp) => write!(f, "arg{index}{fp}"),
            Self::ReturnOf(callee, fp) => write!(f, "ret@{callee}{fp}"),
            Self::ArgumentOf(callee, index, fp) => write!(f, "arg{index}@{callee}{fp}"),
        }
    }
}

/// An interprocedural work item: a locator within a named procedure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaintNode {
    /// The procedure whose graph the locator refers to.
    pub proc: ProcId,
    /// The location to expand and explore from.
    pub locator: Locator,
}

impl TaintNode {
    /// Creates a work item.
    #[must_use]
    pub fn new(proc: ProcId, locator: Locator) -> Self {
        Self { proc, locator }
    }
}

/// A procedure's input lineage graph as successor adjacency.
///
/// Self-loops are permitted, as are parallel edges with distinct kinds.
/// Exact duplicates are stored once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineageGraph {
    successors: BTreeMap<Vertex, Vec<(Vertex, EdgeKind)>>,
}

impl LineageGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from `(source, kind, target)` triples.
    #[must_use]
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (Vertex, EdgeKind, Vertex)>,
    {
        let mut graph = Self::new();
        for (source, kind, target) in edges {
            graph.add_edge(source, kind, target);
        }
        graph
    }

    /// Adds an edge, ignoring exact duplicates.
    pub fn add_edge(&mut self, source: Vertex, kind: EdgeKind, target: Vertex) {
        let out = self.successors.entry(source).or_default();
        if !out.iter().any(|(t, k)| t == &target && k == &kind) {
            out.push((target, kind));
        }
    }

    /// Returns the outgoing edges of a vertex.
    #[must_use]
    pub fn successors(&self, vertex: &Vertex) -> &[(Vertex, EdgeKind)] {
        self.successors.get(vertex).map_or(&[], Vec::as_slice)
    }
}

/// An accumulated per-procedure result subgraph.
///
/// Vertices are recorded independently of edges so that an endpoint expanded
/// in a procedure without lineage still appears in the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subgraph {
    vertices: BTreeSet<Vertex>,
    edges: BTreeSet<Edge>,
}

impl Subgraph {
    /// Creates an empty subgraph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a vertex. Returns `true` if it was new.
    pub fn add_vertex(&mut self, vertex: Vertex) -> bool {
        self.vertices.insert(vertex)
    }

    /// Records an edge and both endpoints. Returns `true` if the edge was new.
    pub fn insert_edge(&mut self, edge: Edge) -> bool {
        self.vertices.insert(edge.source.clone());
        self.vertices.insert(edge.target.clone());
        self.edges.insert(edge)
    }

    /// Membership test used to deduplicate before insertion.
    #[must_use]
    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.edges.contains(edge)
    }

    /// Returns `true` if the vertex has been recorded.
    #[must_use]
    pub fn contains_vertex(&self, vertex: &Vertex) -> bool {
        self.vertices.contains(vertex)
    }

    /// Iterates edges in sorted order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Iterates vertices in sorted order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    /// Number of recorded edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if any edge has been recorded.
    #[must_use]
    pub fn has_edges(&self) -> bool {
        !self.edges.is_empty()
    }
}
