//! Shape summaries and node-to-vertex expansion.
//!
//! A shape summary records, per formal location, the concrete field paths
//! present in a procedure's lineage graph. Expanding a work-item locator
//! against the summary yields the vertices the locator denotes; without a
//! summary the locator falls back to its single trivially-matching vertex.

use crate::graph::{FieldPath, Locator, ProcId, Vertex};
use rustc_hash::FxHashMap;

/// Field-path refinements recorded for one procedure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapeSummary {
    return_paths: Vec<FieldPath>,
    argument_paths: FxHashMap<usize, Vec<FieldPath>>,
    return_of_paths: FxHashMap<ProcId, Vec<FieldPath>>,
    argument_of_paths: FxHashMap<(ProcId, usize), Vec<FieldPath>>,
}

impl ShapeSummary {
    /// Creates an empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a concrete field path of the formal return.
    pub fn record_return(&mut self, path: FieldPath) {
        self.return_paths.push(path);
    }

    /// Records a concrete field path of the index-th formal parameter.
    pub fn record_argument(&mut self, index: usize, path: FieldPath) {
        self.argument_paths.entry(index).or_default().push(path);
    }

    /// Records a concrete field path of a callsite-materialized return.
    pub fn record_return_of(&mut self, callee: ProcId, path: FieldPath) {
        self.return_of_paths.entry(callee).or_default().push(path);
    }

    /// Records a concrete field path of a callsite-materialized actual.
    pub fn record_argument_of(&mut self, callee: ProcId, index: usize, path: FieldPath) {
        self.argument_of_paths
            .entry((callee, index))
            .or_default()
            .push(path);
    }

    /// Maps the recorded return refinements of `prefix` through `f`.
    pub fn map_return<T>(&self, prefix: &FieldPath, f: impl FnMut(FieldPath) -> T) -> Vec<T> {
        refine(&self.return_paths, prefix, f)
    }

    /// Maps the recorded refinements of argument `index` through `f`.
    pub fn map_argument<T>(
        &self,
        index: usize,
        prefix: &FieldPath,
        f: impl FnMut(FieldPath) -> T,
    ) -> Vec<T> {
        refine(
            self.argument_paths.get(&index).map_or(&[], Vec::as_slice),
            prefix,
            f,
        )
    }

    /// Maps the recorded refinements of `callee`'s callsite return through `f`.
    pub fn map_return_of<T>(
        &self,
        callee: &ProcId,
        prefix: &FieldPath,
        f: impl FnMut(FieldPath) -> T,
    ) -> Vec<T> {
        refine(
            self.return_of_paths.get(callee).map_or(&[], Vec::as_slice),
            prefix,
            f,
        )
    }

    /// Maps the recorded refinements of `callee`'s callsite actual through `f`.
    pub fn map_argument_of<T>(
        &self,
        callee: &ProcId,
        index: usize,
        prefix: &FieldPath,
        f: impl FnMut(FieldPath) -> T,
    ) -> Vec<T> {
        refine(
            self.argument_of_paths
                .get(&(callee.clone(), index))
                .map_or(&[], Vec::as_slice),
            prefix,
            f,
        )
    }
}

fn refine<T>(
    recorded: &[FieldPath],
    prefix: &FieldPath,
    mut f: impl FnMut(FieldPath) -> T,
) -> Vec<T> {
    recorded
        .iter()
        .filter(|path| path.starts_with(prefix))
        .cloned()
        .map(&mut f)
        .collect()
}

/// Expands a locator into the concrete vertices it denotes.
///
/// With a shape summary the result is exactly the recorded refinements,
/// possibly none. Without one, the single trivially-matching vertex is
/// returned so that an endpoint naming a summary-less procedure is not lost.
#[must_use]
pub fn expand(locator: &Locator, shape: Option<&ShapeSummary>) -> Vec<Vertex> {
    let Some(shape) = shape else {
        return vec![locator.vertex()];
    };
    match locator {
        Locator::Return(prefix) => shape.map_return(prefix, Vertex::Return),
        Locator::Argument(index, prefix) => {
            shape.map_argument(*index, prefix, |path| Vertex::Argument(*index, path))
        }
        Locator::ReturnOf(callee, prefix) => shape.map_return_of(callee, prefix, |path| {
            Vertex::ReturnOf(callee.clone(), path)
        }),
        Locator::ArgumentOf(callee, index, prefix) => {
            shape.map_argument_of(callee, *index, prefix, |path| {
                Vertex::ArgumentOf(callee.clone(), *index, path)
            })
        }
    }
}
