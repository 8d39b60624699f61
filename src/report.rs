//! Serialization of per-procedure subgraphs to the results directory.

use crate::analyzer::TaintFlow;
use crate::error::TaintError;
use crate::graph::{ProcId, Subgraph};
use crate::store::DescriptionStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// File name of the taint result (the coreachable map).
pub const TAINT_GRAPH_FILE: &str = "taint.json";

/// File name of the debug emission (the reachable map).
pub const REACHABLE_GRAPH_FILE: &str = "taint_reachable.json";

/// Serialized form of one procedure's subgraph.
#[derive(Serialize)]
struct GraphRecord {
    procedure: String,
    vertices: Vec<String>,
    edges: Vec<EdgeRecord>,
}

/// Serialized form of one edge.
#[derive(Serialize)]
struct EdgeRecord {
    source: String,
    kind: String,
    target: String,
}

impl GraphRecord {
    fn new(procedure: String, graph: &Subgraph) -> Self {
        Self {
            procedure,
            vertices: graph.vertices().map(ToString::to_string).collect(),
            edges: graph
                .edges()
                .map(|edge| EdgeRecord {
                    source: edge.source.to_string(),
                    kind: edge.kind.to_string(),
                    target: edge.target.to_string(),
                })
                .collect(),
        }
    }
}

/// Serializes a result map as a JSON array of per-procedure records.
///
/// A procedure without a description is skipped when its subgraph has no
/// edges; its vertices will have been reported within its callers as
/// `ArgumentOf`/`ReturnOf` entries.
///
/// # Errors
///
/// Returns [`TaintError::MissingDescription`] when a procedure with edges has
/// no description, or an IO/serialization error from the writer.
pub fn render_graphs<W: Write>(
    writer: &mut W,
    graphs: &BTreeMap<ProcId, Subgraph>,
    descriptions: &impl DescriptionStore,
) -> Result<(), TaintError> {
    let mut records = Vec::new();
    for (proc, graph) in graphs {
        match descriptions.resolve(proc) {
            Some(description) => records.push(GraphRecord::new(description, graph)),
            None if !graph.has_edges() => continue,
            None => return Err(TaintError::MissingDescription(proc.clone())),
        }
    }
    serde_json::to_writer_pretty(&mut *writer, &records)?;
    writeln!(writer)?;
    Ok(())
}

/// Writes the taint result, and the reachable map when requested, into the
/// host-provided results directory, creating it if needed.
///
/// # Errors
///
/// Propagates description and IO failures from [`render_graphs`].
pub fn write_flow(
    results_dir: &Path,
    flow: &TaintFlow,
    descriptions: &impl DescriptionStore,
    emit_reachable: bool,
) -> Result<(), TaintError> {
    fs::create_dir_all(results_dir)?;
    write_graph_file(
        &results_dir.join(TAINT_GRAPH_FILE),
        &flow.coreachable,
        descriptions,
    )?;
    if emit_reachable {
        write_graph_file(
            &results_dir.join(REACHABLE_GRAPH_FILE),
            &flow.reachable,
            descriptions,
        )?;
    }
    Ok(())
}

fn write_graph_file(
    path: &Path,
    graphs: &BTreeMap<ProcId, Subgraph>,
    descriptions: &impl DescriptionStore,
) -> Result<(), TaintError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    render_graphs(&mut writer, graphs, descriptions)?;
    writer.flush()?;
    Ok(())
}
