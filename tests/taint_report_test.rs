//! Tests for graph serialization and result-file emission.

#![allow(clippy::unwrap_used)]

use std::fs;
use taintflow::entry::{run_extraction, ExtractionRequest};
use taintflow::graph::{EdgeKind, FieldPath, LineageGraph, ProcId, Vertex};
use taintflow::report::{self, REACHABLE_GRAPH_FILE, TAINT_GRAPH_FILE};
use taintflow::store::{Dependencies, ProcSummary};
use taintflow::test_utils::MemoryStore;
use taintflow::{TaintError, TaintExtractor, TaintOptions, TaintQuery};
use tempfile::TempDir;

fn proc(text: &str) -> ProcId {
    ProcId::parse(text).unwrap()
}

fn arg(index: usize) -> Vertex {
    Vertex::Argument(index, FieldPath::root())
}

fn ret() -> Vertex {
    Vertex::Return(FieldPath::root())
}

fn local(name: &str) -> Vertex {
    Vertex::Local(name.to_owned(), FieldPath::root())
}

fn summary(deps: &[&str], edges: &[(Vertex, EdgeKind, Vertex)]) -> ProcSummary {
    ProcSummary {
        dependencies: Dependencies::Known(deps.iter().map(|d| proc(d)).collect()),
        shape: None,
        lineage: Some(LineageGraph::from_edges(edges.iter().cloned())),
    }
}

fn arg_to_ret_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.add_summary(
        proc("m:f/1"),
        summary(
            &[],
            &[
                (arg(0), EdgeKind::Direct, local("x")),
                (local("x"), EdgeKind::Direct, ret()),
            ],
        ),
    );
    store
}

fn request(dir: &TempDir, source: &str, sink: &str) -> ExtractionRequest {
    ExtractionRequest {
        source: source.to_owned(),
        sink: sink.to_owned(),
        sanitizers: Vec::new(),
        results_dir: dir.path().join("lineage"),
    }
}

fn read_records(dir: &TempDir, file: &str) -> Vec<serde_json::Value> {
    let text = fs::read_to_string(dir.path().join("lineage").join(file)).unwrap();
    serde_json::from_str::<serde_json::Value>(&text)
        .unwrap()
        .as_array()
        .unwrap()
        .clone()
}

#[test]
fn test_written_taint_graph_round_trips() {
    let mut store = arg_to_ret_store();
    store.add_description(proc("m:f/1"), "f/1 in app/src/m.erl");

    let dir = TempDir::new().unwrap();
    let flow = run_extraction(
        &store,
        &store,
        &TaintOptions::default(),
        &request(&dir, "m:f/1$arg0", "m:f/1$ret"),
    )
    .unwrap();
    assert!(!flow.is_empty());

    let records = read_records(&dir, TAINT_GRAPH_FILE);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["procedure"], "f/1 in app/src/m.erl");
    assert_eq!(records[0]["edges"].as_array().unwrap().len(), 2);
    assert_eq!(records[0]["edges"][0]["kind"], "direct");

    // Not in debug mode: no reachable emission.
    assert!(!dir.path().join("lineage").join(REACHABLE_GRAPH_FILE).exists());
}

#[test]
fn test_debug_flag_also_writes_reachable_map() {
    let mut store = arg_to_ret_store();
    store.add_description(proc("m:f/1"), "f/1");

    let options = TaintOptions {
        lineage_limit: None,
        emit_reachable: true,
    };
    let dir = TempDir::new().unwrap();
    run_extraction(&store, &store, &options, &request(&dir, "m:f/1$arg0", "m:f/1$ret")).unwrap();

    let records = read_records(&dir, REACHABLE_GRAPH_FILE);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["edges"].as_array().unwrap().len(), 2);
}

#[test]
fn test_missing_description_with_edges_is_fatal() {
    let store = arg_to_ret_store();

    let dir = TempDir::new().unwrap();
    let err = run_extraction(
        &store,
        &store,
        &TaintOptions::default(),
        &request(&dir, "m:f/1$arg0", "m:f/1$ret"),
    )
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<TaintError>(),
        Some(TaintError::MissingDescription(ref missing)) if *missing == proc("m:f/1")
    ));
}

#[test]
fn test_undescribed_procedure_without_edges_is_skipped() {
    // The caller descends into a callee that has no persisted summary; the
    // callee shows up in the reachable map with vertices only, and without a
    // description it is dropped from the emission. Its contribution is
    // visible in the caller's callsite vertices.
    let mut store = MemoryStore::new();
    store.add_summary(
        proc("m:g/1"),
        summary(
            &["m:f/1"],
            &[(
                arg(0),
                EdgeKind::Call,
                Vertex::ArgumentOf(proc("m:f/1"), 0, FieldPath::root()),
            )],
        ),
    );
    store.add_description(proc("m:g/1"), "g/1");

    let options = TaintOptions {
        lineage_limit: None,
        emit_reachable: true,
    };
    let dir = TempDir::new().unwrap();
    run_extraction(&store, &store, &options, &request(&dir, "m:g/1$arg0", "m:g/1$ret")).unwrap();

    let records = read_records(&dir, REACHABLE_GRAPH_FILE);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["procedure"], "g/1");

    // No flow reached the sink, so the taint result is empty.
    let taint = read_records(&dir, TAINT_GRAPH_FILE);
    assert!(taint.is_empty());
}

#[test]
fn test_rendering_is_byte_deterministic() {
    let mut store = arg_to_ret_store();
    store.add_description(proc("m:f/1"), "f/1");

    let query = TaintQuery::parse("m:f/1$arg0", "m:f/1$ret", &[]).unwrap();
    let extractor = TaintExtractor::new(&store, TaintOptions::default());

    let mut first = Vec::new();
    let flow = extractor.extract(&query).unwrap();
    report::render_graphs(&mut first, &flow.coreachable, &store).unwrap();

    let mut second = Vec::new();
    let flow = extractor.extract(&query).unwrap();
    report::render_graphs(&mut second, &flow.coreachable, &store).unwrap();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}
