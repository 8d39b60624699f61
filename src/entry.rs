//! Host-facing driver: raw request in, result files out.

use crate::analyzer::{TaintExtractor, TaintFlow, TaintQuery};
use crate::config::TaintOptions;
use crate::report;
use crate::store::{DescriptionStore, SummaryStore};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// A taint extraction request as the surrounding front end hands it over.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Source endpoint, `[module:]function/arity$(ret|argN)`.
    pub source: String,
    /// Sink endpoint, same grammar as the source.
    pub sink: String,
    /// Sanitizer procedures, `[module:]function/arity`.
    pub sanitizers: Vec<String>,
    /// Directory the result files are written into.
    pub results_dir: PathBuf,
}

/// Parses the request, runs both phases, and writes the result files.
///
/// The taint result is always written; the reachable map is written when
/// `options.emit_reachable` is set.
///
/// # Errors
///
/// Returns parse, extraction, and reporting errors with file context.
pub fn run_extraction<S: SummaryStore, D: DescriptionStore>(
    store: &S,
    descriptions: &D,
    options: &TaintOptions,
    request: &ExtractionRequest,
) -> Result<TaintFlow> {
    let query = TaintQuery::parse(&request.source, &request.sink, &request.sanitizers)?;
    let extractor = TaintExtractor::new(store, options.clone());
    let flow = extractor.extract(&query)?;
    report::write_flow(
        &request.results_dir,
        &flow,
        descriptions,
        options.emit_reachable,
    )
    .with_context(|| {
        format!(
            "failed to write taint graphs to {}",
            request.results_dir.display()
        )
    })?;
    Ok(flow)
}
