use crate::graph::ProcId;
use std::fmt;

/// Errors surfaced by the taint-flow extractor.
#[derive(Debug)]
pub enum TaintError {
    /// A source, sink, or sanitizer string did not match the endpoint grammar.
    BadEndpoint(String),
    /// A persisted summary declared an incomplete dependency set.
    CorruptSummary(ProcId),
    /// A procedure contributed edges to the taint graph but has no description.
    MissingDescription(ProcId),
    /// IO error while writing result files.
    Io(std::io::Error),
    /// Serialization error while emitting a graph.
    Serialize(serde_json::Error),
}

impl fmt::Display for TaintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadEndpoint(text) => write!(
                f,
                "malformed endpoint '{text}': expected [module:]function/arity with an optional $ret or $argN suffix"
            ),
            Self::CorruptSummary(proc) => {
                write!(f, "summary for {proc} declares an incomplete dependency set")
            }
            Self::MissingDescription(proc) => {
                write!(f, "no description found for {proc}, but its taint graph is not empty")
            }
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Serialize(e) => write!(f, "serialization error: {e}"),
        }
    }
}

impl std::error::Error for TaintError {}

impl From<std::io::Error> for TaintError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for TaintError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialize(e)
    }
}
