use serde::Deserialize;

/// Tuning knobs for an extraction, embeddable in the host's TOML config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaintOptions {
    /// Global cap on edges accumulated by the forward phase.
    #[serde(default)]
    pub lineage_limit: Option<usize>,
    /// Also write the reachable map next to the taint result.
    #[serde(default)]
    pub emit_reachable: bool,
}
