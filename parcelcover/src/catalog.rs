//! Layer catalog: deterministic discovery and pairing of workspace datasets.
//!
//! Listing order follows the workspace's lexicographic catalog order, so
//! downstream pairing is reproducible across runs.

use crate::error::EngineResult;
use crate::geometry::GeometryKind;
use crate::model::DatasetKind;
use crate::workspace::Workspace;
use regex::Regex;

/// How two ordered sequences of layer names are paired for overlay.
///
/// The batch scripts this engine descends from used both shapes at different
/// times, so the strategy stays pluggable instead of hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingStrategy {
    /// Every left name against every right name, left-major order.
    CrossJoin,
    /// Only pairs whose names are equal.
    NameMatched,
}

/// Lists dataset names, optionally filtered by geometry kind and name
/// pattern.
///
/// `kind` of `Some(k)` keeps only layers of that geometry (tables are
/// excluded); `None` keeps every dataset. `pattern` is matched anywhere in
/// the name.
pub fn list(
    ws: &dyn Workspace,
    kind: Option<GeometryKind>,
    pattern: Option<&Regex>,
) -> EngineResult<Vec<String>> {
    let entries = ws.list()?;
    Ok(entries
        .into_iter()
        .filter(|entry| match kind {
            Some(wanted) => entry.kind == DatasetKind::Layer(wanted),
            None => true,
        })
        .filter(|entry| pattern.map_or(true, |re| re.is_match(&entry.name)))
        .map(|entry| entry.name)
        .collect())
}

/// Pairs two ordered name sequences according to `strategy`.
pub fn pair(
    left: &[String],
    right: &[String],
    strategy: PairingStrategy,
) -> Vec<(String, String)> {
    match strategy {
        PairingStrategy::CrossJoin => left
            .iter()
            .flat_map(|l| right.iter().map(move |r| (l.clone(), r.clone())))
            .collect(),
        PairingStrategy::NameMatched => left
            .iter()
            .filter(|l| right.contains(l))
            .map(|l| (l.clone(), l.clone()))
            .collect(),
    }
}
