//! Error types for the overlay statistics engine.
//!
//! Errors are categorized by kind so the pipeline can record which stage
//! failed and why. An empty selection or intersection is *not* an error;
//! it is an informational condition carried on the layer outcome instead.

use crate::model::FieldType;
use thiserror::Error;

/// Convenience alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by engine components.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced layer, table, or field does not exist.
    #[error("not found: {kind} '{name}'")]
    NotFound {
        /// What was looked up: "dataset", "layer", "table", or "field"
        kind: &'static str,
        name: String,
    },

    /// A field already exists with an incompatible type.
    #[error("schema conflict on '{dataset}': field '{field}' exists as {found}, expected {expected}")]
    SchemaConflict {
        dataset: String,
        field: String,
        expected: FieldType,
        found: FieldType,
    },

    /// More than one summary row matched a single destination key.
    #[error("ambiguous join on '{layer}': {matches} summary rows match key {key}")]
    AmbiguousJoin {
        layer: String,
        key: String,
        matches: usize,
    },

    /// A ratio denominator was zero for one or more features.
    ///
    /// Ratios for all features with nonzero denominators have already been
    /// written when this is raised; the offending features are left unset.
    #[error("division by zero on '{layer}': {count} feature(s), first is {first_feature}")]
    DivisionByZero {
        layer: String,
        first_feature: u64,
        count: usize,
    },

    /// The geometry capability produced or received an invalid geometry,
    /// or was asked for an unsupported operation.
    #[error("spatial operation failed: {0}")]
    SpatialOperation(String),

    /// The workspace is unreachable, locked, or corrupt.
    #[error("workspace I/O failure: {0}")]
    Io(String),

    /// A long-running operation was cancelled between batches.
    #[error("operation cancelled")]
    Cancelled,
}

impl EngineError {
    /// Short machine-readable kind name, used in outcome records and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NotFound { .. } => "NotFound",
            EngineError::SchemaConflict { .. } => "SchemaConflict",
            EngineError::AmbiguousJoin { .. } => "AmbiguousJoin",
            EngineError::DivisionByZero { .. } => "DivisionByZero",
            EngineError::SpatialOperation(_) => "SpatialOperationFailure",
            EngineError::Io(_) => "IOFailure",
            EngineError::Cancelled => "Cancelled",
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Io(format!("dataset encoding: {err}"))
    }
}
