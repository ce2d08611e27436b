//! The workspace storage boundary.
//!
//! Every component reads and writes through the [`Workspace`] trait; there
//! is no ambient global path. Two implementations are provided:
//!
//! - [`MemoryWorkspace`]: in-process store, used by tests and as the
//!   reference for boundary semantics.
//! - [`JsonWorkspace`]: a directory of JSON-encoded datasets, one file per
//!   layer or table.
//!
//! # Atomic replacement
//!
//! Engine outputs are never written directly under their final name: they
//! are created under a staging name and committed with [`Workspace::rename`]
//! (an atomic replace). A cancelled or crashed run therefore leaves no
//! half-built dataset under its final name, and re-runs replace rather than
//! accumulate (`_intersect`, `_intersect2`, ... never happens).
//!
//! # Locking
//!
//! Schema-mutating operations take a scoped exclusive lock on the target
//! dataset only, so concurrent reads of unrelated datasets are never
//! serialized by a schema change elsewhere.

mod json;
mod memory;

pub use json::JsonWorkspace;
pub use memory::MemoryWorkspace;

use crate::error::{EngineError, EngineResult};
use crate::model::{
    Dataset, DatasetEntry, Feature, FeatureId, Field, FieldCheck, Layer, Schema, Table, Value,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Shared handle to a workspace implementation.
pub type WorkspaceRef = Arc<dyn Workspace>;

/// The storage boundary contract.
pub trait Workspace: Send + Sync {
    /// All dataset entries, in deterministic (lexicographic) name order.
    fn list(&self) -> EngineResult<Vec<DatasetEntry>>;

    /// Whether a dataset of that name exists.
    fn exists(&self, name: &str) -> EngineResult<bool>;

    /// Creates a new dataset. Fails if the name is already taken; use the
    /// staging + [`Workspace::rename`] idiom to replace.
    fn create(&self, dataset: Dataset) -> EngineResult<()>;

    /// Removes a dataset.
    fn drop_dataset(&self, name: &str) -> EngineResult<()>;

    /// Renames `from` to `to`, atomically replacing any dataset under `to`.
    fn rename(&self, from: &str, to: &str) -> EngineResult<()>;

    /// The current schema of a dataset.
    fn read_schema(&self, name: &str) -> EngineResult<Schema>;

    /// A full copy of a dataset.
    fn read_dataset(&self, name: &str) -> EngineResult<Dataset>;

    /// Appends features to a layer.
    fn write_features(&self, name: &str, features: Vec<Feature>) -> EngineResult<()>;

    /// Adds a field (exclusive schema lock scoped to the mutation).
    ///
    /// `PresentSameType` is an idempotent no-op; a type mismatch is a
    /// `SchemaConflict` error.
    fn add_field(&self, name: &str, field: Field) -> EngineResult<FieldCheck>;

    /// Writes values into one field, keyed by feature id. Ids absent from
    /// the dataset are ignored; a missing field is `NotFound`.
    fn update_field(
        &self,
        name: &str,
        field: &str,
        values: &HashMap<FeatureId, Value>,
    ) -> EngineResult<()>;
}

/// Reads a dataset that must be a layer.
pub fn read_layer(ws: &dyn Workspace, name: &str) -> EngineResult<Layer> {
    match ws.read_dataset(name)? {
        Dataset::Layer(layer) => Ok(layer),
        Dataset::Table(_) => Err(EngineError::NotFound {
            kind: "layer",
            name: name.to_string(),
        }),
    }
}

/// Reads a dataset that must be a table.
pub fn read_table(ws: &dyn Workspace, name: &str) -> EngineResult<Table> {
    match ws.read_dataset(name)? {
        Dataset::Table(table) => Ok(table),
        Dataset::Layer(_) => Err(EngineError::NotFound {
            kind: "table",
            name: name.to_string(),
        }),
    }
}

/// Staging name a dataset is built under before its atomic commit.
pub fn staging_name(final_name: &str) -> String {
    format!("{final_name}__staging")
}

/// Creates `dataset` under the staging name for `final_name` and commits it,
/// replacing any prior dataset of that name. Stale staging leftovers from a
/// crashed run are dropped first.
pub fn replace_dataset(ws: &dyn Workspace, mut dataset: Dataset, final_name: &str) -> EngineResult<()> {
    let staging = staging_name(final_name);
    if ws.exists(&staging)? {
        ws.drop_dataset(&staging)?;
    }
    dataset.set_name(&staging);
    ws.create(dataset)?;
    ws.rename(&staging, final_name)
}

/// Drops the staging dataset for `final_name` if present (cancellation and
/// failure cleanup).
pub fn discard_staging(ws: &dyn Workspace, final_name: &str) -> EngineResult<()> {
    let staging = staging_name(final_name);
    if ws.exists(&staging)? {
        ws.drop_dataset(&staging)?;
    }
    Ok(())
}

/// Applies `add_field` semantics to an in-memory dataset, mapping a type
/// mismatch to `SchemaConflict`. Shared by the workspace implementations.
pub(crate) fn apply_add_field(dataset: &mut Dataset, field: Field) -> EngineResult<FieldCheck> {
    let name = dataset.name().to_string();
    let field_name = field.name.clone();
    let expected = field.field_type;
    match dataset.add_field(field) {
        FieldCheck::PresentWrongType(found) => Err(EngineError::SchemaConflict {
            dataset: name,
            field: field_name,
            expected,
            found,
        }),
        check => Ok(check),
    }
}

/// Applies `update_field` semantics to an in-memory dataset. Shared by the
/// workspace implementations.
pub(crate) fn apply_update_field(
    dataset: &mut Dataset,
    field: &str,
    values: &HashMap<FeatureId, Value>,
) -> EngineResult<()> {
    let index = dataset
        .schema()
        .field_index(field)
        .ok_or_else(|| EngineError::NotFound {
            kind: "field",
            name: format!("{}.{}", dataset.name(), field),
        })?;
    match dataset {
        Dataset::Layer(layer) => {
            for feature in &mut layer.features {
                if let Some(value) = values.get(&feature.id) {
                    if feature.values.len() <= index {
                        feature.values.resize(index + 1, Value::Null);
                    }
                    feature.values[index] = value.clone();
                }
            }
        }
        Dataset::Table(table) => {
            for row in &mut table.rows {
                if let Some(value) = values.get(&row.id) {
                    if row.values.len() <= index {
                        row.values.resize(index + 1, Value::Null);
                    }
                    row.values[index] = value.clone();
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryKind;

    #[test]
    fn test_staging_name_is_derived() {
        assert_eq!(staging_name("Parcels_intersect"), "Parcels_intersect__staging");
    }

    #[test]
    fn test_replace_dataset_commits_atomically() {
        let ws = MemoryWorkspace::new();
        let layer = Layer::new("out", GeometryKind::Polygon, Schema::empty());
        replace_dataset(&ws, Dataset::Layer(layer.clone()), "out").unwrap();

        assert!(ws.exists("out").unwrap());
        assert!(!ws.exists(&staging_name("out")).unwrap());

        // Replacing again under the same name must not error or duplicate
        replace_dataset(&ws, Dataset::Layer(layer), "out").unwrap();
        assert_eq!(ws.list().unwrap().len(), 1);
    }

    #[test]
    fn test_discard_staging_is_quiet_when_absent() {
        let ws = MemoryWorkspace::new();
        discard_staging(&ws, "never_written").unwrap();
    }
}
