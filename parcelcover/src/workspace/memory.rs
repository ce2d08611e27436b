//! In-process workspace implementation.

use super::{apply_add_field, apply_update_field, Workspace};
use crate::error::{EngineError, EngineResult};
use crate::model::{Dataset, DatasetEntry, Feature, FeatureId, Field, FieldCheck, Schema, Value};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// An in-memory workspace.
///
/// The catalog is a `BTreeMap`, so listing order is lexicographic and
/// stable. Each dataset sits behind its own lock: schema mutations take a
/// write lock on that dataset only, and reads of other datasets proceed
/// concurrently.
#[derive(Default)]
pub struct MemoryWorkspace {
    datasets: RwLock<BTreeMap<String, Arc<RwLock<Dataset>>>>,
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, name: &str) -> EngineResult<Arc<RwLock<Dataset>>> {
        self.datasets
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::NotFound {
                kind: "dataset",
                name: name.to_string(),
            })
    }
}

impl Workspace for MemoryWorkspace {
    fn list(&self) -> EngineResult<Vec<DatasetEntry>> {
        let datasets = self.datasets.read();
        Ok(datasets
            .iter()
            .map(|(name, dataset)| DatasetEntry {
                name: name.clone(),
                kind: dataset.read().kind(),
            })
            .collect())
    }

    fn exists(&self, name: &str) -> EngineResult<bool> {
        Ok(self.datasets.read().contains_key(name))
    }

    fn create(&self, dataset: Dataset) -> EngineResult<()> {
        let name = dataset.name().to_string();
        let mut datasets = self.datasets.write();
        if datasets.contains_key(&name) {
            return Err(EngineError::Io(format!("dataset '{name}' already exists")));
        }
        datasets.insert(name, Arc::new(RwLock::new(dataset)));
        Ok(())
    }

    fn drop_dataset(&self, name: &str) -> EngineResult<()> {
        let mut datasets = self.datasets.write();
        datasets.remove(name).ok_or_else(|| EngineError::NotFound {
            kind: "dataset",
            name: name.to_string(),
        })?;
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> EngineResult<()> {
        let mut datasets = self.datasets.write();
        let handle = datasets.remove(from).ok_or_else(|| EngineError::NotFound {
            kind: "dataset",
            name: from.to_string(),
        })?;
        handle.write().set_name(to);
        // Atomic replace: any prior dataset under `to` is dropped here.
        datasets.insert(to.to_string(), handle);
        Ok(())
    }

    fn read_schema(&self, name: &str) -> EngineResult<Schema> {
        Ok(self.handle(name)?.read().schema().clone())
    }

    fn read_dataset(&self, name: &str) -> EngineResult<Dataset> {
        Ok(self.handle(name)?.read().clone())
    }

    fn write_features(&self, name: &str, features: Vec<Feature>) -> EngineResult<()> {
        let handle = self.handle(name)?;
        let mut dataset = handle.write();
        match &mut *dataset {
            Dataset::Layer(layer) => {
                layer.features.extend(features);
                Ok(())
            }
            Dataset::Table(_) => Err(EngineError::NotFound {
                kind: "layer",
                name: name.to_string(),
            }),
        }
    }

    fn add_field(&self, name: &str, field: Field) -> EngineResult<FieldCheck> {
        let handle = self.handle(name)?;
        // Scoped exclusive lock on this dataset only.
        let mut dataset = handle.write();
        apply_add_field(&mut dataset, field)
    }

    fn update_field(
        &self,
        name: &str,
        field: &str,
        values: &HashMap<FeatureId, Value>,
    ) -> EngineResult<()> {
        let handle = self.handle(name)?;
        let mut dataset = handle.write();
        apply_update_field(&mut dataset, field, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, GeometryKind};
    use crate::model::{Layer, Table};
    use geo_types::MultiPolygon;

    fn empty_polygon() -> Geometry {
        Geometry::Polygon(MultiPolygon(vec![]))
    }

    fn seed_layer(name: &str) -> Layer {
        let mut layer = Layer::new(
            name,
            GeometryKind::Polygon,
            Schema::new(vec![Field::text("OWN_TYPE")]),
        );
        layer
            .features
            .push(Feature::new(1, empty_polygon(), vec![Value::Text("Private".into())]));
        layer
    }

    #[test]
    fn test_create_and_list_sorted() {
        let ws = MemoryWorkspace::new();
        ws.create(Dataset::Layer(seed_layer("b_layer"))).unwrap();
        ws.create(Dataset::Layer(seed_layer("a_layer"))).unwrap();
        ws.create(Dataset::Table(Table::new("c_table", Schema::empty())))
            .unwrap();

        let names: Vec<_> = ws.list().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a_layer", "b_layer", "c_table"]);
    }

    #[test]
    fn test_create_duplicate_fails() {
        let ws = MemoryWorkspace::new();
        ws.create(Dataset::Layer(seed_layer("dup"))).unwrap();
        assert!(ws.create(Dataset::Layer(seed_layer("dup"))).is_err());
    }

    #[test]
    fn test_rename_replaces_existing() {
        let ws = MemoryWorkspace::new();
        ws.create(Dataset::Layer(seed_layer("old_out"))).unwrap();
        ws.create(Dataset::Layer(seed_layer("staging"))).unwrap();

        ws.rename("staging", "old_out").unwrap();

        assert_eq!(ws.list().unwrap().len(), 1);
        let dataset = ws.read_dataset("old_out").unwrap();
        assert_eq!(dataset.name(), "old_out");
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let ws = MemoryWorkspace::new();
        let err = ws.read_dataset("ghost").unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[test]
    fn test_add_field_conflict() {
        let ws = MemoryWorkspace::new();
        ws.create(Dataset::Layer(seed_layer("parcels"))).unwrap();

        assert_eq!(
            ws.add_field("parcels", Field::double("Parcel_Acres")).unwrap(),
            FieldCheck::Absent
        );
        assert_eq!(
            ws.add_field("parcels", Field::double("Parcel_Acres")).unwrap(),
            FieldCheck::PresentSameType
        );
        let err = ws.add_field("parcels", Field::double("OWN_TYPE")).unwrap_err();
        assert_eq!(err.kind(), "SchemaConflict");
    }

    #[test]
    fn test_update_field_by_id() {
        let ws = MemoryWorkspace::new();
        ws.create(Dataset::Layer(seed_layer("parcels"))).unwrap();
        ws.add_field("parcels", Field::double("Parcel_Acres")).unwrap();

        let mut values = HashMap::new();
        values.insert(FeatureId(1), Value::Double(4.0));
        values.insert(FeatureId(99), Value::Double(9.0)); // unknown id, ignored
        ws.update_field("parcels", "Parcel_Acres", &values).unwrap();

        let layer = match ws.read_dataset("parcels").unwrap() {
            Dataset::Layer(l) => l,
            _ => unreachable!(),
        };
        let feature = &layer.features[0];
        assert_eq!(layer.feature_value(feature, "Parcel_Acres").as_f64(), Some(4.0));
    }

    #[test]
    fn test_update_missing_field_is_not_found() {
        let ws = MemoryWorkspace::new();
        ws.create(Dataset::Layer(seed_layer("parcels"))).unwrap();
        let err = ws
            .update_field("parcels", "ghost", &HashMap::new())
            .unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[test]
    fn test_write_features_appends() {
        let ws = MemoryWorkspace::new();
        ws.create(Dataset::Layer(seed_layer("parcels"))).unwrap();
        ws.write_features(
            "parcels",
            vec![Feature::new(2, empty_polygon(), vec![Value::Text("State".into())])],
        )
        .unwrap();

        let layer = match ws.read_dataset("parcels").unwrap() {
            Dataset::Layer(l) => l,
            _ => unreachable!(),
        };
        assert_eq!(layer.features.len(), 2);
    }
}
