//! Layers, tables, and the dataset wrapper the workspace stores.

use super::feature::{Feature, FeatureId, Row};
use super::field::{Field, FieldCheck, Schema};
use super::value::Value;
use crate::geometry::GeometryKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named collection of features with a declared geometry kind and an
/// evolving field schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub kind: GeometryKind,
    pub schema: Schema,
    pub features: Vec<Feature>,
}

impl Layer {
    pub fn new(name: impl Into<String>, kind: GeometryKind, schema: Schema) -> Self {
        Self {
            name: name.into(),
            kind,
            schema,
            features: Vec::new(),
        }
    }

    /// Named attribute value of a feature, `Null` when the field is unknown.
    pub fn feature_value<'a>(&'a self, feature: &'a Feature, field: &str) -> &'a Value {
        match self.schema.field_index(field) {
            Some(idx) => feature.value(idx),
            None => &Value::Null,
        }
    }

    /// Adds a field to the schema and pads every feature with `Null`.
    ///
    /// Returns the pre-mutation check; `PresentSameType` leaves both schema
    /// and features untouched.
    pub fn add_field(&mut self, field: Field) -> FieldCheck {
        let check = self.schema.add_field(field);
        if check == FieldCheck::Absent {
            for feature in &mut self.features {
                feature.values.resize(self.schema.len(), Value::Null);
            }
        }
        check
    }

    /// Writes a value into a named field of one feature by id.
    pub fn set_value(&mut self, id: FeatureId, field_index: usize, value: Value) {
        if let Some(feature) = self.features.iter_mut().find(|f| f.id == id) {
            if feature.values.len() <= field_index {
                feature.values.resize(field_index + 1, Value::Null);
            }
            feature.values[field_index] = value;
        }
    }
}

/// An attribute-only analogue of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub schema: Schema,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            rows: Vec::new(),
        }
    }

    pub fn row_value<'a>(&'a self, row: &'a Row, field: &str) -> &'a Value {
        match self.schema.field_index(field) {
            Some(idx) => row.value(idx),
            None => &Value::Null,
        }
    }

    pub fn add_field(&mut self, field: Field) -> FieldCheck {
        let check = self.schema.add_field(field);
        if check == FieldCheck::Absent {
            for row in &mut self.rows {
                row.values.resize(self.schema.len(), Value::Null);
            }
        }
        check
    }
}

/// What a workspace entry is: a layer of some geometry kind, or a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    Layer(GeometryKind),
    Table,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Layer(kind) => write!(f, "{kind} layer"),
            DatasetKind::Table => f.write_str("table"),
        }
    }
}

/// A catalog entry: dataset name and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetEntry {
    pub name: String,
    pub kind: DatasetKind,
}

/// The unit of storage a workspace holds under one name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Dataset {
    Layer(Layer),
    Table(Table),
}

impl Dataset {
    pub fn name(&self) -> &str {
        match self {
            Dataset::Layer(l) => &l.name,
            Dataset::Table(t) => &t.name,
        }
    }

    pub fn set_name(&mut self, name: &str) {
        match self {
            Dataset::Layer(l) => l.name = name.to_string(),
            Dataset::Table(t) => t.name = name.to_string(),
        }
    }

    pub fn kind(&self) -> DatasetKind {
        match self {
            Dataset::Layer(l) => DatasetKind::Layer(l.kind),
            Dataset::Table(_) => DatasetKind::Table,
        }
    }

    pub fn schema(&self) -> &Schema {
        match self {
            Dataset::Layer(l) => &l.schema,
            Dataset::Table(t) => &t.schema,
        }
    }

    /// Adds a field, padding existing records with `Null`.
    pub fn add_field(&mut self, field: Field) -> FieldCheck {
        match self {
            Dataset::Layer(l) => l.add_field(field),
            Dataset::Table(t) => t.add_field(field),
        }
    }

    pub fn as_layer(&self) -> Option<&Layer> {
        match self {
            Dataset::Layer(l) => Some(l),
            Dataset::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Dataset::Table(t) => Some(t),
            Dataset::Layer(_) => None,
        }
    }
}
