//! Data model: fields and schemas, typed values, features, layers, tables,
//! summary tables, and selections.
//!
//! A [`Layer`] is a named collection of [`Feature`]s with a declared
//! [`crate::geometry::GeometryKind`] and an evolving, versioned [`Schema`];
//! a [`Table`] is its attribute-only analogue. [`Dataset`] is the unit a
//! workspace stores under one name.

mod dataset;
mod feature;
mod field;
mod selection;
mod summary;
mod value;

pub use dataset::{Dataset, DatasetEntry, DatasetKind, Layer, Table};
pub use feature::{Feature, FeatureId, Row};
pub use field::{Field, FieldCheck, FieldType, Schema};
pub use selection::{SelectionMode, SelectionSet};
pub use summary::{SummaryRow, SummaryTable};
pub use value::Value;
