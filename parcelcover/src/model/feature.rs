//! Features and attribute rows.

use super::value::Value;
use crate::geometry::Geometry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable per-layer feature key (the OBJECTID analogue).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FeatureId(pub u64);

impl FeatureId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A geometry plus its attribute record.
///
/// Values are positionally aligned with the owning layer's schema; adding a
/// field to the schema pads every feature with `Value::Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    pub values: Vec<Value>,
}

impl Feature {
    pub fn new(id: u64, geometry: Geometry, values: Vec<Value>) -> Self {
        Self {
            id: FeatureId(id),
            geometry,
            values,
        }
    }

    /// Value at a schema position, `Null` if the record is short.
    pub fn value(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&Value::Null)
    }
}

/// An attribute-only row (tables have no geometry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: FeatureId,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(id: u64, values: Vec<Value>) -> Self {
        Self {
            id: FeatureId(id),
            values,
        }
    }

    pub fn value(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::MultiPolygon;

    #[test]
    fn test_feature_value_out_of_range_is_null() {
        let f = Feature::new(
            1,
            Geometry::Polygon(MultiPolygon(vec![])),
            vec![Value::Integer(5)],
        );
        assert_eq!(*f.value(0), Value::Integer(5));
        assert_eq!(*f.value(3), Value::Null);
    }

    #[test]
    fn test_feature_id_display() {
        assert_eq!(format!("{}", FeatureId(42)), "42");
    }
}
