//! Idempotent schema extension and geometry measurement.
//!
//! The measurement field is keyed by geometry kind: polygons get an area,
//! polylines get a length, always DOUBLE, always in the configured unit.
//! Re-running with the same unit rewrites the same values.

use crate::error::{EngineError, EngineResult};
use crate::geometry::{AreaUnit, GeometryKind, GeometryOps, LengthUnit};
use crate::model::{FeatureId, Field, FieldCheck, FieldType, Value};
use crate::workspace::{read_layer, Workspace};
use std::collections::HashMap;
use tracing::debug;

/// Area and length units a measurement run is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitConfig {
    pub area: AreaUnit,
    pub length: LengthUnit,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            area: AreaUnit::Acres,
            length: LengthUnit::Feet,
        }
    }
}

/// Ensures `field` exists on `dataset` with the given type.
///
/// No-op when the field is already present with the same type; a type
/// mismatch is a `SchemaConflict`. Returns the pre-mutation check so callers
/// can tell "created" from "already there".
pub fn ensure_field(
    ws: &dyn Workspace,
    dataset: &str,
    field: &str,
    field_type: FieldType,
) -> EngineResult<FieldCheck> {
    ws.add_field(dataset, Field::new(field, field_type))
}

/// Computes each feature's area (Polygon) or length (Polyline) in the
/// configured unit and writes it into `field`.
///
/// The field must already exist as DOUBLE (`ensure_field` it first).
/// Returns the number of features measured.
pub fn measure(
    ws: &dyn Workspace,
    ops: &dyn GeometryOps,
    layer: &str,
    field: &str,
    units: &UnitConfig,
) -> EngineResult<usize> {
    let data = read_layer(ws, layer)?;
    match data.schema.check_field(field, FieldType::Double) {
        FieldCheck::Absent => {
            return Err(EngineError::NotFound {
                kind: "field",
                name: format!("{layer}.{field}"),
            })
        }
        FieldCheck::PresentWrongType(found) => {
            return Err(EngineError::SchemaConflict {
                dataset: layer.to_string(),
                field: field.to_string(),
                expected: FieldType::Double,
                found,
            })
        }
        FieldCheck::PresentSameType => {}
    }

    let mut values: HashMap<FeatureId, Value> = HashMap::with_capacity(data.features.len());
    for feature in &data.features {
        let measured = match data.kind {
            GeometryKind::Polygon => ops.area(&feature.geometry, units.area)?,
            GeometryKind::Polyline => ops.length(&feature.geometry, units.length)?,
        };
        values.insert(feature.id, Value::Double(measured));
    }
    let count = values.len();
    ws.update_field(layer, field, &values)?;

    debug!(layer, field, features = count, "measured geometry");
    Ok(count)
}
