//! Join-back propagation: copy aggregates onto origin features and derive
//! ratio fields.

use crate::error::{EngineError, EngineResult};
use crate::model::{FeatureId, FieldCheck, FieldType, SummaryTable, Value};
use crate::workspace::{read_layer, Workspace};
use std::collections::HashMap;
use tracing::{debug, warn};

/// The destination key a summary row is matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyField {
    /// The feature's own id (the OBJECTID analogue).
    FeatureId,
    /// A named attribute field.
    Attribute(String),
}

/// Join statistics for the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JoinStats {
    /// Features that matched exactly one summary row.
    pub matched: usize,
    /// Features with no match, set to the documented default of 0.
    pub defaulted: usize,
}

/// Copies each feature's matching aggregate out of `summary` into
/// `target_field` on `dest_layer`.
///
/// Match cardinality is enforced, not assumed: zero matches write the
/// documented default `0.0` ("no measured overlap"), exactly one match
/// copies the aggregate, and more than one match is an `AmbiguousJoin`
/// error, in which case nothing is written.
pub fn attach_and_copy(
    ws: &dyn Workspace,
    dest_layer: &str,
    dest_key: &KeyField,
    summary: &SummaryTable,
    target_field: &str,
) -> EngineResult<JoinStats> {
    let layer = read_layer(ws, dest_layer)?;
    match layer.schema.check_field(target_field, FieldType::Double) {
        FieldCheck::Absent => {
            return Err(EngineError::NotFound {
                kind: "field",
                name: format!("{dest_layer}.{target_field}"),
            })
        }
        FieldCheck::PresentWrongType(found) => {
            return Err(EngineError::SchemaConflict {
                dataset: dest_layer.to_string(),
                field: target_field.to_string(),
                expected: FieldType::Double,
                found,
            })
        }
        FieldCheck::PresentSameType => {}
    }

    let mut values: HashMap<FeatureId, Value> = HashMap::with_capacity(layer.features.len());
    let mut stats = JoinStats::default();
    for feature in &layer.features {
        let key = match dest_key {
            KeyField::FeatureId => Value::Integer(feature.id.value() as i64),
            KeyField::Attribute(name) => layer.feature_value(feature, name).clone(),
        };
        match summary.matches(&key) {
            0 => {
                values.insert(feature.id, Value::Double(0.0));
                stats.defaulted += 1;
            }
            1 => {
                // matches() == 1 guarantees get() yields the single row
                let total = summary.get(&key).unwrap_or(0.0);
                values.insert(feature.id, Value::Double(total));
                stats.matched += 1;
            }
            n => {
                return Err(EngineError::AmbiguousJoin {
                    layer: dest_layer.to_string(),
                    key: key.to_string(),
                    matches: n,
                });
            }
        }
    }
    ws.update_field(dest_layer, target_field, &values)?;

    debug!(
        layer = dest_layer,
        target_field,
        matched = stats.matched,
        defaulted = stats.defaulted,
        "attached summary"
    );
    Ok(stats)
}

/// Derives `output_field = numerator / denominator * scale` per feature.
///
/// Features with a zero (or null) denominator are left `Null` (never an
/// unsignaled Infinity or NaN) and reported through a `DivisionByZero`
/// error after every well-defined ratio has been written. A null numerator
/// counts as 0 (the join default writes 0.0, so this only arises on layers
/// joined by other means).
pub fn derive_ratio(
    ws: &dyn Workspace,
    layer: &str,
    numerator_field: &str,
    denominator_field: &str,
    output_field: &str,
    scale: f64,
) -> EngineResult<usize> {
    let data = read_layer(ws, layer)?;
    for field in [numerator_field, denominator_field, output_field] {
        if data.schema.field_index(field).is_none() {
            return Err(EngineError::NotFound {
                kind: "field",
                name: format!("{layer}.{field}"),
            });
        }
    }

    let mut values: HashMap<FeatureId, Value> = HashMap::with_capacity(data.features.len());
    let mut degenerate: Vec<FeatureId> = Vec::new();
    for feature in &data.features {
        let numerator = data
            .feature_value(feature, numerator_field)
            .as_f64()
            .unwrap_or(0.0);
        let denominator = data.feature_value(feature, denominator_field).as_f64();
        match denominator {
            Some(d) if d != 0.0 => {
                values.insert(feature.id, Value::Double(numerator / d * scale));
            }
            _ => {
                values.insert(feature.id, Value::Null);
                degenerate.push(feature.id);
            }
        }
    }
    let computed = values.len() - degenerate.len();
    ws.update_field(layer, output_field, &values)?;

    if let Some(first) = degenerate.first() {
        warn!(
            layer,
            count = degenerate.len(),
            first = %first,
            "zero denominator, ratio left unset"
        );
        return Err(EngineError::DivisionByZero {
            layer: layer.to_string(),
            first_feature: first.value(),
            count: degenerate.len(),
        });
    }

    debug!(layer, output_field, computed, "derived ratio");
    Ok(computed)
}
