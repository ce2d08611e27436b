//! Attribute- and location-based feature selection.

use crate::error::{EngineError, EngineResult};
use crate::geometry::GeometryOps;
use crate::model::{Dataset, FeatureId, SelectionMode, SelectionSet, Value};
use crate::workspace::{read_layer, replace_dataset, Workspace};
use std::collections::BTreeSet;
use tracing::debug;

/// Per-feature attribute predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributePredicate {
    /// Case-insensitive equality on a text field (categorical attributes
    /// such as ownership type).
    TextEquals { field: String, value: String },
    /// Numeric field is at least `threshold`. Null values never match.
    AtLeast { field: String, threshold: f64 },
}

impl AttributePredicate {
    fn matches(&self, value: &Value) -> bool {
        match self {
            AttributePredicate::TextEquals { value: wanted, .. } => value
                .as_text()
                .map_or(false, |v| v.eq_ignore_ascii_case(wanted)),
            AttributePredicate::AtLeast { threshold, .. } => {
                value.as_f64().map_or(false, |v| v >= *threshold)
            }
        }
    }

    fn field(&self) -> &str {
        match self {
            AttributePredicate::TextEquals { field, .. } => field,
            AttributePredicate::AtLeast { field, .. } => field,
        }
    }
}

/// What a location selection starts from.
#[derive(Debug, Clone)]
pub enum LocationTarget<'a> {
    /// All features of a layer. As a prior selection this holds every
    /// feature, so `Subset` narrows from the whole layer rather than from
    /// nothing.
    Layer(&'a str),
    /// An existing selection.
    Selection(&'a SelectionSet),
}

/// Selects features of `layer` whose attribute matches `predicate`.
pub fn select_by_attribute(
    ws: &dyn Workspace,
    layer: &str,
    predicate: &AttributePredicate,
) -> EngineResult<SelectionSet> {
    let data = read_layer(ws, layer)?;
    if data.schema.field_index(predicate.field()).is_none() {
        return Err(EngineError::NotFound {
            kind: "field",
            name: format!("{layer}.{}", predicate.field()),
        });
    }

    let ids: BTreeSet<FeatureId> = data
        .features
        .iter()
        .filter(|f| predicate.matches(data.feature_value(f, predicate.field())))
        .map(|f| f.id)
        .collect();

    debug!(layer, selected = ids.len(), "attribute selection");
    Ok(SelectionSet::new(layer, ids))
}

/// Selects features that spatially intersect any feature of
/// `reference_layer`, combined with any prior selection per `mode`.
///
/// The relation is INTERSECTS; candidates are pretested with bounding boxes
/// before the exact test.
pub fn select_by_location(
    ws: &dyn Workspace,
    ops: &dyn GeometryOps,
    target: LocationTarget<'_>,
    reference_layer: &str,
    mode: SelectionMode,
) -> EngineResult<SelectionSet> {
    let layer_name = match &target {
        LocationTarget::Layer(name) => (*name).to_string(),
        LocationTarget::Selection(sel) => sel.layer.clone(),
    };
    let data = read_layer(ws, &layer_name)?;
    let reference = read_layer(ws, reference_layer)?;

    let prior = match target {
        LocationTarget::Layer(_) => SelectionSet::new(
            &layer_name,
            data.features.iter().map(|f| f.id).collect(),
        ),
        LocationTarget::Selection(sel) => sel.clone(),
    };

    // Pre-compute reference bounding boxes once.
    let ref_boxes: Vec<_> = reference
        .features
        .iter()
        .map(|f| (f.geometry.bounding_rect(), &f.geometry))
        .collect();

    let mut hits = BTreeSet::new();
    for feature in &data.features {
        // Subset only ever narrows: skip features outside the prior selection.
        if mode == SelectionMode::Subset && !prior.contains(feature.id) {
            continue;
        }
        let Some(bbox) = feature.geometry.bounding_rect() else {
            continue;
        };
        for (ref_box, ref_geom) in &ref_boxes {
            let Some(ref_box) = ref_box else { continue };
            if !bbox_overlap(&bbox, ref_box) {
                continue;
            }
            if ops.intersects(&feature.geometry, ref_geom)? {
                hits.insert(feature.id);
                break;
            }
        }
    }

    debug!(
        layer = %layer_name,
        reference = reference_layer,
        hits = hits.len(),
        ?mode,
        "location selection"
    );
    Ok(prior.combine(hits, mode))
}

fn bbox_overlap(a: &geo_types::Rect<f64>, b: &geo_types::Rect<f64>) -> bool {
    a.min().x <= b.max().x && b.min().x <= a.max().x && a.min().y <= b.max().y && b.min().y <= a.max().y
}

/// Copies the selected features into a new layer under `output_name`,
/// preserving schema and geometry. An empty selection produces a valid
/// zero-feature layer. Returns the number of features copied.
pub fn materialize(
    ws: &dyn Workspace,
    selection: &SelectionSet,
    output_name: &str,
) -> EngineResult<usize> {
    let source = read_layer(ws, &selection.layer)?;

    let mut output = crate::model::Layer::new(output_name, source.kind, source.schema.clone());
    output.features = source
        .features
        .iter()
        .filter(|f| selection.contains(f.id))
        .cloned()
        .collect();
    let count = output.features.len();

    replace_dataset(ws, Dataset::Layer(output), output_name)?;
    debug!(
        source = %selection.layer,
        output = output_name,
        features = count,
        "materialized selection"
    );
    Ok(count)
}
