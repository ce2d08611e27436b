//! Pairwise geometric intersection of two layers.
//!
//! For every pair `(fa ∈ A, fb ∈ B)` whose geometries overlap, exactly one
//! output feature is emitted: geometry = their planar intersection,
//! attributes = A's fields ∪ B's fields (collisions disambiguated by source
//! layer name) plus a back-reference field carrying A's feature key.
//!
//! Naive cost is O(|A|·|B|); bounding-box pretests keep it tractable at
//! realistic scale. Output is accumulated in batches under a staging name
//! and committed atomically on completion; a cancel token is polled between
//! batches.

use crate::cancel::CancelToken;
use crate::error::{EngineError, EngineResult};
use crate::geometry::{GeometryKind, GeometryOps};
use crate::model::{Dataset, Feature, Field, Layer, Schema, Value};
use crate::workspace::{discard_staging, read_layer, staging_name, Workspace};
use tracing::{debug, info, warn};

/// Default number of output features written per staging batch.
pub const DEFAULT_BATCH_SIZE: usize = 512;

/// Overlay tuning knobs.
#[derive(Debug, Clone)]
pub struct OverlayOptions {
    /// Output features per staging write; the cancel token is polled at
    /// batch boundaries.
    pub batch_size: usize,
    pub cancel: CancelToken,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            cancel: CancelToken::new(),
        }
    }
}

/// What an overlay run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayOutcome {
    /// Features emitted into the output layer.
    pub features_out: usize,
    /// Pairs that survived the bounding-box pretest and were tested exactly.
    pub pairs_tested: usize,
    /// True when the output has zero features (informational, not an error).
    pub empty: bool,
}

/// Name of the back-reference field carrying layer A's feature key.
pub fn back_ref_field(layer_a: &str) -> String {
    format!("FID_{layer_a}")
}

/// Geometry kind of the intersection of two layer kinds.
fn output_kind(a: GeometryKind, b: GeometryKind) -> EngineResult<GeometryKind> {
    match (a, b) {
        (GeometryKind::Polygon, GeometryKind::Polygon) => Ok(GeometryKind::Polygon),
        (GeometryKind::Polygon, GeometryKind::Polyline)
        | (GeometryKind::Polyline, GeometryKind::Polygon) => Ok(GeometryKind::Polyline),
        (GeometryKind::Polyline, GeometryKind::Polyline) => Err(EngineError::SpatialOperation(
            "polyline/polyline overlay produces point geometry, which is out of domain"
                .to_string(),
        )),
    }
}

/// Union of A's and B's schemas with source-qualified collision handling:
/// the back-reference field comes first, A's fields keep their names, and a
/// B field colliding with an earlier name becomes `<layerB>_<name>`.
fn union_schema(layer_a: &Layer, layer_b: &Layer) -> Schema {
    let mut fields = vec![Field::integer(back_ref_field(&layer_a.name))];
    let mut taken: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();

    for (layer, schema) in [(&layer_a.name, &layer_a.schema), (&layer_b.name, &layer_b.schema)] {
        for field in schema.fields() {
            let name = unique_field_name(&taken, layer, &field.name);
            taken.push(name.clone());
            fields.push(Field::new(name, field.field_type));
        }
    }
    Schema::new(fields)
}

/// Source-qualifies `name` until it collides with nothing already taken
/// (the qualified form itself can be a literal field of the other layer).
fn unique_field_name(taken: &[String], layer: &str, name: &str) -> String {
    if !taken.iter().any(|t| t == name) {
        return name.to_string();
    }
    let mut candidate = format!("{layer}_{name}");
    let mut n = 2;
    while taken.iter().any(|t| t == &candidate) {
        candidate = format!("{layer}_{name}_{n}");
        n += 1;
    }
    candidate
}

/// Intersects `layer_a` with `layer_b` into `output_name`.
///
/// Degenerate (near-zero-area) intersections are still emitted; there is
/// no area threshold in this domain. Zero output features is reported via
/// [`OverlayOutcome::empty`], never as an error.
pub fn intersect(
    ws: &dyn Workspace,
    ops: &dyn GeometryOps,
    layer_a: &str,
    layer_b: &str,
    output_name: &str,
    options: &OverlayOptions,
) -> EngineResult<OverlayOutcome> {
    let a = read_layer(ws, layer_a)?;
    let b = read_layer(ws, layer_b)?;
    let kind = output_kind(a.kind, b.kind)?;
    let schema = union_schema(&a, &b);

    // Build under a staging name; only a completed run is committed.
    let staging = staging_name(output_name);
    if ws.exists(&staging)? {
        ws.drop_dataset(&staging)?;
    }
    ws.create(Dataset::Layer(Layer::new(&staging, kind, schema)))?;

    // Any failure or cancellation discards the staging layer so nothing
    // half-built ever appears under the final name.
    let (features_out, pairs_tested) = match emit_pairs(ws, ops, &a, &b, &staging, options) {
        Ok(counts) => counts,
        Err(err) => {
            discard_staging(ws, output_name)?;
            if matches!(err, EngineError::Cancelled) {
                warn!(output = output_name, "overlay cancelled, staging discarded");
            }
            return Err(err);
        }
    };

    // Commit: atomic replace of any prior output of the same name.
    ws.rename(&staging, output_name)?;

    let empty = features_out == 0;
    if empty {
        info!(
            a = layer_a,
            b = layer_b,
            output = output_name,
            "overlay produced no features"
        );
    } else {
        debug!(
            a = layer_a,
            b = layer_b,
            output = output_name,
            features_out,
            pairs_tested,
            "overlay complete"
        );
    }
    Ok(OverlayOutcome {
        features_out,
        pairs_tested,
        empty,
    })
}

/// Runs the pairwise loop, appending batches to the staging layer. Returns
/// `(features_out, pairs_tested)`.
fn emit_pairs(
    ws: &dyn Workspace,
    ops: &dyn GeometryOps,
    a: &Layer,
    b: &Layer,
    staging: &str,
    options: &OverlayOptions,
) -> EngineResult<(usize, usize)> {
    let b_boxes: Vec<_> = b
        .features
        .iter()
        .map(|f| (f.geometry.bounding_rect(), f))
        .collect();

    let mut batch: Vec<Feature> = Vec::with_capacity(options.batch_size);
    let mut features_out = 0usize;
    let mut pairs_tested = 0usize;
    let mut next_id = 1u64;

    for fa in &a.features {
        if options.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let Some(box_a) = fa.geometry.bounding_rect() else {
            continue;
        };
        for (box_b, fb) in &b_boxes {
            let Some(box_b) = box_b else { continue };
            if !boxes_overlap(&box_a, box_b) {
                continue;
            }
            pairs_tested += 1;
            let Some(geometry) = ops.intersect(&fa.geometry, &fb.geometry)? else {
                continue;
            };

            let mut values = Vec::with_capacity(1 + fa.values.len() + fb.values.len());
            values.push(Value::Integer(fa.id.value() as i64));
            values.extend(fa.values.iter().cloned());
            values.extend(fb.values.iter().cloned());
            batch.push(Feature::new(next_id, geometry, values));
            next_id += 1;

            if batch.len() >= options.batch_size {
                features_out += batch.len();
                ws.write_features(staging, std::mem::take(&mut batch))?;
            }
        }
    }
    if !batch.is_empty() {
        features_out += batch.len();
        ws.write_features(staging, batch)?;
    }
    Ok((features_out, pairs_tested))
}

fn boxes_overlap(a: &geo_types::Rect<f64>, b: &geo_types::Rect<f64>) -> bool {
    a.min().x <= b.max().x && b.min().x <= a.max().x && a.min().y <= b.max().y && b.min().y <= a.max().y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{AreaUnit, Geometry, PlanarOps};
    use crate::model::{FeatureId, FieldType};
    use crate::workspace::read_layer;
    use crate::workspace::MemoryWorkspace;
    use geo_types::{polygon, MultiPolygon};

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry {
        Geometry::Polygon(MultiPolygon(vec![polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
        ]]))
    }

    fn workspace_with(parcels: Vec<Feature>, forest: Vec<Feature>) -> MemoryWorkspace {
        let ws = MemoryWorkspace::new();
        let mut a = Layer::new(
            "parcels",
            GeometryKind::Polygon,
            Schema::new(vec![Field::text("OWN_TYPE")]),
        );
        a.features = parcels;
        ws.create(Dataset::Layer(a)).unwrap();

        let mut b = Layer::new(
            "forest",
            GeometryKind::Polygon,
            Schema::new(vec![Field::text("COVER")]),
        );
        b.features = forest;
        ws.create(Dataset::Layer(b)).unwrap();
        ws
    }

    #[test]
    fn test_intersect_emits_one_feature_per_overlapping_pair() {
        let ws = workspace_with(
            vec![
                Feature::new(1, square(0.0, 0.0, 10.0, 10.0), vec![Value::from("Private")]),
                Feature::new(2, square(20.0, 0.0, 30.0, 10.0), vec![Value::from("Private")]),
            ],
            vec![
                Feature::new(1, square(0.0, 0.0, 10.0, 5.0), vec![Value::from("forest")]),
                Feature::new(2, square(25.0, 5.0, 40.0, 20.0), vec![Value::from("forest")]),
            ],
        );
        let ops = PlanarOps::new();

        let outcome = intersect(
            &ws,
            &ops,
            "parcels",
            "forest",
            "parcels_intersect",
            &OverlayOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome.features_out, 2);
        assert!(!outcome.empty);

        let out = read_layer(&ws, "parcels_intersect").unwrap();
        assert_eq!(out.kind, GeometryKind::Polygon);
        assert_eq!(out.features.len(), 2);

        // Back-reference carries parcel keys
        let backs: Vec<_> = out
            .features
            .iter()
            .map(|f| out.feature_value(f, "FID_parcels").clone())
            .collect();
        assert_eq!(backs, vec![Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn test_intersection_geometry_is_the_overlap() {
        let ws = workspace_with(
            vec![Feature::new(1, square(0.0, 0.0, 10.0, 10.0), vec![Value::from("p")])],
            vec![Feature::new(1, square(0.0, 0.0, 10.0, 5.0), vec![Value::from("f")])],
        );
        let ops = PlanarOps::new();
        intersect(
            &ws,
            &ops,
            "parcels",
            "forest",
            "out",
            &OverlayOptions::default(),
        )
        .unwrap();

        let out = read_layer(&ws, "out").unwrap();
        let area = ops
            .area(&out.features[0].geometry, AreaUnit::SquareMeters)
            .unwrap();
        assert!((area - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_schema_union_disambiguates_collisions() {
        let ws = MemoryWorkspace::new();
        let mut a = Layer::new(
            "a",
            GeometryKind::Polygon,
            Schema::new(vec![Field::text("NAME")]),
        );
        a.features
            .push(Feature::new(1, square(0.0, 0.0, 2.0, 2.0), vec![Value::from("pa")]));
        ws.create(Dataset::Layer(a)).unwrap();
        let mut b = Layer::new(
            "b",
            GeometryKind::Polygon,
            Schema::new(vec![Field::text("NAME")]),
        );
        b.features
            .push(Feature::new(1, square(1.0, 1.0, 3.0, 3.0), vec![Value::from("pb")]));
        ws.create(Dataset::Layer(b)).unwrap();

        intersect(&ws, &PlanarOps::new(), "a", "b", "ab", &OverlayOptions::default()).unwrap();

        let out = read_layer(&ws, "ab").unwrap();
        let names: Vec<_> = out.schema.fields().iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, vec!["FID_a", "NAME", "b_NAME"]);
        assert_eq!(out.schema.fields()[0].field_type, FieldType::Integer);

        let f = &out.features[0];
        assert_eq!(out.feature_value(f, "NAME").as_text(), Some("pa"));
        assert_eq!(out.feature_value(f, "b_NAME").as_text(), Some("pb"));
    }

    #[test]
    fn test_schema_union_never_emits_duplicate_names() {
        // B carries both NAME and a literal b_NAME, so the qualified form
        // of the colliding NAME is itself taken.
        let a = Layer::new(
            "a",
            GeometryKind::Polygon,
            Schema::new(vec![Field::text("NAME")]),
        );
        let b = Layer::new(
            "b",
            GeometryKind::Polygon,
            Schema::new(vec![Field::text("b_NAME"), Field::text("NAME")]),
        );

        let schema = union_schema(&a, &b);
        let names: Vec<_> = schema.fields().iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, vec!["FID_a", "NAME", "b_NAME", "b_NAME_2"]);

        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), names.len());
    }

    #[test]
    fn test_disjoint_layers_produce_empty_output() {
        let ws = workspace_with(
            vec![Feature::new(1, square(0.0, 0.0, 1.0, 1.0), vec![Value::from("p")])],
            vec![Feature::new(1, square(50.0, 50.0, 60.0, 60.0), vec![Value::from("f")])],
        );
        let outcome = intersect(
            &ws,
            &PlanarOps::new(),
            "parcels",
            "forest",
            "out",
            &OverlayOptions::default(),
        )
        .unwrap();

        assert!(outcome.empty);
        assert_eq!(outcome.features_out, 0);
        // Bounding boxes never overlapped, so no exact test ran
        assert_eq!(outcome.pairs_tested, 0);

        let out = read_layer(&ws, "out").unwrap();
        assert!(out.features.is_empty());
    }

    #[test]
    fn test_empty_input_layer_closure() {
        let ws = workspace_with(
            vec![],
            vec![Feature::new(1, square(0.0, 0.0, 1.0, 1.0), vec![Value::from("f")])],
        );
        let outcome = intersect(
            &ws,
            &PlanarOps::new(),
            "parcels",
            "forest",
            "out",
            &OverlayOptions::default(),
        )
        .unwrap();
        assert!(outcome.empty);
        assert!(read_layer(&ws, "out").unwrap().features.is_empty());
    }

    #[test]
    fn test_rerun_replaces_not_duplicates() {
        let ws = workspace_with(
            vec![Feature::new(1, square(0.0, 0.0, 4.0, 4.0), vec![Value::from("p")])],
            vec![Feature::new(1, square(0.0, 0.0, 2.0, 2.0), vec![Value::from("f")])],
        );
        let ops = PlanarOps::new();
        for _ in 0..3 {
            intersect(&ws, &ops, "parcels", "forest", "out", &OverlayOptions::default()).unwrap();
        }

        let names: Vec<_> = ws.list().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["forest", "out", "parcels"]);
        assert_eq!(read_layer(&ws, "out").unwrap().features.len(), 1);
    }

    #[test]
    fn test_cancelled_overlay_leaves_no_output() {
        let ws = workspace_with(
            vec![Feature::new(1, square(0.0, 0.0, 4.0, 4.0), vec![Value::from("p")])],
            vec![Feature::new(1, square(0.0, 0.0, 2.0, 2.0), vec![Value::from("f")])],
        );
        let options = OverlayOptions::default();
        options.cancel.cancel();

        let err = intersect(&ws, &PlanarOps::new(), "parcels", "forest", "out", &options)
            .unwrap_err();
        assert_eq!(err.kind(), "Cancelled");
        assert!(!ws.exists("out").unwrap());
        assert!(!ws.exists(&staging_name("out")).unwrap());
    }

    #[test]
    fn test_polyline_pair_is_rejected() {
        let ws = MemoryWorkspace::new();
        for name in ["la", "lb"] {
            ws.create(Dataset::Layer(Layer::new(
                name,
                GeometryKind::Polyline,
                Schema::empty(),
            )))
            .unwrap();
        }
        let err = intersect(
            &ws,
            &PlanarOps::new(),
            "la",
            "lb",
            "out",
            &OverlayOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "SpatialOperationFailure");
    }

    #[test]
    fn test_back_ref_field_name() {
        assert_eq!(
            back_ref_field("Parcels_Carbon_privateforest"),
            "FID_Parcels_Carbon_privateforest"
        );
    }

    #[test]
    fn test_output_feature_ids_are_sequential_from_one() {
        let ws = workspace_with(
            vec![
                Feature::new(7, square(0.0, 0.0, 10.0, 10.0), vec![Value::from("p")]),
                Feature::new(9, square(0.0, 0.0, 10.0, 10.0), vec![Value::from("p")]),
            ],
            vec![Feature::new(3, square(2.0, 2.0, 4.0, 4.0), vec![Value::from("f")])],
        );
        intersect(
            &ws,
            &PlanarOps::new(),
            "parcels",
            "forest",
            "out",
            &OverlayOptions::default(),
        )
        .unwrap();

        let out = read_layer(&ws, "out").unwrap();
        let ids: Vec<_> = out.features.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![FeatureId(1), FeatureId(2)]);
    }
}
