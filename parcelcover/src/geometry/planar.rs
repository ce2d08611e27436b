//! Planar implementation of the geometry capability over the `geo` crate.
//!
//! Coordinates are treated as metres in a projected plane; unit conversion
//! happens in [`crate::geometry::units`], never here.

use super::ops::GeometryOps;
use super::types::Geometry;
use super::units::{AreaUnit, LengthUnit};
use crate::error::{EngineError, EngineResult};
use geo::{Area, BooleanOps, EuclideanLength, Intersects};
use geo_types::MultiLineString;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Planar geometry operations backed by `geo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarOps;

impl PlanarOps {
    pub fn new() -> Self {
        PlanarOps
    }
}

/// Boolean overlay aborts on degenerate rings; convert that into a
/// `SpatialOperation` error instead of taking the pipeline down.
fn guarded<T>(op: impl FnOnce() -> T) -> EngineResult<T> {
    catch_unwind(AssertUnwindSafe(op))
        .map_err(|_| EngineError::SpatialOperation("boolean overlay rejected geometry".to_string()))
}

/// Drops clip artifacts: line parts with fewer than two coordinates.
fn prune_lines(mut ml: MultiLineString<f64>) -> MultiLineString<f64> {
    ml.0.retain(|ls| ls.0.len() >= 2);
    ml
}

impl GeometryOps for PlanarOps {
    fn intersects(&self, a: &Geometry, b: &Geometry) -> EngineResult<bool> {
        if a.is_empty() || b.is_empty() {
            return Ok(false);
        }
        let hit = match (a, b) {
            (Geometry::Polygon(pa), Geometry::Polygon(pb)) => pa.intersects(pb),
            (Geometry::Polygon(pa), Geometry::Polyline(lb)) => pa.intersects(lb),
            (Geometry::Polyline(la), Geometry::Polygon(pb)) => la.intersects(pb),
            (Geometry::Polyline(la), Geometry::Polyline(lb)) => la.intersects(lb),
        };
        Ok(hit)
    }

    fn intersect(&self, a: &Geometry, b: &Geometry) -> EngineResult<Option<Geometry>> {
        if a.is_empty() || b.is_empty() {
            return Ok(None);
        }
        match (a, b) {
            (Geometry::Polygon(pa), Geometry::Polygon(pb)) => {
                let out = guarded(|| pa.intersection(pb))?;
                if out.0.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Geometry::Polygon(out)))
                }
            }
            (Geometry::Polygon(pa), Geometry::Polyline(lb)) => {
                let out = prune_lines(guarded(|| pa.clip(lb, false))?);
                if out.0.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Geometry::Polyline(out)))
                }
            }
            (Geometry::Polyline(la), Geometry::Polygon(pb)) => {
                let out = prune_lines(guarded(|| pb.clip(la, false))?);
                if out.0.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Geometry::Polyline(out)))
                }
            }
            (Geometry::Polyline(_), Geometry::Polyline(_)) => {
                Err(EngineError::SpatialOperation(
                    "polyline/polyline intersection is point-typed and unsupported".to_string(),
                ))
            }
        }
    }

    fn area(&self, g: &Geometry, unit: AreaUnit) -> EngineResult<f64> {
        match g {
            Geometry::Polygon(mp) => Ok(unit.from_square_meters(mp.unsigned_area())),
            Geometry::Polyline(_) => Err(EngineError::SpatialOperation(
                "area is undefined for polyline geometry".to_string(),
            )),
        }
    }

    fn length(&self, g: &Geometry, unit: LengthUnit) -> EngineResult<f64> {
        match g {
            Geometry::Polyline(ml) => Ok(unit.from_meters(ml.euclidean_length())),
            Geometry::Polygon(_) => Err(EngineError::SpatialOperation(
                "length is undefined for polygon geometry".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, LineString, MultiLineString, MultiPolygon};

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry {
        Geometry::Polygon(MultiPolygon(vec![polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
        ]]))
    }

    #[test]
    fn test_polygon_intersection_area() {
        let ops = PlanarOps::new();
        // 10x10 square overlapped by its southern half
        let a = square(0.0, 0.0, 10.0, 10.0);
        let b = square(0.0, 0.0, 10.0, 5.0);

        let out = ops.intersect(&a, &b).unwrap().unwrap();
        let area = ops.area(&out, AreaUnit::SquareMeters).unwrap();
        assert!((area - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_polygons_yield_none() {
        let ops = PlanarOps::new();
        let a = square(0.0, 0.0, 1.0, 1.0);
        let b = square(5.0, 5.0, 6.0, 6.0);

        assert!(!ops.intersects(&a, &b).unwrap());
        assert!(ops.intersect(&a, &b).unwrap().is_none());
    }

    #[test]
    fn test_empty_input_yields_none() {
        let ops = PlanarOps::new();
        let empty = Geometry::Polygon(MultiPolygon(vec![]));
        let b = square(0.0, 0.0, 1.0, 1.0);

        assert!(ops.intersect(&empty, &b).unwrap().is_none());
        assert!(!ops.intersects(&empty, &b).unwrap());
    }

    #[test]
    fn test_polyline_clip() {
        let ops = PlanarOps::new();
        let poly = square(0.0, 0.0, 10.0, 10.0);
        // Line crossing the square from west of it to east of it at y=5
        let line = Geometry::Polyline(MultiLineString(vec![LineString::from(vec![
            (-5.0, 5.0),
            (15.0, 5.0),
        ])]));

        let out = ops.intersect(&line, &poly).unwrap().unwrap();
        assert_eq!(out.kind(), crate::geometry::GeometryKind::Polyline);
        let len = ops.length(&out, LengthUnit::Meters).unwrap();
        assert!((len - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_polyline_pair_rejected() {
        let ops = PlanarOps::new();
        let l1 = Geometry::Polyline(MultiLineString(vec![LineString::from(vec![
            (0.0, 0.0),
            (1.0, 1.0),
        ])]));
        let l2 = l1.clone();

        let err = ops.intersect(&l1, &l2).unwrap_err();
        assert_eq!(err.kind(), "SpatialOperationFailure");
    }

    #[test]
    fn test_area_in_acres() {
        let ops = PlanarOps::new();
        // One acre is 4046.8564224 square metres
        let side = 4046.8564224_f64.sqrt();
        let g = square(0.0, 0.0, side, side);

        let acres = ops.area(&g, AreaUnit::Acres).unwrap();
        assert!((acres - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_area_of_polyline_is_error() {
        let ops = PlanarOps::new();
        let line = Geometry::Polyline(MultiLineString(vec![LineString::from(vec![
            (0.0, 0.0),
            (1.0, 0.0),
        ])]));
        assert!(ops.area(&line, AreaUnit::Acres).is_err());
    }

    #[test]
    fn test_length_in_feet() {
        let ops = PlanarOps::new();
        let line = Geometry::Polyline(MultiLineString(vec![LineString::from(vec![
            (0.0, 0.0),
            (0.3048, 0.0),
        ])]));
        let feet = ops.length(&line, LengthUnit::Feet).unwrap();
        assert!((feet - 1.0).abs() < 1e-9);
    }
}
