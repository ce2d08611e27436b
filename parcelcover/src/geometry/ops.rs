//! The geometry capability boundary.
//!
//! The engine never calls a geometry library directly; every component takes
//! a [`GeometryOps`] so the computational-geometry backend stays replaceable
//! (and mockable in tests).

use super::types::Geometry;
use super::units::{AreaUnit, LengthUnit};
use crate::error::EngineResult;

/// Planar geometry operations the engine consumes.
///
/// Implementations must be pure with respect to their inputs: the same
/// geometries and unit always produce the same result.
pub trait GeometryOps: Send + Sync {
    /// Returns true if the two geometries share any point.
    fn intersects(&self, a: &Geometry, b: &Geometry) -> EngineResult<bool>;

    /// Planar intersection of two geometries.
    ///
    /// Returns `None` when the overlap is empty. Degenerate (near-zero-area)
    /// results are still returned; thresholding is the caller's business.
    fn intersect(&self, a: &Geometry, b: &Geometry) -> EngineResult<Option<Geometry>>;

    /// Area of a polygon geometry in the given unit.
    fn area(&self, g: &Geometry, unit: AreaUnit) -> EngineResult<f64>;

    /// Length of a polyline geometry in the given unit.
    fn length(&self, g: &Geometry, unit: LengthUnit) -> EngineResult<f64>;
}
