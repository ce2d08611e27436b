//! Geometry value types.
//!
//! The engine is closed over two geometry kinds: polygons (multi-part) and
//! polylines (multi-part). Both wrap the corresponding `geo-types` values so
//! the geometry capability can operate on them without conversion.

use geo_types::{MultiLineString, MultiPolygon, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geometry kind of a layer or feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Polygon,
    Polyline,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryKind::Polygon => f.write_str("Polygon"),
            GeometryKind::Polyline => f.write_str("Polyline"),
        }
    }
}

/// A feature geometry: a multi-part polygon or a multi-part polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Polygon(MultiPolygon<f64>),
    Polyline(MultiLineString<f64>),
}

impl Geometry {
    /// Returns the kind of this geometry.
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::Polyline(_) => GeometryKind::Polyline,
        }
    }

    /// Returns true if the geometry has no parts.
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Polygon(mp) => mp.0.is_empty(),
            Geometry::Polyline(ml) => ml.0.is_empty(),
        }
    }

    /// Axis-aligned bounding rectangle, or `None` for an empty geometry.
    ///
    /// Used as the cheap pretest before exact intersection.
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        use geo::BoundingRect;
        match self {
            Geometry::Polygon(mp) => mp.bounding_rect(),
            Geometry::Polyline(ml) => ml.bounding_rect(),
        }
    }
}
