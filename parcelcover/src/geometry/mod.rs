//! Geometry types, units, and the geometry capability boundary.
//!
//! The engine consumes an external geometry capability ([`GeometryOps`])
//! exposing `intersect`, `area`, and `length`; [`PlanarOps`] is the default
//! implementation over the `geo` crate. Geometry values are closed over two
//! kinds, [`GeometryKind::Polygon`] and [`GeometryKind::Polyline`].

mod ops;
mod planar;
mod types;
mod units;

pub use ops::GeometryOps;
pub use planar::PlanarOps;
pub use types::{Geometry, GeometryKind};
pub use units::{AreaUnit, LengthUnit};
