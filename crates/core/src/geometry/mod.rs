//! Geometry primitives & curve math (spec §4.3).
//!
//! Boxes, points, transforms, and the Bézier flattening/splitting helpers
//! the edge builder relies on.

pub mod curve;
pub mod point;
pub mod transform;

pub use point::{Box2D, BoxI, Point, PointI, Rect, RectI};
pub use transform::{Matrix2D, TransformType};
