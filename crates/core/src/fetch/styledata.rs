//! Per-slot style storage: solid color stored inline, everything else
//! behind a lazily-materialized [`RenderFetchData`] (spec §4.6).

use super::color::Rgba32;
use super::fetchdata::RenderFetchData;

/// The two style slots a context tracks (spec §4.6: "fill=0, stroke=1").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleSlot {
    Fill,
    Stroke,
}

/// A style assigned to one slot. Solid colors need no allocation; anything
/// else holds a shared, ref-counted [`RenderFetchData`] instead of the
/// union-via-pointer-trick the original uses (a tagged Rust enum gives the
/// same O(1) "is this solid?" branch without `unsafe`).
#[derive(Clone)]
pub enum StyleData {
    None,
    Solid(Rgba32),
    Fetch(RenderFetchData),
}

impl StyleData {
    pub fn is_solid(&self) -> bool {
        matches!(self, StyleData::Solid(_))
    }

    pub fn is_assigned(&self) -> bool {
        !matches!(self, StyleData::None)
    }

    pub fn solid_color(&self) -> Option<Rgba32> {
        match self {
            StyleData::Solid(c) => Some(*c),
            _ => None,
        }
    }

    pub fn fetch_data(&self) -> Option<&RenderFetchData> {
        match self {
            StyleData::Fetch(fd) => Some(fd),
            _ => None,
        }
    }
}

impl Default for StyleData {
    fn default() -> Self {
        StyleData::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fetchdata::{FetchKind, TransformMode};
    use crate::geometry::transform::Matrix2D;

    #[test]
    fn solid_style_reports_its_color() {
        let style = StyleData::Solid(Rgba32::OPAQUE_BLACK);
        assert!(style.is_solid());
        assert_eq!(style.solid_color(), Some(Rgba32::OPAQUE_BLACK));
    }

    #[test]
    fn unassigned_style_is_not_solid_or_assigned() {
        let style = StyleData::None;
        assert!(!style.is_solid());
        assert!(!style.is_assigned());
    }

    #[test]
    fn fetch_style_exposes_its_fetch_data() {
        let fd = RenderFetchData::new(FetchKind::Gradient, Matrix2D::IDENTITY, Matrix2D::IDENTITY, TransformMode::User);
        let style = StyleData::Fetch(fd);
        assert!(!style.is_solid());
        assert!(style.fetch_data().is_some());
    }
}
