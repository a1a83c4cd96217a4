//! Stroke configuration carried in context state (spec §3, §4.7.4).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineCap {
    Butt,
    Square,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

/// Whether a stroke is computed before or after the user transform is
/// applied (spec §4.7.4: "`AFTER` strokes a path transformed by meta
/// only, `BEFORE` strokes user-space and transforms results").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransformOrder {
    After,
    Before,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrokeOptions {
    pub width: f64,
    pub miter_limit: f64,
    pub start_cap: LineCap,
    pub end_cap: LineCap,
    pub join: LineJoin,
    pub dash_offset: f64,
    pub dash_array: Vec<f64>,
    pub transform_order: TransformOrder,
}

impl Default for StrokeOptions {
    fn default() -> Self {
        StrokeOptions {
            width: 1.0,
            miter_limit: 4.0,
            start_cap: LineCap::Butt,
            end_cap: LineCap::Butt,
            join: LineJoin::Miter,
            dash_offset: 0.0,
            dash_array: Vec::new(),
            transform_order: TransformOrder::After,
        }
    }
}

impl StrokeOptions {
    pub fn has_dashes(&self) -> bool {
        !self.dash_array.is_empty() && self.dash_array.iter().any(|&d| d > 0.0)
    }
}
