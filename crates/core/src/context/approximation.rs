//! Curve-flattening configuration (spec §4.3, SPEC_FULL supplemented
//! feature 1).
//!
//! The distilled spec only calls out a scalar flatten tolerance; the
//! original additionally carries a flatten-mode enum and a couple of
//! stroker-only tolerances so the context state shape matches what the
//! stroking path reads, even though only one flatten mode is implemented.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlattenMode {
    RecursiveSubdivision,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApproximationOptions {
    pub flatten_mode: FlattenMode,
    pub flatten_tolerance: f64,
    /// Tolerance for path simplification before stroking; unused until a
    /// simplification pass is added, carried for shape parity with the
    /// stroker's expected config surface.
    pub simplify_tolerance: f64,
    /// Cubic-to-quad spline approximation tolerance used by pipelines that
    /// only accept quadratic control points; the core's own stroker and
    /// edge builder consume cubics directly and never read this field.
    pub offset_parameter: f64,
}

impl Default for ApproximationOptions {
    fn default() -> Self {
        ApproximationOptions {
            flatten_mode: FlattenMode::RecursiveSubdivision,
            flatten_tolerance: 0.2,
            simplify_tolerance: 0.05,
            offset_parameter: 0.414_213_56, // sqrt(2) - 1, Blend2D's default
        }
    }
}
