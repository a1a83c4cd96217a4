//! Per-context quality hints (spec §3 `BLContextHints`).

/// Rendering/gradient/pattern quality hints, each an opaque `0..=255`
/// dial a pipeline backend may consult (e.g. to pick a cheaper gradient
/// interpolation); the core itself never interprets these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContextHints {
    pub rendering_quality: u8,
    pub gradient_quality: u8,
    pub pattern_quality: u8,
}

impl Default for ContextHints {
    fn default() -> Self {
        ContextHints {
            rendering_quality: 0,
            gradient_quality: 0,
            pattern_quality: 0,
        }
    }
}
