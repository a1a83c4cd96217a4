//! Analytic scanline rasterization (spec §4.5).

pub mod analytic;
pub mod cell;

pub use analytic::AnalyticRasterizer;
pub use cell::{AnalyticCellStorage, FillRule};
