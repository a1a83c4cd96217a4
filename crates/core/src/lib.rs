//! # raster-core
//!
//! A software 2D rasterization engine: an analytic, signed-area rasterizer
//! driven through a retained [`context::RenderingContext`], with an
//! optional multi-threaded backend for batches of draw calls.
//!
//! ## Modules
//!
//! - [`geometry`] - points, boxes, rectangles, and 2D affine transforms
//! - [`path`] - path construction and flattening into line segments
//! - [`edge`] - device-space edge building and per-band edge storage
//! - [`raster`] - analytic cell accumulation and fill-rule resolution
//! - [`command`] - render commands and their signatures/headers
//! - [`fetch`] - fill styles: solid colors, patterns, gradients
//! - [`pipeline`] - signature-to-fill-function dispatch
//! - [`context`] - the `RenderingContext` operations layer (spec's public API)
//! - [`worker`] - asynchronous batch execution across a thread pool
//! - [`target`] - pixel formats and the `Image` render target
//! - [`support`] - arena allocation and other low-level helpers
//! - [`export`] - optional PNG export, behind the `png_export` feature
//!
//! ## References
//!
//! Modeled on 2D software rasterizers such as Blend2D, which pairs an
//! analytic rasterizer with a JIT-compiled pipeline; this crate keeps the
//! same operational shape (context, commands, pipeline, worker pool) with a
//! single reference (non-JIT) pipeline backend.

pub mod command;
pub mod context;
pub mod edge;
pub mod error;
pub mod export;
pub mod fetch;
pub mod geometry;
pub mod path;
pub mod pipeline;
pub mod raster;
pub mod support;
pub mod target;
pub mod worker;

pub use context::RenderingContext;
pub use error::{AccumulatedErrorFlags, RasterError, RasterResult};
pub use path::Path;
pub use target::Image;
