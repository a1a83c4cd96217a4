//! The pixel-pipeline ABI the core invokes but never implements beyond the
//! one reference backend in [`super::reference`] (spec §6.2).
//!
//! Font shaping, gradient/pattern color production, and JIT code
//! generation are all external collaborators in the real system; here
//! that boundary is a trait object (`Pipeline`) instead of two raw C
//! function pointers, since Rust has no ABI reason to prefer the latter
//! and a trait object still gives us the "swap reference for JIT without
//! touching the dispatcher" property spec §9 asks for.

use crate::command::Signature;
use crate::fetch::color::Rgba32;
use crate::target::Image;

/// Exposes the target image to a fill/fetch call (spec §6.2:
/// "`ContextData` exposes the target image descriptor").
pub struct ContextData<'a> {
    pub image: &'a mut Image,
}

/// One fully-covered run of pixels on a single row, used by the
/// aligned-box fast path (no per-pixel coverage computation).
#[derive(Debug, Clone, Copy)]
pub struct SolidSpan {
    pub y: i32,
    pub x0: i32,
    pub x1: i32,
}

/// One partially-covered run, each pixel carrying its own 8-bit coverage
/// (used by unaligned boxes and analytic fills).
#[derive(Debug, Clone)]
pub struct CoverageSpan {
    pub y: i32,
    pub x0: i32,
    pub coverage: Vec<u8>,
}

/// The shape of fill data handed to a `FillFunc`, selected by the
/// command's fill type (spec §6.2: "`FillData` is one of three shapes
/// selected by the command's fill type: aligned box, unaligned box ...,
/// or analytic").
pub enum FillData {
    BoxA { spans: Vec<SolidSpan> },
    BoxU { spans: Vec<CoverageSpan> },
    Analytic { spans: Vec<CoverageSpan> },
}

/// The shape of fetch data a `FillFunc` reads its source pixels from. Only
/// `Solid` is produced by the reference backend; `Precomputed` models the
/// ABI slot a pattern/gradient fetcher would fill in (spec §6.2: "either
/// an inline solid color or the precomputed body of a pattern/gradient/
/// image fetcher"), kept opaque since producing that body is out of scope
/// (spec §1 "deliberately excluded").
pub enum FetchData {
    Solid(Rgba32),
    Precomputed(Box<dyn std::any::Any + Send + Sync>),
}

pub type FillFunc = fn(&mut ContextData, &FillData, &FetchData);
pub type FetchFunc = fn(&ContextData, &FetchData);

/// A pipeline backend resolves a [`Signature`] to a fill (and optional
/// fetch) function pointer. The reference backend in
/// [`super::reference`] is the only implementation shipped with the core;
/// a JIT backend would implement the same trait and compile routines on
/// demand instead of matching a fixed table (spec §6.2, §6.3
/// `DISABLE_JIT`).
pub trait Pipeline: Send + Sync {
    fn fill_func(&self, signature: Signature) -> Option<FillFunc>;
    fn fetch_func(&self, signature: Signature) -> Option<FetchFunc>;
}
