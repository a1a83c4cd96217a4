//! Rendering context operations: the dispatch layer every draw call goes
//! through (spec §4.7).
//!
//! For each draw primitive the context resolves the effective style,
//! computes the final transform, classifies the geometry (pixel-aligned
//! box / unaligned box / general path) and either fills it directly
//! (synchronous mode) or queues a [`RenderCommand`] into a [`RenderBatch`]
//! for the worker pool to consume at `flush`/`end` (asynchronous mode,
//! spec §4.8).

use std::sync::Arc;

use crate::command::signature::{FetchType, FillType, Signature};
use crate::command::{CommandHeader, EdgeAlpha, RenderCommand};
use crate::edge::builder::EdgeBuilder;
use crate::edge::storage::OwnedEdgeStorage;
use crate::error::{AccumulatedErrorFlags, RasterError, RasterResult};
use crate::fetch::fetchdata::{FetchKind, RenderFetchData};
use crate::fetch::styledata::{StyleData, StyleSlot};
use crate::fetch::color::Rgba32;
use crate::geometry::point::{Box2D, BoxI, Point, Rect};
use crate::geometry::transform::{Matrix2D, TransformType};
use crate::path::Path;
use crate::pipeline::{command_to_fill, ContextData, Pipeline, ReferencePipeline};
use crate::raster::cell::FillRule;
use crate::support::arena::ArenaAllocator;
use crate::target::Image;
use crate::worker::{RenderBatch, ThreadPool, WorkerManager};

use super::create_info::{ContextCreateFlags, ContextCreateInfo};
use super::state::{RasterContextState, SavedStateStack};
use super::stroke::TransformOrder;
use super::stroker;

/// Bands are 256 rows tall; matches the edge builder's default and keeps
/// the per-band edge-list count small for typical image sizes.
const BAND_HEIGHT_SHIFT: u32 = 8;

/// The engine's one synchronous-or-asynchronous drawing surface over a
/// locked [`Image`] (spec §3 `RasterContextState` + §4.7's operations).
pub struct RenderingContext<'img> {
    image: &'img mut Image,
    state: RasterContextState,
    saved: SavedStateStack,
    pipeline: Arc<dyn Pipeline>,
    create_info: ContextCreateInfo,
    thread_pool: Option<Arc<ThreadPool>>,
    batch: Option<RenderBatch>,
    accumulated_error_flags: AccumulatedErrorFlags,
    band_height_shift: u32,
}

impl<'img> RenderingContext<'img> {
    /// Locks `image` for writing and opens a context over it (spec §5:
    /// "attempting to draw to an image already held by another writer is
    /// rejected at `begin()`").
    pub fn begin(image: &'img mut Image, create_info: ContextCreateInfo) -> RasterResult<Self> {
        image.acquire_writer()?;
        let state = RasterContextState::new(image.width(), image.height());
        let thread_pool = if create_info.thread_count > 1 {
            Some(Arc::new(ThreadPool::new(create_info.thread_count as usize)))
        } else {
            None
        };
        Ok(RenderingContext {
            image,
            state,
            saved: SavedStateStack::default(),
            // The core ships exactly one pipeline backend; `DISABLE_JIT`
            // (spec §6.3) is a no-op here since there is no JIT backend to
            // disable in the first place.
            pipeline: Arc::new(ReferencePipeline),
            create_info,
            thread_pool,
            batch: None,
            accumulated_error_flags: AccumulatedErrorFlags::empty(),
            band_height_shift: BAND_HEIGHT_SHIFT,
        })
    }

    fn is_async(&self) -> bool {
        self.create_info.thread_count > 1
    }

    /// Runs any queued batch to completion and blends its results into the
    /// target image (spec §4.8). A no-op in synchronous mode, where every
    /// draw call already blended immediately.
    pub fn flush(&mut self) -> RasterResult<()> {
        let Some(mut batch) = self.batch.take() else {
            return Ok(());
        };
        let pool = self
            .thread_pool
            .clone()
            .expect("a batch is only ever created in asynchronous mode, which always has a pool");
        let flags = WorkerManager::execute(&mut batch, self.image, self.pipeline.as_ref(), &pool, self.band_height_shift);
        self.accumulated_error_flags.insert(flags);
        Ok(())
    }

    /// Flushes any pending work and releases the image's write lock. The
    /// context should not be used again afterward.
    pub fn end(&mut self) -> RasterResult<()> {
        self.flush()?;
        self.image.release_writer();
        Ok(())
    }

    /// Errors accumulated from asynchronous draw calls since the last
    /// `clear_accumulated_error_flags` (spec §7: accumulation is
    /// explicit-clear-only).
    pub fn accumulated_error_flags(&self) -> AccumulatedErrorFlags {
        self.accumulated_error_flags
    }

    pub fn clear_accumulated_error_flags(&mut self) {
        self.accumulated_error_flags = AccumulatedErrorFlags::empty();
    }

    // ---- save / restore -------------------------------------------------

    /// Pushes an unprotected save frame (spec §4.6 `SavedState`).
    pub fn save(&mut self) -> RasterResult<()> {
        self.push_save(None)
    }

    /// Pushes a cookie-protected save frame; only `restore_cookie(cookie)`
    /// can pop it (spec §8 "Save cookie").
    pub fn save_with_cookie(&mut self, cookie: u128) -> RasterResult<()> {
        self.push_save(Some(cookie))
    }

    fn push_save(&mut self, cookie: Option<u128>) -> RasterResult<()> {
        if self.saved.len() as u32 >= self.create_info.effective_saved_state_limit() {
            return Err(RasterError::OutOfMemory);
        }
        self.saved.push(cookie, self.state.clone());
        Ok(())
    }

    pub fn restore(&mut self) -> RasterResult<()> {
        self.state = self.saved.restore(None)?;
        Ok(())
    }

    pub fn restore_cookie(&mut self, cookie: u128) -> RasterResult<()> {
        self.state = self.saved.restore(Some(cookie))?;
        Ok(())
    }

    pub fn saved_state_depth(&self) -> usize {
        self.saved.len()
    }

    // ---- transforms -------------------------------------------------

    pub fn translate(&mut self, x: f64, y: f64) {
        self.state.user_transform = Matrix2D::translation(x, y).mul(&self.state.user_transform);
        self.state.update_final_transform();
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.state.user_transform = Matrix2D::scaling(sx, sy).mul(&self.state.user_transform);
        self.state.update_final_transform();
    }

    pub fn rotate(&mut self, angle: f64) {
        self.state.user_transform = Matrix2D::rotation(angle).mul(&self.state.user_transform);
        self.state.update_final_transform();
    }

    pub fn set_transform(&mut self, m: Matrix2D) {
        self.state.user_transform = m;
        self.state.update_final_transform();
    }

    pub fn reset_transform(&mut self) {
        self.state.user_transform = Matrix2D::IDENTITY;
        self.state.update_final_transform();
    }

    /// Folds the user transform into the meta transform (spec §4.6
    /// `user_to_meta`).
    pub fn user_to_meta(&mut self) {
        self.state.user_to_meta();
    }

    pub fn final_transform(&self) -> Matrix2D {
        self.state.final_transform
    }

    // ---- clipping -------------------------------------------------

    /// Intersects the current clip with `r`, mapped through the final
    /// transform. A rotated/skewed rectangle clips to its device-space
    /// bounding box rather than its exact rotated outline — a documented
    /// simplification (DESIGN.md), since the clip box itself is always
    /// axis-aligned (spec §3 `meta/final_clip_box`).
    pub fn clip_to_rect(&mut self, r: Rect) {
        let device_box = map_box_bounds(&self.state.final_transform, r.to_box());
        self.state.clip_to_rect(device_box);
    }

    pub fn clip_box(&self) -> Box2D {
        self.state.final_clip_box_f
    }

    // ---- style -------------------------------------------------

    pub fn set_fill_style_solid(&mut self, color: Rgba32) {
        self.state.fill_style = StyleData::Solid(color);
    }

    pub fn set_stroke_style_solid(&mut self, color: Rgba32) {
        self.state.stroke_style = StyleData::Solid(color);
    }

    pub fn set_fill_style_fetch(&mut self, fetch: RenderFetchData) {
        self.state.fill_style = StyleData::Fetch(fetch);
    }

    pub fn set_stroke_style_fetch(&mut self, fetch: RenderFetchData) {
        self.state.stroke_style = StyleData::Fetch(fetch);
    }

    pub fn set_comp_op(&mut self, op: crate::command::compop::CompOp) {
        self.state.comp_op = op;
    }

    pub fn comp_op(&self) -> crate::command::compop::CompOp {
        self.state.comp_op
    }

    pub fn set_fill_rule(&mut self, rule: FillRule) {
        self.state.fill_rule = rule;
    }

    pub fn fill_rule(&self) -> FillRule {
        self.state.fill_rule
    }

    pub fn set_global_alpha(&mut self, alpha: f64) {
        self.state.global_alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn set_fill_alpha(&mut self, alpha: f64) {
        self.state.fill_alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn set_stroke_alpha(&mut self, alpha: f64) {
        self.state.stroke_alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn set_stroke_options(&mut self, options: super::stroke::StrokeOptions) {
        self.state.stroke_options = options;
    }

    pub fn set_approximation(&mut self, options: super::approximation::ApproximationOptions) {
        self.state.approximation = options;
    }

    // ---- draw: fill -------------------------------------------------

    /// Fills a user-space rectangle, taking the pixel-aligned or
    /// unaligned box fast path when the final transform keeps it
    /// axis-aligned, and falling back to the general edge-builder path
    /// otherwise (spec §4.7: "dispatches by geometry class").
    pub fn fill_rect(&mut self, r: Rect) -> RasterResult<()> {
        let b = r.to_box();
        if self.state.final_transform_type <= TransformType::Scale {
            let p0 = self.state.final_transform.map_point(Point::new(b.x0, b.y0));
            let p1 = self.state.final_transform.map_point(Point::new(b.x1, b.y1));
            let device = Box2D::new(p0.x.min(p1.x), p0.y.min(p1.y), p0.x.max(p1.x), p0.y.max(p1.y));
            return self.fill_device_box(device);
        }
        let mut path = Path::new();
        path.add_rect(b);
        self.fill_path_impl(&path)
    }

    /// Fills the entire current clip box (spec §4.7 `fill_all`).
    pub fn fill_all(&mut self) -> RasterResult<()> {
        let clip = self.state.final_clip_box_f;
        self.fill_device_box(clip)
    }

    /// Fills the entire current clip box with `CLEAR` (spec §4.7
    /// `clear_all`), temporarily overriding the composition operator.
    pub fn clear_all(&mut self) -> RasterResult<()> {
        let saved_op = self.state.comp_op;
        self.state.comp_op = crate::command::compop::CompOp::Clear;
        let result = self.fill_all();
        self.state.comp_op = saved_op;
        result
    }

    pub fn fill_path(&mut self, path: &Path) -> RasterResult<()> {
        self.fill_path_impl(path)
    }

    fn fill_path_impl(&mut self, path: &Path) -> RasterResult<()> {
        let mut mapped = path.clone();
        let transform = self.state.final_transform;
        mapped.map_vertices(|p| transform.map_point(p));
        let header = self.fill_header(FillType::Analytic)?;
        let fill_rule = self.state.fill_rule;
        self.device_path_to_command(&mapped, fill_rule, header)
    }

    fn fill_device_box(&mut self, device_box: Box2D) -> RasterResult<()> {
        let clipped = device_box.intersect(&self.state.final_clip_box_f);
        if !clipped.is_valid() {
            return Ok(());
        }

        const EPS: f64 = 1e-6;
        let is_int = |v: f64| (v - v.round()).abs() < EPS;
        if is_int(clipped.x0) && is_int(clipped.y0) && is_int(clipped.x1) && is_int(clipped.y1) {
            let box_i = BoxI::new(
                clipped.x0.round() as i32,
                clipped.y0.round() as i32,
                clipped.x1.round() as i32,
                clipped.y1.round() as i32,
            );
            if !box_i.is_valid() {
                return Ok(());
            }
            let header = self.fill_header(FillType::BoxA)?;
            return self.dispatch_command(RenderCommand::FillBoxA { header, box_i });
        }

        let x0f = clipped.x0.floor();
        let y0f = clipped.y0.floor();
        let x1c = clipped.x1.ceil();
        let y1c = clipped.y1.ceil();
        let box_i = BoxI::new(x0f as i32, y0f as i32, x1c as i32, y1c as i32);
        if !box_i.is_valid() {
            return Ok(());
        }
        let frac_alpha = |covered: f64| (255.0 * covered.clamp(0.0, 1.0)).round() as u8;
        let edge_alpha = EdgeAlpha {
            left: frac_alpha(1.0 - (clipped.x0 - x0f)),
            top: frac_alpha(1.0 - (clipped.y0 - y0f)),
            right: frac_alpha(1.0 - (x1c - clipped.x1)),
            bottom: frac_alpha(1.0 - (y1c - clipped.y1)),
        };
        let header = self.fill_header(FillType::BoxU)?;
        self.dispatch_command(RenderCommand::FillBoxU { header, box_i, edge_alpha })
    }

    // ---- draw: stroke -------------------------------------------------

    pub fn stroke_rect(&mut self, r: Rect) -> RasterResult<()> {
        let mut path = Path::new();
        path.add_rect(r.to_box());
        self.stroke_path(&path)
    }

    /// Strokes `path` per the current `StrokeOptions`, honoring
    /// `TransformOrder` (spec §4.7.4): `Before` strokes in user space then
    /// transforms the outline; `After` transforms the path first (and
    /// scales stroke width by the transform's average axis scale) before
    /// stroking in device space.
    pub fn stroke_path(&mut self, path: &Path) -> RasterResult<()> {
        let options = self.state.stroke_options.clone();
        let tolerance = self.state.approximation.flatten_tolerance;
        let transform = self.state.final_transform;

        let device_path = match options.transform_order {
            TransformOrder::Before => {
                let mut stroked = stroker::stroke_path(path, &options, tolerance);
                stroked.map_vertices(|p| transform.map_point(p));
                stroked
            }
            TransformOrder::After => {
                let mut mapped = path.clone();
                mapped.map_vertices(|p| transform.map_point(p));
                let scale = 0.5
                    * ((transform.m00 * transform.m00 + transform.m01 * transform.m01).sqrt()
                        + (transform.m10 * transform.m10 + transform.m11 * transform.m11).sqrt());
                let mut scaled = options.clone();
                scaled.width *= scale.max(1e-9);
                stroker::stroke_path(&mapped, &scaled, tolerance)
            }
        };

        let header = self.stroke_header()?;
        self.device_path_to_command(&device_path, FillRule::NonZero, header)
    }

    // ---- shared plumbing -------------------------------------------------

    fn fetch_type_of(style: &StyleData) -> FetchType {
        match style {
            StyleData::Solid(_) | StyleData::None => FetchType::Solid,
            StyleData::Fetch(fd) => match fd.kind() {
                FetchKind::Pattern => FetchType::Pattern,
                FetchKind::Gradient => FetchType::Gradient,
            },
        }
    }

    fn fill_header(&self, fill_type: FillType) -> RasterResult<CommandHeader> {
        self.style_header(StyleSlot::Fill, fill_type)
    }

    fn stroke_header(&self) -> RasterResult<CommandHeader> {
        self.style_header(StyleSlot::Stroke, FillType::Analytic)
    }

    fn style_header(&self, slot: StyleSlot, fill_type: FillType) -> RasterResult<CommandHeader> {
        let style = self.state.style(slot).clone();
        if !style.is_assigned() {
            return Err(RasterError::InvalidState);
        }
        let signature = Signature::new(self.state.comp_op, Self::fetch_type_of(&style), fill_type, self.image.format());
        Ok(CommandHeader {
            signature,
            style,
            alpha: self.state.effective_alpha_u8(slot),
        })
    }

    /// Builds edges for an already device-space path and turns them into a
    /// `FillAnalytic` command (spec §4.4, §4.5).
    fn device_path_to_command(&mut self, device_path: &Path, fill_rule: FillRule, header: CommandHeader) -> RasterResult<()> {
        let clip = self.state.final_clip_box_f;
        let band_count = (((self.image.height() as usize) >> self.band_height_shift) + 1).max(1);
        let tolerance = self.state.approximation.flatten_tolerance;

        let mut path_arena = ArenaAllocator::default();
        let storage = {
            let mut builder = EdgeBuilder::new(&mut path_arena, clip, self.band_height_shift, band_count, tolerance);
            device_path.feed(&mut builder);
            // Out-of-memory here reverts the in-progress edge and drops
            // just this command; other commands already queued in the
            // batch are unaffected (spec §7).
            builder.done()?
        };
        if storage.is_empty() {
            return Ok(());
        }
        let edges = Arc::new(OwnedEdgeStorage::new(path_arena, storage));
        self.dispatch_command(RenderCommand::FillAnalytic { header, edges, fill_rule })
    }

    /// Either blends `command` immediately (synchronous mode) or queues it
    /// into the context's batch (asynchronous mode, spec §4.8).
    fn dispatch_command(&mut self, command: RenderCommand) -> RasterResult<()> {
        if self.is_async() {
            let batch = self
                .batch
                .get_or_insert_with(|| RenderBatch::new(self.create_info.thread_count as usize));
            batch.push_command(command, self.band_height_shift);
            return Ok(());
        }

        let signature = command.header().signature;
        let Some(fill_func) = self.pipeline.fill_func(signature) else {
            return Err(RasterError::InvalidState);
        };
        let (fill_data, fetch_data) = command_to_fill(&command);
        let mut ctx = ContextData { image: self.image };
        fill_func(&mut ctx, &fill_data, &fetch_data);
        Ok(())
    }
}

/// Maps all four corners of `b` through `t` and returns their axis-aligned
/// bounding box. Exact for translate/scale/swap; conservative (but always
/// axis-aligned, as the clip box itself requires) for rotation/skew.
fn map_box_bounds(t: &Matrix2D, b: Box2D) -> Box2D {
    let corners = [
        Point::new(b.x0, b.y0),
        Point::new(b.x1, b.y0),
        Point::new(b.x1, b.y1),
        Point::new(b.x0, b.y1),
    ];
    let mapped = corners.map(|p| t.map_point(p));
    let (mut x0, mut y0, mut x1, mut y1) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for p in mapped {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }
    Box2D::new(x0, y0, x1, y1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::format::PixelFormat;

    fn ctx_info(thread_count: u32) -> ContextCreateInfo {
        ContextCreateInfo {
            thread_count,
            ..ContextCreateInfo::default()
        }
    }

    #[test]
    fn fill_rect_aligned_box_produces_opaque_fill() {
        let mut image = Image::new(10, 10, PixelFormat::Prgb32).unwrap();
        {
            let mut ctx = RenderingContext::begin(&mut image, ctx_info(0)).unwrap();
            ctx.set_fill_style_solid(Rgba32::OPAQUE_BLACK);
            ctx.fill_rect(Rect::new(2.0, 2.0, 4.0, 4.0)).unwrap();
            ctx.end().unwrap();
        }
        assert_eq!(image.row(3)[2 * 4 + 3], 255);
        assert_eq!(image.row(0)[0 * 4 + 3], 0);
    }

    #[test]
    fn save_restore_round_trips_fill_style() {
        let mut image = Image::new(4, 4, PixelFormat::Prgb32).unwrap();
        let mut ctx = RenderingContext::begin(&mut image, ctx_info(0)).unwrap();
        ctx.set_global_alpha(0.4);
        ctx.save().unwrap();
        ctx.set_global_alpha(0.9);
        assert!((ctx.state.global_alpha - 0.9).abs() < 1e-9);
        ctx.restore().unwrap();
        assert!((ctx.state.global_alpha - 0.4).abs() < 1e-9);
    }

    #[test]
    fn cookie_protected_save_survives_plain_restore() {
        let mut image = Image::new(4, 4, PixelFormat::Prgb32).unwrap();
        let mut ctx = RenderingContext::begin(&mut image, ctx_info(0)).unwrap();
        ctx.save_with_cookie(7).unwrap();
        assert_eq!(ctx.restore().unwrap_err(), RasterError::NoMatchingCookie);
        ctx.restore_cookie(7).unwrap();
        assert_eq!(ctx.saved_state_depth(), 0);
    }

    #[test]
    fn rotated_fill_takes_the_analytic_path_without_erroring() {
        let mut image = Image::new(20, 20, PixelFormat::Prgb32).unwrap();
        let mut ctx = RenderingContext::begin(&mut image, ctx_info(0)).unwrap();
        ctx.set_fill_style_solid(Rgba32::OPAQUE_WHITE);
        ctx.translate(10.0, 10.0);
        ctx.rotate(std::f64::consts::FRAC_PI_4);
        ctx.fill_rect(Rect::new(-5.0, -5.0, 10.0, 10.0)).unwrap();
        ctx.end().unwrap();
        // center pixel should be covered regardless of rotation
        assert!(image.row(10)[10 * 4 + 3] > 0);
    }

    #[test]
    fn asynchronous_and_synchronous_fills_agree() {
        let mut sync_image = Image::new(16, 16, PixelFormat::Prgb32).unwrap();
        {
            let mut ctx = RenderingContext::begin(&mut sync_image, ctx_info(0)).unwrap();
            ctx.set_fill_style_solid(Rgba32::OPAQUE_BLACK);
            ctx.fill_rect(Rect::new(1.0, 1.0, 10.0, 10.0)).unwrap();
            ctx.end().unwrap();
        }

        let mut async_image = Image::new(16, 16, PixelFormat::Prgb32).unwrap();
        {
            let mut ctx = RenderingContext::begin(&mut async_image, ctx_info(2)).unwrap();
            ctx.set_fill_style_solid(Rgba32::OPAQUE_BLACK);
            ctx.fill_rect(Rect::new(1.0, 1.0, 10.0, 10.0)).unwrap();
            ctx.end().unwrap();
            assert!(ctx.accumulated_error_flags().is_empty());
        }

        assert_eq!(sync_image.data(), async_image.data());
    }

    /// Two concentric rectangles, outer wound clockwise and inner wound
    /// counter-clockwise, fill to an annulus under `EvenOdd` and to the
    /// full outer rectangle under `NonZero` (spec §8 scenario 5).
    fn concentric_rects_path() -> Path {
        let mut path = Path::new();
        // Outer: clockwise.
        path.move_to(Point::new(10.0, 10.0));
        path.line_to(Point::new(90.0, 10.0));
        path.line_to(Point::new(90.0, 90.0));
        path.line_to(Point::new(10.0, 90.0));
        path.close();
        // Inner: counter-clockwise (reverse winding order from the outer).
        path.move_to(Point::new(30.0, 30.0));
        path.line_to(Point::new(30.0, 70.0));
        path.line_to(Point::new(70.0, 70.0));
        path.line_to(Point::new(70.0, 30.0));
        path.close();
        path
    }

    #[test]
    fn even_odd_fill_rule_punches_a_hole_non_zero_does_not() {
        let path = concentric_rects_path();

        let mut even_odd_image = Image::new(100, 100, PixelFormat::Prgb32).unwrap();
        {
            let mut ctx = RenderingContext::begin(&mut even_odd_image, ctx_info(0)).unwrap();
            ctx.set_fill_style_solid(Rgba32::OPAQUE_BLACK);
            ctx.set_fill_rule(FillRule::EvenOdd);
            ctx.fill_path(&path).unwrap();
            ctx.end().unwrap();
        }
        // Inside the hole: untouched.
        assert_eq!(even_odd_image.row(50)[50 * 4 + 3], 0);
        // In the annulus band: covered.
        assert_eq!(even_odd_image.row(50)[20 * 4 + 3], 255);

        let mut non_zero_image = Image::new(100, 100, PixelFormat::Prgb32).unwrap();
        {
            let mut ctx = RenderingContext::begin(&mut non_zero_image, ctx_info(0)).unwrap();
            ctx.set_fill_style_solid(Rgba32::OPAQUE_BLACK);
            ctx.set_fill_rule(FillRule::NonZero);
            ctx.fill_path(&path).unwrap();
            ctx.end().unwrap();
        }
        // Same path, NonZero winding: the hole fills in too.
        assert_eq!(non_zero_image.row(50)[50 * 4 + 3], 255);
        assert_eq!(non_zero_image.row(50)[20 * 4 + 3], 255);
    }

    /// `clip_to_rect` confines a fill to the clip box; `restore_clipping`
    /// after a matching `save()` reverts to the prior clip (spec §8
    /// scenario 6).
    #[test]
    fn clip_to_rect_then_restore_clipping_reverts_clip() {
        let mut image = Image::new(100, 100, PixelFormat::Prgb32).unwrap();
        let mut ctx = RenderingContext::begin(&mut image, ctx_info(0)).unwrap();

        const OPAQUE_RED: Rgba32 = Rgba32::new(255, 0, 0, 255);
        const OPAQUE_GREEN: Rgba32 = Rgba32::new(0, 255, 0, 255);

        ctx.save().unwrap();
        ctx.clip_to_rect(Rect::new(10.0, 10.0, 70.0, 70.0));
        ctx.set_fill_style_solid(OPAQUE_RED);
        ctx.fill_all().unwrap();
        ctx.restore().unwrap();

        ctx.set_fill_style_solid(OPAQUE_GREEN);
        ctx.fill_all().unwrap();
        ctx.end().unwrap();

        // Outside the old clip box: only ever green (never reached by red).
        let outside_red = image.row(5)[5 * 4];
        assert_eq!(outside_red, 0, "no red at a pixel outside the old clip box");

        // Inside the old clip box: green painted over red, so no red remains
        // anywhere in the final image.
        for y in 0..100 {
            let row = image.row(y);
            for x in 0..100 {
                assert_eq!(row[x * 4], 0, "no red pixel anywhere in the final image");
            }
        }
    }
}
