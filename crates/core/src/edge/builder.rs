//! Path → banded, clipped, y-monotonic edges (spec §4.4).
//!
//! Clipping and monotone splitting are done in `f64` space (the geometry
//! module's native representation); only the final accepted points are
//! converted to fixed-point when they're copied into the arena. Blend2D's
//! own builder clips in fixed-point throughout — working in `f64` here
//! trades a little of that precision for a builder that doesn't need its
//! own 64-bit fixed-point arithmetic layer, while still producing edges
//! that satisfy the same containment and monotonicity invariants.

use crate::error::{RasterError, RasterResult};
use crate::geometry::curve;
use crate::geometry::point::{Box2D, Point};
use crate::support::arena::{ArenaAllocator, ArenaState};

use super::point::EdgePoint;
use super::storage::EdgeStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Left,
    Inside,
    Right,
}

#[derive(Debug, Clone, Copy)]
struct BorderRun {
    y0: f64,
    y1: f64,
    sign: bool,
}

/// Accumulates path commands into an [`EdgeStorage`]. One builder instance
/// handles exactly one path; construct a fresh one per fill/stroke.
pub struct EdgeBuilder<'a> {
    arena: &'a mut ArenaAllocator,
    clip: Box2D,
    tolerance: f64,
    storage: EdgeStorage,

    /// The arena position at construction time, restored by
    /// [`Self::done`] if building this path's edges ran out of memory
    /// (spec §7 `revertEdgeBuilder`: "restores the arena to the saved
    /// state").
    save_state: ArenaState,
    /// Set once any `push_vector` call fails; once set, further segments
    /// are accumulated and discarded rather than attempting (and failing)
    /// more allocations.
    oom: bool,

    current_point: Option<Point>,
    start_point: Option<Point>,

    in_progress: Vec<Point>,
    in_progress_sign: Option<bool>,

    /// Running vertical border accumulators, indexed `[left, right]`, for
    /// merging consecutive off-box excursions into one synthetic edge
    /// (spec §4.4 step 2: `borderAccX0{Y0,Y1}` / `borderAccX1{Y0,Y1}`).
    border: [Option<BorderRun>; 2],
}

impl<'a> EdgeBuilder<'a> {
    pub fn new(
        arena: &'a mut ArenaAllocator,
        clip: Box2D,
        band_height_shift: u32,
        band_count: usize,
        tolerance: f64,
    ) -> Self {
        let save_state = arena.save_state();
        EdgeBuilder {
            arena,
            clip,
            tolerance,
            storage: EdgeStorage::new(band_count, band_height_shift),
            save_state,
            oom: false,
            current_point: None,
            start_point: None,
            in_progress: Vec::new(),
            in_progress_sign: None,
            border: [None, None],
        }
    }

    pub fn move_to(&mut self, p: Point) {
        self.flush_in_progress();
        self.current_point = Some(p);
        self.start_point = Some(p);
    }

    pub fn line_to(&mut self, p: Point) {
        let p0 = self.current_point.expect("line_to requires a preceding move_to");
        self.add_segment(p0, p);
        self.current_point = Some(p);
    }

    pub fn quad_to(&mut self, c: Point, p: Point) {
        let p0 = self.current_point.expect("quad_to requires a preceding move_to");
        let splits = curve::quad_monotone_splits(p0, c, p);
        let mut seg = (p0, c, p);
        let mut prev_t = 0.0f64;
        for t in splits {
            let local_t = if (1.0 - prev_t).abs() < 1e-12 {
                1.0
            } else {
                ((t - prev_t) / (1.0 - prev_t)).clamp(0.0, 1.0)
            };
            let (left, right) = curve::quad_split_at(seg.0, seg.1, seg.2, local_t);
            self.flatten_and_add_quad(left[0], left[1], left[2]);
            seg = (right[0], right[1], right[2]);
            prev_t = t;
        }
        self.current_point = Some(p);
    }

    pub fn cubic_to(&mut self, c1: Point, c2: Point, p: Point) {
        let p0 = self.current_point.expect("cubic_to requires a preceding move_to");
        let splits = curve::cubic_monotone_splits(p0, c1, c2, p);
        let mut seg = (p0, c1, c2, p);
        let mut prev_t = 0.0f64;
        for t in splits {
            let local_t = if (1.0 - prev_t).abs() < 1e-12 {
                1.0
            } else {
                ((t - prev_t) / (1.0 - prev_t)).clamp(0.0, 1.0)
            };
            let (left, right) = curve::cubic_split_at(seg.0, seg.1, seg.2, seg.3, local_t);
            self.flatten_and_add_cubic(left[0], left[1], left[2], left[3]);
            seg = (right[0], right[1], right[2], right[3]);
            prev_t = t;
        }
        self.current_point = Some(p);
    }

    /// Closes the current figure back to its `move_to` point and flushes
    /// the in-progress edge vector.
    pub fn close(&mut self) {
        if let (Some(cur), Some(start)) = (self.current_point, self.start_point) {
            if cur != start {
                self.add_segment(cur, start);
            }
        }
        self.flush_in_progress();
        self.current_point = self.start_point;
    }

    /// Finalizes the builder: flushes any still-open edge vector and
    /// border runs, and returns the completed, banded edge storage.
    ///
    /// If building ran out of arena memory at any point, the whole
    /// in-progress edge is reverted — the arena is rewound to the state
    /// captured in [`Self::new`] — and `Err(RasterError::OutOfMemory)` is
    /// returned instead (spec §7 `revertEdgeBuilder`). The caller drops
    /// just this command; other commands in the same batch are unaffected.
    pub fn done(mut self) -> RasterResult<EdgeStorage> {
        self.flush_in_progress();
        self.flush_border(0);
        self.flush_border(1);
        if self.oom {
            self.arena.restore_state(self.save_state);
            return Err(RasterError::OutOfMemory);
        }
        Ok(self.storage)
    }

    fn flatten_and_add_quad(&mut self, p0: Point, p1: Point, p2: Point) {
        let mut poly = Vec::new();
        curve::flatten_quad(p0, p1, p2, self.tolerance, &mut poly);
        let mut prev = p0;
        for pt in poly {
            self.add_segment(prev, pt);
            prev = pt;
        }
    }

    fn flatten_and_add_cubic(&mut self, p0: Point, p1: Point, p2: Point, p3: Point) {
        let mut poly = Vec::new();
        curve::flatten_cubic(p0, p1, p2, p3, self.tolerance, &mut poly);
        let mut prev = p0;
        for pt in poly {
            self.add_segment(prev, pt);
            prev = pt;
        }
    }

    /// Clips one straight segment against `self.clip` and either appends
    /// its interior portion(s) to the in-progress edge vector or folds
    /// its off-box portion(s) into the running border accumulators.
    fn add_segment(&mut self, p0: Point, p1: Point) {
        if (p0.y - p1.y).abs() < 1e-12 {
            return; // horizontal segments never generate cells
        }

        let sign = p0.y > p1.y;
        if let Some(existing) = self.in_progress_sign {
            if existing != sign {
                self.flush_in_progress();
            }
        }
        self.in_progress_sign = Some(sign);

        let (orig_lo, orig_hi) = if p0.y <= p1.y { (p0, p1) } else { (p1, p0) };
        if orig_hi.y <= self.clip.y0 || orig_lo.y >= self.clip.y1 {
            return;
        }

        let mut lo = orig_lo;
        let mut hi = orig_hi;
        if lo.y < self.clip.y0 {
            let t = (self.clip.y0 - orig_lo.y) / (orig_hi.y - orig_lo.y);
            lo = orig_lo.lerp(orig_hi, t);
        }
        if hi.y > self.clip.y1 {
            let t = (self.clip.y1 - orig_lo.y) / (orig_hi.y - orig_lo.y);
            hi = orig_lo.lerp(orig_hi, t);
        }

        for (a, b, region) in split_by_x(lo, hi, self.clip) {
            match region {
                Region::Inside => {
                    self.push_interior(a);
                    self.push_interior(b);
                }
                Region::Left => self.accumulate_border(0, a.y, b.y, sign),
                Region::Right => self.accumulate_border(1, a.y, b.y, sign),
            }
        }
    }

    fn push_interior(&mut self, p: Point) {
        if let Some(&last) = self.in_progress.last() {
            if (last.x - p.x).abs() < 1e-9 && (last.y - p.y).abs() < 1e-9 {
                return;
            }
        }
        self.in_progress.push(p);
    }

    fn accumulate_border(&mut self, side: usize, y0: f64, y1: f64, sign: bool) {
        if (y1 - y0).abs() < 1e-12 {
            return;
        }
        let contiguous = matches!(self.border[side], Some(run) if run.sign == sign && (run.y1 - y0).abs() < 1e-9);
        if contiguous {
            self.border[side].as_mut().unwrap().y1 = y1;
        } else {
            self.flush_border(side);
            self.border[side] = Some(BorderRun { y0, y1, sign });
        }
    }

    fn flush_border(&mut self, side: usize) {
        let Some(run) = self.border[side].take() else {
            return;
        };
        if self.oom {
            return;
        }
        let x = if side == 0 { self.clip.x0 } else { self.clip.x1 };
        let points = [EdgePoint::from_f64(x, run.y0), EdgePoint::from_f64(x, run.y1)];
        if self.storage.push_vector(self.arena, &points, run.sign).is_err() {
            self.oom = true;
        }
    }

    fn flush_in_progress(&mut self) {
        if !self.oom && self.in_progress.len() >= 2 {
            let sign = self.in_progress_sign.unwrap_or(false);
            let fixed: Vec<EdgePoint> = self
                .in_progress
                .iter()
                .map(|p| EdgePoint::from_f64(p.x, p.y))
                .collect();
            if self.storage.push_vector(self.arena, &fixed, sign).is_err() {
                self.oom = true;
            }
        }
        self.in_progress.clear();
        self.in_progress_sign = None;
    }
}

/// Splits a y-monotonic segment `[lo, hi]` (`lo.y <= hi.y`) at the x
/// boundaries of `clip`, returning each piece tagged with which side of
/// the box it falls on. A straight segment crosses each vertical boundary
/// at most once, so at most 3 pieces come out.
fn split_by_x(lo: Point, hi: Point, clip: Box2D) -> Vec<(Point, Point, Region)> {
    let dy = hi.y - lo.y;
    let dx = hi.x - lo.x;
    let x_at = |y: f64| -> f64 {
        if dy.abs() < 1e-12 {
            lo.x
        } else {
            lo.x + dx * (y - lo.y) / dy
        }
    };

    let mut ys = vec![lo.y, hi.y];
    if dx.abs() > 1e-12 {
        for boundary in [clip.x0, clip.x1] {
            let t = (boundary - lo.x) / dx;
            let y = lo.y + dy * t;
            if y > lo.y + 1e-9 && y < hi.y - 1e-9 {
                ys.push(y);
            }
        }
    }
    ys.sort_by(|a, b| a.partial_cmp(b).unwrap());
    ys.dedup_by(|a, b| (*a - *b).abs() < 1e-9);

    let mut out = Vec::with_capacity(3);
    for w in ys.windows(2) {
        let (ya, yb) = (w[0], w[1]);
        if yb - ya < 1e-12 {
            continue;
        }
        let mid_x = x_at((ya + yb) * 0.5);
        let region = if mid_x < clip.x0 {
            Region::Left
        } else if mid_x > clip.x1 {
            Region::Right
        } else {
            Region::Inside
        };
        let (xa, xb) = match region {
            Region::Inside => (x_at(ya).clamp(clip.x0, clip.x1), x_at(yb).clamp(clip.x0, clip.x1)),
            _ => (x_at(ya), x_at(yb)),
        };
        out.push((Point::new(xa, ya), Point::new(xb, yb), region));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band_shift() -> u32 {
        8 // band height 256
    }

    #[test]
    fn simple_triangle_produces_monotonic_edges_within_clip() {
        let mut arena = ArenaAllocator::default();
        let clip = Box2D::new(0.0, 0.0, 100.0, 100.0);
        let mut builder = EdgeBuilder::new(&mut arena, clip, band_shift(), 8, 0.1);

        builder.move_to(Point::new(0.0, 0.0));
        builder.line_to(Point::new(10.0, 0.0));
        builder.line_to(Point::new(0.0, 10.0));
        builder.close();
        let storage = builder.done().unwrap();

        assert!(!storage.is_empty());
        let fixed_clip = super::super::point::FixedBox::from_f64(0.0, 0.0, 100.0, 100.0);
        for band in 0..storage.band_count() {
            for edge in storage.band(band).iter() {
                assert!(edge.len() >= 2);
                let pts = edge.points();
                assert!(pts.windows(2).all(|w| w[0].y <= w[1].y), "edge not y-monotonic");
                for p in pts {
                    assert!(fixed_clip.contains(*p), "edge point escaped the clip box");
                }
            }
        }
    }

    #[test]
    fn segment_outside_clip_is_dropped_entirely() {
        let mut arena = ArenaAllocator::default();
        let clip = Box2D::new(0.0, 0.0, 10.0, 10.0);
        let mut builder = EdgeBuilder::new(&mut arena, clip, band_shift(), 4, 0.1);
        builder.move_to(Point::new(100.0, 100.0));
        builder.line_to(Point::new(100.0, 200.0));
        builder.close();
        let storage = builder.done().unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn rectangle_crossing_right_edge_emits_border_edge() {
        let mut arena = ArenaAllocator::default();
        let clip = Box2D::new(0.0, 0.0, 50.0, 50.0);
        let mut builder = EdgeBuilder::new(&mut arena, clip, band_shift(), 4, 0.1);
        // A box straddling the right clip edge: the portion past x=50 should
        // fold into a vertical border edge at x=50, not escape the clip box.
        builder.move_to(Point::new(40.0, 10.0));
        builder.line_to(Point::new(80.0, 10.0));
        builder.line_to(Point::new(80.0, 30.0));
        builder.line_to(Point::new(40.0, 30.0));
        builder.close();
        let storage = builder.done().unwrap();

        assert!(!storage.is_empty());
        let fixed_clip = super::super::point::FixedBox::from_f64(0.0, 0.0, 50.0, 50.0);
        for band in 0..storage.band_count() {
            for edge in storage.band(band).iter() {
                for p in edge.points() {
                    assert!(fixed_clip.contains(*p));
                }
            }
        }
    }

    #[test]
    fn done_reverts_the_arena_and_reports_out_of_memory_on_failed_push() {
        // Simulates the allocator failing partway through a figure: once
        // `oom` is set, `done` must restore the arena to its pre-`new`
        // state and report `OutOfMemory` instead of returning a partial
        // `EdgeStorage` built on reverted memory (spec §7 `revertEdgeBuilder`).
        let mut arena = ArenaAllocator::default();
        let clip = Box2D::new(0.0, 0.0, 100.0, 100.0);
        let mut builder = EdgeBuilder::new(&mut arena, clip, band_shift(), 4, 0.1);

        builder.move_to(Point::new(0.0, 0.0));
        builder.line_to(Point::new(10.0, 0.0));
        builder.line_to(Point::new(0.0, 10.0));
        builder.close();
        assert!(builder.arena.bytes_used() > 0, "closing the figure should have allocated an edge vector");

        builder.oom = true;
        let result = builder.done();
        assert_eq!(result.unwrap_err(), RasterError::OutOfMemory);
        assert_eq!(arena.bytes_used(), 0, "arena must be rewound to its state at EdgeBuilder::new");
    }
}
