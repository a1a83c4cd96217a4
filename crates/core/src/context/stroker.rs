//! Minimal path stroker (SPEC_FULL supplemented feature 6).
//!
//! `pathstroke_p.h` was filtered out of the retrieval pack to a short
//! stub, so this is not a line-traced port of the original stroker — it's
//! a standard offset-curve stroker (round/butt/square caps, round/bevel/
//! miter joins, dash arrays) sufficient to satisfy the
//! `RasterContextState::stroke_options` surface and feed its output back
//! through [`crate::edge::builder::EdgeBuilder`] the same way a fill
//! would (spec §4.7: "Strokes: invoke the path stroker on a temporary
//! path; its output is fed back through the edge builder").
//!
//! Curves are flattened before offsetting (tolerance from
//! [`super::approximation::ApproximationOptions`]); the stroker itself
//! only ever emits straight-segment contours.

use crate::geometry::curve;
use crate::geometry::point::Point;
use crate::path::{Path, PathCommand};

use super::stroke::{LineCap, LineJoin, StrokeOptions};

struct Polyline {
    points: Vec<Point>,
    closed: bool,
}

fn normalize(v: Point) -> Point {
    let len = (v.x * v.x + v.y * v.y).sqrt();
    if len < 1e-12 {
        Point::new(0.0, 0.0)
    } else {
        Point::new(v.x / len, v.y / len)
    }
}

fn perp(d: Point) -> Point {
    Point::new(-d.y, d.x)
}

/// Flattens `path` into straight-segment polylines, one per figure
/// (`MOVE` ... `CLOSE`/end), deduplicating consecutive coincident points.
fn flatten_to_polylines(path: &Path, tolerance: f64) -> Vec<Polyline> {
    let mut out = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let mut closed = false;
    let mut cursor = Point::default();
    let mut i = 0usize;
    let verts = path.vertices();

    let flush = |out: &mut Vec<Polyline>, pts: &mut Vec<Point>, closed: &mut bool| {
        if pts.len() >= 2 {
            out.push(Polyline {
                points: std::mem::take(pts),
                closed: *closed,
            });
        } else {
            pts.clear();
        }
        *closed = false;
    };

    let mut push_point = |pts: &mut Vec<Point>, p: Point| {
        if let Some(&last) = pts.last() {
            if (last.x - p.x).abs() < 1e-9 && (last.y - p.y).abs() < 1e-9 {
                return;
            }
        }
        pts.push(p);
    };

    for cmd in path.commands() {
        match cmd {
            PathCommand::Move => {
                flush(&mut out, &mut current, &mut closed);
                cursor = verts[i];
                current.push(cursor);
                i += 1;
            }
            PathCommand::On => {
                cursor = verts[i];
                push_point(&mut current, cursor);
                i += 1;
            }
            PathCommand::Quad => {
                let (c, p) = (verts[i], verts[i + 1]);
                let mut poly = Vec::new();
                curve::flatten_quad(cursor, c, p, tolerance, &mut poly);
                for pt in poly {
                    push_point(&mut current, pt);
                }
                cursor = p;
                i += 2;
            }
            PathCommand::Cubic => {
                let (c1, c2, p) = (verts[i], verts[i + 1], verts[i + 2]);
                let mut poly = Vec::new();
                curve::flatten_cubic(cursor, c1, c2, p, tolerance, &mut poly);
                for pt in poly {
                    push_point(&mut current, pt);
                }
                cursor = p;
                i += 3;
            }
            PathCommand::Close => {
                closed = true;
                flush(&mut out, &mut current, &mut closed);
            }
        }
    }
    flush(&mut out, &mut current, &mut closed);
    out
}

/// Splits `polyline`'s length into alternating on/off runs per
/// `dash_array`/`dash_offset`, returning the "on" runs as new open
/// polylines. A closed input is treated as an open loop for dashing
/// purposes, matching the usual 2D-API convention.
fn apply_dashes(polyline: &Polyline, dash_array: &[f64], dash_offset: f64) -> Vec<Polyline> {
    let pts = &polyline.points;
    if pts.len() < 2 || dash_array.is_empty() {
        return vec![Polyline {
            points: pts.clone(),
            closed: polyline.closed,
        }];
    }

    let total: f64 = dash_array.iter().sum();
    if total <= 0.0 {
        return vec![Polyline {
            points: pts.clone(),
            closed: polyline.closed,
        }];
    }

    let mut dash_idx = 0usize;
    let mut remaining = dash_array[0];
    let mut on = true;
    let mut offset = dash_offset.rem_euclid(total);
    while offset > 0.0 {
        if offset < remaining {
            remaining -= offset;
            break;
        }
        offset -= remaining;
        dash_idx = (dash_idx + 1) % dash_array.len();
        remaining = dash_array[dash_idx];
        on = !on;
    }

    let mut out = Vec::new();
    let mut current: Vec<Point> = if on { vec![pts[0]] } else { Vec::new() };

    for w in pts.windows(2) {
        let (mut a, b) = (w[0], w[1]);
        let mut seg_len = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
        while seg_len > remaining {
            let t = remaining / seg_len;
            let split = a.lerp(b, t);
            if on {
                current.push(split);
                out.push(Polyline {
                    points: std::mem::take(&mut current),
                    closed: false,
                });
            } else {
                current = vec![split];
            }
            a = split;
            seg_len -= remaining;
            dash_idx = (dash_idx + 1) % dash_array.len();
            remaining = dash_array[dash_idx];
            on = !on;
        }
        remaining -= seg_len;
        if on {
            current.push(b);
        }
    }
    if on && current.len() >= 2 {
        out.push(Polyline {
            points: current,
            closed: false,
        });
    }
    out
}

/// Appends the round/bevel/miter join geometry between two adjacent
/// offset segment endpoints (`from` ending segment 1's offset, `to`
/// starting segment 2's offset) around pivot `center`, onto `out`.
fn append_join(out: &mut Vec<Point>, center: Point, from: Point, to: Point, radius: f64, join: LineJoin, miter_limit: f64) {
    out.push(from);
    let d_in = normalize(from - center);
    let d_out = normalize(to - center);
    let cross = d_in.x * d_out.y - d_in.y * d_out.x;
    let dot = (d_in.x * d_out.x + d_in.y * d_out.y).clamp(-1.0, 1.0);
    if cross.abs() < 1e-9 && dot > 0.0 {
        out.push(to);
        return;
    }

    match join {
        LineJoin::Bevel => {}
        LineJoin::Round => {
            let angle_from = d_in.y.atan2(d_in.x);
            let mut angle_to = d_out.y.atan2(d_out.x);
            if cross >= 0.0 {
                while angle_to < angle_from {
                    angle_to += std::f64::consts::TAU;
                }
            } else {
                while angle_to > angle_from {
                    angle_to -= std::f64::consts::TAU;
                }
            }
            let sweep = angle_to - angle_from;
            let steps = ((sweep.abs() / 0.3).ceil() as usize).clamp(1, 32);
            for s in 1..steps {
                let a = angle_from + sweep * (s as f64 / steps as f64);
                out.push(Point::new(center.x + radius * a.cos(), center.y + radius * a.sin()));
            }
        }
        LineJoin::Miter => {
            // Intersection of the two offset lines through `from`
            // (direction tangent to d_in) and `to` (direction tangent to
            // d_out); bisector-based formula avoids a degenerate solve
            // when the two tangents are nearly parallel.
            let half = (dot.max(-1.0 + 1e-9) + 1.0) / 2.0;
            let miter_len = 1.0 / half.sqrt().max(1e-9);
            if miter_len <= miter_limit {
                let bisector = normalize(d_in + d_out);
                if bisector.x != 0.0 || bisector.y != 0.0 {
                    let tip = center + bisector * (radius * miter_len);
                    out.push(tip);
                }
            }
        }
    }
    out.push(to);
}

/// Appends a cap contour from `a` to `b` (the two offset endpoints at a
/// path terminus), pivoting around `pivot`, the unstroked path endpoint.
fn append_cap(out: &mut Vec<Point>, pivot: Point, a: Point, b: Point, half_width: f64, cap: LineCap, out_dir: Point) {
    match cap {
        LineCap::Butt => {
            out.push(a);
            out.push(b);
        }
        LineCap::Square => {
            let ext = out_dir * half_width;
            out.push(a);
            out.push(a + ext);
            out.push(b + ext);
            out.push(b);
        }
        LineCap::Round => {
            out.push(a);
            let angle_a = (a.y - pivot.y).atan2(a.x - pivot.x);
            let angle_b = (b.y - pivot.y).atan2(b.x - pivot.x);
            let mut sweep = angle_b - angle_a;
            if sweep <= 0.0 {
                sweep += std::f64::consts::TAU;
            }
            let steps = ((sweep / 0.3).ceil() as usize).clamp(2, 48);
            for s in 1..steps {
                let a_ang = angle_a + sweep * (s as f64 / steps as f64);
                out.push(Point::new(pivot.x + half_width * a_ang.cos(), pivot.y + half_width * a_ang.sin()));
            }
            out.push(b);
        }
    }
}

/// Strokes one flattened polyline, appending the resulting closed
/// contour(s) to `dst`.
fn stroke_polyline(dst: &mut Path, poly: &Polyline, options: &StrokeOptions) {
    let half = (options.width * 0.5).max(1e-6);
    let n = poly.points.len();
    if n < 2 {
        return;
    }

    let mut dirs = Vec::with_capacity(n - 1);
    for w in poly.points.windows(2) {
        dirs.push(normalize(w[1] - w[0]));
    }

    let mut left = Vec::new();
    let mut right = Vec::new();

    for (idx, w) in poly.points.windows(2).enumerate() {
        let d = dirs[idx];
        let n_vec = perp(d) * half;
        left.push(w[0] + n_vec);
        left.push(w[1] + n_vec);
        right.push(w[0] - n_vec);
        right.push(w[1] - n_vec);

        let has_next = idx + 1 < dirs.len();
        if has_next {
            let next_d = dirs[idx + 1];
            let next_n = perp(next_d) * half;
            let vertex = w[1];
            append_join(&mut left, vertex, vertex + n_vec, vertex + next_n, half, options.join, options.miter_limit);
            append_join(
                &mut right,
                vertex,
                vertex - n_vec,
                vertex - next_n,
                half,
                options.join,
                options.miter_limit,
            );
        }
    }

    if poly.closed {
        // Join the wrap-around corner and emit two independent closed
        // loops wound in opposite directions, so a non-zero or even-odd
        // fill of both produces an annulus (spec §8 scenario 5's
        // even-odd/non-zero distinction applies identically to strokes).
        let first_d = dirs[0];
        let last_d = *dirs.last().unwrap();
        let vertex = poly.points[0];
        let first_n = perp(first_d) * half;
        let last_n = perp(last_d) * half;
        append_join(&mut left, vertex, vertex + last_n, vertex + first_n, half, options.join, options.miter_limit);
        append_join(
            &mut right,
            vertex,
            vertex - last_n,
            vertex - first_n,
            half,
            options.join,
            options.miter_limit,
        );

        if let Some(&p0) = left.first() {
            dst.move_to(p0);
            for &p in &left[1..] {
                dst.line_to(p);
            }
            dst.close();
        }
        if let Some(&p0) = right.first() {
            dst.move_to(p0);
            for &p in right[1..].iter().rev() {
                dst.line_to(p);
            }
            dst.line_to(p0);
            dst.close();
        }
        return;
    }

    let start_dir = dirs[0];
    let end_dir = *dirs.last().unwrap();

    let mut contour = Vec::with_capacity(left.len() + right.len() + 4);
    contour.extend_from_slice(&left);
    append_cap(
        &mut contour,
        *poly.points.last().unwrap(),
        *left.last().unwrap(),
        *right.last().unwrap(),
        half,
        options.end_cap,
        end_dir,
    );
    for &p in right.iter().rev() {
        contour.push(p);
    }
    append_cap(
        &mut contour,
        poly.points[0],
        right[0],
        left[0],
        half,
        options.start_cap,
        start_dir * -1.0,
    );

    if let Some(&p0) = contour.first() {
        dst.move_to(p0);
        for &p in &contour[1..] {
            dst.line_to(p);
        }
        dst.close();
    }
}

/// Strokes `path` according to `options`, returning a new fillable
/// outline path (spec §4.7: stroking feeds the path stroker's output
/// back through the edge builder in place of the original path).
pub fn stroke_path(path: &Path, options: &StrokeOptions, flatten_tolerance: f64) -> Path {
    let mut out = Path::new();
    let polylines = flatten_to_polylines(path, flatten_tolerance);
    for poly in &polylines {
        if options.has_dashes() {
            for dashed in apply_dashes(poly, &options.dash_array, options.dash_offset) {
                stroke_polyline(&mut out, &dashed, options);
            }
        } else {
            stroke_polyline(&mut out, poly, options);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::stroke::{LineCap, LineJoin, StrokeOptions};

    #[test]
    fn stroking_a_horizontal_line_produces_a_closed_rectangle_outline() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.line_to(Point::new(10.0, 0.0));

        let options = StrokeOptions {
            width: 2.0,
            start_cap: LineCap::Butt,
            end_cap: LineCap::Butt,
            join: LineJoin::Miter,
            ..StrokeOptions::default()
        };
        let outline = stroke_path(&path, &options, 0.1);
        assert!(!outline.is_empty());
        let bbox = outline.control_box().unwrap();
        assert!((bbox.y1 - bbox.y0 - 2.0).abs() < 1e-6);
    }

    #[test]
    fn closed_square_stroke_produces_two_contours() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.line_to(Point::new(10.0, 0.0));
        path.line_to(Point::new(10.0, 10.0));
        path.line_to(Point::new(0.0, 10.0));
        path.close();

        let options = StrokeOptions {
            width: 2.0,
            join: LineJoin::Bevel,
            ..StrokeOptions::default()
        };
        let outline = stroke_path(&path, &options, 0.1);
        let closes = outline.commands().iter().filter(|c| **c == PathCommand::Close).count();
        assert_eq!(closes, 2);
    }

    #[test]
    fn dashed_line_produces_multiple_open_contours() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.line_to(Point::new(100.0, 0.0));

        let options = StrokeOptions {
            width: 1.0,
            dash_array: vec![10.0, 10.0],
            ..StrokeOptions::default()
        };
        let outline = stroke_path(&path, &options, 0.1);
        let moves = outline.commands().iter().filter(|c| **c == PathCommand::Move).count();
        assert!(moves >= 4, "expected several dash segments, got {moves}");
    }
}
