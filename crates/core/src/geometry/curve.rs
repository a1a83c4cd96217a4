//! Bézier curve flattening and monotonicity utilities (spec §4.3).
//!
//! Quadratic and cubic curves are reduced to polylines by adaptive
//! subdivision bounded by a squared tolerance, and split at parametric
//! extrema (plus inflection/cusp points for cubics) so that every emitted
//! sub-curve is monotonic in both x and y before it ever reaches the edge
//! builder.

use super::point::Point;

/// Maximum recursion depth for adaptive subdivision. Beyond this the curve
/// is accepted regardless of flatness (numerical safety net against
/// degenerate/near-cusp inputs that would never satisfy the tolerance).
pub const MAX_SUBDIVISION_DEPTH: u32 = 32;

fn cross(a: Point, b: Point) -> f64 {
    a.x * b.y - a.y * b.x
}

fn dot(a: Point, b: Point) -> f64 {
    a.x * b.x + a.y * b.y
}

/// `true` if `cross(p2-p0, p1-p0)^2 <= tolerance^2 * |p2-p0|^2`.
fn quad_is_flat(p0: Point, p1: Point, p2: Point, tolerance_sq: f64) -> bool {
    let base = p2 - p0;
    let c = cross(base, p1 - p0);
    c * c <= tolerance_sq * dot(base, base)
}

fn cubic_is_flat(p0: Point, p1: Point, p2: Point, p3: Point, tolerance_sq: f64) -> bool {
    let base = p3 - p0;
    let base_sq = dot(base, base);
    let c1 = cross(base, p1 - p0);
    let c2 = cross(base, p2 - p0);
    c1 * c1 <= tolerance_sq * base_sq && c2 * c2 <= tolerance_sq * base_sq
}

fn quad_split(p0: Point, p1: Point, p2: Point) -> (Point, Point, Point, Point, Point) {
    let p01 = p0.lerp(p1, 0.5);
    let p12 = p1.lerp(p2, 0.5);
    let mid = p01.lerp(p12, 0.5);
    (p01, mid, p12, p0, p2)
}

fn cubic_split(p0: Point, p1: Point, p2: Point, p3: Point) -> (Point, Point, Point, Point, Point, Point, Point) {
    let p01 = p0.lerp(p1, 0.5);
    let p12 = p1.lerp(p2, 0.5);
    let p23 = p2.lerp(p3, 0.5);
    let p012 = p01.lerp(p12, 0.5);
    let p123 = p12.lerp(p23, 0.5);
    let mid = p012.lerp(p123, 0.5);
    (p01, p012, mid, p123, p23, p0, p3)
}

/// Flattens a quadratic Bézier `(p0, p1, p2)` into a polyline, appended to
/// `out` (the initial point `p0` is NOT pushed; callers already have it as
/// the current point). `tolerance` is a linear distance tolerance; the
/// flatness test internally squares it.
pub fn flatten_quad(p0: Point, p1: Point, p2: Point, tolerance: f64, out: &mut Vec<Point>) {
    let tol_sq = tolerance * tolerance;
    flatten_quad_rec(p0, p1, p2, tol_sq, 0, out);
}

fn flatten_quad_rec(p0: Point, p1: Point, p2: Point, tol_sq: f64, depth: u32, out: &mut Vec<Point>) {
    if depth >= MAX_SUBDIVISION_DEPTH || quad_is_flat(p0, p1, p2, tol_sq) {
        out.push(p2);
        return;
    }
    let (l1, mid, r1, _, _) = quad_split(p0, p1, p2);
    flatten_quad_rec(p0, l1, mid, tol_sq, depth + 1, out);
    flatten_quad_rec(mid, r1, p2, tol_sq, depth + 1, out);
}

/// Flattens a cubic Bézier `(p0, p1, p2, p3)` into a polyline appended to
/// `out` (again `p0` is not pushed).
pub fn flatten_cubic(p0: Point, p1: Point, p2: Point, p3: Point, tolerance: f64, out: &mut Vec<Point>) {
    let tol_sq = tolerance * tolerance;
    flatten_cubic_rec(p0, p1, p2, p3, tol_sq, 0, out);
}

fn flatten_cubic_rec(p0: Point, p1: Point, p2: Point, p3: Point, tol_sq: f64, depth: u32, out: &mut Vec<Point>) {
    if depth >= MAX_SUBDIVISION_DEPTH || cubic_is_flat(p0, p1, p2, p3, tol_sq) {
        out.push(p3);
        return;
    }
    let (l1, l2, mid, r2, r3, _, _) = cubic_split(p0, p1, p2, p3);
    flatten_cubic_rec(p0, l1, l2, mid, tol_sq, depth + 1, out);
    flatten_cubic_rec(mid, r2, r3, p3, tol_sq, depth + 1, out);
}

/// Evaluates a quadratic Bézier at parameter `t`.
pub fn quad_eval(p0: Point, p1: Point, p2: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    Point::new(
        mt * mt * p0.x + 2.0 * mt * t * p1.x + t * t * p2.x,
        mt * mt * p0.y + 2.0 * mt * t * p1.y + t * t * p2.y,
    )
}

/// Evaluates a cubic Bézier at parameter `t`.
pub fn cubic_eval(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

fn push_sorted_unique(ts: &mut Vec<f64>, t: f64) {
    if t > 1e-9 && t < 1.0 - 1e-9 {
        ts.push(t);
    }
}

/// Parametric roots of `d/dt quad(t).axis == 0`, used for x/y extrema.
fn quad_extrema_1d(p0: f64, p1: f64, p2: f64) -> Option<f64> {
    // derivative: 2(1-t)(p1-p0) + 2t(p2-p1) == 0 => t = (p0-p1) / (p0 - 2p1 + p2)
    let denom = p0 - 2.0 * p1 + p2;
    if denom.abs() < 1e-12 {
        return None;
    }
    Some((p0 - p1) / denom)
}

/// Returns sorted, deduplicated split parameters in `(0, 1)` at which the
/// quadratic is monotonic on both axes, with a terminal `1.0` appended.
pub fn quad_monotone_splits(p0: Point, p1: Point, p2: Point) -> Vec<f64> {
    let mut ts = Vec::with_capacity(3);
    if let Some(t) = quad_extrema_1d(p0.x, p1.x, p2.x) {
        push_sorted_unique(&mut ts, t);
    }
    if let Some(t) = quad_extrema_1d(p0.y, p1.y, p2.y) {
        push_sorted_unique(&mut ts, t);
    }
    ts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    ts.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    ts.push(1.0);
    ts
}

/// Cubic derivative coefficients for one axis: `3*(1-t)^2*(p1-p0) +
/// 6*(1-t)*t*(p2-p1) + 3*t^2*(p3-p2)`, a quadratic in `t`, `a*t^2+b*t+c`.
fn cubic_derivative_coeffs(p0: f64, p1: f64, p2: f64, p3: f64) -> (f64, f64, f64) {
    let a = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
    let b = p0 - 2.0 * p1 + p2;
    let c = -p0 + p1;
    // derivative/3 = a*t^2 + 2*b*t + c
    (a, 2.0 * b, c)
}

fn solve_quadratic(a: f64, b: f64, c: f64, out: &mut Vec<f64>) {
    if a.abs() < 1e-12 {
        if b.abs() > 1e-12 {
            out.push(-c / b);
        }
        return;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return;
    }
    let sq = disc.sqrt();
    out.push((-b + sq) / (2.0 * a));
    out.push((-b - sq) / (2.0 * a));
}

/// Returns sorted, deduplicated split parameters in `(0, 1)` at which the
/// cubic is monotonic on both axes (extrema), plus inflection points,
/// with a terminal `1.0` appended.
pub fn cubic_monotone_splits(p0: Point, p1: Point, p2: Point, p3: Point) -> Vec<f64> {
    let mut ts = Vec::with_capacity(6);
    let (ax, bx, cx) = cubic_derivative_coeffs(p0.x, p1.x, p2.x, p3.x);
    let (ay, by, cy) = cubic_derivative_coeffs(p0.y, p1.y, p2.y, p3.y);
    let mut roots = Vec::with_capacity(4);
    solve_quadratic(ax, bx, cx, &mut roots);
    solve_quadratic(ay, by, cy, &mut roots);

    for t in cubic_inflection_params(p0, p1, p2, p3) {
        roots.push(t);
    }

    for t in roots {
        push_sorted_unique(&mut ts, t);
    }
    ts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    ts.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    ts.push(1.0);
    ts
}

/// Inflection parameters of a cubic, derived from the classic
/// cross-product-of-derivatives formulation: roots of
/// `cross(B'(t), B''(t)) == 0`, a quadratic in `t`.
fn cubic_inflection_params(p0: Point, p1: Point, p2: Point, p3: Point) -> Vec<f64> {
    let a = p1 - p0;
    let b = p2 - p1 - a;
    let c = p3 - p2 - p2 + p1 - b - a;

    // cross(B'(t), B''(t)) where B'(t) = 3(a + 2bt + ct^2), B''(t) = 6(b + ct)
    // proportional to cross(a + 2bt + ct^2, b + ct)
    let k2 = cross(c, b);
    let k1 = cross(c, a) + 2.0 * cross(b, b);
    let k0 = cross(b, a);

    let mut roots = Vec::new();
    solve_quadratic(k2, k1, k0, &mut roots);
    roots
}

/// Splits a cubic Bézier at parameter `t` using De Casteljau's algorithm,
/// returning the two halves' control points (each sharing the split point).
pub fn cubic_split_at(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> ([Point; 4], [Point; 4]) {
    let p01 = p0.lerp(p1, t);
    let p12 = p1.lerp(p2, t);
    let p23 = p2.lerp(p3, t);
    let p012 = p01.lerp(p12, t);
    let p123 = p12.lerp(p23, t);
    let mid = p012.lerp(p123, t);
    ([p0, p01, p012, mid], [mid, p123, p23, p3])
}

/// Splits a quadratic Bézier at parameter `t`.
pub fn quad_split_at(p0: Point, p1: Point, p2: Point, t: f64) -> ([Point; 3], [Point; 3]) {
    let p01 = p0.lerp(p1, t);
    let p12 = p1.lerp(p2, t);
    let mid = p01.lerp(p12, t);
    ([p0, p01, mid], [mid, p12, p2])
}

/// Approximates a cubic Bézier with a short spline of quadratics, for
/// pipelines that only understand quads. Error bound `27/4 * 2^3 *
/// epsilon` per spec §4.3; `epsilon` here is the caller's flattening
/// tolerance so the approximation never dominates overall error.
pub fn cubic_to_quad_spline(p0: Point, p1: Point, p2: Point, p3: Point, epsilon: f64) -> Vec<[Point; 3]> {
    // The well-known bound for approximating a single cubic segment with
    // one quadratic (midpoint of the two cubic-to-quad control-point
    // estimates) is `|error| <= 1/36 * |p3 - 3p2 + 3p1 - p0|^2` style
    // bounds; we instead subdivide until direct distance of the quad
    // approximation's control point from both cubic-derived estimates is
    // within the accepted bound, recursing similarly to curve flattening.
    let bound = 27.0 / 4.0 * 8.0 * epsilon.max(1e-9);
    let mut out = Vec::new();
    cubic_to_quad_rec(p0, p1, p2, p3, bound, 0, &mut out);
    out
}

fn cubic_to_quad_rec(p0: Point, p1: Point, p2: Point, p3: Point, bound: f64, depth: u32, out: &mut Vec<[Point; 3]>) {
    // Single quadratic whose control point is the intersection of the two
    // cubic tangent lines, approximated here by the classic 3/4 weighted
    // average of the two inner control points (exact when the cubic
    // degenerates from a quadratic).
    let q1 = Point::new(
        (-p0.x + 3.0 * p1.x + 3.0 * p2.x - p3.x) / 4.0,
        (-p0.y + 3.0 * p1.y + 3.0 * p2.y - p3.y) / 4.0,
    );

    // Error estimate: distance between the cubic's midpoint and the
    // resulting quad's midpoint.
    let cubic_mid = cubic_eval(p0, p1, p2, p3, 0.5);
    let quad_mid = quad_eval(p0, q1, p3, 0.5);
    let err = (cubic_mid - quad_mid).x.hypot((cubic_mid - quad_mid).y);

    if err <= bound || depth >= MAX_SUBDIVISION_DEPTH {
        out.push([p0, q1, p3]);
        return;
    }

    let (left, right) = cubic_split_at(p0, p1, p2, p3, 0.5);
    cubic_to_quad_rec(left[0], left[1], left[2], left[3], bound, depth + 1, out);
    cubic_to_quad_rec(right[0], right[1], right[2], right[3], bound, depth + 1, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_straight_quad_is_two_points() {
        // Control point on the chord: already flat, single segment.
        let mut out = Vec::new();
        flatten_quad(Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(10.0, 0.0), 0.1, &mut out);
        assert_eq!(out, vec![Point::new(10.0, 0.0)]);
    }

    #[test]
    fn flatten_curved_quad_produces_multiple_segments() {
        let mut out = Vec::new();
        flatten_quad(Point::new(0.0, 0.0), Point::new(50.0, 100.0), Point::new(100.0, 0.0), 0.25, &mut out);
        assert!(out.len() > 1, "expected subdivision, got {} points", out.len());
    }

    #[test]
    fn quad_monotone_splits_includes_terminal_one() {
        let ts = quad_monotone_splits(Point::new(0.0, 0.0), Point::new(50.0, 100.0), Point::new(100.0, 0.0));
        assert_eq!(*ts.last().unwrap(), 1.0);
        assert!(ts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn cubic_split_at_half_matches_eval() {
        let (p0, p1, p2, p3) = (
            Point::new(0.0, 0.0),
            Point::new(10.0, 40.0),
            Point::new(40.0, 40.0),
            Point::new(50.0, 0.0),
        );
        let (left, right) = cubic_split_at(p0, p1, p2, p3, 0.5);
        let expected_mid = cubic_eval(p0, p1, p2, p3, 0.5);
        assert_eq!(left[3], expected_mid);
        assert_eq!(right[0], expected_mid);
    }

    #[test]
    fn cubic_to_quad_spline_is_non_empty_and_near_endpoints() {
        let spline = cubic_to_quad_spline(
            Point::new(0.0, 0.0),
            Point::new(0.0, 50.0),
            Point::new(100.0, 50.0),
            Point::new(100.0, 0.0),
            0.1,
        );
        assert!(!spline.is_empty());
        assert_eq!(spline.first().unwrap()[0], Point::new(0.0, 0.0));
        assert_eq!(spline.last().unwrap()[2], Point::new(100.0, 0.0));
    }
}
