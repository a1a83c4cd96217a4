//! Affine transforms and their classification.
//!
//! The context keeps three transforms (meta, user, final) and recomputes a
//! classification byte whenever one changes so that hot paths (rectangle
//! fill, point mapping during edge building) can skip the general 2x3
//! multiply. The ordering `Identity < Translate < Scale < Swap < Affine <
//! Invalid` is meaningful: a combination of two transforms classifies as
//! at least the more general of the two.

use super::point::Point;

/// Affine transform `[m00 m01; m10 m11] + [m20 m21]` applied as
/// `x' = x*m00 + y*m10 + m20`, `y' = x*m01 + y*m11 + m21` (row-vector
/// convention, matching `BLMatrix2D`).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix2D {
    pub m00: f64,
    pub m01: f64,
    pub m10: f64,
    pub m11: f64,
    pub m20: f64,
    pub m21: f64,
}

impl Matrix2D {
    pub const IDENTITY: Matrix2D = Matrix2D {
        m00: 1.0,
        m01: 0.0,
        m10: 0.0,
        m11: 1.0,
        m20: 0.0,
        m21: 0.0,
    };

    pub fn translation(x: f64, y: f64) -> Matrix2D {
        Matrix2D {
            m20: x,
            m21: y,
            ..Matrix2D::IDENTITY
        }
    }

    pub fn scaling(sx: f64, sy: f64) -> Matrix2D {
        Matrix2D {
            m00: sx,
            m11: sy,
            ..Matrix2D::IDENTITY
        }
    }

    pub fn rotation(angle: f64) -> Matrix2D {
        let (s, c) = angle.sin_cos();
        Matrix2D {
            m00: c,
            m01: s,
            m10: -s,
            m11: c,
            m20: 0.0,
            m21: 0.0,
        }
    }

    /// `self * other` in the sense that mapping a point through the result
    /// is equivalent to mapping through `self` first, then `other`
    /// (matches `BLMatrix2D::transform`'s post-multiply convention used by
    /// `user_to_meta`).
    pub fn mul(&self, other: &Matrix2D) -> Matrix2D {
        Matrix2D {
            m00: self.m00 * other.m00 + self.m01 * other.m10,
            m01: self.m00 * other.m01 + self.m01 * other.m11,
            m10: self.m10 * other.m00 + self.m11 * other.m10,
            m11: self.m10 * other.m01 + self.m11 * other.m11,
            m20: self.m20 * other.m00 + self.m21 * other.m10 + other.m20,
            m21: self.m20 * other.m01 + self.m21 * other.m11 + other.m21,
        }
    }

    pub fn map_point(&self, p: Point) -> Point {
        Point::new(
            p.x * self.m00 + p.y * self.m10 + self.m20,
            p.x * self.m01 + p.y * self.m11 + self.m21,
        )
    }

    pub fn scale_by(&self, s: f64) -> Matrix2D {
        Matrix2D {
            m00: self.m00 * s,
            m01: self.m01 * s,
            m10: self.m10 * s,
            m11: self.m11 * s,
            m20: self.m20 * s,
            m21: self.m21 * s,
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.m00, self.m01, self.m10, self.m11, self.m20, self.m21]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Classify this transform's shape. Order is meaningful:
    /// `Identity < Translate < Scale < Swap < Affine < Invalid`.
    pub fn classify(&self) -> TransformType {
        if !self.is_finite() {
            return TransformType::Invalid;
        }

        const EPS: f64 = 1e-9;
        let off_diag_zero = self.m01.abs() < EPS && self.m10.abs() < EPS;
        let swapped_zero = (self.m00.abs() < EPS) && (self.m11.abs() < EPS);

        if off_diag_zero {
            if (self.m00 - 1.0).abs() < EPS && (self.m11 - 1.0).abs() < EPS {
                if self.m20.abs() < EPS && self.m21.abs() < EPS {
                    TransformType::Identity
                } else {
                    TransformType::Translate
                }
            } else {
                TransformType::Scale
            }
        } else if swapped_zero {
            TransformType::Swap
        } else {
            TransformType::Affine
        }
    }

    pub fn invert(&self) -> Option<Matrix2D> {
        let det = self.m00 * self.m11 - self.m01 * self.m10;
        if det.abs() < 1e-300 {
            return None;
        }
        let inv_det = 1.0 / det;
        let m00 = self.m11 * inv_det;
        let m01 = -self.m01 * inv_det;
        let m10 = -self.m10 * inv_det;
        let m11 = self.m00 * inv_det;
        let m20 = -(self.m20 * m00 + self.m21 * m10);
        let m21 = -(self.m20 * m01 + self.m21 * m11);
        Some(Matrix2D {
            m00,
            m01,
            m10,
            m11,
            m20,
            m21,
        })
    }
}

impl Default for Matrix2D {
    fn default() -> Self {
        Matrix2D::IDENTITY
    }
}

/// Transform classification, ordered from cheapest to most general. Higher
/// variants subsume the guarantees of lower ones for the purposes of
/// `max(a, b)`-style combination when composing two transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransformType {
    Identity = 0,
    Translate = 1,
    Scale = 2,
    Swap = 3,
    Affine = 4,
    Invalid = 5,
}

impl TransformType {
    pub fn is_integer_friendly(self) -> bool {
        matches!(self, TransformType::Identity | TransformType::Translate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_identity() {
        assert_eq!(Matrix2D::IDENTITY.classify(), TransformType::Identity);
    }

    #[test]
    fn classifies_translate() {
        assert_eq!(Matrix2D::translation(3.0, 4.0).classify(), TransformType::Translate);
    }

    #[test]
    fn classifies_scale() {
        assert_eq!(Matrix2D::scaling(2.0, 3.0).classify(), TransformType::Scale);
    }

    #[test]
    fn classifies_affine_for_rotation() {
        assert_eq!(Matrix2D::rotation(0.7).classify(), TransformType::Affine);
    }

    #[test]
    fn ordering_respects_generality() {
        assert!(TransformType::Identity < TransformType::Translate);
        assert!(TransformType::Translate < TransformType::Scale);
        assert!(TransformType::Scale < TransformType::Swap);
        assert!(TransformType::Swap < TransformType::Affine);
        assert!(TransformType::Affine < TransformType::Invalid);
    }

    #[test]
    fn mul_composes_translation_then_scale() {
        let t = Matrix2D::translation(1.0, 2.0);
        let s = Matrix2D::scaling(2.0, 2.0);
        let combined = t.mul(&s);
        let p = combined.map_point(Point::new(0.0, 0.0));
        // translate first (1,2), then scale by 2 => (2,4)
        assert_eq!(p, Point::new(2.0, 4.0));
    }

    #[test]
    fn invert_round_trips() {
        let m = Matrix2D::rotation(0.3).mul(&Matrix2D::translation(5.0, -2.0));
        let inv = m.invert().unwrap();
        let p = Point::new(12.0, -7.0);
        let back = inv.map_point(m.map_point(p));
        assert!((back.x - p.x).abs() < 1e-9);
        assert!((back.y - p.y).abs() < 1e-9);
    }
}
