//! Context state: transform stack, clip, style slots, and the
//! save/restore stack (spec §3 `RasterContextState`/`SavedState`, §4.6).

use crate::fetch::color::Rgba32;
use crate::fetch::styledata::{StyleData, StyleSlot};
use crate::geometry::point::{Box2D, BoxI};
use crate::geometry::transform::{Matrix2D, TransformType};
use crate::raster::cell::FillRule;

use super::approximation::ApproximationOptions;
use super::hints::ContextHints;
use super::stroke::StrokeOptions;

/// Everything a `save()` snapshots and a `restore()` puts back (spec §3
/// `RasterContextState`). Cloning this clones any `Rc`-backed fetch data
/// referenced by the style slots, which is exactly the refcount behavior
/// spec §8's "Round-trip state" property requires.
#[derive(Clone)]
pub struct RasterContextState {
    pub hints: ContextHints,
    pub comp_op: crate::command::compop::CompOp,
    pub fill_rule: FillRule,
    pub global_alpha: f64,

    pub fill_style: StyleData,
    pub fill_alpha: f64,
    pub stroke_style: StyleData,
    pub stroke_alpha: f64,

    pub stroke_options: StrokeOptions,
    pub approximation: ApproximationOptions,

    pub meta_transform: Matrix2D,
    pub user_transform: Matrix2D,
    pub final_transform: Matrix2D,
    pub final_transform_type: TransformType,
    pub meta_transform_type: TransformType,
    pub integer_translation: Option<(i32, i32)>,

    pub meta_clip_box: BoxI,
    pub meta_clip_box_f: Box2D,
    pub final_clip_box: BoxI,
    pub final_clip_box_f: Box2D,
}

impl RasterContextState {
    pub fn new(width: u32, height: u32) -> Self {
        let clip_i = BoxI::new(0, 0, width as i32, height as i32);
        let clip_f = Box2D::new(0.0, 0.0, width as f64, height as f64);
        RasterContextState {
            hints: ContextHints::default(),
            comp_op: crate::command::compop::CompOp::default(),
            fill_rule: FillRule::NonZero,
            global_alpha: 1.0,
            fill_style: StyleData::Solid(Rgba32::OPAQUE_BLACK),
            fill_alpha: 1.0,
            stroke_style: StyleData::Solid(Rgba32::OPAQUE_BLACK),
            stroke_alpha: 1.0,
            stroke_options: StrokeOptions::default(),
            approximation: ApproximationOptions::default(),
            meta_transform: Matrix2D::IDENTITY,
            user_transform: Matrix2D::IDENTITY,
            final_transform: Matrix2D::IDENTITY,
            final_transform_type: TransformType::Identity,
            meta_transform_type: TransformType::Identity,
            integer_translation: Some((0, 0)),
            meta_clip_box: clip_i,
            meta_clip_box_f: clip_f,
            final_clip_box: clip_i,
            final_clip_box_f: clip_f,
        }
    }

    /// Recomputes `final_transform` (and its classification/integer fast
    /// path) from `meta_transform ∘ user_transform` (spec §4.6: "Setting a
    /// transform updates `finalTransform = meta × user` and recomputes
    /// classification tags").
    pub fn update_final_transform(&mut self) {
        self.final_transform = self.user_transform.mul(&self.meta_transform);
        self.final_transform_type = self.final_transform.classify();
        self.meta_transform_type = self.meta_transform.classify();
        self.integer_translation = if self.final_transform_type.is_integer_friendly() {
            let tx = self.final_transform.m20;
            let ty = self.final_transform.m21;
            if tx.fract() == 0.0 && ty.fract() == 0.0 {
                Some((tx as i32, ty as i32))
            } else {
                None
            }
        } else {
            None
        };
    }

    /// Folds `user_transform` into `meta_transform` and resets `user` to
    /// identity (spec §4.6: "`user_to_meta()` folds `user` into `meta`").
    pub fn user_to_meta(&mut self) {
        self.meta_transform = self.user_transform.mul(&self.meta_transform);
        self.user_transform = Matrix2D::IDENTITY;
        self.update_final_transform();
    }

    pub fn style(&self, slot: StyleSlot) -> &StyleData {
        match slot {
            StyleSlot::Fill => &self.fill_style,
            StyleSlot::Stroke => &self.stroke_style,
        }
    }

    pub fn style_alpha(&self, slot: StyleSlot) -> f64 {
        match slot {
            StyleSlot::Fill => self.fill_alpha,
            StyleSlot::Stroke => self.stroke_alpha,
        }
    }

    /// Global alpha times per-slot alpha, packed to the command header's
    /// 8-bit field (spec §4.6).
    pub fn effective_alpha_u8(&self, slot: StyleSlot) -> u8 {
        let combined = (self.global_alpha * self.style_alpha(slot)).clamp(0.0, 1.0);
        (combined * 255.0).round() as u8
    }

    pub fn clip_to_rect(&mut self, r: Box2D) {
        self.final_clip_box_f = self.final_clip_box_f.intersect(&r);
        self.final_clip_box = BoxI::new(
            self.final_clip_box_f.x0.floor() as i32,
            self.final_clip_box_f.y0.floor() as i32,
            self.final_clip_box_f.x1.ceil() as i32,
            self.final_clip_box_f.y1.ceil() as i32,
        );
    }
}

/// A `save()`d snapshot, optionally protected by a 128-bit cookie
/// (spec §3 `SavedState`; cascading-restore rule per SPEC_FULL
/// supplemented feature 4).
pub struct SavedState {
    pub cookie: Option<u128>,
    pub snapshot: RasterContextState,
}

/// LIFO stack of `SavedState` frames. Modeled as a `Vec` rather than the
/// original's singly-linked arena list — restores only ever touch the top
/// of the stack, so a `Vec` gives the same O(1) push/pop with none of the
/// pointer plumbing a linked list would need in safe Rust.
#[derive(Default)]
pub struct SavedStateStack {
    frames: Vec<SavedState>,
}

impl SavedStateStack {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn push(&mut self, cookie: Option<u128>, snapshot: RasterContextState) {
        self.frames.push(SavedState { cookie, snapshot });
    }

    /// Restores from the stack per spec §8 "Save cookie" / SPEC_FULL
    /// supplemented feature 4:
    /// - `restore(None)` pops the top frame only if it is unprotected;
    ///   a cookie-protected top frame fails without popping anything.
    /// - `restore(Some(c))` pops unprotected frames off the top until it
    ///   finds one whose cookie matches `c` (which it also pops); a
    ///   differently-cookied frame encountered first aborts the whole
    ///   operation without popping anything, as does an empty stack.
    pub fn restore(&mut self, cookie: Option<u128>) -> Result<RasterContextState, crate::error::RasterError> {
        if self.frames.is_empty() {
            return Err(crate::error::RasterError::NoStatesToRestore);
        }

        match cookie {
            None => match self.frames.last() {
                Some(top) if top.cookie.is_none() => Ok(self.frames.pop().unwrap().snapshot),
                _ => Err(crate::error::RasterError::NoMatchingCookie),
            },
            Some(target) => {
                let match_depth = self
                    .frames
                    .iter()
                    .enumerate()
                    .rev()
                    .take_while(|(_, f)| f.cookie.is_none() || f.cookie == Some(target))
                    .find(|(_, f)| f.cookie == Some(target))
                    .map(|(i, _)| i);

                match match_depth {
                    Some(i) => {
                        let popped = self.frames.split_off(i);
                        Ok(popped.into_iter().next().unwrap().snapshot)
                    }
                    None => Err(crate::error::RasterError::NoMatchingCookie),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_state(alpha: f64) -> RasterContextState {
        let mut s = RasterContextState::new(10, 10);
        s.global_alpha = alpha;
        s
    }

    #[test]
    fn restore_without_cookie_pops_unprotected_top() {
        let mut stack = SavedStateStack::default();
        stack.push(None, dummy_state(0.5));
        let restored = stack.restore(None).unwrap();
        assert_eq!(restored.global_alpha, 0.5);
        assert!(stack.is_empty());
    }

    #[test]
    fn restore_without_cookie_fails_on_protected_top() {
        let mut stack = SavedStateStack::default();
        stack.push(Some(42), dummy_state(0.5));
        let err = stack.restore(None).unwrap_err();
        assert_eq!(err, crate::error::RasterError::NoMatchingCookie);
        assert_eq!(stack.len(), 1, "failed restore must not pop");
    }

    #[test]
    fn restore_with_cookie_cascades_through_unprotected_frames() {
        let mut stack = SavedStateStack::default();
        stack.push(Some(42), dummy_state(0.1));
        stack.push(None, dummy_state(0.2));
        assert_eq!(stack.restore(None).unwrap().global_alpha, 0.2);
        assert_eq!(stack.restore(Some(42)).unwrap().global_alpha, 0.1);
        assert!(stack.is_empty());
    }

    #[test]
    fn restore_with_wrong_cookie_does_not_pop_anything() {
        let mut stack = SavedStateStack::default();
        stack.push(Some(1), dummy_state(0.1));
        stack.push(Some(2), dummy_state(0.2));
        let err = stack.restore(Some(99)).unwrap_err();
        assert_eq!(err, crate::error::RasterError::NoMatchingCookie);
        assert_eq!(stack.len(), 2);
    }
}
