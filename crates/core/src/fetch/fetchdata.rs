//! Non-atomic reference-counted fetch payload for non-solid styles
//! (spec §4.6; supplemented from `renderfetchdata_p.h`/`styledata_p.h`).
//!
//! Blend2D's `RenderFetchData` is shared between the submitting context
//! and, in asynchronous mode, the worker that finally consumes it — but
//! only ever from the thread that owns a given command stream, so the
//! refcount does not need to be atomic. We keep that non-atomic contract:
//! `RenderFetchData` is `!Sync`.

use std::cell::Cell;
use std::rc::Rc;

use crate::geometry::transform::Matrix2D;

/// What kind of non-solid source this fetch data describes. Only the
/// transform/lifecycle plumbing is implemented; producing actual pattern
/// or gradient pixels is out of scope (spec.md's Non-goals exclude
/// pattern/gradient *rendering*, but the context still needs somewhere to
/// hang a pending style's transform before a concrete pipeline consumes
/// it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Pattern,
    Gradient,
}

/// How a style's own transform composes with the context transform when
/// the fetch data is finalized (spec §4.6: "adjusted transform ...
/// according to the configured `TransformMode`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformMode {
    User,
    Meta,
    None,
}

struct Inner {
    kind: FetchKind,
    /// `styleTransform ∘ contextTransform`, computed once at materialization.
    adjusted_transform: Matrix2D,
    /// Set once the first draw touching this style has resolved it; before
    /// that the style carries a "pending" bit in its `Signature` instead
    /// (spec §4.6: "Lazy materialisation").
    materialized: Cell<bool>,
}

/// Reference-counted (non-atomic) fetch payload. Cloning increments the
/// shared refcount; the underlying `Inner` is dropped once the last clone
/// (held by the context slot and any in-flight batch commands) goes away.
#[derive(Clone)]
pub struct RenderFetchData {
    inner: Rc<Inner>,
}

impl RenderFetchData {
    pub fn new(kind: FetchKind, style_transform: Matrix2D, context_transform: Matrix2D, mode: TransformMode) -> Self {
        let adjusted_transform = match mode {
            TransformMode::User | TransformMode::Meta => style_transform.mul(&context_transform),
            TransformMode::None => style_transform,
        };
        RenderFetchData {
            inner: Rc::new(Inner {
                kind,
                adjusted_transform,
                materialized: Cell::new(false),
            }),
        }
    }

    pub fn kind(&self) -> FetchKind {
        self.inner.kind
    }

    pub fn adjusted_transform(&self) -> Matrix2D {
        self.inner.adjusted_transform
    }

    pub fn is_materialized(&self) -> bool {
        self.inner.materialized.get()
    }

    /// Marks this fetch data as resolved on first use; idempotent.
    pub fn materialize(&self) {
        self.inner.materialized.set(true);
    }

    /// Number of live references, including this one. Exposed for tests
    /// that check the batch-completion release contract (spec §8
    /// "Round-trip state": refcounts on retained fetch data must return to
    /// their pre-save values).
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }
}
