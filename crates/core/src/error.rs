//! Error kinds shared by synchronous calls and the asynchronous
//! accumulated-error-flags path (spec §7).

use thiserror::Error;

/// Failure returned directly from synchronous entry points.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("invalid value")]
    InvalidValue,

    #[error("invalid state")]
    InvalidState,

    #[error("invalid geometry")]
    InvalidGeometry,

    #[error("invalid font")]
    InvalidFont,

    #[error("invalid glyph")]
    InvalidGlyph,

    #[error("out of memory")]
    OutOfMemory,

    #[error("thread pool exhausted")]
    ThreadPoolExhausted,

    #[error("no states to restore")]
    NoStatesToRestore,

    #[error("no matching cookie")]
    NoMatchingCookie,
}

pub type RasterResult<T> = Result<T, RasterError>;

/// Errors observed while a batch executes asynchronously, folded back into
/// the owning context's accumulated flags at batch completion (spec §4.7,
/// §4.8). A hand-rolled bitset rather than a `bitflags!` newtype, kept this
/// small because the set never grows beyond the eight kinds spec §7 names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccumulatedErrorFlags(u32);

impl AccumulatedErrorFlags {
    pub const INVALID_VALUE: AccumulatedErrorFlags = AccumulatedErrorFlags(1 << 0);
    pub const INVALID_STATE: AccumulatedErrorFlags = AccumulatedErrorFlags(1 << 1);
    pub const INVALID_GEOMETRY: AccumulatedErrorFlags = AccumulatedErrorFlags(1 << 2);
    pub const INVALID_GLYPH: AccumulatedErrorFlags = AccumulatedErrorFlags(1 << 3);
    pub const INVALID_FONT: AccumulatedErrorFlags = AccumulatedErrorFlags(1 << 4);
    pub const THREAD_POOL_EXHAUSTED: AccumulatedErrorFlags = AccumulatedErrorFlags(1 << 5);
    pub const OUT_OF_MEMORY: AccumulatedErrorFlags = AccumulatedErrorFlags(1 << 6);
    pub const UNKNOWN: AccumulatedErrorFlags = AccumulatedErrorFlags(1 << 7);

    pub const fn empty() -> Self {
        AccumulatedErrorFlags(0)
    }

    pub fn contains(self, other: AccumulatedErrorFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: AccumulatedErrorFlags) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for AccumulatedErrorFlags {
    type Output = AccumulatedErrorFlags;
    fn bitor(self, rhs: AccumulatedErrorFlags) -> AccumulatedErrorFlags {
        AccumulatedErrorFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for AccumulatedErrorFlags {
    fn bitor_assign(&mut self, rhs: AccumulatedErrorFlags) {
        self.0 |= rhs.0;
    }
}

impl From<RasterError> for AccumulatedErrorFlags {
    fn from(err: RasterError) -> Self {
        match err {
            RasterError::InvalidValue => AccumulatedErrorFlags::INVALID_VALUE,
            RasterError::InvalidState
            | RasterError::NoStatesToRestore
            | RasterError::NoMatchingCookie => AccumulatedErrorFlags::INVALID_STATE,
            RasterError::InvalidGeometry => AccumulatedErrorFlags::INVALID_GEOMETRY,
            RasterError::InvalidFont => AccumulatedErrorFlags::INVALID_FONT,
            RasterError::InvalidGlyph => AccumulatedErrorFlags::INVALID_GLYPH,
            RasterError::OutOfMemory => AccumulatedErrorFlags::OUT_OF_MEMORY,
            RasterError::ThreadPoolExhausted => AccumulatedErrorFlags::THREAD_POOL_EXHAUSTED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_state_errors_to_the_same_flag() {
        assert_eq!(
            AccumulatedErrorFlags::from(RasterError::NoStatesToRestore),
            AccumulatedErrorFlags::INVALID_STATE
        );
        assert_eq!(
            AccumulatedErrorFlags::from(RasterError::NoMatchingCookie),
            AccumulatedErrorFlags::INVALID_STATE
        );
    }

    #[test]
    fn flags_combine_with_bitor() {
        let both = AccumulatedErrorFlags::INVALID_VALUE | AccumulatedErrorFlags::OUT_OF_MEMORY;
        assert!(both.contains(AccumulatedErrorFlags::INVALID_VALUE));
        assert!(both.contains(AccumulatedErrorFlags::OUT_OF_MEMORY));
        assert!(!both.contains(AccumulatedErrorFlags::INVALID_GEOMETRY));
    }
}
