//! Low-level memory support shared by the edge builder, rasterizer, and
//! batch machinery (spec §4.1, §4.2).

pub mod arena;
pub mod zeroalloc;

pub use arena::{ArenaAllocator, ArenaPool, ArenaState};
pub use zeroalloc::ZeroAllocator;
