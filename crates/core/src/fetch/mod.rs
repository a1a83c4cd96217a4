//! Style and fetch-data plumbing for fill/stroke sources (spec §4.6).

pub mod color;
pub mod fetchdata;
pub mod styledata;

pub use color::Rgba32;
pub use fetchdata::{FetchKind, RenderFetchData, TransformMode};
pub use styledata::{StyleData, StyleSlot};
