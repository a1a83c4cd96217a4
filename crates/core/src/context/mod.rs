//! Rendering context: state/style (spec §4.6) and the operations layer
//! that dispatches draw calls into render commands (spec §4.7).

pub mod approximation;
pub mod create_info;
pub mod hints;
pub mod ops;
pub mod state;
pub mod stroke;
pub mod stroker;

pub use approximation::{ApproximationOptions, FlattenMode};
pub use create_info::{ContextCreateFlags, ContextCreateInfo};
pub use hints::ContextHints;
pub use ops::RenderingContext;
pub use state::{RasterContextState, SavedState, SavedStateStack};
pub use stroke::{LineCap, LineJoin, StrokeOptions, TransformOrder};
