//! Pixel-pipeline ABI and the one reference (non-JIT) implementation
//! shipped with the core (spec §6.2, §1 "deliberately excluded: JIT
//! pipeline generation").

pub mod abi;
pub mod dispatch;
pub mod reference;

pub use abi::{ContextData, CoverageSpan, FetchData, FetchFunc, FillData, FillFunc, Pipeline, SolidSpan};
pub use dispatch::command_to_fill;
pub use reference::ReferencePipeline;
