//! Export of rendered [`crate::target::Image`]s to common file formats.

pub mod image;

#[cfg(feature = "png_export")]
pub use image::{encode_png, to_rgba_image, write_png};
