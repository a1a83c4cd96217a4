//! Rendering targets: pixel formats and the `Image` buffer a
//! [`crate::context::RenderingContext`] locks for writing (spec §6.1).

pub mod format;

use crate::error::{RasterError, RasterResult};
use format::PixelFormat;

/// A rendering target: a flat pixel buffer plus the metadata a context or
/// pipeline needs to address it (spec §6.1: "pixel format, size, stride
/// in bytes, writer count").
///
/// Rows are stored top-to-bottom with no padding beyond `stride` (always
/// `width * format.depth()` here — this core never targets a buffer with
/// external row padding).
#[derive(Debug)]
pub struct Image {
    width: u32,
    height: u32,
    format: PixelFormat,
    stride: usize,
    data: Vec<u8>,
    /// Non-zero while a [`crate::context::RenderingContext`] holds this
    /// image for writing (spec §5: "Target image is locked for writing by
    /// the context; attempting to draw to an image already held by
    /// another writer is rejected at `begin()`").
    writers: u32,
}

impl Image {
    /// Allocates a zero-filled image. Fails with [`RasterError::InvalidValue`]
    /// for a non-positive dimension (spec §6.1: "size (positive integers)").
    pub fn new(width: u32, height: u32, format: PixelFormat) -> RasterResult<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidValue);
        }
        let stride = width as usize * format.depth() as usize;
        let data = vec![0u8; stride * height as usize];
        Ok(Image {
            width,
            height,
            format,
            stride,
            data,
            writers: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Non-zero while a context holds this image for writing.
    pub fn writer_count(&self) -> u32 {
        self.writers
    }

    /// The whole backing buffer, row-major, `stride`-aligned per row.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.stride]
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        &mut self.data[start..start + self.stride]
    }

    /// Zeroes every byte (spec §8 scenario: `clear_all` reduces to this
    /// for an opaque `CLEAR` over the whole image, but this helper is also
    /// what test fixtures use to reset a target between scenarios).
    pub fn zero(&mut self) {
        self.data.fill(0);
    }

    /// Locks the image for writing. Returns [`RasterError::InvalidState`]
    /// if another writer already holds it (spec §5).
    pub fn acquire_writer(&mut self) -> RasterResult<()> {
        if self.writers != 0 {
            return Err(RasterError::InvalidState);
        }
        self.writers = 1;
        Ok(())
    }

    pub fn release_writer(&mut self) {
        debug_assert_eq!(self.writers, 1, "release_writer called without a matching acquire_writer");
        self.writers = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_zero_dimensions() {
        assert_eq!(Image::new(0, 4, PixelFormat::A8).unwrap_err(), RasterError::InvalidValue);
        assert_eq!(Image::new(4, 0, PixelFormat::A8).unwrap_err(), RasterError::InvalidValue);
    }

    #[test]
    fn new_is_zero_filled_with_correct_stride() {
        let image = Image::new(3, 2, PixelFormat::Prgb32).unwrap();
        assert_eq!(image.stride(), 3 * 4);
        assert_eq!(image.data().len(), 3 * 4 * 2);
        assert!(image.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn row_and_row_mut_index_into_the_same_bytes() {
        let mut image = Image::new(2, 2, PixelFormat::A8).unwrap();
        image.row_mut(1)[0] = 42;
        assert_eq!(image.row(1)[0], 42);
        assert_eq!(image.row(0)[0], 0);
    }

    #[test]
    fn second_writer_is_rejected_until_released() {
        let mut image = Image::new(1, 1, PixelFormat::A8).unwrap();
        image.acquire_writer().unwrap();
        assert_eq!(image.acquire_writer().unwrap_err(), RasterError::InvalidState);
        image.release_writer();
        assert!(image.acquire_writer().is_ok());
    }
}
