//! PNG export for a rendered [`crate::target::Image`] (spec §9: the CLI
//! "writes the resulting raster to a PNG using the `image` crate").
//!
//! Gated behind the `png_export` feature: the analytic rasterizer and the
//! rendering context never depend on the `image` crate themselves, only
//! this adapter does.

#![cfg(feature = "png_export")]

use std::path::Path;

use image::{ImageBuffer, Rgba, RgbaImage};

use crate::error::{RasterError, RasterResult};
use crate::target::format::PixelFormat;
use crate::target::Image;

/// Un-premultiplies one pixel's color channels by its alpha, the inverse of
/// [`crate::fetch::color::Rgba32::premultiply`]; needed because `image`'s
/// `RgbaImage` expects straight alpha.
fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let unscale = |c: u8| -> u8 { ((c as u32 * 255 + a as u32 / 2) / a as u32).min(255) as u8 };
    [unscale(r), unscale(g), unscale(b), a]
}

/// Converts a rendered [`Image`] into an `image::RgbaImage`, ready for
/// encoding through the `image` crate's own API.
pub fn to_rgba_image(source: &Image) -> RgbaImage {
    let mut out: RgbaImage = ImageBuffer::new(source.width(), source.height());
    for y in 0..source.height() {
        let row = source.row(y);
        for x in 0..source.width() {
            let pixel = match source.format() {
                PixelFormat::A8 => {
                    let a = row[x as usize];
                    Rgba([a, a, a, a])
                }
                PixelFormat::Xrgb32 => {
                    let base = x as usize * 4;
                    Rgba([row[base], row[base + 1], row[base + 2], 255])
                }
                PixelFormat::Prgb32 => {
                    let base = x as usize * 4;
                    Rgba(unpremultiply(row[base], row[base + 1], row[base + 2], row[base + 3]))
                }
            };
            out.put_pixel(x, y, pixel);
        }
    }
    out
}

/// Encodes `source` as PNG bytes.
pub fn encode_png(source: &Image) -> RasterResult<Vec<u8>> {
    let rgba = to_rgba_image(source);
    let mut bytes = Vec::new();
    rgba.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|_| RasterError::InvalidState)?;
    Ok(bytes)
}

/// Encodes `source` as PNG and writes it to `path`.
pub fn write_png(source: &Image, path: &Path) -> RasterResult<()> {
    let bytes = encode_png(source)?;
    std::fs::write(path, bytes).map_err(|_| RasterError::InvalidState)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_prgb32_image_round_trips_straight_alpha() {
        let mut image = Image::new(2, 1, PixelFormat::Prgb32).unwrap();
        image.row_mut(0)[0..4].copy_from_slice(&[255, 0, 0, 255]);
        let rgba = to_rgba_image(&image);
        assert_eq!(*rgba.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn encode_png_produces_a_valid_png_signature() {
        let image = Image::new(4, 4, PixelFormat::Prgb32).unwrap();
        let bytes = encode_png(&image).unwrap();
        assert_eq!(&bytes[0..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }
}
