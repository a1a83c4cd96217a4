//! Premultiplied 8-bit RGBA color, the core's one concrete solid-fetch
//! payload (spec §4.6, §6.1).

/// Premultiplied RGBA, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgba32 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba32 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Builds a premultiplied color from straight (non-premultiplied)
    /// components, as callers typically specify colors.
    pub fn premultiply(r: u8, g: u8, b: u8, a: u8) -> Self {
        let scale = |c: u8| -> u8 { ((c as u32 * a as u32 + 127) / 255) as u8 };
        Self::new(scale(r), scale(g), scale(b), a)
    }

    pub const TRANSPARENT: Rgba32 = Rgba32::new(0, 0, 0, 0);
    pub const OPAQUE_BLACK: Rgba32 = Rgba32::new(0, 0, 0, 255);
    pub const OPAQUE_WHITE: Rgba32 = Rgba32::new(255, 255, 255, 255);

    pub fn to_prgb32_u32(self) -> u32 {
        u32::from_be_bytes([self.a, self.r, self.g, self.b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premultiply_scales_by_alpha() {
        let c = Rgba32::premultiply(255, 0, 0, 128);
        assert_eq!(c.a, 128);
        assert!(c.r < 255 && c.r > 100);
    }

    #[test]
    fn to_prgb32_packs_argb_big_endian() {
        let c = Rgba32::new(0x11, 0x22, 0x33, 0x80);
        assert_eq!(c.to_prgb32_u32(), 0x8011_2233);
    }
}
