//! The one concrete `Pipeline` implementation shipped with the core: a
//! scalar (non-JIT) compositor covering `SRC_OVER`/`SRC_COPY`/`CLEAR` over
//! A8/XRGB32/PRGB32 with solid-color fetch (spec §6.2, SPEC_FULL "Reference
//! (non-JIT) pipeline backend"). This is what runs when a context is
//! created with `DISABLE_JIT` (spec §6.3) and is also the only backend
//! that exists in this implementation — a JIT backend is a drop-in
//! `Pipeline` the dispatcher never has to special-case.

use crate::command::compop::CompOp;
use crate::command::signature::{FillType, Signature};
use crate::fetch::color::Rgba32;
use crate::target::format::PixelFormat;

use super::abi::{ContextData, FetchData, FillData, Pipeline};

/// Blends one premultiplied solid color into one destination pixel at
/// `coverage` (0..=255), for the handful of composition operators this
/// backend supports.
fn blend_pixel(format: PixelFormat, op: CompOp, dst: &mut [u8], src: Rgba32, coverage: u8) {
    let cov = coverage as u32;
    match format {
        PixelFormat::A8 => {
            let src_a = (src.a as u32 * cov) / 255;
            let dst_a = dst[0] as u32;
            let out = match op {
                CompOp::Clear => dst_a * (255 - cov) / 255,
                CompOp::SrcCopy => src_a + dst_a * (255 - cov) / 255,
                // SRC_OVER and anything else we don't special-case falls
                // back to over, which is the default composition operator
                // (spec §3 "default `SRC_OVER`").
                _ => src_a + dst_a * (255 - src_a) / 255,
            };
            dst[0] = out.min(255) as u8;
        }
        PixelFormat::Xrgb32 | PixelFormat::Prgb32 => {
            let has_alpha = format.has_alpha();
            let src_a = (src.a as u32 * cov) / 255;
            let scale = |c: u8| -> u32 { (c as u32 * cov) / 255 };
            let (sr, sg, sb) = (scale(src.r), scale(src.g), scale(src.b));

            for (i, sc) in [sr, sg, sb].into_iter().enumerate() {
                let dc = dst[i] as u32;
                let out = match op {
                    CompOp::Clear => dc * (255 - cov) / 255,
                    CompOp::SrcCopy => sc + dc * (255 - cov) / 255,
                    _ => sc + dc * (255 - src_a) / 255,
                };
                dst[i] = out.min(255) as u8;
            }
            if has_alpha {
                let da = dst[3] as u32;
                let out = match op {
                    CompOp::Clear => da * (255 - cov) / 255,
                    CompOp::SrcCopy => src_a + da * (255 - cov) / 255,
                    _ => src_a + da * (255 - src_a) / 255,
                };
                dst[3] = out.min(255) as u8;
            } else {
                dst[3] = 255;
            }
        }
    }
}

fn pixel_mut<'a>(ctx: &'a mut ContextData<'_>, x: i32, y: i32) -> Option<&'a mut [u8]> {
    if x < 0 || y < 0 || x as u32 >= ctx.image.width() || y as u32 >= ctx.image.height() {
        return None;
    }
    let depth = ctx.image.format().info().depth as usize;
    let row = ctx.image.row_mut(y as u32);
    let start = x as usize * depth;
    Some(&mut row[start..start + depth])
}

fn fill_box_a(ctx: &mut ContextData<'_>, data: &FillData, fetch: &FetchData, op: CompOp) {
    let FillData::BoxA { spans } = data else { return };
    let FetchData::Solid(color) = fetch else { return };
    let format = ctx.image.format();
    for span in spans {
        for x in span.x0..span.x1 {
            if let Some(px) = pixel_mut(ctx, x, span.y) {
                blend_pixel(format, op, px, *color, 255);
            }
        }
    }
}

fn fill_coverage(ctx: &mut ContextData<'_>, data: &FillData, fetch: &FetchData, op: CompOp) {
    let spans = match data {
        FillData::BoxU { spans } | FillData::Analytic { spans } => spans,
        FillData::BoxA { .. } => return,
    };
    let FetchData::Solid(color) = fetch else { return };
    let format = ctx.image.format();
    for span in spans {
        for (i, &coverage) in span.coverage.iter().enumerate() {
            if coverage == 0 {
                continue;
            }
            let x = span.x0 + i as i32;
            if let Some(px) = pixel_mut(ctx, x, span.y) {
                blend_pixel(format, op, px, *color, coverage);
            }
        }
    }
}

fn make_fill_fn(fill_type: FillType, op: CompOp) -> Option<super::abi::FillFunc> {
    // `op` can't be closed over by a plain `fn` pointer, so we dispatch on
    // a fixed small set of (fill_type, op) pairs instead of currying; the
    // reference backend only needs to support the operators this function
    // enumerates (spec SPEC_FULL item 8).
    match (fill_type, op) {
        (FillType::BoxA, CompOp::SrcOver) => Some(fill_box_a_over as super::abi::FillFunc),
        (FillType::BoxA, CompOp::SrcCopy) => Some(fill_box_a_copy as super::abi::FillFunc),
        (FillType::BoxA, CompOp::Clear) => Some(fill_box_a_clear as super::abi::FillFunc),
        (FillType::BoxU, CompOp::SrcOver)
        | (FillType::Analytic, CompOp::SrcOver)
        | (FillType::BoxMaskA, CompOp::SrcOver) => Some(fill_coverage_over as super::abi::FillFunc),
        (FillType::BoxU, CompOp::SrcCopy)
        | (FillType::Analytic, CompOp::SrcCopy)
        | (FillType::BoxMaskA, CompOp::SrcCopy) => Some(fill_coverage_copy as super::abi::FillFunc),
        (FillType::BoxU, CompOp::Clear)
        | (FillType::Analytic, CompOp::Clear)
        | (FillType::BoxMaskA, CompOp::Clear) => Some(fill_coverage_clear as super::abi::FillFunc),
        _ => None,
    }
}

fn fill_box_a_over(ctx: &mut ContextData<'_>, data: &FillData, fetch: &FetchData) {
    fill_box_a(ctx, data, fetch, CompOp::SrcOver);
}
fn fill_box_a_copy(ctx: &mut ContextData<'_>, data: &FillData, fetch: &FetchData) {
    fill_box_a(ctx, data, fetch, CompOp::SrcCopy);
}
fn fill_box_a_clear(ctx: &mut ContextData<'_>, data: &FillData, fetch: &FetchData) {
    fill_box_a(ctx, data, fetch, CompOp::Clear);
}
fn fill_coverage_over(ctx: &mut ContextData<'_>, data: &FillData, fetch: &FetchData) {
    fill_coverage(ctx, data, fetch, CompOp::SrcOver);
}
fn fill_coverage_copy(ctx: &mut ContextData<'_>, data: &FillData, fetch: &FetchData) {
    fill_coverage(ctx, data, fetch, CompOp::SrcCopy);
}
fn fill_coverage_clear(ctx: &mut ContextData<'_>, data: &FillData, fetch: &FetchData) {
    fill_coverage(ctx, data, fetch, CompOp::Clear);
}

fn fetch_solid(_ctx: &ContextData<'_>, _fetch: &FetchData) {
    // Solid fetch data is already fully resolved at command-build time;
    // nothing to precompute.
}

/// The reference pipeline backend (spec §6.3 `DISABLE_JIT`).
#[derive(Debug, Default)]
pub struct ReferencePipeline;

impl Pipeline for ReferencePipeline {
    fn fill_func(&self, signature: Signature) -> Option<super::abi::FillFunc> {
        make_fill_fn(signature.fill_type, signature.comp_op)
    }

    fn fetch_func(&self, signature: Signature) -> Option<super::abi::FetchFunc> {
        use crate::command::signature::FetchType;
        match signature.fetch_type {
            FetchType::Solid => Some(fetch_solid as super::abi::FetchFunc),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::signature::FetchType;
    use crate::target::Image;

    fn sig(fill_type: FillType, op: CompOp) -> Signature {
        Signature::new(op, FetchType::Solid, fill_type, PixelFormat::Prgb32)
    }

    #[test]
    fn src_over_solid_box_blends_over_existing_content() {
        let mut image = Image::new(4, 4, PixelFormat::Prgb32).unwrap();
        let pipeline = ReferencePipeline;
        let fill = pipeline.fill_func(sig(FillType::BoxA, CompOp::SrcOver)).unwrap();
        let mut ctx = ContextData { image: &mut image };
        let data = FillData::BoxA {
            spans: vec![super::super::abi::SolidSpan { y: 1, x0: 1, x1: 3 }],
        };
        let fetch = FetchData::Solid(Rgba32::premultiply(255, 0, 0, 128));
        fill(&mut ctx, &data, &fetch);
        let row = ctx.image.row(1);
        assert_eq!(row[1 * 4 + 3], 128);
        assert_eq!(row[0 * 4 + 3], 0, "untouched pixel stays transparent");
    }

    #[test]
    fn clear_zeroes_coverage_proportional_to_mask() {
        let mut image = Image::new(2, 1, PixelFormat::A8).unwrap();
        image.row_mut(0)[0] = 255;
        let pipeline = ReferencePipeline;
        let fill = pipeline.fill_func(sig(FillType::Analytic, CompOp::Clear)).unwrap();
        let mut ctx = ContextData { image: &mut image };
        let data = FillData::Analytic {
            spans: vec![super::super::abi::CoverageSpan {
                y: 0,
                x0: 0,
                coverage: vec![255],
            }],
        };
        let fetch = FetchData::Solid(Rgba32::OPAQUE_BLACK);
        fill(&mut ctx, &data, &fetch);
        assert_eq!(ctx.image.row(0)[0], 0);
    }

    #[test]
    fn unsupported_signature_returns_none() {
        let pipeline = ReferencePipeline;
        assert!(pipeline.fill_func(sig(FillType::BoxA, CompOp::Multiply)).is_none());
    }
}
