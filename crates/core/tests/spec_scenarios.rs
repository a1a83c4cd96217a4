//! End-to-end scenarios exercising the context, edge builder, and
//! reference pipeline together, rather than any one module in isolation.

use raster_core::command::CompOp;
use raster_core::context::ContextCreateInfo;
use raster_core::fetch::Rgba32;
use raster_core::geometry::{Point, Rect};
use raster_core::path::Path;
use raster_core::raster::FillRule;
use raster_core::target::format::PixelFormat;
use raster_core::{Image, RasterResult, RenderingContext};

fn ctx_info(thread_count: u32) -> ContextCreateInfo {
    ContextCreateInfo {
        thread_count,
        ..ContextCreateInfo::default()
    }
}

fn pixel_argb(image: &Image, x: u32, y: u32) -> u32 {
    let row = image.row(y);
    let start = x as usize * 4;
    let px = &row[start..start + 4];
    Rgba32::new(px[0], px[1], px[2], px[3]).to_prgb32_u32()
}

/// Scenario 1: a 50%-alpha red fill over a cleared 10x10 image leaves the
/// 6x6 interior premultiplied to `0x80800000` and everything else
/// transparent black.
#[test]
fn solid_rectangle_fill_is_premultiplied() {
    let mut image = Image::new(10, 10, PixelFormat::Prgb32).unwrap();
    let mut ctx = RenderingContext::begin(&mut image, ctx_info(0)).unwrap();

    ctx.clear_all().unwrap();
    ctx.set_fill_style_solid(Rgba32::premultiply(0xFF, 0x00, 0x00, 0x80));
    ctx.fill_rect(Rect::new(2.0, 2.0, 6.0, 6.0)).unwrap();
    ctx.end().unwrap();

    for y in 2..8u32 {
        for x in 2..8u32 {
            assert_eq!(
                pixel_argb(&image, x, y),
                0x8080_0000,
                "interior pixel ({x}, {y}) should be premultiplied 0x80800000"
            );
        }
    }
    for (x, y) in [(0u32, 0u32), (9, 9), (1, 4), (8, 4), (4, 1), (4, 8)] {
        assert_eq!(pixel_argb(&image, x, y), 0, "pixel ({x}, {y}) outside the fill should stay transparent");
    }
}

/// Scenario 2: a 40x40 black square rotated 45 degrees around the center
/// of a 100x100 white image covers the center but none of the four
/// corners, which sit well outside the rotated diamond's reach.
#[test]
fn transformed_diamond_leaves_corners_untouched() {
    let mut image = Image::new(100, 100, PixelFormat::Prgb32).unwrap();
    let mut ctx = RenderingContext::begin(&mut image, ctx_info(0)).unwrap();

    ctx.set_fill_style_solid(Rgba32::OPAQUE_WHITE);
    ctx.fill_all().unwrap();

    ctx.translate(50.0, 50.0);
    ctx.rotate(std::f64::consts::FRAC_PI_4);
    ctx.set_fill_style_solid(Rgba32::OPAQUE_BLACK);
    ctx.fill_rect(Rect::new(-20.0, -20.0, 40.0, 40.0)).unwrap();
    ctx.end().unwrap();

    for (x, y) in [(5u32, 5u32), (95, 5), (5, 95), (95, 95)] {
        assert_eq!(
            pixel_argb(&image, x, y),
            0xFFFF_FFFF,
            "corner ({x}, {y}) should remain opaque white"
        );
    }
    assert_eq!(pixel_argb(&image, 50, 50), 0xFF00_0000, "image center should be covered by the rotated square");
}

/// Scenario 4: a non-trivial multi-shape scene (overlapping solid fills
/// under different composition operators, a rotated fill, and a clipped
/// fill reverted by `restore`) produces byte-identical output whether run
/// through a synchronous context or a 4-thread asynchronous one.
fn paint_scene(ctx: &mut RenderingContext<'_>) -> RasterResult<()> {
    ctx.set_fill_style_solid(Rgba32::OPAQUE_WHITE);
    ctx.fill_all()?;

    ctx.set_comp_op(CompOp::SrcOver);
    ctx.set_fill_style_solid(Rgba32::premultiply(0x00, 0x80, 0xFF, 0xC0));
    ctx.fill_rect(Rect::new(4.0, 4.0, 20.0, 20.0))?;

    ctx.set_comp_op(CompOp::SrcCopy);
    ctx.set_fill_style_solid(Rgba32::premultiply(0xFF, 0x20, 0x20, 0xFF));
    ctx.fill_rect(Rect::new(12.0, 12.0, 20.0, 20.0))?;
    ctx.set_comp_op(CompOp::SrcOver);

    ctx.save()?;
    ctx.translate(32.0, 32.0);
    ctx.rotate(std::f64::consts::FRAC_PI_4 / 2.0);
    ctx.set_fill_style_solid(Rgba32::OPAQUE_BLACK);
    ctx.fill_rect(Rect::new(-6.0, -6.0, 12.0, 12.0))?;
    ctx.restore()?;

    ctx.save()?;
    ctx.clip_to_rect(Rect::new(40.0, 4.0, 20.0, 20.0));
    ctx.set_fill_style_solid(Rgba32::premultiply(0x20, 0xFF, 0x20, 0xFF));
    ctx.fill_all()?;
    ctx.restore()?;

    let mut annulus = Path::new();
    annulus.move_to(Point::new(4.0, 44.0));
    annulus.line_to(Point::new(28.0, 44.0));
    annulus.line_to(Point::new(28.0, 60.0));
    annulus.line_to(Point::new(4.0, 60.0));
    annulus.close();
    annulus.move_to(Point::new(10.0, 50.0));
    annulus.line_to(Point::new(10.0, 54.0));
    annulus.line_to(Point::new(22.0, 54.0));
    annulus.line_to(Point::new(22.0, 50.0));
    annulus.close();
    ctx.set_fill_rule(FillRule::EvenOdd);
    ctx.set_fill_style_solid(Rgba32::OPAQUE_BLACK);
    ctx.fill_path(&annulus)?;
    ctx.set_fill_rule(FillRule::NonZero);

    Ok(())
}

#[test]
fn asynchronous_scene_matches_synchronous_byte_for_byte() {
    let mut sync_image = Image::new(64, 64, PixelFormat::Prgb32).unwrap();
    {
        let mut ctx = RenderingContext::begin(&mut sync_image, ctx_info(0)).unwrap();
        paint_scene(&mut ctx).unwrap();
        ctx.end().unwrap();
        assert!(ctx.accumulated_error_flags().is_empty());
    }

    let mut async_image = Image::new(64, 64, PixelFormat::Prgb32).unwrap();
    {
        let mut ctx = RenderingContext::begin(&mut async_image, ctx_info(4)).unwrap();
        paint_scene(&mut ctx).unwrap();
        ctx.end().unwrap();
        assert!(ctx.accumulated_error_flags().is_empty());
    }

    assert_eq!(sync_image.data(), async_image.data());
}
