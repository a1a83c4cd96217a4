//! A small JSON scene format for exercising [`raster_core::RenderingContext`]
//! end to end without writing Rust: a flat list of draw/transform/state
//! operations, executed in order against a single context.

use raster_core::context::stroke::StrokeOptions;
use raster_core::fetch::color::Rgba32;
use raster_core::geometry::point::Rect;
use raster_core::raster::cell::FillRule;
use raster_core::{RasterResult, RenderingContext};
use serde::Deserialize;

/// One drawing or state-change instruction (spec-free: this format exists
/// only for the CLI, not part of the engine itself).
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SceneOp {
    Save,
    Restore,
    Translate { x: f64, y: f64 },
    Scale { sx: f64, sy: f64 },
    Rotate { angle: f64 },
    SetFillColor { color: [u8; 4] },
    SetStrokeColor { color: [u8; 4] },
    SetStrokeWidth { width: f64 },
    SetFillRule { rule: FillRuleArg },
    FillRect { x: f64, y: f64, w: f64, h: f64 },
    StrokeRect { x: f64, y: f64, w: f64, h: f64 },
    ClearAll,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillRuleArg {
    NonZero,
    EvenOdd,
}

pub type Scene = Vec<SceneOp>;

fn color_from_straight(c: [u8; 4]) -> Rgba32 {
    Rgba32::premultiply(c[0], c[1], c[2], c[3])
}

/// Runs every operation in `scene` against `ctx`, in order.
pub fn execute(ctx: &mut RenderingContext, scene: &Scene) -> RasterResult<()> {
    for op in scene {
        match op {
            SceneOp::Save => ctx.save()?,
            SceneOp::Restore => ctx.restore()?,
            SceneOp::Translate { x, y } => ctx.translate(*x, *y),
            SceneOp::Scale { sx, sy } => ctx.scale(*sx, *sy),
            SceneOp::Rotate { angle } => ctx.rotate(*angle),
            SceneOp::SetFillColor { color } => ctx.set_fill_style_solid(color_from_straight(*color)),
            SceneOp::SetStrokeColor { color } => ctx.set_stroke_style_solid(color_from_straight(*color)),
            SceneOp::SetStrokeWidth { width } => {
                let mut options = StrokeOptions::default();
                options.width = *width;
                ctx.set_stroke_options(options);
            }
            SceneOp::SetFillRule { rule } => ctx.set_fill_rule(match rule {
                FillRuleArg::NonZero => FillRule::NonZero,
                FillRuleArg::EvenOdd => FillRule::EvenOdd,
            }),
            SceneOp::FillRect { x, y, w, h } => ctx.fill_rect(Rect::new(*x, *y, *w, *h))?,
            SceneOp::StrokeRect { x, y, w, h } => ctx.stroke_rect(Rect::new(*x, *y, *w, *h))?,
            SceneOp::ClearAll => ctx.clear_all()?,
        }
    }
    Ok(())
}

/// A small built-in scene used when no `--scene` file is given: a rotated
/// square over a cleared background, enough to prove the pipeline runs.
pub fn demo_scene(width: f64, height: f64) -> Scene {
    vec![
        SceneOp::ClearAll,
        SceneOp::SetFillColor {
            color: [30, 120, 200, 255],
        },
        SceneOp::Save,
        SceneOp::Translate {
            x: width / 2.0,
            y: height / 2.0,
        },
        SceneOp::Rotate {
            angle: std::f64::consts::FRAC_PI_4,
        },
        SceneOp::FillRect {
            x: -width / 4.0,
            y: -height / 4.0,
            w: width / 2.0,
            h: height / 2.0,
        },
        SceneOp::Restore,
        SceneOp::SetStrokeColor {
            color: [255, 255, 255, 255],
        },
        SceneOp::SetStrokeWidth { width: 3.0 },
        SceneOp::StrokeRect {
            x: 4.0,
            y: 4.0,
            w: width - 8.0,
            h: height - 8.0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_core::target::format::PixelFormat;
    use raster_core::target::Image;

    #[test]
    fn demo_scene_executes_without_error() {
        let mut image = Image::new(32, 32, PixelFormat::Prgb32).unwrap();
        let mut ctx = RenderingContext::begin(&mut image, Default::default()).unwrap();
        execute(&mut ctx, &demo_scene(32.0, 32.0)).unwrap();
        ctx.end().unwrap();
    }

    #[test]
    fn scene_json_parses_fill_rect() {
        let json = r#"[{"op":"set_fill_color","color":[255,0,0,255]},{"op":"fill_rect","x":0,"y":0,"w":4,"h":4}]"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        assert_eq!(scene.len(), 2);
    }
}
