//! Converts a resolved [`RenderCommand`] into the `(Signature, FillData,
//! FetchData)` triple a [`Pipeline`] consumes. Shared by the synchronous
//! immediate-draw path and the worker manager's commands phase (spec
//! §4.7, §4.8) so both dispatch exactly the same way.

use crate::command::{CommandHeader, RenderCommand};
use crate::edge::point::FixedBox;
use crate::fetch::color::Rgba32;
use crate::fetch::StyleData;
use crate::raster::analytic::AnalyticRasterizer;

use super::abi::{CoverageSpan, FetchData, FillData, SolidSpan};

fn header_color(header: &CommandHeader) -> Rgba32 {
    let base = header.style.solid_color().unwrap_or(Rgba32::OPAQUE_BLACK);
    let a = (base.a as u32 * header.alpha as u32 / 255) as u8;
    let scale = |c: u8| -> u8 { (c as u32 * header.alpha as u32 / 255) as u8 };
    Rgba32::new(scale(base.r), scale(base.g), scale(base.b), a)
}

fn fetch_for(style: &StyleData, color: Rgba32) -> FetchData {
    match style {
        StyleData::Fetch(_) => FetchData::Precomputed(Box::new(())),
        _ => FetchData::Solid(color),
    }
}

/// Builds the fill/fetch data for one command. `FillAnalytic` commands run
/// the analytic rasterizer here, synchronously, to produce coverage spans
/// (spec §4.5); the worker manager calls this from whichever thread owns
/// the command's band, and the synchronous context calls it inline.
pub fn command_to_fill(command: &RenderCommand) -> (FillData, FetchData) {
    match command {
        RenderCommand::FillBoxA { header, box_i } => {
            let color = header_color(header);
            let spans = (box_i.y0..box_i.y1)
                .map(|y| SolidSpan { y, x0: box_i.x0, x1: box_i.x1 })
                .collect();
            (FillData::BoxA { spans }, fetch_for(&header.style, color))
        }
        RenderCommand::FillBoxU { header, box_i, edge_alpha } => {
            let color = header_color(header);
            let width = (box_i.x1 - box_i.x0).max(0) as usize;
            let mut spans = Vec::with_capacity((box_i.y1 - box_i.y0).max(0) as usize);
            for y in box_i.y0..box_i.y1 {
                let row_alpha = if y == box_i.y0 {
                    edge_alpha.top
                } else if y == box_i.y1 - 1 {
                    edge_alpha.bottom
                } else {
                    255
                };
                let mut coverage = vec![row_alpha; width];
                if width > 0 {
                    coverage[0] = (row_alpha as u32 * edge_alpha.left as u32 / 255) as u8;
                    coverage[width - 1] = (row_alpha as u32 * edge_alpha.right as u32 / 255) as u8;
                }
                spans.push(CoverageSpan { y, x0: box_i.x0, coverage });
            }
            (FillData::BoxU { spans }, fetch_for(&header.style, color))
        }
        RenderCommand::FillAnalytic { header, edges, fill_rule } => {
            let color = header_color(header);
            let bounds = edges.storage.bounding_box().unwrap_or(FixedBox::from_f64(0.0, 0.0, 0.0, 0.0));
            let rasterizer = AnalyticRasterizer::new(&edges.storage, bounds, *fill_rule);
            let origin_x = bounds.x0 >> crate::edge::point::FIXED_SHIFT;
            let origin_y = bounds.y0 >> crate::edge::point::FIXED_SHIFT;
            let mut rows: std::collections::BTreeMap<i32, CoverageSpan> = std::collections::BTreeMap::new();
            rasterizer.rasterize(|x, y, alpha| {
                let abs_x = origin_x as i32 + x;
                let abs_y = origin_y as i32 + y;
                let span = rows.entry(abs_y).or_insert_with(|| CoverageSpan {
                    y: abs_y,
                    x0: abs_x,
                    coverage: Vec::new(),
                });
                if span.coverage.is_empty() {
                    span.x0 = abs_x;
                }
                let idx = (abs_x - span.x0) as usize;
                if idx >= span.coverage.len() {
                    span.coverage.resize(idx + 1, 0);
                }
                span.coverage[idx] = alpha;
            });
            let spans = rows.into_values().collect();
            (FillData::Analytic { spans }, fetch_for(&header.style, color))
        }
        RenderCommand::FillBoxMaskA {
            header,
            box_i,
            mask,
            mask_origin_x,
            mask_origin_y,
        } => {
            let color = header_color(header);
            let mut spans = Vec::with_capacity((box_i.y1 - box_i.y0).max(0) as usize);
            for y in box_i.y0..box_i.y1 {
                let mask_y = y - mask_origin_y;
                if mask_y < 0 || mask_y as u32 >= mask.height() {
                    continue;
                }
                let row = mask.row(mask_y as u32);
                let mut coverage = Vec::with_capacity((box_i.x1 - box_i.x0).max(0) as usize);
                for x in box_i.x0..box_i.x1 {
                    let mask_x = x - mask_origin_x;
                    let v = if mask_x >= 0 && (mask_x as usize) < row.len() {
                        row[mask_x as usize]
                    } else {
                        0
                    };
                    coverage.push(v);
                }
                spans.push(CoverageSpan { y, x0: box_i.x0, coverage });
            }
            (FillData::Analytic { spans }, fetch_for(&header.style, color))
        }
    }
}
