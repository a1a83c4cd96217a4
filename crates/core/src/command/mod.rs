//! Render commands: the tagged union the context dispatches draw
//! primitives into, and that the batch/worker machinery consumes
//! (spec §3, §4.7).

pub mod compop;
pub mod signature;

pub use compop::CompOp;
pub use signature::{FetchType, FillType, Signature};

use std::sync::Arc;

use crate::edge::OwnedEdgeStorage;
use crate::fetch::StyleData;
use crate::geometry::point::BoxI;
use crate::raster::FillRule;
use crate::target::Image;

/// Per-edge coverage of a pixel-unaligned box's four fractional borders;
/// the interior integer-pixel region is filled at full alpha, so only the
/// border fringe needs blending (spec §4.7: "unaligned box (with
/// generated mask-command stream)" — we model the generated mask as these
/// four scalar edge alphas rather than a literal command stream, since a
/// rectangle's mask is fully determined by its four fractional offsets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeAlpha {
    pub left: u8,
    pub top: u8,
    pub right: u8,
    pub bottom: u8,
}

/// Common fields every fill command carries (spec §3: "Each carries a
/// pipeline `Signature` ... and either a solid color (inline) or a
/// pointer to a shared `RenderFetchData`").
#[derive(Clone)]
pub struct CommandHeader {
    pub signature: Signature,
    pub style: StyleData,
    /// Global alpha multiplied with the per-slot alpha, 0..=255 (spec
    /// §4.6: "Global alpha and per-slot alpha multiply into the command's
    /// 8-bit ... alpha field").
    pub alpha: u8,
}

#[derive(Clone)]
pub enum RenderCommand {
    /// Pixel-aligned rectangle: every covered pixel is fully inside,
    /// filled at `header.alpha` with no per-pixel coverage computation.
    FillBoxA { header: CommandHeader, box_i: BoxI },

    /// Pixel-unaligned rectangle: the interior is full alpha, the border
    /// ring is blended by `edge_alpha`.
    FillBoxU {
        header: CommandHeader,
        box_i: BoxI,
        edge_alpha: EdgeAlpha,
    },

    /// General path fill: references the edge chain built for this
    /// geometry (spec §4.4) plus the fill rule to apply when sweeping
    /// cell coverage (spec §8 scenario 5).
    FillAnalytic {
        header: CommandHeader,
        edges: Arc<OwnedEdgeStorage>,
        fill_rule: FillRule,
    },

    /// Box filled through an externally supplied A8 coverage mask rather
    /// than geometry (spec §3: "`FillBoxMaskA` (box filled with an
    /// externally supplied mask image)").
    FillBoxMaskA {
        header: CommandHeader,
        box_i: BoxI,
        mask: Arc<Image>,
        mask_origin_x: i32,
        mask_origin_y: i32,
    },
}

impl RenderCommand {
    pub fn header(&self) -> &CommandHeader {
        match self {
            RenderCommand::FillBoxA { header, .. }
            | RenderCommand::FillBoxU { header, .. }
            | RenderCommand::FillAnalytic { header, .. }
            | RenderCommand::FillBoxMaskA { header, .. } => header,
        }
    }

    /// The band this command's work starts in, used to partition commands
    /// across workers in asynchronous mode (spec §4.8: "commands are
    /// partitioned by band"). Box-shaped commands are banded by their
    /// top edge; analytic fills use their edge storage's first non-empty
    /// band.
    pub fn band_id(&self, band_height_shift: u32) -> usize {
        match self {
            RenderCommand::FillBoxA { box_i, .. }
            | RenderCommand::FillBoxU { box_i, .. }
            | RenderCommand::FillBoxMaskA { box_i, .. } => (box_i.y0.max(0) as usize) >> band_height_shift,
            RenderCommand::FillAnalytic { edges, .. } => (0..edges.storage.band_count())
                .find(|&b| !edges.storage.band(b).is_empty())
                .unwrap_or(0),
        }
    }
}
