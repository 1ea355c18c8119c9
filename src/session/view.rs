use log::{debug, warn};
use rayon::prelude::*;

use crate::contour::{reconstruct, ContourPair};
use crate::error::WorkspaceError;
use crate::io::input::FrameImage;
use crate::io::{RoiId, Workspace};
use crate::render::{render_pair, RasterCanvas, StrokeStyle};

/// Panel slots shown for a slice: magnitude and up to three phase images.
pub const DEFAULT_PANELS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum PanelImage {
    Frame(FrameImage),
    /// Stand-in for an image or frame the workspace does not hold.
    Blank { rows: usize, cols: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    /// 1-based workspace image shown here, if the slice has one for this slot.
    pub image_index: Option<usize>,
    pub image: PanelImage,
}

/// Everything needed to draw one frame of a slice.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub frame: u32,
    pub panels: Vec<Panel>,
    pub overlay: Option<ContourPair>,
}

/// Collects the panel images and the selected ROI's contours for a frame.
///
/// Missing images become blank panels. A ROI without anchors at this frame,
/// or with anchors that cannot be fitted, is shown without overlay.
pub fn compose_frame_view(
    workspace: &Workspace,
    slice_index: usize,
    frame: u32,
    roi: Option<&RoiId>,
    panel_count: usize,
) -> Result<FrameView, WorkspaceError> {
    let slice = workspace.slice(slice_index)?;
    let (rows, cols) = slice
        .image_indices
        .iter()
        .find_map(|&idx| workspace.image_shape(idx))
        .unwrap_or((1, 1));

    let panels = (0..panel_count)
        .map(|slot| {
            let image_index = slice.image_indices.get(slot).copied();
            let image = match image_index.map(|idx| workspace.frame_image(idx, frame)) {
                Some(Ok(img)) => PanelImage::Frame(img),
                Some(Err(e)) => {
                    debug!("Blank panel {}: {}", slot + 1, e);
                    PanelImage::Blank { rows, cols }
                }
                None => PanelImage::Blank { rows, cols },
            };
            Panel { image_index, image }
        })
        .collect();

    let overlay = match roi {
        Some(id) => overlay_for(workspace, id, frame)?,
        None => None,
    };

    Ok(FrameView {
        frame,
        panels,
        overlay,
    })
}

fn overlay_for(
    workspace: &Workspace,
    id: &RoiId,
    frame: u32,
) -> Result<Option<ContourPair>, WorkspaceError> {
    let roi = workspace.roi(id)?;
    let orientation = match roi.orientation() {
        Ok(o) => o,
        Err(_) => return Err(WorkspaceError::DisabledRoi(id.to_string())),
    };
    let (endo, epi) = match roi.frame_anchors(frame) {
        Ok(anchors) => anchors,
        Err(e) => {
            debug!("No overlay: {}", e);
            return Ok(None);
        }
    };
    match reconstruct(orientation, &endo, &epi) {
        Ok(pair) => Ok(Some(pair)),
        Err(e) => {
            warn!("No overlay for ROI {} at frame {}: {}", id, frame, e);
            Ok(None)
        }
    }
}

/// Rasterises every panel, stroking the overlay on each of them.
pub fn draw_frame_view(
    view: &FrameView,
    scale: u32,
    style: &StrokeStyle,
) -> anyhow::Result<Vec<RasterCanvas>> {
    view.panels
        .iter()
        .map(|panel| {
            let mut canvas = match &panel.image {
                PanelImage::Frame(img) => RasterCanvas::from_frame(img, scale)?,
                PanelImage::Blank { rows, cols } => RasterCanvas::blank(*cols, *rows, scale)?,
            };
            if let Some(pair) = &view.overlay {
                render_pair(&mut canvas, pair, style);
            }
            Ok(canvas)
        })
        .collect()
}

/// Composes and draws frames `1..=frames` of a slice in parallel.
pub fn render_all_frames(
    workspace: &Workspace,
    slice_index: usize,
    frames: u32,
    roi: Option<&RoiId>,
    panel_count: usize,
    scale: u32,
    style: &StrokeStyle,
) -> anyhow::Result<Vec<(u32, Vec<RasterCanvas>)>> {
    (1..=frames)
        .into_par_iter()
        .map(|frame| {
            let view = compose_frame_view(workspace, slice_index, frame, roi, panel_count)?;
            Ok((frame, draw_frame_view(&view, scale, style)?))
        })
        .collect()
}
