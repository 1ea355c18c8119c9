//! Drawing reconstructed contours onto a canvas that already shows the frame.

mod raster;

pub use raster::RasterCanvas;

use nalgebra::Point2;
use serde::Deserialize;

use crate::contour::{ContourPair, Orientation, ReconstructedCurve};
use crate::error::ContourError;

/// Colour and width of contour strokes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct StrokeStyle {
    pub color: [u8; 3],
    pub width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: [255, 0, 0],
            width: 1.0,
        }
    }
}

/// Something contours can be stroked onto. Coordinates are 0-based image pixels.
///
/// Implementations add primitives only; they are never cleared by the renderer.
pub trait Canvas {
    fn stroke_polyline(&mut self, points: &[Point2<f64>], style: &StrokeStyle);
}

/// Paths to stroke for a contour pair, in drawing order.
///
/// Short-axis: the epicardial then the endocardial curve, each on its own.
/// Long-axis: one loop, epicardium followed by endocardium and closed on the
/// first epicardial point.
pub fn assemble_paths(
    orientation: Orientation,
    endo: &ReconstructedCurve,
    epi: &ReconstructedCurve,
) -> Vec<Vec<Point2<f64>>> {
    match orientation {
        Orientation::ShortAxis => vec![epi.points().to_vec(), endo.points().to_vec()],
        Orientation::LongAxis => {
            let mut merged = Vec::with_capacity(epi.len() + endo.len() + 1);
            merged.extend_from_slice(epi.points());
            merged.extend_from_slice(endo.points());
            if let Some(first) = epi.first() {
                merged.push(*first);
            }
            vec![merged]
        }
    }
}

pub fn render<C: Canvas + ?Sized>(
    canvas: &mut C,
    endo: &ReconstructedCurve,
    epi: &ReconstructedCurve,
    orientation: Orientation,
    style: &StrokeStyle,
) {
    for path in assemble_paths(orientation, endo, epi) {
        canvas.stroke_polyline(&path, style);
    }
}

pub fn render_pair<C: Canvas + ?Sized>(canvas: &mut C, pair: &ContourPair, style: &StrokeStyle) {
    render(canvas, &pair.endo, &pair.epi, pair.orientation, style);
}

/// Same as [`render`], taking the raw workspace `Type` tag. The canvas is left
/// untouched when the tag is not recognised.
pub fn render_tagged<C: Canvas + ?Sized>(
    canvas: &mut C,
    tag: &str,
    endo: &ReconstructedCurve,
    epi: &ReconstructedCurve,
    style: &StrokeStyle,
) -> Result<(), ContourError> {
    let orientation: Orientation = tag.parse()?;
    render(canvas, endo, epi, orientation, style);
    Ok(())
}

#[cfg(test)]
mod render_tests {
    use super::*;
    use crate::contour::{reconstruct, reconstruct_tagged};
    use crate::utils::test_utils::{endo_square, epi_square, RecordingCanvas};

    #[test]
    fn test_short_axis_draws_two_separate_paths() {
        let pair = reconstruct(Orientation::ShortAxis, &endo_square(), &epi_square()).unwrap();
        let mut canvas = RecordingCanvas::default();
        render_pair(&mut canvas, &pair, &StrokeStyle::default());

        assert_eq!(canvas.paths.len(), 2);
        assert_eq!(canvas.paths[0].0, pair.epi.points().to_vec());
        assert_eq!(canvas.paths[1].0, pair.endo.points().to_vec());
        assert!(canvas.paths.iter().all(|(_, style)| style.color == [255, 0, 0]));
    }

    #[test]
    fn test_long_axis_draws_one_closed_loop() {
        let pair = reconstruct_tagged("LA", &endo_square(), &epi_square()).unwrap();
        let mut canvas = RecordingCanvas::default();
        render(&mut canvas, &pair.endo, &pair.epi, pair.orientation, &StrokeStyle::default());

        assert_eq!(canvas.paths.len(), 1);
        let path = &canvas.paths[0].0;
        assert_eq!(path.len(), pair.epi.len() + pair.endo.len() + 1);
        assert_eq!(path.len(), 203);
        assert_eq!(path.first(), path.last());
        assert_eq!(path[pair.epi.len()], pair.endo.points()[0]);
    }

    #[test]
    fn test_invalid_tag_leaves_canvas_untouched() {
        let pair = reconstruct(Orientation::ShortAxis, &endo_square(), &epi_square()).unwrap();
        let mut canvas = RecordingCanvas::default();
        let err = render_tagged(&mut canvas, "XY", &pair.endo, &pair.epi, &StrokeStyle::default())
            .unwrap_err();

        assert_eq!(err, ContourError::InvalidOrientation("XY".into()));
        assert!(canvas.paths.is_empty());
    }

    #[test]
    fn test_renderer_appends_to_existing_canvas_content() {
        let pair = reconstruct(Orientation::ShortAxis, &endo_square(), &epi_square()).unwrap();
        let mut canvas = RecordingCanvas::default();
        render_pair(&mut canvas, &pair, &StrokeStyle::default());
        render_tagged(&mut canvas, "SA", &pair.endo, &pair.epi, &StrokeStyle::default()).unwrap();
        assert_eq!(canvas.paths.len(), 4);
    }
}
