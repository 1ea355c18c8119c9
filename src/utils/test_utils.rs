use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use crate::contour::AnchorSet;
use crate::io::engine::WorkspaceWriter;
use crate::io::Workspace;
use crate::render::{Canvas, StrokeStyle};

/// Generates ellipse points for testing, starting on the major axis.
pub fn ellipse_points(
    major: f64,
    minor: f64,
    num_points: usize,
    center: (f64, f64),
) -> Vec<Point2<f64>> {
    (0..num_points)
        .map(|i| {
            let theta = 2.0 * PI * (i as f64) / (num_points as f64);
            Point2::new(center.0 + major * theta.cos(), center.1 + minor * theta.sin())
        })
        .collect()
}

pub fn ellipse_anchors(major: f64, minor: f64, num_points: usize, center: (f64, f64)) -> AnchorSet {
    AnchorSet::new(ellipse_points(major, minor, num_points, center))
}

pub fn endo_square() -> AnchorSet {
    AnchorSet::from_pairs(&[[1.0, 1.0], [1.0, 3.0], [3.0, 3.0], [3.0, 1.0]])
}

pub fn epi_square() -> AnchorSet {
    AnchorSet::from_pairs(&[[0.0, 0.0], [0.0, 4.0], [4.0, 4.0], [4.0, 0.0]])
}

/// Roughly circular anchors with jittered radius and angle, reproducible per seed.
pub fn jittered_anchors(seed: u64, radius: f64, num_points: usize, center: (f64, f64)) -> AnchorSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let step = 2.0 * PI / num_points as f64;
    let points = (0..num_points)
        .map(|i| {
            let theta = i as f64 * step + rng.random_range(-0.2..0.2) * step;
            let r = radius * rng.random_range(0.8..1.2);
            Point2::new(center.0 + r * theta.cos(), center.1 + r * theta.sin())
        })
        .collect();
    AnchorSet::new(points)
}

/// Canvas that keeps every stroked path.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub paths: Vec<(Vec<Point2<f64>>, StrokeStyle)>,
}

impl Canvas for RecordingCanvas {
    fn stroke_polyline(&mut self, points: &[Point2<f64>], style: &StrokeStyle) {
        self.paths.push((points.to_vec(), *style));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriterCall {
    pub names: Vec<String>,
    pub associations: Vec<Vec<u32>>,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Workspace writer that only records what it was asked to save.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    pub calls: Vec<WriterCall>,
}

impl WorkspaceWriter for RecordingWriter {
    fn update_workspace_corrected(
        &mut self,
        names: &[String],
        associations: &[Vec<u32>],
        source: &Path,
        destination: &Path,
    ) -> anyhow::Result<()> {
        self.calls.push(WriterCall {
            names: names.to_vec(),
            associations: associations.to_vec(),
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
        });
        Ok(())
    }
}

fn gradient_frames(frames: usize, offset: f32) -> Vec<Vec<f32>> {
    (0..frames)
        .map(|f| (0..64).map(|i| i as f32 + offset + f as f32).collect())
        .collect()
}

/// Two slices over five 8x8 image stacks:
/// - slice 1 `SA base`, images 1..=3 (image 3 holds a single frame, the others two),
/// - slice 2 `LA 4ch`, images 4 and 5 with three frames and a missing phase image.
///
/// ROIs: a short-axis ROI with a UID and two frames of anchors, a long-axis ROI
/// without UID whose third frame is empty, and a disabled `curve` ROI.
pub fn workspace_json() -> String {
    let endo = [[1.0, 1.0], [1.0, 3.0], [3.0, 3.0], [3.0, 1.0]];
    let epi = [[0.0, 0.0], [0.0, 4.0], [4.0, 4.0], [4.0, 0.0]];
    let shifted = |pts: [[f64; 2]; 4]| pts.map(|[x, y]| [x + 1.0, y + 1.0]);

    json!({
        "seq": [
            {"ProtocolName": "SA base"},
            {"ProtocolName": "SA base"},
            {"ProtocolName": "SA base"},
            {"ProtocolName": "LA 4ch"},
            {"ProtocolName": "LA 4ch"}
        ],
        "img": [
            {"rows": 8, "cols": 8, "frames": gradient_frames(2, 0.0)},
            {"rows": 8, "cols": 8, "frames": gradient_frames(2, 10.0)},
            {"rows": 8, "cols": 8, "frames": gradient_frames(1, 20.0)},
            {"rows": 8, "cols": 8, "frames": gradient_frames(3, 30.0)},
            {"rows": 8, "cols": 8, "frames": gradient_frames(3, 40.0)}
        ],
        "dns": [
            {"MagIndex": [1], "PhaIndex": [2, 3]},
            {"MagIndex": 4, "PhaIndex": [5, null]}
        ],
        "roi": [
            {
                "UID": "uid-sa",
                "Name": "SA base",
                "SeqIndex": 1,
                "Type": "SA",
                "Position": [[endo, epi], [shifted(endo), shifted(epi)]]
            },
            {
                "Name": "LA 4ch",
                "SeqIndex": [4, 5],
                "Type": "LA",
                "Position": [[endo, epi], [shifted(endo), shifted(epi)], [[], []]]
            },
            {
                "UID": "uid-cur",
                "Name": "curve",
                "SeqIndex": 1,
                "Type": "curve",
                "Position": []
            }
        ]
    })
    .to_string()
}

pub fn sample_workspace() -> Workspace {
    Workspace::from_json(&workspace_json()).unwrap()
}
