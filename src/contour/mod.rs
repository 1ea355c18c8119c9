//! Anchor points to smooth endocardial / epicardial curves.

pub mod spline;

use nalgebra::Point2;
use std::fmt;
use std::str::FromStr;

use crate::error::ContourError;
use spline::{Closure, ParametricSpline};

/// Number of samples on every reconstructed curve (parametric step 0.01 over [0, 1]).
pub const CURVE_SAMPLES: usize = 101;

/// Minimum anchor count for a short-axis (closed) boundary.
pub const MIN_SA_ANCHORS: usize = 3;

/// Minimum anchor count for a long-axis (open) boundary; an open cubic needs m > 3.
pub const MIN_LA_ANCHORS: usize = 4;

/// Imaging plane of a ROI. Drives both the closure policy of the fit and the
/// way the two curves are assembled for drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    ShortAxis,
    LongAxis,
}

impl Orientation {
    pub fn tag(&self) -> &'static str {
        match self {
            Orientation::ShortAxis => "SA",
            Orientation::LongAxis => "LA",
        }
    }

    fn closure(&self) -> Closure {
        match self {
            Orientation::ShortAxis => Closure::Periodic,
            Orientation::LongAxis => Closure::Open,
        }
    }

    fn min_anchors(&self) -> usize {
        match self {
            Orientation::ShortAxis => MIN_SA_ANCHORS,
            Orientation::LongAxis => MIN_LA_ANCHORS,
        }
    }
}

impl FromStr for Orientation {
    type Err = ContourError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SA" => Ok(Orientation::ShortAxis),
            "LA" => Ok(Orientation::LongAxis),
            other => Err(ContourError::InvalidOrientation(other.to_string())),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Ordered landmarks of one boundary at one frame, in 1-based (MATLAB) pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorSet {
    points: Vec<Point2<f64>>,
}

impl AnchorSet {
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        Self { points }
    }

    pub fn from_pairs(pairs: &[[f64; 2]]) -> Self {
        Self {
            points: pairs.iter().map(|p| Point2::new(p[0], p[1])).collect(),
        }
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Anchors moved to 0-based coordinates.
    fn origin_corrected(&self) -> Vec<Point2<f64>> {
        self.points
            .iter()
            .map(|p| Point2::new(p.x - 1.0, p.y - 1.0))
            .collect()
    }
}

/// Boundary resampled at [`CURVE_SAMPLES`] uniformly spaced parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedCurve {
    points: Vec<Point2<f64>>,
}

impl ReconstructedCurve {
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First row of the `(2, n)` coordinate view.
    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    /// Second row of the `(2, n)` coordinate view.
    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    pub fn first(&self) -> Option<&Point2<f64>> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point2<f64>> {
        self.points.last()
    }

    #[cfg(any(test, feature = "python"))]
    pub(crate) fn from_points(points: Vec<Point2<f64>>) -> Self {
        Self { points }
    }
}

/// Both boundaries of a ROI at one frame, with the orientation that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourPair {
    pub endo: ReconstructedCurve,
    pub epi: ReconstructedCurve,
    pub orientation: Orientation,
}

/// Sampling parameters `0, 0.01, ..., 1`, the last one clamped to the spline domain.
pub fn sampling_parameters() -> impl Iterator<Item = f64> {
    (0..CURVE_SAMPLES).map(|i| (i as f64 * 0.01).min(1.0))
}

/// Fits one boundary and resamples it.
fn reconstruct_boundary(
    orientation: Orientation,
    anchors: &AnchorSet,
    boundary: &'static str,
) -> Result<ReconstructedCurve, ContourError> {
    if anchors.len() < orientation.min_anchors() {
        return Err(ContourError::degenerate(
            boundary,
            format!(
                "{} contour needs at least {} anchor points, got {}",
                orientation,
                orientation.min_anchors(),
                anchors.len()
            ),
        ));
    }

    let mut points = anchors.origin_corrected();
    if orientation == Orientation::ShortAxis {
        // explicit closure before the periodic fit
        points.push(points[0]);
    }

    let spline = ParametricSpline::fit(&points, orientation.closure(), boundary)?;
    Ok(ReconstructedCurve {
        points: sampling_parameters().map(|t| spline.eval(t)).collect(),
    })
}

/// Smooth endocardial and epicardial curves from their anchor points.
///
/// Short-axis boundaries are closed and fitted periodically, long-axis ones are
/// fitted open. Both are interpolating cubic fits (no smoothing) sampled at
/// [`CURVE_SAMPLES`] points.
pub fn reconstruct(
    orientation: Orientation,
    endo_anchors: &AnchorSet,
    epi_anchors: &AnchorSet,
) -> Result<ContourPair, ContourError> {
    let endo = reconstruct_boundary(orientation, endo_anchors, "endo")?;
    let epi = reconstruct_boundary(orientation, epi_anchors, "epi")?;
    Ok(ContourPair {
        endo,
        epi,
        orientation,
    })
}

/// Same as [`reconstruct`], taking the raw workspace `Type` tag.
pub fn reconstruct_tagged(
    tag: &str,
    endo_anchors: &AnchorSet,
    epi_anchors: &AnchorSet,
) -> Result<ContourPair, ContourError> {
    reconstruct(tag.parse()?, endo_anchors, epi_anchors)
}
