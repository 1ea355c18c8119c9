use nalgebra::Point2;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::contour::{reconstruct_tagged, AnchorSet, ContourPair, ReconstructedCurve};
use crate::error::ContourError;
use crate::render::assemble_paths;

impl From<ContourError> for PyErr {
    fn from(err: ContourError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

/// Both reconstructed curves, as coordinate rows.
#[pyclass]
#[derive(Debug, Clone)]
pub struct PyContourPair {
    #[pyo3(get)]
    pub roi_type: String,
    #[pyo3(get)]
    pub endo_x: Vec<f64>,
    #[pyo3(get)]
    pub endo_y: Vec<f64>,
    #[pyo3(get)]
    pub epi_x: Vec<f64>,
    #[pyo3(get)]
    pub epi_y: Vec<f64>,
}

#[pymethods]
impl PyContourPair {
    fn __repr__(&self) -> String {
        format!(
            "ContourPair(type={}, endo={} pts, epi={} pts)",
            self.roi_type,
            self.endo_x.len(),
            self.epi_x.len()
        )
    }
}

impl From<&ContourPair> for PyContourPair {
    fn from(pair: &ContourPair) -> Self {
        Self {
            roi_type: pair.orientation.tag().to_string(),
            endo_x: pair.endo.xs(),
            endo_y: pair.endo.ys(),
            epi_x: pair.epi.xs(),
            epi_y: pair.epi.ys(),
        }
    }
}

fn curve_from_rows(rows: &[Vec<f64>], boundary: &'static str) -> Result<ReconstructedCurve, ContourError> {
    let [xs, ys] = rows else {
        return Err(ContourError::degenerate(
            boundary,
            format!("expected 2 coordinate rows, got {}", rows.len()),
        ));
    };
    if xs.len() != ys.len() {
        return Err(ContourError::degenerate(
            boundary,
            format!("{} x coordinates but {} y coordinates", xs.len(), ys.len()),
        ));
    }
    Ok(ReconstructedCurve::from_points(
        xs.iter().zip(ys).map(|(&x, &y)| Point2::new(x, y)).collect(),
    ))
}

/// Fits endocardial and epicardial anchors of one frame.
///
/// Returns `(endo, epi)`, each a `[xs, ys]` pair of 101 samples in 0-based pixel coordinates.
#[pyfunction]
#[pyo3(signature = (roi_type, endo_anchors, epi_anchors))]
pub fn anchor_to_contour(
    roi_type: &str,
    endo_anchors: Vec<[f64; 2]>,
    epi_anchors: Vec<[f64; 2]>,
) -> PyResult<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
    let pair = reconstruct_tagged(
        roi_type,
        &AnchorSet::from_pairs(&endo_anchors),
        &AnchorSet::from_pairs(&epi_anchors),
    )?;
    Ok((
        vec![pair.endo.xs(), pair.endo.ys()],
        vec![pair.epi.xs(), pair.epi.ys()],
    ))
}

/// Same fit as [`anchor_to_contour`], as a `ContourPair` object.
#[pyfunction]
pub fn reconstruct_pair(
    roi_type: &str,
    endo_anchors: Vec<[f64; 2]>,
    epi_anchors: Vec<[f64; 2]>,
) -> PyResult<PyContourPair> {
    let pair = reconstruct_tagged(
        roi_type,
        &AnchorSet::from_pairs(&endo_anchors),
        &AnchorSet::from_pairs(&epi_anchors),
    )?;
    Ok(PyContourPair::from(&pair))
}

/// Polylines to draw for reconstructed curves: two for `SA`, one closed loop for `LA`.
#[pyfunction]
#[pyo3(signature = (endo, epi, roi_type))]
pub fn roi_paths(
    endo: Vec<Vec<f64>>,
    epi: Vec<Vec<f64>>,
    roi_type: &str,
) -> PyResult<Vec<Vec<(f64, f64)>>> {
    let orientation = roi_type.parse()?;
    let endo = curve_from_rows(&endo, "endo")?;
    let epi = curve_from_rows(&epi, "epi")?;
    Ok(assemble_paths(orientation, &endo, &epi)
        .into_iter()
        .map(|path| path.into_iter().map(|p| (p.x, p.y)).collect())
        .collect())
}

/// ```python
/// import densevis
/// endo, epi = densevis.anchor_to_contour("SA", [[1, 1], [1, 3], [3, 3], [3, 1]],
///                                        [[0, 0], [0, 4], [4, 4], [4, 0]])
/// paths = densevis.roi_paths(endo, epi, "SA")
/// ```
#[pymodule]
fn densevis(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_function(wrap_pyfunction!(anchor_to_contour, m)?)?;
    m.add_function(wrap_pyfunction!(reconstruct_pair, m)?)?;
    m.add_function(wrap_pyfunction!(roi_paths, m)?)?;
    m.add_class::<PyContourPair>()?;
    Ok(())
}

#[cfg(test)]
mod python_bind_tests {
    use super::*;

    #[test]
    fn test_rows_must_be_two_equal_length_vectors() {
        assert!(curve_from_rows(&[vec![0.0, 1.0]], "endo").is_err());
        assert!(curve_from_rows(&[vec![0.0, 1.0], vec![0.0]], "epi").is_err());
        let curve = curve_from_rows(&[vec![0.0, 1.0], vec![2.0, 3.0]], "epi").unwrap();
        assert_eq!(curve.points()[1], Point2::new(1.0, 3.0));
    }

    #[test]
    fn test_pair_conversion_keeps_rows() {
        let pair = reconstruct_tagged(
            "LA",
            &AnchorSet::from_pairs(&[[1.0, 1.0], [1.0, 3.0], [3.0, 3.0], [3.0, 1.0]]),
            &AnchorSet::from_pairs(&[[0.0, 0.0], [0.0, 4.0], [4.0, 4.0], [4.0, 0.0]]),
        )
        .unwrap();
        let py = PyContourPair::from(&pair);
        assert_eq!(py.roi_type, "LA");
        assert_eq!(py.endo_x.len(), 101);
        assert_eq!(py.epi_y, pair.epi.ys());
    }
}
