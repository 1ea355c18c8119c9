use log::warn;
use nalgebra::{DMatrix, Point2, Vector2};

use crate::error::ContourError;

/// End condition of an interpolating cubic spline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closure {
    /// Curve wraps around: value, slope and curvature match at u = 0 and u = 1.
    Periodic,
    /// Open curve with not-a-knot ends (third derivative continuous at the
    /// second and second-to-last knots).
    Open,
}

/// Cubic piece on `[knot_i, knot_i+1]`: `a + b*dt + c*dt^2 + d*dt^3`.
#[derive(Debug, Clone, Copy)]
struct Piece {
    a: Vector2<f64>,
    b: Vector2<f64>,
    c: Vector2<f64>,
    d: Vector2<f64>,
}

/// Interpolating parametric cubic spline through an ordered point set.
///
/// Parameters follow accumulated chord length normalised to `[0, 1]`, with a
/// knot at every data point. For `Closure::Periodic` the last point must
/// repeat the first one.
#[derive(Debug, Clone)]
pub struct ParametricSpline {
    knots: Vec<f64>,
    pieces: Vec<Piece>,
    closure: Closure,
}

/// Smallest number of data points (closure duplicate included) a cubic fit accepts.
pub const MIN_FIT_POINTS: usize = 4;

impl ParametricSpline {
    /// expects: ordered points, already origin-corrected
    /// returns: spline passing through every point
    pub fn fit(
        points: &[Point2<f64>],
        closure: Closure,
        boundary: &'static str,
    ) -> Result<Self, ContourError> {
        if points.len() < MIN_FIT_POINTS {
            return Err(ContourError::degenerate(
                boundary,
                format!(
                    "a cubic fit needs at least {} points, got {}",
                    MIN_FIT_POINTS,
                    points.len()
                ),
            ));
        }
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(ContourError::degenerate(boundary, "non-finite coordinate"));
        }

        let mut points = points.to_vec();
        if closure == Closure::Periodic {
            let n = points.len();
            if points[n - 1] != points[0] {
                warn!(
                    "{} periodic fit: last point {:?} replaced by first point {:?}",
                    boundary,
                    points[n - 1],
                    points[0]
                );
                points[n - 1] = points[0];
            }
        }

        let knots = chord_parameters(&points, boundary)?;
        let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();
        let slopes: Vec<Vector2<f64>> = points
            .windows(2)
            .zip(h.iter())
            .map(|(w, &hi)| (w[1] - w[0]) / hi)
            .collect();

        let second = match closure {
            Closure::Open => open_second_derivatives(&h, &slopes),
            Closure::Periodic => periodic_second_derivatives(&h, &slopes),
        }
        .ok_or_else(|| ContourError::degenerate(boundary, "singular spline system"))?;

        let pieces = (0..h.len())
            .map(|i| {
                let hi = h[i];
                let (m0, m1) = (second[i], second[i + 1]);
                Piece {
                    a: points[i].coords,
                    b: slopes[i] - (m0 * 2.0 + m1) * (hi / 6.0),
                    c: m0 / 2.0,
                    d: (m1 - m0) / (6.0 * hi),
                }
            })
            .collect();

        Ok(Self {
            knots,
            pieces,
            closure,
        })
    }

    /// Normalised parameter of each data point.
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn eval(&self, t: f64) -> Point2<f64> {
        let (piece, dt) = self.locate(t);
        Point2::from(piece.a + (piece.b + (piece.c + piece.d * dt) * dt) * dt)
    }

    /// First derivative with respect to the normalised parameter.
    pub fn derivative(&self, t: f64) -> Vector2<f64> {
        let (piece, dt) = self.locate(t);
        piece.b + (piece.c * 2.0 + piece.d * (3.0 * dt)) * dt
    }

    fn locate(&self, t: f64) -> (&Piece, f64) {
        let t = match self.closure {
            Closure::Periodic if !(0.0..=1.0).contains(&t) => t.rem_euclid(1.0),
            // open curves extrapolate with their end pieces
            _ => t,
        };
        let idx = self
            .knots
            .partition_point(|&k| k <= t)
            .saturating_sub(1)
            .min(self.pieces.len() - 1);
        (&self.pieces[idx], t - self.knots[idx])
    }
}

/// Accumulated chord length, normalised so the last parameter is 1.
fn chord_parameters(points: &[Point2<f64>], boundary: &'static str) -> Result<Vec<f64>, ContourError> {
    let mut u = Vec::with_capacity(points.len());
    u.push(0.0);
    let mut total = 0.0;
    for (i, w) in points.windows(2).enumerate() {
        let step = (w[1] - w[0]).norm();
        if !(step > 0.0) {
            return Err(ContourError::degenerate(
                boundary,
                format!("points {} and {} coincide", i, i + 1),
            ));
        }
        total += step;
        u.push(total);
    }
    for v in u.iter_mut() {
        *v /= total;
    }
    Ok(u)
}

fn solve(a: DMatrix<f64>, rhs: DMatrix<f64>) -> Option<DMatrix<f64>> {
    let x = a.lu().solve(&rhs)?;
    x.iter().all(|v| v.is_finite()).then_some(x)
}

fn rows_to_vectors(x: &DMatrix<f64>) -> Vec<Vector2<f64>> {
    (0..x.nrows())
        .map(|i| Vector2::new(x[(i, 0)], x[(i, 1)]))
        .collect()
}

/// Second derivatives at every knot, not-a-knot ends.
fn open_second_derivatives(h: &[f64], slopes: &[Vector2<f64>]) -> Option<Vec<Vector2<f64>>> {
    let n = h.len() + 1;
    let mut a = DMatrix::<f64>::zeros(n, n);
    let mut rhs = DMatrix::<f64>::zeros(n, 2);

    a[(0, 0)] = h[1];
    a[(0, 1)] = -(h[0] + h[1]);
    a[(0, 2)] = h[0];
    for i in 1..n - 1 {
        a[(i, i - 1)] = h[i - 1];
        a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
        a[(i, i + 1)] = h[i];
        let r = (slopes[i] - slopes[i - 1]) * 6.0;
        rhs[(i, 0)] = r.x;
        rhs[(i, 1)] = r.y;
    }
    a[(n - 1, n - 3)] = h[n - 2];
    a[(n - 1, n - 2)] = -(h[n - 3] + h[n - 2]);
    a[(n - 1, n - 1)] = h[n - 3];

    solve(a, rhs).map(|x| rows_to_vectors(&x))
}

/// Second derivatives at every knot of a closed curve; the last knot repeats the first.
fn periodic_second_derivatives(h: &[f64], slopes: &[Vector2<f64>]) -> Option<Vec<Vector2<f64>>> {
    let k = h.len();
    let mut a = DMatrix::<f64>::zeros(k, k);
    let mut rhs = DMatrix::<f64>::zeros(k, 2);

    for i in 0..k {
        let prev = (i + k - 1) % k;
        let next = (i + 1) % k;
        a[(i, prev)] += h[prev];
        a[(i, i)] += 2.0 * (h[prev] + h[i]);
        a[(i, next)] += h[i];
        let r = (slopes[i] - slopes[prev]) * 6.0;
        rhs[(i, 0)] = r.x;
        rhs[(i, 1)] = r.y;
    }

    let mut second = rows_to_vectors(&solve(a, rhs)?);
    second.push(second[0]);
    Some(second)
}
