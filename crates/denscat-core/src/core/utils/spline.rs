use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SplineError {
    #[error("Cubic interpolation needs at least 4 points, got {0}")]
    TooFewPoints(usize),
    #[error("Abscissa and ordinate lengths differ ({x} vs {y})")]
    LengthMismatch { x: usize, y: usize },
    #[error("Abscissae must be finite and strictly increasing (violated at index {0})")]
    NotIncreasing(usize),
}

/// Piecewise cubic interpolant with not-a-knot end conditions.
///
/// Evaluation outside `[x[0], x[n-1]]` extends the first or last cubic piece.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    x: Vec<f64>,
    // Per-interval coefficients of c0*t^3 + c1*t^2 + c2*t + c3, t = x - x[i].
    coeffs: Vec<[f64; 4]>,
}

impl CubicSpline {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, SplineError> {
        if x.len() != y.len() {
            return Err(SplineError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        let n = x.len();
        if n < 4 {
            return Err(SplineError::TooFewPoints(n));
        }
        if let Some(i) = x.iter().position(|v| !v.is_finite()) {
            return Err(SplineError::NotIncreasing(i));
        }
        if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SplineError::NotIncreasing(i + 1));
        }

        let dx: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let slope: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / dx[i]).collect();

        // Tridiagonal system for the first derivative at every knot.
        let mut lower = vec![0.0; n];
        let mut diag = vec![0.0; n];
        let mut upper = vec![0.0; n];
        let mut rhs = vec![0.0; n];

        let d = x[2] - x[0];
        diag[0] = dx[1];
        upper[0] = d;
        rhs[0] = ((dx[0] + 2.0 * d) * dx[1] * slope[0] + dx[0] * dx[0] * slope[1]) / d;

        for i in 1..n - 1 {
            lower[i] = dx[i];
            diag[i] = 2.0 * (dx[i - 1] + dx[i]);
            upper[i] = dx[i - 1];
            rhs[i] = 3.0 * (dx[i] * slope[i - 1] + dx[i - 1] * slope[i]);
        }

        let d = x[n - 1] - x[n - 3];
        lower[n - 1] = d;
        diag[n - 1] = dx[n - 3];
        rhs[n - 1] = (dx[n - 2] * dx[n - 2] * slope[n - 3]
            + (2.0 * d + dx[n - 2]) * dx[n - 3] * slope[n - 2])
            / d;

        let s = solve_tridiagonal(&lower, &mut diag, &upper, &mut rhs);

        let coeffs = (0..n - 1)
            .map(|i| {
                let t = (s[i] + s[i + 1] - 2.0 * slope[i]) / dx[i];
                [
                    t / dx[i],
                    (slope[i] - s[i]) / dx[i] - t,
                    s[i],
                    y[i],
                ]
            })
            .collect();

        Ok(Self {
            x: x.to_vec(),
            coeffs,
        })
    }

    pub fn evaluate(&self, at: f64) -> f64 {
        let last = self.coeffs.len() - 1;
        let interval = self
            .x
            .partition_point(|&knot| knot <= at)
            .saturating_sub(1)
            .min(last);
        let t = at - self.x[interval];
        let [c0, c1, c2, c3] = self.coeffs[interval];
        ((c0 * t + c1) * t + c2) * t + c3
    }

    pub fn evaluate_many(&self, at: &[f64]) -> Vec<f64> {
        at.iter().map(|&v| self.evaluate(v)).collect()
    }
}

/// Thomas algorithm. `diag` and `rhs` are overwritten; the solution is returned.
fn solve_tridiagonal(lower: &[f64], diag: &mut [f64], upper: &[f64], rhs: &mut [f64]) -> Vec<f64> {
    let n = diag.len();
    for i in 1..n {
        let w = lower[i] / diag[i - 1];
        diag[i] -= w * upper[i - 1];
        rhs[i] -= w * rhs[i - 1];
    }
    let mut solution = vec![0.0; n];
    solution[n - 1] = rhs[n - 1] / diag[n - 1];
    for i in (0..n - 1).rev() {
        solution[i] = (rhs[i] - upper[i] * solution[i + 1]) / diag[i];
    }
    solution
}

/// `points` evenly spaced values from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (points - 1) as f64;
            (0..points)
                .map(|i| if i == points - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE * (1.0 + b.abs())
    }

    #[test]
    fn reproduces_knot_values() {
        let x = [0.0, 0.5, 1.3, 2.0, 3.1, 4.0];
        let y = [1.0, -2.0, 0.7, 3.3, 2.2, -1.0];
        let spline = CubicSpline::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert!(f64_approx_equal(spline.evaluate(*xi), *yi));
        }
    }

    #[test]
    fn cubic_polynomial_is_reproduced_exactly_including_extrapolation() {
        let f = |x: f64| 2.0 * x.powi(3) - x.powi(2) + 0.5 * x - 4.0;
        let x = [-1.0, 0.0, 0.7, 1.5, 2.0, 3.5];
        let y: Vec<f64> = x.iter().map(|&v| f(v)).collect();
        let spline = CubicSpline::new(&x, &y).unwrap();
        for at in [-2.0, -0.5, 0.3, 1.1, 2.7, 4.5] {
            assert!(
                f64_approx_equal(spline.evaluate(at), f(at)),
                "mismatch at {at}"
            );
        }
    }

    #[test]
    fn four_points_determine_a_single_cubic() {
        let f = |x: f64| x.powi(3);
        let x = [0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|&v| f(v)).collect();
        let spline = CubicSpline::new(&x, &y).unwrap();
        assert!(f64_approx_equal(spline.evaluate(1.5), 3.375));
    }

    #[test]
    fn rejects_short_or_unsorted_input() {
        assert_eq!(
            CubicSpline::new(&[0.0, 1.0, 2.0], &[0.0; 3]),
            Err(SplineError::TooFewPoints(3))
        );
        assert_eq!(
            CubicSpline::new(&[0.0, 1.0, 1.0, 2.0], &[0.0; 4]),
            Err(SplineError::NotIncreasing(2))
        );
        assert_eq!(
            CubicSpline::new(&[0.0, 1.0], &[0.0; 3]),
            Err(SplineError::LengthMismatch { x: 2, y: 3 })
        );
    }

    #[test]
    fn linspace_includes_both_endpoints() {
        let values = linspace(0.0, 1.0, 5);
        assert_eq!(values, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
    }
}
