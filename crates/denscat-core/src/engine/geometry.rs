use crate::core::models::grid::{DensityGrid, GridError, validate_geometry};
use crate::core::utils::spline::linspace;
use std::f64::consts::PI;

/// Real- and reciprocal-space sampling of a cubic box of `n` voxels per side.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    n: usize,
    side: f64,
}

impl GridGeometry {
    pub fn new(n: usize, side: f64) -> Result<Self, GridError> {
        validate_geometry(n, side)?;
        Ok(Self { n, side })
    }

    pub fn of(grid: &DensityGrid) -> Self {
        Self {
            n: grid.n(),
            side: grid.side(),
        }
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn side(&self) -> f64 {
        self.side
    }

    #[inline]
    pub fn voxel_size(&self) -> f64 {
        self.side / self.n as f64
    }

    /// Spacing of the frequency axis, `2π / side`.
    #[inline]
    pub fn dq(&self) -> f64 {
        2.0 * PI / self.side
    }

    /// `n` positions from `-side/2` to `side/2`, both ends included.
    pub fn real_axis(&self) -> Vec<f64> {
        linspace(-self.side / 2.0, self.side / 2.0, self.n)
    }

    /// Angular frequencies in FFT order: `0, 1, ..., ceil(n/2)-1, -floor(n/2), ..., -1`
    /// times `dq`.
    pub fn frequency_axis(&self) -> Vec<f64> {
        let dq = self.dq();
        fft_index_order(self.n)
            .map(|k| k as f64 * dq)
            .collect()
    }

    /// The `floor(n/2) + 1` non-negative frequencies kept by a real-input transform.
    pub fn half_frequency_axis(&self) -> Vec<f64> {
        let dq = self.dq();
        (0..=self.n / 2).map(|k| k as f64 * dq).collect()
    }

    /// Largest entry of the full frequency axis.
    pub fn axis_max_frequency(&self) -> f64 {
        ((self.n - 1) / 2) as f64 * self.dq()
    }

    /// Frequency magnitude of every cell of the full `n`³ grid, row-major.
    pub fn magnitudes(&self) -> Vec<f64> {
        let axis = self.frequency_axis();
        let squares: Vec<f64> = axis.iter().map(|f| f * f).collect();
        let mut out = Vec::with_capacity(self.n * self.n * self.n);
        for &x2 in &squares {
            for &y2 in &squares {
                for &z2 in &squares {
                    out.push((x2 + y2 + z2).sqrt());
                }
            }
        }
        out
    }
}

fn fft_index_order(n: usize) -> impl Iterator<Item = isize> {
    let positive = n.div_ceil(2) as isize;
    (0..positive).chain(-((n / 2) as isize)..0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn rejects_invalid_geometry() {
        assert_eq!(GridGeometry::new(1, 1.0), Err(GridError::TooFewSamples(1)));
        assert!(matches!(
            GridGeometry::new(4, -2.0),
            Err(GridError::InvalidSide(_))
        ));
        assert!(matches!(
            GridGeometry::new(4, f64::INFINITY),
            Err(GridError::InvalidSide(_))
        ));
    }

    #[test]
    fn frequency_axis_follows_fft_ordering() {
        let even = GridGeometry::new(4, 2.0 * PI).unwrap();
        assert_eq!(even.frequency_axis(), vec![0.0, 1.0, -2.0, -1.0]);
        let odd = GridGeometry::new(5, 2.0 * PI).unwrap();
        assert_eq!(odd.frequency_axis(), vec![0.0, 1.0, 2.0, -2.0, -1.0]);
        assert_eq!(odd.half_frequency_axis(), vec![0.0, 1.0, 2.0]);
        assert_eq!(even.half_frequency_axis(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn spacing_depends_only_on_box_length() {
        for n in [4usize, 6, 8, 16, 32] {
            let geometry = GridGeometry::new(n, 50.0).unwrap();
            let axis = geometry.frequency_axis();
            assert!(f64_approx_equal(axis[1] - axis[0], 2.0 * PI / 50.0));
            assert!(f64_approx_equal(geometry.dq(), 2.0 * PI / 50.0));
        }
    }

    #[test]
    fn axis_max_is_largest_axis_entry() {
        for n in [2usize, 3, 4, 7, 8] {
            let geometry = GridGeometry::new(n, 10.0).unwrap();
            let max = geometry
                .frequency_axis()
                .into_iter()
                .fold(f64::NEG_INFINITY, f64::max);
            assert!(f64_approx_equal(geometry.axis_max_frequency(), max));
        }
    }

    #[test]
    fn real_axis_spans_box_with_endpoints() {
        let geometry = GridGeometry::new(5, 10.0).unwrap();
        assert_eq!(geometry.real_axis(), vec![-5.0, -2.5, 0.0, 2.5, 5.0]);
        assert!(f64_approx_equal(geometry.voxel_size(), 2.0));
    }

    #[test]
    fn magnitudes_cover_full_grid() {
        let geometry = GridGeometry::new(4, 2.0 * PI).unwrap();
        let magnitudes = geometry.magnitudes();
        assert_eq!(magnitudes.len(), 64);
        assert_eq!(magnitudes[0], 0.0);
        // (1, 2, 3) -> frequencies (1, -2, -1)
        assert!(f64_approx_equal(magnitudes[16 + 8 + 3], 6f64.sqrt()));
        assert_eq!(magnitudes.iter().filter(|&&m| m == 0.0).count(), 1);
    }
}
