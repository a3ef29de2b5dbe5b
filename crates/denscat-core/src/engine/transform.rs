use super::binning::BinScheme;
use super::error::EngineError;
use super::geometry::GridGeometry;
use crate::core::models::grid::DensityGrid;
use crate::core::models::profile::{Profile, ProfileError};
use num_complex::Complex64;
use rustfft::{Fft, FftDirection, FftPlanner};
use std::sync::Arc;
use tracing::{debug, trace};

/// Value substituted for transform cells whose real part is exactly zero.
pub const ZERO_REAL_FLOOR: f64 = 1e-16;

/// Forward 3D FFT of an `n`³ row-major grid. The single 1D plan and its scratch space
/// are shared by all three axis passes.
pub struct Fft3d {
    n: usize,
    fft: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
    line: Vec<Complex64>,
}

impl Fft3d {
    pub fn new(n: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft(n, FftDirection::Forward);
        let scratch = vec![Complex64::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Self {
            n,
            fft,
            scratch,
            line: vec![Complex64::new(0.0, 0.0); n],
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// In-place unnormalised forward transform.
    ///
    /// # Panics
    ///
    /// Panics if `data` does not hold `n`³ values.
    pub fn forward(&mut self, data: &mut [Complex64]) {
        let n = self.n;
        assert_eq!(data.len(), n * n * n, "FFT buffer does not match a {n}^3 grid");

        // Last axis is contiguous.
        for row in data.chunks_exact_mut(n) {
            self.fft.process_with_scratch(row, &mut self.scratch);
        }
        self.strided_pass(data, n);
        self.strided_pass(data, n * n);
    }

    fn strided_pass(&mut self, data: &mut [Complex64], stride: usize) {
        let n = self.n;
        let block = stride * n;
        for base in (0..data.len()).step_by(block) {
            for offset in 0..stride {
                let start = base + offset;
                for (t, value) in self.line.iter_mut().enumerate() {
                    *value = data[start + t * stride];
                }
                self.fft.process_with_scratch(&mut self.line, &mut self.scratch);
                for (t, value) in self.line.iter().enumerate() {
                    data[start + t * stride] = *value;
                }
            }
        }
    }

    /// `|F|²` of a real grid. Cells whose real part is exactly zero are replaced by
    /// [`ZERO_REAL_FLOOR`] before squaring.
    pub fn intensity(&mut self, grid: &DensityGrid) -> Vec<f64> {
        let mut buffer: Vec<Complex64> = grid
            .data()
            .iter()
            .map(|&rho| Complex64::new(rho, 0.0))
            .collect();
        self.forward(&mut buffer);

        let mut floored = 0usize;
        let intensity = buffer
            .iter()
            .map(|f| {
                if f.re == 0.0 {
                    floored += 1;
                    ZERO_REAL_FLOOR * ZERO_REAL_FLOOR
                } else {
                    f.norm_sqr()
                }
            })
            .collect();
        trace!(floored, "Applied zero-real floor to transform cells.");
        intensity
    }
}

/// Turns per-cell intensities into a profile: the origin first (frequency 0), then one
/// point per non-empty shell at the shell's mean magnitude.
///
/// # Panics
///
/// Panics if `intensity` does not match the grid `bins` was built for.
pub fn aggregate(bins: &BinScheme, intensity: &[f64]) -> Result<Profile, ProfileError> {
    let averages = bins.average(intensity);
    let mut q = Vec::with_capacity(bins.shell_count() + 1);
    let mut values = Vec::with_capacity(bins.shell_count() + 1);

    if let Some(origin) = averages.origin {
        q.push(0.0);
        values.push(origin);
    }
    for (magnitude, mean) in bins.shell_magnitudes().iter().zip(&averages.shells) {
        if let (Some(m), Some(i)) = (magnitude, mean) {
            q.push(*m);
            values.push(*i);
        }
    }
    Profile::new(q, values, None)
}

/// Geometry, bin scheme and FFT workspace for one grid shape, reusable across grids of
/// that shape.
pub struct ProfileCalculator {
    geometry: GridGeometry,
    bins: BinScheme,
    fft: Fft3d,
}

impl ProfileCalculator {
    pub fn new(geometry: GridGeometry) -> Result<Self, EngineError> {
        let bins = BinScheme::new(&geometry)?;
        let fft = Fft3d::new(geometry.n());
        Ok(Self {
            geometry,
            bins,
            fft,
        })
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn bins(&self) -> &BinScheme {
        &self.bins
    }

    pub fn intensity(&mut self, grid: &DensityGrid) -> Vec<f64> {
        self.fft.intensity(grid)
    }

    /// # Panics
    ///
    /// Panics if `grid` has a different sample count than this calculator.
    pub fn profile(&mut self, grid: &DensityGrid) -> Result<Profile, EngineError> {
        let intensity = self.fft.intensity(grid);
        let profile = aggregate(&self.bins, &intensity)?;
        debug!(
            n = self.geometry.n(),
            points = profile.len(),
            "Aggregated scattering profile."
        );
        Ok(profile)
    }
}

/// One-shot profile of `grid` on its own geometry.
pub fn compute_profile(grid: &DensityGrid) -> Result<Profile, EngineError> {
    ProfileCalculator::new(GridGeometry::of(grid))?.profile(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const TOLERANCE: f64 = 1e-9;

    fn naive_dft(grid: &DensityGrid) -> Vec<Complex64> {
        let n = grid.n();
        let mut out = vec![Complex64::new(0.0, 0.0); n * n * n];
        for u in 0..n {
            for v in 0..n {
                for w in 0..n {
                    let mut acc = Complex64::new(0.0, 0.0);
                    for i in 0..n {
                        for j in 0..n {
                            for k in 0..n {
                                let phase = -2.0 * PI * ((u * i + v * j + w * k) as f64) / n as f64;
                                acc += Complex64::from_polar(grid.get(i, j, k), phase);
                            }
                        }
                    }
                    out[grid.index(u, v, w)] = acc;
                }
            }
        }
        out
    }

    #[test]
    fn forward_matches_direct_summation() {
        let grid = DensityGrid::from_fn(4, 10.0, |i, j, k| {
            ((i * 7 + j * 3 + k) % 5) as f64 - 1.5 * (k as f64)
        })
        .unwrap();
        let expected = naive_dft(&grid);
        let mut buffer: Vec<Complex64> =
            grid.data().iter().map(|&v| Complex64::new(v, 0.0)).collect();
        Fft3d::new(4).forward(&mut buffer);
        for (a, b) in buffer.iter().zip(&expected) {
            assert!((a - b).norm() < TOLERANCE);
        }
    }

    #[test]
    fn uniform_map_concentrates_intensity_at_origin() {
        let grid = DensityGrid::from_fn(4, 4.0, |_, _, _| 1.0).unwrap();
        let intensity = Fft3d::new(4).intensity(&grid);
        assert!((intensity[0] - 64.0 * 64.0).abs() < TOLERANCE);
        assert!(intensity[1..].iter().all(|&i| i < 1e-20));
    }

    #[test]
    fn point_source_gives_flat_profile() {
        let mut grid = DensityGrid::zeros(32, 64.0).unwrap();
        grid.set(16, 16, 16, 1.0);
        let profile = compute_profile(&grid).unwrap();
        assert_eq!(profile.q()[0], 0.0);
        assert!(profile.len() > 10);
        for &i in profile.intensity() {
            assert!((i - 1.0).abs() < 1e-9, "intensity {i} is not flat");
        }
    }

    #[test]
    fn profile_frequencies_ascend_from_origin() {
        let grid = DensityGrid::from_fn(8, 30.0, |i, j, k| ((i + j * k) % 3) as f64).unwrap();
        let profile = compute_profile(&grid).unwrap();
        assert_eq!(profile.q()[0], 0.0);
        assert!(profile.q().windows(2).all(|w| w[1] > w[0]));
        assert!((profile.intensity()[0] - grid.total().powi(2)).abs() < 1e-6);
    }

    #[test]
    fn repeated_aggregation_is_identical() {
        let grid = DensityGrid::from_fn(6, 20.0, |i, j, k| (i * j + k) as f64 * 0.1).unwrap();
        let mut calculator = ProfileCalculator::new(GridGeometry::of(&grid)).unwrap();
        let intensity = calculator.intensity(&grid);
        let first = aggregate(calculator.bins(), &intensity).unwrap();
        let second = aggregate(calculator.bins(), &intensity).unwrap();
        assert_eq!(first, second);
        assert_eq!(calculator.profile(&grid).unwrap(), first);
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn mismatched_bin_scheme_panics() {
        let bins = BinScheme::new(&GridGeometry::new(4, 10.0).unwrap()).unwrap();
        let _ = aggregate(&bins, &[1.0; 125]);
    }
}
