use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("Grid must have at least 2 samples per axis (got {0})")]
    TooFewSamples(usize),
    #[error("Box side length must be positive and finite (got {0})")]
    InvalidSide(f64),
    #[error("Expected {expected} density values for a cubic grid, found {actual}")]
    DataLength { expected: usize, actual: usize },
    #[error("Sampling stride must be at least 1")]
    ZeroStride,
    #[error("Cannot pad a grid of {current} samples per axis down to {requested}")]
    PadTooSmall { current: usize, requested: usize },
    #[error("A grid of {0} samples per axis exceeds the limit of {max}", max = MAX_SAMPLES_PER_AXIS)]
    TooLarge(f64),
}

/// Largest supported number of samples along one axis.
pub const MAX_SAMPLES_PER_AXIS: usize = 2048;

/// A cubic density map of `n`³ real samples spanning a box of physical length `side`.
///
/// Samples are stored in row-major order: the last index varies fastest, so
/// `(i, j, k)` lives at `(i * n + j) * n + k`.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    n: usize,
    side: f64,
    data: Vec<f64>,
}

/// Number of cells of an `n`³ grid, or `TooLarge` when `n` is past the supported limit.
pub(crate) fn cell_count(n: usize) -> Result<usize, GridError> {
    if n > MAX_SAMPLES_PER_AXIS {
        return Err(GridError::TooLarge(n as f64));
    }
    n.checked_mul(n)
        .and_then(|sq| sq.checked_mul(n))
        .ok_or(GridError::TooLarge(n as f64))
}

pub(crate) fn validate_geometry(n: usize, side: f64) -> Result<(), GridError> {
    if n < 2 {
        return Err(GridError::TooFewSamples(n));
    }
    cell_count(n)?;
    if !side.is_finite() || side <= 0.0 {
        return Err(GridError::InvalidSide(side));
    }
    Ok(())
}

impl DensityGrid {
    pub fn new(n: usize, side: f64, data: Vec<f64>) -> Result<Self, GridError> {
        validate_geometry(n, side)?;
        let expected = cell_count(n)?;
        if data.len() != expected {
            return Err(GridError::DataLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { n, side, data })
    }

    pub fn zeros(n: usize, side: f64) -> Result<Self, GridError> {
        validate_geometry(n, side)?;
        Ok(Self {
            n,
            side,
            data: vec![0.0; cell_count(n)?],
        })
    }

    pub fn from_fn<F>(n: usize, side: f64, mut f: F) -> Result<Self, GridError>
    where
        F: FnMut(usize, usize, usize) -> f64,
    {
        validate_geometry(n, side)?;
        let mut data = Vec::with_capacity(cell_count(n)?);
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    data.push(f(i, j, k));
                }
            }
        }
        Ok(Self { n, side, data })
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

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.n + j) * self.n + k
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[self.index(i, j, k)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: f64) {
        let idx = self.index(i, j, k);
        self.data[idx] = value;
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Drops the last plane along every axis when `n` is odd. The box length is kept.
    pub fn trim_to_even(self) -> Self {
        if self.n % 2 == 0 || self.n <= 2 {
            return self;
        }
        let m = self.n - 1;
        let mut data = Vec::with_capacity(m * m * m);
        for i in 0..m {
            for j in 0..m {
                let start = self.index(i, j, 0);
                data.extend_from_slice(&self.data[start..start + m]);
            }
        }
        Self {
            n: m,
            side: self.side,
            data,
        }
    }

    /// Keeps every `stride`-th sample along each axis. The box length is kept, so the
    /// voxel size grows and the highest representable frequency shrinks.
    pub fn downsample(&self, stride: usize) -> Result<Self, GridError> {
        if stride == 0 {
            return Err(GridError::ZeroStride);
        }
        if stride == 1 {
            return Ok(self.clone());
        }
        let m = self.n.div_ceil(stride);
        if m < 2 {
            return Err(GridError::TooFewSamples(m));
        }
        let mut data = Vec::with_capacity(m * m * m);
        for i in (0..self.n).step_by(stride) {
            for j in (0..self.n).step_by(stride) {
                for k in (0..self.n).step_by(stride) {
                    data.push(self.get(i, j, k));
                }
            }
        }
        Ok(Self {
            n: m,
            side: self.side,
            data,
        })
    }

    /// Zeroes every sample whose magnitude does not exceed `threshold`.
    pub fn apply_threshold(&mut self, threshold: f64) {
        for value in self.data.iter_mut() {
            if value.abs() <= threshold {
                *value = 0.0;
            }
        }
    }

    /// Embeds this grid in a zero-filled cube of `n` samples per axis at offset
    /// `n / 2 - self.n / 2`. The voxel size is preserved, so the box grows.
    pub fn pad_to(&self, n: usize) -> Result<Self, GridError> {
        if n < self.n {
            return Err(GridError::PadTooSmall {
                current: self.n,
                requested: n,
            });
        }
        if n == self.n {
            return Ok(self.clone());
        }
        cell_count(n)?;
        let side = self.voxel_size() * n as f64;
        let mut padded = Self::zeros(n, side)?;
        let offset = n / 2 - self.n / 2;
        for i in 0..self.n {
            for j in 0..self.n {
                let src = self.index(i, j, 0);
                let dst = padded.index(i + offset, j + offset, offset);
                padded.data[dst..dst + self.n].copy_from_slice(&self.data[src..src + self.n]);
            }
        }
        Ok(padded)
    }

    /// Density-weighted centroid in fractional index units, or `None` for an empty map.
    pub fn center_of_mass(&self) -> Option<[f64; 3]> {
        let total = self.total();
        if total == 0.0 || !total.is_finite() {
            return None;
        }
        let mut com = [0.0; 3];
        for i in 0..self.n {
            for j in 0..self.n {
                for k in 0..self.n {
                    let w = self.get(i, j, k);
                    com[0] += w * i as f64;
                    com[1] += w * j as f64;
                    com[2] += w * k as f64;
                }
            }
        }
        Some(com.map(|c| c / total))
    }

    /// Periodic shift: the sample at index `i` moves to `(i + shift) mod n` on each axis.
    pub fn roll(&self, shift: [isize; 3]) -> Self {
        let n = self.n as isize;
        let wrap = |idx: usize, s: isize| ((idx as isize + s).rem_euclid(n)) as usize;
        let mut data = vec![0.0; self.data.len()];
        for i in 0..self.n {
            let ti = wrap(i, shift[0]);
            for j in 0..self.n {
                let tj = wrap(j, shift[1]);
                for k in 0..self.n {
                    let tk = wrap(k, shift[2]);
                    data[(ti * self.n + tj) * self.n + tk] = self.get(i, j, k);
                }
            }
        }
        Self {
            n: self.n,
            side: self.side,
            data,
        }
    }

    /// Rolls the map so its centre of mass sits on the central voxel `n / 2`.
    pub fn centered(&self) -> Self {
        match self.center_of_mass() {
            Some(com) => {
                let center = (self.n / 2) as f64;
                let shift = com.map(|c| (center - c).round() as isize);
                self.roll(shift)
            }
            None => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> DensityGrid {
        DensityGrid::from_fn(n, 10.0, |i, j, k| (i * 100 + j * 10 + k) as f64).unwrap()
    }

    #[test]
    fn new_rejects_invalid_geometry() {
        assert_eq!(
            DensityGrid::new(1, 1.0, vec![0.0]),
            Err(GridError::TooFewSamples(1))
        );
        assert!(matches!(
            DensityGrid::new(2, 0.0, vec![0.0; 8]),
            Err(GridError::InvalidSide(_))
        ));
        assert!(matches!(
            DensityGrid::new(2, f64::NAN, vec![0.0; 8]),
            Err(GridError::InvalidSide(_))
        ));
        assert_eq!(
            DensityGrid::new(2, 1.0, vec![0.0; 7]),
            Err(GridError::DataLength {
                expected: 8,
                actual: 7
            })
        );
    }

    #[test]
    fn index_is_row_major_with_last_axis_fastest() {
        let grid = ramp(4);
        assert_eq!(grid.index(1, 2, 3), 16 + 8 + 3);
        assert_eq!(grid.get(1, 2, 3), 123.0);
    }

    #[test]
    fn trim_to_even_drops_last_plane_and_keeps_side() {
        let trimmed = ramp(5).trim_to_even();
        assert_eq!(trimmed.n(), 4);
        assert_eq!(trimmed.side(), 10.0);
        assert_eq!(trimmed.get(3, 3, 3), 333.0);
    }

    #[test]
    fn trim_to_even_leaves_even_grid_untouched() {
        let grid = ramp(4);
        assert_eq!(grid.clone().trim_to_even(), grid);
    }

    #[test]
    fn downsample_keeps_every_stride_sample() {
        let grid = ramp(6).downsample(2).unwrap();
        assert_eq!(grid.n(), 3);
        assert_eq!(grid.side(), 10.0);
        assert_eq!(grid.get(1, 2, 0), 240.0);
        assert_eq!(grid.get(2, 2, 2), 444.0);
    }

    #[test]
    fn downsample_rounds_sample_count_up() {
        let grid = ramp(5).downsample(2).unwrap();
        assert_eq!(grid.n(), 3);
        assert_eq!(grid.get(2, 2, 2), 444.0);
    }

    #[test]
    fn downsample_rejects_zero_stride_and_collapsing_grids() {
        assert_eq!(ramp(4).downsample(0), Err(GridError::ZeroStride));
        assert_eq!(ramp(4).downsample(4), Err(GridError::TooFewSamples(1)));
    }

    #[test]
    fn threshold_zeroes_small_magnitudes_including_negative_values() {
        let mut grid = DensityGrid::new(2, 1.0, vec![0.5, -0.5, 1.0, -2.0, 0.1, 0.0, 3.0, 0.49])
            .unwrap();
        grid.apply_threshold(0.5);
        assert_eq!(grid.data(), &[0.0, 0.0, 1.0, -2.0, 0.0, 0.0, 3.0, 0.0]);
    }

    #[test]
    fn pad_to_centers_original_cube_and_preserves_voxel_size() {
        let grid = DensityGrid::from_fn(4, 8.0, |_, _, _| 1.0).unwrap();
        let padded = grid.pad_to(8).unwrap();
        assert_eq!(padded.n(), 8);
        assert!((padded.voxel_size() - grid.voxel_size()).abs() < 1e-12);
        assert!((padded.side() - 16.0).abs() < 1e-12);
        assert_eq!(padded.total(), grid.total());
        assert_eq!(padded.get(2, 2, 2), 1.0);
        assert_eq!(padded.get(5, 5, 5), 1.0);
        assert_eq!(padded.get(1, 2, 2), 0.0);
        assert_eq!(padded.get(6, 5, 5), 0.0);
    }

    #[test]
    fn pad_to_rejects_shrinking() {
        assert_eq!(
            ramp(4).pad_to(2),
            Err(GridError::PadTooSmall {
                current: 4,
                requested: 2
            })
        );
    }

    #[test]
    fn oversized_grids_are_rejected_before_allocation() {
        let limit = MAX_SAMPLES_PER_AXIS;
        assert_eq!(
            DensityGrid::zeros(limit + 1, 1.0),
            Err(GridError::TooLarge((limit + 1) as f64))
        );
        assert_eq!(
            ramp(4).pad_to(usize::MAX),
            Err(GridError::TooLarge(usize::MAX as f64))
        );
        assert_eq!(cell_count(8), Ok(512));
    }

    #[test]
    fn roll_wraps_periodically() {
        let mut grid = DensityGrid::zeros(4, 1.0).unwrap();
        grid.set(3, 0, 1, 7.0);
        let rolled = grid.roll([1, -1, 2]);
        assert_eq!(rolled.get(0, 3, 3), 7.0);
        assert_eq!(rolled.total(), 7.0);
    }

    #[test]
    fn centered_moves_center_of_mass_to_grid_center() {
        let mut grid = DensityGrid::zeros(8, 1.0).unwrap();
        grid.set(1, 2, 6, 2.0);
        let centered = grid.centered();
        assert_eq!(centered.get(4, 4, 4), 2.0);
        assert_eq!(centered.center_of_mass(), Some([4.0, 4.0, 4.0]));
    }

    #[test]
    fn center_of_mass_of_empty_map_is_none() {
        assert_eq!(DensityGrid::zeros(4, 1.0).unwrap().center_of_mass(), None);
    }
}
