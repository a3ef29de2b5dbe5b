use super::geometry::GridGeometry;
use crate::core::utils::spline::linspace;
use thiserror::Error;
use tracing::debug;

/// Amount subtracted from the smallest non-zero frequency magnitude to obtain the shell
/// width, so that the first non-zero magnitude falls strictly inside its shell.
pub const SHELL_EPSILON: f64 = 1e-8;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BinError {
    #[error("Frequency grid has no non-zero magnitude")]
    NoNonZeroMagnitude,
    #[error("Shell width {0} is not positive; the box is too large for the frequency resolution")]
    NonPositiveWidth(f64),
}

/// Partition of frequency-magnitude space into equal-width spherical shells.
///
/// Edge interval `i` is `[edge[i], edge[i+1])`, with a cell's interval found as the number
/// of edges not exceeding its magnitude, minus one. Interval 0 holds only the origin
/// (the zero-frequency term), which is tracked separately; intervals `1..=K` are exposed
/// as shells `0..K`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinScheme {
    n: usize,
    width: f64,
    edges: Vec<f64>,
    intervals: Vec<u32>,
    counts: Vec<usize>,
    origin_count: usize,
    magnitudes: Vec<Option<f64>>,
}

/// Per-shell means of a per-cell quantity. `None` marks an empty shell.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellAverages {
    pub origin: Option<f64>,
    pub shells: Vec<Option<f64>>,
}

impl BinScheme {
    pub fn new(geometry: &GridGeometry) -> Result<Self, BinError> {
        Self::from_magnitudes(geometry.n(), &geometry.magnitudes())
    }

    pub(crate) fn from_magnitudes(n: usize, magnitudes: &[f64]) -> Result<Self, BinError> {
        assert_eq!(
            magnitudes.len(),
            n * n * n,
            "magnitude array does not match a {n}^3 grid"
        );
        let min_positive = magnitudes
            .iter()
            .copied()
            .filter(|&m| m > 0.0)
            .reduce(f64::min)
            .ok_or(BinError::NoNonZeroMagnitude)?;
        let max = magnitudes.iter().copied().fold(0.0, f64::max);

        let width = min_positive - SHELL_EPSILON;
        if width <= 0.0 {
            return Err(BinError::NonPositiveWidth(width));
        }
        let shell_count = (max / width).floor() as usize;
        let edges = linspace(0.0, shell_count as f64 * width, shell_count + 1);

        let mut counts = vec![0usize; shell_count + 1];
        let mut sums = vec![0.0; shell_count + 1];
        let intervals: Vec<u32> = magnitudes
            .iter()
            .map(|&m| {
                let interval = edges.partition_point(|&e| e <= m).saturating_sub(1);
                counts[interval] += 1;
                sums[interval] += m;
                interval as u32
            })
            .collect();

        let origin_count = counts[0];
        let magnitudes = counts
            .iter()
            .zip(&sums)
            .skip(1)
            .map(|(&c, &s)| (c > 0).then(|| s / c as f64))
            .collect();
        counts.remove(0);

        debug!(
            n,
            width,
            shells = shell_count,
            origin_cells = origin_count,
            "Built spherical bin scheme."
        );

        Ok(Self {
            n,
            width,
            edges,
            intervals,
            counts,
            origin_count,
            magnitudes,
        })
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Number of shells `K`.
    pub fn shell_count(&self) -> usize {
        self.counts.len()
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Number of cells with zero magnitude.
    pub fn origin_count(&self) -> usize {
        self.origin_count
    }

    /// Shell of the cell at row-major index `idx`, or `None` for the origin.
    #[inline]
    pub fn label(&self, idx: usize) -> Option<usize> {
        (self.intervals[idx] as usize).checked_sub(1)
    }

    /// Mean frequency magnitude of the cells in `shell`, `None` if the shell is empty.
    pub fn shell_magnitude(&self, shell: usize) -> Option<f64> {
        self.magnitudes[shell]
    }

    pub fn shell_magnitudes(&self) -> &[Option<f64>] {
        &self.magnitudes
    }

    /// Count-weighted mean of `values` over each shell and over the origin.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not hold one entry per cell of this scheme's grid.
    pub fn average(&self, values: &[f64]) -> ShellAverages {
        assert_eq!(
            values.len(),
            self.intervals.len(),
            "value grid does not match the {}^3 bin scheme",
            self.n
        );
        let mut sums = vec![0.0; self.counts.len() + 1];
        for (&interval, &value) in self.intervals.iter().zip(values) {
            sums[interval as usize] += value;
        }
        let origin = (self.origin_count > 0).then(|| sums[0] / self.origin_count as f64);
        let shells = self
            .counts
            .iter()
            .zip(&sums[1..])
            .map(|(&c, &s)| (c > 0).then(|| s / c as f64))
            .collect();
        ShellAverages { origin, shells }
    }
}
