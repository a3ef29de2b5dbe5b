use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    #[error("Column lengths differ: {q} frequencies but {intensity} intensities")]
    LengthMismatch { q: usize, intensity: usize },
    #[error("Uncertainty column has {actual} values, expected {expected}")]
    UncertaintyLength { expected: usize, actual: usize },
    #[error("Frequencies must be in ascending order (violated at row {0})")]
    NotAscending(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilePoint {
    pub q: f64,
    pub intensity: f64,
    pub sigma: Option<f64>,
}

/// An isotropic scattering profile: intensity (and optionally its uncertainty) sampled
/// at ascending frequency magnitudes.
///
/// Rows holding NaN are tolerated here; consumers that need clean data filter them
/// with [`Profile::retain_usable`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Profile {
    q: Vec<f64>,
    intensity: Vec<f64>,
    sigma: Option<Vec<f64>>,
}

impl Profile {
    pub fn new(
        q: Vec<f64>,
        intensity: Vec<f64>,
        sigma: Option<Vec<f64>>,
    ) -> Result<Self, ProfileError> {
        if q.len() != intensity.len() {
            return Err(ProfileError::LengthMismatch {
                q: q.len(),
                intensity: intensity.len(),
            });
        }
        if let Some(s) = &sigma {
            if s.len() != q.len() {
                return Err(ProfileError::UncertaintyLength {
                    expected: q.len(),
                    actual: s.len(),
                });
            }
        }
        if let Some(pos) = q.windows(2).position(|w| w[1] < w[0]) {
            return Err(ProfileError::NotAscending(pos + 1));
        }
        Ok(Self {
            q,
            intensity,
            sigma,
        })
    }

    pub fn q(&self) -> &[f64] {
        &self.q
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    pub fn sigma(&self) -> Option<&[f64]> {
        self.sigma.as_deref()
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn max_q(&self) -> Option<f64> {
        self.q.iter().copied().filter(|q| q.is_finite()).reduce(f64::max)
    }

    pub fn points(&self) -> impl Iterator<Item = ProfilePoint> + '_ {
        (0..self.len()).map(move |i| ProfilePoint {
            q: self.q[i],
            intensity: self.intensity[i],
            sigma: self.sigma.as_ref().map(|s| s[i]),
        })
    }

    /// Smallest gap between consecutive frequencies.
    pub fn min_spacing(&self) -> Option<f64> {
        self.q.windows(2).map(|w| w[1] - w[0]).reduce(f64::min)
    }

    /// Keeps the rows with `q <= q_limit`.
    pub fn truncated(&self, q_limit: f64) -> Self {
        self.filtered(|p| p.q <= q_limit)
    }

    /// Drops rows with a non-finite value in any column, or with an exactly-zero
    /// intensity or uncertainty.
    pub fn retain_usable(&self) -> Self {
        self.filtered(|p| {
            let sigma_ok = p.sigma.is_none_or(|s| s.is_finite() && s != 0.0);
            p.q.is_finite() && p.intensity.is_finite() && p.intensity != 0.0 && sigma_ok
        })
    }

    /// Replaces the uncertainty column with a constant `fraction` of the first intensity.
    /// Used when a computed profile has no experimental error estimate.
    pub fn with_placeholder_uncertainty(mut self, fraction: f64) -> Self {
        if let Some(&first) = self.intensity.first() {
            self.sigma = Some(vec![first * fraction; self.intensity.len()]);
        }
        self
    }

    fn filtered<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&ProfilePoint) -> bool,
    {
        let mut q = Vec::new();
        let mut intensity = Vec::new();
        let mut sigma = self.sigma.as_ref().map(|_| Vec::new());
        for point in self.points().filter(|p| keep(p)) {
            q.push(point.q);
            intensity.push(point.intensity);
            if let (Some(column), Some(value)) = (sigma.as_mut(), point.sigma) {
                column.push(value);
            }
        }
        Self {
            q,
            intensity,
            sigma,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Profile {
        Profile::new(
            vec![0.0, 0.1, 0.2, 0.3],
            vec![10.0, 8.0, 0.0, 2.0],
            Some(vec![1.0, f64::NAN, 0.5, 0.2]),
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_mismatched_columns() {
        assert_eq!(
            Profile::new(vec![0.0, 1.0], vec![1.0], None),
            Err(ProfileError::LengthMismatch { q: 2, intensity: 1 })
        );
        assert_eq!(
            Profile::new(vec![0.0], vec![1.0], Some(vec![])),
            Err(ProfileError::UncertaintyLength {
                expected: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn new_rejects_descending_frequencies() {
        assert_eq!(
            Profile::new(vec![0.0, 0.2, 0.1], vec![1.0; 3], None),
            Err(ProfileError::NotAscending(2))
        );
    }

    #[test]
    fn new_tolerates_nan_rows() {
        let profile = Profile::new(vec![0.0, f64::NAN, 0.2], vec![1.0; 3], None).unwrap();
        assert_eq!(profile.len(), 3);
        assert_eq!(profile.max_q(), Some(0.2));
    }

    #[test]
    fn truncated_keeps_rows_at_or_below_limit() {
        let truncated = sample().truncated(0.2);
        assert_eq!(truncated.q(), &[0.0, 0.1, 0.2]);
        assert_eq!(truncated.sigma().unwrap().len(), 3);
    }

    #[test]
    fn retain_usable_drops_nan_and_zero_rows() {
        let clean = sample().retain_usable();
        assert_eq!(clean.q(), &[0.0, 0.3]);
        assert_eq!(clean.intensity(), &[10.0, 2.0]);
        assert_eq!(clean.sigma(), Some([1.0, 0.2].as_slice()));
    }

    #[test]
    fn placeholder_uncertainty_scales_first_intensity() {
        let profile = Profile::new(vec![0.0, 0.1], vec![200.0, 50.0], None)
            .unwrap()
            .with_placeholder_uncertainty(0.03);
        let sigma = profile.sigma().unwrap();
        assert_eq!(sigma.len(), 2);
        assert!(sigma.iter().all(|s| (s - 6.0).abs() < 1e-12));
    }

    #[test]
    fn min_spacing_reports_smallest_gap() {
        let profile = Profile::new(vec![0.0, 0.5, 0.7, 1.5], vec![1.0; 4], None).unwrap();
        assert!((profile.min_spacing().unwrap() - 0.2).abs() < 1e-12);
    }
}
