use super::config::{ResampleConfig, TargetGrid};
use crate::core::models::profile::{Profile, ProfileError};
use crate::core::utils::spline::{CubicSpline, SplineError, linspace};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResampleError {
    #[error("Only {0} usable rows remain after filtering; at least 4 are needed")]
    TooFewPoints(usize),
    #[error("Spline construction failed: {0}")]
    Spline(#[from] SplineError),
    #[error("Invalid target grid: {0}")]
    Target(#[from] ProfileError),
}

/// Interpolates `source` onto the frequencies described by `config`.
///
/// Unusable rows (non-finite values, zero intensity or zero uncertainty) are discarded
/// first. Intensity and uncertainty are splined independently and extrapolated beyond
/// the source range; the result is then cut at the smaller of the source and target
/// maxima.
pub fn resample(source: &Profile, config: &ResampleConfig) -> Result<Profile, ResampleError> {
    let clean = source.retain_usable();
    if clean.len() < 4 {
        return Err(ResampleError::TooFewPoints(clean.len()));
    }
    let source_max = clean.max_q().unwrap_or(0.0);

    let target = match &config.target {
        TargetGrid::Explicit(q) => q.clone(),
        TargetGrid::Uniform { qmax, points } => {
            linspace(0.0, qmax.unwrap_or(source_max), *points)
        }
    };

    let intensity = CubicSpline::new(clean.q(), clean.intensity())?.evaluate_many(&target);
    let sigma = clean
        .sigma()
        .map(|s| CubicSpline::new(clean.q(), s).map(|spline| spline.evaluate_many(&target)))
        .transpose()?;

    let resampled = Profile::new(target, intensity, sigma)?;
    let limit = resampled
        .max_q()
        .map_or(source_max, |target_max| target_max.min(source_max));

    debug!(
        source_points = clean.len(),
        target_points = resampled.len(),
        limit,
        "Resampled profile."
    );
    Ok(resampled.truncated(limit))
}
