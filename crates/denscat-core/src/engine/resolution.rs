use super::config::ResolutionRequest;
use super::error::EngineError;
use super::geometry::GridGeometry;
use super::transform::ProfileCalculator;
use crate::core::models::grid::{DensityGrid, GridError, MAX_SAMPLES_PER_AXIS};
use crate::core::models::profile::Profile;
use std::f64::consts::PI;
use std::fmt;
use tracing::{info, warn};

/// A resolution request that could not be honoured as given and was clamped to the
/// current sampling instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolutionAdvisory {
    /// Fewer samples than the map already has were requested; the map is left as is.
    SampleCountBelowCurrent { requested: usize, current: usize },
    /// A coarser spacing than the map already provides was requested; the current
    /// spacing is used.
    SpacingAboveCurrent { requested: f64, current: f64 },
}

impl fmt::Display for ResolutionAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SampleCountBelowCurrent { requested, current } => write!(
                f,
                "requested {requested} samples per axis, but the map already has {current}; keeping {current}"
            ),
            Self::SpacingAboveCurrent { requested, current } => write!(
                f,
                "requested frequency spacing {requested:.6} is coarser than the current {current:.6}; keeping the current spacing"
            ),
        }
    }
}

/// Sample count that satisfies `request` for a map of `n` samples spanning `side`, with
/// the voxel size held fixed.
///
/// # Errors
///
/// Returns [`GridError::TooLarge`] when the request needs more than
/// [`MAX_SAMPLES_PER_AXIS`] samples per axis.
pub fn resolve_sample_count(
    n: usize,
    side: f64,
    request: ResolutionRequest,
) -> Result<(usize, Option<ResolutionAdvisory>), GridError> {
    match request {
        ResolutionRequest::SampleCount(requested) if requested < n => Ok((
            n,
            Some(ResolutionAdvisory::SampleCountBelowCurrent {
                requested,
                current: n,
            }),
        )),
        ResolutionRequest::SampleCount(requested) if requested > MAX_SAMPLES_PER_AXIS => {
            Err(GridError::TooLarge(requested as f64))
        }
        ResolutionRequest::SampleCount(requested) => Ok((requested, None)),
        ResolutionRequest::Spacing(requested) => {
            let current = 2.0 * PI / side;
            let (dq, advisory) = if requested > current {
                (
                    current,
                    Some(ResolutionAdvisory::SpacingAboveCurrent { requested, current }),
                )
            } else {
                (requested, None)
            };
            let voxel = side / n as f64;
            let exact = ((2.0 * PI / dq) / voxel).round();
            if !exact.is_finite() || exact > MAX_SAMPLES_PER_AXIS as f64 {
                return Err(GridError::TooLarge(exact));
            }
            let mut target = exact as usize;
            if target % 2 == 1 {
                target = target
                    .checked_add(1)
                    .filter(|&t| t <= MAX_SAMPLES_PER_AXIS)
                    .ok_or(GridError::TooLarge(exact + 1.0))?;
            }
            Ok((target.max(n), advisory))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOutcome {
    pub grid: DensityGrid,
    pub profile: Profile,
    pub advisory: Option<ResolutionAdvisory>,
}

/// Zero-pads `grid` to satisfy `request` and recomputes its profile on the enlarged
/// geometry. The result is truncated to frequencies no higher than both the new
/// per-axis maximum and the maximum of `reference`. When the sample count does not
/// change, `grid` and `reference` are returned untouched.
pub fn refine(
    grid: DensityGrid,
    request: ResolutionRequest,
    reference: &Profile,
) -> Result<ResolutionOutcome, EngineError> {
    let (target, advisory) = resolve_sample_count(grid.n(), grid.side(), request)?;
    if let Some(advisory) = &advisory {
        warn!(%advisory, "Resolution request clamped.");
    }
    if target == grid.n() {
        info!(n = target, "Resolution request leaves the grid unchanged.");
        return Ok(ResolutionOutcome {
            grid,
            profile: reference.clone(),
            advisory,
        });
    }

    let padded = grid.pad_to(target)?;
    let geometry = GridGeometry::of(&padded);
    info!(
        from = grid.n(),
        to = target,
        side = geometry.side(),
        dq = geometry.dq(),
        "Zero-padded density map."
    );

    let mut calculator = ProfileCalculator::new(geometry)?;
    let full = calculator.profile(&padded)?;
    let limit = reference
        .max_q()
        .map_or(calculator.geometry().axis_max_frequency(), |q| {
            q.min(calculator.geometry().axis_max_frequency())
        });

    Ok(ResolutionOutcome {
        grid: padded,
        profile: full.truncated(limit),
        advisory,
    })
}
