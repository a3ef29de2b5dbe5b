use crate::core::models::grid::DensityGrid;
use crate::core::models::profile::Profile;
use crate::engine::config::ProfileConfig;
use crate::engine::error::EngineError;
use crate::engine::geometry::GridGeometry;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::resolution::{self, ResolutionAdvisory};
use crate::engine::transform::ProfileCalculator;
use tracing::{info, instrument};

/// Fraction of the forward-scattering intensity used as the constant uncertainty column
/// of a computed profile.
pub const PLACEHOLDER_SIGMA_FRACTION: f64 = 0.03;

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileResult {
    /// Profile of the preprocessed map on its own geometry, before any padding.
    pub baseline: Profile,
    /// Final profile, including the placeholder uncertainty column.
    pub profile: Profile,
    /// The map that produced `profile`, kept when the configuration asks for it.
    pub grid: Option<DensityGrid>,
    pub advisory: Option<ResolutionAdvisory>,
}

#[instrument(skip_all, name = "profile_workflow")]
pub fn run(
    grid: DensityGrid,
    config: &ProfileConfig,
    reporter: &ProgressReporter,
) -> Result<ProfileResult, EngineError> {
    // === Phase 1: Preprocessing ===
    let grid = reporter.phase("Preprocessing", || preprocess(grid, config))?;

    // === Phase 2: Baseline transform ===
    let baseline = reporter.phase("Transform", || {
        let mut calculator = ProfileCalculator::new(GridGeometry::of(&grid))?;
        let limit = calculator.geometry().axis_max_frequency();
        info!(
            n = grid.n(),
            side = grid.side(),
            dq = calculator.geometry().dq(),
            qmax = limit,
            "Computing baseline profile."
        );
        Ok::<_, EngineError>(calculator.profile(&grid)?.truncated(limit))
    })?;

    // === Phase 3: Resolution control (optional) ===
    let (grid, profile, advisory) = match config.resolution {
        Some(request) => {
            let outcome =
                reporter.phase("Resolution", || resolution::refine(grid, request, &baseline))?;
            if let Some(advisory) = &outcome.advisory {
                reporter.report(Progress::Message(advisory.to_string()));
            }
            (outcome.grid, outcome.profile, outcome.advisory)
        }
        None => (grid, baseline.clone(), None),
    };

    let profile = profile.with_placeholder_uncertainty(PLACEHOLDER_SIGMA_FRACTION);
    info!(
        points = profile.len(),
        n = grid.n(),
        "Profile workflow complete."
    );

    Ok(ProfileResult {
        baseline,
        profile,
        grid: config.save_grid.then_some(grid),
        advisory,
    })
}

/// Trims to an even sample count, downsamples and thresholds the map.
fn preprocess(grid: DensityGrid, config: &ProfileConfig) -> Result<DensityGrid, EngineError> {
    let original_n = grid.n();
    let mut grid = grid.trim_to_even().downsample(config.sampling_stride)?;
    if let Some(threshold) = config.intensity_threshold {
        grid.apply_threshold(threshold);
    }
    info!(
        from = original_n,
        to = grid.n(),
        stride = config.sampling_stride,
        "Preprocessed density map."
    );
    Ok(grid)
}
