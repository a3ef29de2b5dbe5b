use crate::core::models::grid::DensityGrid;
use crate::engine::alignment::{AlignmentResult, align_principal_axes};
use crate::engine::config::AlignConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use tracing::{info, instrument};

#[instrument(skip_all, name = "align_workflow")]
pub fn run(
    reference: &DensityGrid,
    moving: &DensityGrid,
    config: &AlignConfig,
    reporter: &ProgressReporter,
) -> Result<AlignmentResult, EngineError> {
    info!(
        n = moving.n(),
        side = moving.side(),
        metric = ?config.metric,
        "Aligning map to reference principal axes."
    );
    let result = reporter.phase("Principal-Axis Alignment", || {
        align_principal_axes(reference, moving, config, reporter)
    })?;
    info!(score = result.score, "Alignment workflow complete.");
    Ok(result)
}
