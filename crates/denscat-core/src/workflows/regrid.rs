use crate::core::io::dat::LoadedProfile;
use crate::core::models::profile::Profile;
use crate::engine::config::ResampleConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::resample::resample;
use tracing::{info, instrument};

#[instrument(skip_all, name = "regrid_workflow")]
pub fn run(
    loaded: &LoadedProfile,
    config: &ResampleConfig,
    reporter: &ProgressReporter,
) -> Result<Profile, EngineError> {
    if loaded.is_fit() {
        info!("Input carries a fitted curve; only the measured columns are resampled.");
    }
    let profile = reporter.phase("Resampling", || resample(&loaded.profile, config))?;
    info!(
        input_points = loaded.profile.len(),
        output_points = profile.len(),
        "Regrid workflow complete."
    );
    Ok(profile)
}
