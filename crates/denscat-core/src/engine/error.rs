use thiserror::Error;

use super::alignment::AlignError;
use super::binning::BinError;
use super::config::ConfigError;
use super::resample::ResampleError;
use crate::core::models::grid::GridError;
use crate::core::models::profile::ProfileError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid grid geometry: {source}")]
    Geometry {
        #[from]
        source: GridError,
    },

    #[error("Failed to build the shell bin scheme: {source}")]
    Binning {
        #[from]
        source: BinError,
    },

    #[error("Invalid profile: {source}")]
    Profile {
        #[from]
        source: ProfileError,
    },

    #[error("Profile resampling failed: {source}")]
    Resample {
        #[from]
        source: ResampleError,
    },

    #[error("Principal-axis alignment failed: {source}")]
    Alignment {
        #[from]
        source: AlignError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}
