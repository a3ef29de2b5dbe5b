use thiserror::Error;

/// Number of target frequencies used when resampling onto a uniform grid.
pub const DEFAULT_RESAMPLE_POINTS: usize = 501;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
    #[error("Parameters '{0}' and '{1}' are mutually exclusive")]
    Conflict(&'static str, &'static str),
}

/// How the sampling of the output profile should be refined by zero-padding the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolutionRequest {
    /// Pad the map to this many samples per axis.
    SampleCount(usize),
    /// Pad the map until the frequency spacing is at most this value.
    Spacing(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileConfig {
    pub sampling_stride: usize,
    pub intensity_threshold: Option<f64>,
    pub resolution: Option<ResolutionRequest>,
    pub save_grid: bool,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            sampling_stride: 1,
            intensity_threshold: None,
            resolution: None,
            save_grid: false,
        }
    }
}

#[derive(Default)]
pub struct ProfileConfigBuilder {
    sampling_stride: Option<usize>,
    intensity_threshold: Option<f64>,
    sample_count: Option<usize>,
    spacing: Option<f64>,
    save_grid: bool,
}

impl ProfileConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sampling_stride(mut self, stride: usize) -> Self {
        self.sampling_stride = Some(stride);
        self
    }
    pub fn intensity_threshold(mut self, threshold: f64) -> Self {
        self.intensity_threshold = Some(threshold);
        self
    }
    pub fn target_sample_count(mut self, n: usize) -> Self {
        self.sample_count = Some(n);
        self
    }
    pub fn target_spacing(mut self, dq: f64) -> Self {
        self.spacing = Some(dq);
        self
    }
    pub fn save_grid(mut self, save: bool) -> Self {
        self.save_grid = save;
        self
    }

    pub fn build(self) -> Result<ProfileConfig, ConfigError> {
        let sampling_stride = self.sampling_stride.unwrap_or(1);
        if sampling_stride == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "sampling_stride",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(t) = self.intensity_threshold {
            if !t.is_finite() {
                return Err(ConfigError::InvalidValue {
                    parameter: "intensity_threshold",
                    reason: format!("{t} is not a finite number"),
                });
            }
        }
        let resolution = match (self.sample_count, self.spacing) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Conflict("target_sample_count", "target_spacing"));
            }
            (Some(n), None) => Some(ResolutionRequest::SampleCount(n)),
            (None, Some(dq)) => {
                if !dq.is_finite() || dq <= 0.0 {
                    return Err(ConfigError::InvalidValue {
                        parameter: "target_spacing",
                        reason: format!("{dq} is not a positive number"),
                    });
                }
                Some(ResolutionRequest::Spacing(dq))
            }
            (None, None) => None,
        };
        Ok(ProfileConfig {
            sampling_stride,
            intensity_threshold: self.intensity_threshold,
            resolution,
            save_grid: self.save_grid,
        })
    }
}

/// Frequencies a profile should be resampled onto.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetGrid {
    /// Caller-supplied ascending frequencies.
    Explicit(Vec<f64>),
    /// `points` evenly spaced frequencies from 0 to `qmax` (the source maximum when unset).
    Uniform { qmax: Option<f64>, points: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResampleConfig {
    pub target: TargetGrid,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            target: TargetGrid::Uniform {
                qmax: None,
                points: DEFAULT_RESAMPLE_POINTS,
            },
        }
    }
}

#[derive(Default)]
pub struct ResampleConfigBuilder {
    q_values: Option<Vec<f64>>,
    qmax: Option<f64>,
    points: Option<usize>,
}

impl ResampleConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit target frequencies; non-finite entries are dropped.
    pub fn q_values(mut self, q: Vec<f64>) -> Self {
        self.q_values = Some(q);
        self
    }
    pub fn qmax(mut self, qmax: f64) -> Self {
        self.qmax = Some(qmax);
        self
    }
    pub fn points(mut self, points: usize) -> Self {
        self.points = Some(points);
        self
    }

    pub fn build(self) -> Result<ResampleConfig, ConfigError> {
        if let Some(q) = self.q_values {
            let q: Vec<f64> = q.into_iter().filter(|v| v.is_finite()).collect();
            if q.is_empty() {
                return Err(ConfigError::InvalidValue {
                    parameter: "q_values",
                    reason: "no finite frequencies given".to_string(),
                });
            }
            return Ok(ResampleConfig {
                target: TargetGrid::Explicit(q),
            });
        }
        if let Some(qmax) = self.qmax {
            if !qmax.is_finite() || qmax <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    parameter: "qmax",
                    reason: format!("{qmax} is not a positive number"),
                });
            }
        }
        let points = self.points.unwrap_or(DEFAULT_RESAMPLE_POINTS);
        if points < 2 {
            return Err(ConfigError::InvalidValue {
                parameter: "points",
                reason: format!("need at least 2 points, got {points}"),
            });
        }
        Ok(ResampleConfig {
            target: TargetGrid::Uniform {
                qmax: self.qmax,
                points,
            },
        })
    }
}

/// Similarity score used to pick among the candidate axis orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreMetric {
    /// Pearson correlation of voxel values; larger is better.
    #[default]
    Correlation,
    /// Sum of squared voxel differences; smaller is better.
    SquaredDifference,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignConfig {
    pub metric: ScoreMetric,
}

#[derive(Default)]
pub struct AlignConfigBuilder {
    metric: Option<ScoreMetric>,
}

impl AlignConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metric(mut self, metric: ScoreMetric) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn build(self) -> Result<AlignConfig, ConfigError> {
        Ok(AlignConfig {
            metric: self.metric.unwrap_or_default(),
        })
    }
}
