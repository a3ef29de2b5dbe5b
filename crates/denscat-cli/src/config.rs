use crate::cli::{AlignArgs, MetricChoice, ProfileArgs, RegridArgs};
use crate::error::{CliError, Result};
use clap::ValueEnum;
use denscat::core::io::dat::{DatFile, Units};
use denscat::engine::config as core_config;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialProfileConfig {
    #[serde(rename = "sampling-stride")]
    sampling_stride: Option<usize>,
    threshold: Option<f64>,
    dq: Option<f64>,
    samples: Option<usize>,
    #[serde(rename = "save-mrc")]
    save_mrc: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialRegridConfig {
    #[serde(rename = "q-file")]
    q_file: Option<PathBuf>,
    qmax: Option<f64>,
    points: Option<usize>,
    units: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialAlignConfig {
    metric: Option<MetricChoice>,
}

/// Settings read from an optional TOML file. Every section and key may be omitted;
/// command-line flags take priority over file values.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    profile: Option<PartialProfileConfig>,
    regrid: Option<PartialRegridConfig>,
    align: Option<PartialAlignConfig>,
}

/// Everything the `regrid` command needs besides the input path.
#[derive(Debug, Clone, PartialEq)]
pub struct RegridSettings {
    pub resample: core_config::ResampleConfig,
    pub units: Units,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads the file when one was given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_profile(mut self, args: &ProfileArgs) -> Result<core_config::ProfileConfig> {
        self.apply_set_values(&args.set_values)?;
        let file = self.profile.take().unwrap_or_default();

        let mut builder = core_config::ProfileConfigBuilder::new()
            .sampling_stride(args.sampling_stride.or(file.sampling_stride).unwrap_or(1))
            .save_grid(args.save_mrc || file.save_mrc.unwrap_or(false));

        if let Some(threshold) = args.threshold.or(file.threshold) {
            builder = builder.intensity_threshold(threshold);
        }

        // A sample count wins over a spacing from the same source; flags win over the file.
        let (sample_count, spacing) = if args.sample_count.is_some() || args.dq.is_some() {
            (args.sample_count, args.dq)
        } else {
            (file.samples, file.dq)
        };
        builder = match (sample_count, spacing) {
            (Some(n), ignored) => {
                if ignored.is_some() {
                    warn!(samples = n, "Both a sample count and a spacing were given; ignoring the spacing.");
                }
                builder.target_sample_count(n)
            }
            (None, Some(dq)) => builder.target_spacing(dq),
            (None, None) => builder,
        };

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn merge_regrid(mut self, args: &RegridArgs) -> Result<RegridSettings> {
        self.apply_set_values(&args.set_values)?;
        let file = self.regrid.take().unwrap_or_default();

        let units = match args.units.as_ref().or(file.units.as_ref()) {
            Some(text) => Units::from_str(text).map_err(|e| CliError::Argument(e.to_string()))?,
            None => Units::default(),
        };

        let mut builder = core_config::ResampleConfigBuilder::new();
        if let Some(path) = args.q_file.as_ref().or(file.q_file.as_ref()) {
            debug!("Reading target frequencies from {:?}", path);
            let q = DatFile::load_q_values(path).map_err(|e| CliError::FileParsing {
                path: path.clone(),
                source: e.into(),
            })?;
            builder = builder.q_values(q);
        }
        if let Some(qmax) = args.qmax.or(file.qmax) {
            builder = builder.qmax(qmax);
        }
        if let Some(points) = args.points.or(file.points) {
            builder = builder.points(points);
        }

        let resample = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(RegridSettings { resample, units })
    }

    pub fn merge_align(mut self, args: &AlignArgs) -> Result<core_config::AlignConfig> {
        self.apply_set_values(&args.set_values)?;
        let file = self.align.take().unwrap_or_default();

        let mut builder = core_config::AlignConfigBuilder::new();
        if let Some(metric) = args.metric.or(file.metric) {
            builder = builder.metric(metric.into());
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "profile.sampling-stride" => {
                    self.profile_mut().sampling_stride = Some(parse_int(key, value_str)?);
                }
                "profile.threshold" => {
                    self.profile_mut().threshold = Some(parse_float(key, value_str)?);
                }
                "profile.dq" => {
                    self.profile_mut().dq = Some(parse_float(key, value_str)?);
                }
                "profile.samples" => {
                    self.profile_mut().samples = Some(parse_int(key, value_str)?);
                }
                "profile.save-mrc" => {
                    self.profile_mut().save_mrc = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!("Invalid boolean value for {}: {}", key, value_str))
                    })?);
                }
                "regrid.q-file" => {
                    self.regrid_mut().q_file = Some(PathBuf::from(value_str));
                }
                "regrid.qmax" => {
                    self.regrid_mut().qmax = Some(parse_float(key, value_str)?);
                }
                "regrid.points" => {
                    self.regrid_mut().points = Some(parse_int(key, value_str)?);
                }
                "regrid.units" => {
                    self.regrid_mut().units = Some(value_str.to_string());
                }
                "align.metric" => {
                    let metric = MetricChoice::from_str(value_str, true).map_err(|_| {
                        CliError::Config(format!("Invalid metric for {}: {}", key, value_str))
                    })?;
                    self.align.get_or_insert_with(Default::default).metric = Some(metric);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    fn profile_mut(&mut self) -> &mut PartialProfileConfig {
        self.profile.get_or_insert_with(Default::default)
    }

    fn regrid_mut(&mut self) -> &mut PartialRegridConfig {
        self.regrid.get_or_insert_with(Default::default)
    }
}

fn parse_float(key: &str, value: &str) -> Result<f64> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid float value for {}: {}", key, value)))
}

fn parse_int(key: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid integer value for {}: {}", key, value)))
}
