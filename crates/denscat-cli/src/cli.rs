use clap::{Args, Parser, Subcommand, ValueEnum};
use denscat::engine::config::ScoreMetric;
use serde::Deserialize;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "denscat developers",
    version,
    about = "denscat - Isotropic scattering profiles from cubic electron-density maps, with padding-based resolution control, profile regridding and principal-axis map alignment.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the scattering profile of an MRC density map.
    Profile(ProfileArgs),
    /// Resample a profile file onto a new frequency grid with cubic splines.
    Regrid(RegridArgs),
    /// Superimpose a density map onto a reference map by its principal axes.
    Align(AlignArgs),
}

/// Arguments for the `profile` subcommand.
#[derive(Args, Debug)]
pub struct ProfileArgs {
    // --- Core Arguments ---
    /// Path to the input density map (.mrc).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub file: PathBuf,

    /// Output prefix. Defaults to the input name with a `_rho` suffix.
    #[arg(short, long, value_name = "PREFIX")]
    pub output: Option<PathBuf>,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Preprocessing Overrides ---
    /// Keep every n-th voxel along each axis.
    #[arg(long = "ns", value_name = "INT")]
    pub sampling_stride: Option<usize>,

    /// Zero every voxel whose absolute density is at or below this value.
    #[arg(short = 't', long, value_name = "FLOAT")]
    pub threshold: Option<f64>,

    // --- Resolution Overrides ---
    /// Desired frequency spacing of the profile, in inverse angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub dq: Option<f64>,

    /// Desired number of samples per side after zero-padding. Takes priority over --dq.
    #[arg(short = 'n', long = "samples", value_name = "INT")]
    pub sample_count: Option<usize>,

    /// Also write the map the profile was computed from (`<PREFIX>_mod.mrc`).
    #[arg(long)]
    pub save_mrc: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S profile.dq=0.005
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `regrid` subcommand.
#[derive(Args, Debug)]
pub struct RegridArgs {
    /// Path to the profile file to resample (columns q, I, sigma).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub file: PathBuf,

    /// Output prefix. Defaults to the input name; `.regrid.dat` is appended.
    #[arg(short, long, value_name = "PREFIX")]
    pub output: Option<PathBuf>,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Take the target frequencies from the first column of this file.
    /// Takes priority over --qmax and --nq.
    #[arg(long = "qfile", value_name = "PATH")]
    pub q_file: Option<PathBuf>,

    /// Maximum frequency of the uniform target grid. Defaults to the input maximum.
    #[arg(long, value_name = "FLOAT")]
    pub qmax: Option<f64>,

    /// Number of points of the uniform target grid.
    #[arg(long = "nq", value_name = "INT")]
    pub points: Option<usize>,

    /// Angular units of the input file: `a` (1/angstrom) or `nm` (1/nanometer).
    #[arg(short, long, value_name = "UNITS")]
    pub units: Option<String>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S regrid.nq=201
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `align` subcommand.
#[derive(Args, Debug)]
pub struct AlignArgs {
    /// Path to the map to be moved (.mrc).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub file: PathBuf,

    /// Path to the reference map (.mrc).
    #[arg(long = "ref", value_name = "PATH")]
    pub reference: Option<PathBuf>,

    /// Output prefix. Defaults to the input name with an `_alignedbyPA` suffix.
    #[arg(short, long, value_name = "PREFIX")]
    pub output: Option<PathBuf>,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Score used to pick the best of the eight axis-sign candidates.
    #[arg(long, value_enum, value_name = "METRIC")]
    pub metric: Option<MetricChoice>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S align.metric=squared-difference
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MetricChoice {
    /// Real-space Pearson correlation (higher is better).
    Correlation,
    /// Sum of squared differences (lower is better).
    SquaredDifference,
}

impl From<MetricChoice> for ScoreMetric {
    fn from(choice: MetricChoice) -> Self {
        match choice {
            MetricChoice::Correlation => ScoreMetric::Correlation,
            MetricChoice::SquaredDifference => ScoreMetric::SquaredDifference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn profile_arguments_parse() {
        let cli = Cli::try_parse_from([
            "denscat", "-vv", "profile", "-f", "map.mrc", "--dq", "0.01", "--ns", "2", "-t",
            "0.5", "--save-mrc",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Profile(args) = cli.command else {
            panic!("expected the profile subcommand");
        };
        assert_eq!(args.file, PathBuf::from("map.mrc"));
        assert_eq!(args.dq, Some(0.01));
        assert_eq!(args.sampling_stride, Some(2));
        assert_eq!(args.threshold, Some(0.5));
        assert!(args.save_mrc);
        assert_eq!(args.output, None);
    }

    #[test]
    fn align_reference_is_optional_at_parse_time() {
        let cli = Cli::try_parse_from(["denscat", "align", "-f", "moving.mrc"]).unwrap();
        let Commands::Align(args) = cli.command else {
            panic!("expected the align subcommand");
        };
        assert_eq!(args.reference, None);

        let cli = Cli::try_parse_from([
            "denscat",
            "align",
            "-f",
            "moving.mrc",
            "--ref",
            "ref.mrc",
            "--metric",
            "squared-difference",
        ])
        .unwrap();
        let Commands::Align(args) = cli.command else {
            panic!("expected the align subcommand");
        };
        assert_eq!(args.reference, Some(PathBuf::from("ref.mrc")));
        assert_eq!(args.metric, Some(MetricChoice::SquaredDifference));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["denscat", "-q", "-v", "regrid", "-f", "a.dat"]);
        assert!(result.is_err());
    }
}
