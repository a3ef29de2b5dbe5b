use super::{output_prefix, with_ending};
use crate::cli::ProfileArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use denscat::{
    core::io::{
        dat::{ColumnFormat, DatFile},
        mrc::MrcFile,
        traits::MapFile,
    },
    engine::progress::ProgressReporter,
    workflows,
};
use tracing::{debug, info};

/// Computed profiles are written as sign-padded `% .16e` columns.
const PROFILE_FORMAT: ColumnFormat = ColumnFormat::padded(16);

pub fn run(args: ProfileArgs) -> Result<()> {
    let partial_config = PartialConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let final_config = partial_config.merge_profile(&args)?;

    info!("Loading density map from {:?}", &args.file);
    let grid = MrcFile::read_from_path(&args.file).map_err(|e| CliError::FileParsing {
        path: args.file.clone(),
        source: e.into(),
    })?;
    println!(
        "Loaded {}³ map with side {:.3} Å (voxel {:.4} Å).",
        grid.n(),
        grid.side(),
        grid.voxel_size()
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the core profile workflow...");
    let result = workflows::profile::run(grid, &final_config, &reporter)?;

    debug!(phases = ?progress_handler.finished_phases(), "Profile workflow phases complete.");
    for notice in progress_handler.notices() {
        println!("Note: {}.", notice);
    }

    let prefix = output_prefix(&args.file, args.output.as_deref(), "_rho");
    let dat_path = with_ending(&prefix, ".dat");
    DatFile::save(&result.profile, &dat_path, PROFILE_FORMAT).map_err(|e| {
        CliError::FileWriting {
            path: dat_path.clone(),
            source: e.into(),
        }
    })?;
    info!(points = result.profile.len(), "Profile written to {:?}", &dat_path);
    println!(
        "✓ Profile with {} points written to: {}",
        result.profile.len(),
        dat_path.display()
    );

    if let Some(grid) = &result.grid {
        let map_path = with_ending(&prefix, "_mod.mrc");
        MrcFile::write_to_path(grid, &map_path).map_err(|e| CliError::FileWriting {
            path: map_path.clone(),
            source: e.into(),
        })?;
        println!("✓ Processed map ({}³) written to: {}", grid.n(), map_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use denscat::core::models::grid::DensityGrid;
    use tempfile::tempdir;

    fn write_sphere(path: &std::path::Path, n: usize) {
        let c = (n / 2) as f64;
        let grid = DensityGrid::from_fn(n, 2.0 * n as f64, |i, j, k| {
            let r2 = (i as f64 - c).powi(2) + (j as f64 - c).powi(2) + (k as f64 - c).powi(2);
            if r2 <= 9.0 { 1.0 } else { 0.0 }
        })
        .unwrap();
        MrcFile::write_to_path(&grid, path).unwrap();
    }

    fn args(argv: &[&str]) -> ProfileArgs {
        match Cli::parse_from(argv).command {
            Commands::Profile(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn writes_profile_and_processed_map_next_to_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("sphere.mrc");
        write_sphere(&input, 16);

        let input_str = input.to_str().unwrap();
        run(args(&["denscat", "profile", "-f", input_str, "-n", "24", "--save-mrc"])).unwrap();

        let loaded = DatFile::load(
            dir.path().join("sphere_rho.dat"),
            denscat::core::io::dat::Units::InverseAngstrom,
        )
        .unwrap();
        assert!(loaded.profile.len() > 2);
        assert!(loaded.profile.sigma().is_some());

        let map = MrcFile::read_from_path(dir.path().join("sphere_rho_mod.mrc")).unwrap();
        assert_eq!(map.n(), 24);
    }

    #[test]
    fn missing_input_is_a_parsing_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("absent.mrc");
        let result = run(args(&["denscat", "profile", "-f", input.to_str().unwrap()]));
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
