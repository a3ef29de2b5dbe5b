use super::{output_prefix, with_ending};
use crate::cli::RegridArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use denscat::{
    core::io::dat::{ColumnFormat, DatFile},
    engine::progress::ProgressReporter,
    workflows,
};
use tracing::{debug, info};

/// Regridded profiles are written as plain `%.5e` columns.
const REGRID_FORMAT: ColumnFormat = ColumnFormat::plain(5);

pub fn run(args: RegridArgs) -> Result<()> {
    let partial_config = PartialConfig::load(args.config.as_deref())?;
    let settings = partial_config.merge_regrid(&args)?;

    info!("Loading profile from {:?} ({:?})", &args.file, settings.units);
    let loaded = DatFile::load(&args.file, settings.units).map_err(|e| CliError::FileParsing {
        path: args.file.clone(),
        source: e.into(),
    })?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let profile = workflows::regrid::run(&loaded, &settings.resample, &reporter)?;
    debug!(phases = ?progress_handler.finished_phases(), "Regrid workflow phases complete.");

    let prefix = output_prefix(&args.file, args.output.as_deref(), "");
    let out_path = with_ending(&prefix, ".regrid.dat");
    DatFile::save(&profile, &out_path, REGRID_FORMAT).map_err(|e| CliError::FileWriting {
        path: out_path.clone(),
        source: e.into(),
    })?;
    println!(
        "✓ Regridded profile ({} points) written to: {}",
        profile.len(),
        out_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use denscat::core::io::dat::Units;
    use std::fs;
    use tempfile::tempdir;

    fn args(argv: &[&str]) -> RegridArgs {
        match Cli::parse_from(argv).command {
            Commands::Regrid(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn regrids_nanometer_profile_onto_uniform_grid() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("saxs.dat");
        let rows: String = (1..=20)
            .map(|i| {
                let q = i as f64 * 0.05;
                format!("{q} {} 0.5\n", 100.0 * (-q * q).exp())
            })
            .collect();
        fs::write(&input, format!("# q(1/nm) I sigma\n{rows}")).unwrap();

        run(args(&[
            "denscat",
            "regrid",
            "-f",
            input.to_str().unwrap(),
            "-u",
            "nm",
            "--nq",
            "11",
        ]))
        .unwrap();

        let out = DatFile::load(dir.path().join("saxs.regrid.dat"), Units::InverseAngstrom).unwrap();
        // Source maximum is 1.0 / nm = 0.1 / Å.
        assert!((out.profile.max_q().unwrap() - 0.1).abs() < 1e-4);
        assert!(out.profile.len() <= 11);
    }
}
