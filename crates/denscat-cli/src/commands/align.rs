use super::{output_prefix, with_ending};
use crate::cli::AlignArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use denscat::{
    core::io::{mrc::MrcFile, traits::MapFile},
    engine::progress::ProgressReporter,
    workflows,
};
use std::path::Path;
use tracing::{debug, info};

fn is_mrc(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mrc"))
}

pub fn run(args: AlignArgs) -> Result<()> {
    let reference_path = args.reference.as_ref().ok_or_else(|| {
        CliError::Argument("a reference map is required for alignment (--ref <PATH>)".to_string())
    })?;
    if !is_mrc(reference_path) {
        return Err(CliError::Argument(format!(
            "invalid reference file '{}': an .mrc map is required",
            reference_path.display()
        )));
    }

    let partial_config = PartialConfig::load(args.config.as_deref())?;
    let final_config = partial_config.merge_align(&args)?;

    let read = |path: &Path| {
        info!("Loading density map from {:?}", path);
        MrcFile::read_from_path(path).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    };
    let reference = read(reference_path)?;
    let moving = read(&args.file)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let result = workflows::align::run(&reference, &moving, &final_config, &reporter)?;
    debug!(
        rotation = ?result.rotation,
        phases = ?progress_handler.finished_phases(),
        "Chosen axis transformation."
    );

    let prefix = output_prefix(&args.file, args.output.as_deref(), "_alignedbyPA");
    let out_path = with_ending(&prefix, ".mrc");
    MrcFile::write_to_path(&result.aligned, &out_path).map_err(|e| CliError::FileWriting {
        path: out_path.clone(),
        source: e.into(),
    })?;
    println!(
        "✓ Aligned map (score {:.4}) written to: {}",
        result.score,
        out_path.display()
    );
    Ok(())
}
