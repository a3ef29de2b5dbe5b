use denscat::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

struct PhaseTracker {
    bar: ProgressBar,
    current: Option<&'static str>,
    finished: Vec<&'static str>,
    notices: Vec<String>,
}

/// Renders workflow phases as a spinner on stderr, switching to a counted bar while a
/// phase runs a task with known length (the alignment candidate search). Engine
/// advisories are collected for the command to report once the workflow returns.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<PhaseTracker>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target).with_style(spinner_style());
        bar.finish_and_clear();
        Self {
            state: Arc::new(Mutex::new(PhaseTracker {
                bar,
                current: None,
                finished: Vec::new(),
                notices: Vec::new(),
            })),
        }
    }

    /// Phases that ran to completion, in order.
    pub fn finished_phases(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .map(|s| s.finished.clone())
            .unwrap_or_default()
    }

    /// Advisories raised by the engine, such as a clamped resolution request.
    pub fn notices(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.notices.clone())
            .unwrap_or_default()
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut state) = state.lock() else {
                warn!("Progress state mutex was poisoned; dropping event.");
                return;
            };
            let phase = state.current.unwrap_or("Working");

            match progress {
                Progress::PhaseStart { name } => {
                    state.current = Some(name);
                    let bar = &state.bar;
                    bar.reset();
                    bar.set_length(0);
                    bar.set_style(spinner_style());
                    bar.set_message(format!("{name}..."));
                    bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                }
                Progress::PhaseFinish => {
                    state.bar.disable_steady_tick();
                    state.bar.finish_with_message(format!("✓ {phase}"));
                    if let Some(name) = state.current.take() {
                        state.finished.push(name);
                    }
                }
                Progress::TaskStart { total_steps } => {
                    let bar = &state.bar;
                    bar.disable_steady_tick();
                    bar.reset();
                    bar.set_length(total_steps);
                    bar.set_style(bar_style());
                    bar.set_message(phase);
                }
                Progress::TaskIncrement => state.bar.inc(1),
                Progress::TaskFinish => {
                    let bar = &state.bar;
                    if let Some(length) = bar.length() {
                        bar.set_position(length);
                    }
                    bar.set_style(spinner_style());
                    bar.set_message(format!("{phase}..."));
                }
                Progress::Message(text) => state.notices.push(text),
            }
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<24} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key(
            "eta",
            |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
            },
        )
        .progress_chars("##-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use denscat::core::io::dat::{DatFile, Units};
    use denscat::core::models::grid::DensityGrid;
    use denscat::engine::config::{
        AlignConfig, ProfileConfig, ProfileConfigBuilder, ResampleConfigBuilder,
    };
    use denscat::engine::progress::ProgressReporter;
    use denscat::workflows;
    use std::thread;

    fn sphere(n: usize, side: f64, radius: f64) -> DensityGrid {
        let c = (n / 2) as f64;
        DensityGrid::from_fn(n, side, |i, j, k| {
            let r2 = (i as f64 - c).powi(2) + (j as f64 - c).powi(2) + (k as f64 - c).powi(2);
            if r2 <= radius * radius { 1.0 } else { 0.0 }
        })
        .unwrap()
    }

    #[test]
    fn fresh_handler_has_no_history() {
        let handler = CliProgressHandler::hidden();
        assert!(handler.finished_phases().is_empty());
        assert!(handler.notices().is_empty());
        assert!(handler.state.lock().unwrap().bar.is_finished());
    }

    #[test]
    fn profile_run_finishes_preprocessing_and_transform() {
        let handler = CliProgressHandler::hidden();
        let reporter = ProgressReporter::with_callback(handler.get_callback());
        workflows::profile::run(sphere(8, 16.0, 2.0), &ProfileConfig::default(), &reporter)
            .unwrap();

        assert_eq!(handler.finished_phases(), ["Preprocessing", "Transform"]);
        assert!(handler.notices().is_empty());
        let state = handler.state.lock().unwrap();
        assert_eq!(state.bar.message(), "✓ Transform");
        assert_eq!(state.current, None);
    }

    #[test]
    fn clamped_resolution_request_is_kept_as_a_notice() {
        let handler = CliProgressHandler::hidden();
        let reporter = ProgressReporter::with_callback(handler.get_callback());
        let config = ProfileConfigBuilder::new()
            .target_sample_count(4)
            .build()
            .unwrap();
        let result = workflows::profile::run(sphere(8, 16.0, 2.0), &config, &reporter).unwrap();

        assert_eq!(
            handler.finished_phases(),
            ["Preprocessing", "Transform", "Resolution"]
        );
        let advisory = result.advisory.unwrap().to_string();
        assert_eq!(handler.notices(), [advisory]);
    }

    #[test]
    fn alignment_search_fills_the_bar() {
        let handler = CliProgressHandler::hidden();
        let reporter = ProgressReporter::with_callback(handler.get_callback());
        let c = 6;
        let map = DensityGrid::from_fn(12, 12.0, |i, j, k| {
            let inside = i.abs_diff(c) <= 3 && j.abs_diff(c) <= 1 && k == c;
            if inside { 1.0 } else { 0.0 }
        })
        .unwrap();
        workflows::align::run(&map, &map, &AlignConfig::default(), &reporter).unwrap();

        assert_eq!(handler.finished_phases(), ["Principal-Axis Alignment"]);
        let state = handler.state.lock().unwrap();
        assert_eq!(state.bar.length(), Some(8));
        assert_eq!(state.bar.position(), 8);
        assert_eq!(state.bar.message(), "✓ Principal-Axis Alignment");
    }

    #[test]
    fn regrid_reports_from_another_thread() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();
        let text = "0.05 100.0 2.0\n0.10 80.0 2.0\n0.15 60.0 2.0\n0.20 45.0 2.0\n";

        thread::spawn(move || {
            let loaded = DatFile::read_from(&mut text.as_bytes(), Units::InverseAngstrom).unwrap();
            let config = ResampleConfigBuilder::new().points(4).build().unwrap();
            let reporter = ProgressReporter::with_callback(callback);
            workflows::regrid::run(&loaded, &config, &reporter).unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(handler.finished_phases(), ["Resampling"]);
    }
}
