use super::config::{AlignConfig, ScoreMetric};
use super::progress::{Progress, ProgressReporter};
use crate::core::models::grid::DensityGrid;
use crate::core::utils::geometry::{
    inertia_tensor, principal_axes, sign_combinations, transform_grid,
};
use nalgebra::Matrix3;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignError {
    #[error(
        "Maps must share a geometry: reference has {reference_n} samples over {reference_side}, moving has {moving_n} over {moving_side}"
    )]
    GeometryMismatch {
        reference_n: usize,
        reference_side: f64,
        moving_n: usize,
        moving_side: f64,
    },
    #[error("The {0} map has no density to align")]
    EmptyMap(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    /// Moving map after centring, rotation and rescaling to its original total.
    pub aligned: DensityGrid,
    /// Orthogonal matrix (possibly improper) applied about the grid centre.
    pub rotation: Matrix3<f64>,
    /// Score of the chosen candidate under the configured metric.
    pub score: f64,
}

/// Pearson correlation of two equally sized sample sets.
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 { 0.0 } else { cov / denom }
}

pub fn squared_difference(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

impl ScoreMetric {
    pub fn score(self, reference: &[f64], candidate: &[f64]) -> f64 {
        match self {
            ScoreMetric::Correlation => correlation(reference, candidate),
            ScoreMetric::SquaredDifference => squared_difference(reference, candidate),
        }
    }

    pub fn is_better(self, score: f64, than: f64) -> bool {
        match self {
            ScoreMetric::Correlation => score > than,
            ScoreMetric::SquaredDifference => score < than,
        }
    }
}

fn check_geometry(reference: &DensityGrid, moving: &DensityGrid) -> Result<(), AlignError> {
    let same_side = (reference.side() - moving.side()).abs() <= 1e-6 * reference.side();
    if reference.n() != moving.n() || !same_side {
        return Err(AlignError::GeometryMismatch {
            reference_n: reference.n(),
            reference_side: reference.side(),
            moving_n: moving.n(),
            moving_side: moving.side(),
        });
    }
    Ok(())
}

/// Rotates `moving` so that its principal axes coincide with those of `reference`.
///
/// Both maps are first rolled so their centres of mass sit on the central voxel. Every
/// one of the eight sign assignments of the principal axes is tried and the candidate
/// scoring best against the centred reference is returned.
pub fn align_principal_axes(
    reference: &DensityGrid,
    moving: &DensityGrid,
    config: &AlignConfig,
    reporter: &ProgressReporter,
) -> Result<AlignmentResult, AlignError> {
    check_geometry(reference, moving)?;
    let moving_total = moving.total();
    if reference.center_of_mass().is_none() {
        return Err(AlignError::EmptyMap("reference"));
    }
    if moving.center_of_mass().is_none() {
        return Err(AlignError::EmptyMap("moving"));
    }

    let reference = reference.centered();
    let moving = moving.centered();
    let (reference_axes, reference_moments) = principal_axes(&inertia_tensor(&reference));
    let (moving_axes, moving_moments) = principal_axes(&inertia_tensor(&moving));
    debug!(
        reference = ?reference_moments.as_slice(),
        moving = ?moving_moments.as_slice(),
        "Principal moments."
    );

    let candidates = sign_combinations();
    reporter.report(Progress::TaskStart {
        total_steps: candidates.len() as u64,
    });
    let mut best: Option<(DensityGrid, Matrix3<f64>, f64)> = None;
    for signs in candidates.iter() {
        let rotation = reference_axes * signs * moving_axes.transpose();
        let candidate = transform_grid(&moving, &rotation);
        let score = config.metric.score(reference.data(), candidate.data());
        debug!(score, det = rotation.determinant(), "Scored axis orientation.");
        if best
            .as_ref()
            .is_none_or(|(_, _, current)| config.metric.is_better(score, *current))
        {
            best = Some((candidate, rotation, score));
        }
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);

    let Some((mut aligned, rotation, score)) = best else {
        unreachable!("sign_combinations always yields candidates");
    };
    let aligned_total = aligned.total();
    if aligned_total != 0.0 && aligned_total.is_finite() {
        let scale = moving_total / aligned_total;
        aligned.data_mut().iter_mut().for_each(|v| *v *= scale);
    }
    info!(score, metric = ?config.metric, "Selected principal-axis orientation.");

    Ok(AlignmentResult {
        aligned,
        rotation,
        score,
    })
}
