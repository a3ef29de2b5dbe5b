//! # Workflows Module
//!
//! High-level entry points that take loaded data and an explicit configuration, run the
//! engine end to end and report progress along the way.
//!
//! - **Profile Workflow** ([`profile`]) - Density map to scattering profile, with
//!   optional trimming, downsampling, thresholding and zero-padding.
//! - **Regrid Workflow** ([`regrid`]) - Spline resampling of an existing profile.
//! - **Alignment Workflow** ([`align`]) - Principal-axis superposition of one map onto
//!   another.

pub mod align;
pub mod profile;
pub mod regrid;
