//! # denscat Core Library
//!
//! Computes one-dimensional, isotropically averaged scattering profiles from cubic
//! electron-density maps, and controls the sampling of those profiles by zero-padding
//! the map before the transform.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`DensityGrid`, `Profile`),
//!   file formats (MRC maps, whitespace-delimited profile files) and small numerical
//!   utilities (cubic splines, inertia tensors, trilinear sampling).
//!
//! - **[`engine`]: The Numerical Core.** Grid geometry, the spherical-shell bin scheme,
//!   the 3D FFT and shell aggregation, the resolution controller, the profile resampler
//!   and the principal-axis aligner. Every entry point takes an explicit configuration.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures (`profile`, `regrid`,
//!   `align`) that tie the engine and core together and report progress.

pub mod core;
pub mod engine;
pub mod workflows;
