//! # Engine Module
//!
//! Numerical machinery that turns density maps into scattering profiles and relates maps
//! and profiles to each other.
//!
//! ## Overview
//!
//! A profile is produced in three steps: the [`geometry`] of the map fixes the
//! frequency grid, the [`binning`] scheme partitions that grid into spherical shells,
//! and the [`transform`] computes `|F|²` with a 3D FFT and averages it per shell. The
//! [`resolution`] controller reruns these steps on a zero-padded map when a finer
//! frequency spacing is requested.
//!
//! ## Architecture
//!
//! - **Geometry** ([`geometry`]) - Voxel size, real-space and frequency axes
//! - **Shell Binning** ([`binning`]) - Equal-width shells in frequency magnitude
//! - **Transform** ([`transform`]) - 3D FFT, intensity floor and shell aggregation
//! - **Resolution Control** ([`resolution`]) - Zero-padding from a sample count or spacing
//! - **Resampling** ([`resample`]) - Cubic-spline interpolation of profiles
//! - **Alignment** ([`alignment`]) - Principal-axis superposition of two maps
//! - **Configuration** ([`config`]) - Builders for the per-operation settings
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - The engine-wide error type

pub mod alignment;
pub mod binning;
pub mod config;
pub mod error;
pub mod geometry;
pub mod progress;
pub mod resample;
pub mod resolution;
pub mod transform;
