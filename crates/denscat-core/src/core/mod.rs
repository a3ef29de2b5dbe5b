//! # Core Module
//!
//! Fundamental data structures and file formats shared by every engine component.
//!
//! - **Data Models** ([`models`]) - Cubic density grids and scattering profiles
//! - **File I/O** ([`io`]) - MRC density maps and whitespace-delimited profile files
//! - **Numerical Utilities** ([`utils`]) - Cubic splines and rigid-body map geometry

pub mod io;
pub mod models;
pub mod utils;
