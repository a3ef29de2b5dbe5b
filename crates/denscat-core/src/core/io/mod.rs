//! Reading and writing of density maps and scattering profiles.
//!
//! Density maps use the MRC/CCP4 binary format (mode 2, 32-bit floats). Profiles are
//! plain whitespace-delimited text with one row per frequency sample.

pub mod dat;
pub mod mrc;
pub mod traits;
