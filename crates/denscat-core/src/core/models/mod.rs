//! Data models for density maps and the scattering profiles computed from them.

pub mod grid;
pub mod profile;
