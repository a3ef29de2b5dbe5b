pub mod geometry;
pub mod spline;
