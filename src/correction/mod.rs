//! Spectral corrections applied to cleaned reflectance.
//!
//! `photometric` normalises each band to the reference viewing geometry;
//! `continuum` then divides each observation by a two-anchor linear baseline.

pub mod continuum;
pub mod photometric;
