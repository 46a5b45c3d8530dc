//! Spectral Profiler reflectance extraction.
//!
//! Decodes `.spc` products (PDS-style text label plus big-endian binary body),
//! removes the detector-overlap bands, normalises reflectance to a reference
//! viewing geometry with a Hapke/Lunar-Lambert photometric model, and divides
//! out a two-anchor linear continuum.
//!
//! ```text
//!  label ─► offsets ─► Spectrum + GeometryTable ─► BandMask
//!                                                    │
//!         coefficient table ─► PhotometricModel ◄────┘
//!                                    │
//!                                    ▼
//!                           remove_continuum ─► PipelineOutput
//! ```

pub mod config;
pub mod correction;
pub mod data;
pub mod error;
pub mod export;
pub mod pipeline;

pub use config::ProcessingConfig;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineOutput};
