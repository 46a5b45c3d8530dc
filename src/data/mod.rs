//! Data layer: product decoding, core types, and band selection.
//!
//! Architecture:
//! ```text
//!  .spc product (label + binary body)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  label    │  KEY = VALUE lines → FieldOffsets
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  seek + decode → Spectrum, GeometryTable
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  band-gap mask, nearest-band lookup, wavelength extent
//!   └──────────┘
//! ```

pub mod filter;
pub mod label;
pub mod loader;
pub mod model;
pub mod synthetic;
