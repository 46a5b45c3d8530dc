use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::model::ViewingGeometry;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Reference geometry
// ---------------------------------------------------------------------------

/// Standard geometry every spectrum is normalised to: i = 30°, e = 0°, g = 30°.
pub const REFERENCE_GEOMETRY: ViewingGeometry = ViewingGeometry::new(30.0, 0.0, 30.0);

// ---------------------------------------------------------------------------
// Lunar-Lambert polynomial
// ---------------------------------------------------------------------------

/// Cubic in phase angle weighting the Lambert and Lommel-Seeliger terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LunarLambert {
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
}

impl Default for LunarLambert {
    fn default() -> Self {
        Self {
            c1: -0.019,
            c2: 0.000242,
            c3: -0.00000146,
        }
    }
}

// ---------------------------------------------------------------------------
// Band gap
// ---------------------------------------------------------------------------

/// Half-open range `[start, end)` of raw bands dropped by the cleaner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandGap {
    pub start: usize,
    pub end: usize,
}

impl Default for BandGap {
    fn default() -> Self {
        Self { start: 61, end: 84 }
    }
}

impl BandGap {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, band: usize) -> bool {
        (self.start..self.end).contains(&band)
    }
}

// ---------------------------------------------------------------------------
// Policy for degenerate geometry
// ---------------------------------------------------------------------------

/// What the photometric model does when an observation's geometry drives
/// the Lunar-Lambert or phase-function value to zero or a non-finite number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryPolicy {
    /// Fail the run, naming the observation and band.
    #[default]
    Reject,
    /// Let NaN/Inf flow into the corrected reflectance, with a warning.
    Propagate,
}

// ---------------------------------------------------------------------------
// ProcessingConfig
// ---------------------------------------------------------------------------

/// Every tunable constant of the extraction and correction pipeline.
///
/// The defaults reproduce the Spectral Profiler processing; a JSON file with
/// any subset of these keys overrides them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Bands per raw spectrum row.
    pub raw_band_count: usize,
    /// Detector-overlap bands removed before any correction.
    pub band_gap: BandGap,
    /// Geometry spectra are normalised to.
    pub reference_geometry: ViewingGeometry,
    pub lunar_lambert: LunarLambert,
    /// Wavelengths (nm) of the short and long continuum anchors.
    pub continuum_anchors: [f64; 2],
    /// Longest wavelength (nm) kept in the exported/visualised extent.
    pub wavelength_limit: f64,
    pub geometry_policy: GeometryPolicy,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            raw_band_count: 296,
            band_gap: BandGap::default(),
            reference_geometry: REFERENCE_GEOMETRY,
            lunar_lambert: LunarLambert::default(),
            continuum_anchors: [752.8, 1547.7],
            wavelength_limit: 1652.0,
            geometry_policy: GeometryPolicy::default(),
        }
    }
}

impl ProcessingConfig {
    /// Load overrides from a JSON file and validate the result.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of bands left once the gap is removed.
    pub fn cleaned_band_count(&self) -> usize {
        self.raw_band_count - self.band_gap.len()
    }

    pub fn validate(&self) -> Result<()> {
        if self.band_gap.start > self.band_gap.end || self.band_gap.end > self.raw_band_count {
            return Err(Error::InvalidConfig(format!(
                "band gap [{}, {}) does not fit in {} bands",
                self.band_gap.start, self.band_gap.end, self.raw_band_count
            )));
        }
        if self.cleaned_band_count() == 0 {
            return Err(Error::InvalidConfig("band gap removes every band".into()));
        }
        let [short, long] = self.continuum_anchors;
        if !(short < long) {
            return Err(Error::InvalidConfig(format!(
                "continuum anchors must increase, got {short} and {long}"
            )));
        }
        Ok(())
    }
}
