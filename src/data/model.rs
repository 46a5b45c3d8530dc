use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FieldOffsets – what the label tells us about the binary body
// ---------------------------------------------------------------------------

/// Byte offsets and record counts extracted from a product label.
///
/// Pointer offsets (`*_start`) and column offsets (`*_offset`) are 1-based,
/// exactly as written in the label. Every value is strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOffsets {
    pub wavelength_start: u64,
    pub radiance_start: u64,
    pub reflectance_start: u64,
    pub radiance_rows: usize,
    pub reflectance_rows: usize,
    pub ancillary_start: u64,
    pub row_bytes: u64,
    pub emission_offset: u64,
    pub incidence_offset: u64,
    pub phase_offset: u64,
    pub observation_count: usize,
}

// ---------------------------------------------------------------------------
// Spectrum – decoded spectral arrays
// ---------------------------------------------------------------------------

/// Decoded spectral arrays of one product, in physical units.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Band centre wavelengths in nm.
    pub wavelengths: Vec<f64>,
    /// One row per radiance record line.
    pub radiance: Vec<Vec<f64>>,
    /// One row per reflectance record line.
    pub reflectance: Vec<Vec<f64>>,
}

// ---------------------------------------------------------------------------
// Viewing geometry
// ---------------------------------------------------------------------------

/// Sun–target–sensor angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewingGeometry {
    pub incidence: f64,
    pub emission: f64,
    pub phase: f64,
}

impl ViewingGeometry {
    pub const fn new(incidence: f64, emission: f64, phase: f64) -> Self {
        Self {
            incidence,
            emission,
            phase,
        }
    }
}

/// Per-observation geometry decoded from the ancillary table.
///
/// Indexed by observation, which is not necessarily the same count as the
/// radiance or reflectance record lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryTable {
    pub observations: Vec<ViewingGeometry>,
}

impl GeometryTable {
    pub fn new(observations: Vec<ViewingGeometry>) -> Self {
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn get(&self, observation: usize) -> Option<&ViewingGeometry> {
        self.observations.get(observation)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ViewingGeometry> {
        self.observations.iter()
    }
}

// ---------------------------------------------------------------------------
// BandArray – per-band data of either rank
// ---------------------------------------------------------------------------

/// A band-indexed array: a single vector (wavelengths) or an
/// observation × band matrix (radiance, reflectance).
#[derive(Debug, Clone, PartialEq)]
pub enum BandArray {
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
}

impl BandArray {
    /// Bands per row (0 for an empty matrix).
    pub fn band_count(&self) -> usize {
        match self {
            BandArray::Vector(v) => v.len(),
            BandArray::Matrix(rows) => rows.first().map_or(0, Vec::len),
        }
    }

    pub fn into_vector(self) -> Option<Vec<f64>> {
        match self {
            BandArray::Vector(v) => Some(v),
            BandArray::Matrix(_) => None,
        }
    }

    pub fn into_matrix(self) -> Option<Vec<Vec<f64>>> {
        match self {
            BandArray::Matrix(rows) => Some(rows),
            BandArray::Vector(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Photometric coefficients
// ---------------------------------------------------------------------------

/// Hapke single-particle phase function parameters for one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HapkeCoefficients {
    /// Opposition-effect amplitude.
    pub b0: f64,
    /// Opposition-effect angular width.
    pub h: f64,
    /// Henyey–Greenstein forward/backward partition.
    pub c: f64,
    /// Henyey–Greenstein asymmetry.
    pub g: f64,
}

/// Coefficient rows in cleaned band order, starting at cleaned band 0.
///
/// Usually shorter than the cleaned spectrum: bands past the end of the
/// table are left uncorrected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoefficientTable {
    pub rows: Vec<HapkeCoefficients>,
}

impl CoefficientTable {
    pub fn new(rows: Vec<HapkeCoefficients>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, band: usize) -> Option<&HapkeCoefficients> {
        self.rows.get(band)
    }
}
