//! Synthetic Spectral Profiler products.
//!
//! Writes a label and binary body in the layout [`super::label`] and
//! [`super::loader`] read back: a fixed-width text label padded to a
//! 512-byte boundary, followed by the wavelength vector, radiance rows,
//! reflectance rows and the ancillary geometry table.

use std::fmt::Write as _;
use std::path::Path;

use super::loader::{RADIANCE_SCALE, RAW_BAND_COUNT, REFLECTANCE_SCALE, WAVELENGTH_SCALE};
use super::model::ViewingGeometry;

/// Bytes per ancillary row.
pub const ANCILLARY_ROW_BYTES: usize = 32;
/// 1-based start bytes of the angle columns within an ancillary row.
pub const INCIDENCE_START_BYTE: usize = 9;
pub const EMISSION_START_BYTE: usize = 13;
pub const PHASE_START_BYTE: usize = 17;

const LABEL_ALIGN: usize = 512;

/// Band centres (nm) shaped like the instrument's three detectors: the
/// visible detector overlaps the first near-infrared one over bands 61–83.
pub fn sp_wavelengths() -> Vec<f64> {
    (0..RAW_BAND_COUNT)
        .map(|band| match band {
            0..=83 => 512.6 + 6.0 * band as f64,
            84..=211 => 883.6 + 6.2 * (band - 84) as f64,
            _ => 1703.6 + 10.5 * (band - 212) as f64,
        })
        .collect()
}

/// Quantise a physical value to the stored fixed-point integer.
pub fn quantise(value: f64, scale: f64) -> u16 {
    (value / scale).round().clamp(0.0, u16::MAX as f64) as u16
}

/// In-memory product: raw fixed-point arrays plus geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticProduct {
    pub wavelengths: Vec<u16>,
    pub radiance: Vec<Vec<u16>>,
    pub reflectance: Vec<Vec<u16>>,
    pub geometry: Vec<ViewingGeometry>,
}

/// 0-based byte positions of each section.
struct Layout {
    label_bytes: usize,
    wavelength: usize,
    radiance: usize,
    reflectance: usize,
    ancillary: usize,
}

impl SyntheticProduct {
    /// Build a product from physical values, one radiance and reflectance
    /// row per geometry row.
    pub fn from_physical(
        wavelengths: &[f64],
        radiance: &[Vec<f64>],
        reflectance: &[Vec<f64>],
        geometry: Vec<ViewingGeometry>,
    ) -> Self {
        let quantise_rows = |rows: &[Vec<f64>], scale: f64| -> Vec<Vec<u16>> {
            rows.iter()
                .map(|row| row.iter().map(|&v| quantise(v, scale)).collect())
                .collect()
        };
        Self {
            wavelengths: wavelengths
                .iter()
                .map(|&w| quantise(w, WAVELENGTH_SCALE))
                .collect(),
            radiance: quantise_rows(radiance, RADIANCE_SCALE),
            reflectance: quantise_rows(reflectance, REFLECTANCE_SCALE),
            geometry,
        }
    }

    /// Constant reflectance everywhere on the instrument wavelength grid.
    pub fn flat(reflectance: f64, geometry: Vec<ViewingGeometry>) -> Self {
        let rows = vec![vec![reflectance; RAW_BAND_COUNT]; geometry.len()];
        let radiance = vec![vec![reflectance * 100.0; RAW_BAND_COUNT]; geometry.len()];
        Self::from_physical(&sp_wavelengths(), &radiance, &rows, geometry)
    }

    fn band_count(&self) -> usize {
        self.wavelengths.len()
    }

    fn layout(&self) -> Layout {
        let unpadded = self.label_text(&Layout {
            label_bytes: 0,
            wavelength: 0,
            radiance: 0,
            reflectance: 0,
            ancillary: 0,
        });
        let label_bytes = unpadded.len().div_ceil(LABEL_ALIGN) * LABEL_ALIGN;
        let row = self.band_count() * 2;
        let wavelength = label_bytes;
        let radiance = wavelength + row;
        let reflectance = radiance + row * self.radiance.len();
        let ancillary = reflectance + row * self.reflectance.len();
        Layout {
            label_bytes,
            wavelength,
            radiance,
            reflectance,
            ancillary,
        }
    }

    /// Label text. Offsets are written fixed-width so the label length does
    /// not depend on where the sections land.
    fn label_text(&self, layout: &Layout) -> String {
        let pointer = |offset: usize| format!("{:>10}", offset + 1);
        let mut out = String::new();
        let mut line = |key: &str, value: &str| {
            let _ = write!(out, "{key:<37}= {value}\r\n");
        };
        line("PDS_VERSION_ID", "PDS3");
        line("RECORD_TYPE", "UNDEFINED");
        line("^SP_SPECTRUM_WAV", &format!("{} <BYTES>", pointer(layout.wavelength)));
        line("^SP_SPECTRUM_RAD", &format!("{} <BYTES>", pointer(layout.radiance)));
        line("^SP_SPECTRUM_REF", &format!("{} <BYTES>", pointer(layout.reflectance)));
        line("^ANCILLARY_AND_SUPPLEMENT_DATA", &format!("{}<BYTES>", pointer(layout.ancillary)));
        line("NORMAL_SP_POINT_NUM", &self.geometry.len().to_string());

        let bands = self.band_count().to_string();
        for (object, rows, scale) in [
            ("SP_SPECTRUM_WAV", 1, WAVELENGTH_SCALE),
            ("SP_SPECTRUM_RAD", self.radiance.len(), RADIANCE_SCALE),
            ("SP_SPECTRUM_REF", self.reflectance.len(), REFLECTANCE_SCALE),
        ] {
            line("OBJECT", object);
            line("  LINES", &rows.to_string());
            line("  LINE_SAMPLES", &bands);
            line("  SAMPLE_TYPE", "MSB_UNSIGNED_INTEGER");
            line("  SAMPLE_BITS", "16");
            line("  SCALING_FACTOR", &scale.to_string());
            line("END_OBJECT", object);
        }

        line("OBJECT", "ANCILLARY_AND_SUPPLEMENT_DATA");
        line("  ROWS", &self.geometry.len().to_string());
        line("  ROW_BYTES", &ANCILLARY_ROW_BYTES.to_string());
        line("  COLUMNS", "4");
        for (name, data_type, start) in [
            ("OBSERVATION_ID", "MSB_UNSIGNED_INTEGER", 1),
            ("INCIDENCE_ANGLE", "IEEE_REAL", INCIDENCE_START_BYTE),
            ("EMISSION_ANGLE", "IEEE_REAL", EMISSION_START_BYTE),
            ("PHASE_ANGLE", "IEEE_REAL", PHASE_START_BYTE),
        ] {
            line("  OBJECT", "COLUMN");
            line("    NAME", &format!("\"{name}\""));
            line("    DATA_TYPE", data_type);
            line("    UNIT", "DEGREE");
            line("    START_BYTE", &start.to_string());
            line("    BYTES", "4");
            line("  END_OBJECT", "COLUMN");
        }
        line("END_OBJECT", "ANCILLARY_AND_SUPPLEMENT_DATA");

        line("OBJECT", "SP_SPECTRUM_QA");
        line("  LINES", &self.reflectance.len().to_string());
        line("  LINE_SAMPLES", &bands);
        line("END_OBJECT", "SP_SPECTRUM_QA");
        out.push_str("END\r\n");
        out
    }

    /// Label text exactly as it appears at the head of [`Self::to_bytes`].
    pub fn label(&self) -> String {
        self.label_text(&self.layout())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let layout = self.layout();
        let mut bytes = self.label_text(&layout).into_bytes();
        bytes.resize(layout.label_bytes, b' ');

        let mut push_row = |row: &[u16]| {
            for value in row {
                bytes.extend_from_slice(&value.to_be_bytes());
            }
        };
        push_row(&self.wavelengths);
        self.radiance.iter().for_each(|row| push_row(row));
        self.reflectance.iter().for_each(|row| push_row(row));

        for (id, geom) in self.geometry.iter().enumerate() {
            let mut row = [0u8; ANCILLARY_ROW_BYTES];
            row[0..4].copy_from_slice(&(id as u32).to_be_bytes());
            for (start, angle) in [
                (INCIDENCE_START_BYTE, geom.incidence),
                (EMISSION_START_BYTE, geom.emission),
                (PHASE_START_BYTE, geom.phase),
            ] {
                row[start - 1..start + 3].copy_from_slice(&(angle as f32).to_be_bytes());
            }
            bytes.extend_from_slice(&row);
        }
        bytes
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_bytes())
    }
}
