use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use serde::Deserialize;

use super::label::{is_label_end, scan_label};
use super::model::{
    CoefficientTable, FieldOffsets, GeometryTable, HapkeCoefficients, Spectrum, ViewingGeometry,
};
use crate::error::{Error, Result};

/// Bands per spectrum row in the binary body.
pub const RAW_BAND_COUNT: usize = 296;

/// Fixed-point scale of the stored wavelength integers (0.1 nm).
pub const WAVELENGTH_SCALE: f64 = 0.1;
/// Fixed-point scale of the stored radiance integers.
pub const RADIANCE_SCALE: f64 = 0.01;
/// Fixed-point scale of the stored reflectance integers.
pub const REFLECTANCE_SCALE: f64 = 0.0001;

/// Angle fields are single big-endian IEEE floats.
const ANGLE_BYTES: usize = 4;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Everything decoded from one product file.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub offsets: FieldOffsets,
    pub spectrum: Spectrum,
    pub geometry: GeometryTable,
}

/// Open a `.spc` product, scan its label and decode the binary body.
pub fn load_product(path: &Path, band_count: usize) -> Result<Product> {
    let file = File::open(path)?;
    read_product(BufReader::new(file), band_count)
}

/// Same as [`load_product`] for any seekable source (the label must start
/// at byte 0).
pub fn read_product<R: BufRead + Seek>(mut reader: R, band_count: usize) -> Result<Product> {
    let lines = read_label_lines(&mut reader)?;
    log::debug!("read {} label lines", lines.len());
    let offsets = scan_label(&lines)?;
    let (spectrum, geometry) = SpectrumReader::new(reader, offsets)
        .with_band_count(band_count)
        .extract()?;
    Ok(Product {
        offsets,
        spectrum,
        geometry,
    })
}

/// Read label lines up to and including the scan terminator.
///
/// The label shares the file with binary data, so lines are decoded lossily
/// and reading stops as soon as the terminator is seen.
pub fn read_label_lines<R: BufRead>(reader: &mut R) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        let done = is_label_end(&line);
        lines.push(line);
        if done {
            break;
        }
    }
    Ok(lines)
}

// ---------------------------------------------------------------------------
// SpectrumReader – binary body decoding
// ---------------------------------------------------------------------------

/// Seeks into a product body at label-declared offsets and decodes the
/// fixed-point spectral arrays and the per-observation angles.
pub struct SpectrumReader<R> {
    reader: R,
    offsets: FieldOffsets,
    band_count: usize,
}

impl<R: Read + Seek> SpectrumReader<R> {
    pub fn new(reader: R, offsets: FieldOffsets) -> Self {
        Self {
            reader,
            offsets,
            band_count: RAW_BAND_COUNT,
        }
    }

    /// Override the bands per row (defaults to [`RAW_BAND_COUNT`]).
    pub fn with_band_count(mut self, band_count: usize) -> Self {
        self.band_count = band_count;
        self
    }

    /// Read exactly `len` bytes at 0-based `offset`, or fail as truncated.
    ///
    /// `len` comes from the label, so the buffer grows with what the source
    /// actually holds rather than being reserved up front.
    fn read_at(&mut self, section: &'static str, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut buf = Vec::new();
        (&mut self.reader).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() < len {
            return Err(Error::TruncatedData {
                section,
                offset,
                expected: len,
                actual: buf.len(),
            });
        }
        Ok(buf)
    }

    /// Decode `rows` rows of big-endian `u16` at a 1-based label pointer.
    fn read_rows(
        &mut self,
        section: &'static str,
        start: u64,
        rows: usize,
        scale: f64,
    ) -> Result<Vec<Vec<f64>>> {
        let row_len = self.band_count * 2;
        let offset = start
            .checked_sub(1)
            .ok_or_else(|| oversized(section, "pointer must be positive"))?;
        let len = rows
            .checked_mul(row_len)
            .ok_or_else(|| oversized(section, "row count overflows the addressable size"))?;
        let bytes = self.read_at(section, offset, len)?;
        Ok(bytes
            .chunks_exact(row_len)
            .map(|row| decode_u16_be(row, scale))
            .collect())
    }

    pub fn read_wavelengths(&mut self) -> Result<Vec<f64>> {
        let start = self.offsets.wavelength_start;
        let mut rows = self.read_rows("wavelength", start, 1, WAVELENGTH_SCALE)?;
        Ok(rows.pop().unwrap_or_default())
    }

    pub fn read_radiance(&mut self) -> Result<Vec<Vec<f64>>> {
        let FieldOffsets {
            radiance_start,
            radiance_rows,
            ..
        } = self.offsets;
        self.read_rows("radiance", radiance_start, radiance_rows, RADIANCE_SCALE)
    }

    pub fn read_reflectance(&mut self) -> Result<Vec<Vec<f64>>> {
        let FieldOffsets {
            reflectance_start,
            reflectance_rows,
            ..
        } = self.offsets;
        self.read_rows(
            "reflectance",
            reflectance_start,
            reflectance_rows,
            REFLECTANCE_SCALE,
        )
    }

    /// Byte position of one angle field of one observation's ancillary row.
    ///
    /// Both the table pointer and the column start byte are 1-based, hence
    /// the `- 2`.
    fn angle_position(&self, observation: usize, field_offset: u64) -> Option<u64> {
        (observation as u64)
            .checked_mul(self.offsets.row_bytes)?
            .checked_add(self.offsets.ancillary_start)?
            .checked_add(field_offset)?
            .checked_sub(2)
    }

    fn read_angle(&mut self, section: &'static str, observation: usize, field: u64) -> Result<f64> {
        let position = self
            .angle_position(observation, field)
            .ok_or_else(|| oversized(section, "byte position overflows"))?;
        let bytes = self.read_at(section, position, ANGLE_BYTES)?;
        Ok(f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64)
    }

    /// One geometry row per observation; each angle is seeked independently.
    pub fn read_geometry(&mut self) -> Result<GeometryTable> {
        let FieldOffsets {
            emission_offset,
            incidence_offset,
            phase_offset,
            observation_count,
            ..
        } = self.offsets;
        let observations = (0..observation_count)
            .map(|n| -> Result<ViewingGeometry> {
                let emission = self.read_angle("emission angle", n, emission_offset)?;
                let incidence = self.read_angle("incidence angle", n, incidence_offset)?;
                let phase = self.read_angle("phase angle", n, phase_offset)?;
                Ok(ViewingGeometry::new(incidence, emission, phase))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(GeometryTable::new(observations))
    }

    pub fn extract(mut self) -> Result<(Spectrum, GeometryTable)> {
        let spectrum = Spectrum {
            wavelengths: self.read_wavelengths()?,
            radiance: self.read_radiance()?,
            reflectance: self.read_reflectance()?,
        };
        let geometry = self.read_geometry()?;
        log::info!(
            "decoded {} radiance rows, {} reflectance rows, {} observations",
            spectrum.radiance.len(),
            spectrum.reflectance.len(),
            geometry.len()
        );
        Ok((spectrum, geometry))
    }
}

/// Label-declared sizes that cannot address any real byte range.
fn oversized(field: &'static str, reason: &str) -> Error {
    Error::MalformedLabel {
        field,
        reason: reason.to_string(),
    }
}

fn decode_u16_be(bytes: &[u8], scale: f64) -> Vec<f64> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]) as f64 * scale)
        .collect()
}

// ---------------------------------------------------------------------------
// Coefficient table loader
// ---------------------------------------------------------------------------

/// One line of the albedo coefficient table: `band, b0, h, c, g`.
#[derive(Debug, Deserialize)]
struct CoefficientRecord(String, f64, f64, f64, f64);

/// Load a comma-separated coefficient table from disk.
pub fn load_coefficients(path: &Path) -> Result<CoefficientTable> {
    let file = File::open(path)?;
    parse_coefficients(file)
}

/// Parse coefficient rows. No header row; the band label column is ignored.
pub fn parse_coefficients<R: Read>(reader: R) -> Result<CoefficientTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let rows = reader
        .deserialize()
        .map(|record| -> Result<HapkeCoefficients> {
            let CoefficientRecord(_band, b0, h, c, g) = record?;
            Ok(HapkeCoefficients { b0, h, c, g })
        })
        .collect::<Result<Vec<_>>>()?;
    log::debug!("parsed {} coefficient rows", rows.len());
    Ok(CoefficientTable::new(rows))
}
