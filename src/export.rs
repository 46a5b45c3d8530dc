use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::pipeline::PipelineOutput;

// ---------------------------------------------------------------------------
// Reflectance table
// ---------------------------------------------------------------------------

/// Write the wavelength column followed by one reflectance column per
/// observation: comma-delimited, one row per band, no header.
pub fn write_reflectance_csv<W: Write>(
    writer: W,
    wavelengths: &[f64],
    reflectance: &[Vec<f64>],
) -> Result<()> {
    if let Some(row) = reflectance.iter().find(|row| row.len() != wavelengths.len()) {
        return Err(Error::BandCountMismatch {
            expected: wavelengths.len(),
            actual: row.len(),
        });
    }
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    for (band, wavelength) in wavelengths.iter().enumerate() {
        let mut record = Vec::with_capacity(reflectance.len() + 1);
        record.push(*wavelength);
        record.extend(reflectance.iter().map(|row| row[band]));
        out.serialize(record)?;
    }
    out.flush()?;
    Ok(())
}

pub fn save_reflectance_csv(path: &Path, output: &PipelineOutput) -> Result<()> {
    let file = File::create(path)?;
    write_reflectance_csv(file, &output.wavelengths, &output.uncorrected)?;
    log::info!("wrote {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Per-observation table
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ObservationRow {
    wavelength: f64,
    reflectance: f64,
    photometric: f64,
    continuum: f64,
    continuum_removed: f64,
}

/// Write every stage of one observation over the wavelength extent, with a
/// header row.
pub fn write_observation_csv<W: Write>(
    writer: W,
    output: &PipelineOutput,
    observation: usize,
) -> Result<()> {
    output.check_observation(observation)?;
    let mut out = csv::Writer::from_writer(writer);
    for &band in &output.extent {
        out.serialize(ObservationRow {
            wavelength: output.wavelengths[band],
            reflectance: output.uncorrected[observation][band],
            photometric: output.photometric[observation][band],
            continuum: output.continuum[observation][band],
            continuum_removed: output.continuum_removed[observation][band],
        })?;
    }
    out.flush()?;
    Ok(())
}

pub fn save_observation_csv(path: &Path, output: &PipelineOutput, observation: usize) -> Result<()> {
    let file = File::create(path)?;
    write_observation_csv(file, output, observation)?;
    log::info!("wrote observation {observation} to {}", path.display());
    Ok(())
}
