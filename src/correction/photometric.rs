//! Hapke-style photometric normalisation.
//!
//! Each band's reflectance is rescaled from the geometry it was observed at
//! to the reference geometry with two ratios: a Lunar-Lambert limb-darkening
//! ratio (`xl_fixed / xl_observed`) and a phase-function ratio
//! (`f_fixed / f_observed`) built from per-band Hapke coefficients.

use crate::config::{GeometryPolicy, LunarLambert, ProcessingConfig};
use crate::data::model::{CoefficientTable, GeometryTable, HapkeCoefficients, ViewingGeometry};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Phase function
// ---------------------------------------------------------------------------

/// One Henyey–Greenstein lobe; `g` may be negative for the backward lobe.
fn single_particle(g: f64, phase: f64) -> f64 {
    (1.0 - g * g) / (1.0 + g * g - 2.0 * g * phase.to_radians().cos().powf(1.5))
}

/// Two-lobe Henyey–Greenstein mixture weighted by `c`.
pub fn henyey_greenstein(coefficients: &HapkeCoefficients, phase: f64) -> f64 {
    let HapkeCoefficients { c, g, .. } = *coefficients;
    ((1.0 - c) / 2.0) * single_particle(g, phase) + ((1.0 + c) / 2.0) * single_particle(-g, phase)
}

/// Phase function including the opposition surge: `(1 + B(phase)) · P(phase)`.
pub fn phase_function(coefficients: &HapkeCoefficients, phase: f64) -> f64 {
    let HapkeCoefficients { b0, h, .. } = *coefficients;
    let surge = b0 / (1.0 + (phase / 2.0).to_radians().tan() / h);
    (1.0 + surge) * henyey_greenstein(coefficients, phase)
}

// ---------------------------------------------------------------------------
// Lunar-Lambert
// ---------------------------------------------------------------------------

/// Limb-darkening weight `L(phase) = 1 + c1·α + c2·α² + c3·α³`, α in degrees.
pub fn lunar_lambert_weight(poly: &LunarLambert, phase: f64) -> f64 {
    1.0 + poly.c1 * phase + poly.c2 * phase.powi(2) + poly.c3 * phase.powi(3)
}

/// Lunar-Lambert reflectance `2L·cos i / (cos i + cos e) + (1 − L)·cos i`.
pub fn lunar_lambert(poly: &LunarLambert, geometry: &ViewingGeometry) -> f64 {
    let l = lunar_lambert_weight(poly, geometry.phase);
    let cosi = geometry.incidence.to_radians().cos();
    let cose = geometry.emission.to_radians().cos();
    2.0 * l * (cosi / (cosi + cose)) + (1.0 - l) * cosi
}

fn usable(value: f64) -> bool {
    value.is_finite() && value != 0.0
}

// ---------------------------------------------------------------------------
// PhotometricModel
// ---------------------------------------------------------------------------

/// Per-run state of the photometric correction.
///
/// The reference-geometry Lunar-Lambert value is computed once here and
/// shared by every band and observation.
#[derive(Debug, Clone)]
pub struct PhotometricModel {
    reference: ViewingGeometry,
    poly: LunarLambert,
    policy: GeometryPolicy,
    xl_fixed: f64,
}

impl PhotometricModel {
    pub fn new(config: &ProcessingConfig) -> Self {
        let reference = config.reference_geometry;
        let poly = config.lunar_lambert;
        Self {
            reference,
            poly,
            policy: config.geometry_policy,
            xl_fixed: lunar_lambert(&poly, &reference),
        }
    }

    /// Lunar-Lambert value at the reference geometry.
    pub fn xl_fixed(&self) -> f64 {
        self.xl_fixed
    }

    /// Correction factor `xl_ratio · f_ratio` for one observation of one band.
    fn factor(
        &self,
        band: usize,
        observation: usize,
        geometry: &ViewingGeometry,
        coefficients: &HapkeCoefficients,
        f_fixed: f64,
    ) -> Result<f64> {
        let xl_observed = lunar_lambert(&self.poly, geometry);
        let f_observed = phase_function(coefficients, geometry.phase);
        let factor = (self.xl_fixed / xl_observed) * (f_fixed / f_observed);

        let reason = if !usable(xl_observed) {
            Some("Lunar-Lambert value is zero or non-finite")
        } else if !usable(f_observed) {
            Some("phase function is zero or non-finite")
        } else if !factor.is_finite() {
            Some("correction factor is non-finite")
        } else {
            None
        };
        match (reason, self.policy) {
            (Some(reason), GeometryPolicy::Reject) => Err(Error::DegenerateGeometry {
                observation,
                band,
                reason,
            }),
            (Some(reason), GeometryPolicy::Propagate) => {
                log::warn!("band {band}, observation {observation}: {reason}; propagating");
                Ok(factor)
            }
            (None, _) => Ok(factor),
        }
    }

    /// Correct one band's reflectance column (one value per observation).
    ///
    /// `band` must index a row of `coefficients`; bands past the table are
    /// the caller's to pass through.
    pub fn correct_band(
        &self,
        band: usize,
        column: &[f64],
        geometry: &GeometryTable,
        coefficients: &CoefficientTable,
    ) -> Result<Vec<f64>> {
        let coeffs = coefficients.get(band).ok_or(Error::OutOfRange {
            band,
            available: coefficients.len(),
        })?;
        if column.len() != geometry.len() {
            return Err(Error::ObservationMismatch {
                reflectance_rows: column.len(),
                observations: geometry.len(),
            });
        }
        let f_fixed = phase_function(coeffs, self.reference.phase);

        column
            .iter()
            .zip(geometry.iter())
            .enumerate()
            .map(|(obs, (&value, geom))| {
                self.factor(band, obs, geom, coeffs, f_fixed)
                    .map(|factor| value * factor)
            })
            .collect()
    }

    /// Correct every band covered by `coefficients`, returning a new matrix.
    ///
    /// Bands past the end of the table are copied through unchanged; the
    /// input matrix is never modified.
    pub fn correct(
        &self,
        reflectance: &[Vec<f64>],
        geometry: &GeometryTable,
        coefficients: &CoefficientTable,
    ) -> Result<Vec<Vec<f64>>> {
        if reflectance.len() != geometry.len() {
            return Err(Error::ObservationMismatch {
                reflectance_rows: reflectance.len(),
                observations: geometry.len(),
            });
        }
        let bands = reflectance.first().map_or(0, Vec::len);
        if let Some(row) = reflectance.iter().find(|row| row.len() != bands) {
            return Err(Error::BandCountMismatch {
                expected: bands,
                actual: row.len(),
            });
        }
        if coefficients.len() > bands {
            return Err(Error::CoefficientOverflow {
                rows: coefficients.len(),
                bands,
            });
        }

        let mut corrected = reflectance.to_vec();
        for band in 0..coefficients.len() {
            let column: Vec<f64> = reflectance.iter().map(|row| row[band]).collect();
            let column = self.correct_band(band, &column, geometry, coefficients)?;
            for (row, value) in corrected.iter_mut().zip(column) {
                row[band] = value;
            }
        }
        log::info!(
            "photometrically corrected {} of {bands} bands for {} observations",
            coefficients.len(),
            geometry.len()
        );
        Ok(corrected)
    }
}
