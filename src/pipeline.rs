use std::path::Path;

use crate::config::ProcessingConfig;
use crate::correction::continuum::remove_continuum;
use crate::correction::photometric::PhotometricModel;
use crate::data::filter::{band_indices, wavelength_extent, BandMask};
use crate::data::loader::{load_coefficients, load_product};
use crate::data::model::{CoefficientTable, GeometryTable, Spectrum};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// PipelineOutput
// ---------------------------------------------------------------------------

/// Cleaned and corrected arrays of one product, ready for export or display.
///
/// Every matrix is observations × cleaned bands and shares the
/// `wavelengths` axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Cleaned band centres in nm.
    pub wavelengths: Vec<f64>,
    pub radiance: Vec<Vec<f64>>,
    /// Cleaned reflectance before any correction.
    pub uncorrected: Vec<Vec<f64>>,
    pub photometric: Vec<Vec<f64>>,
    pub continuum_removed: Vec<Vec<f64>>,
    /// Linear continuum baseline per observation.
    pub continuum: Vec<Vec<f64>>,
    pub geometry: GeometryTable,
    /// Short and long continuum anchor bands.
    pub anchors: [usize; 2],
    /// Bands at or below the configured wavelength limit.
    pub extent: Vec<usize>,
}

impl PipelineOutput {
    pub fn observation_count(&self) -> usize {
        self.uncorrected.len()
    }

    pub fn check_observation(&self, observation: usize) -> Result<()> {
        if observation >= self.observation_count() {
            return Err(Error::UnknownObservation {
                observation,
                available: self.observation_count(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Clean → photometric correction → continuum removal.
///
/// Each stage returns new arrays; nothing upstream is modified, so the
/// uncorrected reflectance stays available next to the corrected ones.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ProcessingConfig,
    mask: BandMask,
    model: PhotometricModel,
}

impl Pipeline {
    pub fn new(config: ProcessingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            mask: BandMask::new(config.raw_band_count, config.band_gap),
            model: PhotometricModel::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Load a product and its coefficient table from disk and process them.
    pub fn run(&self, product: &Path, coefficients: &Path) -> Result<PipelineOutput> {
        log::info!("reading product {}", product.display());
        let product = load_product(product, self.config.raw_band_count)?;
        log::info!("reading coefficients {}", coefficients.display());
        let coefficients = load_coefficients(coefficients)?;
        self.process(&product.spectrum, &product.geometry, &coefficients)
    }

    /// Process already-decoded arrays.
    pub fn process(
        &self,
        spectrum: &Spectrum,
        geometry: &GeometryTable,
        coefficients: &CoefficientTable,
    ) -> Result<PipelineOutput> {
        let Spectrum {
            wavelengths,
            radiance,
            reflectance: uncorrected,
        } = self.mask.clean_spectrum(spectrum)?;
        log::info!(
            "cleaned {} → {} bands",
            self.mask.raw_band_count(),
            self.mask.cleaned_band_count()
        );

        if coefficients.len() > wavelengths.len() {
            return Err(Error::CoefficientOverflow {
                rows: coefficients.len(),
                bands: wavelengths.len(),
            });
        }
        let photometric = self.model.correct(&uncorrected, geometry, coefficients)?;

        let anchors: [usize; 2] = band_indices(&wavelengths, &self.config.continuum_anchors)?
            .try_into()
            .map_err(|_| Error::OutOfRange {
                band: 0,
                available: wavelengths.len(),
            })?;
        log::debug!(
            "continuum anchors: bands {anchors:?} at {} / {} nm",
            wavelengths[anchors[0]],
            wavelengths[anchors[1]]
        );

        let (continuum_removed, continuum): (Vec<_>, Vec<_>) = photometric
            .iter()
            .map(|row| remove_continuum(&wavelengths, row, anchors))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .map(|removal| (removal.removed, removal.baseline))
            .unzip();

        let extent = wavelength_extent(&wavelengths, self.config.wavelength_limit)?;
        log::info!(
            "processed {} observations; {} bands at or below {} nm",
            photometric.len(),
            extent.len(),
            self.config.wavelength_limit
        );

        Ok(PipelineOutput {
            wavelengths,
            radiance,
            uncorrected,
            photometric,
            continuum_removed,
            continuum,
            geometry: geometry.clone(),
            anchors,
            extent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::REFERENCE_GEOMETRY;
    use crate::data::model::{HapkeCoefficients, ViewingGeometry};
    use crate::data::synthetic::sp_wavelengths;

    fn spectrum(rows: usize, value: f64) -> Spectrum {
        Spectrum {
            wavelengths: sp_wavelengths(),
            radiance: vec![vec![value * 100.0; 296]; rows],
            reflectance: vec![vec![value; 296]; rows],
        }
    }

    fn isotropic(rows: usize) -> CoefficientTable {
        CoefficientTable::new(vec![
            HapkeCoefficients {
                b0: 0.0,
                h: 0.05,
                c: 0.0,
                g: 0.0,
            };
            rows
        ])
    }

    #[test]
    fn shapes_follow_cleaned_bands() {
        let pipeline = Pipeline::new(ProcessingConfig::default()).unwrap();
        let geometry = GeometryTable::new(vec![REFERENCE_GEOMETRY; 3]);
        let out = pipeline
            .process(&spectrum(3, 0.1), &geometry, &isotropic(185))
            .unwrap();
        assert_eq!(out.wavelengths.len(), 273);
        for matrix in [&out.uncorrected, &out.photometric, &out.continuum_removed, &out.continuum] {
            assert_eq!(matrix.len(), 3);
            assert!(matrix.iter().all(|row| row.len() == 273));
        }
        assert!(out.extent.iter().all(|&i| out.wavelengths[i] <= 1652.0));
    }

    #[test]
    fn anchors_resolve_in_order() {
        let pipeline = Pipeline::new(ProcessingConfig::default()).unwrap();
        let geometry = GeometryTable::new(vec![REFERENCE_GEOMETRY]);
        let out = pipeline
            .process(&spectrum(1, 0.1), &geometry, &isotropic(10))
            .unwrap();
        let [short, long] = out.anchors;
        assert!(short < long);
        assert!((out.wavelengths[short] - 752.8).abs() < 3.1);
        assert!((out.wavelengths[long] - 1547.7).abs() < 3.1);
    }

    #[test]
    fn uncorrected_is_preserved() {
        let pipeline = Pipeline::new(ProcessingConfig::default()).unwrap();
        let geometry = GeometryTable::new(vec![ViewingGeometry::new(60.0, 5.0, 62.0)]);
        let out = pipeline
            .process(&spectrum(1, 0.1), &geometry, &isotropic(185))
            .unwrap();
        assert!(out.uncorrected[0].iter().all(|&v| v == 0.1));
        assert_ne!(out.photometric[0][0], 0.1);
        // past the coefficient table the photometric step passes values through
        assert_eq!(out.photometric[0][200], 0.1);
    }

    #[test]
    fn coefficient_table_longer_than_bands_rejected() {
        let pipeline = Pipeline::new(ProcessingConfig::default()).unwrap();
        let geometry = GeometryTable::new(vec![REFERENCE_GEOMETRY]);
        let err = pipeline
            .process(&spectrum(1, 0.1), &geometry, &isotropic(274))
            .unwrap_err();
        assert!(matches!(err, Error::CoefficientOverflow { rows: 274, bands: 273 }));
    }

    #[test]
    fn wavelength_limit_below_spectrum_rejected() {
        let config = ProcessingConfig {
            wavelength_limit: 100.0,
            ..ProcessingConfig::default()
        };
        let pipeline = Pipeline::new(config).unwrap();
        let geometry = GeometryTable::new(vec![REFERENCE_GEOMETRY]);
        let err = pipeline
            .process(&spectrum(1, 0.1), &geometry, &isotropic(10))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidWavelengthLimit { .. }));
    }

    #[test]
    fn coinciding_anchor_wavelengths_are_degenerate() {
        // Both anchors fall past the long end of the grid and resolve to the last band.
        let config = ProcessingConfig {
            continuum_anchors: [5000.0, 6000.0],
            ..ProcessingConfig::default()
        };
        let pipeline = Pipeline::new(config).unwrap();
        let geometry = GeometryTable::new(vec![REFERENCE_GEOMETRY]);
        let err = pipeline
            .process(&spectrum(1, 0.1), &geometry, &isotropic(10))
            .unwrap_err();
        assert!(matches!(err, Error::DegenerateContinuum { band: 272, .. }));
    }

    #[test]
    fn unknown_observation() {
        let pipeline = Pipeline::new(ProcessingConfig::default()).unwrap();
        let geometry = GeometryTable::new(vec![REFERENCE_GEOMETRY]);
        let out = pipeline
            .process(&spectrum(1, 0.1), &geometry, &isotropic(10))
            .unwrap();
        assert!(out.check_observation(0).is_ok());
        assert!(matches!(
            out.check_observation(1),
            Err(Error::UnknownObservation { observation: 1, available: 1 })
        ));
    }
}
