use crate::config::BandGap;
use crate::data::model::{BandArray, Spectrum};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// BandMask – drops the detector-overlap bands
// ---------------------------------------------------------------------------

/// Boolean keep-mask over the raw bands: `true` everywhere except the gap.
///
/// The same mask applies to the wavelength vector and to every row of a
/// radiance/reflectance matrix, so cleaned arrays stay band-aligned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandMask {
    keep: Vec<bool>,
}

impl BandMask {
    pub fn new(raw_band_count: usize, gap: BandGap) -> Self {
        Self {
            keep: (0..raw_band_count).map(|band| !gap.contains(band)).collect(),
        }
    }

    pub fn raw_band_count(&self) -> usize {
        self.keep.len()
    }

    pub fn cleaned_band_count(&self) -> usize {
        self.keep.iter().filter(|&&k| k).count()
    }

    /// Apply the mask to one raw row.
    pub fn apply<T: Copy>(&self, row: &[T]) -> Result<Vec<T>> {
        if row.len() != self.keep.len() {
            return Err(Error::BandCountMismatch {
                expected: self.keep.len(),
                actual: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(&self.keep)
            .filter(|(_, &k)| k)
            .map(|(&v, _)| v)
            .collect())
    }

    fn clean_vector(&self, vector: &[f64]) -> Result<Vec<f64>> {
        self.apply(vector)
    }

    fn clean_matrix(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|row| self.apply(row)).collect()
    }

    /// Clean a vector or every row of a matrix. The input is left untouched.
    pub fn clean(&self, array: &BandArray) -> Result<BandArray> {
        match array {
            BandArray::Vector(v) => self.clean_vector(v).map(BandArray::Vector),
            BandArray::Matrix(rows) => self.clean_matrix(rows).map(BandArray::Matrix),
        }
    }

    /// Clean the wavelength vector and both matrices of a decoded product,
    /// keeping them band-aligned.
    pub fn clean_spectrum(&self, spectrum: &Spectrum) -> Result<Spectrum> {
        Ok(Spectrum {
            wavelengths: self.clean_vector(&spectrum.wavelengths)?,
            radiance: self.clean_matrix(&spectrum.radiance)?,
            reflectance: self.clean_matrix(&spectrum.reflectance)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Band index lookup
// ---------------------------------------------------------------------------

/// Index of the band closest to `target`; ties go to the lower index.
pub fn nearest_band(wavelengths: &[f64], target: f64) -> Option<usize> {
    wavelengths
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - target).abs().total_cmp(&(*b - target).abs()))
        .map(|(i, _)| i)
}

/// Nearest band for each target, in the order the targets were given.
///
/// Continuum removal relies on that order: the first index is the short
/// wavelength anchor, the second the long one.
pub fn band_indices(wavelengths: &[f64], targets: &[f64]) -> Result<Vec<usize>> {
    targets
        .iter()
        .map(|&target| {
            nearest_band(wavelengths, target).ok_or(Error::OutOfRange {
                band: 0,
                available: 0,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Wavelength extent
// ---------------------------------------------------------------------------

/// Indices of bands at or below `limit`, used to crop exports and plots.
///
/// An empty selection means the limit sits below the whole spectrum and is
/// reported as [`Error::InvalidWavelengthLimit`].
pub fn wavelength_extent(wavelengths: &[f64], limit: f64) -> Result<Vec<usize>> {
    let extent: Vec<usize> = wavelengths
        .iter()
        .enumerate()
        .filter(|(_, &wv)| wv <= limit)
        .map(|(i, _)| i)
        .collect();
    if extent.is_empty() {
        let minimum = wavelengths.iter().copied().fold(f64::INFINITY, f64::min);
        return Err(Error::InvalidWavelengthLimit { limit, minimum });
    }
    Ok(extent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_mask() -> BandMask {
        BandMask::new(296, BandGap::default())
    }

    #[test]
    fn identity_vector_drops_gap() {
        let identity: Vec<usize> = (0..296).collect();
        let cleaned = default_mask().apply(&identity).unwrap();
        let expected: Vec<usize> = (0..=60).chain(84..=295).collect();
        assert_eq!(cleaned, expected);
        assert_eq!(cleaned.len(), 273);
    }

    #[test]
    fn band_counts() {
        let mask = default_mask();
        assert_eq!(mask.raw_band_count(), 296);
        assert_eq!(mask.cleaned_band_count(), 273);
    }

    #[test]
    fn same_mask_for_both_ranks() {
        let mask = default_mask();
        let row: Vec<f64> = (0..296).map(|i| i as f64).collect();
        let vector = mask.clean(&BandArray::Vector(row.clone())).unwrap();
        let matrix = mask
            .clean(&BandArray::Matrix(vec![row.clone(), row]))
            .unwrap()
            .into_matrix()
            .unwrap();
        let vector = vector.into_vector().unwrap();
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix[0], vector);
        assert_eq!(matrix[1], vector);
    }

    #[test]
    fn wrong_band_count_rejected() {
        let err = default_mask().clean(&BandArray::Vector(vec![0.0; 295])).unwrap_err();
        assert!(matches!(
            err,
            Error::BandCountMismatch {
                expected: 296,
                actual: 295
            }
        ));
    }

    #[test]
    fn spectrum_cleaned_like_tagged_arrays() {
        let mask = default_mask();
        let row: Vec<f64> = (0..296).map(|i| i as f64).collect();
        let spectrum = Spectrum {
            wavelengths: row.clone(),
            radiance: vec![row.clone()],
            reflectance: vec![row.clone(), row.clone()],
        };
        let cleaned = mask.clean_spectrum(&spectrum).unwrap();
        let vector = mask
            .clean(&BandArray::Vector(row))
            .unwrap()
            .into_vector()
            .unwrap();
        assert_eq!(cleaned.wavelengths, vector);
        assert_eq!(cleaned.radiance, vec![vector.clone()]);
        assert_eq!(cleaned.reflectance, vec![vector.clone(), vector]);
    }

    #[test]
    fn ragged_spectrum_rejected() {
        let spectrum = Spectrum {
            wavelengths: vec![0.0; 296],
            radiance: vec![vec![0.0; 296]],
            reflectance: vec![vec![0.0; 296], vec![0.0; 290]],
        };
        let err = default_mask().clean_spectrum(&spectrum).unwrap_err();
        assert!(matches!(err, Error::BandCountMismatch { expected: 296, actual: 290 }));
    }

    #[test]
    fn nearest_band_exact_and_between() {
        let wv = [500.0, 510.0, 520.0, 530.0];
        assert_eq!(nearest_band(&wv, 520.0), Some(2));
        assert_eq!(nearest_band(&wv, 513.0), Some(1));
        assert_eq!(nearest_band(&wv, 10_000.0), Some(3));
        assert_eq!(nearest_band(&[], 500.0), None);
    }

    #[test]
    fn nearest_band_tie_takes_lower_index() {
        let wv = [500.0, 510.0, 520.0];
        assert_eq!(nearest_band(&wv, 505.0), Some(0));
        assert_eq!(nearest_band(&wv, 515.0), Some(1));
    }

    #[test]
    fn nearest_band_is_minimal() {
        let wv: Vec<f64> = (0..100).map(|i| 400.0 + 7.3 * i as f64).collect();
        for target in [401.0, 777.7, 1000.0, 1120.4] {
            let i = nearest_band(&wv, target).unwrap();
            assert!(wv.iter().all(|w| (wv[i] - target).abs() <= (w - target).abs()));
        }
    }

    #[test]
    fn band_indices_keep_order() {
        let wv = [500.0, 600.0, 700.0];
        assert_eq!(band_indices(&wv, &[690.0, 510.0]).unwrap(), vec![2, 0]);
    }

    #[test]
    fn extent_is_inclusive() {
        let wv = [500.0, 600.0, 700.0];
        assert_eq!(wavelength_extent(&wv, 600.0).unwrap(), vec![0, 1]);
    }

    #[test]
    fn extent_below_spectrum_rejected() {
        let err = wavelength_extent(&[500.0, 600.0], 400.0).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidWavelengthLimit {
                limit,
                minimum
            } if limit == 400.0 && minimum == 500.0
        ));
    }
}
