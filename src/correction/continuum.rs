use crate::error::{Error, Result};

/// Continuum removal result for one observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuumRemoval {
    /// Spectrum divided by the baseline.
    pub removed: Vec<f64>,
    /// Linear baseline evaluated at every wavelength.
    pub baseline: Vec<f64>,
    pub slope: f64,
    pub intercept: f64,
}

/// Fit a straight line through the spectrum at two anchor bands and divide
/// the spectrum by it.
///
/// `anchors[0]` is the short-wavelength anchor and `anchors[1]` the long one.
/// The baseline passes exactly through both anchor values, so the removed
/// spectrum is exactly 1.0 there. Anchor values that are zero or non-finite
/// are rejected as [`Error::DegenerateContinuum`].
pub fn remove_continuum(
    wavelengths: &[f64],
    spectrum: &[f64],
    anchors: [usize; 2],
) -> Result<ContinuumRemoval> {
    if spectrum.len() != wavelengths.len() {
        return Err(Error::BandCountMismatch {
            expected: wavelengths.len(),
            actual: spectrum.len(),
        });
    }
    for band in anchors {
        if band >= wavelengths.len() {
            return Err(Error::OutOfRange {
                band,
                available: wavelengths.len(),
            });
        }
    }

    let [short, long] = anchors;
    let (wv1, wv2) = (wavelengths[short], wavelengths[long]);
    let (y1, y2) = (spectrum[short], spectrum[long]);
    if wv2 == wv1 {
        return Err(Error::DegenerateContinuum {
            band: short,
            wavelength: wv1,
            reason: "both anchors resolve to the same wavelength",
        });
    }
    // A zero anchor would put 0/0 into the removed spectrum at that band.
    for (band, value) in [(short, y1), (long, y2)] {
        if value == 0.0 || !value.is_finite() {
            return Err(Error::DegenerateContinuum {
                band,
                wavelength: wavelengths[band],
                reason: "anchor reflectance is zero or non-finite",
            });
        }
    }

    let slope = (y2 - y1) / (wv2 - wv1);
    let intercept = y1 - slope * wv1;

    // Evaluate from the nearer anchor so both anchor values come back exactly.
    let baseline: Vec<f64> = wavelengths
        .iter()
        .map(|&wv| {
            let t = (wv - wv1) / (wv2 - wv1);
            if t < 0.5 {
                y1 + (y2 - y1) * t
            } else {
                y2 - (y2 - y1) * (1.0 - t)
            }
        })
        .collect();
    let removed = spectrum
        .iter()
        .zip(&baseline)
        .map(|(value, base)| value / base)
        .collect();

    Ok(ContinuumRemoval {
        removed,
        baseline,
        slope,
        intercept,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wavelengths() -> Vec<f64> {
        (0..50).map(|i| 700.0 + 17.3 * i as f64).collect()
    }

    #[test]
    fn anchors_are_exactly_one() {
        let wv = wavelengths();
        let spectrum: Vec<f64> = wv
            .iter()
            .map(|w| 0.08 + 0.00013 * w + 0.01 * (w / 97.0).sin())
            .collect();
        for anchors in [[3, 41], [0, 49], [10, 11]] {
            let result = remove_continuum(&wv, &spectrum, anchors).unwrap();
            assert_eq!(result.removed[anchors[0]], 1.0);
            assert_eq!(result.removed[anchors[1]], 1.0);
        }
    }

    #[test]
    fn flat_spectrum_removes_to_one() {
        let wv = wavelengths();
        let spectrum = vec![0.1; wv.len()];
        let result = remove_continuum(&wv, &spectrum, [5, 40]).unwrap();
        assert!(result.removed.iter().all(|&v| v == 1.0));
        assert!(result.baseline.iter().all(|&v| v == 0.1));
        assert_eq!(result.slope, 0.0);
    }

    #[test]
    fn linear_spectrum_matches_slope_intercept() {
        let wv = wavelengths();
        let spectrum: Vec<f64> = wv.iter().map(|w| 0.05 + 0.0001 * w).collect();
        let result = remove_continuum(&wv, &spectrum, [2, 30]).unwrap();
        assert!((result.slope - 0.0001).abs() < 1e-12);
        assert!((result.intercept - 0.05).abs() < 1e-9);
        for (w, base) in wv.iter().zip(&result.baseline) {
            assert!((result.slope * w + result.intercept - base).abs() < 1e-12);
        }
        assert!(result.removed.iter().all(|v| (v - 1.0).abs() < 1e-9));
    }

    #[test]
    fn coincident_anchors_are_degenerate() {
        let wv = wavelengths();
        let spectrum = vec![0.1; wv.len()];
        let err = remove_continuum(&wv, &spectrum, [7, 7]).unwrap_err();
        assert!(matches!(err, Error::DegenerateContinuum { band: 7, .. }));
    }

    #[test]
    fn anchor_past_end_is_out_of_range() {
        let wv = wavelengths();
        let spectrum = vec![0.1; wv.len()];
        let err = remove_continuum(&wv, &spectrum, [0, 50]).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { band: 50, available: 50 }));
    }

    #[test]
    fn zero_anchor_reflectance_is_degenerate() {
        let wv = wavelengths();
        let mut spectrum = vec![0.1; wv.len()];
        spectrum[40] = 0.0;
        let err = remove_continuum(&wv, &spectrum, [5, 40]).unwrap_err();
        match err {
            Error::DegenerateContinuum {
                band, wavelength, ..
            } => {
                assert_eq!(band, 40);
                assert_eq!(wavelength, wv[40]);
            }
            other => panic!("expected DegenerateContinuum, got {other:?}"),
        }

        spectrum[40] = 0.1;
        spectrum[5] = f64::NAN;
        let err = remove_continuum(&wv, &spectrum, [5, 40]).unwrap_err();
        assert!(matches!(err, Error::DegenerateContinuum { band: 5, .. }));
    }
}
