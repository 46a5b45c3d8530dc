use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use sp_extract::config::REFERENCE_GEOMETRY;
use sp_extract::data::model::ViewingGeometry;
use sp_extract::data::synthetic::SyntheticProduct;
use sp_extract::export::{save_observation_csv, save_reflectance_csv};
use sp_extract::{Error, Pipeline, ProcessingConfig};

fn write_product(dir: &Path, product: &SyntheticProduct) -> PathBuf {
    let path = dir.join("product.spc");
    product.write_to(&path).unwrap();
    path
}

/// Isotropic scatterer without opposition surge, one row per band.
fn write_isotropic_coefficients(dir: &Path, rows: usize) -> PathBuf {
    let path = dir.join("coefficients.csv");
    let text: String = (0..rows)
        .map(|band| format!("{band},0.0,0.05,0.0,0.0\n"))
        .collect();
    fs::write(&path, text).unwrap();
    path
}

fn two_observations() -> SyntheticProduct {
    SyntheticProduct::flat(
        0.1,
        vec![REFERENCE_GEOMETRY, ViewingGeometry::new(50.0, 4.0, 53.0)],
    )
}

#[test]
fn flat_product_at_reference_geometry() {
    let dir = TempDir::new().unwrap();
    let product = write_product(dir.path(), &two_observations());
    let coefficients = write_isotropic_coefficients(dir.path(), 185);

    let pipeline = Pipeline::new(ProcessingConfig::default()).unwrap();
    let out = pipeline.run(&product, &coefficients).unwrap();

    assert_eq!(out.observation_count(), 2);
    assert_eq!(out.wavelengths.len(), 273);
    assert_eq!(out.geometry.get(0), Some(&REFERENCE_GEOMETRY));

    for (corrected, raw) in out.photometric[0].iter().zip(&out.uncorrected[0]) {
        assert_eq!(corrected, raw);
        assert!((raw - 0.1).abs() < 1e-9);
    }
    assert!(out.continuum_removed[0]
        .iter()
        .all(|&v| (v - 1.0).abs() < 1e-12));

    // Away from the reference geometry the tabulated bands are rescaled.
    assert!((out.photometric[1][0] - 0.1).abs() > 1e-6);
}

#[test]
fn exports_reflectance_and_observation_tables() {
    let dir = TempDir::new().unwrap();
    let product = write_product(dir.path(), &two_observations());
    let coefficients = write_isotropic_coefficients(dir.path(), 185);
    let out = Pipeline::new(ProcessingConfig::default())
        .unwrap()
        .run(&product, &coefficients)
        .unwrap();

    let table = dir.path().join("reflectance_csv.txt");
    save_reflectance_csv(&table, &out).unwrap();
    let text = fs::read_to_string(&table).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 273);
    assert!(lines.iter().all(|line| line.split(',').count() == 3));

    let single = dir.path().join("observation_1.csv");
    save_observation_csv(&single, &out, 1).unwrap();
    let text = fs::read_to_string(&single).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("wavelength,reflectance,photometric,continuum,continuum_removed")
    );
    assert_eq!(lines.count(), out.extent.len());
}

#[test]
fn truncated_product_is_reported() {
    let dir = TempDir::new().unwrap();
    let mut bytes = two_observations().to_bytes();
    bytes.truncate(bytes.len() - 2 * 32 - 10);
    let product = dir.path().join("short.spc");
    fs::write(&product, bytes).unwrap();
    let coefficients = write_isotropic_coefficients(dir.path(), 10);

    let err = Pipeline::new(ProcessingConfig::default())
        .unwrap()
        .run(&product, &coefficients)
        .unwrap_err();
    assert!(matches!(err, Error::TruncatedData { .. }), "{err}");
}

#[test]
fn missing_label_pointer_is_reported() {
    let dir = TempDir::new().unwrap();
    let source = two_observations();
    let label = source.label();
    let stripped: String = label
        .split_inclusive('\n')
        .filter(|line| !line.starts_with("^SP_SPECTRUM_REF"))
        .collect();
    let mut bytes = source.to_bytes();
    bytes.splice(..label.len(), stripped.bytes());
    let product = dir.path().join("broken.spc");
    fs::write(&product, bytes).unwrap();
    let coefficients = write_isotropic_coefficients(dir.path(), 10);

    let err = Pipeline::new(ProcessingConfig::default())
        .unwrap()
        .run(&product, &coefficients)
        .unwrap_err();
    assert!(matches!(err, Error::MalformedLabel { .. }), "{err}");
}

#[test]
fn config_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "wavelength_limit": 1000.0, "geometry_policy": "propagate" }"#).unwrap();
    let config = ProcessingConfig::from_json_file(&path).unwrap();
    assert_eq!(config.wavelength_limit, 1000.0);
    assert_eq!(config.raw_band_count, 296);

    let product = write_product(dir.path(), &two_observations());
    let coefficients = write_isotropic_coefficients(dir.path(), 50);
    let out = Pipeline::new(config).unwrap().run(&product, &coefficients).unwrap();
    assert!(out.extent.iter().all(|&band| out.wavelengths[band] <= 1000.0));
}
