use std::io::Write;

use anyhow::{Context, Result};

use sp_extract::data::model::ViewingGeometry;
use sp_extract::data::synthetic::{sp_wavelengths, SyntheticProduct};
use sp_extract::ProcessingConfig;

/// Coefficients are tabulated up to this wavelength (nm).
const COEFFICIENT_LIMIT: f64 = 1652.1;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Red-sloped continuum with mafic absorptions near 1 and 2 µm.
fn generate_spectrum(
    wavelengths: &[f64],
    albedo: f64,
    bands: &[(f64, f64, f64)],
    noise_level: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&wv| {
            let continuum = albedo * (1.0 + 0.0004 * (wv - 750.0));
            let absorption: f64 = bands
                .iter()
                .map(|&(mu, sigma, depth)| gaussian(wv, mu, sigma, depth))
                .sum();
            (continuum * (1.0 - absorption) + rng.gauss(0.0, noise_level)).max(0.0)
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Smoothly varying Hapke parameters for each cleaned band up to the limit.
fn write_coefficients(path: &str, wavelengths: &[f64]) -> Result<usize> {
    let mut file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut rows = 0;
    for &wv in wavelengths.iter().filter(|&&wv| wv <= COEFFICIENT_LIMIT) {
        let x = (wv - 500.0) / 1200.0;
        let b0 = 1.6 - 0.5 * x;
        let h = 0.05 + 0.02 * x;
        let c = 0.45 - 0.15 * x;
        let g = 0.28 - 0.06 * x;
        writeln!(file, "{wv:.1},{b0:.5},{h:.5},{c:.5},{g:.5}")?;
        rows += 1;
    }
    Ok(rows)
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);
    let wavelengths = sp_wavelengths();

    let observations = 12;
    let mut geometry = Vec::with_capacity(observations);
    let mut radiance: Vec<Vec<f64>> = Vec::with_capacity(observations);
    let mut reflectance = Vec::with_capacity(observations);

    for _ in 0..observations {
        let incidence = rng.uniform(20.0, 70.0);
        let emission = rng.uniform(0.0, 8.0);
        let phase = incidence + rng.uniform(-emission, emission);
        geometry.push(ViewingGeometry::new(incidence, emission, phase));

        let albedo = rng.uniform(0.08, 0.2);
        let bands = [
            (1000.0, 90.0, rng.uniform(0.05, 0.2)),
            (2000.0, 220.0, rng.uniform(0.02, 0.1)),
        ];
        let row = generate_spectrum(&wavelengths, albedo, &bands, 0.0015, &mut rng);
        let sun = incidence.to_radians().cos() * 150.0;
        radiance.push(row.iter().map(|r| r * sun).collect());
        reflectance.push(row);
    }

    let product = SyntheticProduct::from_physical(&wavelengths, &radiance, &reflectance, geometry);
    let output_path = "sample.spc";
    product
        .write_to(std::path::Path::new(output_path))
        .with_context(|| format!("writing {output_path}"))?;

    let config = ProcessingConfig::default();
    let cleaned: Vec<f64> = wavelengths
        .iter()
        .enumerate()
        .filter(|(band, _)| !config.band_gap.contains(*band))
        .map(|(_, &wv)| wv)
        .collect();
    let coefficient_path = "sample_coefficients.csv";
    let rows = write_coefficients(coefficient_path, &cleaned)?;

    println!(
        "Wrote {observations} observations ({} bands each) to {output_path} and {rows} coefficient rows to {coefficient_path}",
        wavelengths.len()
    );
    Ok(())
}
