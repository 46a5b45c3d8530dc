use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use sp_extract::export::{save_observation_csv, save_reflectance_csv};
use sp_extract::{Pipeline, PipelineOutput, ProcessingConfig};

#[derive(Parser, Debug)]
#[command(
    name = "sp-extract",
    version,
    about = "Spectral Profiler reflectance extraction tool."
)]
struct Args {
    /// The ".spc" file shipped with the SP data.
    input: PathBuf,

    /// The albedo coefficient table for the chosen overall reflectance (high, medium, or low).
    coefficients: PathBuf,

    /// Observations to report. Defaults to observation 0.
    observations: Vec<usize>,

    /// The limit wavelength (nm) to report up to.
    #[arg(short = 'w', long = "wavelength-limit")]
    wavelength_limit: Option<f64>,

    /// Save the cleaned reflectance table to reflectance_csv.txt.
    #[arg(short = 's', long)]
    save: bool,

    /// Directory for output files.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Write one CSV per reported observation with every correction stage.
    #[arg(long)]
    per_observation: bool,

    /// JSON file overriding processing constants.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn summarise(output: &PipelineOutput, observation: usize) {
    let geometry = output.geometry.get(observation);
    let removed = &output.continuum_removed[observation];
    let (min, max) = output
        .extent
        .iter()
        .map(|&band| removed[band])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    match geometry {
        Some(g) => println!(
            "observation {observation}: i={:.2} e={:.2} g={:.2}  continuum-removed range [{min:.4}, {max:.4}]",
            g.incidence, g.emission, g.phase
        ),
        None => println!("observation {observation}: continuum-removed range [{min:.4}, {max:.4}]"),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ProcessingConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ProcessingConfig::default(),
    };
    if let Some(limit) = args.wavelength_limit {
        config.wavelength_limit = limit;
    }

    let pipeline = Pipeline::new(config).context("invalid processing configuration")?;
    let output = pipeline
        .run(&args.input, &args.coefficients)
        .with_context(|| format!("processing {}", args.input.display()))?;

    let observations = if args.observations.is_empty() {
        vec![0]
    } else {
        args.observations.clone()
    };
    for &observation in &observations {
        output.check_observation(observation)?;
        summarise(&output, observation);
        if args.per_observation {
            let path = args.out_dir.join(format!("observation_{observation}.csv"));
            save_observation_csv(&path, &output, observation)
                .with_context(|| format!("writing {}", path.display()))?;
        }
    }

    if args.save {
        let path = args.out_dir.join("reflectance_csv.txt");
        save_reflectance_csv(&path, &output)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
