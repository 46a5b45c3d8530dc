use thiserror::Error;

/// Everything that can abort a reflectance extraction run.
///
/// None of these are transient: each one points at a malformed product, a bad
/// coefficient table, or a configuration mistake, so callers should surface
/// them rather than retry.
#[derive(Debug, Error)]
pub enum Error {
    /// A required label field is missing or its value is not a positive integer.
    #[error("malformed label: {field}: {reason}")]
    MalformedLabel { field: &'static str, reason: String },

    /// The label promised more bytes than the product holds.
    #[error("truncated {section}: expected {expected} bytes at offset {offset}, got {actual}")]
    TruncatedData {
        section: &'static str,
        offset: u64,
        expected: usize,
        actual: usize,
    },

    /// A band index outside the available range (coefficient rows or spectrum bands).
    #[error("band {band} out of range ({available} available)")]
    OutOfRange { band: usize, available: usize },

    /// The continuum anchors cannot define a usable baseline.
    #[error("degenerate continuum at band {band} ({wavelength} nm): {reason}")]
    DegenerateContinuum {
        band: usize,
        wavelength: f64,
        reason: &'static str,
    },

    /// The wavelength cutoff selects no bands at all.
    #[error("wavelength limit {limit} is below the shortest cleaned wavelength {minimum}")]
    InvalidWavelengthLimit { limit: f64, minimum: f64 },

    /// A per-band array does not have the raw band count the mask expects.
    #[error("expected {expected} bands, got {actual}")]
    BandCountMismatch { expected: usize, actual: usize },

    /// Reflectance rows and geometry rows cannot be paired for correction.
    #[error("{reflectance_rows} reflectance rows but {observations} geometry observations")]
    ObservationMismatch {
        reflectance_rows: usize,
        observations: usize,
    },

    /// The coefficient table has more rows than there are cleaned bands.
    #[error("coefficient table has {rows} rows but only {bands} cleaned bands exist")]
    CoefficientOverflow { rows: usize, bands: usize },

    /// Viewing geometry that drives the photometric model to zero or non-finite values.
    #[error("degenerate geometry for observation {observation} at band {band}: {reason}")]
    DegenerateGeometry {
        observation: usize,
        band: usize,
        reason: &'static str,
    },

    /// An observation index past the end of the processed output.
    #[error("observation {observation} out of range ({available} available)")]
    UnknownObservation { observation: usize, available: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
