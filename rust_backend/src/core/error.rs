//! Error types for the color-evolution pipeline.

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ColorEvolError>;

/// Error type for pipeline operations
///
/// The first four variants are contract violations raised at the point of
/// detection; none of them is retried.
#[derive(Debug, thiserror::Error)]
pub enum ColorEvolError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Unknown band: '{0}' is not present in the data")]
    UnknownBand(String),

    #[error("Invalid observation: {0}")]
    InvalidObservation(String),

    #[error("No rescalable bands: every band relative to '{0}' shows color evolution or has insufficient data")]
    NoRescalableBands(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl ColorEvolError {
    /// `true` for the contract-violation kinds raised by the core algorithms.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ColorEvolError::InsufficientData(_)
                | ColorEvolError::UnknownBand(_)
                | ColorEvolError::InvalidObservation(_)
                | ColorEvolError::NoRescalableBands(_)
        )
    }
}
