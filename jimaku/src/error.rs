//! Error types for the subtitle engine.

use jimaku_align::error::InvalidInputError;
use thiserror::Error;

/// Engine error variants organized by stage.
#[derive(Debug, Error)]
pub enum Error {
    /// Layout or timing configuration rejected at construction
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Structurally invalid narration segment
    #[error("segment {segment}: {source}")]
    Input {
        segment: String,
        #[source]
        source: InvalidInputError,
    },

    /// Alignment crate error outside the tier chain
    #[error(transparent)]
    Align(#[from] jimaku_align::error::Error),
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid max lines: {0} (must be at least 1)")]
    InvalidMaxLines(usize),

    #[error("invalid max chars per line: {0} (must be at least 1)")]
    InvalidMaxCharsPerLine(usize),

    #[error("invalid frame rate: {0} (must be positive)")]
    InvalidFrameRate(f64),

    #[error("invalid display duration: min {min}s, max {max}s")]
    InvalidDisplayDuration { min: f64, max: f64 },

    #[error("invalid sentence end extension fraction: {0} (expected 0..=1)")]
    InvalidExtensionFraction(f64),

    #[error(transparent)]
    Align(#[from] jimaku_align::error::ConfigError),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn input(segment: impl Into<String>, source: InvalidInputError) -> Self {
        Self::Input {
            segment: segment.into(),
            source,
        }
    }
}
