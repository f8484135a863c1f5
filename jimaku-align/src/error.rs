//! Error types for jimaku-align organized by processing stage.

use std::time::Duration;
use thiserror::Error;

/// Alignment error variants organized by processing stage.
///
/// Only structural problems escape the crate. Provider failures are
/// [`AlignmentFailure`]s and stay inside the adapter's tier chain.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration stage error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Structurally invalid input at the engine boundary
    #[error(transparent)]
    Input(#[from] InvalidInputError),

    /// Audio loading stage error
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// JSON decoding of provider payloads
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Provider timeout must be positive
    #[error("invalid provider timeout: {0}s (must be positive)")]
    InvalidTimeout(f64),

    /// Coverage threshold outside [0, 1]
    #[error("invalid coverage threshold: {0} (expected 0..=1)")]
    InvalidCoverage(f64),
}

/// Structurally invalid input.
///
/// This is the single well-defined failure the engine surfaces to callers.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidInputError {
    /// Reference text has no alignable characters but timings were supplied
    #[error("reference text is empty but {timings} timings were supplied")]
    EmptyReference { timings: usize },

    /// Audio duration is negative or not finite
    #[error("invalid audio duration: {0}s")]
    InvalidDuration(f64),

    /// A supplied time is NaN or infinite
    #[error("non-finite time at character {index}")]
    NonFiniteTime { index: usize },
}

/// Audio loading errors.
#[derive(Debug, Error)]
pub enum AudioError {
    /// WAV header reports zero sample rate
    #[error("invalid sample rate: {0}Hz")]
    InvalidSampleRate(u32),

    /// WAV file format error
    #[error(transparent)]
    Hound(#[from] hound::Error),
}

/// Failure of a single timing tier.
///
/// Each tier of the adapter is a function returning
/// `Result<_, AlignmentFailure>`; a failure moves on to the next tier.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AlignmentFailure {
    /// No provider configured for this tier
    #[error("{tier} provider not configured")]
    Unavailable { tier: &'static str },

    /// Provider returned an error
    #[error("{provider} failed: {message}")]
    Provider { provider: String, message: String },

    /// Provider answered after the deadline
    #[error("{provider} timed out after {elapsed:?} (limit {limit:?})")]
    Timeout {
        provider: String,
        elapsed: Duration,
        limit: Duration,
    },

    /// Character count does not match the reference
    #[error("alignment length mismatch: expected {expected} characters, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// Negative or non-finite time in provider output
    #[error("invalid timing at character {index}: {start}..{end}")]
    InvalidTiming { index: usize, start: f64, end: f64 },

    /// Recognized text has nothing to align against
    #[error("recognized text is empty after normalization")]
    EmptyTranscript,

    /// Sequence alignment produced no path
    #[error("alignment path is empty")]
    EmptyPath,
}

impl AlignmentFailure {
    /// Wrap any displayable provider error.
    pub fn provider(provider: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for jimaku-align operations.
pub type Result<T> = std::result::Result<T, Error>;

// hound::Error → AudioError → Error
impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        Error::Audio(AudioError::Hound(e))
    }
}
