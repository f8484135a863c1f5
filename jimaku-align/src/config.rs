//! Alignment configuration.

use crate::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// Default provider timeout in seconds
const DEFAULT_TIMEOUT: f64 = 120.0;

/// Default minimum path coverage before a low-confidence warning
const DEFAULT_MIN_COVERAGE: f64 = 0.8;

/// Default DTW band half-width in characters
const DEFAULT_BAND: usize = 64;

/// Span given to an inverted character timing
pub const MIN_CHARACTER_SPAN: f64 = 0.05;

/// How ASR words are mapped onto the reference.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Dynamic time warping (primary)
    #[default]
    Dtw,
    /// Character-count ratio (reduced precision)
    Ratio,
}

/// Configuration for the alignment adapter.
#[derive(clap::Args, Clone, Copy, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlignConfig {
    /// Timeout for a single provider call in seconds
    #[arg(long = "provider-timeout", default_value_t = DEFAULT_TIMEOUT)]
    pub timeout: f64,

    /// Strategy for mapping ASR words onto the script
    #[arg(long = "align-strategy", value_enum, default_value_t = Strategy::Dtw)]
    pub strategy: Strategy,

    /// Minimum alignment path coverage before warning
    #[arg(long, default_value_t = DEFAULT_MIN_COVERAGE)]
    pub min_coverage: f64,

    /// DTW band half-width in characters
    #[arg(long = "dtw-band", default_value_t = DEFAULT_BAND)]
    pub band: usize,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            strategy: Strategy::Dtw,
            min_coverage: DEFAULT_MIN_COVERAGE,
            band: DEFAULT_BAND,
        }
    }
}

impl AlignConfig {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(self.timeout.is_finite() && self.timeout > 0.0) {
            return Err(ConfigError::InvalidTimeout(self.timeout));
        }
        if !(0.0..=1.0).contains(&self.min_coverage) {
            return Err(ConfigError::InvalidCoverage(self.min_coverage));
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AlignConfig::default().validate().unwrap();

        assert_eq!(config.strategy, Strategy::Dtw);
        assert_eq!(config.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn rejects_non_positive_timeout() {
        let config = AlignConfig {
            timeout: 0.0,
            ..AlignConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn deserializes_partial_json() {
        let config: AlignConfig = serde_json::from_str(r#"{"strategy":"ratio"}"#).unwrap();

        assert_eq!(config.strategy, Strategy::Ratio);
        assert_eq!(config.band, DEFAULT_BAND);
    }
}
