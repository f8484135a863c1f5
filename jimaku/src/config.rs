//! Engine configuration.
//!
//! Every stage keeps its own config struct; [`EngineConfig`] bundles them so
//! that a single JSON file can tune the whole pipeline.

use crate::cli::EngineArgs;
use crate::error::ConfigError;
use crate::segment::Segmenter;
use crate::timing::TimingNormalizer;
use eyre::{Context, Result};
use jimaku_align::config::AlignConfig;
use serde::Deserialize;
use std::path::Path;

/// Validated configuration for all engine stages.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub align: AlignConfig,
    pub layout: Segmenter,
    pub timing: TimingNormalizer,
}

impl EngineConfig {
    pub fn validate(self) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            align: self.align.validate()?,
            layout: self.layout.validate()?,
            timing: self.timing.validate()?,
        })
    }

    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config: {:?}", path.display()))?;
        serde_json::from_str(&text)
            .wrap_err_with(|| format!("failed to parse config: {:?}", path.display()))
    }
}

impl TryFrom<EngineArgs> for EngineConfig {
    type Error = eyre::Error;

    fn try_from(args: EngineArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };

        let layout = &mut config.layout;
        if let Some(max_lines) = args.max_lines {
            layout.max_lines = max_lines;
        }
        if let Some(max_chars) = args.max_chars_per_line {
            layout.max_chars_per_line = max_chars;
        }
        if args.keep_punctuation {
            layout.remove_punctuation_in_display = false;
        }

        let timing = &mut config.timing;
        if let Some(min) = args.min_duration {
            timing.min_display_duration = min;
        }
        if let Some(max) = args.max_duration {
            timing.max_display_duration = max;
        }
        if let Some(frame_rate) = args.frame_rate {
            timing.frame_rate = frame_rate;
        }
        if let Some(priority) = args.overlap_priority {
            timing.overlap_priority = priority;
        }
        timing.prevent_overlap &= !args.allow_overlap;
        timing.tighten_gaps |= args.tighten_gaps;

        if let Some(strategy) = args.align_strategy {
            config.align.strategy = strategy;
        }

        Ok(config.validate()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::OverlapPriority;
    use jimaku_align::config::Strategy;

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{
            "layout": { "maxCharsPerLine": 16, "weights": { "particle": 90 } },
            "timing": { "overlapPriority": "minDuration" },
            "align": { "strategy": "ratio" }
        }"#;

        let config: EngineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.layout.max_chars_per_line, 16);
        assert_eq!(config.layout.max_lines, 2);
        assert!((config.layout.weights.particle - 90.0).abs() < 1e-9);
        assert!((config.layout.weights.punctuation - 120.0).abs() < 1e-9);
        assert_eq!(config.timing.overlap_priority, OverlapPriority::MinDuration);
        assert!((config.timing.frame_rate - 30.0).abs() < 1e-9);
        assert_eq!(config.align.strategy, Strategy::Ratio);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn flags_override_defaults() {
        let args = EngineArgs {
            max_chars_per_line: Some(14),
            keep_punctuation: true,
            allow_overlap: true,
            ..EngineArgs::default()
        };

        let config = EngineConfig::try_from(args).unwrap();

        assert_eq!(config.layout.max_chars_per_line, 14);
        assert!(!config.layout.remove_punctuation_in_display);
        assert!(!config.timing.prevent_overlap);
    }

    #[test]
    fn invalid_flag_is_rejected() {
        let args = EngineArgs {
            frame_rate: Some(0.0),
            ..EngineArgs::default()
        };

        assert!(EngineConfig::try_from(args).is_err());
    }

    #[test]
    fn validation_reaches_every_stage() {
        let config = EngineConfig {
            timing: TimingNormalizer {
                sentence_end_extension_fraction: 1.5,
                ..TimingNormalizer::DEFAULT
            },
            ..EngineConfig::default()
        };

        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::InvalidExtensionFraction(1.5)
        );
    }
}
