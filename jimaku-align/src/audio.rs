//! Audio handles passed to timing providers.

use crate::error::{AudioError, InvalidInputError, Result};
use hound::WavReader;
use std::path::{Path, PathBuf};

/// Audio for one narration segment.
///
/// The engine never decodes samples; providers receive the path and the
/// uniform fallback only needs the duration.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSource {
    /// File backing this audio, if any
    pub path: Option<PathBuf>,
    /// Total duration in seconds
    pub duration: f64,
}

impl AudioSource {
    /// Audio known only by its duration.
    pub fn from_duration(duration: f64) -> Self {
        Self {
            path: None,
            duration,
        }
    }

    /// Read the duration from a WAV header.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or reports a zero sample rate.
    pub fn from_wav(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = WavReader::open(path)?;
        let spec = reader.spec();

        if spec.sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate(spec.sample_rate).into());
        }

        let duration = reader.duration() as f64 / spec.sample_rate as f64;

        tracing::debug!(
            path = ?path.display(),
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            duration,
            "read wav header"
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            duration,
        })
    }

    /// Reject negative or non-finite durations.
    pub fn validate(&self) -> std::result::Result<(), InvalidInputError> {
        if self.duration.is_finite() && self.duration >= 0.0 {
            Ok(())
        } else {
            Err(InvalidInputError::InvalidDuration(self.duration))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};

    #[test]
    fn reads_duration_from_wav_header() {
        let path = std::env::temp_dir().join("jimaku-align-audio-test.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..8000 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let audio = AudioSource::from_wav(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!((audio.duration - 0.5).abs() < 1e-9);
        assert_eq!(audio.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn missing_wav_is_an_audio_error() {
        let path = std::env::temp_dir().join("jimaku-align-missing.wav");
        std::fs::remove_file(&path).ok();

        let err = AudioSource::from_wav(&path).unwrap_err();

        assert!(matches!(
            err,
            crate::error::Error::Audio(AudioError::Hound(hound::Error::IoError(_)))
        ));
    }

    #[test]
    fn rejects_negative_duration() {
        let audio = AudioSource::from_duration(-1.0);

        assert_eq!(
            audio.validate(),
            Err(InvalidInputError::InvalidDuration(-1.0))
        );
    }
}
