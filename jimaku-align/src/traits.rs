//! Provider traits for external timing sources.
//!
//! The speech synthesis and ASR services live outside this crate. They are
//! reached only through these traits, so the adapter can be driven by live
//! clients, recorded JSON payloads or test doubles alike.

use crate::audio::AudioSource;
use crate::error::AlignmentFailure;
use crate::types::{AsrTranscript, CharacterTiming};
use std::time::Duration;

/// Provider returning a character-to-time mapping for the reference text.
///
/// Typically the speech synthesis service, which knows exactly when each
/// character was voiced.
pub trait ForcedAligner: Send + Sync {
    /// Name used in logs and failure messages.
    fn name(&self) -> &str;

    /// Align `reference` against `audio`.
    ///
    /// Implementations should give up once `timeout` has elapsed. The adapter
    /// also discards any answer that arrives late.
    fn align(
        &self,
        reference: &str,
        audio: &AudioSource,
        timeout: Duration,
    ) -> Result<Vec<CharacterTiming>, AlignmentFailure>;
}

/// Provider returning recognized words for an audio segment.
pub trait SpeechRecognizer: Send + Sync {
    /// Name used in logs and failure messages.
    fn name(&self) -> &str;

    /// Transcribe `audio` with word-level timestamps.
    fn transcribe(
        &self,
        audio: &AudioSource,
        timeout: Duration,
    ) -> Result<AsrTranscript, AlignmentFailure>;
}

/// Forced alignment recorded ahead of time.
#[derive(Clone, Debug)]
pub struct StaticAlignment {
    timings: Vec<CharacterTiming>,
}

impl StaticAlignment {
    pub fn new(timings: Vec<CharacterTiming>) -> Self {
        Self { timings }
    }
}

impl ForcedAligner for StaticAlignment {
    fn name(&self) -> &str {
        "static-alignment"
    }

    fn align(
        &self,
        _reference: &str,
        _audio: &AudioSource,
        _timeout: Duration,
    ) -> Result<Vec<CharacterTiming>, AlignmentFailure> {
        Ok(self.timings.clone())
    }
}

/// ASR transcript recorded ahead of time.
#[derive(Clone, Debug)]
pub struct StaticTranscript {
    transcript: AsrTranscript,
}

impl StaticTranscript {
    pub fn new(transcript: AsrTranscript) -> Self {
        Self { transcript }
    }
}

impl SpeechRecognizer for StaticTranscript {
    fn name(&self) -> &str {
        "static-transcript"
    }

    fn transcribe(
        &self,
        _audio: &AudioSource,
        _timeout: Duration,
    ) -> Result<AsrTranscript, AlignmentFailure> {
        Ok(self.transcript.clone())
    }
}
