//! Tiered timing source resolution.
//!
//! Tiers, in order:
//!
//! 1. direct forced alignment from the synthesis provider
//! 2. ASR words aligned to the reference (DTW, or ratio when configured)
//! 3. uniform distribution of the audio duration
//!
//! Each tier returns `Result<Vec<CharacterTiming>, AlignmentFailure>`. A
//! failure is recorded and the next tier runs; the last tier cannot fail,
//! so [`AlignmentAdapter::align`] only errors on structurally invalid input.

use crate::audio::AudioSource;
use crate::charmap::{reinsert_unspoken, repair_timings};
use crate::config::{AlignConfig, MIN_CHARACTER_SPAN, Strategy};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::dtw::DtwAligner;
use crate::error::{AlignmentFailure, InvalidInputError, Result};
use crate::ratio::RatioAligner;
use crate::text::{NormalizedText, fold_width};
use crate::traits::{ForcedAligner, SpeechRecognizer};
use crate::types::{CharacterTiming, TimingSource};
use std::time::{Duration, Instant};

/// Resolved character timings for one reference text.
#[derive(Clone, Debug)]
pub struct Alignment {
    /// One timing per `char` of the reference text
    pub timings: Vec<CharacterTiming>,
    /// Tier that produced the timings
    pub source: TimingSource,
    pub diagnostics: Diagnostics,
}

/// Walks the timing tiers for a reference text.
pub struct AlignmentAdapter {
    config: AlignConfig,
    forced: Option<Box<dyn ForcedAligner>>,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
}

impl AlignmentAdapter {
    /// Adapter with no providers; only the uniform tier is available.
    pub fn new(config: AlignConfig) -> Self {
        Self {
            config,
            forced: None,
            recognizer: None,
        }
    }

    pub fn with_forced_aligner(mut self, aligner: impl ForcedAligner + 'static) -> Self {
        self.forced = Some(Box::new(aligner));
        self
    }

    pub fn with_recognizer(mut self, recognizer: impl SpeechRecognizer + 'static) -> Self {
        self.recognizer = Some(Box::new(recognizer));
        self
    }

    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    /// Resolve timings for every character of `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError`] if the audio duration is negative or not
    /// finite. Provider failures never surface here.
    pub fn align(&self, reference: &str, audio: &AudioSource) -> Result<Alignment> {
        audio.validate()?;

        let mut diagnostics = Diagnostics::new();
        let asr_source = match self.config.strategy {
            Strategy::Dtw => TimingSource::Dtw,
            Strategy::Ratio => TimingSource::Ratio,
        };

        let (timings, source) = self
            .direct(reference, audio, &mut diagnostics)
            .map(|timings| (timings, TimingSource::ForcedAlignment))
            .or_else(|failure| {
                tier_failed(&mut diagnostics, TimingSource::ForcedAlignment, &failure);
                self.recognized(reference, audio, &mut diagnostics)
                    .map(|timings| (timings, asr_source))
            })
            .unwrap_or_else(|failure| {
                tier_failed(&mut diagnostics, asr_source, &failure);
                (uniform(reference, audio.duration), TimingSource::Uniform)
            });

        tracing::info!(
            ?source,
            characters = timings.len(),
            warnings = diagnostics.events.len(),
            "resolved character timings"
        );

        Ok(Alignment {
            timings,
            source,
            diagnostics,
        })
    }

    fn direct(
        &self,
        reference: &str,
        audio: &AudioSource,
        diagnostics: &mut Diagnostics,
    ) -> std::result::Result<Vec<CharacterTiming>, AlignmentFailure> {
        let aligner = self.forced.as_deref().ok_or(AlignmentFailure::Unavailable {
            tier: "forced alignment",
        })?;

        let limit = self.config.timeout();
        let timings = with_deadline(aligner.name(), limit, || {
            aligner.align(reference, audio, limit)
        })?;

        validate_direct(reference, timings, diagnostics)
    }

    fn recognized(
        &self,
        reference: &str,
        audio: &AudioSource,
        diagnostics: &mut Diagnostics,
    ) -> std::result::Result<Vec<CharacterTiming>, AlignmentFailure> {
        let recognizer = self
            .recognizer
            .as_deref()
            .ok_or(AlignmentFailure::Unavailable { tier: "asr" })?;

        let limit = self.config.timeout();
        let transcript = with_deadline(recognizer.name(), limit, || {
            recognizer.transcribe(audio, limit)
        })?;

        let timings = match self.config.strategy {
            Strategy::Dtw => {
                DtwAligner::from_config(&self.config).align(reference, &transcript, diagnostics)?
            }
            Strategy::Ratio => RatioAligner.align(reference, &transcript, diagnostics)?,
        };

        Ok(repair_timings(timings, MIN_CHARACTER_SPAN, diagnostics))
    }
}

fn tier_failed(diagnostics: &mut Diagnostics, tier: TimingSource, failure: &AlignmentFailure) {
    if !matches!(failure, AlignmentFailure::Unavailable { .. }) {
        diagnostics.warn(Diagnostic::TierFailed {
            tier,
            reason: failure.to_string(),
        });
    } else {
        tracing::debug!(?tier, %failure, "tier skipped");
    }
}

/// Run a blocking provider call and reject answers that arrive past `limit`.
fn with_deadline<T>(
    provider: &str,
    limit: Duration,
    call: impl FnOnce() -> std::result::Result<T, AlignmentFailure>,
) -> std::result::Result<T, AlignmentFailure> {
    let started = Instant::now();
    let result = call();
    let elapsed = started.elapsed();

    if elapsed > limit {
        return Err(AlignmentFailure::Timeout {
            provider: provider.to_string(),
            elapsed,
            limit,
        });
    }

    tracing::debug!(provider, ?elapsed, ok = result.is_ok(), "provider call");
    result
}

/// Check a direct forced alignment against `reference`.
///
/// Accepts one timing per normalized reference character (unspoken
/// characters are then re-inserted) or one per reference `char`. Negative or
/// non-finite times fail the tier; inverted pairs are repaired and logged.
pub fn validate_direct(
    reference: &str,
    timings: Vec<CharacterTiming>,
    diagnostics: &mut Diagnostics,
) -> std::result::Result<Vec<CharacterTiming>, AlignmentFailure> {
    if let Some((index, t)) = timings.iter().enumerate().find(|(_, t)| {
        !(t.start.is_finite() && t.end.is_finite() && t.start >= 0.0 && t.end >= 0.0)
    }) {
        return Err(AlignmentFailure::InvalidTiming {
            index,
            start: t.start,
            end: t.end,
        });
    }

    let normalized = NormalizedText::new(reference);
    let reference_chars: Vec<char> = reference.chars().collect();

    let expected: &[char] = if timings.len() == normalized.len() {
        &normalized.chars
    } else if timings.len() == reference_chars.len() {
        &reference_chars
    } else {
        return Err(AlignmentFailure::LengthMismatch {
            expected: normalized.len(),
            got: timings.len(),
        });
    };

    for (index, (t, &c)) in timings.iter().zip(expected).enumerate() {
        if fold_width(t.character) != fold_width(c) {
            diagnostics.warn(Diagnostic::TextMismatch {
                index,
                expected: c,
                got: t.character,
            });
        }
    }

    let spoken_only = timings.len() != reference_chars.len();
    let repaired = repair_timings(timings, MIN_CHARACTER_SPAN, diagnostics);

    if spoken_only {
        Ok(reinsert_unspoken(reference, &normalized, &repaired))
    } else {
        Ok(repaired
            .into_iter()
            .zip(reference_chars)
            .map(|(t, character)| CharacterTiming { character, ..t })
            .collect())
    }
}

/// Spread `duration` evenly over the spoken characters of `reference`.
///
/// Each spoken character gets `duration / count` seconds and confidence
/// `0.0`; unspoken characters sit at the previous end with zero width.
pub fn uniform(reference: &str, duration: f64) -> Vec<CharacterTiming> {
    let normalized = NormalizedText::new(reference);
    let step = if normalized.is_empty() {
        0.0
    } else {
        duration / normalized.len() as f64
    };

    let spoken: Vec<CharacterTiming> = normalized
        .chars
        .iter()
        .enumerate()
        .map(|(i, &c)| CharacterTiming::new(c, i as f64 * step, (i + 1) as f64 * step, 0.0))
        .collect();

    reinsert_unspoken(reference, &normalized, &spoken)
}

/// Boundary check for a narration segment.
///
/// `supplied` is the number of character timings handed in directly, if any.
pub fn validate_input(
    reference: &str,
    supplied: Option<&[CharacterTiming]>,
    audio: &AudioSource,
) -> std::result::Result<(), InvalidInputError> {
    audio.validate()?;

    let Some(timings) = supplied else {
        return Ok(());
    };

    if NormalizedText::new(reference).is_empty() && !timings.is_empty() {
        return Err(InvalidInputError::EmptyReference {
            timings: timings.len(),
        });
    }

    if let Some(index) = timings
        .iter()
        .position(|t| !(t.start.is_finite() && t.end.is_finite()))
    {
        return Err(InvalidInputError::NonFiniteTime { index });
    }

    Ok(())
}
