//! End-to-end subtitle pipeline over narration segments.
//!
//! Each segment is aligned, trimmed, shifted to absolute time and segmented
//! on its own, in parallel. Cues from all segments are then normalized and
//! numbered together.

use crate::config::EngineConfig;
use crate::cue::{RawCue, SubtitleCue};
use crate::error::{Error, Result};
use crate::segment::boundary::{MorphemeAnalyzer, NoMorphology};
use crate::segment::score::SplitDecision;
use crate::timing::trim_leading_silence;
use jimaku_align::adapter::{AlignmentAdapter, validate_input};
use jimaku_align::audio::AudioSource;
use jimaku_align::diagnostics::Diagnostics;
use jimaku_align::traits::{StaticAlignment, StaticTranscript};
use jimaku_align::types::{AsrTranscript, CharacterTiming, TimingSource};
use rayon::prelude::*;
use serde::Serialize;

/// Timing information supplied with a narration segment.
#[derive(Clone, Debug, PartialEq)]
pub enum TimingInput {
    /// Forced alignment from the synthesis provider
    Characters(Vec<CharacterTiming>),
    /// ASR output for the segment audio
    Asr(AsrTranscript),
    /// Only the audio is known
    Audio(AudioSource),
}

/// Title card shown at the start of a segment, relative to its offset.
#[derive(Clone, Debug, PartialEq)]
pub struct TitleTiming {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// One narration segment of a script.
#[derive(Clone, Debug, PartialEq)]
pub struct NarrationSegment {
    pub id: String,
    /// Reference narration text
    pub text: String,
    /// Absolute start of the segment in seconds
    pub offset: f64,
    /// Narration start relative to `offset`
    pub narration_start: f64,
    pub title: Option<TitleTiming>,
    pub input: TimingInput,
}

impl NarrationSegment {
    pub fn new(id: impl Into<String>, text: impl Into<String>, input: TimingInput) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            offset: 0.0,
            narration_start: 0.0,
            title: None,
            input,
        }
    }

    /// Audio handed to the providers.
    ///
    /// Without real audio, the duration is taken from the last timing.
    fn audio(&self) -> AudioSource {
        match &self.input {
            TimingInput::Audio(audio) => audio.clone(),
            TimingInput::Characters(timings) => {
                AudioSource::from_duration(timings.iter().map(|t| t.end).fold(0.0, f64::max))
            }
            TimingInput::Asr(transcript) => {
                let end = transcript.words.iter().map(|w| w.end).fold(0.0, f64::max);
                AudioSource::from_duration(end)
            }
        }
    }
}

/// Per-segment record for the debug dump.
#[derive(Clone, Debug, Serialize)]
pub struct SegmentReport {
    pub id: String,
    pub source: TimingSource,
    pub diagnostics: Diagnostics,
    pub splits: Vec<SplitDecision>,
}

/// Result of a full engine run.
#[derive(Clone, Debug, Serialize)]
pub struct EngineOutput {
    pub cues: Vec<SubtitleCue>,
    pub segments: Vec<SegmentReport>,
    /// Conditions raised while normalizing the combined cue list
    pub diagnostics: Diagnostics,
}

/// Subtitle engine
pub struct Engine {
    config: EngineConfig,
    analyzer: Box<dyn MorphemeAnalyzer>,
}

impl Engine {
    /// # Errors
    ///
    /// Returns error if any stage rejects its configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Ok(Self {
            config: config.validate()?,
            analyzer: Box::new(NoMorphology),
        })
    }

    /// Use `analyzer` for morpheme boundaries.
    pub fn with_analyzer(mut self, analyzer: impl MorphemeAnalyzer + 'static) -> Self {
        self.analyzer = Box::new(analyzer);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Produce the final cue list for `segments`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Input`] naming the first structurally invalid segment.
    /// Provider failures and layout problems are recorded in the returned
    /// diagnostics instead.
    pub fn process(&self, segments: &[NarrationSegment]) -> Result<EngineOutput> {
        for segment in segments {
            let supplied = match &segment.input {
                TimingInput::Characters(timings) => Some(timings.as_slice()),
                _ => None,
            };
            validate_input(&segment.text, supplied, &segment.audio())
                .map_err(|e| Error::input(&segment.id, e))?;
        }

        let processed: Vec<(Vec<RawCue>, SegmentReport)> = segments
            .par_iter()
            .map(|segment| self.process_segment(segment))
            .collect::<Result<_>>()?;

        let (raw, segments): (Vec<Vec<RawCue>>, Vec<SegmentReport>) = processed.into_iter().unzip();
        let raw: Vec<RawCue> = raw.into_iter().flatten().collect();

        let mut diagnostics = Diagnostics::new();
        let cues = self.config.timing.normalize(&raw, &mut diagnostics);

        tracing::info!(
            segments = segments.len(),
            cues = cues.len(),
            warnings = diagnostics.events.len()
                + segments.iter().map(|s| s.diagnostics.events.len()).sum::<usize>(),
            "generated subtitles"
        );

        Ok(EngineOutput {
            cues,
            segments,
            diagnostics,
        })
    }

    fn process_segment(&self, segment: &NarrationSegment) -> Result<(Vec<RawCue>, SegmentReport)> {
        let adapter = match &segment.input {
            TimingInput::Characters(timings) => AlignmentAdapter::new(self.config.align)
                .with_forced_aligner(StaticAlignment::new(timings.clone())),
            TimingInput::Asr(transcript) => AlignmentAdapter::new(self.config.align)
                .with_recognizer(StaticTranscript::new(transcript.clone())),
            TimingInput::Audio(_) => AlignmentAdapter::new(self.config.align),
        };

        let alignment = adapter.align(&segment.text, &segment.audio())?;
        let mut diagnostics = alignment.diagnostics;

        let base = segment.offset + segment.narration_start;
        let timings: Vec<CharacterTiming> =
            trim_leading_silence(&alignment.timings, self.config.timing.silence_threshold)
                .iter()
                .map(|t| t.shifted(base))
                .collect();

        let segmentation = self.config.layout.segment_with(
            &segment.text,
            &timings,
            self.analyzer.as_ref(),
            &mut diagnostics,
        );

        let mut cues = Vec::with_capacity(segmentation.cues.len() + 1);
        if let Some(title) = &segment.title {
            cues.push(RawCue::title(
                title.text.clone(),
                segment.offset + title.start,
                segment.offset + title.end,
            ));
        }
        cues.extend(segmentation.cues);

        tracing::info!(
            segment = %segment.id,
            source = ?alignment.source,
            cues = cues.len(),
            "segmented narration"
        );

        let report = SegmentReport {
            id: segment.id.clone(),
            source: alignment.source,
            diagnostics,
            splits: segmentation.splits,
        };

        Ok((cues, report))
    }
}
