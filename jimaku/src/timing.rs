//! Display timing normalization.
//!
//! Raw cue times come straight from character timings, so they are often
//! too short to read, run into the next cue, or end abruptly on a sentence
//! boundary. [`TimingNormalizer::normalize`] fixes each cue against the start
//! of the one after it:
//!
//! 1. clamp the duration to `[min_display_duration, max_display_duration]`,
//!    leaving an over-long last cue as it is
//! 2. extend cues ending a sentence into the slack before the next cue
//! 3. keep a gap of `gap_frames` frames before the next cue
//! 4. push out any end that fell at or before its start
//!
//! Starts never move here; only [`trim_leading_silence`] shifts them.

use crate::cue::{RawCue, SubtitleCue};
use crate::error::ConfigError;
use jimaku_align::diagnostics::{Diagnostic, Diagnostics};
use jimaku_align::text::is_unspoken;
use jimaku_align::types::CharacterTiming;
use serde::{Deserialize, Serialize};

/// Duration given to a cue whose end fell at or before its start
const SAFETY_DURATION: f64 = 0.1;

/// Gaps in this range are tightened when `tighten_gaps` is on
const TIGHTEN_RANGE: (f64, f64) = (0.5, 1.5);

/// Gap left after tightening
const TIGHTENED_GAP: f64 = 0.3;

/// Which constraint wins when a short cue cannot reach its minimum duration
/// without running into the next cue.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OverlapPriority {
    /// Keep the gap before the next cue
    #[default]
    NextCue,
    /// Reach the minimum duration even if the cues overlap
    MinDuration,
}

/// Timing normalization configuration
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimingNormalizer {
    /// Shortest display time in seconds (default: 1.5)
    pub min_display_duration: f64,

    /// Longest display time in seconds (default: 6.0)
    pub max_display_duration: f64,

    /// Keep every cue clear of the next one (default: true)
    pub prevent_overlap: bool,

    pub overlap_priority: OverlapPriority,

    /// Video frame rate used for the minimum gap (default: 30)
    pub frame_rate: f64,

    /// Minimum gap between cues in frames (default: 3)
    pub gap_frames: u32,

    /// Share of the slack before the next cue given to a sentence-final cue
    /// (default: 0.6)
    pub sentence_end_extension_fraction: f64,

    /// Extension of a sentence-final last cue in seconds (default: 0.5)
    pub last_cue_extension: f64,

    /// Leading silence longer than this is trimmed (default: 0.1s)
    pub silence_threshold: f64,

    /// Tighten gaps of 0.5–1.5s down to 0.3s (default: false)
    pub tighten_gaps: bool,
}

impl TimingNormalizer {
    pub const DEFAULT: Self = Self {
        min_display_duration: 1.5,
        max_display_duration: 6.0,
        prevent_overlap: true,
        overlap_priority: OverlapPriority::NextCue,
        frame_rate: 30.0,
        gap_frames: 3,
        sentence_end_extension_fraction: 0.6,
        last_cue_extension: 0.5,
        silence_threshold: 0.1,
        tighten_gaps: false,
    };

    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(ConfigError::InvalidFrameRate(self.frame_rate));
        }
        let (min, max) = (self.min_display_duration, self.max_display_duration);
        if !(min.is_finite() && max.is_finite() && min >= 0.0 && max > 0.0 && min <= max) {
            return Err(ConfigError::InvalidDisplayDuration { min, max });
        }
        if !(0.0..=1.0).contains(&self.sentence_end_extension_fraction) {
            return Err(ConfigError::InvalidExtensionFraction(
                self.sentence_end_extension_fraction,
            ));
        }
        Ok(self)
    }

    /// Minimum gap between consecutive cues in seconds.
    pub fn min_gap(&self) -> f64 {
        f64::from(self.gap_frames) / self.frame_rate
    }

    /// Turn raw cues into final, numbered cues.
    ///
    /// Empty cues are dropped and the rest ordered by start. The result
    /// depends only on each cue's start, source end and text, so feeding the
    /// output back through [`TimingNormalizer::renormalize`] returns it
    /// unchanged.
    pub fn normalize(&self, raw: &[RawCue], diagnostics: &mut Diagnostics) -> Vec<SubtitleCue> {
        let mut cues: Vec<&RawCue> = raw.iter().filter(|cue| !cue.is_empty()).collect();
        cues.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut ends: Vec<f64> = cues
            .iter()
            .enumerate()
            .map(|(i, cue)| {
                let next_start = cues.get(i + 1).map(|next| next.start);
                self.fit(cue, next_start, diagnostics)
            })
            .collect();

        if self.tighten_gaps {
            self.tighten(&cues, &mut ends);
        }

        let result: Vec<SubtitleCue> = cues
            .iter()
            .zip(ends)
            .zip(1..)
            .map(|((cue, end), index)| SubtitleCue {
                index,
                start: cue.start,
                end,
                lines: cue.lines.clone(),
                kind: cue.kind,
                source_end: cue.end,
                ends_sentence: cue.ends_sentence,
                overflow: cue.overflow,
            })
            .collect();

        tracing::debug!(
            raw = raw.len(),
            cues = result.len(),
            dropped = raw.len() - result.len(),
            "normalized cue timing"
        );

        result
    }

    /// Normalize already normalized cues again.
    pub fn renormalize(
        &self,
        cues: &[SubtitleCue],
        diagnostics: &mut Diagnostics,
    ) -> Vec<SubtitleCue> {
        let raw: Vec<RawCue> = cues.iter().map(SubtitleCue::to_raw).collect();
        self.normalize(&raw, diagnostics)
    }

    /// End time of `cue` given the start of the cue after it.
    ///
    /// Sentence-end and last-cue extensions apply only to cues whose duration
    /// is already within `[min_display_duration, max_display_duration]`.
    fn fit(&self, cue: &RawCue, next_start: Option<f64>, diagnostics: &mut Diagnostics) -> f64 {
        let start = cue.start;
        let mut end = cue.end;
        let gap = self.min_gap();
        let duration = end - start;

        // Allowed to run into the next cue
        let mut overlaps = !self.prevent_overlap;

        if duration < self.min_display_duration {
            let ideal = start + self.min_display_duration;
            end = match (next_start, self.overlap_priority) {
                (Some(next), OverlapPriority::NextCue) if self.prevent_overlap => {
                    ideal.min(next - gap).max(end)
                }
                (Some(_), OverlapPriority::MinDuration) => {
                    overlaps = true;
                    ideal
                }
                _ => ideal,
            };
        } else if duration > self.max_display_duration {
            // The last cue keeps its end
            end = next_start.map_or(end, |_| start + self.max_display_duration);
        } else if cue.ends_sentence {
            match next_start {
                Some(next) => {
                    let slack = next - end;
                    if slack > gap {
                        end += (self.sentence_end_extension_fraction * slack).min(slack - gap);
                    }
                }
                None => end += self.last_cue_extension,
            }
        }

        if let Some(next) = next_start
            && !overlaps
        {
            end = end.min(next - gap);
        }

        if end <= start {
            diagnostics.warn(Diagnostic::EndBeforeStart { start, end });
            end = start + SAFETY_DURATION;
        }

        end
    }

    /// Extend a cue so that a 0.5–1.5s gap before the next one becomes 0.3s.
    fn tighten(&self, cues: &[&RawCue], ends: &mut [f64]) {
        let (lo, hi) = TIGHTEN_RANGE;
        for i in 0..ends.len().saturating_sub(1) {
            let next = cues[i + 1].start;
            let gap = next - ends[i];
            if (lo..=hi).contains(&gap) {
                ends[i] = next - TIGHTENED_GAP;
            }
        }
    }
}

impl Default for TimingNormalizer {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Shift `timings` so the first spoken character starts at zero.
///
/// Does nothing when the leading silence is at most `threshold` seconds.
/// Unspoken characters before the first spoken one are pinned at zero.
pub fn trim_leading_silence(timings: &[CharacterTiming], threshold: f64) -> Vec<CharacterTiming> {
    let silence = timings
        .iter()
        .find(|t| !is_unspoken(t.character))
        .map_or(0.0, |t| t.start);

    if silence <= threshold {
        return timings.to_vec();
    }

    tracing::debug!(silence, "trimmed leading silence");

    timings
        .iter()
        .map(|t| CharacterTiming {
            start: (t.start - silence).max(0.0),
            end: (t.end - silence).max(0.0),
            ..t.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(text: &str, start: f64, end: f64) -> RawCue {
        RawCue {
            ends_sentence: text.ends_with(['。', '！', '？']),
            ..RawCue::new(vec![text.to_string()], start, end)
        }
    }

    fn normalize(normalizer: &TimingNormalizer, raw: &[RawCue]) -> Vec<SubtitleCue> {
        normalizer.normalize(raw, &mut Diagnostics::new())
    }

    #[test]
    fn extends_sentence_end_into_slack() {
        let raw = [cue("すごい！", 0.0, 2.0), cue("次へ", 4.0, 6.0)];

        let cues = normalize(&TimingNormalizer::DEFAULT, &raw);

        match &cues[..] {
            [first, second] => {
                assert!((first.end - 3.2).abs() < 1e-9);
                assert!((second.start - first.end - 0.8).abs() < 1e-9);
            }
            _ => panic!("expected 2 cues, got {}", cues.len()),
        }
    }

    #[test]
    fn last_sentence_cue_gets_fixed_extension() {
        let cues = normalize(&TimingNormalizer::DEFAULT, &[cue("終わり。", 1.0, 3.0)]);

        match &cues[..] {
            [only] => {
                assert_eq!(only.index, 1);
                assert!((only.end - 3.5).abs() < 1e-9);
            }
            _ => panic!("expected 1 cue, got {}", cues.len()),
        }
    }

    #[test]
    fn short_cue_stops_before_next_by_default() {
        let raw = [cue("あ", 0.0, 0.3), cue("い", 1.0, 3.0)];

        let cues = normalize(&TimingNormalizer::DEFAULT, &raw);

        assert!((cues[0].end - 0.9).abs() < 1e-9);
        assert!(cues[0].end <= cues[1].start);
    }

    #[test]
    fn min_duration_priority_allows_overlap() {
        let normalizer = TimingNormalizer {
            overlap_priority: OverlapPriority::MinDuration,
            ..TimingNormalizer::DEFAULT
        };
        let raw = [cue("あ", 0.0, 0.3), cue("い", 1.0, 3.0)];

        let cues = normalize(&normalizer, &raw);

        assert!((cues[0].end - 1.5).abs() < 1e-9);
    }

    #[test]
    fn short_sentence_end_is_not_extended() {
        let cues = normalize(&TimingNormalizer::DEFAULT, &[cue("はい。", 0.0, 0.5)]);

        assert!((cues[0].end - 1.5).abs() < 1e-9);
    }

    #[test]
    fn long_last_cue_keeps_its_end() {
        let cues = normalize(&TimingNormalizer::DEFAULT, &[cue("長い", 0.0, 9.0)]);

        assert!((cues[0].end - 9.0).abs() < 1e-9);
    }

    #[test]
    fn long_cue_is_capped_before_next() {
        let raw = [cue("長い", 0.0, 9.0), cue("次", 12.0, 14.0)];

        let cues = normalize(&TimingNormalizer::DEFAULT, &raw);

        assert!((cues[0].end - 6.0).abs() < 1e-9);
    }

    #[test]
    fn long_cue_stops_at_next_gap() {
        let raw = [cue("長い", 0.0, 9.0), cue("次", 5.0, 14.0)];

        let cues = normalize(&TimingNormalizer::DEFAULT, &raw);

        assert!((cues[0].end - 4.9).abs() < 1e-9);
    }

    #[test]
    fn end_before_start_is_pushed_out() {
        // Next cue starts right after this one, leaving less than the gap
        let raw = [cue("あ", 1.0, 1.05), cue("い", 1.05, 3.0)];
        let mut diagnostics = Diagnostics::new();

        let cues = TimingNormalizer::DEFAULT.normalize(&raw, &mut diagnostics);

        assert!((cues[0].end - 1.1).abs() < 1e-9);
        assert!(diagnostics.any(|d| matches!(d, Diagnostic::EndBeforeStart { .. })));
    }

    #[test]
    fn drops_empty_cues_and_numbers_chronologically() {
        let raw = [
            cue("二", 5.0, 7.0),
            RawCue::new(vec![" ".to_string()], 2.0, 3.0),
            cue("一", 1.0, 3.0),
        ];

        let cues = normalize(&TimingNormalizer::DEFAULT, &raw);

        let summary: Vec<(u32, String)> = cues.iter().map(|c| (c.index, c.text())).collect();
        assert_eq!(summary, vec![(1, "一".to_string()), (2, "二".to_string())]);
    }

    #[test]
    fn normalization_is_idempotent() {
        let normalizer = TimingNormalizer {
            tighten_gaps: true,
            ..TimingNormalizer::DEFAULT
        };
        let raw = [
            cue("はい。", 0.0, 0.4),
            cue("そうです！", 0.6, 2.5),
            cue("次に", 4.0, 11.0),
            cue("最後。", 11.2, 12.0),
        ];
        let mut diagnostics = Diagnostics::new();

        let once = normalizer.normalize(&raw, &mut diagnostics);
        let twice = normalizer.renormalize(&once, &mut diagnostics);

        assert_eq!(once, twice);
    }

    #[test]
    fn gaps_are_tightened_when_enabled() {
        let normalizer = TimingNormalizer {
            tighten_gaps: true,
            ..TimingNormalizer::DEFAULT
        };
        let raw = [cue("あいう", 0.0, 2.0), cue("えお", 3.0, 5.0)];

        let cues = normalize(&normalizer, &raw);

        assert!((cues[0].end - 2.7).abs() < 1e-9);
    }

    #[test]
    fn trims_leading_silence_once() {
        let timings = vec![
            CharacterTiming::new('「', 0.0, 0.0, 1.0),
            CharacterTiming::new('あ', 0.5, 0.7, 1.0),
            CharacterTiming::new('い', 0.7, 0.9, 1.0),
        ];

        let trimmed = trim_leading_silence(&timings, 0.1);
        let again = trim_leading_silence(&trimmed, 0.1);

        assert!((trimmed[1].start - 0.0).abs() < 1e-9);
        assert!((trimmed[2].end - 0.4).abs() < 1e-9);
        assert!((trimmed[0].start - 0.0).abs() < 1e-9);
        assert_eq!(trimmed, again);
    }

    #[test]
    fn rejects_invalid_config() {
        let zero_fps = TimingNormalizer {
            frame_rate: 0.0,
            ..TimingNormalizer::DEFAULT
        };
        let inverted = TimingNormalizer {
            min_display_duration: 7.0,
            ..TimingNormalizer::DEFAULT
        };

        assert_eq!(zero_fps.validate(), Err(ConfigError::InvalidFrameRate(0.0)));
        assert_eq!(
            inverted.validate(),
            Err(ConfigError::InvalidDisplayDuration { min: 7.0, max: 6.0 })
        );
    }
}
