//! Cue segmentation for Japanese narration.
//!
//! Turns per-character timings into [`RawCue`]s in four passes:
//!
//! 1. hard splits at explicit line breaks outside quotations
//! 2. sentence splits at terminal marks
//! 3. length-bounded re-splits of chunks that cannot fit in one cue
//! 4. line packing within each chunk
//!
//! Each cue keeps the start of its first and the end of its last display
//! character.

pub mod boundary;
pub mod lines;
pub mod score;
pub mod sentence;

use self::boundary::{MorphemeAnalyzer, NoMorphology, is_comma};
use self::lines::best_score;
use self::score::{Penalties, ScoreWeights, SplitContext, SplitDecision, SplitReason, SplitSearch};
use crate::cue::RawCue;
use crate::error::ConfigError;
use jimaku_align::diagnostics::{Diagnostic, Diagnostics};
use jimaku_align::text::{is_unspoken, quote_mask};
use jimaku_align::types::CharacterTiming;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Cue layout configuration
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Segmenter {
    /// Maximum lines per cue (default: 2)
    pub max_lines: usize,

    /// Maximum display characters per line (default: 18)
    pub max_chars_per_line: usize,

    /// Scored search window around the ideal split position (default: ±3)
    pub window_size: usize,

    /// Fragments shorter than this are penalized (default: 10)
    pub min_chunk_length: usize,

    /// Shortest line accepted by priority line packing (default: 3)
    pub min_line_length: usize,

    /// Quoted sentences longer than this may split at `、` (default: 30)
    pub quote_split_length: usize,

    /// Hide `。！？…` outside quotations (default: true)
    pub remove_punctuation_in_display: bool,

    pub weights: ScoreWeights,
    pub penalties: Penalties,
}

impl Segmenter {
    /// Two lines of eighteen characters, the usual layout for Japanese
    /// narration over 1080p video.
    pub const JAPANESE: Self = Self {
        max_lines: 2,
        max_chars_per_line: 18,
        window_size: 3,
        min_chunk_length: 10,
        min_line_length: 3,
        quote_split_length: 30,
        remove_punctuation_in_display: true,
        weights: ScoreWeights::DEFAULT,
        penalties: Penalties::DEFAULT,
    };

    #[cfg(test)]
    const TEST: Self = Self {
        max_lines: 2,
        max_chars_per_line: 10,
        min_chunk_length: 4,
        ..Self::JAPANESE
    };

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.max_lines == 0 {
            return Err(ConfigError::InvalidMaxLines(self.max_lines));
        }
        if self.max_chars_per_line == 0 {
            return Err(ConfigError::InvalidMaxCharsPerLine(self.max_chars_per_line));
        }
        Ok(self)
    }

    /// Display characters that fit in one cue.
    pub fn cue_capacity(&self) -> usize {
        self.max_lines * self.max_chars_per_line
    }

    pub fn search(&self) -> SplitSearch {
        SplitSearch {
            weights: self.weights,
            penalties: self.penalties,
            window: self.window_size,
            min_chunk: self.min_chunk_length,
        }
    }

    /// Segment without morphological analysis.
    pub fn segment(
        &self,
        reference: &str,
        timings: &[CharacterTiming],
        diagnostics: &mut Diagnostics,
    ) -> Segmentation {
        self.segment_with(reference, timings, &NoMorphology, diagnostics)
    }

    /// Segment `timings` of `reference` into raw cues.
    pub fn segment_with(
        &self,
        reference: &str,
        timings: &[CharacterTiming],
        analyzer: &dyn MorphemeAnalyzer,
        diagnostics: &mut Diagnostics,
    ) -> Segmentation {
        let mut cues = Vec::new();
        let mut splits = Vec::new();

        for paragraph in sentence::split_paragraphs(reference, timings, diagnostics) {
            for range in sentence::split_sentences(&paragraph, self.quote_split_length) {
                let sentence = &paragraph[range];
                if sentence.iter().all(|t| is_unspoken(t.character)) {
                    continue;
                }

                for chunk in self.split_large(sentence, analyzer, &mut splits, diagnostics) {
                    cues.extend(self.pack(&sentence[chunk], analyzer, &mut splits, diagnostics));
                }
            }
        }

        tracing::debug!(cues = cues.len(), splits = splits.len(), "segmented");

        Segmentation { cues, splits }
    }

    /// Cut a sentence into chunks that each fit in one cue.
    fn split_large(
        &self,
        units: &[CharacterTiming],
        analyzer: &dyn MorphemeAnalyzer,
        splits: &mut Vec<SplitDecision>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Range<usize>> {
        let chars: Vec<char> = units.iter().map(|t| t.character).collect();
        let quoted = quote_mask(chars.iter().copied());
        let morphology = analyzer.analyze(&chars);
        let limit = self.cue_capacity();
        let search = self.search();

        let mut chunks = Vec::new();
        let mut from = 0;

        while from < chars.len() {
            let tail = morphology.tail(from);
            let ctx = SplitContext::new(&chars[from..], &quoted[from..], &tail);
            let total = ctx.total_display();

            if total <= limit || ctx.len() < 2 {
                chunks.push(from..chars.len());
                break;
            }

            // Leave at least `min_chunk_length` for the rest, unless that
            // would make this chunk shorter than an even split.
            let balanced = total.div_ceil(2).min(limit);
            let adjusted = limit
                .min(total.saturating_sub(self.min_chunk_length))
                .max(balanced);
            let decision = self
                .comma_split(&ctx, adjusted)
                .unwrap_or_else(|| search.find(&ctx, adjusted, 0, limit));

            if decision.reason == SplitReason::Forced {
                diagnostics.warn(Diagnostic::ForcedSplit {
                    text: decision.text.clone(),
                    index: decision.index,
                    score: best_score(&decision),
                });
            }

            chunks.push(from..from + decision.index);
            from += decision.index;
            splits.push(decision);
        }

        chunks
    }

    /// The last comma outside quotations that leaves a first fragment of at
    /// most `ideal_len` display characters.
    fn comma_split(&self, ctx: &SplitContext, ideal_len: usize) -> Option<SplitDecision> {
        let index = (1..ctx.len()).rev().find(|&p| {
            let first = ctx.display_len(0, p);
            is_comma(ctx.chars[p - 1])
                && !ctx.quoted[p - 1]
                && (1..=ideal_len).contains(&first)
        })?;

        Some(SplitDecision {
            text: ctx.chars.iter().collect(),
            ideal: ctx.index_at_display(ideal_len),
            index,
            reason: SplitReason::CommaPriority,
            candidates: Vec::new(),
        })
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::JAPANESE
    }
}

/// Output of one segmentation run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Segmentation {
    pub cues: Vec<RawCue>,
    /// Every split decision taken, in order
    pub splits: Vec<SplitDecision>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use jimaku_align::text::display_len;

    fn timed(text: &str) -> Vec<CharacterTiming> {
        text.chars()
            .enumerate()
            .map(|(i, c)| CharacterTiming::new(c, i as f64 * 0.1, (i + 1) as f64 * 0.1, 1.0))
            .collect()
    }

    fn segment(segmenter: &Segmenter, text: &str) -> (Segmentation, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let segmentation = segmenter.segment(text, &timed(text), &mut diagnostics);
        (segmentation, diagnostics)
    }

    #[test]
    fn splits_two_sentences_into_two_cues() {
        let segmenter = Segmenter {
            max_chars_per_line: 10,
            ..Segmenter::JAPANESE
        };

        let (segmentation, _) = segment(&segmenter, "今日は晴れです。明日は雨です。");

        match &segmentation.cues[..] {
            [first, second] => {
                assert_eq!(first.lines, vec!["今日は晴れです"]);
                assert_eq!(second.lines, vec!["明日は雨です"]);
                assert!((first.end - 0.8).abs() < 1e-9);
                assert!((second.start - 0.8).abs() < 1e-9);
            }
            _ => panic!("expected 2 cues, got {}", segmentation.cues.len()),
        }
    }

    #[test]
    fn long_sentence_is_resplit_within_capacity() {
        let text = "きょうはとてもいいてんきなのでこうえんまでさんぽにいってみようとおもいます。";

        let (segmentation, _) = segment(&Segmenter::TEST, text);

        assert!(segmentation.cues.len() >= 2);
        for cue in &segmentation.cues {
            assert!(cue.lines.len() <= 2);
            assert!(!cue.overflow);
            for line in &cue.lines {
                assert!(display_len(line) <= 10, "line too long: {line}");
            }
        }
        let joined: String = segmentation.cues.iter().flat_map(|c| c.lines.clone()).collect();
        assert_eq!(joined, text.trim_end_matches('。'));
    }

    #[test]
    fn comma_takes_priority_over_scored_split() {
        let segmenter = Segmenter {
            max_chars_per_line: 8,
            min_chunk_length: 4,
            ..Segmenter::JAPANESE
        };
        // 26 display characters, comma after the 6th
        let text = "あいうえおか、きくけこさしすせそたちつてとなにぬねの";

        let (segmentation, _) = segment(&segmenter, text);

        let first = &segmentation.splits[0];
        assert_eq!(first.reason, SplitReason::CommaPriority);
        assert_eq!(first.index, 7);
        assert_eq!(segmentation.cues[0].lines, vec!["あいうえおか、"]);
    }

    #[test]
    fn early_comma_still_takes_priority() {
        // 40 display characters, comma after the 5th
        let text = format!("あいうえお、{}たちつて", "かきくけこさしすせそ".repeat(3));

        let (segmentation, _) = segment(&Segmenter::JAPANESE, &text);

        let first = &segmentation.splits[0];
        assert_eq!(first.reason, SplitReason::CommaPriority);
        assert_eq!(first.index, 6);
        assert_eq!(segmentation.cues[0].lines, vec!["あいうえお、"]);
    }

    #[test]
    fn narrow_layout_still_splits() {
        let segmenter = Segmenter {
            max_lines: 1,
            max_chars_per_line: 8,
            ..Segmenter::JAPANESE
        };
        let text = "あいうえおかきくけこさしすせそたちつてとなにぬねのはひふへほ";

        let (segmentation, _) = segment(&segmenter, text);

        assert!(segmentation.cues.len() >= 4);
        for cue in &segmentation.cues {
            assert!(!cue.overflow);
            match &cue.lines[..] {
                [line] => assert!(display_len(line) <= 8, "line too long: {line}"),
                _ => panic!("expected 1 line, got {:?}", cue.lines),
            }
        }
        let joined: String = segmentation.cues.iter().flat_map(|c| c.lines.clone()).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn punctuation_only_paragraph_is_dropped() {
        let (segmentation, _) = segment(&Segmenter::JAPANESE, "はい。\n。");

        match &segmentation.cues[..] {
            [cue] => assert_eq!(cue.lines, vec!["はい"]),
            _ => panic!("expected 1 cue, got {}", segmentation.cues.len()),
        }
    }

    #[test]
    fn cue_times_follow_display_characters() {
        let text = "「晴れ」。";
        let (segmentation, _) = segment(&Segmenter::JAPANESE, text);

        match &segmentation.cues[..] {
            [cue] => {
                assert!((cue.start - 0.1).abs() < 1e-9);
                assert!((cue.end - 0.5).abs() < 1e-9);
            }
            _ => panic!("expected 1 cue, got {}", segmentation.cues.len()),
        }
    }

    #[test]
    fn rejects_zero_limits() {
        let zero_lines = Segmenter {
            max_lines: 0,
            ..Segmenter::JAPANESE
        };
        let zero_chars = Segmenter {
            max_chars_per_line: 0,
            ..Segmenter::JAPANESE
        };

        assert_eq!(zero_lines.validate(), Err(ConfigError::InvalidMaxLines(0)));
        assert_eq!(zero_chars.validate(), Err(ConfigError::InvalidMaxCharsPerLine(0)));
        assert!(Segmenter::JAPANESE.validate().is_ok());
    }
}
