//! Conversions between word-level, normalized and full-text character timings.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::text::{NormalizedText, fold_width, is_unspoken};
use crate::types::{AsrWord, CharacterTiming};

/// Expand ASR words into per-character timings.
///
/// Each word's span is divided evenly by its normalized character count.
/// Words that normalize to nothing are skipped.
pub fn expand_words(words: &[AsrWord]) -> Vec<CharacterTiming> {
    words
        .iter()
        .flat_map(|word| {
            let chars: Vec<char> = word
                .text
                .chars()
                .filter(|c| !is_unspoken(*c))
                .map(fold_width)
                .collect();

            let step = if chars.is_empty() {
                0.0
            } else {
                (word.end - word.start).max(0.0) / chars.len() as f64
            };

            chars.into_iter().enumerate().map(move |(i, c)| {
                let start = word.start + i as f64 * step;
                CharacterTiming::new(c, start, start + step, word.confidence)
            })
        })
        .collect()
}

/// Spread timings for normalized characters back over the full reference.
///
/// `spoken[k]` belongs to `normalized.positions[k]`. Every other reference
/// character gets a zero-width timing at the previous character's end, or
/// `0.0` at the very start. The output has one entry per reference `char`
/// and carries the reference characters, not the normalized ones.
pub fn reinsert_unspoken(
    reference: &str,
    normalized: &NormalizedText,
    spoken: &[CharacterTiming],
) -> Vec<CharacterTiming> {
    let mut out: Vec<CharacterTiming> = Vec::with_capacity(reference.chars().count());
    let mut next = normalized.positions.iter().zip(spoken).peekable();

    for (i, c) in reference.chars().enumerate() {
        let previous_end = out.last().map_or(0.0, |t| t.end);

        match next.next_if(|&(pos, _)| *pos == i) {
            Some((_, timing)) => out.push(CharacterTiming {
                character: c,
                ..timing.clone()
            }),
            None => out.push(CharacterTiming::point(c, previous_end)),
        }
    }

    out
}

/// Clamp inverted spans and regressing starts in place of a fresh sequence.
///
/// Inverted pairs get `end = start + min_span`; a start earlier than its
/// predecessor's is raised to it. Both are logged as recoverable.
pub fn repair_timings(
    timings: Vec<CharacterTiming>,
    min_span: f64,
    diagnostics: &mut Diagnostics,
) -> Vec<CharacterTiming> {
    let mut previous_start = 0.0_f64;

    timings
        .into_iter()
        .enumerate()
        .map(|(index, mut t)| {
            if t.start < previous_start {
                diagnostics.warn(Diagnostic::StartRegressed {
                    index,
                    start: t.start,
                    previous: previous_start,
                });
                t.start = previous_start;
            }

            if t.end < t.start {
                diagnostics.warn(Diagnostic::TimingInverted {
                    index,
                    start: t.start,
                    end: t.end,
                });
                t.end = t.start + min_span;
            }

            previous_start = t.start;
            t
        })
        .collect()
}
