//! Packing a chunk into display lines.

use super::Segmenter;
use super::boundary::{Boundary, MorphemeAnalyzer, is_removable};
use super::score::{SplitContext, SplitDecision, SplitReason};
use crate::cue::RawCue;
use jimaku_align::diagnostics::{Diagnostic, Diagnostics};
use jimaku_align::text::{is_display, is_unspoken, quote_mask};
use jimaku_align::types::CharacterTiming;
use std::ops::Range;

impl Segmenter {
    /// Lay out one chunk as a cue of at most `max_lines` lines.
    ///
    /// Returns `None` for chunks with nothing but punctuation, or whose lines
    /// are all blank after punctuation removal.
    pub(crate) fn pack(
        &self,
        units: &[CharacterTiming],
        analyzer: &dyn MorphemeAnalyzer,
        splits: &mut Vec<SplitDecision>,
        diagnostics: &mut Diagnostics,
    ) -> Option<RawCue> {
        if units.iter().all(|t| is_unspoken(t.character)) {
            return None;
        }

        let chars: Vec<char> = units.iter().map(|t| t.character).collect();
        let quoted = quote_mask(chars.iter().copied());
        let morphology = analyzer.analyze(&chars);
        let ctx = SplitContext::new(&chars, &quoted, &morphology);

        let total = ctx.total_display();
        let max = self.max_chars_per_line;

        let mut overflow = false;
        let ranges: Vec<Range<usize>> = if total <= max {
            vec![0..chars.len()]
        } else if let Some((p, boundary)) = self.priority_split(&ctx) {
            splits.push(SplitDecision {
                text: chars.iter().collect(),
                ideal: p,
                index: p,
                reason: SplitReason::LinePriority(boundary),
                candidates: Vec::new(),
            });
            vec![0..p, p..chars.len()]
        } else {
            let mut ranges = Vec::with_capacity(self.max_lines);
            let mut from = 0;

            while from < chars.len() && ranges.len() < self.max_lines {
                let tail = morphology.tail(from);
                let sub = SplitContext::new(&chars[from..], &quoted[from..], &tail);
                let remaining = sub.total_display();

                if remaining <= max || ranges.len() + 1 == self.max_lines || sub.len() < 2 {
                    if remaining > max {
                        overflow = true;
                        diagnostics.warn(Diagnostic::LineOverflow {
                            line: chars[from..].iter().collect(),
                            length: remaining,
                            limit: max,
                        });
                    }
                    ranges.push(from..chars.len());
                    break;
                }

                // The lines left after this one must hold the rest.
                let lines_left = self.max_lines - ranges.len() - 1;
                let min_len = remaining.saturating_sub(max * lines_left);
                let decision = self.search().find(&sub, max, min_len, max);
                if decision.reason == SplitReason::Forced {
                    diagnostics.warn(Diagnostic::ForcedSplit {
                        text: decision.text.clone(),
                        index: decision.index,
                        score: best_score(&decision),
                    });
                }

                ranges.push(from..from + decision.index);
                from += decision.index;
                splits.push(decision);
            }

            ranges
        };

        let lines: Vec<String> = ranges
            .iter()
            .map(|r| self.render(&chars[r.clone()], &quoted[r.clone()]))
            .filter(|line| !line.is_empty())
            .collect();

        if lines.is_empty() {
            return None;
        }

        let mut shown = units.iter().filter(|t| is_display(t.character));
        let first = shown.next().or(units.first())?;
        let last = shown.next_back().unwrap_or(first);
        let ends_sentence = matches!(last.character, '。' | '！' | '？' | '!' | '?');

        Some(RawCue {
            ends_sentence,
            overflow,
            ..RawCue::new(lines, first.start, last.end.max(first.start))
        })
    }

    /// Two-line split by boundary priority, searching from the end.
    fn priority_split(&self, ctx: &SplitContext) -> Option<(usize, Boundary)> {
        if self.max_lines < 2 || ctx.total_display() > self.max_lines * self.max_chars_per_line {
            return None;
        }

        let n = ctx.len();
        let fits = |len: usize| (self.min_line_length..=self.max_chars_per_line).contains(&len);

        Boundary::PRIORITY.into_iter().find_map(|boundary| {
            (1..n)
                .rev()
                .find(|&p| {
                    boundary.at(ctx.chars, ctx.quoted, p)
                        && fits(ctx.display_len(0, p))
                        && fits(ctx.display_len(p, n))
                })
                .map(|p| (p, boundary))
        })
    }

    /// Display text of a line, with punctuation removed outside quotations
    /// when configured.
    fn render(&self, chars: &[char], quoted: &[bool]) -> String {
        let hidden = |c: char, inside: bool| {
            self.remove_punctuation_in_display && !inside && is_removable(c)
        };
        chars
            .iter()
            .zip(quoted)
            .filter(|&(&c, &inside)| !hidden(c, inside))
            .map(|(c, _)| *c)
            .collect::<String>()
            .trim()
            .to_string()
    }
}

pub(crate) fn best_score(decision: &SplitDecision) -> f64 {
    decision
        .candidates
        .iter()
        .map(|c| c.score)
        .fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use crate::segment::Segmenter;
    use crate::segment::boundary::NoMorphology;
    use crate::segment::score::SplitReason;
    use jimaku_align::diagnostics::{Diagnostic, Diagnostics};
    use jimaku_align::types::CharacterTiming;

    fn timed(text: &str) -> Vec<CharacterTiming> {
        text.chars()
            .enumerate()
            .map(|(i, c)| CharacterTiming::new(c, i as f64 * 0.1, (i + 1) as f64 * 0.1, 1.0))
            .collect()
    }

    fn pack(segmenter: &Segmenter, text: &str) -> (Option<crate::cue::RawCue>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let mut splits = Vec::new();
        let cue = segmenter.pack(&timed(text), &NoMorphology, &mut splits, &mut diagnostics);
        (cue, diagnostics)
    }

    #[test]
    fn short_chunk_is_one_line() {
        let (cue, _) = pack(&Segmenter::JAPANESE, "今日は晴れです。");
        let cue = cue.unwrap();

        assert_eq!(cue.lines, vec!["今日は晴れです"]);
        assert!(cue.ends_sentence);
        assert!((cue.start - 0.0).abs() < 1e-9);
        assert!((cue.end - 0.8).abs() < 1e-9);
    }

    #[test]
    fn prefers_comma_for_two_lines() {
        let segmenter = Segmenter {
            max_chars_per_line: 10,
            ..Segmenter::JAPANESE
        };

        let (cue, _) = pack(&segmenter, "昨日の夜は寒かった、今朝も寒い");

        assert_eq!(cue.unwrap().lines, vec!["昨日の夜は寒かった、", "今朝も寒い"]);
    }

    #[test]
    fn falls_back_to_particle() {
        let segmenter = Segmenter {
            max_chars_per_line: 10,
            ..Segmenter::JAPANESE
        };

        let (cue, _) = pack(&segmenter, "東京タワーを見に行きました");

        let lines = cue.unwrap().lines;
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.concat(), "東京タワーを見に行きました");
    }

    #[test]
    fn keeps_punctuation_inside_quotes() {
        let (cue, _) = pack(&Segmenter::JAPANESE, "「はい。」と答えた。");

        assert_eq!(cue.unwrap().lines, vec!["「はい。」と答えた"]);
    }

    #[test]
    fn punctuation_only_chunk_is_dropped() {
        let (cue, _) = pack(&Segmenter::JAPANESE, "。」");

        assert!(cue.is_none());
    }

    #[test]
    fn overflowing_last_line_is_flagged() {
        let segmenter = Segmenter {
            max_chars_per_line: 4,
            max_lines: 1,
            ..Segmenter::JAPANESE
        };

        let (cue, diagnostics) = pack(&segmenter, "あいうえおか");
        let cue = cue.unwrap();

        assert!(cue.overflow);
        assert_eq!(cue.lines, vec!["あいうえおか"]);
        assert!(diagnostics.any(|d| matches!(d, Diagnostic::LineOverflow { length: 6, .. })));
    }

    #[test]
    fn scored_lines_respect_limit() {
        let segmenter = Segmenter {
            max_chars_per_line: 8,
            max_lines: 3,
            ..Segmenter::JAPANESE
        };
        let mut diagnostics = Diagnostics::new();
        let mut splits = Vec::new();

        let cue = segmenter
            .pack(
                &timed("ああああいいいいううううええええ"),
                &NoMorphology,
                &mut splits,
                &mut diagnostics,
            )
            .unwrap();

        assert!(cue.lines.iter().all(|l| l.chars().count() <= 8));
        assert_eq!(cue.lines.concat().chars().count(), 16);
        assert!(!cue.overflow);
        match &splits[..] {
            [decision] => assert_eq!(decision.reason, SplitReason::Forced),
            _ => panic!("expected 1 split, got {}", splits.len()),
        }
        assert!(diagnostics.any(|d| matches!(d, Diagnostic::ForcedSplit { index: 8, .. })));
    }
}
