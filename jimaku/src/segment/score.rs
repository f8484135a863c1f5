//! Scored split-point search.
//!
//! Every function here is pure: it reads a [`SplitContext`] and returns a
//! new [`SplitDecision`], never touching the chunk itself.

use super::boundary::{
    Boundary, Morphology, after_punctuation, ends_with_n_tsu, splits_digits, splits_latin,
};
use jimaku_align::text::{is_display, is_quote_open};
use serde::{Deserialize, Serialize};

/// Bonuses added when a split position lands on a natural break.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoreWeights {
    pub morpheme_boundary: f64,
    pub punctuation: f64,
    pub particle: f64,
    pub hiragana_to_kanji: f64,
    pub kanji_to_hiragana: f64,
    pub katakana_boundary: f64,
}

impl ScoreWeights {
    pub const DEFAULT: Self = Self {
        morpheme_boundary: 150.0,
        punctuation: 120.0,
        particle: 100.0,
        hiragana_to_kanji: 80.0,
        kanji_to_hiragana: 60.0,
        katakana_boundary: 40.0,
    };
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Penalties subtracted from a split position's score.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Penalties {
    /// Per character away from the ideal position
    pub distance_from_ideal: f64,
    /// Fragment ends in `ん` or `っ`
    pub ends_with_n_tsu: f64,
    pub splits_number: f64,
    pub splits_alphabet: f64,
    pub splits_verb_adjective: f64,
    /// Per fragment shorter than the minimum chunk length
    pub short_fragment: f64,
    /// Multiplied by `|first / total - 0.5|`
    pub imbalance: f64,
    /// Best score below this forces a split at the ideal position
    pub floor: f64,
}

impl Penalties {
    pub const DEFAULT: Self = Self {
        distance_from_ideal: 5.0,
        ends_with_n_tsu: 20.0,
        splits_number: 50.0,
        splits_alphabet: 50.0,
        splits_verb_adjective: 500.0,
        short_fragment: 200.0,
        imbalance: 100.0,
        floor: -100.0,
    };
}

impl Default for Penalties {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Why a split position was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitReason {
    /// Directly after a comma or terminal mark
    Punctuation,
    MorphemeBoundary,
    Boundary(Boundary),
    /// Highest score without a named break
    BestAvailable,
    /// Last comma before the limit
    CommaPriority,
    /// First boundary found by line-packing priority
    LinePriority(Boundary),
    /// No candidate scored above the floor
    Forced,
}

/// Score of one split position.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SplitCandidate {
    pub index: usize,
    pub score: f64,
    pub reason: Option<SplitReason>,
}

/// Outcome of a split search, kept for the debug dump.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SplitDecision {
    pub text: String,
    pub ideal: usize,
    pub index: usize,
    pub reason: SplitReason,
    pub candidates: Vec<SplitCandidate>,
}

/// Read-only view of a chunk for scoring.
#[derive(Debug)]
pub struct SplitContext<'a> {
    pub chars: &'a [char],
    /// Per-character quotation flags
    pub quoted: &'a [bool],
    pub morphology: &'a Morphology,
    /// `display[p]` = display characters in `chars[..p]`
    display: Vec<usize>,
}

impl<'a> SplitContext<'a> {
    pub fn new(chars: &'a [char], quoted: &'a [bool], morphology: &'a Morphology) -> Self {
        let display = std::iter::once(0)
            .chain(chars.iter().scan(0, |acc, &c| {
                *acc += usize::from(is_display(c));
                Some(*acc)
            }))
            .collect();

        Self {
            chars,
            quoted,
            morphology,
            display,
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Display characters in `chars[from..to]`.
    pub fn display_len(&self, from: usize, to: usize) -> usize {
        self.display[to] - self.display[from]
    }

    pub fn total_display(&self) -> usize {
        self.display[self.len()]
    }

    /// Smallest split position whose first fragment has at least `min`
    /// display characters.
    pub fn index_from_display(&self, min: usize) -> usize {
        self.display.partition_point(|&d| d < min).min(self.len())
    }

    /// Largest split position whose first fragment fits in `limit` display
    /// characters, not leaving an opening quote dangling at the line end.
    pub fn index_at_display(&self, limit: usize) -> usize {
        let mut p = self.display.partition_point(|&d| d <= limit) - 1;
        while p > 1 && is_quote_open(self.chars[p - 1]) {
            p -= 1;
        }
        p
    }

    fn text(&self) -> String {
        self.chars.iter().collect()
    }
}

/// Tunable parameters of the scored search.
#[derive(Clone, Copy, Debug)]
pub struct SplitSearch {
    pub weights: ScoreWeights,
    pub penalties: Penalties,
    pub window: usize,
    pub min_chunk: usize,
}

impl SplitSearch {
    /// Score split position `p` against `ideal`.
    pub fn score(&self, ctx: &SplitContext, p: usize, ideal: usize) -> SplitCandidate {
        let w = &self.weights;
        let pen = &self.penalties;

        let first = ctx.display_len(0, p);
        let second = ctx.display_len(p, ctx.len());
        let total = (first + second).max(1);

        let mut score = 0.0;
        let mut reason = None;

        if first < self.min_chunk {
            score -= pen.short_fragment;
        }
        if second < self.min_chunk {
            score -= pen.short_fragment;
        }
        score -= (first as f64 / total as f64 - 0.5).abs() * pen.imbalance;

        if after_punctuation(ctx.chars, ctx.quoted, p) {
            score += w.punctuation;
            reason = Some(SplitReason::Punctuation);
        }

        if ctx.morphology.is_boundary(p) {
            score += w.morpheme_boundary;
            reason = reason.or(Some(SplitReason::MorphemeBoundary));
        }

        let transition = [
            (Boundary::Particle, w.particle),
            (Boundary::HiraganaToKanji, w.hiragana_to_kanji),
            (Boundary::KanjiToHiragana, w.kanji_to_hiragana),
            (Boundary::Katakana, w.katakana_boundary),
        ]
        .into_iter()
        .find(|(boundary, _)| boundary.at(ctx.chars, ctx.quoted, p));

        if let Some((boundary, bonus)) = transition {
            score += bonus;
            reason = reason.or(Some(SplitReason::Boundary(boundary)));
        }

        if ctx.morphology.splits_inflecting(p) {
            score -= pen.splits_verb_adjective;
        }

        score -= p.abs_diff(ideal) as f64 * pen.distance_from_ideal;

        if ends_with_n_tsu(ctx.chars, p) {
            score -= pen.ends_with_n_tsu;
        }
        if splits_digits(ctx.chars, p) {
            score -= pen.splits_number;
        }
        if splits_latin(ctx.chars, p) {
            score -= pen.splits_alphabet;
        }

        SplitCandidate {
            index: p,
            score,
            reason,
        }
    }

    /// Pick the best split position near `ideal_len` display characters.
    ///
    /// Candidates are limited to `±window` around the ideal position and keep
    /// the first fragment between `min_len` and `hard_len` display characters.
    /// The chunk must have at least two characters.
    pub fn find(
        &self,
        ctx: &SplitContext,
        ideal_len: usize,
        min_len: usize,
        hard_len: usize,
    ) -> SplitDecision {
        let last = ctx.len().saturating_sub(1).max(1);
        let hard = ctx.index_at_display(hard_len).clamp(1, last);
        let floor = ctx.index_from_display(min_len).clamp(1, hard);
        let ideal = ctx.index_at_display(ideal_len).clamp(floor, hard);

        let lo = ideal.saturating_sub(self.window).max(floor);
        let hi = (ideal + self.window).min(hard);

        let candidates: Vec<SplitCandidate> =
            (lo..=hi).map(|p| self.score(ctx, p, ideal)).collect();

        let best = candidates.iter().fold(None::<&SplitCandidate>, |best, c| match best {
            Some(b) if b.score >= c.score => Some(b),
            _ => Some(c),
        });

        let (index, reason) = match best {
            Some(b) if b.score >= self.penalties.floor => {
                (b.index, b.reason.unwrap_or(SplitReason::BestAvailable))
            }
            _ => (ideal, SplitReason::Forced),
        };

        SplitDecision {
            text: ctx.text(),
            ideal,
            index,
            reason,
            candidates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH: SplitSearch = SplitSearch {
        weights: ScoreWeights::DEFAULT,
        penalties: Penalties::DEFAULT,
        window: 3,
        min_chunk: 10,
    };

    fn context<'a>(chars: &'a [char], quoted: &'a [bool], m: &'a Morphology) -> SplitContext<'a> {
        SplitContext::new(chars, quoted, m)
    }

    #[test]
    fn display_prefix_skips_brackets() {
        let chars: Vec<char> = "「晴れ」です".chars().collect();
        let quoted = vec![false; chars.len()];
        let m = Morphology::default();
        let ctx = context(&chars, &quoted, &m);

        assert_eq!(ctx.total_display(), 4);
        assert_eq!(ctx.display_len(0, 4), 2);
        assert_eq!(ctx.index_at_display(2), 4);
    }

    #[test]
    fn index_at_display_backs_off_opening_quote() {
        let chars: Vec<char> = "あい「うえ」".chars().collect();
        let quoted = vec![false; chars.len()];
        let m = Morphology::default();
        let ctx = context(&chars, &quoted, &m);

        assert_eq!(ctx.index_at_display(2), 2);
    }

    #[test]
    fn prefers_split_after_comma() {
        // 24 characters, comma after the 11th
        let chars: Vec<char> = "ああああああああああい、うううううううううううう".chars().collect();
        let quoted = vec![false; chars.len()];
        let m = Morphology::default();
        let ctx = context(&chars, &quoted, &m);

        let decision = SEARCH.find(&ctx, 12, 0, 20);

        assert_eq!(decision.index, 12);
        assert_eq!(decision.reason, SplitReason::Punctuation);
        assert_eq!(decision.candidates.len(), 7);
    }

    #[test]
    fn verb_interior_is_effectively_forbidden() {
        let chars: Vec<char> = "あいうえおかきくけこさしすせそたちつてと".chars().collect();
        let quoted = vec![false; chars.len()];
        let m = Morphology {
            boundaries: vec![],
            verb_adjective_interior: vec![10],
        };
        let ctx = context(&chars, &quoted, &m);

        let candidate = SEARCH.score(&ctx, 10, 10);

        assert!(candidate.score < -400.0);
    }

    #[test]
    fn forced_split_when_every_candidate_is_below_floor() {
        // All candidates leave a fragment shorter than 10
        let chars: Vec<char> = "あいうえおかきく".chars().collect();
        let quoted = vec![false; chars.len()];
        let m = Morphology::default();
        let ctx = context(&chars, &quoted, &m);

        let decision = SEARCH.find(&ctx, 4, 0, 6);

        assert_eq!(decision.reason, SplitReason::Forced);
        assert_eq!(decision.index, 4);
    }

    #[test]
    fn minimum_length_narrows_candidates() {
        let chars: Vec<char> = "あいうえおかきくけこさしすせそ".chars().collect();
        let quoted = vec![false; chars.len()];
        let m = Morphology::default();
        let ctx = context(&chars, &quoted, &m);

        let decision = SEARCH.find(&ctx, 8, 7, 8);

        match &decision.candidates[..] {
            [first, .., last] => {
                assert_eq!(first.index, 7);
                assert_eq!(last.index, 8);
            }
            _ => panic!("expected at least 2 candidates"),
        }
    }

    #[test]
    fn penalizes_splitting_numbers() {
        let chars: Vec<char> = "西暦二〇二四年は2024年".chars().collect();
        let quoted = vec![false; chars.len()];
        let m = Morphology::default();
        let ctx = context(&chars, &quoted, &m);

        let search = SplitSearch {
            min_chunk: 1,
            ..SEARCH
        };

        let inside = search.score(&ctx, 10, 10);
        let before = search.score(&ctx, 8, 10);

        assert!(inside.score < before.score);
    }
}
