//! Core types for jimaku-align

use serde::{Deserialize, Serialize};

/// Timing of a single reference character.
///
/// Sequences of these are monotonic non-decreasing in `start` and every
/// entry satisfies `end >= start`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterTiming {
    /// The character as it appears in the reference text
    pub character: char,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Confidence in [0, 1]
    #[serde(default = "full_confidence")]
    pub confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

impl CharacterTiming {
    pub fn new(character: char, start: f64, end: f64, confidence: f64) -> Self {
        Self {
            character,
            start,
            end,
            confidence,
        }
    }

    /// Zero-width timing pinned at `at`.
    pub fn point(character: char, at: f64) -> Self {
        Self::new(character, at, at, 1.0)
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Shift both bounds by `offset` seconds.
    pub fn shifted(&self, offset: f64) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
            ..self.clone()
        }
    }
}

/// A recognized word from the ASR provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AsrWord {
    /// Recognized surface text
    #[serde(alias = "word")]
    pub text: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Recognition confidence in [0, 1]
    #[serde(default = "full_confidence", alias = "probability")]
    pub confidence: f64,
}

impl AsrWord {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            confidence: 1.0,
        }
    }
}

/// Raw ASR output.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsrTranscript {
    /// Full recognized text
    #[serde(default)]
    pub recognized_text: String,
    /// Word-level timings
    pub words: Vec<AsrWord>,
}

impl AsrTranscript {
    /// Build a transcript whose text is the concatenation of its words.
    pub fn from_words(words: Vec<AsrWord>) -> Self {
        let recognized_text = words.iter().map(|w| w.text.as_str()).collect();
        Self {
            recognized_text,
            words,
        }
    }
}

/// Tier that produced a timing sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingSource {
    /// Direct forced alignment from the synthesis provider
    ForcedAlignment,
    /// ASR words aligned with dynamic time warping
    Dtw,
    /// ASR words mapped by character-count ratio
    Ratio,
    /// Audio duration divided evenly
    Uniform,
}

/// Monotonic list of `(recognized_index, reference_index)` pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlignmentPath(Vec<(usize, usize)>);

impl AlignmentPath {
    pub fn new(pairs: Vec<(usize, usize)>) -> Self {
        Self(pairs)
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Indices of steps that move backwards in either coordinate.
    pub fn inversions(&self) -> Vec<usize> {
        self.0
            .windows(2)
            .enumerate()
            .filter(|(_, w)| w[1].0 < w[0].0 || w[1].1 < w[0].1)
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Clamp each coordinate to its running maximum.
    ///
    /// The result is non-decreasing in both coordinates.
    pub fn into_monotonic(self) -> Self {
        let mut max_rec = 0;
        let mut max_ref = 0;
        let pairs = self
            .0
            .into_iter()
            .map(|(rec, reference)| {
                max_rec = max_rec.max(rec);
                max_ref = max_ref.max(reference);
                (max_rec, max_ref)
            })
            .collect();
        Self(pairs)
    }

    /// Fraction of `0..rec_len` and `0..ref_len` visited by the path.
    pub fn coverage(&self, rec_len: usize, ref_len: usize) -> (f64, f64) {
        let covered = |len: usize, pick: fn(&(usize, usize)) -> usize| {
            if len == 0 {
                return 1.0;
            }
            let mut seen = vec![false; len];
            for p in &self.0 {
                if let Some(slot) = seen.get_mut(pick(p)) {
                    *slot = true;
                }
            }
            seen.iter().filter(|s| **s).count() as f64 / len as f64
        };
        (covered(rec_len, |p| p.0), covered(ref_len, |p| p.1))
    }
}
