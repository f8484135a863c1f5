//! Dynamic time warping between recognized and reference text.
//!
//! ASR output drifts from the script: homophones, dropped particles, merged
//! words. Both texts are normalized, turned into small feature vectors per
//! character and aligned with a banded DTW. The resulting path maps each
//! reference character onto the recognized characters whose timings it
//! inherits.

use crate::charmap::{expand_words, reinsert_unspoken};
use crate::config::AlignConfig;
use crate::diagnostics::{AlignmentReport, Diagnostic, Diagnostics};
use crate::error::AlignmentFailure;
use crate::text::NormalizedText;
use crate::types::{AlignmentPath, AsrTranscript, CharacterTiming, TimingSource};
use ndarray::{Array2, ArrayView1};

/// Confidence given to reference characters with no mapped timing
const INTERPOLATED_CONFIDENCE: f64 = 0.5;

/// Feature vector per character: `[code point, code point % 256, code point / 256]`.
pub fn featurize(chars: &[char]) -> Array2<f64> {
    let mut features = Array2::zeros((chars.len(), 3));
    for (i, &c) in chars.iter().enumerate() {
        let cp = c as u32;
        features[[i, 0]] = cp as f64;
        features[[i, 1]] = (cp % 256) as f64;
        features[[i, 2]] = (cp / 256) as f64;
    }
    features
}

pub(crate) fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// DTW cost cells stored for the band only.
///
/// Row `i` keeps columns `offsets[i]..offsets[i] + span`; reads outside it
/// are infinite. Memory grows with `n × band` instead of `n × m`.
struct BandedCost {
    offsets: Vec<usize>,
    cells: Array2<f64>,
}

impl BandedCost {
    fn new(n: usize, m: usize, width: usize) -> Self {
        let offsets = (0..=n)
            .map(|i| match i {
                0 => 0,
                _ => (i * m / n).saturating_sub(width).max(1),
            })
            .collect();

        Self {
            offsets,
            cells: Array2::from_elem((n + 1, 2 * width + 1), f64::INFINITY),
        }
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        j.checked_sub(self.offsets[i])
            .and_then(|k| self.cells.get([i, k]).copied())
            .unwrap_or(f64::INFINITY)
    }

    fn set(&mut self, i: usize, j: usize, value: f64) {
        if let Some(k) = j.checked_sub(self.offsets[i])
            && let Some(cell) = self.cells.get_mut([i, k])
        {
            *cell = value;
        }
    }
}

/// Banded DTW over two feature matrices.
///
/// Rows of `recognized` index the first path coordinate, rows of `reference`
/// the second. The band half-width is widened to at least the length
/// difference plus one so the end cell is always reachable. Ties during
/// backtracking prefer the diagonal.
///
/// Returns `None` if either side is empty.
pub fn dtw(
    recognized: &Array2<f64>,
    reference: &Array2<f64>,
    band: usize,
) -> Option<(f64, AlignmentPath)> {
    let n = recognized.nrows();
    let m = reference.nrows();
    if n == 0 || m == 0 {
        return None;
    }

    let width = band.max(n.abs_diff(m) + 1);
    let mut cost = BandedCost::new(n, m, width);
    cost.set(0, 0, 0.0);

    for i in 1..=n {
        let lo = cost.offsets[i];
        let hi = (i * m / n + width).min(m);

        for j in lo..=hi {
            let d = euclidean(recognized.row(i - 1), reference.row(j - 1));
            let best = cost
                .get(i - 1, j - 1)
                .min(cost.get(i - 1, j))
                .min(cost.get(i, j - 1));
            cost.set(i, j, d + best);
        }
    }

    let distance = cost.get(n, m);
    if !distance.is_finite() {
        return None;
    }

    let mut pairs = Vec::with_capacity(n + m);
    let (mut i, mut j) = (n, m);
    while i > 0 && j > 0 {
        pairs.push((i - 1, j - 1));

        let diag = cost.get(i - 1, j - 1);
        let up = cost.get(i - 1, j);
        let left = cost.get(i, j - 1);

        if diag <= up && diag <= left {
            i -= 1;
            j -= 1;
        } else if up <= left {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    pairs.reverse();

    Some((distance, AlignmentPath::new(pairs)))
}

/// Sequence aligner mapping ASR words onto the reference text.
#[derive(Clone, Copy, Debug)]
pub struct DtwAligner {
    /// Band half-width in characters
    pub band: usize,
    /// Coverage below which a low-confidence warning is recorded
    pub min_coverage: f64,
}

impl DtwAligner {
    pub const DEFAULT: Self = Self {
        band: 64,
        min_coverage: 0.8,
    };

    pub fn from_config(config: &AlignConfig) -> Self {
        Self {
            band: config.band,
            min_coverage: config.min_coverage,
        }
    }

    /// Align `transcript` to `reference`, one timing per reference `char`.
    ///
    /// Low coverage and path inversions are recorded in `diagnostics` and
    /// never abort. Fails only when there is nothing to align against.
    pub fn align(
        &self,
        reference: &str,
        transcript: &AsrTranscript,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<CharacterTiming>, AlignmentFailure> {
        let normalized = NormalizedText::new(reference);
        let recognized = expand_words(&transcript.words);

        if recognized.is_empty() {
            return Err(AlignmentFailure::EmptyTranscript);
        }
        if normalized.is_empty() {
            return Ok(reinsert_unspoken(reference, &normalized, &[]));
        }

        let rec_chars: Vec<char> = recognized.iter().map(|t| t.character).collect();
        let (distance, path) = dtw(
            &featurize(&rec_chars),
            &featurize(&normalized.chars),
            self.band,
        )
        .ok_or(AlignmentFailure::EmptyPath)?;

        let path = self.validate(path, rec_chars.len(), normalized.len(), diagnostics)?;

        tracing::debug!(
            reference = normalized.len(),
            recognized = rec_chars.len(),
            distance,
            steps = path.len(),
            "dtw alignment"
        );

        let spoken = assign(&path, &normalized, &recognized);
        let (recognized_coverage, reference_coverage) =
            path.coverage(rec_chars.len(), normalized.len());

        diagnostics.set_alignment(AlignmentReport {
            source: TimingSource::Dtw,
            reference: normalized.as_string(),
            recognized: rec_chars.iter().collect(),
            distance,
            path,
            recognized_coverage,
            reference_coverage,
        });

        Ok(reinsert_unspoken(reference, &normalized, &spoken))
    }

    /// Check a path: non-empty, monotonic after correction, and covering
    /// enough of both sequences.
    pub fn validate(
        &self,
        path: AlignmentPath,
        rec_len: usize,
        ref_len: usize,
        diagnostics: &mut Diagnostics,
    ) -> Result<AlignmentPath, AlignmentFailure> {
        if path.is_empty() {
            return Err(AlignmentFailure::EmptyPath);
        }

        let inversions = path.inversions();
        let path = if inversions.is_empty() {
            path
        } else {
            for step in inversions {
                diagnostics.warn(Diagnostic::PathInversion { step });
            }
            path.into_monotonic()
        };

        let (recognized, reference) = path.coverage(rec_len, ref_len);
        if recognized < self.min_coverage || reference < self.min_coverage {
            diagnostics.warn(Diagnostic::LowCoverage {
                recognized,
                reference,
            });
        }

        Ok(path)
    }
}

impl Default for DtwAligner {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Timing per normalized reference character from the mapped recognized ones.
///
/// `start` is the minimum and `end` the maximum over the mapped characters,
/// confidence their mean. Unmapped positions sit at the previous end.
fn assign(
    path: &AlignmentPath,
    normalized: &NormalizedText,
    recognized: &[CharacterTiming],
) -> Vec<CharacterTiming> {
    let mut spans: Vec<Option<(f64, f64, f64, usize)>> = vec![None; normalized.len()];

    for &(rec, reference) in path.pairs() {
        let (Some(timing), Some(slot)) = (recognized.get(rec), spans.get_mut(reference)) else {
            continue;
        };
        *slot = Some(match *slot {
            Some((start, end, conf, count)) => (
                start.min(timing.start),
                end.max(timing.end),
                conf + timing.confidence,
                count + 1,
            ),
            None => (timing.start, timing.end, timing.confidence, 1),
        });
    }

    let mut out: Vec<CharacterTiming> = Vec::with_capacity(normalized.len());
    for (&c, span) in normalized.chars.iter().zip(spans) {
        let timing = match span {
            Some((start, end, conf, count)) => {
                CharacterTiming::new(c, start, end, conf / count as f64)
            }
            None => {
                let at = out.last().map_or(0.0, |t| t.end);
                CharacterTiming::new(c, at, at, INTERPOLATED_CONFIDENCE)
            }
        };
        out.push(timing);
    }
    out
}
