//! Character-count ratio alignment.
//!
//! Maps the i-th reference character to recognized character
//! `min(floor(i * rec_len / ref_len), rec_len - 1)`. Cheap and tolerant of
//! garbage, but blind to insertions and deletions, so every use is flagged
//! as reduced precision.

use crate::charmap::{expand_words, reinsert_unspoken};
use crate::diagnostics::{AlignmentReport, Diagnostic, Diagnostics};
use crate::dtw::{euclidean, featurize};
use crate::error::AlignmentFailure;
use crate::text::NormalizedText;
use crate::types::{AlignmentPath, AsrTranscript, CharacterTiming, TimingSource};

#[derive(Clone, Copy, Debug, Default)]
pub struct RatioAligner;

impl RatioAligner {
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

        diagnostics.warn(Diagnostic::ReducedPrecision {
            source: TimingSource::Ratio,
        });

        if normalized.is_empty() {
            return Ok(reinsert_unspoken(reference, &normalized, &[]));
        }

        let ratio = recognized.len() as f64 / normalized.len() as f64;
        let last = recognized.len() - 1;

        let pairs: Vec<(usize, usize)> = (0..normalized.len())
            .map(|i| (((i as f64 * ratio) as usize).min(last), i))
            .collect();

        let spoken: Vec<CharacterTiming> = pairs
            .iter()
            .map(|&(rec, i)| CharacterTiming {
                character: normalized.chars[i],
                ..recognized[rec].clone()
            })
            .collect();

        let rec_chars: Vec<char> = recognized.iter().map(|t| t.character).collect();
        let rec_features = featurize(&rec_chars);
        let ref_features = featurize(&normalized.chars);
        let distance = pairs
            .iter()
            .map(|&(rec, i)| euclidean(rec_features.row(rec), ref_features.row(i)))
            .sum();

        let path = AlignmentPath::new(pairs);
        let (recognized_coverage, reference_coverage) =
            path.coverage(rec_chars.len(), normalized.len());

        tracing::debug!(ratio, distance, "ratio alignment");

        diagnostics.set_alignment(AlignmentReport {
            source: TimingSource::Ratio,
            reference: normalized.as_string(),
            recognized: rec_chars.iter().collect(),
            distance,
            path,
            recognized_coverage,
            reference_coverage,
        });

        Ok(reinsert_unspoken(reference, &normalized, &spoken))
    }
}
