//! Split-point boundary detection over a character slice.
//!
//! A split position `p` sits between `chars[p - 1]` and `chars[p]`. All
//! predicates here return `false` at `p == 0` and `p >= chars.len()`.

use jimaku_align::text::{CharKind, is_punctuation, is_terminal};

/// Single-character particles.
const PARTICLES: &[char] = &['は', 'が', 'を', 'に', 'で', 'と', 'も', 'や'];

/// Two-character particles.
const COMPOUND_PARTICLES: &[[char; 2]] = &[['か', 'ら'], ['ま', 'で'], ['よ', 'り']];

/// Kind of boundary a split position falls on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    Comma,
    Particle,
    HiraganaToKanji,
    KanjiToHiragana,
    Katakana,
}

impl Boundary {
    /// Line-packing priority order.
    pub const PRIORITY: [Self; 5] = [
        Self::Comma,
        Self::Particle,
        Self::HiraganaToKanji,
        Self::KanjiToHiragana,
        Self::Katakana,
    ];

    /// Whether `p` lies on this kind of boundary.
    ///
    /// Comma boundaries inside quotations never count.
    pub fn at(self, chars: &[char], quoted: &[bool], p: usize) -> bool {
        if p == 0 || p >= chars.len() {
            return false;
        }
        let (left, right) = (chars[p - 1], chars[p]);
        match self {
            Self::Comma => is_comma(left) && !quoted.get(p - 1).copied().unwrap_or(false),
            Self::Particle => is_particle_end(chars, p),
            Self::HiraganaToKanji => {
                CharKind::of(left) == CharKind::Hiragana && CharKind::of(right) == CharKind::Kanji
            }
            Self::KanjiToHiragana => {
                CharKind::of(left) == CharKind::Kanji && CharKind::of(right) == CharKind::Hiragana
            }
            Self::Katakana => {
                (CharKind::of(left) == CharKind::Katakana)
                    != (CharKind::of(right) == CharKind::Katakana)
            }
        }
    }
}

pub fn is_comma(c: char) -> bool {
    matches!(c, '、' | '，' | ',')
}

/// `p` directly follows a comma or terminal mark outside quotation.
pub fn after_punctuation(chars: &[char], quoted: &[bool], p: usize) -> bool {
    p > 0
        && p < chars.len()
        && !quoted.get(p - 1).copied().unwrap_or(false)
        && (is_comma(chars[p - 1]) || is_terminal(chars[p - 1]) || chars[p - 1] == '…')
}

fn is_particle_end(chars: &[char], p: usize) -> bool {
    if PARTICLES.contains(&chars[p - 1]) {
        return true;
    }
    p >= 2 && COMPOUND_PARTICLES.contains(&[chars[p - 2], chars[p - 1]])
}

/// Fragment ends in `ん` or `っ`.
pub fn ends_with_n_tsu(chars: &[char], p: usize) -> bool {
    p > 0 && matches!(chars.get(p - 1), Some('ん' | 'っ'))
}

/// Both sides of `p` are digits.
pub fn splits_digits(chars: &[char], p: usize) -> bool {
    splits_run(chars, p, CharKind::Digit)
}

/// Both sides of `p` are Latin letters.
pub fn splits_latin(chars: &[char], p: usize) -> bool {
    splits_run(chars, p, CharKind::Latin)
}

fn splits_run(chars: &[char], p: usize, kind: CharKind) -> bool {
    p > 0
        && p < chars.len()
        && CharKind::of(chars[p - 1]) == kind
        && CharKind::of(chars[p]) == kind
}

/// Punctuation that can be dropped from display.
///
/// `、` stays visible as a reading aid.
pub fn is_removable(c: char) -> bool {
    is_punctuation(c) && !matches!(c, '、')
}

/// Morphological information for one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Morphology {
    /// Split positions that fall between two morphemes
    pub boundaries: Vec<usize>,
    /// Split positions strictly inside a verb or adjective
    pub verb_adjective_interior: Vec<usize>,
}

impl Morphology {
    /// Build from morpheme spans `(start, end, is_verb_or_adjective)`.
    pub fn from_spans(spans: &[(usize, usize, bool)], len: usize) -> Self {
        let mut morphology = Self::default();
        for &(start, end, inflecting) in spans {
            if end < len {
                morphology.boundaries.push(end);
            }
            if inflecting {
                morphology.verb_adjective_interior.extend(start + 1..end);
            }
        }
        morphology
    }

    pub fn is_boundary(&self, p: usize) -> bool {
        self.boundaries.contains(&p)
    }

    pub fn splits_inflecting(&self, p: usize) -> bool {
        self.verb_adjective_interior.contains(&p)
    }

    /// Positions relative to `chars[offset..]`.
    pub fn tail(&self, offset: usize) -> Self {
        let shift = |positions: &[usize]| -> Vec<usize> {
            positions
                .iter()
                .filter(|&&p| p > offset)
                .map(|p| p - offset)
                .collect()
        };
        Self {
            boundaries: shift(&self.boundaries),
            verb_adjective_interior: shift(&self.verb_adjective_interior),
        }
    }
}

/// Source of morpheme boundaries.
///
/// The engine ships without a dictionary; plug in an analyzer to enable the
/// morpheme bonus and the verb/adjective penalty.
pub trait MorphemeAnalyzer: Send + Sync {
    fn analyze(&self, chars: &[char]) -> Morphology;
}

/// Analyzer that finds nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMorphology;

impl MorphemeAnalyzer for NoMorphology {
    fn analyze(&self, _chars: &[char]) -> Morphology {
        Morphology::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn detects_script_transitions() {
        let c = chars("東京へいくカメラ");
        let q = vec![false; c.len()];

        assert!(Boundary::KanjiToHiragana.at(&c, &q, 2));
        assert!(Boundary::Katakana.at(&c, &q, 5));
        assert!(!Boundary::HiraganaToKanji.at(&c, &q, 3));
    }

    #[test]
    fn detects_particles_including_compound() {
        let c = chars("駅から家まで");

        assert!(is_particle_end(&c, 3));
        assert!(!is_particle_end(&c, 5));
        assert!(Boundary::Particle.at(&c, &vec![false; c.len()], 3));
    }

    #[test]
    fn comma_inside_quotes_is_not_a_boundary() {
        let c = chars("「あ、い」う、え");
        let q = jimaku_align::text::quote_mask(c.iter().copied());

        assert!(!Boundary::Comma.at(&c, &q, 3));
        assert!(Boundary::Comma.at(&c, &q, 7));
    }

    #[test]
    fn detects_digit_and_latin_runs() {
        let c = chars("2024年AI");

        assert!(splits_digits(&c, 2));
        assert!(!splits_digits(&c, 4));
        assert!(splits_latin(&c, 6));
    }

    #[test]
    fn morphology_from_spans() {
        let m = Morphology::from_spans(&[(0, 2, false), (2, 5, true), (5, 6, false)], 6);

        assert_eq!(m.boundaries, vec![2, 5]);
        assert_eq!(m.verb_adjective_interior, vec![3, 4]);
        assert_eq!(m.tail(2).boundaries, vec![3]);
        assert_eq!(m.tail(2).verb_adjective_interior, vec![1, 2]);
    }
}
