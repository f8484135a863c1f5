//! Character classes and text normalization for Japanese narration.

/// Brackets and quotation glyphs. Never displayed in character counts.
const BRACKETS: &[char] = &[
    '「', '」', '『', '』', '【', '】', '（', '）', '(', ')', '〈', '〉', '《', '》',
];

/// Punctuation tracked by position during segmentation.
const PUNCTUATION: &[char] = &['。', '！', '？', '、', '…', '，', '．', '!', '?'];

/// Sentence-terminal marks.
const TERMINALS: &[char] = &['。', '！', '？'];

/// Script class of a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharKind {
    Hiragana,
    Katakana,
    Kanji,
    Digit,
    Latin,
    Other,
}

impl CharKind {
    pub fn of(c: char) -> Self {
        match c {
            '\u{3040}'..='\u{309F}' => Self::Hiragana,
            '\u{30A0}'..='\u{30FF}' => Self::Katakana,
            '\u{4E00}'..='\u{9FFF}' => Self::Kanji,
            '0'..='9' | '\u{FF10}'..='\u{FF19}' => Self::Digit,
            'a'..='z' | 'A'..='Z' => Self::Latin,
            _ => Self::Other,
        }
    }
}

pub fn is_bracket(c: char) -> bool {
    BRACKETS.contains(&c)
}

pub fn is_punctuation(c: char) -> bool {
    PUNCTUATION.contains(&c)
}

/// `。！？`
pub fn is_terminal(c: char) -> bool {
    TERMINALS.contains(&c)
}

pub fn is_quote_open(c: char) -> bool {
    matches!(c, '「' | '『')
}

pub fn is_quote_close(c: char) -> bool {
    matches!(c, '」' | '』')
}

/// Counts toward line length: not whitespace, not a bracket or quote glyph.
pub fn is_display(c: char) -> bool {
    !c.is_whitespace() && !is_bracket(c)
}

/// Removed before sequence alignment: whitespace, punctuation, brackets.
pub fn is_unspoken(c: char) -> bool {
    c.is_whitespace() || is_punctuation(c) || is_bracket(c)
}

/// Fold fullwidth digits and Latin letters to ASCII.
pub fn fold_width(c: char) -> char {
    match c {
        '\u{FF10}'..='\u{FF19}' | '\u{FF21}'..='\u{FF3A}' | '\u{FF41}'..='\u{FF5A}' => {
            char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
        }
        _ => c,
    }
}

/// Count display characters in `text`.
pub fn display_len(text: &str) -> usize {
    text.chars().filter(|c| is_display(*c)).count()
}

/// Text with unspoken characters removed and an index map back to the source.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedText {
    /// Width-folded spoken characters
    pub chars: Vec<char>,
    /// Char index in the source text of each entry in `chars`
    pub positions: Vec<usize>,
}

impl NormalizedText {
    pub fn new(text: &str) -> Self {
        let (chars, positions) = text
            .chars()
            .enumerate()
            .filter(|(_, c)| !is_unspoken(*c))
            .map(|(i, c)| (fold_width(c), i))
            .unzip();
        Self { chars, positions }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }
}

/// Open/close counter over `「」『』`.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuoteTracker {
    depth: u32,
}

impl QuoteTracker {
    /// Update with `c`; returns whether the position of `c` is inside quotes.
    ///
    /// Opening and closing glyphs count as inside.
    pub fn observe(&mut self, c: char) -> bool {
        if is_quote_open(c) {
            self.depth += 1;
            true
        } else if is_quote_close(c) {
            let inside = self.depth > 0;
            self.depth = self.depth.saturating_sub(1);
            inside
        } else {
            self.depth > 0
        }
    }

    pub fn is_open(&self) -> bool {
        self.depth > 0
    }
}

/// Per-character quotation flags for `chars`.
pub fn quote_mask(chars: impl IntoIterator<Item = char>) -> Vec<bool> {
    let mut tracker = QuoteTracker::default();
    chars.into_iter().map(|c| tracker.observe(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_scripts() {
        assert_eq!(CharKind::of('は'), CharKind::Hiragana);
        assert_eq!(CharKind::of('カ'), CharKind::Katakana);
        assert_eq!(CharKind::of('晴'), CharKind::Kanji);
        assert_eq!(CharKind::of('７'), CharKind::Digit);
        assert_eq!(CharKind::of('x'), CharKind::Latin);
        assert_eq!(CharKind::of('。'), CharKind::Other);
    }

    #[test]
    fn normalizes_with_position_map() {
        let normalized = NormalizedText::new("「今日、ＡＩ」は");

        assert_eq!(normalized.as_string(), "今日AIは");
        assert_eq!(normalized.positions, vec![1, 2, 4, 5, 7]);
    }

    #[test]
    fn display_len_skips_brackets_and_whitespace() {
        assert_eq!(display_len("「晴れ」 です。"), 5);
    }

    #[test]
    fn quote_mask_tracks_nesting() {
        let mask = quote_mask("a「b『c』d」e".chars());

        assert_eq!(
            mask,
            vec![false, true, true, true, true, true, true, true, false]
        );
    }

    #[test]
    fn unbalanced_close_does_not_underflow() {
        let mut tracker = QuoteTracker::default();

        assert!(!tracker.observe('」'));
        assert!(!tracker.observe('a'));
        assert!(!tracker.is_open());
    }
}
