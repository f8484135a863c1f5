//! Paragraph and sentence splitting.

use jimaku_align::diagnostics::{Diagnostic, Diagnostics};
use jimaku_align::text::{QuoteTracker, is_bracket, is_display, is_terminal};
use jimaku_align::types::CharacterTiming;
use std::ops::Range;

/// Closing glyphs that stay with the sentence they close.
const CLOSERS: &[char] = &['」', '』', '】', '）', ')', '〉', '》'];

/// Split `timings` at explicit line breaks of `reference`.
///
/// Breaks inside `「」『』` are discarded. Each paragraph of the reference is
/// located in the timing characters (ignoring whitespace and brackets); if
/// any paragraph cannot be found, the whole sequence is returned as one
/// paragraph. Whitespace is removed from every returned paragraph.
pub fn split_paragraphs(
    reference: &str,
    timings: &[CharacterTiming],
    diagnostics: &mut Diagnostics,
) -> Vec<Vec<CharacterTiming>> {
    let mut tracker = QuoteTracker::default();
    let cleaned: Vec<&CharacterTiming> = timings
        .iter()
        .filter(|t| {
            let inside = tracker.observe(t.character);
            !(inside && is_line_break(t.character))
        })
        .collect();

    let parts = reference_paragraphs(reference);
    if parts.len() <= 1 {
        return vec![strip_whitespace(&cleaned)];
    }

    let keys: Vec<(char, usize)> = cleaned
        .iter()
        .enumerate()
        .filter(|(_, t)| is_key(t.character))
        .map(|(i, t)| (t.character, i))
        .collect();
    let key_chars: Vec<char> = keys.iter().map(|(c, _)| *c).collect();

    let mut spans: Vec<Range<usize>> = Vec::with_capacity(parts.len());
    let mut search_from = 0;

    for part in &parts {
        let needle: Vec<char> = part.chars().filter(|c| is_key(*c)).collect();
        if needle.is_empty() {
            continue;
        }

        let Some(pos) = find_from(&key_chars, &needle, search_from) else {
            diagnostics.warn(Diagnostic::NewlineUnmatched {
                part: part.to_string(),
            });
            return vec![strip_whitespace(&cleaned)];
        };

        let end = pos + needle.len();
        spans.push(keys[pos].1..keys[end - 1].1 + 1);
        search_from = end;
    }

    // Cut between consecutive parts at the line break when there is one,
    // otherwise right before the next part.
    let mut cuts = vec![0];
    for pair in spans.windows(2) {
        let gap = pair[0].end..pair[1].start;
        let cut = gap
            .clone()
            .find(|&i| is_line_break(cleaned[i].character))
            .unwrap_or(gap.end);
        cuts.push(cut);
    }
    cuts.push(cleaned.len());

    cuts.windows(2)
        .map(|w| strip_whitespace(&cleaned[w[0]..w[1]]))
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split a whitespace-free paragraph into sentences.
///
/// Splits after `。！？` outside quotations. Inside a quotation, a `、` also
/// splits once the current sentence exceeds `quote_split_length` display
/// characters. Trailing terminal marks and closing brackets stay with the
/// sentence they end.
pub fn split_sentences(units: &[CharacterTiming], quote_split_length: usize) -> Vec<Range<usize>> {
    let mut sentences = Vec::new();
    let mut tracker = QuoteTracker::default();
    let mut start = 0;
    let mut display = 0;
    let mut i = 0;

    while i < units.len() {
        let c = units[i].character;
        let inside = tracker.observe(c);
        display += usize::from(is_display(c));

        let split = (is_terminal(c) && !inside)
            || (inside && c == '、' && display > quote_split_length);

        i += 1;
        if split {
            while let Some(next) = units.get(i)
                && (is_terminal(next.character) || CLOSERS.contains(&next.character))
            {
                tracker.observe(next.character);
                i += 1;
            }
            sentences.push(start..i);
            start = i;
            display = 0;
        }
    }

    if start < units.len() {
        sentences.push(start..units.len());
    }

    sentences
}

/// Paragraphs of `reference` split at line breaks outside quotations.
fn reference_paragraphs(reference: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut tracker = QuoteTracker::default();

    for c in reference.chars() {
        let inside = tracker.observe(c);
        if is_line_break(c) && !inside {
            push_trimmed(&mut parts, &current);
            current.clear();
        } else {
            current.push(c);
        }
    }
    push_trimmed(&mut parts, &current);

    parts
}

fn push_trimmed(parts: &mut Vec<String>, part: &str) {
    let trimmed = part.trim();
    if !trimmed.is_empty() {
        parts.push(trimmed.to_string());
    }
}

fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r')
}

/// Characters used to locate a paragraph in the timing string.
fn is_key(c: char) -> bool {
    !c.is_whitespace() && !is_bracket(c)
}

fn strip_whitespace(timings: &[&CharacterTiming]) -> Vec<CharacterTiming> {
    timings
        .iter()
        .filter(|t| !t.character.is_whitespace())
        .map(|t| (*t).clone())
        .collect()
}

fn find_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed(text: &str) -> Vec<CharacterTiming> {
        text.chars()
            .enumerate()
            .map(|(i, c)| CharacterTiming::new(c, i as f64 * 0.1, (i + 1) as f64 * 0.1, 1.0))
            .collect()
    }

    fn text(units: &[CharacterTiming]) -> String {
        units.iter().map(|t| t.character).collect()
    }

    #[test]
    fn splits_paragraphs_at_line_breaks() {
        let reference = "今日は晴れ。\n明日は雨。";
        let mut diagnostics = Diagnostics::new();

        let paragraphs = split_paragraphs(reference, &timed(reference), &mut diagnostics);

        match &paragraphs[..] {
            [first, second] => {
                assert_eq!(text(first), "今日は晴れ。");
                assert_eq!(text(second), "明日は雨。");
                assert!((second[0].start - 0.7).abs() < 1e-9);
            }
            _ => panic!("expected 2 paragraphs, got {}", paragraphs.len()),
        }
    }

    #[test]
    fn line_break_inside_quotes_is_discarded() {
        let reference = "「一行目\n二行目」と言った。";
        let mut diagnostics = Diagnostics::new();

        let paragraphs = split_paragraphs(reference, &timed(reference), &mut diagnostics);

        match &paragraphs[..] {
            [single] => assert_eq!(text(single), "「一行目二行目」と言った。"),
            _ => panic!("expected 1 paragraph, got {}", paragraphs.len()),
        }
    }

    #[test]
    fn quoted_paragraph_keeps_its_brackets() {
        let reference = "「はい」\nそうです。";
        let mut diagnostics = Diagnostics::new();

        let paragraphs = split_paragraphs(reference, &timed(reference), &mut diagnostics);

        let texts: Vec<String> = paragraphs.iter().map(|p| text(p)).collect();
        assert_eq!(texts, vec!["「はい」", "そうです。"]);
    }

    #[test]
    fn unmatched_paragraph_falls_back_to_whole() {
        let reference = "今日は晴れ。\n明日は雨。";
        let timings = timed("きょうははれ。あしたはあめ。");
        let mut diagnostics = Diagnostics::new();

        let paragraphs = split_paragraphs(reference, &timings, &mut diagnostics);

        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].len(), timings.len());
        assert!(diagnostics.any(|d| matches!(d, Diagnostic::NewlineUnmatched { .. })));
    }

    #[test]
    fn splits_sentences_outside_quotes_only() {
        let units = timed("「晴れ。雨。」と言った。次です！？");

        let sentences: Vec<String> = split_sentences(&units, 30)
            .into_iter()
            .map(|r| text(&units[r]))
            .collect();

        assert_eq!(sentences, vec!["「晴れ。雨。」と言った。", "次です！？"]);
    }

    #[test]
    fn long_quote_splits_at_comma() {
        let quote = format!("「{}、{}」", "あ".repeat(31), "い".repeat(5));
        let units = timed(&quote);

        let sentences = split_sentences(&units, 30);

        match &sentences[..] {
            [first, second] => {
                assert_eq!(first.end, 33);
                assert_eq!(second.end, units.len());
            }
            _ => panic!("expected 2 sentences, got {}", sentences.len()),
        }
    }
}
