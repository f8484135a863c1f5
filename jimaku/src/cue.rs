//! Cue types produced by the segmenter and the timing normalizer.

use serde::Serialize;

/// Kind of subtitle cue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    #[default]
    Normal,
    /// Title card at the start of a script section
    SectionTitle,
}

/// A cue straight out of the segmenter.
///
/// `start`/`end` are the times of its first and last display character.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RawCue {
    /// At most `max_lines` display lines
    pub lines: Vec<String>,
    pub start: f64,
    pub end: f64,
    pub kind: CueKind,
    /// Source text ends with a terminal mark, even if hidden from display
    pub ends_sentence: bool,
    /// Last line exceeds the per-line limit
    pub overflow: bool,
}

impl RawCue {
    pub fn new(lines: Vec<String>, start: f64, end: f64) -> Self {
        Self {
            lines,
            start,
            end,
            kind: CueKind::Normal,
            ends_sentence: false,
            overflow: false,
        }
    }

    /// Single-line title cue.
    pub fn title(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            kind: CueKind::SectionTitle,
            ..Self::new(vec![text.into()], start, end)
        }
    }

    /// All lines blank.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// A final, numbered cue.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubtitleCue {
    /// 1-based, contiguous
    pub index: u32,
    pub start: f64,
    pub end: f64,
    pub lines: Vec<String>,
    pub kind: CueKind,
    /// End before normalization
    pub source_end: f64,
    pub ends_sentence: bool,
    pub overflow: bool,
}

impl SubtitleCue {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// The raw cue this one was normalized from.
    pub fn to_raw(&self) -> RawCue {
        RawCue {
            lines: self.lines.clone(),
            start: self.start,
            end: self.source_end,
            kind: self.kind,
            ends_sentence: self.ends_sentence,
            overflow: self.overflow,
        }
    }
}
