//! Output formats for final cues.
//!
//! Converts cues into SRT subtitles and into the timing JSON document read
//! by the video muxer.

use crate::cue::{CueKind, SubtitleCue};
use serde::Serialize;
use srtlib::{Subtitle, Timestamp};

/// Convert cues to SRT subtitles, one line of text per cue line.
pub fn to_subtitles(cues: &[SubtitleCue]) -> Vec<Subtitle> {
    cues.iter().map(create_subtitle).collect()
}

fn create_subtitle(cue: &SubtitleCue) -> Subtitle {
    Subtitle::new(
        cue.index as usize,
        secs_to_timestamp(cue.start),
        secs_to_timestamp(cue.end),
        cue.text(),
    )
}

/// Convert seconds to an SRT timestamp, rounded to the millisecond.
fn secs_to_timestamp(secs: f64) -> Timestamp {
    Timestamp::from_milliseconds((secs * 1000.0).round().max(0.0) as u32)
}

/// Format subtitles as SRT file content.
pub fn display_subtitles(subtitles: &[Subtitle]) -> String {
    subtitles
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// First and last entries, with an ellipsis in between.
pub fn preview_subtitles(subtitles: &[Subtitle], head_count: usize, tail_count: usize) -> String {
    let total = subtitles.len();

    if total <= head_count + tail_count {
        return display_subtitles(subtitles);
    }

    [
        display_subtitles(&subtitles[..head_count]),
        "...".to_string(),
        display_subtitles(&subtitles[total - tail_count..]),
    ]
    .join("\n\n")
}

/// Timing document for the video muxer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimingDocument {
    pub subject: String,
    pub subtitle_count: usize,
    /// End of the last cue in seconds
    pub total_duration: f64,
    pub subtitles: Vec<TimingEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimingEntry {
    pub index: u32,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub text: String,
    pub lines: Vec<String>,
    pub kind: CueKind,
}

impl TimingDocument {
    pub fn new(subject: impl Into<String>, cues: &[SubtitleCue]) -> Self {
        let subtitles: Vec<TimingEntry> = cues
            .iter()
            .map(|cue| TimingEntry {
                index: cue.index,
                start_time: cue.start,
                end_time: cue.end,
                duration: cue.duration(),
                text: cue.text(),
                lines: cue.lines.clone(),
                kind: cue.kind,
            })
            .collect();

        Self {
            subject: subject.into(),
            subtitle_count: subtitles.len(),
            total_duration: cues.iter().map(|c| c.end).fold(0.0, f64::max),
            subtitles,
        }
    }
}
