//! Cap subcommand - generate subtitles from a narration script.
//!
//! A script is a JSON document with one entry per narration section:
//!
//! ```json
//! {
//!   "subject": "天気",
//!   "sections": [
//!     {
//!       "id": "intro",
//!       "text": "今日は晴れです。",
//!       "offset": 0.0,
//!       "narrationStart": 3.0,
//!       "title": { "text": "第一章", "start": 0.0, "end": 3.0 },
//!       "audio": "intro.wav"
//!     }
//!   ]
//! }
//! ```
//!
//! Each section carries one timing input: `alignment` (character timings),
//! `asr` (recognized words), `audio` (WAV path, relative to the script) or
//! `duration` (seconds).

use crate::cli::EngineArgs;
use crate::config::EngineConfig;
use crate::engine::{Engine, NarrationSegment, TimingInput, TitleTiming};
use crate::srt::{self, TimingDocument};
use color_eyre::Section;
use eyre::{Context, Result, eyre};
use jimaku_align::audio::AudioSource;
use jimaku_align::types::{AsrTranscript, CharacterTiming};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// CLI arguments for subtitle generation.
#[derive(clap::Args, Debug)]
pub struct Args {
    /// Path to the narration script (JSON)
    pub script: PathBuf,

    /// Output SRT path (default: same as script with .srt extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the timing document for the video muxer
    #[arg(long)]
    pub timing_json: Option<PathBuf>,

    /// Write alignment paths, split candidates and warnings as JSON
    #[arg(long)]
    pub debug_dump: Option<PathBuf>,

    /// Print the first and last subtitles
    #[arg(long)]
    pub preview: bool,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Resolved configuration for subtitle generation.
#[derive(Debug)]
pub struct Config {
    pub script: PathBuf,
    pub output: PathBuf,
    pub timing_json: Option<PathBuf>,
    pub debug_dump: Option<PathBuf>,
    pub preview: bool,
    pub engine: EngineConfig,
}

impl TryFrom<Args> for Config {
    type Error = eyre::Error;

    fn try_from(args: Args) -> Result<Self> {
        let output = args
            .output
            .unwrap_or_else(|| args.script.with_extension("srt"));

        Ok(Self {
            script: args.script,
            output,
            timing_json: args.timing_json,
            debug_dump: args.debug_dump,
            preview: args.preview,
            engine: args.engine.try_into()?,
        })
    }
}

/// Narration script file.
#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub subject: String,
    pub sections: Vec<ScriptSection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptSection {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub narration_start: f64,
    pub title: Option<ScriptTitle>,
    pub alignment: Option<Vec<CharacterTiming>>,
    pub asr: Option<AsrTranscript>,
    pub audio: Option<PathBuf>,
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ScriptTitle {
    pub text: String,
    #[serde(default)]
    pub start: f64,
    pub end: f64,
}

impl Script {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read script: {:?}", path.display()))?;
        serde_json::from_str(&text)
            .wrap_err_with(|| format!("failed to parse script: {:?}", path.display()))
    }

    /// Engine segments, with audio paths resolved against `base_dir`.
    pub fn segments(self, base_dir: &Path) -> Result<Vec<NarrationSegment>> {
        self.sections
            .into_iter()
            .enumerate()
            .map(|(i, section)| section.into_segment(i, base_dir))
            .collect()
    }
}

impl ScriptSection {
    fn into_segment(self, position: usize, base_dir: &Path) -> Result<NarrationSegment> {
        let id = self.id.unwrap_or_else(|| format!("section-{}", position + 1));

        let input = if let Some(timings) = self.alignment {
            TimingInput::Characters(timings)
        } else if let Some(transcript) = self.asr {
            TimingInput::Asr(transcript)
        } else if let Some(path) = self.audio {
            let path = base_dir.join(path);
            let audio = AudioSource::from_wav(&path)
                .wrap_err_with(|| format!("failed to read audio: {:?}", path.display()))?;
            TimingInput::Audio(audio)
        } else if let Some(duration) = self.duration {
            TimingInput::Audio(AudioSource::from_duration(duration))
        } else {
            return Err(eyre!("section {id} has no timing input")
                .suggestion("add one of `alignment`, `asr`, `audio` or `duration`"));
        };

        Ok(NarrationSegment {
            offset: self.offset,
            narration_start: self.narration_start,
            title: self.title.map(|t| TitleTiming {
                text: t.text,
                start: t.start,
                end: t.end,
            }),
            ..NarrationSegment::new(id, self.text, input)
        })
    }
}

pub fn execute(config: Config) -> Result<()> {
    tracing::info!(
        script = ?config.script.display(),
        output = ?config.output.display(),
        "generating subtitles"
    );

    let script = Script::from_file(&config.script)?;
    let subject = script.subject.clone();
    let base_dir = config.script.parent().unwrap_or(Path::new("."));
    let segments = script.segments(base_dir)?;

    let s = Instant::now();

    let engine = Engine::new(config.engine)?;
    let output = engine
        .process(&segments)
        .wrap_err("subtitle generation failed")
        .with_suggestion(|| "check the section named above against its timing input")?;

    let d = s.elapsed();
    tracing::info!(
        duration = %format_secs(d.as_secs_f32()),
        cues = output.cues.len(),
        "engine completed"
    );

    let subtitles = srt::to_subtitles(&output.cues);

    tracing::info!(path = ?config.output.display(), "write srt file");

    std::fs::write(&config.output, srt::display_subtitles(&subtitles) + "\n")
        .wrap_err_with(|| format!("failed to write srt: {:?}", config.output.display()))?;

    if let Some(path) = &config.timing_json {
        let document = TimingDocument::new(subject, &output.cues);
        write_json(path, &document)?;
    }

    if let Some(path) = &config.debug_dump {
        write_json(path, &output)?;
    }

    if config.preview {
        print!("{}", srt::preview_subtitles(&subtitles, 3, 3));
    }

    Ok(())
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    tracing::info!(path = ?path.display(), "write json file");

    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)
        .wrap_err_with(|| format!("failed to write json: {:?}", path.display()))
}

/// Format seconds as a string with two decimal places.
fn format_secs(secs: f32) -> String {
    format!("{:.2}s", secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_script_sections() {
        let json = r#"{
            "subject": "天気",
            "sections": [
                { "id": "a", "text": "晴れ。", "duration": 2.0, "title": { "text": "一", "end": 1.5 } },
                { "text": "雨。", "offset": 4.0, "asr": { "words": [{ "word": "雨", "start": 0.0, "end": 0.5 }] } }
            ]
        }"#;

        let script: Script = serde_json::from_str(json).unwrap();
        let segments = script.segments(Path::new(".")).unwrap();

        match &segments[..] {
            [first, second] => {
                assert_eq!(first.id, "a");
                assert_eq!(first.input, TimingInput::Audio(AudioSource::from_duration(2.0)));
                assert!(first.title.as_ref().is_some_and(|t| (t.end - 1.5).abs() < 1e-9));
                assert_eq!(second.id, "section-2");
                assert!((second.offset - 4.0).abs() < 1e-9);
                assert!(matches!(&second.input, TimingInput::Asr(t) if t.words.len() == 1));
            }
            _ => panic!("expected 2 segments, got {}", segments.len()),
        }
    }

    #[test]
    fn section_without_input_is_an_error() {
        let json = r#"{ "sections": [{ "id": "empty", "text": "何も。" }] }"#;

        let script: Script = serde_json::from_str(json).unwrap();
        let err = script.segments(Path::new(".")).unwrap_err();

        assert!(err.to_string().contains("empty"));
    }
}
