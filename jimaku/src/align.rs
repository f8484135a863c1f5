//! Align subcommand - resolve character timings for one text.

use color_eyre::Section;
use eyre::{Context, Result, eyre};
use jimaku_align::adapter::AlignmentAdapter;
use jimaku_align::audio::AudioSource;
use jimaku_align::config::AlignConfig;
use jimaku_align::diagnostics::Diagnostics;
use jimaku_align::traits::StaticTranscript;
use jimaku_align::types::{AsrTranscript, AsrWord, CharacterTiming, TimingSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI arguments for character alignment.
#[derive(clap::Args, Debug)]
pub struct Args {
    /// Reference narration text
    pub text: String,

    /// ASR output as JSON: a transcript object or a bare word list
    #[arg(long)]
    pub asr: Option<PathBuf>,

    /// Audio duration in seconds (default: end of the last ASR word)
    #[arg(long)]
    pub duration: Option<f64>,

    #[command(flatten)]
    pub align_config: AlignConfig,
}

/// Resolved configuration for character alignment.
#[derive(Debug)]
pub struct Config {
    pub text: String,
    pub transcript: Option<AsrTranscript>,
    pub audio: AudioSource,
    pub align_config: AlignConfig,
}

impl TryFrom<Args> for Config {
    type Error = eyre::Error;

    fn try_from(args: Args) -> Result<Self> {
        let transcript = args.asr.as_deref().map(read_transcript).transpose()?;

        let last_word_end = transcript
            .as_ref()
            .and_then(|t| t.words.iter().map(|w| w.end).reduce(f64::max));

        let duration = args.duration.or(last_word_end).ok_or_else(|| {
            eyre!("no audio duration known").suggestion("pass `--duration` or `--asr`")
        })?;

        Ok(Self {
            text: args.text,
            transcript,
            audio: AudioSource::from_duration(duration),
            align_config: args.align_config.validate()?,
        })
    }
}

/// Accepted ASR payload shapes.
#[derive(Deserialize)]
#[serde(untagged)]
enum AsrPayload {
    Transcript(AsrTranscript),
    Words(Vec<AsrWord>),
}

fn read_transcript(path: &Path) -> Result<AsrTranscript> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read asr output: {:?}", path.display()))?;

    let payload: AsrPayload = serde_json::from_str(&text)
        .wrap_err_with(|| format!("failed to parse asr output: {:?}", path.display()))?;

    Ok(match payload {
        AsrPayload::Transcript(transcript) => transcript,
        AsrPayload::Words(words) => AsrTranscript::from_words(words),
    })
}

/// Printed result.
#[derive(Serialize)]
struct AlignOutput<'a> {
    source: TimingSource,
    timings: &'a [CharacterTiming],
    diagnostics: &'a Diagnostics,
}

pub fn execute(config: Config) -> Result<()> {
    let mut adapter = AlignmentAdapter::new(config.align_config);
    if let Some(transcript) = config.transcript {
        adapter = adapter.with_recognizer(StaticTranscript::new(transcript));
    }

    let alignment = adapter.align(&config.text, &config.audio)?;

    let output = AlignOutput {
        source: alignment.source,
        timings: &alignment.timings,
        diagnostics: &alignment.diagnostics,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_word_list() {
        let json = r#"[{ "word": "今日", "start": 0.0, "end": 0.4 }, { "word": "わ", "start": 0.4, "end": 0.6 }]"#;

        let payload: AsrPayload = serde_json::from_str(json).unwrap();

        match payload {
            AsrPayload::Words(words) => {
                let transcript = AsrTranscript::from_words(words);
                assert_eq!(transcript.recognized_text, "今日わ");
            }
            AsrPayload::Transcript(_) => panic!("expected a word list"),
        }
    }

    #[test]
    fn requires_some_duration() {
        let args = Args {
            text: "今日は晴れです".to_string(),
            asr: None,
            duration: None,
            align_config: AlignConfig::default(),
        };

        assert!(Config::try_from(args).is_err());
    }
}
