//! CLI argument definitions using clap.

use crate::timing::OverlapPriority;
use clap::{Parser, Subcommand};
use eyre::Result;
use jimaku_align::config::Strategy;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "jimaku")]
#[command(about = "Subtitle timing and segmentation for Japanese narration")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate SRT subtitles from a narration script
    Cap(crate::cap::Args),

    /// Resolve character timings for one text and print them as JSON
    Align(crate::align::Args),
}

/// Engine overrides shared by subcommands.
///
/// Flags left unset keep the value from `--config`, or the built-in default.
#[derive(clap::Args, Debug, Default)]
pub struct EngineArgs {
    /// JSON file with layout, timing and alignment settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum lines per cue
    #[arg(long)]
    pub max_lines: Option<usize>,

    /// Maximum display characters per line
    #[arg(long)]
    pub max_chars_per_line: Option<usize>,

    /// Minimum display duration in seconds
    #[arg(long)]
    pub min_duration: Option<f64>,

    /// Maximum display duration in seconds
    #[arg(long)]
    pub max_duration: Option<f64>,

    /// Video frame rate for the minimum gap between cues
    #[arg(long)]
    pub frame_rate: Option<f64>,

    /// Keep sentence punctuation in displayed lines
    #[arg(long)]
    pub keep_punctuation: bool,

    /// Let cues overlap the next one
    #[arg(long)]
    pub allow_overlap: bool,

    /// Constraint that wins when a short cue meets the next one
    #[arg(long, value_enum)]
    pub overlap_priority: Option<OverlapPriority>,

    /// Tighten gaps of 0.5-1.5s between cues to 0.3s
    #[arg(long)]
    pub tighten_gaps: bool,

    /// Strategy for mapping ASR words onto the script
    #[arg(long, value_enum)]
    pub align_strategy: Option<Strategy>,
}

/// Execute CLI command - separated for testing.
pub fn run_cli(cli: Cli) -> Result<()> {
    tracing::debug!(?cli, "parsed arguments");

    match cli.command {
        Commands::Cap(args) => crate::cap::execute(args.try_into()?),
        Commands::Align(args) => crate::align::execute(args.try_into()?),
    }
}
