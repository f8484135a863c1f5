//! jimaku: subtitle timing and segmentation for Japanese narration.
//!
//! Turns a reference narration and a noisy timing source into display-ready
//! subtitle cues with exact start and end times.
//!
//! # Architecture
//!
//! - [`jimaku_align`]: per-character timings from forced alignment, ASR
//!   words or the audio duration
//! - [`segment::Segmenter`]: splits timed text into cues of at most
//!   `max_lines` lines, scoring split points with Japanese tie-breaks
//! - [`timing::TimingNormalizer`]: duration clamps, sentence-end extension,
//!   minimum gaps and numbering
//! - [`engine::Engine`]: runs the stages over every narration segment
//!
//! # Quick Start
//!
//! ```ignore
//! use jimaku::config::EngineConfig;
//! use jimaku::engine::{Engine, NarrationSegment, TimingInput};
//! use jimaku_align::audio::AudioSource;
//!
//! let engine = Engine::new(EngineConfig::default())?;
//! let segment = NarrationSegment::new(
//!     "intro",
//!     "今日は晴れです。明日は雨です。",
//!     TimingInput::Audio(AudioSource::from_duration(4.0)),
//! );
//! let output = engine.process(&[segment])?;
//! for cue in &output.cues {
//!     println!("{} {:.2}-{:.2} {}", cue.index, cue.start, cue.end, cue.text());
//! }
//! ```

pub mod align;
pub mod cap;
pub mod cli;
pub mod config;
pub mod cue;
pub mod engine;
pub mod error;
pub mod segment;
pub mod srt;
pub mod timing;
