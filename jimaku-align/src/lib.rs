//! jimaku-align: character-level timing for narration scripts.
//!
//! This crate resolves, for every character of a reference narration, the
//! time span during which it is spoken. Upstream timing sources are noisy:
//! a speech synthesis provider may return an exact forced alignment, an ASR
//! provider may return misrecognized words, or nothing may be available at
//! all beyond the audio duration.
//!
//! # Architecture
//!
//! - [`adapter::AlignmentAdapter`]: walks the tier chain (forced alignment,
//!   ASR + sequence alignment, uniform distribution) and never fails once the
//!   input is structurally valid
//! - [`dtw::DtwAligner`]: dynamic time warping between the reference and the
//!   recognized text
//! - [`ratio::RatioAligner`]: lower-precision character-count-ratio mapping
//! - [`diagnostics::Diagnostics`]: recoverable conditions collected per run
//!
//! # Quick Start
//!
//! ```ignore
//! use jimaku_align::adapter::AlignmentAdapter;
//! use jimaku_align::audio::AudioSource;
//! use jimaku_align::config::AlignConfig;
//!
//! let adapter = AlignmentAdapter::new(AlignConfig::default());
//! let audio = AudioSource::from_duration(10.0);
//! let alignment = adapter.align("今日は晴れです。", &audio)?;
//! for t in &alignment.timings {
//!     println!("{} {:.2}-{:.2}", t.character, t.start, t.end);
//! }
//! ```

pub mod adapter;
pub mod audio;
pub mod charmap;
pub mod config;
pub mod diagnostics;
pub mod dtw;
pub mod error;
pub mod ratio;
pub mod text;
pub mod traits;
pub mod types;
