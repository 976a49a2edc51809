// SPDX-License-Identifier: MIT OR Apache-2.0
//! Background media analysis for Cutline.
//!
//! This crate fills the visual caches and segments speech:
//! - Waveform peaks decoded once per media item on a worker thread
//! - Thumbnail captures serialized through one shared capture sink
//! - Filmstrip tile planning with a re-render memo
//! - Speech/silence segmentation over decoded audio
//!
//! Analysis never blocks playback: the waveform decoder runs on its own
//! thread and the thumbnail queue stands still while playing.

pub mod audio;
pub mod filmstrip;
pub mod silence;
pub mod thumbnail;
pub mod waveform;

pub use audio::{AudioDecoder, DecodeError, DecodedAudio};
pub use filmstrip::{plan_filmstrip, FilmstripMemo, FilmstripPlan};
pub use silence::{detect_speech, SilenceConfig, SilenceError, SpeechSegment};
pub use thumbnail::{
    CaptureError, CaptureEvent, CaptureSink, CaptureTicket, Positioning, PumpReport, TargetHandle,
    ThumbnailConfig, ThumbnailKey, ThumbnailLookup, ThumbnailPipeline, ThumbnailTask,
};
pub use waveform::{PeakBuffer, WaveformCache, WaveformConfig, WaveformState};
