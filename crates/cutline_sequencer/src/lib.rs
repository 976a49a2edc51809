// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline core for Cutline.
//!
//! This crate provides the editing model and realtime playback:
//! - Media catalog with import validation
//! - Clips on one video lane and a growable set of audio lanes
//! - Placement, collision, split, trim and ripple operations
//! - Viewport geometry for the render layer
//! - Playback synchronization of one video sink and pooled audio sinks
//!
//! ## Architecture
//!
//! The timeline is a plain owned value mutated through command methods.
//! Undo history, notifications and persistence live in `cutline_app`;
//! the synchronizer talks to decoders through the [`MediaSink`] trait.

pub mod clip;
pub mod media;
pub mod playback;
pub mod timeline;
pub mod track;
pub mod viewport;

pub use clip::{Clip, ClipId, ClipPatch, MIN_CLIP_DURATION};
pub use media::{ImportError, MediaCatalog, MediaId, MediaInfo, MediaItem, MediaKind, MediaProbe};
pub use playback::{
    GainNodeId, MediaSink, MixBus, PlaybackState, PlaybackSynchronizer, SinkFactory, SyncConfig,
    TickReport,
};
pub use timeline::{ClipIssue, Timeline, TimelineConfig, TimelineSnapshot};
pub use track::{Lane, LaneRef, Tracks};
pub use viewport::{ClipGeometry, Viewport};
