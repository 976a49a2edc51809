// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback synchronization.
//!
//! The [`PlaybackSynchronizer`] owns the playback clock and keeps one video
//! sink plus a pool of audio sinks in step with it:
//! - the clock advances by wall-clock delta each tick, adopting the video
//!   sink's position when it is decoding smoothly and close enough
//! - the active clips are re-resolved every tick
//! - sinks are only re-seeked when drift exceeds the tolerance
//! - every sink plays through its own gain node into a shared master bus
//!
//! Only [`PlaybackSynchronizer::tick`] mutates the mix bus and the sinks.

use crate::clip::{Clip, ClipId};
use crate::media::{MediaCatalog, MediaItem, MediaKind};
use crate::timeline::Timeline;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A decoder/output element for one media stream
pub trait MediaSink {
    /// Locator currently loaded
    fn source(&self) -> Option<&str>;
    /// Load a new locator
    fn load(&mut self, locator: &str);
    /// Native position in media seconds
    fn position(&self) -> f64;
    /// Move the native position
    fn seek(&mut self, media_time: f64);
    /// Start or resume output
    fn play(&mut self);
    /// Pause output
    fn pause(&mut self);
    /// Whether output is paused
    fn is_paused(&self) -> bool;
    /// Whether the sink is waiting for data
    fn is_stalled(&self) -> bool;
    /// Whether a seek is still in progress
    fn is_seeking(&self) -> bool;
    /// Output volume after the gain stage (0 to 1)
    fn set_volume(&mut self, volume: f32);
}

/// Creates sinks for the synchronizer
pub trait SinkFactory {
    /// Create a fresh, paused sink
    fn create_sink(&mut self, kind: MediaKind) -> Box<dyn MediaSink>;
}

/// Handle of a gain node on the [`MixBus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GainNodeId(u64);

/// Per-sink gain nodes feeding one master bus
#[derive(Debug, Clone)]
pub struct MixBus {
    nodes: HashMap<GainNodeId, f32>,
    next_id: u64,
    master_gain: f32,
    master_muted: bool,
}

impl MixBus {
    /// Create an empty bus at unity gain
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 0,
            master_gain: 1.0,
            master_muted: false,
        }
    }

    /// Create a gain node connected to the master bus
    pub fn connect(&mut self) -> GainNodeId {
        let id = GainNodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, 1.0);
        id
    }

    /// Disconnect and drop a gain node
    pub fn disconnect(&mut self, node: GainNodeId) -> bool {
        self.nodes.remove(&node).is_some()
    }

    /// Set a node's gain (clamped to 0..=1)
    pub fn set_gain(&mut self, node: GainNodeId, gain: f32) {
        if let Some(value) = self.nodes.get_mut(&node) {
            *value = crate::clip::sanitize_volume(gain);
        }
    }

    /// Set the master gain (clamped to 0..=1)
    pub fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = crate::clip::sanitize_volume(gain);
    }

    /// Mute or unmute the master bus
    pub fn set_master_muted(&mut self, muted: bool) {
        self.master_muted = muted;
    }

    /// Master gain
    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Gain heard at the output for a node; 0 for disconnected nodes
    pub fn output_gain(&self, node: GainNodeId) -> f32 {
        if self.master_muted {
            return 0.0;
        }
        self.nodes.get(&node).map_or(0.0, |gain| gain * self.master_gain)
    }

    /// Number of connected nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for MixBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Synchronizer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Drift a sink may have before it is re-seeked, in seconds
    pub drift_tolerance: f64,
    /// Maximum distance for adopting the video clock, in seconds
    pub adopt_window: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            drift_tolerance: 0.2,
            adopt_window: 0.5,
        }
    }
}

/// Transport state as seen by the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Clock stopped
    Paused,
    /// Clock advancing
    Playing,
    /// An explicit time-set waits for the next tick
    Seeking,
}

/// What happened during a tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Clock after the tick
    pub playback_time: f64,
    /// Whether the video position was adopted as the clock
    pub adopted: bool,
    /// Whether playback stopped at the end of the content
    pub reached_end: bool,
    /// Clip driving the video sink
    pub video_clip: Option<ClipId>,
    /// Audio sinks alive after reconciliation
    pub audio_voices: usize,
    /// Seeks issued to sinks
    pub seeks: usize,
}

struct Voice {
    sink: Box<dyn MediaSink>,
    gain: GainNodeId,
}

impl Voice {
    /// Bring the sink in line with `clip` at timeline time `t`
    fn reconcile(
        &mut self,
        clip: &Clip,
        locator: &str,
        t: f64,
        playing: bool,
        force_seek: bool,
        tolerance: f64,
        bus: &mut MixBus,
    ) -> (bool, bool) {
        let mut loaded = false;
        if self.sink.source() != Some(locator) {
            tracing::debug!(clip = %clip.id, locator, "Loading sink source");
            self.sink.load(locator);
            loaded = true;
        }

        let target = clip.media_time_at(t);
        let drift = (self.sink.position() - target).abs();
        let busy = self.sink.is_stalled() || self.sink.is_seeking();
        let seeked = if loaded || force_seek || (!busy && drift > tolerance) {
            if !loaded && !force_seek {
                tracing::debug!(clip = %clip.id, drift, "Correcting drift");
            }
            self.sink.seek(target);
            true
        } else {
            false
        };

        bus.set_gain(self.gain, clip.effective_gain());
        self.sink.set_volume(bus.output_gain(self.gain));

        if playing && self.sink.is_paused() {
            self.sink.play();
        } else if !playing && !self.sink.is_paused() {
            self.sink.pause();
        }

        (loaded, seeked)
    }
}

/// Drives the playback clock and the output sinks
pub struct PlaybackSynchronizer {
    config: SyncConfig,
    factory: Box<dyn SinkFactory>,
    bus: MixBus,
    video: Voice,
    video_clip: Option<ClipId>,
    audio: HashMap<ClipId, Voice>,
    seek_pending: bool,
    adopt_blocked: bool,
    /// Timeline seek generation already accounted for
    seen_seek: u64,
}

impl PlaybackSynchronizer {
    /// Create a synchronizer with a video sink from `factory`
    pub fn new(config: SyncConfig, mut factory: Box<dyn SinkFactory>) -> Self {
        let mut bus = MixBus::new();
        let video = Voice {
            sink: factory.create_sink(MediaKind::Video),
            gain: bus.connect(),
        };
        Self {
            config,
            factory,
            bus,
            video,
            video_clip: None,
            audio: HashMap::new(),
            seek_pending: true,
            adopt_blocked: true,
            seen_seek: 0,
        }
    }

    /// Current transport state
    pub fn state(&self, timeline: &Timeline) -> PlaybackState {
        if self.seek_pending || timeline.seek_generation() != self.seen_seek {
            PlaybackState::Seeking
        } else if timeline.is_playing() {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        }
    }

    /// Start playback, rewinding first if the playhead sits at the end
    pub fn play(&mut self, timeline: &mut Timeline) {
        let end = timeline.duration();
        if end > 0.0 && timeline.playback_time() >= end {
            self.seek(timeline, 0.0);
        }
        timeline.set_playing(true);
    }

    /// Pause playback
    pub fn pause(&mut self, timeline: &mut Timeline) {
        timeline.set_playing(false);
    }

    /// Toggle play/pause
    pub fn toggle(&mut self, timeline: &mut Timeline) {
        if timeline.is_playing() {
            self.pause(timeline);
        } else {
            self.play(timeline);
        }
    }

    /// Explicit time-set; sinks are re-seeked on the next tick
    pub fn seek(&mut self, timeline: &mut Timeline, t: f64) {
        timeline.set_playback_time(t);
        self.seek_pending = true;
        self.adopt_blocked = true;
    }

    /// Shared mix bus
    pub fn mix_bus(&self) -> &MixBus {
        &self.bus
    }

    /// Set the master output gain
    pub fn set_master_gain(&mut self, gain: f32) {
        self.bus.set_master_gain(gain);
    }

    /// Number of live audio sinks
    pub fn audio_voice_count(&self) -> usize {
        self.audio.len()
    }

    /// Advance the clock by `delta` seconds and reconcile all sinks
    pub fn tick(&mut self, timeline: &mut Timeline, catalog: &MediaCatalog, delta: f64) -> TickReport {
        let mut report = TickReport::default();
        let playing = timeline.is_playing();

        // Time-sets from commands or undo are seeks too
        if timeline.seek_generation() != self.seen_seek {
            self.seen_seek = timeline.seek_generation();
            self.seek_pending = true;
            self.adopt_blocked = true;
        }

        if playing {
            let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
            let advanced = timeline.playback_time() + delta;
            let mut next = advanced;

            if !self.adopt_blocked {
                if let Some(candidate) = self.video_clock(timeline) {
                    if (candidate - advanced).abs() <= self.config.adopt_window {
                        next = candidate.max(0.0);
                        report.adopted = true;
                    }
                }
            }

            let end = timeline.duration();
            if next >= end {
                next = end;
                timeline.set_playing(false);
                report.reached_end = true;
                tracing::debug!(end, "Playback reached end of content");
            }
            timeline.advance_clock(next);
        }
        self.adopt_blocked = false;

        let t = timeline.playback_time();
        let playing = timeline.is_playing();
        let force_seek = self.seek_pending;

        // Video
        // Latest start wins among clips whose media is still present
        let active_video = timeline
            .tracks()
            .video
            .clips_at(t)
            .filter_map(|clip| catalog.get(clip.media_id).map(|media| (clip, media)))
            .fold(None, |best: Option<(&Clip, &MediaItem)>, (clip, media)| match best {
                Some((b, _)) if b.start_time > clip.start_time => best,
                _ => Some((clip, media)),
            });
        match active_video {
            Some((clip, media)) => {
                let clip_changed = self.video_clip != Some(clip.id);
                let (loaded, seeked) = self.video.reconcile(
                    clip,
                    &media.source_handle,
                    t,
                    playing,
                    force_seek || clip_changed,
                    self.config.drift_tolerance,
                    &mut self.bus,
                );
                if loaded || clip_changed {
                    self.adopt_blocked = true;
                }
                report.seeks += usize::from(seeked);
                self.video_clip = Some(clip.id);
            }
            None => {
                if !self.video.sink.is_paused() {
                    self.video.sink.pause();
                }
                self.video_clip = None;
            }
        }
        report.video_clip = self.video_clip;

        // Audio pool
        let active_audio: Vec<(&Clip, &str)> = timeline
            .active_audio_clips(t)
            .into_iter()
            .filter_map(|(_, clip)| {
                catalog
                    .get(clip.media_id)
                    .map(|media| (clip, media.source_handle.as_str()))
            })
            .collect();

        for (clip, locator) in &active_audio {
            let voice = self.audio.entry(clip.id).or_insert_with(|| {
                tracing::debug!(clip = %clip.id, "Creating audio voice");
                Voice {
                    sink: self.factory.create_sink(MediaKind::Audio),
                    gain: self.bus.connect(),
                }
            });
            let (_, seeked) = voice.reconcile(
                clip,
                locator,
                t,
                playing,
                force_seek,
                self.config.drift_tolerance,
                &mut self.bus,
            );
            report.seeks += usize::from(seeked);
        }

        let bus = &mut self.bus;
        self.audio.retain(|clip_id, voice| {
            let keep = active_audio.iter().any(|(clip, _)| clip.id == *clip_id);
            if !keep {
                tracing::debug!(clip = %clip_id, "Tearing down audio voice");
                voice.sink.pause();
                bus.disconnect(voice.gain);
            }
            keep
        });

        self.seek_pending = false;
        report.playback_time = t;
        report.audio_voices = self.audio.len();
        report
    }

    /// Pause and disconnect every sink
    pub fn stop_all(&mut self) {
        self.video.sink.pause();
        self.video_clip = None;
        for (_, mut voice) in self.audio.drain() {
            voice.sink.pause();
            self.bus.disconnect(voice.gain);
        }
    }

    /// Timeline time reported by a smoothly decoding video sink
    fn video_clock(&self, timeline: &Timeline) -> Option<f64> {
        let clip = timeline.clip(self.video_clip?)?;
        let sink = &self.video.sink;
        if sink.is_paused() || sink.is_stalled() || sink.is_seeking() {
            return None;
        }
        Some(clip.timeline_time_of(sink.position()))
    }
}
