// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline model: clip placement, collision policy and edit operations.
//!
//! Every mutating method here is a command. Callers that keep undo history
//! must take a snapshot before invoking one; the editor state in
//! `cutline_app` does this for every command it exposes.
//!
//! Failure policy: commands addressing an unknown clip are no-ops and report
//! that nothing changed. Numeric input is clamped, never rejected.

use crate::clip::{sanitize_time, Clip, ClipId, ClipPatch, MIN_CLIP_DURATION};
use crate::media::{MediaCatalog, MediaItem, MediaKind};
use crate::track::{Lane, LaneRef, Tracks};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Timeline tuning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Audio lanes a fresh timeline starts with
    pub audio_lanes: usize,
    /// Minimum distance from either clip edge for a split, in seconds
    pub split_epsilon: f64,
    /// Initial zoom in pixels per second
    pub default_zoom: f64,
    /// Lowest zoom
    pub min_zoom: f64,
    /// Highest zoom
    pub max_zoom: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            audio_lanes: 2,
            split_epsilon: 0.05,
            default_zoom: 100.0,
            min_zoom: 20.0,
            max_zoom: 500.0,
        }
    }
}

/// The persisted/undoable part of the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSnapshot {
    /// Lanes and clips
    pub tracks: Tracks,
    /// Currently selected clip
    pub selected_clip_id: Option<ClipId>,
    /// Playhead position in seconds
    pub playback_time: f64,
    /// Zoom in pixels per second
    pub zoom: f64,
}

impl TimelineSnapshot {
    /// Serialize to the persisted JSON schema
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse the persisted JSON schema
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Problems reported by [`Timeline::validate`]
#[derive(Debug, Clone, PartialEq)]
pub enum ClipIssue {
    /// The clip references media that is not in the catalog
    MissingMedia(ClipId),
    /// `offset + duration` runs past the end of the media
    ExceedsMedia {
        /// Offending clip
        clip_id: ClipId,
        /// Seconds past the end of the media
        overflow: f64,
    },
    /// Two clips overlap in one audio lane
    Overlap {
        /// Audio lane index
        lane: usize,
        /// First clip
        first: ClipId,
        /// Second clip
        second: ClipId,
    },
}

/// In-progress pointer drag
#[derive(Debug, Clone, Copy)]
struct DragState {
    clip_id: ClipId,
    origin_start: f64,
}

/// Timeline state and edit operations
#[derive(Debug, Clone)]
pub struct Timeline {
    tracks: Tracks,
    selected_clip_id: Option<ClipId>,
    playback_time: f64,
    zoom: f64,
    is_playing: bool,
    config: TimelineConfig,
    drag: Option<DragState>,
    /// Bumped by every explicit time-set
    seek_generation: u64,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new(config: TimelineConfig) -> Self {
        Self {
            tracks: Tracks::new(config.audio_lanes),
            selected_clip_id: None,
            playback_time: 0.0,
            zoom: config.default_zoom,
            is_playing: false,
            config,
            drag: None,
            seek_generation: 0,
        }
    }

    /// Build a timeline from a loaded snapshot, clamping anything out of range
    pub fn from_snapshot(snapshot: TimelineSnapshot, config: TimelineConfig) -> Self {
        let mut timeline = Self::new(config);
        timeline.restore(snapshot);

        while timeline.tracks.audio.len() < timeline.config.audio_lanes {
            timeline.tracks.push_audio_lane();
        }
        timeline.sanitize_clips();
        timeline.playback_time = sanitize_time(timeline.playback_time);
        timeline.zoom = timeline.clamp_zoom(timeline.zoom);
        if let Some(selected) = timeline.selected_clip_id {
            if timeline.tracks.find(selected).is_none() {
                timeline.selected_clip_id = None;
            }
        }
        timeline
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Lanes and clips
    pub fn tracks(&self) -> &Tracks {
        &self.tracks
    }

    /// Get a clip by ID
    pub fn clip(&self, clip_id: ClipId) -> Option<&Clip> {
        self.tracks.find(clip_id).map(|(_, clip)| clip)
    }

    /// Lane holding a clip
    pub fn lane_of(&self, clip_id: ClipId) -> Option<LaneRef> {
        self.tracks.lane_of(clip_id)
    }

    /// Selected clip
    pub fn selected_clip_id(&self) -> Option<ClipId> {
        self.selected_clip_id
    }

    /// Playhead position in seconds
    pub fn playback_time(&self) -> f64 {
        self.playback_time
    }

    /// Zoom in pixels per second
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Whether the transport is playing
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Configuration in effect
    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// End of the last clip
    pub fn duration(&self) -> f64 {
        self.tracks.content_end()
    }

    /// Whether a drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Video clip shown at `t`. Overlapping clips resolve to the latest start.
    pub fn active_video_clip(&self, t: f64) -> Option<&Clip> {
        self.tracks
            .video
            .clips_at(t)
            .fold(None, |best: Option<&Clip>, clip| match best {
                Some(b) if b.start_time > clip.start_time => Some(b),
                _ => Some(clip),
            })
    }

    /// All audio clips audible at `t`, with their lane index
    pub fn active_audio_clips(&self, t: f64) -> Vec<(usize, &Clip)> {
        self.tracks
            .audio
            .iter()
            .enumerate()
            .flat_map(|(index, lane)| lane.clips_at(t).map(move |clip| (index, clip)))
            .collect()
    }

    /// Capture the undoable state
    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            tracks: self.tracks.clone(),
            selected_clip_id: self.selected_clip_id,
            playback_time: self.playback_time,
            zoom: self.zoom,
        }
    }

    /// Restore a snapshot exactly. Cancels any drag and counts as a seek;
    /// leaves the transport alone.
    pub fn restore(&mut self, snapshot: TimelineSnapshot) {
        self.tracks = snapshot.tracks;
        self.selected_clip_id = snapshot.selected_clip_id;
        self.playback_time = snapshot.playback_time;
        self.zoom = snapshot.zoom;
        self.drag = None;
        self.seek_generation += 1;
    }

    /// Check clip references and lane invariants
    pub fn validate(&self, catalog: &MediaCatalog) -> Vec<ClipIssue> {
        let mut issues = Vec::new();

        for clip in self.tracks.all_clips() {
            match catalog.duration_of(clip.media_id) {
                None => issues.push(ClipIssue::MissingMedia(clip.id)),
                Some(media_duration) => {
                    let overflow = clip.offset + clip.duration - media_duration;
                    if overflow > 1e-6 {
                        issues.push(ClipIssue::ExceedsMedia {
                            clip_id: clip.id,
                            overflow,
                        });
                    }
                }
            }
        }

        for (lane, audio) in self.tracks.audio.iter().enumerate() {
            for (first, second) in audio.overlapping_pairs() {
                issues.push(ClipIssue::Overlap {
                    lane,
                    first,
                    second,
                });
            }
        }

        issues
    }

    // ---------------------------------------------------------------------
    // Clip commands
    // ---------------------------------------------------------------------

    /// Place a clip for `media` at `start_time`
    pub fn add_clip(&mut self, media: &MediaItem, start_time: f64) -> ClipId {
        let clip = Clip::new(media, start_time);
        let id = clip.id;
        let lane = match media.kind {
            MediaKind::Video => LaneRef::Video,
            MediaKind::Audio => {
                LaneRef::Audio(self.place_audio(clip.start_time, clip.end_time(), None))
            }
        };
        tracing::debug!(clip = %id, lane = %lane.name(), start = clip.start_time, "Added clip");
        self.insert_into(lane, clip);
        id
    }

    /// Place a clip for `media` right after the last clip of its target lane
    pub fn add_clip_auto_placed(&mut self, media: &MediaItem) -> ClipId {
        let lane = match media.kind {
            MediaKind::Video => LaneRef::Video,
            MediaKind::Audio => LaneRef::Audio(0),
        };
        let start = self.tracks.lane(lane).map_or(0.0, |l| l.end_time());
        let clip = Clip::new(media, start);
        let id = clip.id;
        tracing::debug!(clip = %id, lane = %lane.name(), start, "Appended clip");
        self.insert_into(lane, clip);
        id
    }

    /// Move a clip and commit the move, resolving audio lane collisions
    pub fn move_clip(&mut self, clip_id: ClipId, new_start_time: f64) -> bool {
        let Some(lane) = self.tracks.lane_of(clip_id) else {
            return false;
        };
        let new_start = sanitize_time(new_start_time);
        let moved = self.set_start(lane, clip_id, new_start);
        let relocated = self.resolve_collision(clip_id);
        moved || relocated
    }

    /// Move an audio clip to another audio lane. Rejected if it would collide.
    pub fn move_clip_to_lane(&mut self, clip_id: ClipId, lane_index: usize) -> bool {
        let Some(LaneRef::Audio(current)) = self.tracks.lane_of(clip_id) else {
            return false;
        };
        let target = lane_index.min(self.tracks.audio.len().saturating_sub(1));
        if target == current {
            return false;
        }
        let Some((start, end)) = self.clip(clip_id).map(|c| (c.start_time, c.end_time())) else {
            return false;
        };
        if self.tracks.audio[target].collides(start, end, Some(clip_id)) {
            tracing::debug!(clip = %clip_id, target, "Lane move rejected: collision");
            return false;
        }
        let Some(clip) = self.tracks.audio[current].remove(clip_id) else {
            return false;
        };
        self.tracks.audio[target].insert(clip);
        true
    }

    /// Split a clip at timeline time `at`, returning the new right-hand clip
    pub fn split_clip(&mut self, clip_id: ClipId, at: f64) -> Option<ClipId> {
        let lane = self.tracks.lane_of(clip_id)?;
        let epsilon = self.config.split_epsilon;
        let lane_clips = self.tracks.lane_mut(lane)?;
        let clip = lane_clips.get_mut(clip_id)?;

        let delta = at - clip.start_time;
        if !(delta > epsilon && delta < clip.duration - epsilon) {
            tracing::debug!(clip = %clip_id, at, "Split rejected: outside clip");
            return None;
        }

        let mut right = clip.clone();
        right.id = ClipId::new();
        right.start_time = at;
        right.duration = clip.duration - delta;
        right.offset = clip.offset + delta;
        clip.duration = delta;

        let right_id = right.id;
        lane_clips.insert(right);
        tracing::debug!(clip = %clip_id, right = %right_id, at, "Split clip");
        Some(right_id)
    }

    /// Delete a clip, clearing the selection if it pointed at it
    pub fn delete_clip(&mut self, clip_id: ClipId) -> Option<Clip> {
        let lane = self.tracks.lane_of(clip_id)?;
        let removed = self.tracks.lane_mut(lane)?.remove(clip_id)?;
        if self.selected_clip_id == Some(clip_id) {
            self.selected_clip_id = None;
        }
        if self.drag.is_some_and(|d| d.clip_id == clip_id) {
            self.drag = None;
        }
        tracing::debug!(clip = %clip_id, "Deleted clip");
        Some(removed)
    }

    /// Change mute/volume/stabilization
    pub fn set_clip_attribute(&mut self, clip_id: ClipId, patch: &ClipPatch) -> bool {
        let Some(lane) = self.tracks.lane_of(clip_id) else {
            return false;
        };
        self.tracks
            .lane_mut(lane)
            .and_then(|l| l.get_mut(clip_id))
            .is_some_and(|clip| clip.apply_patch(patch))
    }

    /// Change a clip's in-point and length, clamped to the media duration
    pub fn trim_clip(
        &mut self,
        clip_id: ClipId,
        offset: f64,
        duration: f64,
        catalog: &MediaCatalog,
    ) -> bool {
        let Some(lane) = self.tracks.lane_of(clip_id) else {
            return false;
        };
        let Some(clip) = self.clip(clip_id) else {
            return false;
        };
        let media_duration = catalog.duration_of(clip.media_id).unwrap_or(f64::INFINITY);

        let offset = sanitize_time(offset).min((media_duration - MIN_CLIP_DURATION).max(0.0));
        let duration = if duration.is_finite() {
            duration
                .max(MIN_CLIP_DURATION)
                .min((media_duration - offset).max(MIN_CLIP_DURATION))
        } else {
            clip.duration
        };

        if let LaneRef::Audio(index) = lane {
            let end = clip.start_time + duration;
            if self.tracks.audio[index].collides(clip.start_time, end, Some(clip_id)) {
                tracing::debug!(clip = %clip_id, "Trim rejected: collision");
                return false;
            }
        }

        let Some(clip) = self.tracks.lane_mut(lane).and_then(|l| l.get_mut(clip_id)) else {
            return false;
        };
        let changed = clip.offset != offset || clip.duration != duration;
        clip.offset = offset;
        clip.duration = duration;
        changed
    }

    /// Replace a clip by the given media-time ranges laid out back to back
    /// from its start, shifting later clips in the lane left by the removed
    /// time. Returns `None` and leaves the timeline untouched when no range
    /// survives clamping to the clip.
    pub fn ripple_replace(&mut self, clip_id: ClipId, ranges: &[Range<f64>]) -> Option<Vec<ClipId>> {
        let lane = self.tracks.lane_of(clip_id)?;
        let source = self.clip(clip_id)?.clone();
        let media_start = source.offset;
        let media_end = source.offset + source.duration;

        let mut cursor = source.start_time;
        let mut pieces = Vec::new();
        for range in ranges {
            let start = range.start.max(media_start);
            let end = range.end.min(media_end);
            if end - start < MIN_CLIP_DURATION {
                continue;
            }
            let mut piece = source.clone();
            piece.id = ClipId::new();
            piece.start_time = cursor;
            piece.offset = start;
            piece.duration = end - start;
            cursor += piece.duration;
            pieces.push(piece);
        }

        if pieces.is_empty() {
            return None;
        }

        let removed = source.end_time() - cursor;
        let lane_clips = self.tracks.lane_mut(lane)?;
        lane_clips.remove(clip_id);
        for clip in lane_clips.clips_mut().iter_mut() {
            if clip.start_time >= source.end_time() - 1e-9 {
                clip.start_time = sanitize_time(clip.start_time - removed);
            }
        }
        let ids: Vec<ClipId> = pieces.iter().map(|c| c.id).collect();
        for piece in pieces {
            lane_clips.insert(piece);
        }

        if self.selected_clip_id == Some(clip_id) {
            self.selected_clip_id = None;
        }
        tracing::info!(clip = %clip_id, pieces = ids.len(), removed, "Ripple replaced clip");
        Some(ids)
    }

    // ---------------------------------------------------------------------
    // Drag protocol
    // ---------------------------------------------------------------------

    /// Start dragging a clip
    pub fn begin_drag(&mut self, clip_id: ClipId) -> bool {
        let Some(clip) = self.clip(clip_id) else {
            return false;
        };
        self.drag = Some(DragState {
            clip_id,
            origin_start: clip.start_time,
        });
        true
    }

    /// Move the dragged clip without committing; overlaps are tolerated
    pub fn drag_to(&mut self, clip_id: ClipId, new_start_time: f64) -> bool {
        let Some(drag) = self.drag.filter(|d| d.clip_id == clip_id) else {
            return false;
        };
        let Some(lane) = self.tracks.lane_of(drag.clip_id) else {
            self.drag = None;
            return false;
        };
        self.set_start(lane, drag.clip_id, sanitize_time(new_start_time))
    }

    /// Commit the drag, resolving any collision it left behind
    pub fn end_drag(&mut self, clip_id: ClipId) -> bool {
        if !self.drag.is_some_and(|d| d.clip_id == clip_id) {
            return false;
        }
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let relocated = self.resolve_collision(drag.clip_id);
        let moved = self
            .clip(drag.clip_id)
            .is_some_and(|c| c.start_time != drag.origin_start);
        moved || relocated
    }

    /// Abort the drag and put the clip back
    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            if let Some(lane) = self.tracks.lane_of(drag.clip_id) {
                self.set_start(lane, drag.clip_id, drag.origin_start);
            }
        }
    }

    // ---------------------------------------------------------------------
    // View/transport state (not undoable)
    // ---------------------------------------------------------------------

    /// Select a clip (or clear with `None`). Unknown ids clear nothing.
    pub fn select(&mut self, clip_id: Option<ClipId>) -> bool {
        if let Some(id) = clip_id {
            if self.tracks.find(id).is_none() {
                return false;
            }
        }
        let changed = self.selected_clip_id != clip_id;
        self.selected_clip_id = clip_id;
        changed
    }

    /// Set the zoom, clamped to the configured range
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let zoom = self.clamp_zoom(zoom);
        let changed = self.zoom != zoom;
        self.zoom = zoom;
        changed
    }

    /// Move the playhead. Counts as an explicit seek for playback.
    pub fn set_playback_time(&mut self, t: f64) {
        self.playback_time = sanitize_time(t);
        self.seek_generation += 1;
    }

    /// Changes whenever the playhead is set other than by the playback clock
    pub fn seek_generation(&self) -> u64 {
        self.seek_generation
    }

    /// Advance the playback clock without registering a seek
    pub(crate) fn advance_clock(&mut self, t: f64) {
        self.playback_time = sanitize_time(t);
    }

    /// Set the transport state
    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            zoom.clamp(self.config.min_zoom, self.config.max_zoom)
        } else {
            self.config.default_zoom
        }
    }

    fn insert_into(&mut self, lane: LaneRef, clip: Clip) {
        if let Some(lane) = self.tracks.lane_mut(lane) {
            lane.insert(clip);
        }
    }

    /// First audio lane free for `[start, end)`, appending a lane if none is
    fn place_audio(&mut self, start: f64, end: f64, ignore: Option<ClipId>) -> usize {
        match self.tracks.free_audio_lane(start, end, ignore) {
            Some(index) => index,
            None => {
                let index = self.tracks.push_audio_lane();
                tracing::debug!(lane = index, "All audio lanes occupied, added lane");
                index
            }
        }
    }

    fn set_start(&mut self, lane: LaneRef, clip_id: ClipId, start: f64) -> bool {
        let Some(lane) = self.tracks.lane_mut(lane) else {
            return false;
        };
        let Some(clip) = lane.get_mut(clip_id) else {
            return false;
        };
        if clip.start_time == start {
            return false;
        }
        clip.start_time = start;
        lane.sort();
        true
    }

    /// Move an audio clip that collides in its lane to a free lane
    fn resolve_collision(&mut self, clip_id: ClipId) -> bool {
        let Some(LaneRef::Audio(current)) = self.tracks.lane_of(clip_id) else {
            return false;
        };
        let Some((start, end)) = self.clip(clip_id).map(|c| (c.start_time, c.end_time())) else {
            return false;
        };
        if !self.tracks.audio[current].collides(start, end, Some(clip_id)) {
            return false;
        }
        let target = self.place_audio(start, end, Some(clip_id));
        let Some(clip) = self.tracks.audio[current].remove(clip_id) else {
            return false;
        };
        tracing::debug!(clip = %clip_id, from = current, to = target, "Resolved lane collision");
        self.tracks.audio[target].insert(clip);
        true
    }

    fn sanitize_clips(&mut self) {
        fn sanitize(lane: &mut Lane) {
            for clip in lane.clips_mut().iter_mut() {
                clip.sanitize();
            }
            lane.sort();
        }
        sanitize(&mut self.tracks.video);
        for lane in &mut self.tracks.audio {
            sanitize(lane);
        }
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}
