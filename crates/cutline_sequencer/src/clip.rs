// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clip definitions for the timeline.

use crate::media::{MediaId, MediaItem, MediaKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shortest duration a clip may have, in seconds
pub const MIN_CLIP_DURATION: f64 = 0.01;

/// Unique identifier for a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClipId(pub Uuid);

impl ClipId {
    /// Create a new random clip ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A placed reference to a time window of a media item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    /// Unique clip ID
    pub id: ClipId,
    /// Referenced media (may dangle)
    pub media_id: MediaId,
    /// Position on the timeline in seconds
    pub start_time: f64,
    /// Length on the timeline in seconds
    pub duration: f64,
    /// In-point within the media in seconds
    pub offset: f64,
    /// Clip kind, matches the media kind
    pub kind: MediaKind,
    /// Whether the clip is muted
    pub muted: bool,
    /// Clip volume (0 to 1)
    pub volume: f32,
    /// Stabilization flag for video clips
    #[serde(default)]
    pub stabilized: Option<bool>,
}

impl Clip {
    /// Create a clip covering the whole media item
    pub fn new(media: &MediaItem, start_time: f64) -> Self {
        Self {
            id: ClipId::new(),
            media_id: media.id,
            start_time: sanitize_time(start_time),
            duration: media.duration_seconds.max(MIN_CLIP_DURATION),
            offset: 0.0,
            kind: media.kind,
            muted: false,
            volume: 1.0,
            stabilized: None,
        }
    }

    /// Timeline time at which the clip ends (exclusive)
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Whether timeline time `t` falls inside `[start, end)`
    pub fn contains(&self, t: f64) -> bool {
        self.start_time <= t && t < self.end_time()
    }

    /// Whether `[start, end)` intersects the clip interval
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start_time < end && start < self.end_time()
    }

    /// Map a timeline time to a media time
    pub fn media_time_at(&self, t: f64) -> f64 {
        self.offset + (t - self.start_time)
    }

    /// Map a media time back to a timeline time
    pub fn timeline_time_of(&self, media_time: f64) -> f64 {
        self.start_time + (media_time - self.offset)
    }

    /// Gain applied to the clip's sink
    pub fn effective_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    /// Apply an attribute patch, clamping numeric input
    pub fn apply_patch(&mut self, patch: &ClipPatch) -> bool {
        let before = self.clone();
        if let Some(muted) = patch.muted {
            self.muted = muted;
        }
        if let Some(volume) = patch.volume {
            self.volume = sanitize_volume(volume);
        }
        if let Some(stabilized) = patch.stabilized {
            self.stabilized = Some(stabilized);
        }
        *self != before
    }

    /// Clamp all fields into their valid ranges
    pub fn sanitize(&mut self) {
        self.start_time = sanitize_time(self.start_time);
        self.offset = sanitize_time(self.offset);
        if !self.duration.is_finite() || self.duration < MIN_CLIP_DURATION {
            self.duration = MIN_CLIP_DURATION;
        }
        self.volume = sanitize_volume(self.volume);
    }
}

/// Attribute changes coming from toolbars
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipPatch {
    /// New mute state
    pub muted: Option<bool>,
    /// New volume (clamped to 0..=1)
    pub volume: Option<f32>,
    /// New stabilization flag
    pub stabilized: Option<bool>,
}

impl ClipPatch {
    /// Patch that only changes the mute state
    pub fn muted(muted: bool) -> Self {
        Self {
            muted: Some(muted),
            ..Default::default()
        }
    }

    /// Patch that only changes the volume
    pub fn volume(volume: f32) -> Self {
        Self {
            volume: Some(volume),
            ..Default::default()
        }
    }
}

/// Clamp a time to a finite, non-negative value
pub fn sanitize_time(t: f64) -> f64 {
    if t.is_finite() {
        t.max(0.0)
    } else {
        0.0
    }
}

/// Clamp a volume into 0..=1
pub fn sanitize_volume(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(duration: f64) -> MediaItem {
        MediaItem {
            id: MediaId::new(),
            kind: MediaKind::Audio,
            source_handle: "a.wav".to_string(),
            duration_seconds: duration,
            width: None,
            height: None,
        }
    }

    #[test]
    fn test_clip_interval() {
        let clip = Clip::new(&media(4.0), 2.0);
        assert!(clip.contains(2.0));
        assert!(clip.contains(5.99));
        assert!(!clip.contains(6.0));
        assert!(clip.overlaps(5.0, 7.0));
        assert!(!clip.overlaps(6.0, 7.0));
        assert!((clip.media_time_at(3.0) - 1.0).abs() < 1e-9);
        assert!((clip.timeline_time_of(1.0) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_patch_clamps_volume() {
        let mut clip = Clip::new(&media(4.0), 0.0);
        assert!(clip.apply_patch(&ClipPatch::volume(3.0)));
        assert_eq!(clip.volume, 1.0);
        assert!(clip.apply_patch(&ClipPatch::volume(-1.0)));
        assert_eq!(clip.volume, 0.0);
        clip.apply_patch(&ClipPatch::volume(f32::NAN));
        assert_eq!(clip.volume, 1.0);
        clip.apply_patch(&ClipPatch::muted(true));
        assert_eq!(clip.effective_gain(), 0.0);
    }

    #[test]
    fn test_json_shape() {
        let clip = Clip::new(&media(4.0), -3.0);
        assert_eq!(clip.start_time, 0.0);
        let json = serde_json::to_value(&clip).unwrap();
        assert!(json.get("mediaId").is_some());
        assert!(json.get("startTime").is_some());
        assert_eq!(json["kind"], "audio");
        assert!(json["stabilized"].is_null());
    }
}
