// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lanes and the track layout of a timeline.

use crate::clip::{Clip, ClipId};
use serde::{Deserialize, Serialize};

/// Address of a lane within [`Tracks`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneRef {
    /// The single video lane
    Video,
    /// An audio lane by index
    Audio(usize),
}

impl LaneRef {
    /// Get the display name
    pub fn name(&self) -> String {
        match self {
            Self::Video => "Video".to_string(),
            Self::Audio(index) => format!("Audio {}", index + 1),
        }
    }
}

/// An ordered row of clips, sorted by start time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lane {
    clips: Vec<Clip>,
}

impl Lane {
    /// Create an empty lane
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all clips
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// Get clip count
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Whether the lane holds no clips
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Insert a clip, keeping the lane sorted
    pub fn insert(&mut self, clip: Clip) {
        self.clips.push(clip);
        self.sort();
    }

    /// Remove a clip
    pub fn remove(&mut self, clip_id: ClipId) -> Option<Clip> {
        let index = self.clips.iter().position(|c| c.id == clip_id)?;
        Some(self.clips.remove(index))
    }

    /// Get clip by ID
    pub fn get(&self, clip_id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == clip_id)
    }

    /// Get mutable clip by ID. Call [`Lane::sort`] after moving it.
    pub fn get_mut(&mut self, clip_id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == clip_id)
    }

    /// Sort clips by start time
    pub fn sort(&mut self) {
        self.clips.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    }

    /// Whether `[start, end)` overlaps any clip other than `ignore`
    pub fn collides(&self, start: f64, end: f64, ignore: Option<ClipId>) -> bool {
        self.clips
            .iter()
            .filter(|c| Some(c.id) != ignore)
            .any(|c| c.overlaps(start, end))
    }

    /// End of the last clip (0 for an empty lane)
    pub fn end_time(&self) -> f64 {
        self.clips.iter().map(Clip::end_time).fold(0.0, f64::max)
    }

    /// Clips containing timeline time `t`
    pub fn clips_at(&self, t: f64) -> impl Iterator<Item = &Clip> {
        self.clips.iter().filter(move |c| c.contains(t))
    }

    /// Pairs of clips whose intervals overlap
    pub fn overlapping_pairs(&self) -> Vec<(ClipId, ClipId)> {
        let mut pairs = Vec::new();
        for (i, a) in self.clips.iter().enumerate() {
            for b in &self.clips[i + 1..] {
                if b.overlaps(a.start_time, a.end_time()) {
                    pairs.push((a.id, b.id));
                }
            }
        }
        pairs
    }

    pub(crate) fn clips_mut(&mut self) -> &mut Vec<Clip> {
        &mut self.clips
    }
}

/// Track layout: one video lane and a growable set of audio lanes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracks {
    /// Video lane
    pub video: Lane,
    /// Audio lanes
    pub audio: Vec<Lane>,
}

impl Tracks {
    /// Create empty tracks with `audio_lanes` audio lanes (at least one)
    pub fn new(audio_lanes: usize) -> Self {
        Self {
            video: Lane::new(),
            audio: (0..audio_lanes.max(1)).map(|_| Lane::new()).collect(),
        }
    }

    /// Get a lane
    pub fn lane(&self, lane: LaneRef) -> Option<&Lane> {
        match lane {
            LaneRef::Video => Some(&self.video),
            LaneRef::Audio(index) => self.audio.get(index),
        }
    }

    /// Get a mutable lane
    pub fn lane_mut(&mut self, lane: LaneRef) -> Option<&mut Lane> {
        match lane {
            LaneRef::Video => Some(&mut self.video),
            LaneRef::Audio(index) => self.audio.get_mut(index),
        }
    }

    /// All lanes with their addresses, video first
    pub fn lanes(&self) -> impl Iterator<Item = (LaneRef, &Lane)> {
        std::iter::once((LaneRef::Video, &self.video)).chain(
            self.audio
                .iter()
                .enumerate()
                .map(|(index, lane)| (LaneRef::Audio(index), lane)),
        )
    }

    /// Locate a clip
    pub fn find(&self, clip_id: ClipId) -> Option<(LaneRef, &Clip)> {
        self.lanes()
            .find_map(|(lane_ref, lane)| lane.get(clip_id).map(|clip| (lane_ref, clip)))
    }

    /// Lane currently holding `clip_id`
    pub fn lane_of(&self, clip_id: ClipId) -> Option<LaneRef> {
        self.find(clip_id).map(|(lane, _)| lane)
    }

    /// Iterate over every clip
    pub fn all_clips(&self) -> impl Iterator<Item = &Clip> {
        self.lanes().flat_map(|(_, lane)| lane.clips().iter())
    }

    /// Total clip count
    pub fn clip_count(&self) -> usize {
        self.video.len() + self.audio.iter().map(Lane::len).sum::<usize>()
    }

    /// End of the last clip on any lane
    pub fn content_end(&self) -> f64 {
        self.lanes().map(|(_, lane)| lane.end_time()).fold(0.0, f64::max)
    }

    /// Append an audio lane and return its index
    pub fn push_audio_lane(&mut self) -> usize {
        self.audio.push(Lane::new());
        self.audio.len() - 1
    }

    /// First audio lane where `[start, end)` is free, ignoring `ignore`
    pub fn free_audio_lane(&self, start: f64, end: f64, ignore: Option<ClipId>) -> Option<usize> {
        self.audio
            .iter()
            .position(|lane| !lane.collides(start, end, ignore))
    }
}

impl Default for Tracks {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaId, MediaItem, MediaKind};

    fn clip(start: f64, duration: f64) -> Clip {
        let media = MediaItem {
            id: MediaId::new(),
            kind: MediaKind::Audio,
            source_handle: "a.wav".to_string(),
            duration_seconds: duration,
            width: None,
            height: None,
        };
        Clip::new(&media, start)
    }

    #[test]
    fn test_lane_sorted_and_collisions() {
        let mut lane = Lane::new();
        let late = clip(5.0, 2.0);
        let early = clip(0.0, 2.0);
        lane.insert(late.clone());
        lane.insert(early.clone());
        assert_eq!(lane.clips()[0].id, early.id);
        assert!(lane.collides(1.0, 3.0, None));
        assert!(!lane.collides(2.0, 5.0, None));
        assert!(!lane.collides(1.0, 3.0, Some(early.id)));
        assert_eq!(lane.end_time(), 7.0);
        assert!(lane.overlapping_pairs().is_empty());
    }

    #[test]
    fn test_tracks_find() {
        let mut tracks = Tracks::new(2);
        let c = clip(0.0, 1.0);
        let id = c.id;
        tracks.audio[1].insert(c);
        assert_eq!(tracks.lane_of(id), Some(LaneRef::Audio(1)));
        assert_eq!(tracks.clip_count(), 1);
        assert_eq!(tracks.free_audio_lane(0.0, 1.0, None), Some(0));
    }

    #[test]
    fn test_tracks_json_shape() {
        let tracks = Tracks::new(2);
        let json = serde_json::to_value(&tracks).unwrap();
        assert!(json["video"].is_array());
        assert_eq!(json["audio"].as_array().map(Vec::len), Some(2));
    }
}
