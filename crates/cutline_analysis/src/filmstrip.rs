// SPDX-License-Identifier: MIT OR Apache-2.0
//! Filmstrip planning for video clips.

use crate::thumbnail::ThumbnailKey;
use cutline_sequencer::{Clip, ClipId};
use std::collections::HashMap;

/// Upper bound on tiles for one clip
const MAX_TILES: usize = 256;

/// Tiles of one clip's filmstrip
#[derive(Debug, Clone, PartialEq)]
pub struct FilmstripPlan {
    /// Tile width in pixels
    pub tile_width: f64,
    /// Media time sampled by each tile
    pub times: Vec<f64>,
    /// Cache key of each tile
    pub keys: Vec<ThumbnailKey>,
}

/// Lay out thumbnail tiles for `clip` at `zoom` pixels per second
pub fn plan_filmstrip(clip: &Clip, zoom: f64, tile_width: f64, step: f64) -> FilmstripPlan {
    let width_px = (clip.duration * zoom).max(0.0);
    let tile_width = tile_width.max(1.0);
    let tiles = ((width_px / tile_width).ceil() as usize).clamp(1, MAX_TILES);
    let seconds_per_tile = clip.duration / tiles as f64;
    let last = clip.offset + clip.duration;

    let times: Vec<f64> = (0..tiles)
        .map(|i| (clip.offset + (i as f64 + 0.5) * seconds_per_tile).min(last))
        .collect();
    let keys = times
        .iter()
        .map(|t| ThumbnailKey::new(clip.media_id, *t, step))
        .collect();

    FilmstripPlan {
        tile_width,
        times,
        keys,
    }
}

/// Remembers what each clip element last rendered
#[derive(Debug, Default)]
pub struct FilmstripMemo {
    rendered: HashMap<ClipId, Vec<ThumbnailKey>>,
}

impl FilmstripMemo {
    /// Create an empty memo
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a plan. Returns true when the element must re-render.
    pub fn update(&mut self, clip_id: ClipId, plan: &FilmstripPlan) -> bool {
        if self.rendered.get(&clip_id) == Some(&plan.keys) {
            return false;
        }
        self.rendered.insert(clip_id, plan.keys.clone());
        true
    }

    /// Forget clips that no longer exist
    pub fn retain(&mut self, live: impl Fn(ClipId) -> bool) {
        self.rendered.retain(|id, _| live(*id));
    }

    /// Tracked clips
    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }
}
