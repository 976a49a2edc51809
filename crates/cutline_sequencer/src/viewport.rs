// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline viewport geometry.
//!
//! Converts between seconds and pixels for the render collaborator and keeps
//! the playhead in view while playing.

use crate::clip::Clip;

/// Fraction of the visible width where a followed playhead is placed
const FOLLOW_ANCHOR: f64 = 0.2;

/// Pixel geometry of a clip, relative to the timeline origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipGeometry {
    /// Left edge in pixels
    pub left: f64,
    /// Width in pixels
    pub width: f64,
}

/// Horizontal window onto the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Zoom in pixels per second
    pub zoom: f64,
    /// Time at the left edge, in seconds
    pub scroll_offset: f64,
    /// Visible width in pixels
    pub width_px: f64,
    /// Follow the playhead while playing
    pub auto_scroll: bool,
}

impl Viewport {
    /// Create a viewport at the start of the timeline
    pub fn new(zoom: f64, width_px: f64) -> Self {
        Self {
            zoom,
            scroll_offset: 0.0,
            width_px: width_px.max(0.0),
            auto_scroll: true,
        }
    }

    /// Convert time to an x position within the viewport
    pub fn time_to_x(&self, time: f64) -> f64 {
        (time - self.scroll_offset) * self.zoom
    }

    /// Convert an x position within the viewport to time
    pub fn x_to_time(&self, x: f64) -> f64 {
        x / self.zoom + self.scroll_offset
    }

    /// Geometry of a clip at the current zoom
    pub fn clip_geometry(&self, clip: &Clip) -> ClipGeometry {
        ClipGeometry {
            left: clip.start_time * self.zoom,
            width: clip.duration * self.zoom,
        }
    }

    /// Visible time range
    pub fn visible_range(&self) -> (f64, f64) {
        (self.scroll_offset, self.scroll_offset + self.width_px / self.zoom)
    }

    /// Whether `time` lies in the visible window
    pub fn is_visible(&self, time: f64) -> bool {
        let (start, end) = self.visible_range();
        start <= time && time <= end
    }

    /// Whether any part of a clip is on screen
    pub fn is_clip_visible(&self, clip: &Clip) -> bool {
        let (start, end) = self.visible_range();
        clip.overlaps(start, end)
    }

    /// Scroll so the playhead stays visible. Returns true if the view moved.
    pub fn follow_playhead(&mut self, playback_time: f64) -> bool {
        if !self.auto_scroll || self.is_visible(playback_time) {
            return false;
        }
        let visible = self.width_px / self.zoom;
        self.scroll_offset = (playback_time - visible * FOLLOW_ANCHOR).max(0.0);
        true
    }

    /// Change zoom keeping `anchor_time` under the same pixel
    pub fn zoom_around(&mut self, zoom: f64, anchor_time: f64) {
        let x = self.time_to_x(anchor_time);
        self.zoom = zoom;
        self.scroll_offset = (anchor_time - x / zoom).max(0.0);
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(100.0, 1280.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaId, MediaItem, MediaKind};

    #[test]
    fn test_conversions() {
        let mut viewport = Viewport::new(100.0, 1000.0);
        viewport.scroll_offset = 2.0;
        assert!((viewport.time_to_x(3.0) - 100.0).abs() < 1e-9);
        assert!((viewport.x_to_time(100.0) - 3.0).abs() < 1e-9);
        assert_eq!(viewport.visible_range(), (2.0, 12.0));
    }

    #[test]
    fn test_clip_geometry() {
        let media = MediaItem {
            id: MediaId::new(),
            kind: MediaKind::Video,
            source_handle: "v.mp4".to_string(),
            duration_seconds: 4.0,
            width: Some(1280),
            height: Some(720),
        };
        let clip = Clip::new(&media, 1.5);
        let viewport = Viewport::new(50.0, 500.0);
        assert_eq!(
            viewport.clip_geometry(&clip),
            ClipGeometry {
                left: 75.0,
                width: 200.0
            }
        );
        assert!(viewport.is_clip_visible(&clip));
    }

    #[test]
    fn test_follow_playhead() {
        let mut viewport = Viewport::new(100.0, 1000.0);
        assert!(!viewport.follow_playhead(5.0));
        assert!(viewport.follow_playhead(15.0));
        assert!(viewport.is_visible(15.0));
        assert!((viewport.scroll_offset - 13.0).abs() < 1e-9);

        viewport.auto_scroll = false;
        assert!(!viewport.follow_playhead(40.0));
    }

    #[test]
    fn test_zoom_around_keeps_anchor() {
        let mut viewport = Viewport::new(100.0, 1000.0);
        viewport.scroll_offset = 1.0;
        let x = viewport.time_to_x(4.0);
        viewport.zoom_around(200.0, 4.0);
        assert!((viewport.time_to_x(4.0) - x).abs() < 1e-9);
    }
}
