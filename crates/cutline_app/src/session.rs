// SPDX-License-Identifier: MIT OR Apache-2.0
//! Realtime editing session.
//!
//! Ties the editor state to its runtime collaborators and drives them from
//! one per-frame [`EditorSession::tick`]. Playback work runs first; analysis
//! only fills caches with what the visible timeline references.

use crate::events::EditorEvent;
use crate::state::EditorState;
use cutline_analysis::{
    plan_filmstrip, AudioDecoder, CaptureSink, FilmstripMemo, PumpReport, SilenceError,
    TargetHandle, ThumbnailLookup, ThumbnailPipeline, WaveformCache,
};
use cutline_sequencer::{
    ClipId, MediaKind, PlaybackState, PlaybackSynchronizer, SinkFactory, TickReport, Viewport,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Work done by one session tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTick {
    /// Clock and sink reconciliation
    pub playback: TickReport,
    /// Thumbnail captures settled this tick
    pub thumbnails: PumpReport,
    /// Waveforms that finished decoding
    pub waveforms_ready: usize,
    /// Whether the viewport scrolled to follow the playhead
    pub scrolled: bool,
}

/// Editor state plus playback and analysis runtimes
pub struct EditorSession {
    state: EditorState,
    synchronizer: PlaybackSynchronizer,
    thumbnails: ThumbnailPipeline,
    waveforms: WaveformCache,
    decoder: Arc<dyn AudioDecoder>,
    filmstrips: FilmstripMemo,
    /// Completion targets of each clip's filmstrip tiles
    tile_handles: HashMap<ClipId, Vec<TargetHandle>>,
    next_handle: u64,
    viewport: Viewport,
    last_state: PlaybackState,
}

impl EditorSession {
    /// Create a session around `state`
    pub fn new(
        state: EditorState,
        sinks: Box<dyn SinkFactory>,
        capture: Box<dyn CaptureSink>,
        decoder: Arc<dyn AudioDecoder>,
    ) -> Self {
        let config = state.config().clone();
        let synchronizer = PlaybackSynchronizer::new(config.playback, sinks);
        let last_state = synchronizer.state(state.timeline());
        let viewport = Viewport {
            zoom: state.timeline().zoom(),
            ..Viewport::default()
        };

        Self {
            thumbnails: ThumbnailPipeline::new(capture, config.thumbnails),
            waveforms: WaveformCache::new(decoder.clone(), config.waveform),
            decoder,
            synchronizer,
            filmstrips: FilmstripMemo::new(),
            tile_handles: HashMap::new(),
            next_handle: 0,
            viewport,
            last_state,
            state,
        }
    }

    /// Editor state
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Editor state, for commands
    pub fn state_mut(&mut self) -> &mut EditorState {
        &mut self.state
    }

    /// Timeline viewport
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Timeline viewport, for scrolling and resizing
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Playback synchronizer
    pub fn synchronizer(&self) -> &PlaybackSynchronizer {
        &self.synchronizer
    }

    /// Thumbnail pipeline
    pub fn thumbnails(&self) -> &ThumbnailPipeline {
        &self.thumbnails
    }

    /// Waveform cache
    pub fn waveforms(&self) -> &WaveformCache {
        &self.waveforms
    }

    // ---------------------------------------------------------------------
    // Transport
    // ---------------------------------------------------------------------

    /// Start playback
    pub fn play(&mut self) {
        let (timeline, _) = self.state.playback_context();
        self.synchronizer.play(timeline);
        self.publish_state();
    }

    /// Pause playback
    pub fn pause(&mut self) {
        let (timeline, _) = self.state.playback_context();
        self.synchronizer.pause(timeline);
        self.publish_state();
    }

    /// Toggle play/pause
    pub fn toggle_playback(&mut self) {
        let (timeline, _) = self.state.playback_context();
        self.synchronizer.toggle(timeline);
        self.publish_state();
    }

    /// Explicit time-set; sinks are re-seeked on the next tick
    pub fn seek(&mut self, t: f64) {
        let (timeline, _) = self.state.playback_context();
        self.synchronizer.seek(timeline, t);
        self.publish_state();
    }

    /// Stop playback and release every sink
    pub fn stop(&mut self) {
        self.pause();
        self.synchronizer.stop_all();
    }

    // ---------------------------------------------------------------------
    // Frame loop
    // ---------------------------------------------------------------------

    /// Advance one frame: playback, auto-scroll, then analysis
    pub fn tick(&mut self, delta: f64, now: Instant) -> SessionTick {
        let (timeline, catalog) = self.state.playback_context();
        let playback = self.synchronizer.tick(timeline, catalog, delta);
        if playback.reached_end {
            tracing::debug!(time = playback.playback_time, "Reached end of timeline");
        }
        self.publish_state();

        let timeline = self.state.timeline();
        self.viewport.zoom = timeline.zoom();
        let playing = timeline.is_playing();
        let scrolled = playing && self.viewport.follow_playhead(playback.playback_time);

        let thumbnails = self.thumbnails.pump(now, playing);
        let waveforms_ready = self.waveforms.update();

        SessionTick {
            playback,
            thumbnails,
            waveforms_ready,
            scrolled,
        }
    }

    /// Request visuals for every clip in the viewport. Returns the clips whose
    /// filmstrip must be redrawn.
    pub fn refresh_visuals(&mut self) -> Vec<ClipId> {
        let timeline = self.state.timeline();
        let catalog = self.state.catalog();
        self.viewport.zoom = timeline.zoom();
        self.filmstrips.retain(|id| timeline.clip(id).is_some());
        self.tile_handles.retain(|id, _| timeline.clip(*id).is_some());

        let tile_width = f64::from(self.thumbnails.config().width);
        let step = self.thumbnails.config().step;
        let mut redraw = Vec::new();

        for (_, lane) in timeline.tracks().lanes() {
            for clip in lane.clips().iter().filter(|c| self.viewport.is_clip_visible(c)) {
                let Some(media) = catalog.get(clip.media_id) else {
                    continue;
                };
                match media.kind {
                    MediaKind::Audio => {
                        self.waveforms.request(media);
                    }
                    MediaKind::Video => {
                        let plan = plan_filmstrip(clip, self.viewport.zoom, tile_width, step);
                        if self.filmstrips.update(clip.id, &plan) {
                            redraw.push(clip.id);
                        }
                        let handles = self.tile_handles.entry(clip.id).or_default();
                        handles.truncate(plan.times.len());
                        while handles.len() < plan.times.len() {
                            handles.push(TargetHandle(self.next_handle));
                            self.next_handle += 1;
                        }
                        for (tile, (time, target)) in
                            plan.times.iter().zip(handles.iter()).enumerate()
                        {
                            if let ThumbnailLookup::Pending =
                                self.thumbnails.request(media, *time, *target)
                            {
                                tracing::trace!(clip = %clip.id, tile, "Thumbnail pending");
                            }
                        }
                    }
                }
            }
        }
        redraw
    }

    /// Cut the silent parts out of a clip
    pub fn remove_silence(&mut self, clip_id: ClipId) -> Result<Vec<ClipId>, SilenceError> {
        self.state.remove_silence(clip_id, self.decoder.as_ref())
    }

    fn publish_state(&mut self) {
        let state = self.synchronizer.state(self.state.timeline());
        if state != self.last_state {
            self.last_state = state;
            self.state.emit(EditorEvent::PlaybackStateChanged(state));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_analysis::{
        CaptureError, CaptureEvent, CaptureTicket, DecodeError, DecodedAudio, Positioning,
    };
    use crate::commands::EditorCommand;
    use cutline_sequencer::{ClipPatch, ImportError, MediaInfo, MediaProbe, MediaSink};
    use image::RgbaImage;

    struct FakeSink {
        source: Option<String>,
        position: f64,
        paused: bool,
    }

    impl MediaSink for FakeSink {
        fn source(&self) -> Option<&str> {
            self.source.as_deref()
        }
        fn load(&mut self, locator: &str) {
            self.source = Some(locator.to_string());
        }
        fn position(&self) -> f64 {
            self.position
        }
        fn seek(&mut self, media_time: f64) {
            self.position = media_time;
        }
        fn play(&mut self) {
            self.paused = false;
        }
        fn pause(&mut self) {
            self.paused = true;
        }
        fn is_paused(&self) -> bool {
            self.paused
        }
        fn is_stalled(&self) -> bool {
            false
        }
        fn is_seeking(&self) -> bool {
            false
        }
        fn set_volume(&mut self, _volume: f32) {}
    }

    struct FakeFactory;

    impl SinkFactory for FakeFactory {
        fn create_sink(&mut self, _kind: MediaKind) -> Box<dyn MediaSink> {
            Box::new(FakeSink {
                source: None,
                position: 0.0,
                paused: true,
            })
        }
    }

    /// Always positioned; every grab succeeds
    struct InstantCapture;

    impl CaptureSink for InstantCapture {
        fn position(
            &mut self,
            _ticket: CaptureTicket,
            _locator: &str,
            _time: f64,
        ) -> Result<Positioning, CaptureError> {
            Ok(Positioning::Ready)
        }
        fn poll_events(&mut self) -> Vec<CaptureEvent> {
            Vec::new()
        }
        fn cancel(&mut self, _ticket: CaptureTicket) {}
        fn grab(&mut self) -> Result<RgbaImage, CaptureError> {
            Ok(RgbaImage::new(320, 180))
        }
    }

    struct ToneDecoder;

    impl AudioDecoder for ToneDecoder {
        fn decode(&self, _locator: &str) -> Result<DecodedAudio, DecodeError> {
            Ok(DecodedAudio::mono(1000, vec![0.5; 4000]))
        }
    }

    struct Probe(MediaKind, f64);

    impl MediaProbe for Probe {
        fn probe(&self, _handle: &str) -> Result<MediaInfo, ImportError> {
            Ok(MediaInfo {
                kind: self.0,
                duration: self.1,
                width: Some(640),
                height: Some(360),
            })
        }
    }

    fn session() -> EditorSession {
        EditorSession::new(
            EditorState::default(),
            Box::new(FakeFactory),
            Box::new(InstantCapture),
            Arc::new(ToneDecoder),
        )
    }

    #[test]
    fn test_play_emits_state_and_advances() {
        let mut session = session();
        let media = session
            .state_mut()
            .import_media("clip.mp4", &Probe(MediaKind::Video, 30.0))
            .unwrap();
        session.state_mut().add_clip(media, 0.0);
        let events = session.state_mut().subscribe();

        session.play();
        let now = Instant::now();
        session.tick(0.1, now);
        session.tick(0.1, now);

        let received: Vec<_> = events.try_iter().collect();
        assert!(received.contains(&EditorEvent::PlaybackStateChanged(PlaybackState::Playing)));
        assert!(session.state().timeline().playback_time() > 0.0);
    }

    #[test]
    fn test_auto_scroll_follows_playhead() {
        let mut session = session();
        let media = session
            .state_mut()
            .import_media("clip.mp4", &Probe(MediaKind::Video, 60.0))
            .unwrap();
        session.state_mut().add_clip(media, 0.0);
        session.viewport_mut().width_px = 500.0;

        session.seek(20.0);
        session.play();
        let tick = session.tick(0.0, Instant::now());
        assert!(tick.scrolled);
        assert!(session.viewport().is_visible(tick.playback.playback_time));
    }

    #[test]
    fn test_thumbnails_wait_while_playing() {
        let mut session = session();
        let media = session
            .state_mut()
            .import_media("clip.mp4", &Probe(MediaKind::Video, 4.0))
            .unwrap();
        session.state_mut().add_clip(media, 0.0);

        let redraw = session.refresh_visuals();
        assert_eq!(redraw.len(), 1);
        assert!(session.refresh_visuals().is_empty());
        let queued = session.thumbnails().queue_len();
        assert!(queued > 0);

        session.play();
        session.tick(0.016, Instant::now());
        assert_eq!(session.thumbnails().queue_len(), queued);

        session.pause();
        let tick = session.tick(0.016, Instant::now());
        // Positioned captures complete synchronously, so the queue drains
        assert_eq!(tick.thumbnails.captured.len(), queued);
        assert_eq!(session.thumbnails().cache_len(), queued);
        assert_eq!(session.thumbnails().queue_len(), 0);
    }

    #[test]
    fn test_commanded_seek_and_undo_survive_playback() {
        let mut session = session();
        let media = session
            .state_mut()
            .import_media("clip.mp4", &Probe(MediaKind::Video, 30.0))
            .unwrap();
        let clip = session.state_mut().add_clip(media, 0.0).unwrap();
        let now = Instant::now();

        session.seek(5.0);
        session.play();
        for _ in 0..3 {
            session.tick(0.0, now);
        }

        // Sink still reports 5.0 but the command wins
        assert!(session.state_mut().execute(EditorCommand::Seek(4.6)));
        let tick = session.tick(0.016, now);
        assert!(!tick.playback.adopted);
        assert!((tick.playback.playback_time - 4.616).abs() < 1e-9);

        // Undo point taken at 4.616
        session.state_mut().set_clip_attribute(clip, &ClipPatch::muted(true));
        session.state_mut().execute(EditorCommand::Seek(5.0));
        session.tick(0.0, now);
        session.tick(0.0, now);

        assert!(session.state_mut().execute(EditorCommand::Undo));
        let tick = session.tick(0.016, now);
        assert!(!tick.playback.adopted);
        assert!((tick.playback.playback_time - 4.632).abs() < 1e-9);
        assert!(session.state().timeline().is_playing());
    }

    #[test]
    fn test_tile_handles_follow_live_clips() {
        let mut session = session();
        let media = session
            .state_mut()
            .import_media("clip.mp4", &Probe(MediaKind::Video, 4.0))
            .unwrap();
        let first = session.state_mut().add_clip(media, 0.0).unwrap();
        let second = session.state_mut().add_clip(media, 4.0).unwrap();

        session.refresh_visuals();
        assert_eq!(session.tile_handles.len(), 2);
        let tiles = session.tile_handles[&second].len();
        assert!(tiles > 1);

        // Zooming out drops the extra tiles
        session.state_mut().set_zoom(20.0);
        session.refresh_visuals();
        assert_eq!(session.tile_handles[&second].len(), 1);

        session.state_mut().delete_clip(first);
        session.refresh_visuals();
        assert_eq!(session.tile_handles.len(), 1);
        assert!(!session.tile_handles.contains_key(&first));
    }
}
