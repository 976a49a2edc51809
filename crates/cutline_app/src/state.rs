// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor state management.
//!
//! `EditorState` is the single owned context of an editing session: media
//! catalog, timeline, undo history and change notifications. All timeline
//! mutations go through its command methods, which record the pre-mutation
//! snapshot whenever something actually changed.

use crate::commands::EditorCommand;
use crate::events::{EditorEvent, EventBus, Notice};
use crate::history::{HistoryManager, HistoryStats};
use crate::project::{EditorConfig, ProjectError, ProjectFile};
use cutline_analysis::{detect_speech, AudioDecoder, DecodeError, SilenceError};
use cutline_sequencer::{
    ClipId, ClipIssue, ClipPatch, ImportError, MediaCatalog, MediaId, MediaProbe, Timeline,
    TimelineSnapshot,
};
use std::path::Path;
use std::sync::mpsc::Receiver;

/// Editor context for one session
#[derive(Debug)]
pub struct EditorState {
    catalog: MediaCatalog,
    timeline: Timeline,
    history: HistoryManager,
    events: EventBus,
    config: EditorConfig,
    /// Snapshot taken when the current drag began
    drag_origin: Option<TimelineSnapshot>,
    dirty: bool,
}

impl EditorState {
    /// Create an empty session
    pub fn new(config: EditorConfig) -> Self {
        Self {
            catalog: MediaCatalog::new(),
            timeline: Timeline::new(config.timeline.clone()),
            history: HistoryManager::with_max_depth(config.history.max_depth),
            events: EventBus::new(),
            config,
            drag_origin: None,
            dirty: false,
        }
    }

    /// Restore a session from a project file
    pub fn from_project(project: ProjectFile, config: EditorConfig) -> Self {
        let mut state = Self::new(config);
        for item in project.media {
            state.catalog.insert(item);
        }
        state.timeline = Timeline::from_snapshot(project.timeline, state.config.timeline.clone());

        for issue in state.validate() {
            tracing::warn!(?issue, "Project issue");
        }
        state
    }

    /// Load a project file
    pub fn load_project(path: &Path, config: EditorConfig) -> Result<Self, ProjectError> {
        let project = ProjectFile::load(path)?;
        tracing::info!(path = %path.display(), media = project.media.len(), "Loaded project");
        Ok(Self::from_project(project, config))
    }

    /// Bundle the session for saving
    pub fn to_project(&self) -> ProjectFile {
        ProjectFile::new(self.catalog.iter().cloned().collect(), self.timeline.snapshot())
    }

    /// Save the session and clear the dirty flag
    pub fn save_project(&mut self, path: &Path) -> Result<(), ProjectError> {
        self.to_project().save(path)?;
        self.dirty = false;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// Imported media
    pub fn catalog(&self) -> &MediaCatalog {
        &self.catalog
    }

    /// Timeline (read only; mutate through commands)
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Catalog and mutable timeline, for the playback tick
    pub fn playback_context(&mut self) -> (&mut Timeline, &MediaCatalog) {
        (&mut self.timeline, &self.catalog)
    }

    /// Active configuration
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Whether there are unsaved edits
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Subscribe to change notifications
    pub fn subscribe(&mut self) -> Receiver<EditorEvent> {
        self.events.subscribe()
    }

    /// Publish an event to subscribers
    pub fn emit(&mut self, event: EditorEvent) {
        self.events.emit(event);
    }

    /// Check clips against the catalog and lane rules
    pub fn validate(&self) -> Vec<ClipIssue> {
        self.timeline.validate(&self.catalog)
    }

    /// Undo/redo statistics
    pub fn history_stats(&self) -> HistoryStats {
        self.history.stats()
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ---------------------------------------------------------------------
    // Media
    // ---------------------------------------------------------------------

    /// Import a file. Failures create nothing and raise a notice.
    pub fn import_media(&mut self, handle: &str, probe: &dyn MediaProbe) -> Result<MediaId, ImportError> {
        let result = self.catalog.import(handle, probe);
        if let Err(e) = &result {
            self.events
                .emit(EditorEvent::Notice(Notice::warning(format!("Could not import {handle}: {e}"))));
        }
        result
    }

    // ---------------------------------------------------------------------
    // Commands
    // ---------------------------------------------------------------------

    /// Run a command. Returns whether anything changed.
    pub fn execute(&mut self, command: EditorCommand) -> bool {
        tracing::debug!(command = command.description(), "Execute");
        match command {
            EditorCommand::AddClip {
                media_id,
                start_time,
            } => self.add_clip(media_id, start_time).is_some(),
            EditorCommand::AddClipAutoPlaced { media_id } => {
                self.add_clip_auto_placed(media_id).is_some()
            }
            EditorCommand::MoveClip {
                clip_id,
                start_time,
            } => self.move_clip(clip_id, start_time),
            EditorCommand::MoveClipToLane {
                clip_id,
                lane_index,
            } => self.move_clip_to_lane(clip_id, lane_index),
            EditorCommand::SplitClip { clip_id, at } => self.split_clip(clip_id, at).is_some(),
            EditorCommand::DeleteClip { clip_id } => self.delete_clip(clip_id),
            EditorCommand::SetClipAttribute { clip_id, patch } => {
                self.set_clip_attribute(clip_id, &patch)
            }
            EditorCommand::TrimClip {
                clip_id,
                offset,
                duration,
            } => self.trim_clip(clip_id, offset, duration),
            EditorCommand::Select(clip_id) => self.select(clip_id),
            EditorCommand::SetZoom(zoom) => self.set_zoom(zoom),
            EditorCommand::Seek(t) => {
                self.seek(t);
                true
            }
            EditorCommand::Undo => self.undo(),
            EditorCommand::Redo => self.redo(),
        }
    }

    /// Place media at `start_time`. Unknown media is a no-op.
    pub fn add_clip(&mut self, media_id: MediaId, start_time: f64) -> Option<ClipId> {
        let media = self.catalog.get(media_id)?.clone();
        Some(self.edit("Add clip", |timeline, _| timeline.add_clip(&media, start_time), |_| true))
    }

    /// Append media after the last clip of its lane
    pub fn add_clip_auto_placed(&mut self, media_id: MediaId) -> Option<ClipId> {
        let media = self.catalog.get(media_id)?.clone();
        Some(self.edit("Add clip", |timeline, _| timeline.add_clip_auto_placed(&media), |_| true))
    }

    /// Move a clip in time
    pub fn move_clip(&mut self, clip_id: ClipId, start_time: f64) -> bool {
        self.edit("Move clip", |timeline, _| timeline.move_clip(clip_id, start_time), |c| *c)
    }

    /// Move an audio clip to another lane
    pub fn move_clip_to_lane(&mut self, clip_id: ClipId, lane_index: usize) -> bool {
        self.edit(
            "Move clip to lane",
            |timeline, _| timeline.move_clip_to_lane(clip_id, lane_index),
            |c| *c,
        )
    }

    /// Cut a clip at timeline time `at`; returns the right half
    pub fn split_clip(&mut self, clip_id: ClipId, at: f64) -> Option<ClipId> {
        self.edit("Split clip", |timeline, _| timeline.split_clip(clip_id, at), Option::is_some)
    }

    /// Remove a clip
    pub fn delete_clip(&mut self, clip_id: ClipId) -> bool {
        self.edit("Delete clip", |timeline, _| timeline.delete_clip(clip_id), Option::is_some)
            .is_some()
    }

    /// Change clip attributes
    pub fn set_clip_attribute(&mut self, clip_id: ClipId, patch: &ClipPatch) -> bool {
        self.edit("Change clip", |timeline, _| timeline.set_clip_attribute(clip_id, patch), |c| *c)
    }

    /// Change a clip's in-point and length
    pub fn trim_clip(&mut self, clip_id: ClipId, offset: f64, duration: f64) -> bool {
        self.edit(
            "Trim clip",
            |timeline, catalog| timeline.trim_clip(clip_id, offset, duration, catalog),
            |c| *c,
        )
    }

    /// Cut the silent parts out of a clip as one undoable edit.
    ///
    /// When nothing is above the threshold the clip is left as is and a
    /// notice is raised.
    pub fn remove_silence(
        &mut self,
        clip_id: ClipId,
        decoder: &dyn AudioDecoder,
    ) -> Result<Vec<ClipId>, SilenceError> {
        let clip = self
            .timeline
            .clip(clip_id)
            .cloned()
            .ok_or(SilenceError::ClipNotFound(clip_id))?;
        let decoded = match self.catalog.get(clip.media_id) {
            Some(media) => decoder.decode(&media.source_handle),
            None => Err(DecodeError::NotFound(clip.media_id.to_string())),
        };
        let audio = match decoded {
            Ok(audio) => audio,
            Err(e) => {
                tracing::warn!(
                    clip = %clip_id,
                    error = %e,
                    "Could not decode audio for silence removal"
                );
                self.events.emit(EditorEvent::Notice(Notice::warning(format!(
                    "Could not read audio for silence removal: {e}"
                ))));
                return Err(e.into());
            }
        };
        let segments = match detect_speech(&audio, clip.offset, clip.duration, &self.config.silence) {
            Ok(segments) => segments,
            Err(SilenceError::NoSpeechDetected) => {
                self.events.emit(EditorEvent::Notice(Notice::info("No speech detected")));
                return Err(SilenceError::NoSpeechDetected);
            }
            Err(e) => return Err(e),
        };

        let ranges: Vec<_> = segments.iter().map(|s| s.range()).collect();
        self.edit(
            "Remove silence",
            |timeline, _| timeline.ripple_replace(clip_id, &ranges),
            Option::is_some,
        )
        .ok_or(SilenceError::NoSpeechDetected)
    }

    // ---------------------------------------------------------------------
    // Drag
    // ---------------------------------------------------------------------

    /// Start dragging a clip; the pre-drag state becomes the undo point
    pub fn begin_drag(&mut self, clip_id: ClipId) -> bool {
        let snapshot = self.timeline.snapshot();
        if !self.timeline.begin_drag(clip_id) {
            return false;
        }
        self.drag_origin = Some(snapshot);
        true
    }

    /// Move the dragged clip; not recorded in history
    pub fn drag_to(&mut self, clip_id: ClipId, start_time: f64) -> bool {
        let moved = self.timeline.drag_to(clip_id, start_time);
        if moved {
            self.events.emit(EditorEvent::TimelineChanged);
        }
        moved
    }

    /// Commit the drag as one history entry
    pub fn end_drag(&mut self, clip_id: ClipId) -> bool {
        let changed = self.timeline.end_drag(clip_id);
        if let Some(origin) = self.drag_origin.take() {
            if changed {
                self.record(origin, "Move clip");
                self.dirty = true;
                self.events.emit(EditorEvent::TimelineChanged);
            }
        }
        changed
    }

    /// Abort the drag, putting the clip back
    pub fn cancel_drag(&mut self) {
        if self.drag_origin.take().is_some() {
            self.timeline.cancel_drag();
            self.events.emit(EditorEvent::TimelineChanged);
        }
    }

    // ---------------------------------------------------------------------
    // View state (not undoable)
    // ---------------------------------------------------------------------

    /// Change the selection
    pub fn select(&mut self, clip_id: Option<ClipId>) -> bool {
        let changed = self.timeline.select(clip_id);
        if changed {
            self.events
                .emit(EditorEvent::SelectionChanged(self.timeline.selected_clip_id()));
        }
        changed
    }

    /// Change the zoom
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        self.timeline.set_zoom(zoom)
    }

    /// Move the playhead; playback re-seeks its sinks on the next tick
    pub fn seek(&mut self, t: f64) {
        self.timeline.set_playback_time(t);
    }

    // ---------------------------------------------------------------------
    // History
    // ---------------------------------------------------------------------

    /// Step back in history
    pub fn undo(&mut self) -> bool {
        let current = self.timeline.snapshot();
        match self.history.undo(&current) {
            Ok(previous) => {
                self.apply_history(previous);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "Undo unavailable");
                false
            }
        }
    }

    /// Step forward in history
    pub fn redo(&mut self) -> bool {
        let current = self.timeline.snapshot();
        match self.history.redo(&current) {
            Ok(next) => {
                self.apply_history(next);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "Redo unavailable");
                false
            }
        }
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    /// Run a timeline mutation, recording the prior state when `changed` says
    /// it did something
    fn edit<T>(
        &mut self,
        description: &str,
        op: impl FnOnce(&mut Timeline, &MediaCatalog) -> T,
        changed: impl FnOnce(&T) -> bool,
    ) -> T {
        let before = self.timeline.snapshot();
        let result = op(&mut self.timeline, &self.catalog);
        if !changed(&result) {
            tracing::debug!(description, "No-op edit");
            return result;
        }

        let selection = before.selected_clip_id;
        self.record(before, description);
        self.dirty = true;
        self.events.emit(EditorEvent::TimelineChanged);
        if self.timeline.selected_clip_id() != selection {
            self.events
                .emit(EditorEvent::SelectionChanged(self.timeline.selected_clip_id()));
        }
        result
    }

    fn record(&mut self, before: TimelineSnapshot, description: &str) {
        // A failed snapshot loses the undo point but not the edit
        if let Err(e) = self.history.save(&before, description) {
            tracing::warn!(error = %e, description, "Failed to record history");
        }
        self.emit_history();
    }

    fn apply_history(&mut self, snapshot: TimelineSnapshot) {
        let selection = self.timeline.selected_clip_id();
        self.drag_origin = None;
        self.timeline.restore(snapshot);
        self.dirty = true;
        self.events.emit(EditorEvent::TimelineChanged);
        if self.timeline.selected_clip_id() != selection {
            self.events
                .emit(EditorEvent::SelectionChanged(self.timeline.selected_clip_id()));
        }
        self.emit_history();
    }

    fn emit_history(&mut self) {
        let event = EditorEvent::HistoryChanged {
            undo: self.history.undo_description().map(str::to_string),
            redo: self.history.redo_description().map(str::to_string),
        };
        self.events.emit(event);
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoticeLevel;
    use cutline_analysis::DecodedAudio;
    use cutline_sequencer::{LaneRef, MediaInfo, MediaKind};

    struct FixedProbe(MediaKind, f64);

    impl MediaProbe for FixedProbe {
        fn probe(&self, _handle: &str) -> Result<MediaInfo, ImportError> {
            Ok(MediaInfo {
                kind: self.0,
                duration: self.1,
                width: None,
                height: None,
            })
        }
    }

    struct FailingProbe;

    impl MediaProbe for FailingProbe {
        fn probe(&self, handle: &str) -> Result<MediaInfo, ImportError> {
            Err(ImportError::Unsupported(handle.to_string()))
        }
    }

    /// Decodes every locator to 1 kHz mono with speech in the given ranges
    struct SpeechDecoder(Vec<(f64, f64)>, f64);

    impl AudioDecoder for SpeechDecoder {
        fn decode(&self, _locator: &str) -> Result<DecodedAudio, DecodeError> {
            let frames = (self.1 * 1000.0) as usize;
            let samples = (0..frames)
                .map(|i| {
                    let t = i as f64 / 1000.0;
                    let loud = self.0.iter().any(|(a, b)| *a <= t && t < *b);
                    match (loud, i % 2 == 0) {
                        (true, true) => 0.5,
                        (true, false) => -0.5,
                        (false, _) => 0.0,
                    }
                })
                .collect();
            Ok(DecodedAudio::mono(1000, samples))
        }
    }

    struct BrokenDecoder;

    impl AudioDecoder for BrokenDecoder {
        fn decode(&self, locator: &str) -> Result<DecodedAudio, DecodeError> {
            Err(DecodeError::Corrupt(locator.to_string()))
        }
    }

    fn import(state: &mut EditorState, kind: MediaKind, duration: f64) -> MediaId {
        state.import_media("media", &FixedProbe(kind, duration)).unwrap()
    }

    #[test]
    fn test_split_undo_scenario() {
        let mut state = EditorState::default();
        let video = import(&mut state, MediaKind::Video, 10.0);
        let audio = import(&mut state, MediaKind::Audio, 4.0);

        let v = state.add_clip(video, 0.0).unwrap();
        let a1 = state.add_clip(audio, 0.0).unwrap();
        let a2 = state.add_clip(audio, 0.0).unwrap();
        assert_eq!(state.timeline().lane_of(a1), Some(LaneRef::Audio(0)));
        assert_eq!(state.timeline().lane_of(a2), Some(LaneRef::Audio(1)));
        let audio_before = state.timeline().tracks().audio.clone();

        let right = state.split_clip(v, 6.0).unwrap();
        let left = state.timeline().clip(v).unwrap();
        let right = state.timeline().clip(right).unwrap();
        assert!((left.duration - 6.0).abs() < 1e-9);
        assert!((right.duration - 4.0).abs() < 1e-9);
        assert!((right.offset - 6.0).abs() < 1e-9);

        assert!(state.undo());
        let video_lane = state.timeline().tracks().video.clips();
        assert_eq!(video_lane.len(), 1);
        assert_eq!(video_lane[0].id, v);
        assert!((video_lane[0].duration - 10.0).abs() < 1e-9);
        assert_eq!(state.timeline().tracks().audio, audio_before);
    }

    #[test]
    fn test_undo_redo_restores_exact_state() {
        let mut state = EditorState::default();
        let audio = import(&mut state, MediaKind::Audio, 4.0);
        let clip = state.add_clip(audio, 1.0).unwrap();
        state.set_clip_attribute(clip, &ClipPatch::volume(0.4));
        let edited = state.timeline().snapshot();

        assert!(state.undo());
        assert_ne!(state.timeline().snapshot(), edited);
        assert!(state.redo());
        assert_eq!(state.timeline().snapshot(), edited);
        assert!(!state.redo());
    }

    #[test]
    fn test_noop_commands_leave_history_alone() {
        let mut state = EditorState::default();
        assert!(!state.move_clip(ClipId::new(), 3.0));
        assert!(!state.delete_clip(ClipId::new()));
        assert!(state.add_clip(MediaId::new(), 0.0).is_none());
        assert!(!state.can_undo());

        // A no-op after an undo keeps redo available
        let audio = import(&mut state, MediaKind::Audio, 2.0);
        state.add_clip(audio, 0.0);
        state.undo();
        assert!(!state.move_clip(ClipId::new(), 1.0));
        assert!(state.can_redo());
    }

    #[test]
    fn test_history_cap() {
        let mut state = EditorState::default();
        let audio = import(&mut state, MediaKind::Audio, 1.0);
        let clip = state.add_clip(audio, 0.0).unwrap();
        for i in 1..=60 {
            state.move_clip(clip, f64::from(i));
        }
        assert_eq!(state.history_stats().undo_count, 50);

        let mut undone = 0;
        while state.undo() {
            undone += 1;
        }
        assert_eq!(undone, 50);
        assert!((state.timeline().clip(clip).unwrap().start_time - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_events_follow_edits() {
        let mut state = EditorState::default();
        let events = state.subscribe();
        let audio = import(&mut state, MediaKind::Audio, 2.0);
        let clip = state.add_clip(audio, 0.0).unwrap();
        state.select(Some(clip));
        state.delete_clip(clip);

        let received: Vec<_> = events.try_iter().collect();
        assert!(received.contains(&EditorEvent::SelectionChanged(Some(clip))));
        assert!(received.contains(&EditorEvent::SelectionChanged(None)));
        assert!(received.contains(&EditorEvent::HistoryChanged {
            undo: Some("Delete clip".to_string()),
            redo: None,
        }));
    }

    #[test]
    fn test_import_failure_raises_notice() {
        let mut state = EditorState::default();
        let events = state.subscribe();
        assert!(state.import_media("broken.xyz", &FailingProbe).is_err());
        assert!(state.catalog().is_empty());
        assert!(matches!(events.try_recv(), Ok(EditorEvent::Notice(_))));
    }

    #[test]
    fn test_drag_is_one_history_entry() {
        let mut state = EditorState::default();
        let audio = import(&mut state, MediaKind::Audio, 2.0);
        let a = state.add_clip(audio, 0.0).unwrap();
        let b = state.add_clip(audio, 5.0).unwrap();
        let depth = state.history_stats().undo_count;

        assert!(state.begin_drag(b));
        state.drag_to(b, 4.0);
        state.drag_to(b, 1.0);
        assert!(state.end_drag(b));
        assert_eq!(state.history_stats().undo_count, depth + 1);

        let lane = state.timeline().lane_of(b);
        let b_clip = state.timeline().clip(b).unwrap();
        let a_clip = state.timeline().clip(a).unwrap();
        let same_lane = state.timeline().lane_of(a) == lane;
        assert!(!same_lane || !a_clip.overlaps(b_clip.start_time, b_clip.end_time()));

        state.undo();
        assert!((state.timeline().clip(b).unwrap().start_time - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_cancelled_drag_records_nothing() {
        let mut state = EditorState::default();
        let audio = import(&mut state, MediaKind::Audio, 2.0);
        let clip = state.add_clip(audio, 3.0).unwrap();
        let depth = state.history_stats().undo_count;

        state.begin_drag(clip);
        state.drag_to(clip, 8.0);
        state.cancel_drag();
        assert_eq!(state.history_stats().undo_count, depth);
        assert!((state.timeline().clip(clip).unwrap().start_time - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_silence_ripples() {
        let mut state = EditorState::default();
        let audio = import(&mut state, MediaKind::Audio, 10.0);
        let clip = state.add_clip(audio, 2.0).unwrap();
        let decoder = SpeechDecoder(vec![(1.0, 2.0), (6.0, 7.0)], 10.0);

        let pieces = state.remove_silence(clip, &decoder).unwrap();
        assert_eq!(pieces.len(), 2);
        assert!(state.timeline().clip(clip).is_none());

        let first = state.timeline().clip(pieces[0]).unwrap();
        let second = state.timeline().clip(pieces[1]).unwrap();
        assert!((first.start_time - 2.0).abs() < 1e-9);
        assert!((first.offset - 0.75).abs() < 1e-9);
        assert!((second.start_time - first.end_time()).abs() < 1e-9);
        assert!(first.duration + second.duration <= 10.0);

        // One undo restores the original clip
        assert!(state.undo());
        assert!((state.timeline().clip(clip).unwrap().duration - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_silence_all_silent() {
        let mut state = EditorState::default();
        let audio = import(&mut state, MediaKind::Audio, 5.0);
        let clip = state.add_clip(audio, 0.0).unwrap();
        let before = state.timeline().snapshot();
        let events = state.subscribe();

        let result = state.remove_silence(clip, &SpeechDecoder(Vec::new(), 5.0));
        assert_eq!(result, Err(SilenceError::NoSpeechDetected));
        assert_eq!(state.timeline().snapshot(), before);
        assert!(matches!(events.try_recv(), Ok(EditorEvent::Notice(_))));

        let missing = ClipId::new();
        assert_eq!(
            state.remove_silence(missing, &SpeechDecoder(Vec::new(), 5.0)),
            Err(SilenceError::ClipNotFound(missing))
        );
    }

    #[test]
    fn test_remove_silence_decode_failure_warns() {
        let mut state = EditorState::default();
        let audio = import(&mut state, MediaKind::Audio, 5.0);
        let clip = state.add_clip(audio, 0.0).unwrap();
        let before = state.timeline().snapshot();
        let depth = state.history_stats().undo_count;
        let events = state.subscribe();

        let result = state.remove_silence(clip, &BrokenDecoder);
        assert!(matches!(result, Err(SilenceError::Decode(DecodeError::Corrupt(_)))));
        assert_eq!(state.timeline().snapshot(), before);
        assert_eq!(state.history_stats().undo_count, depth);
        assert!(matches!(
            events.try_recv(),
            Ok(EditorEvent::Notice(notice)) if notice.level == NoticeLevel::Warning
        ));
    }

    #[test]
    fn test_remove_silence_missing_media_warns() {
        let mut source = EditorState::default();
        let audio = import(&mut source, MediaKind::Audio, 5.0);
        let clip = source.add_clip(audio, 0.0).unwrap();

        // Project saved without its media list
        let project = ProjectFile::new(Vec::new(), source.timeline().snapshot());
        let mut state = EditorState::from_project(project, EditorConfig::default());
        let events = state.subscribe();

        let result = state.remove_silence(clip, &SpeechDecoder(vec![(1.0, 2.0)], 5.0));
        assert!(matches!(result, Err(SilenceError::Decode(DecodeError::NotFound(_)))));
        assert!(state.timeline().clip(clip).is_some());
        assert!(matches!(events.try_recv(), Ok(EditorEvent::Notice(_))));
    }
}
