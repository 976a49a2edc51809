// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor commands.
//!
//! Every user action that touches the timeline is one of these values, so
//! input handling, scripting and tests all go through the same path:
//! [`crate::state::EditorState::execute`].

use cutline_sequencer::{ClipId, ClipPatch, MediaId};
use serde::{Deserialize, Serialize};

/// A user action against the editor state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditorCommand {
    /// Place media at a time
    AddClip {
        /// Media to place
        media_id: MediaId,
        /// Timeline position in seconds
        start_time: f64,
    },
    /// Append media after the last clip of its lane
    AddClipAutoPlaced {
        /// Media to place
        media_id: MediaId,
    },
    /// Move a clip in time
    MoveClip {
        /// Clip to move
        clip_id: ClipId,
        /// New timeline position
        start_time: f64,
    },
    /// Move an audio clip to another lane
    MoveClipToLane {
        /// Clip to move
        clip_id: ClipId,
        /// Target audio lane
        lane_index: usize,
    },
    /// Cut a clip in two
    SplitClip {
        /// Clip to split
        clip_id: ClipId,
        /// Timeline time of the cut
        at: f64,
    },
    /// Remove a clip
    DeleteClip {
        /// Clip to remove
        clip_id: ClipId,
    },
    /// Change mute/volume/stabilization
    SetClipAttribute {
        /// Clip to change
        clip_id: ClipId,
        /// Attribute changes
        patch: ClipPatch,
    },
    /// Change in-point and length
    TrimClip {
        /// Clip to trim
        clip_id: ClipId,
        /// New media in-point
        offset: f64,
        /// New length
        duration: f64,
    },
    /// Change the selection
    Select(Option<ClipId>),
    /// Change the zoom
    SetZoom(f64),
    /// Move the playhead
    Seek(f64),
    /// Step back in history
    Undo,
    /// Step forward in history
    Redo,
}

impl EditorCommand {
    /// Label used for history entries and logs
    pub fn description(&self) -> &'static str {
        match self {
            EditorCommand::AddClip { .. } | EditorCommand::AddClipAutoPlaced { .. } => "Add clip",
            EditorCommand::MoveClip { .. } => "Move clip",
            EditorCommand::MoveClipToLane { .. } => "Move clip to lane",
            EditorCommand::SplitClip { .. } => "Split clip",
            EditorCommand::DeleteClip { .. } => "Delete clip",
            EditorCommand::SetClipAttribute { .. } => "Change clip",
            EditorCommand::TrimClip { .. } => "Trim clip",
            EditorCommand::Select(_) => "Select",
            EditorCommand::SetZoom(_) => "Zoom",
            EditorCommand::Seek(_) => "Seek",
            EditorCommand::Undo => "Undo",
            EditorCommand::Redo => "Redo",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serialization() {
        let command = EditorCommand::SetClipAttribute {
            clip_id: ClipId::new(),
            patch: ClipPatch::muted(true),
        };
        let json = serde_json::to_string(&command).unwrap();
        let loaded: EditorCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, command);
    }
}
