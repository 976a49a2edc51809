// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cutline editor core.
//!
//! The owned editing context and everything around it:
//! - `EditorState` with command methods and change notifications
//! - Snapshot-based undo/redo history
//! - RON configuration and JSON project files
//! - `EditorSession`, the per-frame loop over playback and analysis
//!
//! ## Architecture
//!
//! Presentation code holds an [`EditorSession`], sends [`EditorCommand`]s
//! and listens for [`EditorEvent`]s. The core never calls back into it.

pub mod commands;
pub mod events;
pub mod history;
pub mod project;
pub mod session;
pub mod state;

pub use commands::EditorCommand;
pub use events::{EditorEvent, EventBus, Notice, NoticeLevel};
pub use history::{HistoryConfig, HistoryError, HistoryManager, HistoryStats};
pub use project::{EditorConfig, ProjectError, ProjectFile, PROJECT_FORMAT_VERSION};
pub use session::{EditorSession, SessionTick};
pub use state::EditorState;
