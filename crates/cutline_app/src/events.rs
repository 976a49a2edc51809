// SPDX-License-Identifier: MIT OR Apache-2.0
//! Change notifications.
//!
//! The editor core never calls into presentation code. It publishes
//! [`EditorEvent`]s, and each subscriber drains its own channel.

use cutline_sequencer::{ClipId, PlaybackState};
use std::sync::mpsc::{self, Receiver, Sender};

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational
    Info,
    /// Something was skipped or failed
    Warning,
}

/// Message shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Text to display
    pub message: String,
}

impl Notice {
    /// Informational notice
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// Warning notice
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// Editor state change
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Clips or lanes changed
    TimelineChanged,
    /// Selection changed
    SelectionChanged(Option<ClipId>),
    /// Undo/redo availability changed
    HistoryChanged {
        /// What undo would revert, if anything
        undo: Option<String>,
        /// What redo would reapply, if anything
        redo: Option<String>,
    },
    /// Transport state changed
    PlaybackStateChanged(PlaybackState),
    /// User-visible message
    Notice(Notice),
}

/// Fan-out of editor events to channel subscribers
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<EditorEvent>>,
}

impl EventBus {
    /// Create a bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<EditorEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber
    pub fn emit(&mut self, event: EditorEvent) {
        tracing::trace!(?event, "Emit");
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers as of the last emit
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
