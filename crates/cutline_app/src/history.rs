// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history over timeline snapshots.
//!
//! Snapshots are taken before a mutation and stored serialized, so every
//! entry is a deep, independent copy. Identical consecutive snapshots are
//! stored once.

use cutline_sequencer::TimelineSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Default undo history depth
pub const MAX_HISTORY: usize = 50;

/// History errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// History tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum undo depth; the oldest entries are dropped beyond it
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_HISTORY,
        }
    }
}

/// Serialized timeline state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Serialized snapshot
    pub data: Vec<u8>,
    /// Timestamp when snapshot was taken
    pub timestamp: u64,
    /// What the following mutation was
    pub description: String,
}

impl StateSnapshot {
    /// Serialize a timeline snapshot
    pub fn capture(value: &TimelineSnapshot, description: &str) -> Result<Self> {
        Ok(Self {
            data: bincode::serialize(value)?,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            description: description.to_string(),
        })
    }

    /// Deserialize back into a timeline snapshot
    pub fn restore(&self) -> Result<TimelineSnapshot> {
        Ok(bincode::deserialize(&self.data)?)
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// History statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Entries in the undo stack
    pub undo_count: usize,
    /// Entries in the redo stack
    pub redo_count: usize,
    /// Total memory used by history (bytes)
    pub memory_used: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct HistoryManager {
    undo_stack: VecDeque<StateSnapshot>,
    redo_stack: VecDeque<StateSnapshot>,
    max_depth: usize,
}

impl HistoryManager {
    /// Create a history with the default depth
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record the state before a mutation. Returns false when it equals the
    /// top of the undo stack and was discarded.
    pub fn save(&mut self, current: &TimelineSnapshot, description: &str) -> Result<bool> {
        let snapshot = StateSnapshot::capture(current, description)?;
        if self.undo_stack.back().is_some_and(|top| top.data == snapshot.data) {
            return Ok(false);
        }

        self.redo_stack.clear();
        self.push_undo(snapshot);
        tracing::trace!(description, depth = self.undo_stack.len(), "History saved");
        Ok(true)
    }

    /// Step back: `current` moves to the redo stack and the previous state is returned
    pub fn undo(&mut self, current: &TimelineSnapshot) -> Result<TimelineSnapshot> {
        let previous = self.undo_stack.back().ok_or(HistoryError::NothingToUndo)?;
        let restored = previous.restore()?;
        let description = previous.description.clone();
        let current = StateSnapshot::capture(current, &description)?;

        self.undo_stack.pop_back();
        self.redo_stack.push_back(current);
        tracing::debug!(description, "Undo");
        Ok(restored)
    }

    /// Step forward: `current` moves to the undo stack and the next state is returned
    pub fn redo(&mut self, current: &TimelineSnapshot) -> Result<TimelineSnapshot> {
        let next = self.redo_stack.back().ok_or(HistoryError::NothingToRedo)?;
        let restored = next.restore()?;
        let description = next.description.clone();
        let current = StateSnapshot::capture(current, &description)?;

        self.redo_stack.pop_back();
        self.push_undo(current);
        tracing::debug!(description, "Redo");
        Ok(restored)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            memory_used: self
                .undo_stack
                .iter()
                .chain(self.redo_stack.iter())
                .map(StateSnapshot::size)
                .sum(),
            max_depth: self.max_depth,
        }
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|s| s.description.as_str())
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|s| s.description.as_str())
    }

    fn push_undo(&mut self, snapshot: StateSnapshot) {
        self.undo_stack.push_back(snapshot);
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}
