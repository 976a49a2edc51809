// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor configuration and project files.
//!
//! This module manages:
//! - `EditorConfig`, tuning for every subsystem, stored as RON
//! - `ProjectFile`, the media list plus the timeline snapshot, stored as JSON

use crate::history::HistoryConfig;
use cutline_analysis::{SilenceConfig, ThumbnailConfig, WaveformConfig};
use cutline_sequencer::{MediaItem, SyncConfig, TimelineConfig, TimelineSnapshot};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Current project file format version
pub const PROJECT_FORMAT_VERSION: u32 = 1;

/// Project and configuration I/O errors
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration
    #[error("Config parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// Configuration could not be written
    #[error("Config write error: {0}")]
    RonWrite(#[from] ron::Error),

    /// Malformed project file
    #[error("Project parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Written by a newer editor
    #[error("Project version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },
}

/// Tuning for every editor subsystem
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Lanes, split guard and zoom range
    pub timeline: TimelineConfig,
    /// Undo depth
    pub history: HistoryConfig,
    /// Clock adoption and drift
    pub playback: SyncConfig,
    /// Capture queue and cache keys
    pub thumbnails: ThumbnailConfig,
    /// Peak buffer resolution
    pub waveform: WaveformConfig,
    /// Speech segmentation
    pub silence: SilenceConfig,
}

impl EditorConfig {
    /// Load from a RON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(ron::from_str(&content)?)
    }

    /// Save as pretty RON
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Saved editing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// File format version
    pub version: u32,
    /// Imported media, in import order
    #[serde(default)]
    pub media: Vec<MediaItem>,
    /// Timeline content
    pub timeline: TimelineSnapshot,
}

impl ProjectFile {
    /// Bundle media and timeline at the current format version
    pub fn new(media: Vec<MediaItem>, timeline: TimelineSnapshot) -> Self {
        Self {
            version: PROJECT_FORMAT_VERSION,
            media,
            timeline,
        }
    }

    /// Parse from JSON text
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        let project: ProjectFile = serde_json::from_str(json)?;

        // Version check
        if project.version > PROJECT_FORMAT_VERSION {
            return Err(ProjectError::UnsupportedVersion {
                found: project.version,
                supported: PROJECT_FORMAT_VERSION,
            });
        }
        Ok(project)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a project file
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save a project file
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        std::fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), "Saved project");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_sequencer::{MediaId, MediaKind, Timeline};

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.timeline.audio_lanes, 2);
        assert_eq!(config.history.max_depth, 50);
        assert_eq!(config.thumbnails.queue_bound, 40);
        assert!((config.playback.adopt_window - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_serialization() {
        let mut config = EditorConfig::default();
        config.silence.padding = 0.1;
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let loaded: EditorConfig = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let loaded: EditorConfig = ron::from_str("(history: (max_depth: 10))").unwrap();
        assert_eq!(loaded.history.max_depth, 10);
        assert_eq!(loaded.timeline, TimelineConfig::default());
    }

    #[test]
    fn test_missing_config_file_is_default() {
        let path = std::env::temp_dir().join("cutline-missing-config-test.ron");
        let _ = std::fs::remove_file(&path);
        assert_eq!(EditorConfig::load(&path).unwrap(), EditorConfig::default());
    }

    #[test]
    fn test_project_roundtrip_and_version() {
        let media = MediaItem {
            id: MediaId::new(),
            kind: MediaKind::Audio,
            source_handle: "voice.wav".to_string(),
            duration_seconds: 3.0,
            width: None,
            height: None,
        };
        let mut timeline = Timeline::default();
        timeline.add_clip(&media, 1.0);
        let project = ProjectFile::new(vec![media], timeline.snapshot());

        let json = project.to_json().unwrap();
        assert_eq!(ProjectFile::from_json(&json).unwrap(), project);

        let mut future = project.clone();
        future.version = PROJECT_FORMAT_VERSION + 1;
        let json = future.to_json().unwrap();
        assert!(matches!(
            ProjectFile::from_json(&json),
            Err(ProjectError::UnsupportedVersion { .. })
        ));
    }
}
