// SPDX-License-Identifier: MIT OR Apache-2.0
//! Imported media descriptors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an imported media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MediaId(pub Uuid);

impl MediaId {
    /// Create a new random media ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MediaId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of media (and of the clips referencing it)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Picture (with or without an audio stream)
    Video,
    /// Audio only
    Audio,
}

impl MediaKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Audio => "Audio",
        }
    }
}

/// Metadata returned by the import collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Detected kind
    pub kind: MediaKind,
    /// Decoded duration in seconds
    pub duration: f64,
    /// Frame width for video
    pub width: Option<u32>,
    /// Frame height for video
    pub height: Option<u32>,
}

/// Import failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImportError {
    /// The file could not be read
    #[error("Unreadable media: {0}")]
    Unreadable(String),
    /// The container or codec is not supported
    #[error("Unsupported media: {0}")]
    Unsupported(String),
    /// The probe reported a duration we cannot place on a timeline
    #[error("Invalid duration {duration} for {handle}")]
    InvalidDuration {
        /// Source handle that was probed
        handle: String,
        /// Reported duration
        duration: f64,
    },
}

/// Metadata decoder for user supplied files
pub trait MediaProbe {
    /// Decode the metadata of the media behind `handle`
    fn probe(&self, handle: &str) -> Result<MediaInfo, ImportError>;
}

/// An imported media item. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Unique media ID
    pub id: MediaId,
    /// Media kind
    pub kind: MediaKind,
    /// Locator used by decoders and sinks
    pub source_handle: String,
    /// Duration in seconds
    pub duration_seconds: f64,
    /// Frame width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Frame height
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Catalog of imported media, in import order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaCatalog {
    items: IndexMap<MediaId, MediaItem>,
}

impl MediaCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe `handle` and register the media on success
    pub fn import(&mut self, handle: &str, probe: &dyn MediaProbe) -> Result<MediaId, ImportError> {
        let info = match probe.probe(handle) {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(handle, error = %e, "Import failed");
                return Err(e);
            }
        };

        if !info.duration.is_finite() || info.duration <= 0.0 {
            tracing::warn!(handle, duration = info.duration, "Import rejected");
            return Err(ImportError::InvalidDuration {
                handle: handle.to_string(),
                duration: info.duration,
            });
        }

        let item = MediaItem {
            id: MediaId::new(),
            kind: info.kind,
            source_handle: handle.to_string(),
            duration_seconds: info.duration,
            width: info.width,
            height: info.height,
        };
        let id = item.id;
        tracing::info!(%id, handle, kind = info.kind.name(), duration = info.duration, "Imported media");
        self.items.insert(id, item);
        Ok(id)
    }

    /// Register an already described item (used when loading projects)
    pub fn insert(&mut self, item: MediaItem) -> MediaId {
        let id = item.id;
        self.items.insert(id, item);
        id
    }

    /// Get a media item
    pub fn get(&self, id: MediaId) -> Option<&MediaItem> {
        self.items.get(&id)
    }

    /// Check whether the catalog knows `id`
    pub fn contains(&self, id: MediaId) -> bool {
        self.items.contains_key(&id)
    }

    /// Duration lookup, `None` for dangling ids
    pub fn duration_of(&self, id: MediaId) -> Option<f64> {
        self.items.get(&id).map(|m| m.duration_seconds)
    }

    /// Iterate over all items in import order
    pub fn iter(&self) -> impl Iterator<Item = &MediaItem> {
        self.items.values()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
