// SPDX-License-Identifier: MIT OR Apache-2.0
//! Waveform peak cache.
//!
//! The first request for a media item queues a full decode on a worker
//! thread. The decoded samples are reduced once into a peak buffer that
//! lives for the session; rendering then buckets that buffer per pixel
//! column. Decode failures are logged and the waveform is omitted.

use crate::audio::{AudioDecoder, DecodeError, DecodedAudio};
use cutline_sequencer::{MediaId, MediaItem};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Waveform tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    /// Resolution of the cached peak buffer
    pub peaks_per_second: u32,
    /// Most peaks scanned per pixel column before sub-sampling
    pub max_bucket_scan: usize,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            peaks_per_second: 1000,
            max_bucket_scan: 64,
        }
    }
}

/// Max-amplitude envelope of a decoded stream
#[derive(Debug, Clone, PartialEq)]
pub struct PeakBuffer {
    /// Peaks per second
    pub rate: u32,
    /// One max absolute amplitude per block
    pub peaks: Vec<f32>,
}

impl PeakBuffer {
    /// Reduce decoded audio to `rate` peaks per second
    pub fn from_audio(audio: &DecodedAudio, rate: u32) -> Self {
        let rate = rate.clamp(1, audio.sample_rate.max(1));
        let block = (audio.sample_rate / rate).max(1) as usize;
        let frames = audio.frame_count();
        let peaks = (0..frames)
            .step_by(block)
            .map(|start| audio.peak(start, start + block))
            .collect();
        Self {
            rate: (audio.sample_rate as usize / block) as u32,
            peaks,
        }
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.peaks.len() as f64 / f64::from(self.rate.max(1))
    }

    /// One max amplitude per column over `offset..offset + duration` seconds
    pub fn columns(&self, offset: f64, duration: f64, columns: usize, max_scan: usize) -> Vec<f32> {
        if columns == 0 || !duration.is_finite() || duration <= 0.0 || self.peaks.is_empty() {
            return vec![0.0; columns];
        }
        let offset = if offset.is_finite() { offset.max(0.0) } else { 0.0 };
        let rate = f64::from(self.rate);
        let per_column = duration / columns as f64;
        let last = self.peaks.len();

        (0..columns)
            .map(|column| {
                let from = offset + column as f64 * per_column;
                let start = ((from * rate) as usize).min(last);
                let end = (((from + per_column) * rate).ceil() as usize).clamp(start, last);
                if start == end {
                    return self.peaks.get(start).copied().unwrap_or(0.0);
                }
                let stride = ((end - start) / max_scan.max(1)).max(1);
                self.peaks[start..end]
                    .iter()
                    .step_by(stride)
                    .fold(0.0f32, |peak, value| peak.max(*value))
            })
            .collect()
    }
}

/// Waveform availability for a media item
#[derive(Debug, Clone)]
pub enum WaveformState {
    /// Decode queued or running
    Loading,
    /// Peaks available
    Ready(Arc<PeakBuffer>),
    /// Decoding failed; no waveform is drawn
    Failed(String),
}

struct WaveformRequest {
    media_id: MediaId,
    locator: String,
    rate: u32,
}

type WaveformResult = (MediaId, Result<PeakBuffer, DecodeError>);

/// Session cache of waveform peaks, filled by a background decoder
pub struct WaveformCache {
    states: Arc<RwLock<HashMap<MediaId, WaveformState>>>,
    request_tx: mpsc::UnboundedSender<WaveformRequest>,
    result_rx: mpsc::UnboundedReceiver<WaveformResult>,
    config: WaveformConfig,
}

impl WaveformCache {
    /// Create a cache and spawn its decode worker
    pub fn new(decoder: Arc<dyn AudioDecoder>, config: WaveformConfig) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = mpsc::unbounded_channel();

        std::thread::spawn(move || {
            waveform_worker(decoder, request_rx, result_tx);
        });

        Self {
            states: Arc::new(RwLock::new(HashMap::new())),
            request_tx,
            result_rx,
            config,
        }
    }

    /// Request the waveform of a media item, queueing a decode on first use
    pub fn request(&self, media: &MediaItem) -> WaveformState {
        let mut states = self.states.write();
        if let Some(state) = states.get(&media.id) {
            return state.clone();
        }

        let request = WaveformRequest {
            media_id: media.id,
            locator: media.source_handle.clone(),
            rate: self.config.peaks_per_second,
        };
        let state = if self.request_tx.send(request).is_ok() {
            tracing::debug!(media = %media.id, "Queued waveform decode");
            WaveformState::Loading
        } else {
            tracing::warn!(media = %media.id, "Waveform worker is gone");
            WaveformState::Failed("decoder unavailable".to_string())
        };
        states.insert(media.id, state.clone());
        state
    }

    /// Collect finished decodes. Returns the number of entries that changed.
    pub fn update(&mut self) -> usize {
        let mut changed = 0;
        while let Ok((media_id, result)) = self.result_rx.try_recv() {
            let state = match result {
                Ok(peaks) => WaveformState::Ready(Arc::new(peaks)),
                Err(e) => {
                    tracing::warn!(media = %media_id, error = %e, "Waveform decode failed");
                    WaveformState::Failed(e.to_string())
                }
            };
            self.states.write().insert(media_id, state);
            changed += 1;
        }
        changed
    }

    /// Current state, `None` if never requested
    pub fn state(&self, media_id: MediaId) -> Option<WaveformState> {
        self.states.read().get(&media_id).cloned()
    }

    /// Peaks if ready
    pub fn peaks(&self, media_id: MediaId) -> Option<Arc<PeakBuffer>> {
        match self.states.read().get(&media_id) {
            Some(WaveformState::Ready(peaks)) => Some(peaks.clone()),
            _ => None,
        }
    }

    /// Samples for a pixel window: one value per column, `None` until ready
    pub fn peaks_for_columns(
        &self,
        media_id: MediaId,
        offset: f64,
        duration: f64,
        columns: usize,
    ) -> Option<Vec<f32>> {
        self.peaks(media_id)
            .map(|peaks| peaks.columns(offset, duration, columns, self.config.max_bucket_scan))
    }

    /// Whether any decode is still outstanding
    pub fn is_loading(&self) -> bool {
        self.states
            .read()
            .values()
            .any(|state| matches!(state, WaveformState::Loading))
    }
}

/// Worker thread that decodes audio and reduces it to peaks
fn waveform_worker(
    decoder: Arc<dyn AudioDecoder>,
    mut request_rx: mpsc::UnboundedReceiver<WaveformRequest>,
    result_tx: mpsc::UnboundedSender<WaveformResult>,
) {
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create waveform runtime");
            return;
        }
    };

    rt.block_on(async {
        while let Some(request) = request_rx.recv().await {
            let decoder = decoder.clone();
            let locator = request.locator;
            let rate = request.rate;
            let result = tokio::task::spawn_blocking(move || {
                decoder
                    .decode(&locator)
                    .map(|audio| PeakBuffer::from_audio(&audio, rate))
            })
            .await
            .unwrap_or_else(|e| Err(DecodeError::Corrupt(e.to_string())));

            if result_tx.send((request.media_id, result)).is_err() {
                break;
            }
        }
    });
}
