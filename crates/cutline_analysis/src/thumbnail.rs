// SPDX-License-Identifier: MIT OR Apache-2.0
//! Thumbnail capture pipeline.
//!
//! A single [`CaptureSink`] is shared by every thumbnail request. The
//! pipeline owns it and is its only user: tasks wait in a bounded FIFO and
//! run one at a time. Each capture holds exactly one completion ticket,
//! released on completion, error or timeout before the next task starts.
//! Nothing is captured while playback is running.

use cutline_sequencer::{MediaId, MediaItem};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Thumbnail tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Time quantization of cache keys, in seconds
    pub step: f64,
    /// Maximum queued tasks; the oldest are dropped beyond it
    pub queue_bound: usize,
    /// Seconds to wait for a capture before giving up
    pub capture_timeout: f64,
    /// Thumbnail width in pixels
    pub width: u32,
    /// Thumbnail height in pixels
    pub height: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            step: 0.25,
            queue_bound: 40,
            capture_timeout: 2.0,
            width: 160,
            height: 90,
        }
    }
}

impl ThumbnailConfig {
    fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.capture_timeout).unwrap_or(Duration::from_secs(2))
    }
}

/// Cache key: media plus quantized time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThumbnailKey {
    /// Media the frame comes from
    pub media_id: MediaId,
    /// Time slot, `round(time / step)`
    pub slot: u64,
}

impl ThumbnailKey {
    /// Quantize `time` into a key
    pub fn new(media_id: MediaId, time: f64, step: f64) -> Self {
        let step = if step.is_finite() && step > 0.0 { step } else { 0.25 };
        let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        Self {
            media_id,
            slot: (time / step).round() as u64,
        }
    }

    /// Representative time of the slot
    pub fn time(&self, step: f64) -> f64 {
        self.slot as f64 * step
    }
}

/// Display element waiting for a thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub u64);

/// Queued capture work
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailTask {
    /// Locator handed to the capture sink
    pub media_url: String,
    /// Quantized media time to capture
    pub time: f64,
    /// Element to notify
    pub target: TargetHandle,
    /// Cache slot to fill
    pub key: ThumbnailKey,
}

/// Identifies one positioning request on the capture sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureTicket(pub u64);

/// Result of asking the sink to position itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Positioning {
    /// Already at the requested frame; grab immediately
    Ready,
    /// A completion event will follow for the ticket
    Pending,
}

/// Completion signal for a positioning request
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureEvent {
    /// Request the event belongs to
    pub ticket: CaptureTicket,
    /// Whether the sink reached the frame
    pub result: Result<(), CaptureError>,
}

/// Capture failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaptureError {
    /// Source could not be opened
    #[error("Cannot open capture source: {0}")]
    Source(String),
    /// Seeking or decoding the frame failed
    #[error("Frame capture failed: {0}")]
    Frame(String),
}

/// The shared frame-capture resource
pub trait CaptureSink {
    /// Position on `time` of `locator`; a pending request later yields
    /// exactly one event carrying `ticket`
    fn position(
        &mut self,
        ticket: CaptureTicket,
        locator: &str,
        time: f64,
    ) -> Result<Positioning, CaptureError>;
    /// Drain completion events
    fn poll_events(&mut self) -> Vec<CaptureEvent>;
    /// Drop interest in a request (its event, if any, is never delivered)
    fn cancel(&mut self, ticket: CaptureTicket);
    /// Grab the frame the sink is positioned on
    fn grab(&mut self) -> Result<RgbaImage, CaptureError>;
}

/// Answer to a thumbnail lookup
#[derive(Debug, Clone)]
pub enum ThumbnailLookup {
    /// Cached image
    Ready(Arc<RgbaImage>),
    /// Capture queued or in flight
    Pending,
}

/// Work done by one [`ThumbnailPipeline::pump`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PumpReport {
    /// Thumbnails that became available, with the element that asked
    pub captured: Vec<(TargetHandle, ThumbnailKey)>,
    /// Captures that failed
    pub failed: usize,
    /// Captures abandoned after the timeout
    pub timed_out: usize,
}

struct InFlight {
    ticket: CaptureTicket,
    task: ThumbnailTask,
    started: Instant,
}

/// Bounded, single-consumer capture queue with an image cache
pub struct ThumbnailPipeline {
    sink: Box<dyn CaptureSink>,
    config: ThumbnailConfig,
    queue: VecDeque<ThumbnailTask>,
    queued: HashSet<ThumbnailKey>,
    in_flight: Option<InFlight>,
    next_ticket: u64,
    cache: HashMap<ThumbnailKey, Arc<RgbaImage>>,
    waiting: HashMap<ThumbnailKey, Vec<TargetHandle>>,
    dropped: usize,
}

impl ThumbnailPipeline {
    /// Create a pipeline owning `sink`
    pub fn new(sink: Box<dyn CaptureSink>, config: ThumbnailConfig) -> Self {
        Self {
            sink,
            config,
            queue: VecDeque::new(),
            queued: HashSet::new(),
            in_flight: None,
            next_ticket: 0,
            cache: HashMap::new(),
            waiting: HashMap::new(),
            dropped: 0,
        }
    }

    /// Configuration in effect
    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    /// Key for a media time under the current quantization
    pub fn key_for(&self, media_id: MediaId, time: f64) -> ThumbnailKey {
        ThumbnailKey::new(media_id, time, self.config.step)
    }

    /// Cached image for a key
    pub fn get(&self, key: &ThumbnailKey) -> Option<Arc<RgbaImage>> {
        self.cache.get(key).cloned()
    }

    /// Look up a thumbnail, queueing a capture on a miss
    pub fn request(&mut self, media: &MediaItem, time: f64, target: TargetHandle) -> ThumbnailLookup {
        let key = self.key_for(media.id, time);
        if let Some(image) = self.cache.get(&key) {
            return ThumbnailLookup::Ready(image.clone());
        }

        let waiting = self.waiting.entry(key).or_default();
        if !waiting.contains(&target) {
            waiting.push(target);
        }

        let in_flight = self.in_flight.as_ref().is_some_and(|f| f.task.key == key);
        if in_flight || self.queued.contains(&key) {
            return ThumbnailLookup::Pending;
        }

        while self.queue.len() >= self.config.queue_bound.max(1) {
            let Some(stale) = self.queue.pop_front() else {
                break;
            };
            tracing::debug!(media = %stale.key.media_id, slot = stale.key.slot, "Dropping stale thumbnail task");
            self.queued.remove(&stale.key);
            self.waiting.remove(&stale.key);
            self.dropped += 1;
        }

        self.queued.insert(key);
        self.queue.push_back(ThumbnailTask {
            media_url: media.source_handle.clone(),
            time: key.time(self.config.step),
            target,
            key,
        });
        ThumbnailLookup::Pending
    }

    /// Advance the pipeline: settle the in-flight capture, then start queued
    /// work unless playback is running
    pub fn pump(&mut self, now: Instant, is_playing: bool) -> PumpReport {
        let mut report = PumpReport::default();

        for event in self.sink.poll_events() {
            let matches = self.in_flight.as_ref().is_some_and(|f| f.ticket == event.ticket);
            if !matches {
                tracing::debug!(ticket = event.ticket.0, "Ignoring stale capture event");
                continue;
            }
            if let Some(flight) = self.in_flight.take() {
                match event.result {
                    Ok(()) => self.grab(flight.task, &mut report),
                    Err(e) => self.fail(&flight.task, &e, &mut report),
                }
            }
        }

        if let Some(flight) = &self.in_flight {
            if now.saturating_duration_since(flight.started) >= self.config.timeout() {
                let ticket = flight.ticket;
                if let Some(flight) = self.in_flight.take() {
                    tracing::warn!(url = %flight.task.media_url, time = flight.task.time, "Thumbnail capture timed out");
                    self.sink.cancel(ticket);
                    self.waiting.remove(&flight.task.key);
                    report.timed_out += 1;
                }
            }
        }

        if is_playing {
            return report;
        }

        while self.in_flight.is_none() {
            let Some(task) = self.queue.pop_front() else {
                break;
            };
            self.queued.remove(&task.key);
            if self.cache.contains_key(&task.key) {
                continue;
            }

            let ticket = CaptureTicket(self.next_ticket);
            self.next_ticket += 1;
            match self.sink.position(ticket, &task.media_url, task.time) {
                Ok(Positioning::Ready) => self.grab(task, &mut report),
                Ok(Positioning::Pending) => {
                    self.in_flight = Some(InFlight {
                        ticket,
                        task,
                        started: now,
                    });
                }
                Err(e) => self.fail(&task, &e, &mut report),
            }
        }

        report
    }

    /// Completion tickets currently held (0 or 1)
    pub fn pending_listeners(&self) -> usize {
        usize::from(self.in_flight.is_some())
    }

    /// Queued tasks
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Tasks discarded because the queue was full
    pub fn dropped_count(&self) -> usize {
        self.dropped
    }

    /// Cached thumbnails
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn grab(&mut self, task: ThumbnailTask, report: &mut PumpReport) {
        match self.sink.grab() {
            Ok(frame) => {
                let image = self.fit(frame);
                self.cache.insert(task.key, Arc::new(image));
                let targets = self.waiting.remove(&task.key).unwrap_or_default();
                for target in targets {
                    report.captured.push((target, task.key));
                }
            }
            Err(e) => self.fail(&task, &e, report),
        }
    }

    fn fail(&mut self, task: &ThumbnailTask, error: &CaptureError, report: &mut PumpReport) {
        tracing::warn!(url = %task.media_url, time = task.time, error = %error, "Thumbnail capture failed");
        self.waiting.remove(&task.key);
        report.failed += 1;
    }

    fn fit(&self, frame: RgbaImage) -> RgbaImage {
        let (width, height) = (self.config.width.max(1), self.config.height.max(1));
        if frame.dimensions() == (width, height) {
            return frame;
        }
        image::imageops::resize(&frame, width, height, image::imageops::FilterType::Triangle)
    }
}
