// SPDX-License-Identifier: MIT OR Apache-2.0
//! Speech/silence segmentation.
//!
//! Pure function over a decoded buffer. The threshold is relative to the
//! loudest window in the analysed range, so quiet recordings still split.

use crate::audio::{DecodeError, DecodedAudio};
use cutline_sequencer::ClipId;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Segmentation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceConfig {
    /// Fraction of the window peak below which audio counts as silence
    pub threshold_ratio: f32,
    /// Scan window length in milliseconds
    pub window_ms: u32,
    /// Gaps shorter than this (seconds) are bridged
    pub min_silence: f64,
    /// Seconds of context kept around speech
    pub padding: f64,
    /// Speech shorter than this (seconds) is discarded
    pub min_speech: f64,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            threshold_ratio: 0.08,
            window_ms: 20,
            min_silence: 0.3,
            padding: 0.25,
            min_speech: 0.1,
        }
    }
}

/// A retained `[start, end)` range in media seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechSegment {
    /// Start in media seconds
    pub start: f64,
    /// End in media seconds (exclusive)
    pub end: f64,
}

impl SpeechSegment {
    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// As a range of media time
    pub fn range(&self) -> Range<f64> {
        self.start..self.end
    }
}

/// Silence removal failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SilenceError {
    /// Nothing above the threshold; the clip is left as is
    #[error("No speech detected")]
    NoSpeechDetected,
    /// The clip to process does not exist
    #[error("Clip not found: {0}")]
    ClipNotFound(ClipId),
    /// The clip's audio could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Find speech in `offset..offset + duration` seconds of `audio`
pub fn detect_speech(
    audio: &DecodedAudio,
    offset: f64,
    duration: f64,
    config: &SilenceConfig,
) -> Result<Vec<SpeechSegment>, SilenceError> {
    let rate = f64::from(audio.sample_rate.max(1));
    let first = audio.frame_at(offset);
    let last = audio.frame_at(offset + duration);
    if first >= last {
        return Err(SilenceError::NoSpeechDetected);
    }
    let window = ((f64::from(config.window_ms) / 1000.0 * rate) as usize).max(1);

    let peaks: Vec<(usize, usize, f32)> = (first..last)
        .step_by(window)
        .map(|start| {
            let end = (start + window).min(last);
            (start, end, audio.peak(start, end))
        })
        .collect();
    let loudest = peaks.iter().fold(0.0f32, |max, (_, _, p)| max.max(*p));
    if loudest <= 0.0 {
        return Err(SilenceError::NoSpeechDetected);
    }
    let threshold = loudest * config.threshold_ratio.clamp(0.0, 1.0);

    // Raw runs of loud windows
    let mut runs: Vec<SpeechSegment> = Vec::new();
    for (start, end, peak) in peaks {
        if peak < threshold || peak <= 0.0 {
            continue;
        }
        let (start, end) = (start as f64 / rate, end as f64 / rate);
        match runs.last_mut() {
            Some(run) if start - run.end < config.min_silence => run.end = end,
            _ => runs.push(SpeechSegment { start, end }),
        }
    }

    let lower = first as f64 / rate;
    let upper = last as f64 / rate;
    let mut segments: Vec<SpeechSegment> = Vec::new();
    for run in runs.into_iter().filter(|r| r.duration() >= config.min_speech) {
        let padded = SpeechSegment {
            start: (run.start - config.padding).max(lower),
            end: (run.end + config.padding).min(upper),
        };
        match segments.last_mut() {
            Some(previous) if padded.start <= previous.end => {
                previous.end = previous.end.max(padded.end);
            }
            _ => segments.push(padded),
        }
    }

    if segments.is_empty() {
        return Err(SilenceError::NoSpeechDetected);
    }
    tracing::debug!(segments = segments.len(), threshold, "Detected speech");
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1 kHz mono buffer with `level` inside the given second ranges
    fn buffer(length: f64, loud: &[(f64, f64)], level: f32) -> DecodedAudio {
        let frames = (length * 1000.0) as usize;
        let samples = (0..frames)
            .map(|i| {
                let t = i as f64 / 1000.0;
                if loud.iter().any(|(a, b)| *a <= t && t < *b) {
                    if i % 2 == 0 {
                        level
                    } else {
                        -level
                    }
                } else {
                    0.0
                }
            })
            .collect();
        DecodedAudio::mono(1000, samples)
    }

    #[test]
    fn test_bridges_short_gaps_and_drops_blips() {
        let audio = buffer(6.0, &[(1.0, 2.0), (2.2, 3.0), (5.0, 5.05)], 0.5);
        let segments = detect_speech(&audio, 0.0, 6.0, &SilenceConfig::default()).unwrap();
        assert_eq!(segments.len(), 1);
        assert!((segments[0].start - 0.75).abs() < 1e-9);
        assert!((segments[0].end - 3.25).abs() < 1e-9);
    }

    #[test]
    fn test_padding_clamped_to_window() {
        let audio = buffer(6.0, &[(1.0, 3.0)], 0.5);
        let segments = detect_speech(&audio, 0.9, 2.2, &SilenceConfig::default()).unwrap();
        assert_eq!(segments.len(), 1);
        assert!((segments[0].start - 0.9).abs() < 1e-9);
        assert!((segments[0].end - 3.1).abs() < 1e-9);
    }

    #[test]
    fn test_segments_ordered_and_disjoint() {
        let audio = buffer(10.0, &[(1.0, 2.0), (4.0, 5.0), (5.4, 6.0), (8.0, 9.0)], 0.3);
        let segments = detect_speech(&audio, 0.0, 10.0, &SilenceConfig::default()).unwrap();
        assert!(segments.windows(2).all(|w| w[0].end < w[1].start));
        let total: f64 = segments.iter().map(SpeechSegment::duration).sum();
        assert!(total <= 10.0);
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn test_relative_threshold() {
        // Quiet recording with a much quieter hum
        let mut audio = buffer(4.0, &[(1.0, 2.0)], 0.05);
        for sample in audio.channels[0].iter_mut().take(500) {
            *sample = 0.001;
        }
        let segments = detect_speech(&audio, 0.0, 4.0, &SilenceConfig::default()).unwrap();
        assert_eq!(segments.len(), 1);
        assert!((segments[0].start - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_all_silent() {
        let audio = buffer(3.0, &[], 0.5);
        assert_eq!(
            detect_speech(&audio, 0.0, 3.0, &SilenceConfig::default()),
            Err(SilenceError::NoSpeechDetected)
        );
        assert_eq!(
            detect_speech(&audio, 5.0, 1.0, &SilenceConfig::default()),
            Err(SilenceError::NoSpeechDetected)
        );
    }
}
