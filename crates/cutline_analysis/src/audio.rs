// SPDX-License-Identifier: MIT OR Apache-2.0
//! Decoded audio buffers and the decoder seam.

/// PCM samples, one vector per channel, all at `sample_rate`
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Frames per second
    pub sample_rate: u32,
    /// Samples per channel (equal lengths)
    pub channels: Vec<Vec<f32>>,
}

impl DecodedAudio {
    /// Create a buffer from channel data
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Single channel buffer
    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self::new(sample_rate, vec![samples])
    }

    /// Frames in the shortest channel
    pub fn frame_count(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / f64::from(self.sample_rate)
    }

    /// Frame index for a time, clamped to the buffer
    pub fn frame_at(&self, time: f64) -> usize {
        if !time.is_finite() || time <= 0.0 {
            return 0;
        }
        ((time * f64::from(self.sample_rate)) as usize).min(self.frame_count())
    }

    /// Largest absolute sample across channels in `start..end` frames
    pub fn peak(&self, start: usize, end: usize) -> f32 {
        let end = end.min(self.frame_count());
        if start >= end {
            return 0.0;
        }
        self.channels
            .iter()
            .flat_map(|channel| channel[start..end].iter())
            .fold(0.0f32, |peak, sample| peak.max(sample.abs()))
    }
}

/// Decode failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// Locator did not resolve
    #[error("Audio source not found: {0}")]
    NotFound(String),
    /// No decodable audio stream
    #[error("Unsupported audio: {0}")]
    Unsupported(String),
    /// Stream is damaged
    #[error("Failed to decode audio: {0}")]
    Corrupt(String),
}

/// Turns a media locator into PCM samples
pub trait AudioDecoder: Send + Sync {
    /// Decode the full audio stream behind `locator`
    fn decode(&self, locator: &str) -> Result<DecodedAudio, DecodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_across_channels() {
        let audio = DecodedAudio::new(4, vec![vec![0.1, -0.5, 0.2, 0.0], vec![0.3, 0.1, -0.9, 0.0]]);
        assert_eq!(audio.frame_count(), 4);
        assert!((audio.duration() - 1.0).abs() < 1e-9);
        assert_eq!(audio.peak(0, 2), 0.5);
        assert_eq!(audio.peak(2, 10), 0.9);
        assert_eq!(audio.peak(3, 2), 0.0);
        assert_eq!(audio.frame_at(0.5), 2);
        assert_eq!(audio.frame_at(-1.0), 0);
    }
}
