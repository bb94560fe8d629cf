pub mod backend;
pub mod boost;
pub mod merge;
pub mod silence;
pub mod trim;

pub use backend::{AudioBackend, WavBackend};
pub use boost::{boost_clip, boost_directory};
pub use merge::{merge_directory, MergeSummary};
pub use silence::{detect_nonsilent, SilenceParams, MIN_SILENCE_RUN};
pub use trim::{trim_clip, trim_directory, TrimConfig};

use std::time::Duration;

/// Decoded audio: interleaved 16-bit samples with a known layout.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioClip {
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A contiguous span of audio louder than the silence threshold.
///
/// Spans for one clip are ordered by start time and never overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonSilentSpan {
    pub start: Duration,
    pub end: Duration,
}

impl NonSilentSpan {
    pub fn duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }
}
