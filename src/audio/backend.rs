use std::path::Path;
use std::time::Duration;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::error::{Result, VoiceprepError};

use super::silence::{detect_nonsilent, SilenceParams};
use super::{AudioClip, NonSilentSpan};

/// Sample rate used when a clip has to be materialized out of thin air
/// (e.g. exporting a merge of zero inputs).
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// Capability set the audio pipeline is written against: load a recording,
/// find its voiced spans, cut it, glue clips together, write it back out.
///
/// The trimming, boosting, and merging algorithms only talk to this trait,
/// so they are reusable against any codec backend satisfying it.
pub trait AudioBackend {
    /// Decode an audio file into a clip.
    fn load(&self, path: &Path) -> Result<AudioClip>;

    /// Detect the non-silent spans of a clip.
    fn detect_nonsilent(&self, clip: &AudioClip, params: &SilenceParams) -> Vec<NonSilentSpan>;

    /// Cut the sub-range `[start, end)` out of a clip.
    fn slice(&self, clip: &AudioClip, start: Duration, end: Duration) -> AudioClip;

    /// Concatenate clips in order. All clips must share one layout.
    fn concat(&self, clips: &[AudioClip]) -> Result<AudioClip>;

    /// Encode a clip to a file, creating parent directories as needed.
    fn export(&self, clip: &AudioClip, path: &Path) -> Result<()>;
}

/// WAV-file backend built on hound.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavBackend;

impl WavBackend {
    fn frame_index(clip: &AudioClip, at: Duration) -> usize {
        let frame = (at.as_secs_f64() * clip.sample_rate as f64).round() as usize;
        frame.min(clip.frames())
    }
}

impl AudioBackend for WavBackend {
    fn load(&self, path: &Path) -> Result<AudioClip> {
        let reader = WavReader::open(path).map_err(|e| {
            VoiceprepError::Audio(format!("Failed to open WAV file {}: {e}", path.display()))
        })?;

        let spec = reader.spec();
        debug!(
            "Loading {}: {} Hz, {} channels, {} bits",
            path.display(),
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample
        );

        let samples: Vec<i16> = match spec.sample_format {
            SampleFormat::Int => reader
                .into_samples::<i16>()
                .map(|s| s.unwrap_or(0))
                .collect(),
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .map(|s| (s.unwrap_or(0.0) * i16::MAX as f32) as i16)
                .collect(),
        };

        Ok(AudioClip::new(samples, spec.sample_rate, spec.channels))
    }

    fn detect_nonsilent(&self, clip: &AudioClip, params: &SilenceParams) -> Vec<NonSilentSpan> {
        detect_nonsilent(clip, params)
    }

    fn slice(&self, clip: &AudioClip, start: Duration, end: Duration) -> AudioClip {
        let channels = clip.channels.max(1) as usize;
        let from = Self::frame_index(clip, start) * channels;
        let to = Self::frame_index(clip, end) * channels;
        let samples = if from < to {
            clip.samples[from..to].to_vec()
        } else {
            Vec::new()
        };
        AudioClip::new(samples, clip.sample_rate, clip.channels)
    }

    fn concat(&self, clips: &[AudioClip]) -> Result<AudioClip> {
        let Some(first) = clips.first() else {
            return Ok(AudioClip::new(Vec::new(), DEFAULT_SAMPLE_RATE, 1));
        };

        let mut samples = Vec::with_capacity(clips.iter().map(|c| c.samples.len()).sum());
        for clip in clips {
            if clip.sample_rate != first.sample_rate || clip.channels != first.channels {
                return Err(VoiceprepError::Audio(format!(
                    "Cannot concatenate clips with mismatched layouts: \
                     {} Hz/{}ch vs {} Hz/{}ch",
                    first.sample_rate, first.channels, clip.sample_rate, clip.channels
                )));
            }
            samples.extend_from_slice(&clip.samples);
        }

        Ok(AudioClip::new(samples, first.sample_rate, first.channels))
    }

    fn export(&self, clip: &AudioClip, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let spec = WavSpec {
            channels: clip.channels.max(1),
            sample_rate: if clip.sample_rate == 0 {
                DEFAULT_SAMPLE_RATE
            } else {
                clip.sample_rate
            },
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, spec).map_err(|e| {
            VoiceprepError::Audio(format!("Failed to create WAV file {}: {e}", path.display()))
        })?;
        for &sample in &clip.samples {
            writer.write_sample(sample).map_err(|e| {
                VoiceprepError::Audio(format!("Failed to write {}: {e}", path.display()))
            })?;
        }
        writer.finalize().map_err(|e| {
            VoiceprepError::Audio(format!("Failed to finalize {}: {e}", path.display()))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(ms: usize, amp: i16) -> AudioClip {
        AudioClip::new(vec![amp; 16 * ms], 16000, 1)
    }

    #[test]
    fn test_slice_bounds() {
        let clip = tone(1000, 100);
        let backend = WavBackend;

        let middle = backend.slice(&clip, Duration::from_millis(250), Duration::from_millis(750));
        assert_eq!(middle.frames(), 8000);

        // End past the clip is clamped.
        let tail = backend.slice(&clip, Duration::from_millis(900), Duration::from_secs(5));
        assert_eq!(tail.frames(), 1600);

        // Inverted range yields an empty clip.
        let empty = backend.slice(&clip, Duration::from_millis(700), Duration::from_millis(300));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_concat_preserves_order_and_length() {
        let backend = WavBackend;
        let a = tone(100, 1);
        let b = tone(200, 2);
        let merged = backend.concat(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(merged.frames(), a.frames() + b.frames());
        assert_eq!(merged.samples[0], 1);
        assert_eq!(merged.samples[merged.samples.len() - 1], 2);
    }

    #[test]
    fn test_concat_rejects_mismatched_layouts() {
        let backend = WavBackend;
        let a = tone(100, 1);
        let b = AudioClip::new(vec![2; 100], 44100, 1);
        assert!(backend.concat(&[a, b]).is_err());
    }

    #[test]
    fn test_concat_empty_is_empty_clip() {
        let backend = WavBackend;
        let merged = backend.concat(&[]).unwrap();
        assert!(merged.is_empty());
        assert_eq!(merged.sample_rate, DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_export_and_load_round_trip() {
        let backend = WavBackend;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("clip.wav");

        let clip = tone(100, 1234);
        backend.export(&clip, &path).unwrap();

        let loaded = backend.load(&path).unwrap();
        assert_eq!(loaded, clip);
    }
}
