use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::corpus::list_recordings;
use crate::error::Result;

use super::backend::AudioBackend;
use super::silence::SilenceParams;
use super::AudioClip;

/// Outcome of a directory boost pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoostSummary {
    pub boosted: usize,
    pub skipped: usize,
}

fn apply_gain(clip: &AudioClip, gain_db: f32) -> AudioClip {
    let scale = 10f32.powf(gain_db / 20.0);
    let samples = clip
        .samples
        .iter()
        .map(|&s| (s as f32 * scale).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect();
    AudioClip::new(samples, clip.sample_rate, clip.channels)
}

/// Amplify only the voiced spans of a clip by `gain_db`, leaving detected
/// silence untouched. Span boundaries are preserved exactly, so the output
/// duration equals the input duration.
pub fn boost_clip<B: AudioBackend>(
    backend: &B,
    clip: &AudioClip,
    gain_db: f32,
    threshold_db: f32,
) -> Result<AudioClip> {
    let spans = backend.detect_nonsilent(clip, &SilenceParams::with_threshold(threshold_db));

    let mut pieces = Vec::with_capacity(spans.len() * 2 + 1);
    let mut prev_end = Duration::ZERO;
    for span in &spans {
        // Silence between the previous span and this one, unmodified.
        pieces.push(backend.slice(clip, prev_end, span.start));
        pieces.push(apply_gain(&backend.slice(clip, span.start, span.end), gain_db));
        prev_end = span.end;
    }
    // Trailing silence after the last span.
    pieces.push(backend.slice(clip, prev_end, clip.duration()));

    backend.concat(&pieces)
}

/// Boost every recording directly inside `dir` in place, with the same
/// per-file failure isolation as the trim pass.
pub fn boost_directory<B: AudioBackend>(
    backend: &B,
    dir: &Path,
    gain_db: f32,
    threshold_db: f32,
) -> Result<BoostSummary> {
    let mut summary = BoostSummary::default();

    for path in list_recordings(dir)? {
        let result = backend
            .load(&path)
            .and_then(|clip| boost_clip(backend, &clip, gain_db, threshold_db))
            .and_then(|boosted| backend.export(&boosted, &path));

        match result {
            Ok(()) => {
                debug!("Boosted {} by {gain_db} dB", path.display());
                summary.boosted += 1;
            }
            Err(e) => {
                warn!("Failed to boost {}: {e}", path.display());
                summary.skipped += 1;
            }
        }
    }

    info!(
        "Volume boost complete: {} boosted, {} skipped",
        summary.boosted, summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::WavBackend;

    fn clip_of(sections: &[(usize, i16)]) -> AudioClip {
        let mut samples = Vec::new();
        for &(ms, amp) in sections {
            samples.extend(std::iter::repeat(amp).take(16 * ms));
        }
        AudioClip::new(samples, 16000, 1)
    }

    #[test]
    fn test_boost_preserves_duration_exactly() {
        let clip = clip_of(&[(300, 0), (400, 8000), (200, 0), (300, 8000), (100, 0)]);
        let boosted = boost_clip(&WavBackend, &clip, 6.0, -40.0).unwrap();
        assert_eq!(boosted.samples.len(), clip.samples.len());
    }

    #[test]
    fn test_boost_scales_voiced_and_keeps_silence() {
        let clip = clip_of(&[(300, 0), (400, 8000), (300, 0)]);
        let boosted = boost_clip(&WavBackend, &clip, 6.0, -40.0).unwrap();

        // +6 dB is very nearly a factor of two.
        let expected = (8000.0 * 10f32.powf(6.0 / 20.0)).round() as i16;
        let mid = boosted.samples.len() / 2;
        assert_eq!(boosted.samples[mid], expected);

        // Leading and trailing silence untouched.
        assert_eq!(boosted.samples[0], 0);
        assert_eq!(boosted.samples[boosted.samples.len() - 1], 0);
    }

    #[test]
    fn test_boost_saturates_instead_of_wrapping() {
        let clip = clip_of(&[(200, 30000)]);
        let boosted = boost_clip(&WavBackend, &clip, 12.0, -40.0).unwrap();
        assert!(boosted.samples.iter().all(|&s| s == i16::MAX));
    }

    #[test]
    fn test_boost_fully_silent_clip_is_unchanged() {
        let clip = clip_of(&[(300, 0)]);
        let boosted = boost_clip(&WavBackend, &clip, 6.0, -40.0).unwrap();
        assert_eq!(boosted, clip);
    }

    #[test]
    fn test_boost_directory_in_place() {
        let backend = WavBackend;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        backend
            .export(&clip_of(&[(100, 0), (200, 8000), (100, 0)]), &path)
            .unwrap();

        let summary = boost_directory(&backend, dir.path(), 6.0, -40.0).unwrap();
        assert_eq!(summary.boosted, 1);

        let loaded = backend.load(&path).unwrap();
        assert!(loaded.samples.iter().any(|&s| s > 15000));
    }
}
