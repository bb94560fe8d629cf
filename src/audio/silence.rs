use std::time::Duration;

use super::{AudioClip, NonSilentSpan};

/// Minimum run of quiet frames that counts as silence. Shorter gaps are
/// absorbed into the surrounding voiced span.
pub const MIN_SILENCE_RUN: Duration = Duration::from_millis(50);

/// Analysis frame length. Span boundaries are quantized to this grid.
const FRAME: Duration = Duration::from_millis(10);

/// Parameters for non-silent span detection.
#[derive(Debug, Clone)]
pub struct SilenceParams {
    /// Loudness threshold in dBFS; frames quieter than this are silence.
    pub threshold_db: f32,
    /// Minimum silence run length to split voiced spans.
    pub min_silence: Duration,
}

impl Default for SilenceParams {
    fn default() -> Self {
        Self {
            threshold_db: -40.0,
            min_silence: MIN_SILENCE_RUN,
        }
    }
}

impl SilenceParams {
    pub fn with_threshold(threshold_db: f32) -> Self {
        Self {
            threshold_db,
            ..Self::default()
        }
    }
}

/// Loudness of one frame in dBFS (0 = full scale, silence = -inf).
fn frame_dbfs(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return f32::NEG_INFINITY;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&s| {
            let normalized = s as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let rms = (sum_squares / samples.len() as f64).sqrt();
    if rms <= 0.0 {
        f32::NEG_INFINITY
    } else {
        (20.0 * rms.log10()) as f32
    }
}

/// Per-frame loudness profile over the whole clip. The trailing partial
/// frame, if any, is included.
fn loudness_profile(clip: &AudioClip) -> Vec<f32> {
    let samples_per_frame =
        (clip.sample_rate as u128 * FRAME.as_millis() / 1000) as usize * clip.channels.max(1) as usize;
    if samples_per_frame == 0 {
        return vec![];
    }

    clip.samples
        .chunks(samples_per_frame)
        .map(frame_dbfs)
        .collect()
}

/// Detect spans of the clip at or above the loudness threshold.
///
/// Quiet gaps shorter than `min_silence` do not split a span. Returns an
/// empty vector for a fully silent (or empty) clip.
pub fn detect_nonsilent(clip: &AudioClip, params: &SilenceParams) -> Vec<NonSilentSpan> {
    let profile = loudness_profile(clip);
    if profile.is_empty() {
        return vec![];
    }

    let voiced: Vec<bool> = profile.iter().map(|&db| db >= params.threshold_db).collect();

    let min_silence_frames =
        (params.min_silence.as_secs_f64() / FRAME.as_secs_f64()).ceil() as usize;

    let mut raw_spans: Vec<(usize, usize)> = Vec::new();
    let mut in_speech = false;
    let mut start_frame = 0;

    for (i, &is_voiced) in voiced.iter().enumerate() {
        if is_voiced && !in_speech {
            in_speech = true;
            start_frame = i;
        } else if !is_voiced && in_speech {
            in_speech = false;
            raw_spans.push((start_frame, i));
        }
    }

    if in_speech {
        raw_spans.push((start_frame, voiced.len()));
    }

    let mut merged: Vec<(usize, usize)> = Vec::new();
    for (start, end) in raw_spans {
        if let Some((_, last_end)) = merged.last_mut() {
            if start.saturating_sub(*last_end) < min_silence_frames {
                *last_end = end;
                continue;
            }
        }
        merged.push((start, end));
    }

    let total = clip.duration();
    merged
        .into_iter()
        .map(|(start, end)| NonSilentSpan {
            start: FRAME * start as u32,
            end: (FRAME * end as u32).min(total),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_of(sections: &[(usize, i16)]) -> AudioClip {
        // Each section is (duration in ms, constant amplitude).
        let mut samples = Vec::new();
        for &(ms, amp) in sections {
            samples.extend(std::iter::repeat(amp).take(16 * ms));
        }
        AudioClip::new(samples, 16000, 1)
    }

    #[test]
    fn test_frame_dbfs_silence() {
        let samples = vec![0i16; 160];
        assert_eq!(frame_dbfs(&samples), f32::NEG_INFINITY);
    }

    #[test]
    fn test_frame_dbfs_full_scale() {
        let samples = vec![i16::MAX; 160];
        assert!(frame_dbfs(&samples).abs() < 0.001);
    }

    #[test]
    fn test_fully_silent_clip_has_no_spans() {
        let clip = clip_of(&[(500, 0)]);
        let spans = detect_nonsilent(&clip, &SilenceParams::default());
        assert!(spans.is_empty());
    }

    #[test]
    fn test_single_voiced_span() {
        let clip = clip_of(&[(300, 0), (400, 8000), (300, 0)]);
        let spans = detect_nonsilent(&clip, &SilenceParams::default());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, Duration::from_millis(300));
        assert_eq!(spans[0].end, Duration::from_millis(700));
    }

    #[test]
    fn test_short_gap_does_not_split() {
        // 30 ms of silence is below the 50 ms minimum run.
        let clip = clip_of(&[(200, 8000), (30, 0), (200, 8000)]);
        let spans = detect_nonsilent(&clip, &SilenceParams::default());
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn test_long_gap_splits() {
        let clip = clip_of(&[(200, 8000), (200, 0), (200, 8000)]);
        let spans = detect_nonsilent(&clip, &SilenceParams::default());
        assert_eq!(spans.len(), 2);
        assert!(spans[0].end <= spans[1].start);
    }

    #[test]
    fn test_threshold_controls_sensitivity() {
        // Amplitude 100 is roughly -50 dBFS.
        let clip = clip_of(&[(200, 100)]);
        assert!(detect_nonsilent(&clip, &SilenceParams::with_threshold(-40.0)).is_empty());
        assert_eq!(
            detect_nonsilent(&clip, &SilenceParams::with_threshold(-60.0)).len(),
            1
        );
    }

    #[test]
    fn test_span_end_clamped_to_clip_duration() {
        // 405 ms leaves a trailing partial frame.
        let clip = clip_of(&[(405, 8000)]);
        let spans = detect_nonsilent(&clip, &SilenceParams::default());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].end, clip.duration());
    }
}
