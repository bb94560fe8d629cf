use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::corpus::list_recordings;
use crate::error::Result;

use super::backend::AudioBackend;
use super::silence::SilenceParams;
use super::AudioClip;

/// Parameters for leading/trailing silence removal.
#[derive(Debug, Clone)]
pub struct TrimConfig {
    /// Silence threshold in dBFS.
    pub threshold_db: f32,
    /// Silence kept before the first and after the last voiced span.
    pub padding: Duration,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            threshold_db: -40.0,
            padding: Duration::from_millis(500),
        }
    }
}

/// Outcome of a directory trim pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrimSummary {
    /// Files trimmed and re-exported.
    pub trimmed: usize,
    /// Files left untouched (fully silent or failed to process).
    pub skipped: usize,
}

/// Remove leading and trailing silence from a clip, keeping `padding` of
/// silence on each side. Returns `None` for a fully silent clip.
pub fn trim_clip<B: AudioBackend>(
    backend: &B,
    clip: &AudioClip,
    config: &TrimConfig,
) -> Option<AudioClip> {
    let spans = backend.detect_nonsilent(clip, &SilenceParams::with_threshold(config.threshold_db));
    let (first, last) = (spans.first()?, spans.last()?);

    let start = first.start.saturating_sub(config.padding);
    let end = (last.end + config.padding).min(clip.duration());
    Some(backend.slice(clip, start, end))
}

/// Trim every recording directly inside `dir`, overwriting each file in
/// place. One bad file does not abort the pass: failures are logged and the
/// file is left in its prior state.
pub fn trim_directory<B: AudioBackend>(
    backend: &B,
    dir: &Path,
    config: &TrimConfig,
) -> Result<TrimSummary> {
    let mut summary = TrimSummary::default();

    for path in list_recordings(dir)? {
        let clip = match backend.load(&path) {
            Ok(clip) => clip,
            Err(e) => {
                warn!("Failed to read {}: {e}", path.display());
                summary.skipped += 1;
                continue;
            }
        };

        let Some(trimmed) = trim_clip(backend, &clip, config) else {
            warn!(
                "{} appears to be fully silent, skipping",
                path.display()
            );
            summary.skipped += 1;
            continue;
        };

        if let Err(e) = backend.export(&trimmed, &path) {
            warn!("Failed to write {}: {e}", path.display());
            summary.skipped += 1;
            continue;
        }

        debug!(
            "Trimmed {}: {:.2}s -> {:.2}s",
            path.display(),
            clip.duration().as_secs_f64(),
            trimmed.duration().as_secs_f64()
        );
        summary.trimmed += 1;
    }

    info!(
        "Silence trim complete: {} trimmed, {} skipped",
        summary.trimmed, summary.skipped
    );
    Ok(summary)
}
