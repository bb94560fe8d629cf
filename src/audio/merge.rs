use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::corpus::list_recordings;
use crate::error::Result;

use super::backend::AudioBackend;
use super::AudioClip;

/// Outcome of a directory merge.
#[derive(Debug, Clone)]
pub struct MergeSummary {
    pub output: PathBuf,
    pub files_merged: usize,
    pub duration: Duration,
}

/// Concatenate every recording directly inside `dir` into one file at
/// `output`, in file-name order.
///
/// With `cap = Some(limit)`, merging stops before the first file that would
/// push the cumulative duration past the limit; content merged so far is
/// still exported. `cap = None` merges everything.
pub fn merge_directory<B: AudioBackend>(
    backend: &B,
    dir: &Path,
    output: &Path,
    cap: Option<Duration>,
) -> Result<MergeSummary> {
    let mut clips: Vec<AudioClip> = Vec::new();
    let mut total = Duration::ZERO;

    for path in list_recordings(dir)? {
        let clip = match backend.load(&path) {
            Ok(clip) => clip,
            Err(e) => {
                warn!("Failed to read {}: {e}", path.display());
                continue;
            }
        };

        if let Some(first) = clips.first() {
            if clip.sample_rate != first.sample_rate || clip.channels != first.channels {
                warn!(
                    "Skipping {}: layout {} Hz/{}ch does not match {} Hz/{}ch",
                    path.display(),
                    clip.sample_rate,
                    clip.channels,
                    first.sample_rate,
                    first.channels
                );
                continue;
            }
        }

        if let Some(limit) = cap {
            if total + clip.duration() > limit {
                warn!(
                    "Reached duration cap of {:.0}s, stopping merge",
                    limit.as_secs_f64()
                );
                break;
            }
        }

        total += clip.duration();
        debug!("Merging {} ({:.2}s)", path.display(), clip.duration().as_secs_f64());
        clips.push(clip);
    }

    if clips.is_empty() {
        warn!("No recordings merged from {}", dir.display());
    }

    let files_merged = clips.len();
    let combined = backend.concat(&clips)?;
    backend.export(&combined, output)?;

    info!(
        "Merged {} recordings ({:.2}s) into {}",
        files_merged,
        combined.duration().as_secs_f64(),
        output.display()
    );

    Ok(MergeSummary {
        output: output.to_path_buf(),
        files_merged,
        duration: combined.duration(),
    })
}
