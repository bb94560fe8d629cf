use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, VoiceprepError};

/// Recordings are matched by this extension, case-insensitively.
pub const AUDIO_EXTENSION: &str = "wav";

/// The utterance-id-to-transcript mapping driving dataset transcripts.
///
/// Loaded once from a JSON object file; read-only for the pipeline run.
#[derive(Debug, Clone)]
pub struct Corpus {
    entries: HashMap<String, String>,
}

impl Corpus {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VoiceprepError::FileNotFound(path.display().to_string()));
        }
        let contents = fs::read_to_string(path)?;
        let entries: HashMap<String, String> = serde_json::from_str(&contents)?;
        debug!("Loaded {} corpus entries from {}", entries.len(), path.display());
        Ok(Self { entries })
    }

    pub fn get(&self, utterance_id: &str) -> Option<&str> {
        self.entries.get(utterance_id).map(String::as_str)
    }

    pub fn contains(&self, utterance_id: &str) -> bool {
        self.entries.contains_key(utterance_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<HashMap<String, String>> for Corpus {
    fn from(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(AUDIO_EXTENSION))
}

fn sort_by_file_name(paths: &mut [PathBuf]) {
    // Directory-listing order is platform dependent; lexicographic file-name
    // order is the deterministic contract for list entries and dev/test
    // replica selection.
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
}

/// The utterance identifier of a recording: its file name sans extension.
pub fn utterance_id(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

/// List the recordings directly inside `dir`, sorted by file name.
pub fn list_recordings(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(VoiceprepError::FileNotFound(dir.display().to_string()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_audio_file(path))
        .collect();
    sort_by_file_name(&mut files);
    Ok(files)
}

/// Find all recordings under `dir` recursively, sorted by file name.
pub fn find_recordings(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(VoiceprepError::FileNotFound(dir.display().to_string()));
    }

    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if is_audio_file(&path) {
                files.push(path);
            }
        }
    }
    sort_by_file_name(&mut files);
    Ok(files)
}
