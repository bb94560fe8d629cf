use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::corpus::{find_recordings, list_recordings, utterance_id, Corpus};
use crate::error::Result;

/// Flat-layout audio directory, relative to the project directory.
pub const FLAT_AUDIO_DIR: &str = "gptsovits_dataset/slicer_opt";
/// Transcript list artifact, relative to the project directory.
pub const LIST_FILE: &str = "gptsovits_dataset/asr_opt/slicer_opt.list";
/// Split-layout root, relative to the project directory.
pub const SPLIT_ROOT: &str = "cosyvoice_dataset/libritts/LibriTTS";
/// Split-layout manifest, relative to the project directory.
pub const MANIFEST_FILE: &str = "cosyvoice_dataset/tts_text.json";

const TRAIN_PARTITION: &str = "train-clean-100";
const DEV_PARTITION: &str = "dev-clean";
const TEST_PARTITION: &str = "test-clean";

/// How many leading recordings are replicated into dev and test.
pub const DEV_TEST_REPLICAS: usize = 5;

pub fn flat_audio_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(FLAT_AUDIO_DIR)
}

pub fn list_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(LIST_FILE)
}

pub fn manifest_path(project_dir: &Path) -> PathBuf {
    project_dir.join(MANIFEST_FILE)
}

/// Copy `src` to `dst`, creating parent directories. With `overwrite`
/// disabled an existing destination is left alone. Returns whether a copy
/// happened.
pub fn copy_file(src: &Path, dst: &Path, overwrite: bool) -> Result<bool> {
    if !overwrite && dst.exists() {
        return Ok(false);
    }
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;
    Ok(true)
}

/// Write `content` to `path`, creating parent directories. Same overwrite
/// semantics as [`copy_file`].
pub fn write_text(path: &Path, content: &str, overwrite: bool) -> Result<bool> {
    if !overwrite && path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(true)
}

/// One line of the transcript list artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub audio_path: String,
    pub speaker: String,
    pub language: String,
    pub text: String,
}

impl ListEntry {
    pub fn to_line(&self) -> String {
        format!(
            "{}|{}|{}|{}\n",
            self.audio_path, self.speaker, self.language, self.text
        )
    }
}

/// Result of the flat-layout build.
#[derive(Debug)]
pub struct FlatSummary {
    /// Recordings copied into the flat directory (matched or not).
    pub copied: usize,
    /// List entries written, i.e. recordings with a corpus match.
    pub entries: Vec<ListEntry>,
    pub list_path: PathBuf,
}

/// Result of the split-layout build.
#[derive(Debug)]
pub struct SplitSummary {
    /// Recordings placed in the train partition.
    pub train: usize,
    /// Recordings additionally replicated into dev and test.
    pub replicated: usize,
    pub manifest_path: PathBuf,
}

/// Populates the two dataset schemas from a directory of recordings.
///
/// Recordings whose utterance id has no corpus entry are copied into the
/// flat directory but excluded from the list artifact and the split layout.
pub struct DatasetAssembler<'a> {
    corpus: &'a Corpus,
    project_name: String,
    speaker_tag: String,
    language_tag: String,
    list_path_prefix: String,
    show_progress: bool,
}

impl<'a> DatasetAssembler<'a> {
    pub fn new(
        corpus: &'a Corpus,
        project_name: &str,
        speaker_tag: &str,
        language_tag: &str,
        list_path_prefix: &str,
    ) -> Self {
        Self {
            corpus,
            project_name: project_name.to_string(),
            speaker_tag: speaker_tag.to_string(),
            language_tag: language_tag.to_string(),
            list_path_prefix: list_path_prefix.to_string(),
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, len: usize, msg: &'static str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.green}] {pos}/{len}")
                .unwrap(),
        );
        pb.set_message(msg);
        Some(pb)
    }

    /// Copy every recording found under `recordings_dir` into the flat
    /// directory and write the transcript list artifact.
    pub fn build_flat(&self, recordings_dir: &Path, project_dir: &Path) -> Result<FlatSummary> {
        let flat_dir = flat_audio_dir(project_dir);
        let list_path = list_file_path(project_dir);

        let recordings = find_recordings(recordings_dir)?;
        let pb = self.progress_bar(recordings.len(), "Copying recordings");

        let mut entries = Vec::new();
        let mut copied = 0;

        for path in &recordings {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            copy_file(path, &flat_dir.join(file_name), true)?;
            copied += 1;
            debug!("Copied {} -> {}", path.display(), flat_dir.display());

            if let Some(text) = utterance_id(path).and_then(|id| self.corpus.get(id)) {
                entries.push(ListEntry {
                    audio_path: format!("{}/{}", self.list_path_prefix, file_name),
                    speaker: self.speaker_tag.clone(),
                    language: self.language_tag.clone(),
                    text: text.to_string(),
                });
            }

            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }

        if let Some(pb) = pb {
            pb.finish_with_message("Recordings copied");
        }

        let list_data: String = entries.iter().map(ListEntry::to_line).collect();
        write_text(&list_path, &list_data, true)?;

        info!(
            "Flat layout: {} recordings copied, {} list entries at {}",
            copied,
            entries.len(),
            list_path.display()
        );

        Ok(FlatSummary {
            copied,
            entries,
            list_path,
        })
    }

    /// Distribute the (post-transform) flat directory into train/dev/test
    /// partitions with sibling transcript files, and write the single-entry
    /// manifest for the first recording.
    pub fn build_split(&self, project_dir: &Path) -> Result<SplitSummary> {
        let flat_dir = flat_audio_dir(project_dir);
        let split_root = project_dir.join(SPLIT_ROOT);
        let leaf = PathBuf::from(&self.project_name).join("all");
        let train_dir = split_root.join(TRAIN_PARTITION).join(&leaf);
        let dev_dir = split_root.join(DEV_PARTITION).join(&leaf);
        let test_dir = split_root.join(TEST_PARTITION).join(&leaf);
        let manifest = manifest_path(project_dir);

        let recordings = list_recordings(&flat_dir)?;
        let pb = self.progress_bar(recordings.len(), "Building split layout");

        let mut summary = SplitSummary {
            train: 0,
            replicated: 0,
            manifest_path: manifest.clone(),
        };

        for path in &recordings {
            if let Some(pb) = &pb {
                pb.inc(1);
            }

            let Some(id) = utterance_id(path) else {
                continue;
            };
            let Some(text) = self.corpus.get(id) else {
                continue;
            };

            // Globally unique name: project prefix on the utterance id.
            let derived = format!("{}_{}", self.project_name, id);
            let wav_name = format!("{derived}.wav");
            let text_name = format!("{derived}.normalized.txt");

            copy_file(path, &train_dir.join(&wav_name), true)?;
            write_text(&train_dir.join(&text_name), text, true)?;
            summary.train += 1;

            if summary.train <= DEV_TEST_REPLICAS {
                if summary.train == 1 {
                    let mut tts_text = Map::new();
                    tts_text.insert(derived.clone(), json!([text]));
                    let contents = serde_json::to_string_pretty(&Value::Object(tts_text))?;
                    write_text(&manifest, &contents, true)?;
                }
                for dir in [&dev_dir, &test_dir] {
                    copy_file(path, &dir.join(&wav_name), true)?;
                    write_text(&dir.join(&text_name), text, true)?;
                }
                summary.replicated += 1;
            }
        }

        if let Some(pb) = pb {
            pb.finish_with_message("Split layout built");
        }

        info!(
            "Split layout: {} train recordings, {} replicated into dev/test",
            summary.train, summary.replicated
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn corpus_of(pairs: &[(&str, &str)]) -> Corpus {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Corpus::from(map)
    }

    fn assembler(corpus: &Corpus) -> DatasetAssembler<'_> {
        DatasetAssembler::new(corpus, "proj", "slicer_opt", "ZH", "output/slicer_opt")
            .with_progress(false)
    }

    #[test]
    fn test_list_entry_line() {
        let entry = ListEntry {
            audio_path: "output/slicer_opt/a.wav".to_string(),
            speaker: "slicer_opt".to_string(),
            language: "ZH".to_string(),
            text: "你好".to_string(),
        };
        assert_eq!(entry.to_line(), "output/slicer_opt/a.wav|slicer_opt|ZH|你好\n");
    }

    #[test]
    fn test_copy_file_overwrite_modes() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.txt");
        let dst = dir.path().join("deep").join("dst.txt");
        fs::write(&src, "one").unwrap();

        assert!(copy_file(&src, &dst, true).unwrap());
        fs::write(&src, "two").unwrap();

        // Overwrite disabled: untouched.
        assert!(!copy_file(&src, &dst, false).unwrap());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "one");

        assert!(copy_file(&src, &dst, true).unwrap());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "two");
    }

    #[test]
    fn test_write_text_overwrite_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("a.txt");

        assert!(write_text(&path, "one", true).unwrap());
        assert!(!write_text(&path, "two", false).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "one");
    }

    #[test]
    fn test_build_flat_list_and_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        let recordings = dir.path().join("wav");
        fs::create_dir(&recordings).unwrap();
        fs::write(recordings.join("a.wav"), b"riff").unwrap();
        fs::write(recordings.join("b.wav"), b"riff").unwrap();
        fs::write(recordings.join("orphan.wav"), b"riff").unwrap();

        let corpus = corpus_of(&[("a", "你好"), ("b", "world123"), ("unused", "x")]);
        let project_dir = dir.path().join("projects").join("proj");

        let summary = assembler(&corpus)
            .build_flat(&recordings, &project_dir)
            .unwrap();

        // All three copied, only matched ones listed.
        assert_eq!(summary.copied, 3);
        assert_eq!(summary.entries.len(), 2);

        let list = fs::read_to_string(&summary.list_path).unwrap();
        let lines: Vec<&str> = list.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("|你好"));
        assert!(lines[1].ends_with("|world123"));
        assert!(!list.contains("orphan"));
    }

    #[test]
    fn test_build_split_partitions_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let project_dir = dir.path().join("proj");
        let flat = flat_audio_dir(&project_dir);
        fs::create_dir_all(&flat).unwrap();

        // Seven matched recordings plus one orphan.
        let mut pairs = Vec::new();
        for i in 0..7 {
            let id = format!("s{i:02}");
            fs::write(flat.join(format!("{id}.wav")), b"riff").unwrap();
            pairs.push((id.clone(), format!("text {i}")));
        }
        fs::write(flat.join("orphan.wav"), b"riff").unwrap();

        let map: HashMap<String, String> = pairs.into_iter().collect();
        let corpus = Corpus::from(map);

        let summary = assembler(&corpus).build_split(&project_dir).unwrap();
        assert_eq!(summary.train, 7);
        assert_eq!(summary.replicated, DEV_TEST_REPLICAS);

        let train = project_dir
            .join(SPLIT_ROOT)
            .join("train-clean-100/proj/all");
        let dev = project_dir.join(SPLIT_ROOT).join("dev-clean/proj/all");
        assert!(train.join("proj_s00.wav").exists());
        assert!(train.join("proj_s00.normalized.txt").exists());
        assert!(train.join("proj_s06.wav").exists());
        assert!(dev.join("proj_s04.wav").exists());
        assert!(!dev.join("proj_s05.wav").exists());
        assert!(!train.join("proj_orphan.wav").exists());

        // Manifest holds exactly the first recording's transcript.
        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&summary.manifest_path).unwrap()).unwrap();
        let object = manifest.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object["proj_s00"], json!(["text 0"]));
    }
}
