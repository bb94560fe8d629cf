use crate::error::{Result, VoiceprepError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Defaults shared by every pipeline run.
///
/// Loaded from `~/.config/voiceprep/config.toml` when present, then
/// overridden by `VOICEPREP_*` environment variables. Per-run CLI flags take
/// precedence over everything here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Speaker tag written into each transcript list entry.
    pub speaker_tag: String,
    /// Language tag written into each transcript list entry.
    pub language_tag: String,
    /// Relative path prefix for list-entry audio paths.
    pub list_path_prefix: String,
    /// Silence threshold in dBFS; frames quieter than this are silence.
    pub silence_threshold_db: f32,
    /// Silence kept around the voiced span when trimming, in milliseconds.
    pub trim_padding_ms: u64,
    /// Gain applied to voiced spans, in dB. Zero or negative disables the
    /// boost step.
    pub volume_boost_db: f32,
    /// Duration cap of the preview merge artifact, in seconds.
    pub preview_cap_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speaker_tag: "slicer_opt".to_string(),
            language_tag: "ZH".to_string(),
            list_path_prefix: "output/slicer_opt".to_string(),
            silence_threshold_db: -40.0,
            trim_padding_ms: 500,
            volume_boost_db: 0.0,
            preview_cap_secs: 120,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        // Override with environment variables
        if let Ok(tag) = std::env::var("VOICEPREP_SPEAKER_TAG") {
            config.speaker_tag = tag;
        }
        if let Ok(tag) = std::env::var("VOICEPREP_LANGUAGE_TAG") {
            config.language_tag = tag;
        }
        if let Ok(threshold) = std::env::var("VOICEPREP_SILENCE_THRESHOLD") {
            if let Ok(t) = threshold.parse() {
                config.silence_threshold_db = t;
            }
        }
        if let Ok(padding) = std::env::var("VOICEPREP_TRIM_PADDING_MS") {
            if let Ok(p) = padding.parse() {
                config.trim_padding_ms = p;
            }
        }
        if let Ok(boost) = std::env::var("VOICEPREP_VOLUME_BOOST") {
            if let Ok(b) = boost.parse() {
                config.volume_boost_db = b;
            }
        }
        if let Ok(prefix) = std::env::var("VOICEPREP_LIST_PATH_PREFIX") {
            config.list_path_prefix = prefix;
        }
        if let Ok(cap) = std::env::var("VOICEPREP_PREVIEW_CAP_SECS") {
            if let Ok(c) = cap.parse() {
                config.preview_cap_secs = c;
            }
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.silence_threshold_db >= 0.0 {
            return Err(VoiceprepError::Config(
                "Silence threshold must be negative dBFS (e.g. -40)".to_string(),
            ));
        }
        if self.speaker_tag.contains('|') || self.language_tag.contains('|') {
            return Err(VoiceprepError::Config(
                "Speaker and language tags must not contain '|'".to_string(),
            ));
        }
        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("voiceprep").join("config.toml"))
    }
}
