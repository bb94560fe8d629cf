use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::audio::{
    boost_directory, merge_directory, trim_directory, TrimConfig, WavBackend,
};
use crate::config::Config;
use crate::corpus::{find_recordings, Corpus};
use crate::dataset::{flat_audio_dir, DatasetAssembler};
use crate::error::{Result, VoiceprepError};
use crate::stats::{merge_text_from_list, text_stats, TextStats};

/// Merged artifact covering the whole corpus.
const FULL_MERGE_FILE: &str = "all.wav";
/// Bounded preview artifact.
const PREVIEW_MERGE_FILE: &str = "2min.wav";

/// Per-run parameters for the dataset preparation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Project name; prefixes split-layout file names.
    pub project_name: String,
    /// JSON corpus file mapping utterance ids to transcripts.
    pub corpus_path: PathBuf,
    /// Directory of raw per-sentence recordings.
    pub recordings_dir: PathBuf,
    /// Root directory under which the project directory is created.
    pub projects_dir: PathBuf,
    /// Silence threshold in dBFS.
    pub silence_threshold_db: f32,
    /// Silence kept around voiced audio when trimming.
    pub trim_padding: Duration,
    /// Gain for voiced spans in dB; <= 0 disables the boost step.
    pub volume_boost_db: f32,
    /// Duration cap of the preview merge artifact.
    pub preview_cap: Duration,
    /// Speaker tag for transcript list entries.
    pub speaker_tag: String,
    /// Language tag for transcript list entries.
    pub language_tag: String,
    /// Relative path prefix for list-entry audio paths.
    pub list_path_prefix: String,
    /// Show progress bars.
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl PipelineConfig {
    /// Per-run parameters seeded from the loaded configuration. This is the
    /// single source of truth inside a run; `Config` only supplies defaults.
    pub fn from_config(config: &Config) -> Self {
        Self {
            project_name: "default".to_string(),
            corpus_path: PathBuf::from("corpus/zh_corpus_v1.json"),
            recordings_dir: PathBuf::from("wav"),
            projects_dir: PathBuf::from("projects"),
            silence_threshold_db: config.silence_threshold_db,
            trim_padding: Duration::from_millis(config.trim_padding_ms),
            volume_boost_db: config.volume_boost_db,
            preview_cap: Duration::from_secs(config.preview_cap_secs),
            speaker_tag: config.speaker_tag.clone(),
            language_tag: config.language_tag.clone(),
            list_path_prefix: config.list_path_prefix.clone(),
            show_progress: true,
        }
    }

    pub fn project_dir(&self) -> PathBuf {
        self.projects_dir.join(&self.project_name)
    }
}

/// Statistics and run metadata returned at the end of a pipeline run.
#[derive(Debug, Clone)]
pub struct CoverageReport {
    pub project_name: String,
    pub project_dir: PathBuf,
    /// Recordings found under the recordings directory.
    pub recordings: usize,
    /// Recordings found over corpus size, as a percentage.
    pub completion_pct: f64,
    pub stats: TextStats,
}

/// Run the dataset preparation pipeline for one project.
///
/// Stages, in order:
/// 1. Load the corpus and discover recordings
/// 2. Build the flat layout and transcript list
/// 3. Trim leading/trailing silence in place
/// 4. Boost voiced spans (when a positive gain is configured)
/// 5. Merge the full and preview audio artifacts
/// 6. Build the split layout and compute corpus statistics
pub fn run_pipeline(pipeline: &PipelineConfig) -> Result<CoverageReport> {
    let backend = WavBackend;
    let project_dir = pipeline.project_dir();

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 1: Inputs
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 1/6: Loading corpus from {}", pipeline.corpus_path.display());

    let corpus = Corpus::load(&pipeline.corpus_path)?;
    if corpus.is_empty() {
        return Err(VoiceprepError::Config(format!(
            "Corpus {} contains no entries",
            pipeline.corpus_path.display()
        )));
    }
    info!("Corpus entries: {}", corpus.len());

    let recordings = find_recordings(&pipeline.recordings_dir)?;
    let completion_pct = completion_percentage(recordings.len(), corpus.len())?;
    info!(
        "Found {} recordings ({completion_pct:.2}% of corpus)",
        recordings.len()
    );

    let assembler = DatasetAssembler::new(
        &corpus,
        &pipeline.project_name,
        &pipeline.speaker_tag,
        &pipeline.language_tag,
        &pipeline.list_path_prefix,
    )
    .with_progress(pipeline.show_progress);

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 2: Flat layout + transcript list
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 2/6: Building flat layout in {}", project_dir.display());

    let flat = assembler.build_flat(&pipeline.recordings_dir, &project_dir)?;
    let flat_dir = flat_audio_dir(&project_dir);

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 3: Silence trim
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 3/6: Trimming silence");

    let trim_config = TrimConfig {
        threshold_db: pipeline.silence_threshold_db,
        padding: pipeline.trim_padding,
    };
    trim_directory(&backend, &flat_dir, &trim_config)?;

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 4: Volume boost
    // ═══════════════════════════════════════════════════════════════════════
    if pipeline.volume_boost_db > 0.0 {
        info!("Stage 4/6: Boosting volume by {} dB", pipeline.volume_boost_db);
        boost_directory(
            &backend,
            &flat_dir,
            pipeline.volume_boost_db,
            pipeline.silence_threshold_db,
        )?;
    } else {
        info!("Stage 4/6: Volume boost disabled, skipping");
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 5: Merged artifacts
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 5/6: Merging audio artifacts");

    merge_directory(&backend, &flat_dir, &project_dir.join(FULL_MERGE_FILE), None)?;
    merge_directory(
        &backend,
        &flat_dir,
        &project_dir.join(PREVIEW_MERGE_FILE),
        Some(pipeline.preview_cap),
    )?;

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 6: Split layout + statistics
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 6/6: Building split layout and computing statistics");

    assembler.build_split(&project_dir)?;

    let merged_text = merge_text_from_list(&flat.list_path)?;
    if merged_text.is_empty() {
        warn!("Transcript list is empty; statistics will be all zeroes");
    }
    let stats = text_stats(&merged_text);

    Ok(CoverageReport {
        project_name: pipeline.project_name.clone(),
        project_dir,
        recordings: recordings.len(),
        completion_pct,
        stats,
    })
}

/// Print a summary of the pipeline results.
pub fn print_summary(report: &CoverageReport) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                  Dataset Preparation Complete                   ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Project:     {}", report.project_name);
    println!("  Output:      {}", report.project_dir.display());
    println!("  Recordings:  {}", report.recordings);
    println!("  Completion:  {:.2}%", report.completion_pct);
    println!();
    println!("  Transcript text:");
    println!("    Characters:    {} total, {} unique", report.stats.total_chars, report.stats.unique_chars);
    println!("    Han:           {} total, {} unique", report.stats.han_total, report.stats.han_unique);
    println!("    GBK coverage:  {:.2}%", report.stats.gbk_coverage * 100.0);
    println!("    Numerals:      {:.2}%", report.stats.numeral_coverage * 100.0);
    println!(
        "    Other:         {} spaces, {} digits, {} letters, {} punctuation",
        report.stats.space_count,
        report.stats.digit_count,
        report.stats.letter_count,
        report.stats.punctuation_count
    );
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}

/// Completion percentage helper with an explicit empty-corpus contract.
pub fn completion_percentage(recordings_found: usize, corpus_size: usize) -> Result<f64> {
    if corpus_size == 0 {
        return Err(VoiceprepError::Config(
            "Cannot compute completion percentage for an empty corpus".to_string(),
        ));
    }
    Ok(recordings_found as f64 / corpus_size as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.project_name, "default");
        assert_eq!(config.silence_threshold_db, -40.0);
        assert_eq!(config.trim_padding, Duration::from_millis(500));
        assert_eq!(config.volume_boost_db, 0.0);
        assert_eq!(config.preview_cap, Duration::from_secs(120));
        assert_eq!(config.speaker_tag, "slicer_opt");
        assert_eq!(config.language_tag, "ZH");
        assert!(config.show_progress);
    }

    #[test]
    fn test_pipeline_config_from_config() {
        let shared = Config {
            silence_threshold_db: -35.0,
            trim_padding_ms: 200,
            volume_boost_db: 3.0,
            speaker_tag: "studio".to_string(),
            language_tag: "EN".to_string(),
            ..Config::default()
        };
        let config = PipelineConfig::from_config(&shared);
        assert_eq!(config.silence_threshold_db, -35.0);
        assert_eq!(config.trim_padding, Duration::from_millis(200));
        assert_eq!(config.volume_boost_db, 3.0);
        assert_eq!(config.speaker_tag, "studio");
        assert_eq!(config.language_tag, "EN");
    }

    #[test]
    fn test_project_dir() {
        let config = PipelineConfig {
            project_name: "demo".to_string(),
            projects_dir: PathBuf::from("projects"),
            ..PipelineConfig::default()
        };
        assert_eq!(config.project_dir(), Path::new("projects/demo"));
    }

    #[test]
    fn test_completion_percentage() {
        assert_eq!(completion_percentage(5, 10).unwrap(), 50.0);
        assert_eq!(completion_percentage(0, 4).unwrap(), 0.0);
        assert!(completion_percentage(3, 0).is_err());
    }
}
