use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use voiceprep::config::Config;
use voiceprep::pipeline::{print_summary, run_pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "voiceprep")]
#[command(version, about = "Prepare recorded speech corpora as TTS fine-tuning datasets")]
#[command(
    long_about = "Turn per-sentence voice recordings plus a JSON text corpus into \
flat and train/dev/test dataset layouts, with silence trimming, optional volume \
boosting, merged audio artifacts, and corpus-coverage statistics."
)]
struct Cli {
    /// Project name
    #[arg(short, long, default_value = "default")]
    project: String,

    /// Corpus JSON file mapping utterance ids to transcripts
    #[arg(short, long, default_value = "corpus/zh_corpus_v1.json")]
    corpus: PathBuf,

    /// Directory of raw per-sentence WAV recordings
    #[arg(short, long, default_value = "wav")]
    recordings: PathBuf,

    /// Root directory for project outputs
    #[arg(long, default_value = "projects")]
    projects_dir: PathBuf,

    /// Silence threshold in dBFS
    #[arg(long)]
    silence_threshold: Option<f32>,

    /// Silence kept around voiced audio when trimming, in milliseconds
    #[arg(long)]
    padding_ms: Option<u64>,

    /// Gain for voiced spans in dB (0 disables boosting)
    #[arg(long)]
    volume_boost: Option<f32>,

    /// Disable progress bars
    #[arg(long)]
    no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if !cli.corpus.exists() {
        anyhow::bail!("Corpus file not found: {}", cli.corpus.display());
    }
    if !cli.recordings.is_dir() {
        anyhow::bail!("Recordings directory not found: {}", cli.recordings.display());
    }

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(threshold) = cli.silence_threshold {
        config.silence_threshold_db = threshold;
    }
    if let Some(padding) = cli.padding_ms {
        config.trim_padding_ms = padding;
    }
    if let Some(boost) = cli.volume_boost {
        config.volume_boost_db = boost;
    }
    config.validate().context("Configuration validation failed")?;

    let pipeline = PipelineConfig {
        project_name: cli.project,
        corpus_path: cli.corpus,
        recordings_dir: cli.recordings,
        projects_dir: cli.projects_dir,
        show_progress: !cli.no_progress,
        ..PipelineConfig::from_config(&config)
    };

    info!("Project:    {}", pipeline.project_name);
    info!("Corpus:     {}", pipeline.corpus_path.display());
    info!("Recordings: {}", pipeline.recordings_dir.display());
    info!("Output:     {}", pipeline.project_dir().display());

    let report = run_pipeline(&pipeline).context("Pipeline failed")?;
    print_summary(&report);

    Ok(())
}
