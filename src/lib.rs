pub mod audio;
pub mod config;
pub mod corpus;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod stats;

pub use config::Config;
pub use error::{Result, VoiceprepError};
pub use pipeline::{print_summary, run_pipeline, CoverageReport, PipelineConfig};
