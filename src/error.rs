use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceprepError {
    #[error("Audio processing failed: {0}")]
    Audio(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VoiceprepError>;
