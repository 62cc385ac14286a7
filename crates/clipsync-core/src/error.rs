use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("file does not exist: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("permission denied: {}: {}", .path.display(), .source)]
    PermissionDenied {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{name} must be between 0.0 and 1.0, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("{0}")]
    Other(String),
}
