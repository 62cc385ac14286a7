use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::Path;

use crate::error::Error;
use crate::matching::Algorithm;

pub const DEFAULT_AUDIT_LOG_PATH: &str = "logs/deletion_audit.json";

pub const DEFAULT_VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "mkv", "avi", "mov", "wmv", "flv", "webm"];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub media_folder: String,
    pub video_extensions: Vec<String>,
    pub matching: MatchingConfig,
    pub duplicates: DuplicateConfig,
    pub cleanup: CleanupConfig,
}

/// Title matching against the spreadsheet's title column.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub fuzzy_enabled: bool,
    pub similarity_threshold: f64,
    pub algorithm: Algorithm,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DuplicateConfig {
    pub enabled: bool,
    pub threshold: f64,
}

/// Settings for the destructive cleanup path. Disabled unless opted in.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub enabled: bool,
    pub similarity_threshold: f64,
    pub size_variance: f64,
    pub audit_log: String,
    pub require_confirmation: bool,
    pub max_audit_entries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            media_folder: String::new(),
            video_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            matching: MatchingConfig::default(),
            duplicates: DuplicateConfig::default(),
            cleanup: CleanupConfig::default(),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_enabled: true,
            similarity_threshold: 0.85,
            algorithm: Algorithm::default(),
        }
    }
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.95,
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            similarity_threshold: 0.85,
            size_variance: 0.10,
            audit_log: DEFAULT_AUDIT_LOG_PATH.to_string(),
            require_confirmation: true,
            max_audit_entries: 10_000,
        }
    }
}

impl AppConfig {
    /// Reject thresholds that cannot be compared against a `[0, 1]` score.
    pub fn validate(&self) -> Result<(), Error> {
        check_unit_interval("matching.similarity_threshold", self.matching.similarity_threshold)?;
        check_unit_interval("duplicates.threshold", self.duplicates.threshold)?;
        check_unit_interval("cleanup.similarity_threshold", self.cleanup.similarity_threshold)?;
        check_unit_interval("cleanup.size_variance", self.cleanup.size_variance)?;
        Ok(())
    }
}

pub fn check_unit_interval(name: &'static str, value: f64) -> Result<(), Error> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidThreshold { name, value })
    }
}

/// Load `Config.toml` from the working directory (optional), then
/// `CLIPSYNC_*` environment variables on top.
pub fn load_configuration() -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(environment())
        .build()?;
    let config = builder.try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}

/// Same as [`load_configuration`] but reads an explicit file.
pub fn load_configuration_from(path: &Path) -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::from(path).required(true))
        .add_source(environment())
        .build()?;
    let config = builder.try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}

fn environment() -> Environment {
    Environment::with_prefix("CLIPSYNC")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
