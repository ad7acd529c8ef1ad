//! Configuration for limit checks and logging
//!
//! Configuration can be loaded from a TOML file and/or environment variables.
//! Every field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::outcome::Modality;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Per-modality limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Log sink configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Per-modality input limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum total characters of a text input
    #[serde(default = "default_text_chars")]
    pub text_chars: usize,

    /// Maximum audio duration in seconds
    #[serde(default = "default_audio_seconds")]
    pub audio_seconds: f64,

    /// Maximum number of images per request
    #[serde(default = "default_images")]
    pub images: usize,

    /// Maximum number of PDF pages
    #[serde(default = "default_pdf_pages")]
    pub pdf_pages: usize,

    /// Maximum video duration in seconds
    #[serde(default = "default_video_seconds")]
    pub video_seconds: f64,

    /// Maximum number of DICOM files per request
    #[serde(default = "default_dicom_files")]
    pub dicom_files: usize,
}

fn default_text_chars() -> usize {
    5000
}

fn default_audio_seconds() -> f64 {
    600.0 // 10 minutes
}

fn default_images() -> usize {
    4
}

fn default_pdf_pages() -> usize {
    10
}

fn default_video_seconds() -> f64 {
    600.0
}

fn default_dicom_files() -> usize {
    1
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            text_chars: default_text_chars(),
            audio_seconds: default_audio_seconds(),
            images: default_images(),
            pdf_pages: default_pdf_pages(),
            video_seconds: default_video_seconds(),
            dicom_files: default_dicom_files(),
        }
    }
}

impl LimitsConfig {
    /// Limit for `modality`, in that modality's unit
    pub fn limit_for(&self, modality: Modality) -> f64 {
        match modality {
            Modality::Text => self.text_chars as f64,
            Modality::Audio => self.audio_seconds,
            Modality::Images => self.images as f64,
            Modality::Pdf => self.pdf_pages as f64,
            Modality::Video => self.video_seconds,
            Modality::Dicom => self.dicom_files as f64,
        }
    }

    /// Replace the limit for `modality`. Count limits are truncated.
    pub fn set_limit(&mut self, modality: Modality, limit: f64) {
        let count = limit.max(0.0) as usize;
        match modality {
            Modality::Text => self.text_chars = count,
            Modality::Audio => self.audio_seconds = limit,
            Modality::Images => self.images = count,
            Modality::Pdf => self.pdf_pages = count,
            Modality::Video => self.video_seconds = limit,
            Modality::Dicom => self.dicom_files = count,
        }
    }
}

/// Log sink configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log file, truncated on setup
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Minimum severity: trace, debug, info, warn, error, critical or off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Mirror log lines to stderr
    #[serde(default)]
    pub console: bool,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("KSERVE.log")
}

fn default_log_level() -> String {
    "debug".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_log_level(),
            console: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Override fields from `SERVEGATE_*` environment variables
    pub fn apply_env(&mut self) {
        // Limits
        if let Some(v) = env_parse("SERVEGATE_TEXT_LIMIT") {
            self.limits.text_chars = v;
        }
        if let Some(v) = env_parse("SERVEGATE_AUDIO_LIMIT_SECS") {
            self.limits.audio_seconds = v;
        }
        if let Some(v) = env_parse("SERVEGATE_IMAGES_LIMIT") {
            self.limits.images = v;
        }
        if let Some(v) = env_parse("SERVEGATE_PDF_LIMIT_PAGES") {
            self.limits.pdf_pages = v;
        }
        if let Some(v) = env_parse("SERVEGATE_VIDEO_LIMIT_SECS") {
            self.limits.video_seconds = v;
        }
        if let Some(v) = env_parse("SERVEGATE_DICOM_LIMIT") {
            self.limits.dicom_files = v;
        }

        // Logging
        if let Ok(file) = std::env::var("SERVEGATE_LOG_FILE") {
            self.logging.file = PathBuf::from(file);
        }
        if let Ok(level) = std::env::var("SERVEGATE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(v) = env_parse("SERVEGATE_LOG_CONSOLE") {
            self.logging.console = v;
        }
    }

    /// Load configuration from file if it exists, otherwise from environment
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        Self::load_with_source(path).map(|(config, _)| config)
    }

    /// Like [`Config::load`], also reporting where the values came from.
    ///
    /// Loading usually happens before logging is set up, so a missing file
    /// is returned as [`ConfigSource::MissingFile`] for the caller to log.
    pub fn load_with_source<P: AsRef<Path>>(
        path: Option<P>,
    ) -> Result<(Self, ConfigSource), ConfigError> {
        if let Some(p) = path {
            let p = p.as_ref();
            if p.exists() {
                let mut config = Self::from_file(p)?;
                config.apply_env();
                return Ok((config, ConfigSource::File(p.to_path_buf())));
            }
            return Ok((Self::from_env(), ConfigSource::MissingFile(p.to_path_buf())));
        }
        Ok((Self::from_env(), ConfigSource::Environment))
    }
}

/// Origin of a loaded [`Config`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from this file, then environment overrides
    File(PathBuf),
    /// The requested file does not exist; defaults and environment were used
    MissingFile(PathBuf),
    /// No file requested; defaults and environment
    Environment,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok()?;
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("ignoring {}={:?}: not a valid value", key, value);
            None
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(String),

    /// Config file is not valid TOML for [`Config`]
    #[error("Parse error: {0}")]
    Parse(String),
}
