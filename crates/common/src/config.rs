//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{QuizError, QuizResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Input and output locations.
    pub paths: PathsConfig,

    /// Catalog document settings.
    pub catalog: CatalogConfig,

    /// Audio fetch tool settings.
    pub fetch: FetchConfig,

    /// Trim/encode tool settings.
    pub excerpt: ExcerptConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Filesystem locations used by a run. Relative paths resolve against the
/// working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Spreadsheet export with the piece list.
    pub source_table: PathBuf,

    /// Directory receiving the finished excerpts.
    pub audio_dir: PathBuf,

    /// Scratch directory for full-length downloads.
    pub temp_dir: PathBuf,

    /// Catalog document read by the quiz page.
    pub catalog_path: PathBuf,

    /// Per-run processing report (`None` disables it).
    pub report_path: Option<PathBuf>,

    /// Legacy front-end script to patch once audio exists (`None` disables it).
    pub sibling_script: Option<PathBuf>,
}

/// Catalog document settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Prefix joined to each filename to form `audioFile`.
    pub audio_url_prefix: String,
}

/// Settings for the audio fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Executable name or path.
    pub program: String,

    /// Audio format requested from the extractor.
    pub audio_format: String,

    /// Audio quality requested from the extractor.
    pub audio_quality: String,

    /// Wall-clock limit for one download.
    pub timeout_secs: u64,

    /// Extensions the tool may produce, in probe order.
    pub extensions: Vec<String>,
}

/// Settings for the trim/encode tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcerptConfig {
    /// Executable name or path.
    pub program: String,

    /// Lead-in skipped before the excerpt starts (seconds).
    pub offset_secs: u32,

    /// Excerpt length (seconds).
    pub duration_secs: u32,

    /// Output audio codec.
    pub codec: String,

    /// Output audio bitrate.
    pub bitrate: String,

    /// Wall-clock limit for one encode.
    pub timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "quizclips=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_table: PathBuf::from("intro_to_music_songs - Sheet1.csv"),
            audio_dir: PathBuf::from("audio"),
            temp_dir: PathBuf::from("temp_audio"),
            catalog_path: PathBuf::from("music_database.json"),
            report_path: Some(PathBuf::from("processing_report.json")),
            sibling_script: None,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            audio_url_prefix: "audio".to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            audio_format: "mp3".to_string(),
            audio_quality: "192K".to_string(),
            timeout_secs: 120,
            extensions: vec!["mp3".to_string(), "webm".to_string(), "m4a".to_string()],
        }
    }
}

impl Default for ExcerptConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            offset_secs: 30,
            duration_secs: 60,
            codec: "libmp3lame".to_string(),
            bitrate: "128k".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from an explicit file. Unlike [`AppConfig::load_default`],
    /// a missing or malformed file is an error.
    pub fn load(path: impl AsRef<Path>) -> QuizResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            QuizError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            QuizError::config(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from the standard location, falling back to defaults.
    pub fn load_default() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str::<Self>(&content) {
                    Ok(config) => match config.validate() {
                        Ok(()) => return config,
                        Err(e) => {
                            tracing::warn!("Ignoring config at {:?}: {}", config_path, e);
                        }
                    },
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Reject values no run could succeed with.
    pub fn validate(&self) -> QuizResult<()> {
        if self.fetch.extensions.is_empty() {
            return Err(QuizError::config("fetch.extensions must not be empty"));
        }
        if self.fetch.timeout_secs == 0 || self.excerpt.timeout_secs == 0 {
            return Err(QuizError::config("tool timeouts must be greater than zero"));
        }
        if self.excerpt.duration_secs == 0 {
            return Err(QuizError::config("excerpt.duration_secs must be greater than zero"));
        }
        Ok(())
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("quizclips").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_excerpt_policy() {
        let config = AppConfig::default();
        assert_eq!(config.excerpt.offset_secs, 30);
        assert_eq!(config.excerpt.duration_secs, 60);
        assert_eq!(config.fetch.timeout_secs, 120);
        assert_eq!(config.excerpt.timeout_secs, 60);
        assert_eq!(config.fetch.extensions, vec!["mp3", "webm", "m4a"]);
        assert_eq!(config.paths.catalog_path, PathBuf::from("music_database.json"));
        assert!(config.paths.sibling_script.is_none());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "excerpt": { "bitrate": "96k" } }"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.excerpt.bitrate, "96k");
        assert_eq!(config.excerpt.codec, "libmp3lame");
        assert_eq!(config.fetch.program, "yt-dlp");
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, QuizError::Config { .. }));
    }

    #[test]
    fn test_validate_rejects_empty_extension_list() {
        let mut config = AppConfig::default();
        config.fetch.extensions.clear();
        assert!(config.validate().is_err());
    }
}
