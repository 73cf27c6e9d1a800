//! Error types shared across quizclips crates.

use std::path::PathBuf;

/// Top-level error type for quizclips operations.
///
/// Only batch-level failures travel through this type. Failures of a single
/// record are recovered inside the excerpt engine and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("Input error at {path}: {message}")]
    Input { path: PathBuf, message: String },

    #[error("Environment error: {tool} {message}")]
    Environment { tool: String, message: String },

    #[error("Catalog error: {message}")]
    Catalog { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using QuizError.
pub type QuizResult<T> = Result<T, QuizError>;

impl QuizError {
    pub fn input(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Input {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn environment(tool: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Environment {
            tool: tool.into(),
            message: msg.into(),
        }
    }

    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error should abort the whole run before any record is touched.
    pub fn is_fatal_before_processing(&self) -> bool {
        matches!(
            self,
            Self::Input { .. } | Self::Environment { .. } | Self::Csv(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_names_the_path() {
        let err = QuizError::input("songs.csv", "missing column youtube_url");
        let rendered = err.to_string();
        assert!(rendered.contains("songs.csv"));
        assert!(rendered.contains("youtube_url"));
        assert!(err.is_fatal_before_processing());
    }

    #[test]
    fn test_catalog_error_is_not_pre_processing_fatal() {
        assert!(!QuizError::catalog("rename failed").is_fatal_before_processing());
    }
}
