//! Source audio download.

use std::path::{Path, PathBuf};
use std::time::Duration;

use quizclips_common::config::FetchConfig;

use crate::processor::ItemFailure;
use crate::tools::ToolInvocation;

/// Output template placeholder the downloader replaces with its chosen extension.
pub const EXTENSION_PLACEHOLDER: &str = "%(ext)s";

/// Download settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub program: String,
    pub audio_format: String,
    pub audio_quality: String,
    pub timeout: Duration,
    pub extensions: Vec<String>,
}

impl From<&FetchConfig> for FetchPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            program: config.program.clone(),
            audio_format: config.audio_format.clone(),
            audio_quality: config.audio_quality.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            extensions: config.extensions.clone(),
        }
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl FetchPolicy {
    /// Audio-only, single-item download of `url` into `{temp_dir}/{stem}.%(ext)s`.
    pub fn invocation(&self, url: &str, temp_dir: &Path, stem: &str) -> ToolInvocation {
        ToolInvocation::new(&self.program)
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg(&self.audio_format)
            .arg("--audio-quality")
            .arg(&self.audio_quality)
            .arg("--output")
            .path_arg(temp_dir.join(format!("{stem}.{EXTENSION_PLACEHOLDER}")))
            .arg("--no-playlist")
            .arg(url)
    }

    /// Candidate download paths, in preference order.
    pub fn candidates(&self, temp_dir: &Path, stem: &str) -> Vec<PathBuf> {
        self.extensions
            .iter()
            .map(|ext| temp_dir.join(format!("{stem}.{ext}")))
            .collect()
    }

    /// First candidate that exists on disk.
    pub fn discover(&self, temp_dir: &Path, stem: &str) -> Result<PathBuf, ItemFailure> {
        let probed = self.candidates(temp_dir, stem);
        match probed.iter().find(|p| p.is_file()) {
            Some(found) => Ok(found.clone()),
            None => Err(ItemFailure::DownloadMissing { probed }),
        }
    }

    /// Remove whatever a failed or interrupted download left behind.
    pub fn cleanup(&self, temp_dir: &Path, stem: &str) {
        let mut leftovers = self.candidates(temp_dir, stem);
        leftovers.extend(
            self.extensions
                .iter()
                .map(|ext| temp_dir.join(format!("{stem}.{ext}.part"))),
        );
        for path in leftovers.iter().filter(|p| p.exists()) {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed partial download"),
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "Failed to remove partial download"
                    )
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_requests_single_audio_item() {
        let policy = FetchPolicy::default();
        let inv = policy.invocation(
            "https://www.youtube.com/watch?v=abc123",
            Path::new("temp_audio"),
            "1a_bach_air",
        );
        assert_eq!(inv.program, "yt-dlp");
        assert!(inv.args.iter().any(|a| a == "--extract-audio"));
        assert!(inv.args.iter().any(|a| a == "--no-playlist"));
        assert_eq!(inv.value_of("--audio-format"), Some("mp3"));
        assert_eq!(inv.value_of("--audio-quality"), Some("192K"));
        assert_eq!(
            inv.value_of("--output").map(PathBuf::from),
            Some(Path::new("temp_audio").join("1a_bach_air.%(ext)s"))
        );
        assert_eq!(
            inv.args.last().map(String::as_str),
            Some("https://www.youtube.com/watch?v=abc123")
        );
    }

    #[test]
    fn test_discover_prefers_configured_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.m4a"), b"m4a").unwrap();
        std::fs::write(dir.path().join("x.webm"), b"webm").unwrap();

        let found = FetchPolicy::default().discover(dir.path(), "x").unwrap();
        assert_eq!(found, dir.path().join("x.webm"));
    }

    #[test]
    fn test_discover_reports_every_probed_path() {
        let dir = tempfile::tempdir().unwrap();
        match FetchPolicy::default().discover(dir.path(), "x") {
            Err(ItemFailure::DownloadMissing { probed }) => {
                assert_eq!(probed.len(), 3);
                assert!(probed[0].ends_with("x.mp3"));
            }
            other => panic!("unexpected discovery result: {other:?}"),
        }
    }

    #[test]
    fn test_cleanup_removes_partials() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.webm.part"), b"partial").unwrap();
        std::fs::write(dir.path().join("x.mp3"), b"whole").unwrap();
        std::fs::write(dir.path().join("other.mp3"), b"keep").unwrap();

        FetchPolicy::default().cleanup(dir.path(), "x");

        assert!(!dir.path().join("x.webm.part").exists());
        assert!(!dir.path().join("x.mp3").exists());
        assert!(dir.path().join("other.mp3").exists());
    }
}
