//! Per-record excerpt pipeline.
//!
//! Each record moves through
//! `Pending → Skipped | Downloading → Downloaded → Trimming → Done | Failed`.
//! Records are processed strictly one after another and no failure of a
//! single record escapes [`ExcerptProcessor::process_one`].

use std::path::{Path, PathBuf};

use quizclips_catalog::record::Record;
use quizclips_catalog::slug::{excerpt_filename, resolve_stems};
use quizclips_catalog::url::video_id;
use quizclips_common::config::AppConfig;
use quizclips_common::error::QuizResult;
use serde::{Deserialize, Serialize};

use crate::fetch::FetchPolicy;
use crate::report::{BatchReport, ItemReport};
use crate::tools::{ToolError, ToolRunner};
use crate::trim::ExcerptPolicy;

/// Processing stage of a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStage {
    Pending,
    Skipped,
    Downloading,
    Downloaded,
    Trimming,
    Done,
    Failed,
}

/// Terminal state of a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Excerpt was produced during this run.
    Done { filename: String },

    /// Excerpt already existed; no tool was run.
    Skipped { filename: String },

    /// The record was abandoned at `stage`.
    Failed { stage: ItemStage, reason: String },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Why a record could not be turned into an excerpt.
#[derive(Debug, thiserror::Error)]
pub enum ItemFailure {
    #[error("download failed: {source}")]
    Fetch { source: ToolError },

    #[error(
        "download reported success but no file was found (probed {})",
        probed.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
    )]
    DownloadMissing { probed: Vec<PathBuf> },

    #[error("excerpt encoding failed: {source}")]
    Trim { source: ToolError },
}

impl ItemFailure {
    /// Stage the record was in when it failed.
    pub fn stage(&self) -> ItemStage {
        match self {
            Self::Fetch { .. } => ItemStage::Downloading,
            Self::DownloadMissing { .. } => ItemStage::Downloaded,
            Self::Trim { .. } => ItemStage::Trimming,
        }
    }
}

/// Progress notification for one record.
#[derive(Debug, Clone, Copy)]
pub struct ItemProgress<'a> {
    /// 1-based position in the batch.
    pub position: usize,
    pub total: usize,
    pub record: &'a Record,

    /// `None` when the record is about to start.
    pub outcome: Option<&'a ItemOutcome>,
}

/// Progress callback for batch processing.
pub type ProgressCallback = Box<dyn Fn(ItemProgress<'_>) + Send>;

/// Drives records through download and trim.
pub struct ExcerptProcessor<R> {
    runner: R,
    audio_dir: PathBuf,
    temp_dir: PathBuf,
    fetch: FetchPolicy,
    excerpt: ExcerptPolicy,
}

impl<R: ToolRunner> ExcerptProcessor<R> {
    pub fn new(runner: R, config: &AppConfig) -> Self {
        Self {
            runner,
            audio_dir: config.paths.audio_dir.clone(),
            temp_dir: config.paths.temp_dir.clone(),
            fetch: FetchPolicy::from(&config.fetch),
            excerpt: ExcerptPolicy::from(&config.excerpt),
        }
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Process every record in order.
    ///
    /// Only directory setup can fail the batch. Records that fail are reported
    /// and left without an `output_filename`.
    pub async fn process_batch(
        &self,
        records: &mut [Record],
        progress: Option<ProgressCallback>,
    ) -> QuizResult<BatchReport> {
        std::fs::create_dir_all(&self.audio_dir)?;
        std::fs::create_dir_all(&self.temp_dir)?;

        let stems = resolve_stems(records.iter().map(Record::identity));
        let total = records.len();
        let mut report = BatchReport::default();

        tracing::info!(total, audio_dir = %self.audio_dir.display(), "Processing records");

        for (index, (record, stem)) in records.iter_mut().zip(&stems).enumerate() {
            if let Some(cb) = &progress {
                cb(ItemProgress {
                    position: index + 1,
                    total,
                    record: &*record,
                    outcome: None,
                });
            }

            let outcome = self.process_one(index, record, stem).await;

            if let Some(cb) = &progress {
                cb(ItemProgress {
                    position: index + 1,
                    total,
                    record: &*record,
                    outcome: Some(&outcome),
                });
            }
            report.items.push(ItemReport::new(index, record, outcome));
        }

        self.remove_temp_dir_if_empty();

        tracing::info!(
            succeeded = report.succeeded(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Processing complete"
        );
        Ok(report)
    }

    /// Resolve one record. `stem` is the record's collision-resolved stem.
    pub async fn process_one(&self, index: usize, record: &mut Record, stem: &str) -> ItemOutcome {
        let filename = excerpt_filename(stem);
        let output_path = self.audio_dir.join(&filename);

        if output_path.exists() {
            tracing::info!(index, file = %filename, "Excerpt already exists");
            record.output_filename = Some(filename.clone());
            return ItemOutcome::Skipped { filename };
        }

        match self.produce(index, record, stem, &output_path).await {
            Ok(()) => {
                tracing::info!(index, file = %filename, "Created excerpt");
                record.output_filename = Some(filename.clone());
                ItemOutcome::Done { filename }
            }
            Err(failure) => {
                tracing::warn!(
                    index,
                    title = %record.title,
                    stage = ?failure.stage(),
                    error = %failure,
                    "Record failed"
                );
                ItemOutcome::Failed {
                    stage: failure.stage(),
                    reason: failure.to_string(),
                }
            }
        }
    }

    async fn produce(
        &self,
        index: usize,
        record: &Record,
        stem: &str,
        output_path: &Path,
    ) -> Result<(), ItemFailure> {
        tracing::debug!(
            index,
            stage = ?ItemStage::Downloading,
            video = video_id(&record.source_url).unwrap_or("?"),
            url = %record.source_url
        );
        let fetch = self.fetch.invocation(&record.source_url, &self.temp_dir, stem);
        if let Err(source) = self.runner.run(&fetch, self.fetch.timeout).await {
            self.fetch.cleanup(&self.temp_dir, stem);
            return Err(ItemFailure::Fetch { source });
        }

        let downloaded = self.fetch.discover(&self.temp_dir, stem)?;
        tracing::debug!(index, stage = ?ItemStage::Downloaded, file = %downloaded.display());

        tracing::debug!(index, stage = ?ItemStage::Trimming);
        let trim = self.excerpt.invocation(&downloaded, output_path);
        let result = self.runner.run(&trim, self.excerpt.timeout).await;

        remove_best_effort(&downloaded, "temporary download");
        if let Err(source) = result {
            // A partial excerpt would be taken for a finished one on the next run.
            if output_path.exists() {
                remove_best_effort(output_path, "partial excerpt");
            }
            return Err(ItemFailure::Trim { source });
        }

        tracing::debug!(index, stage = ?ItemStage::Done);
        Ok(())
    }

    fn remove_temp_dir_if_empty(&self) {
        match std::fs::remove_dir(&self.temp_dir) {
            Ok(()) => tracing::debug!(path = %self.temp_dir.display(), "Removed temp directory"),
            Err(err) => tracing::debug!(
                path = %self.temp_dir.display(),
                error = %err,
                "Temp directory left in place"
            ),
        }
    }
}

fn remove_best_effort(path: &Path, what: &str) {
    if let Err(err) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %err, "Failed to remove {what}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_failure_stages() {
        let timeout = ToolError::Timeout {
            program: "yt-dlp".to_string(),
            after: Duration::from_secs(120),
            stderr: String::new(),
        };
        assert_eq!(ItemFailure::Fetch { source: timeout }.stage(), ItemStage::Downloading);
        assert_eq!(
            ItemFailure::DownloadMissing { probed: vec![] }.stage(),
            ItemStage::Downloaded
        );
    }

    #[test]
    fn test_download_missing_lists_paths() {
        let failure = ItemFailure::DownloadMissing {
            probed: vec![PathBuf::from("t/a.mp3"), PathBuf::from("t/a.webm")],
        };
        assert!(failure.to_string().contains("t/a.mp3, t/a.webm"));
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = ItemOutcome::Failed {
            stage: ItemStage::Trimming,
            reason: "ffmpeg exited with status 1".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["stage"], "trimming");
        assert!(!outcome.is_success());
        assert!(ItemOutcome::Skipped {
            filename: "a.mp3".to_string()
        }
        .is_success());
    }
}
