//! Batch outcome reporting.

use std::path::Path;

use quizclips_catalog::record::Record;
use quizclips_common::error::QuizResult;
use serde::{Deserialize, Serialize};

use crate::processor::ItemOutcome;

/// Outcome of one record, in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    /// 0-based row index (header excluded).
    pub index: usize,
    pub assignment: String,
    pub composer: String,
    pub title: String,
    pub source_url: String,

    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

impl ItemReport {
    pub fn new(index: usize, record: &Record, outcome: ItemOutcome) -> Self {
        Self {
            index,
            assignment: record.assignment.clone(),
            composer: record.composer.clone(),
            title: record.title.clone(),
            source_url: record.source_url.clone(),
            outcome,
        }
    }
}

/// Aggregate result of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    /// Records with an excerpt on disk, whether produced now or earlier.
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_success()).count()
    }

    /// Records whose excerpt already existed.
    pub fn skipped(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ItemOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemReport> {
        self.items.iter().filter(|i| !i.outcome.is_success())
    }

    /// Persist the report with a generation timestamp.
    pub fn write_to(&self, path: impl AsRef<Path>, source_table: &Path) -> QuizResult<()> {
        let path = path.as_ref();
        let document = serde_json::json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "source_table": source_table,
            "succeeded": self.succeeded(),
            "skipped": self.skipped(),
            "failed": self.failed(),
            "items": self.items,
        });
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&document)?)?;
        tracing::info!(report = %path.display(), "Wrote processing report");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::ItemStage;

    fn report() -> BatchReport {
        let record = Record::from_cells("1a", "Bach", "Air", "Suite", "https://youtu.be/a");
        BatchReport {
            items: vec![
                ItemReport::new(0, &record, ItemOutcome::Done { filename: "a.mp3".into() }),
                ItemReport::new(1, &record, ItemOutcome::Skipped { filename: "b.mp3".into() }),
                ItemReport::new(
                    2,
                    &record,
                    ItemOutcome::Failed {
                        stage: ItemStage::Downloading,
                        reason: "yt-dlp timed out after 120s".into(),
                    },
                ),
            ],
        }
    }

    #[test]
    fn test_counts() {
        let report = report();
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures().map(|i| i.index).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_written_report_lists_failure_reasons() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processing_report.json");
        report().write_to(&path, Path::new("songs.csv")).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["failed"], 1);
        assert_eq!(value["items"][2]["status"], "failed");
        assert_eq!(value["items"][2]["stage"], "downloading");
        assert_eq!(value["items"][2]["reason"], "yt-dlp timed out after 120s");
        assert_eq!(value["source_table"], "songs.csv");
    }
}
