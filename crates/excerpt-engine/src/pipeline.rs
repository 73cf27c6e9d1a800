//! Batch orchestration: process records, then publish what succeeded.

use quizclips_catalog::record::Record;
use quizclips_catalog::writer::{publish_catalog, CatalogDocument};
use quizclips_common::config::AppConfig;
use quizclips_common::error::QuizResult;

use crate::processor::{ExcerptProcessor, ProgressCallback};
use crate::report::BatchReport;
use crate::sibling::{patch_sibling_script, PatchOutcome};
use crate::tools::ToolRunner;

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Records with their `output_filename` attached where processing succeeded.
    pub records: Vec<Record>,
    pub report: BatchReport,

    /// `None` when nothing succeeded and the previous catalog was kept.
    pub catalog: Option<CatalogDocument>,
    pub patch: Option<PatchOutcome>,
}

impl RunSummary {
    /// Whether at least one record ended up with an excerpt.
    pub fn any_succeeded(&self) -> bool {
        self.report.succeeded() > 0
    }
}

/// Process `records`, write the report, publish the catalog and patch the
/// sibling script when one is configured.
///
/// Per-record failures are folded into the report. Only directory setup and
/// catalog writing can fail the run.
pub async fn run_pipeline<R: ToolRunner>(
    processor: &ExcerptProcessor<R>,
    config: &AppConfig,
    mut records: Vec<Record>,
    progress: Option<ProgressCallback>,
) -> QuizResult<RunSummary> {
    let report = processor.process_batch(&mut records, progress).await?;

    if let Some(report_path) = &config.paths.report_path {
        if let Err(err) = report.write_to(report_path, &config.paths.source_table) {
            tracing::warn!(
                path = %report_path.display(),
                error = %err,
                "Failed to write processing report"
            );
        }
    }

    let catalog = publish_catalog(
        &records,
        &config.catalog.audio_url_prefix,
        &config.paths.catalog_path,
    )?;

    let patch = match (&catalog, &config.paths.sibling_script) {
        (Some(_), Some(script)) => {
            let catalog_file = config
                .paths
                .catalog_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match patch_sibling_script(script, &catalog_file) {
                Ok(outcome) => Some(outcome),
                Err(err) => {
                    tracing::warn!(
                        path = %script.display(),
                        error = %err,
                        "Failed to patch sibling script"
                    );
                    None
                }
            }
        }
        _ => None,
    };

    Ok(RunSummary {
        records,
        report,
        catalog,
        patch,
    })
}
