//! Process the piece table into excerpts and publish the catalog.

use std::io::{BufRead, Write};

use quizclips_catalog::loader::load_records;
use quizclips_common::config::AppConfig;
use quizclips_excerpt_engine::deps::{check_tools, print_tool_report, require_tools};
use quizclips_excerpt_engine::sibling::PatchOutcome;
use quizclips_excerpt_engine::{
    run_pipeline, ExcerptProcessor, ItemOutcome, ItemProgress, ProgressCallback, SystemToolRunner,
};

use super::RunStatus;

pub async fn run(config: AppConfig, assume_yes: bool) -> anyhow::Result<RunStatus> {
    println!("=== Processing Audio Files ===");

    let checks = check_tools(&SystemToolRunner, &config).await;
    if let Err(e) = require_tools(&checks) {
        print_tool_report(&checks);
        return Err(e.into());
    }

    let records = load_records(&config.paths.source_table)?;
    println!(
        "Found {} pieces to process in {}",
        records.len(),
        config.paths.source_table.display()
    );
    if records.is_empty() {
        println!("Nothing to do.");
        return Ok(RunStatus::Success);
    }

    if !assume_yes && !confirm(&config)? {
        println!("Setup cancelled.");
        return Ok(RunStatus::Cancelled);
    }

    let processor = ExcerptProcessor::new(SystemToolRunner, &config);
    let progress: ProgressCallback = Box::new(print_progress);
    let summary = run_pipeline(&processor, &config, records, Some(progress)).await?;

    println!("\n=== Processing Complete ===");
    println!("Successful: {}", summary.report.succeeded());
    println!("  (already present: {})", summary.report.skipped());
    println!("Failed: {}", summary.report.failed());
    println!("Excerpts: {}", processor.audio_dir().display());
    for failure in summary.report.failures() {
        if let ItemOutcome::Failed { stage, reason } = &failure.outcome {
            println!(
                "  - [{}] {} by {} ({:?}): {}",
                failure.assignment, failure.title, failure.composer, stage, reason
            );
        }
    }

    match &summary.catalog {
        Some(catalog) => println!(
            "Generated {} with {} pieces across {} assignments",
            config.paths.catalog_path.display(),
            catalog.pieces.len(),
            catalog.assignments.len()
        ),
        None => println!(
            "No excerpts available; {} left unchanged",
            config.paths.catalog_path.display()
        ),
    }
    if let Some(PatchOutcome::Patched { changes }) = &summary.patch {
        println!("Updated front-end script: {}", changes.join(", "));
    }

    Ok(if summary.any_succeeded() {
        RunStatus::Success
    } else {
        RunStatus::AllFailed
    })
}

fn print_progress(progress: ItemProgress<'_>) {
    let record = progress.record;
    match progress.outcome {
        None => {
            println!(
                "\n[{}/{}] Processing: {} by {}",
                progress.position, progress.total, record.title, record.composer
            );
        }
        Some(ItemOutcome::Skipped { filename }) => println!("  Already exists: {filename}"),
        Some(ItemOutcome::Done { filename }) => println!("  Created: {filename}"),
        Some(ItemOutcome::Failed { stage, reason }) => {
            println!("  Failed while {stage:?}: {reason}")
        }
    }
}

fn confirm(config: &AppConfig) -> anyhow::Result<bool> {
    println!("This will:");
    println!("1. Download each piece's audio with {}", config.fetch.program);
    println!(
        "2. Create {}-second excerpts starting at {}s",
        config.excerpt.duration_secs, config.excerpt.offset_secs
    );
    println!("3. Generate {}", config.paths.catalog_path.display());
    print!("Continue? (y/N): ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
