//! Check external tool availability.

use quizclips_common::config::AppConfig;
use quizclips_excerpt_engine::deps::{check_tools, print_tool_report};
use quizclips_excerpt_engine::SystemToolRunner;

use super::RunStatus;

pub async fn run(config: AppConfig) -> anyhow::Result<RunStatus> {
    println!("quizclips System Check");
    println!("{}", "=".repeat(50));

    let table = &config.paths.source_table;
    if table.exists() {
        println!("[OK] Source table: {}", table.display());
    } else {
        println!("[WARN] Source table not found: {}", table.display());
    }
    println!("     Audio directory: {}", config.paths.audio_dir.display());
    println!("     Catalog: {}", config.paths.catalog_path.display());

    let checks = check_tools(&SystemToolRunner, &config).await;
    println!();
    print_tool_report(&checks);

    println!();
    if checks.iter().all(|c| c.available) {
        println!("All required tools are available. quizclips is ready.");
        Ok(RunStatus::Success)
    } else {
        println!("Some required tools are missing. See above for fixes.");
        Ok(RunStatus::MissingTools)
    }
}
