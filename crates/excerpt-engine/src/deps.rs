//! External tool detection and guidance.
//!
//! Both tools are probed before any record is touched, so a missing binary
//! fails the run once instead of failing every record.

use std::time::Duration;

use quizclips_common::config::AppConfig;
use quizclips_common::error::{QuizError, QuizResult};

use crate::tools::{ToolInvocation, ToolRunner};

const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Availability of one external tool.
#[derive(Debug, Clone)]
pub struct ToolCheck {
    pub name: String,
    pub description: String,
    pub program: String,
    pub available: bool,

    /// First line of the tool's version output.
    pub version: Option<String>,
    pub fix_instructions: Option<String>,
}

/// Probe the download and encode tools named in `config`.
pub async fn check_tools<R: ToolRunner>(runner: &R, config: &AppConfig) -> Vec<ToolCheck> {
    vec![
        probe(
            runner,
            "Audio downloader",
            "Fetches audio-only streams from video URLs",
            &config.fetch.program,
            "--version",
            "Install yt-dlp: pip install yt-dlp",
        )
        .await,
        probe(
            runner,
            "Audio encoder",
            "Trims and re-encodes the excerpt window",
            &config.excerpt.program,
            "-version",
            "Install ffmpeg: brew install ffmpeg (macOS) or apt-get install ffmpeg (Ubuntu/Debian)",
        )
        .await,
    ]
}

/// Fail with an environment error naming every missing tool.
pub fn require_tools(checks: &[ToolCheck]) -> QuizResult<()> {
    let missing: Vec<&ToolCheck> = checks.iter().filter(|c| !c.available).collect();
    match missing.as_slice() {
        [] => Ok(()),
        [only] => Err(QuizError::environment(
            &only.program,
            "not found or not runnable",
        )),
        many => Err(QuizError::environment(
            many.iter().map(|c| c.program.as_str()).collect::<Vec<_>>().join(", "),
            "not found or not runnable",
        )),
    }
}

async fn probe<R: ToolRunner>(
    runner: &R,
    name: &str,
    description: &str,
    program: &str,
    version_flag: &str,
    fix: &str,
) -> ToolCheck {
    let invocation = ToolInvocation::new(program).arg(version_flag);
    let result = runner.run(&invocation, PROBE_TIMEOUT).await;

    let (available, version) = match result {
        Ok(output) => (
            true,
            output.stdout.lines().next().map(|l| l.trim().to_string()),
        ),
        Err(err) if err.is_not_found() => {
            tracing::debug!(program, "Tool not installed");
            (false, None)
        }
        Err(err) => {
            tracing::debug!(program, error = %err, "Tool probe failed");
            (false, None)
        }
    };
    tracing::debug!(program, available, ?version, "Probed tool");

    ToolCheck {
        name: name.to_string(),
        description: description.to_string(),
        program: program.to_string(),
        available,
        version,
        fix_instructions: if available { None } else { Some(fix.to_string()) },
    }
}

/// Print a user-friendly tool report.
pub fn print_tool_report(checks: &[ToolCheck]) {
    println!("quizclips External Tools:");
    println!("{}", "-".repeat(60));

    for check in checks {
        let status = if check.available {
            "[OK]"
        } else {
            "[MISSING - REQUIRED]"
        };

        println!(
            "  {} {} ({}): {}",
            status, check.name, check.program, check.description
        );

        if let Some(ref version) = check.version {
            println!("    Version: {version}");
        }
        if let Some(ref fix) = check.fix_instructions {
            println!("    Fix: {fix}");
        }
    }
}
