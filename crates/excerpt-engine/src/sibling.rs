//! Legacy front-end script patching.
//!
//! Older copies of the quiz page hard-code whether audio exists and embed
//! their own piece list. Current pages read `audioAvailable` from the catalog
//! instead, so this patcher only runs when a sibling script is configured.

use std::path::Path;

use quizclips_common::error::{QuizError, QuizResult};
use regex::Regex;

const AVAILABILITY_BEFORE: &str = "return false; // Will be updated after audio processing";
const AVAILABILITY_AFTER: &str = "return true; // Updated after audio processing";
const LOADER_HEADER: &str = r"async\s+loadMusicData\s*\(\s*\)\s*\{";

/// Result of patching the sibling script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// No script at the configured path.
    Missing,

    /// Script was already patched.
    Unchanged,

    /// Script was rewritten; lists the applied patches.
    Patched { changes: Vec<&'static str> },
}

/// Flip the availability flag and point the loader at the catalog file.
///
/// Each patch is guarded so re-running never rewrites an already patched
/// script. The loader patch is skipped when the script already mentions
/// `catalog_file`.
pub fn patch_sibling_script(
    path: impl AsRef<Path>,
    catalog_file: &str,
) -> QuizResult<PatchOutcome> {
    let path = path.as_ref();
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "No sibling script to patch");
        return Ok(PatchOutcome::Missing);
    }

    let original = std::fs::read_to_string(path)?;
    let (patched, changes) = apply_patches(&original, catalog_file)?;
    if changes.is_empty() {
        return Ok(PatchOutcome::Unchanged);
    }

    std::fs::write(path, patched)?;
    tracing::info!(path = %path.display(), ?changes, "Patched sibling script");
    Ok(PatchOutcome::Patched { changes })
}

fn apply_patches(source: &str, catalog_file: &str) -> QuizResult<(String, Vec<&'static str>)> {
    let mut content = source.to_string();
    let mut changes = Vec::new();

    if content.contains(AVAILABILITY_BEFORE) {
        content = content.replace(AVAILABILITY_BEFORE, AVAILABILITY_AFTER);
        changes.push("audio availability flag");
    }

    if !content.contains(catalog_file) {
        let header = Regex::new(LOADER_HEADER)
            .map_err(|e| QuizError::config(format!("invalid loader pattern: {e}")))?;
        if let Some(found) = header.find(&content) {
            if let Some(end) = matching_brace(&content, found.end() - 1) {
                content.replace_range(found.start()..=end, &loader_method(catalog_file));
                changes.push("catalog loader");
            } else {
                tracing::warn!("Unbalanced loadMusicData body, leaving loader untouched");
            }
        }
    }

    Ok((content, changes))
}

/// Byte index of the `}` closing the `{` at `open`. Braces inside the body
/// are assumed to be balanced.
fn matching_brace(source: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in source[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn loader_method(catalog_file: &str) -> String {
    format!(
        r#"async loadMusicData() {{
        try {{
            const response = await fetch('{catalog_file}');
            if (!response.ok) throw new Error('Failed to load music database');

            const database = await response.json();
            this.pieces = database.pieces;
            this.audioAvailable = database.audioAvailable === true;
            console.log(`Loaded ${{this.pieces.length}} pieces from database`);
        }} catch (error) {{
            console.error('Failed to load music database:', error);
            this.pieces = [];
        }}
    }}"#
    )
}
