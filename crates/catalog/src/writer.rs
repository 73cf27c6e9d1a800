//! Catalog document generation.
//!
//! The document is regenerated from scratch every run and only published
//! when at least one record has an excerpt, so a run where everything failed
//! never replaces a previously published catalog.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use quizclips_common::error::{QuizError, QuizResult};
use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Catalog document read by the quiz page (`music_database.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    /// Pieces sorted by `(assignment, composer, title)`.
    pub pieces: Vec<PieceEntry>,

    /// Distinct assignments of the listed pieces, sorted.
    pub assignments: Vec<String>,

    /// Lets the page switch from video links to local audio.
    pub audio_available: bool,
}

/// One playable piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceEntry {
    pub assignment: String,
    pub composer: String,
    pub title: String,
    pub genre: String,

    /// Path of the excerpt relative to the page, e.g. `audio/1a_anonymous_agnus_dei.mp3`.
    pub audio_file: String,
}

impl CatalogDocument {
    /// Build the document from every record of the run. Records without an
    /// excerpt are left out; duplicate identities keep their first row.
    pub fn from_records(records: &[Record], audio_url_prefix: &str) -> Self {
        let prefix = audio_url_prefix.trim_end_matches('/');
        let mut seen = HashSet::new();
        let mut pieces = Vec::new();

        for record in records.iter().filter(|r| r.is_published()) {
            if !seen.insert(record.identity()) {
                continue;
            }
            let filename = record.output_filename.as_deref().unwrap_or_default();
            let audio_file = if prefix.is_empty() {
                filename.to_string()
            } else {
                format!("{prefix}/{filename}")
            };
            pieces.push(PieceEntry {
                assignment: record.assignment.clone(),
                composer: record.composer.clone(),
                title: record.title.clone(),
                genre: record.genre.clone(),
                audio_file,
            });
        }

        pieces.sort_by(|a, b| {
            (&a.assignment, &a.composer, &a.title).cmp(&(&b.assignment, &b.composer, &b.title))
        });

        let assignments: Vec<String> = pieces
            .iter()
            .map(|p| p.assignment.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Self {
            audio_available: !pieces.is_empty(),
            pieces,
            assignments,
        }
    }

    /// Pretty-printed JSON, two-space indent, non-ASCII kept verbatim.
    pub fn to_json(&self) -> QuizResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Overwrite `path` with this document.
    ///
    /// The JSON is written to a sibling temporary file first and renamed
    /// over the target, so readers never observe a half-written catalog.
    pub fn write_to(&self, path: impl AsRef<Path>) -> QuizResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = self.to_json()?;
        let staging = staging_path(path);
        std::fs::write(&staging, json)?;
        std::fs::rename(&staging, path).map_err(|e| {
            std::fs::remove_file(&staging).ok();
            QuizError::catalog(format!("failed to replace {}: {e}", path.display()))
        })?;
        tracing::info!(
            path = %path.display(),
            pieces = self.pieces.len(),
            assignments = self.assignments.len(),
            "Wrote catalog document"
        );
        Ok(())
    }
}

/// Build and write the catalog if any record succeeded.
///
/// Returns `None` without touching `path` when nothing succeeded.
pub fn publish_catalog(
    records: &[Record],
    audio_url_prefix: &str,
    path: impl AsRef<Path>,
) -> QuizResult<Option<CatalogDocument>> {
    if !records.iter().any(Record::is_published) {
        tracing::warn!(
            path = %path.as_ref().display(),
            "No excerpts available, leaving catalog untouched"
        );
        return Ok(None);
    }
    let document = CatalogDocument::from_records(records, audio_url_prefix);
    document.write_to(path)?;
    Ok(Some(document))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published(assignment: &str, composer: &str, title: &str, file: Option<&str>) -> Record {
        let mut record =
            Record::from_cells(assignment, composer, title, "Genre", "https://youtu.be/x");
        record.output_filename = file.map(str::to_string);
        record
    }

    #[test]
    fn test_pieces_sorted_and_failures_excluded() {
        let records = vec![
            published("2a", "Machaut", "Dame", Some("2a_machaut_dame.mp3")),
            published("1b", "Perotinus", "Viderunt", Some("1b_perotinus_viderunt.mp3")),
            published("1b", "Leonin", "Viderunt", Some("1b_leonin_viderunt.mp3")),
            published("3a", "Farmer", "Fair Phyllis", None),
        ];
        let doc = CatalogDocument::from_records(&records, "audio");

        let order: Vec<(&str, &str)> = doc
            .pieces
            .iter()
            .map(|p| (p.assignment.as_str(), p.composer.as_str()))
            .collect();
        assert_eq!(order, vec![("1b", "Leonin"), ("1b", "Perotinus"), ("2a", "Machaut")]);
        assert_eq!(doc.assignments, vec!["1b", "2a"]);
        assert_eq!(doc.pieces[0].audio_file, "audio/1b_leonin_viderunt.mp3");
        assert!(doc.audio_available);
    }

    #[test]
    fn test_duplicate_identities_listed_once() {
        let records = vec![
            published("Unit1", "Bach", "Prelude in C", Some("unit1_bach_prelude_in_c.mp3")),
            published("Unit1", "Bach", "Prelude in C", Some("unit1_bach_prelude_in_c.mp3")),
        ];
        let doc = CatalogDocument::from_records(&records, "audio/");
        assert_eq!(doc.pieces.len(), 1);
        assert_eq!(doc.pieces[0].audio_file, "audio/unit1_bach_prelude_in_c.mp3");
    }

    #[test]
    fn test_json_schema_and_unicode() {
        let records = vec![published(
            "4a",
            "Dvořák",
            "Humoresque",
            Some("4a_dvořák_humoresque.mp3"),
        )];
        let json = CatalogDocument::from_records(&records, "audio").to_json().unwrap();
        assert!(json.contains("\"audioFile\": \"audio/4a_dvořák_humoresque.mp3\""));
        assert!(json.contains("\"audioAvailable\": true"));
        assert!(json.contains("Dvořák"));
        assert!(json.starts_with("{\n  \"pieces\""));
    }

    #[test]
    fn test_publish_skips_when_nothing_succeeded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("music_database.json");
        std::fs::write(&path, "previous").unwrap();

        let records = vec![published("1a", "A", "B", None)];
        let result = publish_catalog(&records, "audio", &path).unwrap();
        assert!(result.is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");
    }

    #[test]
    fn test_publish_overwrites_and_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("music_database.json");
        std::fs::write(&path, "previous").unwrap();

        let records = vec![published("1a", "A", "B", Some("1a_a_b.mp3"))];
        let doc = publish_catalog(&records, "audio", &path).unwrap().unwrap();

        let on_disk: CatalogDocument =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, doc);
        assert!(!staging_path(&path).exists());
    }
}
