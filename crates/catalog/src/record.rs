//! Piece records loaded from the source spreadsheet.

use serde::{Deserialize, Serialize};

/// One spreadsheet row describing a musical piece and its source video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Grouping key (non-unique), e.g. `1a`.
    pub assignment: String,

    /// Composer as written in the sheet.
    pub composer: String,

    /// Title with stray quote/comma artifacts removed.
    pub title: String,

    /// Genre label shown on the quiz card.
    pub genre: String,

    /// Canonical long-form video URL.
    pub source_url: String,

    /// Excerpt filename, set only once the excerpt exists on disk.
    #[serde(default)]
    pub output_filename: Option<String>,
}

/// The three fields the excerpt filename is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity<'a> {
    pub assignment: &'a str,
    pub composer: &'a str,
    pub title: &'a str,
}

impl Record {
    /// Build a record from raw cell values, applying the loader's cleanup rules.
    pub fn from_cells(
        assignment: &str,
        composer: &str,
        title: &str,
        genre: &str,
        source_url: &str,
    ) -> Self {
        Self {
            assignment: assignment.trim().to_string(),
            composer: composer.trim().to_string(),
            title: clean_title(title),
            genre: genre.trim().to_string(),
            source_url: crate::url::normalize_video_url(source_url),
            output_filename: None,
        }
    }

    pub fn identity(&self) -> Identity<'_> {
        Identity {
            assignment: &self.assignment,
            composer: &self.composer,
            title: &self.title,
        }
    }

    /// Whether this record has a finished excerpt attached.
    pub fn is_published(&self) -> bool {
        self.output_filename
            .as_deref()
            .is_some_and(|name| !name.is_empty())
    }
}

/// Trim whitespace, then any leading/trailing `"` and `,` left over from
/// spreadsheet exports.
pub fn clean_title(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == ',')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title_strips_export_artifacts() {
        assert_eq!(clean_title("  \"Flow My Tears\",  "), "Flow My Tears");
        assert_eq!(
            clean_title("Dame, de qui toute ma joie vient"),
            "Dame, de qui toute ma joie vient"
        );
        assert_eq!(clean_title("\",\""), "");
    }

    #[test]
    fn test_from_cells_normalizes_url_and_trims() {
        let record = Record::from_cells(
            " 1a ",
            "Anonymous ",
            "Agnus Dei",
            " Chant",
            "https://youtu.be/6KF_dfuDOyc",
        );
        assert_eq!(record.assignment, "1a");
        assert_eq!(record.composer, "Anonymous");
        assert_eq!(record.genre, "Chant");
        assert_eq!(record.source_url, "https://www.youtube.com/watch?v=6KF_dfuDOyc");
        assert!(!record.is_published());
    }

    #[test]
    fn test_empty_filename_is_not_published() {
        let mut record = Record::from_cells("1a", "A", "B", "C", "https://x");
        record.output_filename = Some(String::new());
        assert!(!record.is_published());
        record.output_filename = Some("1a_a_b.mp3".to_string());
        assert!(record.is_published());
    }

    #[test]
    fn test_identity_orders_by_assignment_then_composer_then_title() {
        let a = Record::from_cells("1a", "Bach", "Zeta", "", "");
        let b = Record::from_cells("1a", "Byrd", "Alpha", "", "");
        let c = Record::from_cells("1b", "Aaron", "Alpha", "", "");
        assert!(a.identity() < b.identity());
        assert!(b.identity() < c.identity());
    }
}
