//! Source spreadsheet loading.

use std::io::Read;
use std::path::Path;

use quizclips_common::error::{QuizError, QuizResult};
use serde::Deserialize;

use crate::record::Record;

/// Header columns the source table must provide. Other columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 5] = ["assignment", "composer", "title", "genre", "youtube_url"];

/// Raw row as exported from the spreadsheet.
#[derive(Debug, Deserialize)]
struct SourceRow {
    assignment: String,
    composer: String,
    title: String,
    genre: String,
    youtube_url: String,
}

/// Load every record of the source table, in row order.
pub fn load_records(path: impl AsRef<Path>) -> QuizResult<Vec<Record>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(QuizError::input(path, "source table not found"));
    }
    let file = std::fs::File::open(path)
        .map_err(|e| QuizError::input(path, format!("failed to open: {e}")))?;
    let records = read_records(file, path)?;
    tracing::info!(path = %path.display(), count = records.len(), "Loaded source table");
    Ok(records)
}

/// Parse records from any CSV reader. `origin` is only used in error messages.
pub fn read_records<R: Read>(reader: R, origin: &Path) -> QuizResult<Vec<Record>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| QuizError::input(origin, format!("unreadable header row: {e}")))?
        .clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(QuizError::input(
            origin,
            format!("missing column(s): {}", missing.join(", ")),
        ));
    }

    let mut records = Vec::new();
    for (index, row) in csv_reader.deserialize::<SourceRow>().enumerate() {
        // Header is line 1.
        let row = row.map_err(|e| {
            QuizError::input(origin, format!("row {} is malformed: {e}", index + 2))
        })?;
        records.push(Record::from_cells(
            &row.assignment,
            &row.composer,
            &row.title,
            &row.genre,
            &row.youtube_url,
        ));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "assignment,composer,title,genre,youtube_url\n\
1a,Anonymous,Agnus Dei,Chant,https://youtu.be/6KF_dfuDOyc\n\
1b ,Leonin,\"Viderunt Omnes\",two-part organum,https://www.youtube.com/watch?v=_p9WQlyVPrA\n\
2a,Guillaume de Machaut,\"\"\"Dame, de qui toute ma joie vient\"\",\",\
Chanson,https://youtu.be/u65rzEfxbqA?si=x\n";

    #[test]
    fn test_read_records_in_row_order() {
        let records = read_records(SHEET.as_bytes(), Path::new("sheet.csv")).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].title, "Agnus Dei");
        assert_eq!(records[0].source_url, "https://www.youtube.com/watch?v=6KF_dfuDOyc");
        assert_eq!(records[1].assignment, "1b");
        assert_eq!(records[1].source_url, "https://www.youtube.com/watch?v=_p9WQlyVPrA");
        assert_eq!(records[2].title, "Dame, de qui toute ma joie vient");
        assert_eq!(records[2].source_url, "https://www.youtube.com/watch?v=u65rzEfxbqA");
        assert!(records.iter().all(|r| r.output_filename.is_none()));
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let sheet = "notes,assignment,composer,title,genre,youtube_url\n\
                     x,1a,Bach,Air,Suite,https://youtu.be/a\n";
        let records = read_records(sheet.as_bytes(), Path::new("sheet.csv")).unwrap();
        assert_eq!(records[0].composer, "Bach");
    }

    #[test]
    fn test_missing_column_is_input_error() {
        let sheet = "assignment,composer,title,genre\n1a,Bach,Air,Suite\n";
        let err = read_records(sheet.as_bytes(), Path::new("sheet.csv")).unwrap_err();
        match err {
            QuizError::Input { message, .. } => assert!(message.contains("youtube_url")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_row_is_input_error() {
        let sheet = "assignment,composer,title,genre,youtube_url\n1a,Bach\n";
        let err = read_records(sheet.as_bytes(), Path::new("sheet.csv")).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_records(dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, QuizError::Input { .. }));
        assert!(err.is_fatal_before_processing());
    }
}
