//! Issue data loading
//!
//! Reads tab-separated files with a header line. Columns are matched by
//! name, so files carrying extra columns (an `ID` column, for instance)
//! load fine as long as `Title`, `Description` and `Area` are present.

mod frame;
mod sparse;

pub use frame::{Column, ColumnInfo, ColumnKind, Frame, Schema};
pub use sparse::SparseVector;

use crate::error::{PredictorError, Result};
use crate::models::GitHubIssue;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const TITLE_COLUMN: &str = "Title";
pub const DESCRIPTION_COLUMN: &str = "Description";
pub const AREA_COLUMN: &str = "Area";

const SEPARATOR: char = '\t';

/// Positions of the required columns within a header line
#[derive(Debug, Clone, Copy)]
struct HeaderLayout {
    title: usize,
    description: usize,
    area: usize,
}

impl HeaderLayout {
    fn parse(header: &str, path: &Path) -> Result<Self> {
        let names: Vec<String> = header
            .split(SEPARATOR)
            .map(|n| n.trim().to_ascii_lowercase())
            .collect();
        let find = |column: &str| {
            let wanted = column.to_ascii_lowercase();
            names.iter().position(|n| *n == wanted).ok_or_else(|| {
                PredictorError::schema(path, Some(1), format!("missing column '{column}'"))
            })
        };
        Ok(Self {
            title: find(TITLE_COLUMN)?,
            description: find(DESCRIPTION_COLUMN)?,
            area: find(AREA_COLUMN)?,
        })
    }

    fn min_fields(&self) -> usize {
        self.title.max(self.description).max(self.area) + 1
    }
}

/// Labeled issues loaded fully into memory
#[derive(Debug, Clone)]
pub struct IssueDataset {
    source: PathBuf,
    rows: Vec<GitHubIssue>,
}

impl IssueDataset {
    /// Load a tab-separated issue file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PredictorError::io(path, e))?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines().enumerate();

        let header = match lines.next() {
            Some((_, line)) => line.map_err(|e| PredictorError::io(path, e))?,
            None => return Err(PredictorError::schema(path, None, "file is empty")),
        };
        let header = header.trim_start_matches('\u{feff}').trim_end_matches('\r');
        let layout = HeaderLayout::parse(header, path)?;
        let min_fields = layout.min_fields();

        let mut rows = Vec::new();
        for (idx, line) in lines {
            let line = line.map_err(|e| match e.kind() {
                std::io::ErrorKind::InvalidData => {
                    PredictorError::schema(path, Some(idx + 1), "line is not valid UTF-8")
                }
                _ => PredictorError::io(path, e),
            })?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(SEPARATOR).collect();
            if fields.len() < min_fields {
                return Err(PredictorError::schema(
                    path,
                    Some(idx + 1),
                    format!("expected at least {} fields, found {}", min_fields, fields.len()),
                ));
            }

            rows.push(GitHubIssue {
                title: fields[layout.title].to_string(),
                description: fields[layout.description].to_string(),
                area: fields[layout.area].trim().to_string(),
            });
        }

        info!("Loaded {} issues from {}", rows.len(), path.display());
        debug!(
            "Column layout: title={}, description={}, area={}",
            layout.title, layout.description, layout.area
        );

        Ok(Self {
            source: path.to_path_buf(),
            rows,
        })
    }

    /// Wrap rows that did not come from a file
    pub fn from_rows(rows: Vec<GitHubIssue>) -> Self {
        Self {
            source: PathBuf::from("<memory>"),
            rows,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[GitHubIssue] {
        &self.rows
    }

    /// Row count per area label
    pub fn area_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.area.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Input schema shared by every issue file
    pub fn schema() -> Schema {
        issue_schema()
    }

    pub fn to_frame(&self) -> Result<Frame> {
        issues_to_frame(&self.rows)
    }
}

pub(crate) fn issue_schema() -> Schema {
    Schema::new([
        (TITLE_COLUMN, ColumnKind::Text),
        (DESCRIPTION_COLUMN, ColumnKind::Text),
        (AREA_COLUMN, ColumnKind::Text),
    ])
}

/// Project issues into a frame with `Title`, `Description` and `Area` text columns
pub(crate) fn issues_to_frame(issues: &[GitHubIssue]) -> Result<Frame> {
    let mut frame = Frame::new(issues.len());
    let columns: [(&str, Vec<String>); 3] = [
        (TITLE_COLUMN, issues.iter().map(|i| i.title.clone()).collect()),
        (DESCRIPTION_COLUMN, issues.iter().map(|i| i.description.clone()).collect()),
        (AREA_COLUMN, issues.iter().map(|i| i.area.clone()).collect()),
    ];
    for (name, values) in columns {
        frame.insert(name, Column::Text(values))?;
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tsv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_by_header_name() {
        let file = write_tsv(
            "ID\tArea\tTitle\tDescription\n\
             1\tarea-System.Net\tHttpClient hangs\tRequests never complete\n\
             2\tarea-System.IO\tFile.Move fails\tAccess denied on rename\n",
        );
        let data = IssueDataset::load(file.path()).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.rows()[0].area, "area-System.Net");
        assert_eq!(data.rows()[0].title, "HttpClient hangs");
        assert_eq!(data.rows()[1].description, "Access denied on rename");
    }

    #[test]
    fn test_load_handles_crlf_and_blank_lines() {
        let file = write_tsv("Title\tDescription\tArea\r\nA\tB\tarea-x\r\n\r\nC\tD\tarea-y\r\n");
        let data = IssueDataset::load(file.path()).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.rows()[0].area, "area-x");
        assert_eq!(data.rows()[1].area, "area-y");
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let file = write_tsv("Title\tDescription\nA\tB\n");
        let err = IssueDataset::load(file.path()).unwrap_err();
        assert!(matches!(err, PredictorError::Schema { .. }));
        assert!(err.to_string().contains("Area"));
    }

    #[test]
    fn test_short_row_is_schema_error() {
        let file = write_tsv("Title\tDescription\tArea\nA\tB\tarea-x\nonly-title\n");
        let err = IssueDataset::load(file.path()).unwrap_err();
        match err {
            PredictorError::Schema { line, .. } => assert_eq!(line, Some(3)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = IssueDataset::load("/nonexistent/issues.tsv").unwrap_err();
        assert!(matches!(err, PredictorError::Io { .. }));
    }

    #[test]
    fn test_empty_file_is_schema_error() {
        let file = write_tsv("");
        assert!(matches!(
            IssueDataset::load(file.path()),
            Err(PredictorError::Schema { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_row_is_schema_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Area\tTitle\tDescription\nnet\tok\tfine\nio\tbad \xff\xfe\tbytes\n")
            .unwrap();
        let err = IssueDataset::load(file.path()).unwrap_err();
        assert!(matches!(err, PredictorError::Schema { line: Some(3), .. }));
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_area_counts_and_frame() {
        let data = IssueDataset::from_rows(vec![
            GitHubIssue {
                title: "a".into(),
                description: "b".into(),
                area: "x".into(),
            },
            GitHubIssue {
                title: "c".into(),
                description: "d".into(),
                area: "x".into(),
            },
        ]);
        assert_eq!(data.area_counts().get("x"), Some(&2));

        let frame = data.to_frame().unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.text(AREA_COLUMN).unwrap()[1], "x");
        assert_eq!(frame.schema(), IssueDataset::schema());
    }
}
