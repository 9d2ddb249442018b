use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;

/// Where raw session rows come from. Rows are untrusted and must go
/// through [`crate::sanitize::sanitize`] before any typed code sees them.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self, limit: usize) -> Result<Vec<Value>>;

    /// Short human-readable origin, used in log lines.
    fn describe(&self) -> String;
}

/// A CSV export of the session table. Every cell is read as text and
/// coerced later by the sanitizer.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for CsvSource {
    async fn fetch(&self, limit: usize) -> Result<Vec<Value>> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut rows = Vec::new();

        for (line, result) in reader.deserialize::<HashMap<String, String>>().enumerate() {
            if rows.len() >= limit {
                break;
            }
            match result {
                Ok(row) => rows.push(Value::Object(
                    row.into_iter()
                        .map(|(column, cell)| (column, Value::String(cell)))
                        .collect(),
                )),
                Err(err) => {
                    // Unreadable rows reach the sanitizer as non-objects and are dropped there.
                    debug!(line = line + 2, %err, "unreadable CSV row");
                    rows.push(Value::Null);
                }
            }
        }

        Ok(rows)
    }

    fn describe(&self) -> String {
        format!("csv file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::sanitize;
    use std::io::Write;

    const HEADER: &str = "date,start_time,end_time,students_enrolled,avg_students_no,max_students_no,min_students_no,attendance_pct,avg_attention_rate,avg_distraction_rate";

    fn write_csv(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[tokio::test]
    async fn reads_rows_as_text_for_the_sanitizer() {
        let file = write_csv(&[
            "2024-01-01,09:00,09:30,25,20,22,18,80,70,30",
            "2024-01-01,09:30,10:00,25,19,21,17,76,N/A,40",
        ]);

        let rows = CsvSource::new(file.path()).fetch(100).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["attendance_pct"], Value::String("80".to_string()));

        let sanitized = sanitize(&rows);
        assert_eq!(sanitized.records.len(), 1);
        assert_eq!(sanitized.dropped, 1);
        assert_eq!(sanitized.records[0].avg_students_no, 20.0);
    }

    #[tokio::test]
    async fn ragged_rows_are_dropped_not_fatal() {
        let file = write_csv(&[
            "2024-01-01,09:00",
            "2024-01-02,09:00,09:30,25,20,22,18,80,70,30",
        ]);

        let rows = CsvSource::new(file.path()).fetch(100).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_null());
        assert_eq!(sanitize(&rows).records.len(), 1);
    }

    #[tokio::test]
    async fn honours_the_row_limit() {
        let file = write_csv(&[
            "2024-01-01,09:00,09:30,25,20,22,18,80,70,30",
            "2024-01-02,09:00,09:30,25,20,22,18,80,70,30",
            "2024-01-03,09:00,09:30,25,20,22,18,80,70,30",
        ]);

        let rows = CsvSource::new(file.path()).fetch(2).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let result = CsvSource::new("/nonexistent/sessions.csv").fetch(10).await;
        assert!(result.is_err());
    }
}
