//! Error types for classroom-insights

use thiserror::Error;

/// Failures of the fetch side of the pipeline. The pure stages never fail.
#[derive(Error, Debug)]
pub enum Error {
    /// Network or transport failure talking to the analytics backend
    #[error("request to analytics backend failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status
    #[error("analytics backend returned {status} for {url}")]
    Status { status: u16, url: String },

    /// 2xx body that is not a JSON array of rows
    #[error("unexpected payload: {0}")]
    Payload(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// CSV read error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// No API URL, database URL or CSV file was given
    #[error("no record source configured (set --api-url, --database-url or --csv)")]
    NoSource,
}

/// Result type alias for classroom-insights
pub type Result<T> = std::result::Result<T, Error>;
