//! Classroom attendance and attention analytics: sanitizes raw session rows
//! from the analytics backend, buckets them by hour, day or week, and derives
//! dashboard insights.

pub mod aggregate;
pub mod client;
pub mod db;
pub mod error;
pub mod feed;
pub mod insights;
pub mod logging;
pub mod models;
pub mod report;
pub mod sanitize;
pub mod source;

pub use aggregate::aggregate;
pub use error::{Error, Result};
pub use insights::compute_insights;
pub use models::{AggregateBucket, Granularity, InsightSummary, SessionRecord};
pub use sanitize::sanitize;
