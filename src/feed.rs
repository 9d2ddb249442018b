//! One fetch-then-compute cycle per request. When requests overlap, only
//! the most recently started one may publish its result.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::aggregate::{aggregate, filter_date_range};
use crate::error::Result;
use crate::insights::compute_insights;
use crate::models::{AggregateBucket, Granularity, InsightSummary};
use crate::sanitize::sanitize;
use crate::source::RecordSource;

pub const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct ViewRequest {
    pub granularity: Granularity,
    /// Restricts buckets (not insights) to one day.
    pub selected_date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: usize,
}

impl ViewRequest {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            selected_date: None,
            from: None,
            to: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub granularity: Granularity,
    pub buckets: Vec<AggregateBucket>,
    pub insights: InsightSummary,
    pub fetched: usize,
    pub dropped: usize,
}

#[derive(Debug)]
pub enum Outcome {
    Fresh(DashboardView),
    /// A newer request started while this one was in flight.
    Superseded,
}

pub struct RecordFeed {
    source: Box<dyn RecordSource>,
    latest: AtomicU64,
}

impl RecordFeed {
    pub fn new(source: Box<dyn RecordSource>) -> Self {
        Self {
            source,
            latest: AtomicU64::new(0),
        }
    }

    pub async fn load(&self, request: &ViewRequest) -> Result<Outcome> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let fetched = self.source.fetch(request.limit).await;

        if self.latest.load(Ordering::SeqCst) != ticket {
            debug!(ticket, source = %self.source.describe(), "discarding superseded result");
            return Ok(Outcome::Superseded);
        }

        let rows = fetched?;
        info!(rows = rows.len(), source = %self.source.describe(), "fetched session rows");
        Ok(Outcome::Fresh(build_view(&rows, request)))
    }
}

/// Sanitize, window, bucket and summarise one snapshot of raw rows.
pub fn build_view(rows: &[Value], request: &ViewRequest) -> DashboardView {
    let sanitized = sanitize(rows);
    let records = filter_date_range(&sanitized.records, request.from, request.to);

    DashboardView {
        granularity: request.granularity,
        buckets: aggregate(&records, request.granularity, request.selected_date),
        insights: compute_insights(&records),
        fetched: rows.len(),
        dropped: sanitized.dropped,
    }
}
