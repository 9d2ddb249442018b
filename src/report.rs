//! Presentation adapter: chart-ready series and plain-text tables.
//! Rounding happens here and nowhere upstream.

use std::fmt::Write;

use serde::Serialize;

use crate::models::{weekday_name, AggregateBucket, InsightSummary, Metric};

/// The dashboard's chart panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ChartView {
    /// Average attention vs average distraction
    Attention,
    /// Average attention with its per-bucket max and min
    AttentionRange,
    /// Student counts against enrollment
    Students,
    /// Attendance percentage
    Attendance,
}

impl ChartView {
    pub fn metrics(self) -> &'static [Metric] {
        match self {
            ChartView::Attention => &[Metric::AvgAttentionRate, Metric::AvgDistractionRate],
            ChartView::AttentionRange => &[
                Metric::AvgAttentionRate,
                Metric::MaxAttentionRate,
                Metric::MinAttentionRate,
            ],
            ChartView::Students => &[
                Metric::AvgStudentsNo,
                Metric::MaxStudentsNo,
                Metric::MinStudentsNo,
                Metric::StudentsEnrolled,
            ],
            ChartView::Attendance => &[Metric::AttendancePct],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: &'static str,
    /// One value per label; `None` where the bucket lacks the metric.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

pub fn chart_data(buckets: &[AggregateBucket], view: ChartView) -> ChartData {
    ChartData {
        labels: buckets.iter().map(|bucket| bucket.key.label()).collect(),
        series: view
            .metrics()
            .iter()
            .map(|metric| ChartSeries {
                name: metric.camel_name(),
                values: buckets.iter().map(|bucket| metric.of_bucket(bucket)).collect(),
            })
            .collect(),
    }
}

pub fn render_buckets(buckets: &[AggregateBucket], view: ChartView) -> String {
    let mut output = String::new();

    if buckets.is_empty() {
        let _ = writeln!(output, "No sessions recorded for this window.");
        return output;
    }

    let _ = write!(output, "{:<10} {:>8}", "period", "sessions");
    for metric in view.metrics() {
        let _ = write!(output, " {:>20}", metric.column());
    }
    let _ = writeln!(output);

    for bucket in buckets {
        let _ = write!(output, "{:<10} {:>8}", bucket.key.label(), bucket.sample_count);
        for metric in view.metrics() {
            match metric.of_bucket(bucket) {
                Some(value) => {
                    let _ = write!(output, " {value:>20.1}");
                }
                None => {
                    let _ = write!(output, " {:>20}", "-");
                }
            }
        }
        let _ = writeln!(output);
    }

    output
}

pub fn render_insights(summary: &InsightSummary) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Classroom Insights");
    let _ = writeln!(output, "Sessions analysed: {}", summary.total_sessions);

    if summary.total_sessions == 0 {
        let _ = writeln!(output, "No sessions recorded for this window.");
        return output;
    }

    let _ = writeln!(
        output,
        "Attendance/attention correlation: {:.2}",
        summary.correlation_attendance_attention
    );
    if let (Some(attendance), Some(attention)) =
        (summary.overall_attendance, summary.overall_attention)
    {
        let _ = writeln!(
            output,
            "Overall attendance {attendance:.1}%, attention {attention:.1}%"
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Days");
    if let Some(day) = &summary.best_day {
        let _ = writeln!(
            output,
            "- Best day: {} (attendance {:.1}%, attention {:.1}%)",
            day.date, day.attendance, day.attention
        );
    }
    if let Some(day) = &summary.worst_day {
        let _ = writeln!(
            output,
            "- Worst day: {} (attendance {:.1}%, attention {:.1}%)",
            day.date, day.attendance, day.attention
        );
    }
    if let Some(weekday) = &summary.best_weekday {
        let _ = writeln!(
            output,
            "- Most attentive weekday: {} ({:.1}%)",
            weekday_name(weekday.weekday),
            weekday.attention
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Time Slots");
    if let Some(slot) = &summary.best_time_slot {
        let _ = writeln!(output, "- Best slot: {} ({:.1}% attention)", slot.time, slot.attention);
    }
    if let Some(slot) = &summary.worst_time_slot {
        let _ = writeln!(output, "- Worst slot: {} ({:.1}% attention)", slot.time, slot.attention);
    }
    if let Some(peak) = &summary.peak_hour {
        let _ = writeln!(
            output,
            "- Peak attention hour: {:02}:00 ({:.1}%)",
            peak.hour, peak.attention
        );
    }

    if let Some(trend) = &summary.capacity_trend {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Capacity");
        let _ = writeln!(
            output,
            "- Peak students last 7 days {:.1} vs previous 7 days {:.1} ({})",
            trend.recent_capacity,
            trend.previous_capacity,
            trend.direction.as_str()
        );
    }

    output
}
