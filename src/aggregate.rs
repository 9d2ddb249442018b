use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::models::{AggregateBucket, BucketKey, Granularity, Metric, Reduce, SessionRecord};

pub type KeyExtractor = fn(&SessionRecord) -> BucketKey;

pub fn key_extractor(granularity: Granularity) -> KeyExtractor {
    match granularity {
        Granularity::Hourly => hour_key,
        Granularity::Daily => day_key,
        Granularity::Weekly => week_key,
    }
}

fn hour_key(record: &SessionRecord) -> BucketKey {
    BucketKey::Hour(record.start_hour)
}

fn day_key(record: &SessionRecord) -> BucketKey {
    BucketKey::Day(record.date)
}

fn week_key(record: &SessionRecord) -> BucketKey {
    BucketKey::Week {
        year: record.date.year(),
        week: week_of_year(record.date),
    }
}

/// Week number within the date's own year. Weeks start on Monday and
/// week 1 is the week containing January 1st.
pub fn week_of_year(date: NaiveDate) -> u32 {
    let ordinal0 = date.ordinal0();
    let jan1_offset = (date.weekday().num_days_from_monday() + 7 - ordinal0 % 7) % 7;
    (ordinal0 + jan1_offset) / 7 + 1
}

/// Buckets `records` under `granularity`, ascending by time key.
/// With `selected_date` only that day's sessions are considered.
pub fn aggregate(
    records: &[SessionRecord],
    granularity: Granularity,
    selected_date: Option<NaiveDate>,
) -> Vec<AggregateBucket> {
    let selected = records
        .iter()
        .filter(|record| selected_date.map_or(true, |date| record.date == date));
    aggregate_by(selected, key_extractor(granularity))
}

pub fn aggregate_by<'a, I, F>(records: I, key_of: F) -> Vec<AggregateBucket>
where
    I: IntoIterator<Item = &'a SessionRecord>,
    F: Fn(&SessionRecord) -> BucketKey,
{
    let mut groups: BTreeMap<BucketKey, Group> = BTreeMap::new();
    for record in records {
        groups.entry(key_of(record)).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(key, group)| group.into_bucket(key))
        .collect()
}

/// Inclusive date window; an open bound does not filter.
pub fn filter_date_range(
    records: &[SessionRecord],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<SessionRecord> {
    records
        .iter()
        .filter(|record| from.map_or(true, |from| record.date >= from))
        .filter(|record| to.map_or(true, |to| record.date <= to))
        .cloned()
        .collect()
}

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    count: usize,
    // Mean is kept as origin + sum of offsets so constant series stay exact.
    origin: f64,
    offset_sum: f64,
    max: f64,
    min: f64,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.origin = value;
            self.max = value;
            self.min = value;
        } else {
            self.max = self.max.max(value);
            self.min = self.min.min(value);
        }
        self.offset_sum += value - self.origin;
        self.count += 1;
    }

    fn finish(&self, reduce: Reduce) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(match reduce {
            Reduce::Mean => self.origin + self.offset_sum / self.count as f64,
            Reduce::Max => self.max,
            Reduce::Min => self.min,
        })
    }
}

#[derive(Debug, Default)]
struct Group {
    sample_count: usize,
    stats: [Accumulator; Metric::ALL.len()],
}

impl Group {
    fn push(&mut self, record: &SessionRecord) {
        self.sample_count += 1;
        for metric in Metric::ALL {
            if let Some(value) = metric.of_record(record) {
                self.stats[metric as usize].push(value);
            }
        }
    }

    fn stat(&self, metric: Metric) -> Option<f64> {
        self.stats[metric as usize].finish(metric.reduce())
    }

    // Required metrics are present on every sanitized record, so their
    // accumulators are never empty for a non-empty group.
    fn required(&self, metric: Metric) -> f64 {
        self.stat(metric).unwrap_or_default()
    }

    fn into_bucket(self, key: BucketKey) -> AggregateBucket {
        AggregateBucket {
            key,
            attendance_pct: self.required(Metric::AttendancePct),
            avg_attention_rate: self.required(Metric::AvgAttentionRate),
            max_attention_rate: self.stat(Metric::MaxAttentionRate),
            min_attention_rate: self.stat(Metric::MinAttentionRate),
            avg_distraction_rate: self.required(Metric::AvgDistractionRate),
            max_distraction_rate: self.stat(Metric::MaxDistractionRate),
            min_distraction_rate: self.stat(Metric::MinDistractionRate),
            avg_students_no: self.required(Metric::AvgStudentsNo),
            max_students_no: self.required(Metric::MaxStudentsNo),
            min_students_no: self.required(Metric::MinStudentsNo),
            students_enrolled: self.required(Metric::StudentsEnrolled),
            sample_count: self.sample_count,
        }
    }
}
