//! Untrusted-input boundary: turns loosely typed session rows into
//! [`SessionRecord`]s or a per-candidate [`Rejection`].

use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::models::{Metric, SessionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("candidate is not an object")]
    NotAnObject,
    #[error("field `{0}` is missing or not a finite number")]
    MissingField(&'static str),
    #[error("field `{0}` is out of range")]
    OutOfRange(&'static str),
    #[error("date is missing or not YYYY-MM-DD")]
    InvalidDate,
    #[error("start time is missing or has no recognisable hour")]
    InvalidStartTime,
}

#[derive(Debug, Clone, Default)]
pub struct Sanitized {
    /// Accepted records, in input order.
    pub records: Vec<SessionRecord>,
    pub dropped: usize,
}

/// Keeps every well-formed candidate and drops the rest. Never fails.
pub fn sanitize(candidates: &[Value]) -> Sanitized {
    let mut sanitized = Sanitized {
        records: Vec::with_capacity(candidates.len()),
        dropped: 0,
    };

    for (index, candidate) in candidates.iter().enumerate() {
        match sanitize_record(candidate) {
            Ok(record) => sanitized.records.push(record),
            Err(reason) => {
                debug!(index, %reason, "dropping session candidate");
                sanitized.dropped += 1;
            }
        }
    }

    info!(
        kept = sanitized.records.len(),
        dropped = sanitized.dropped,
        "sanitized session candidates"
    );
    sanitized
}

pub fn sanitize_record(candidate: &Value) -> Result<SessionRecord, Rejection> {
    let object = candidate.as_object().ok_or(Rejection::NotAnObject)?;

    let date = lookup(object, "date", "date")
        .and_then(parse_date)
        .ok_or(Rejection::InvalidDate)?;

    let start_time = lookup(object, "start_time", "startTime")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(Rejection::InvalidStartTime)?;
    let start_hour = parse_start_hour(start_time).ok_or(Rejection::InvalidStartTime)?;

    let end_time = lookup(object, "end_time", "endTime")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let mut values = [None; Metric::ALL.len()];
    for (slot, metric) in values.iter_mut().zip(Metric::ALL) {
        *slot = metric_value(object, metric)?;
    }
    // Required metrics were checked by `metric_value`.
    let required = |metric: Metric| values[metric as usize].unwrap_or_default();

    Ok(SessionRecord {
        date,
        start_time: start_time.to_string(),
        end_time,
        start_hour,
        attendance_pct: required(Metric::AttendancePct),
        avg_attention_rate: required(Metric::AvgAttentionRate),
        max_attention_rate: values[Metric::MaxAttentionRate as usize],
        min_attention_rate: values[Metric::MinAttentionRate as usize],
        avg_distraction_rate: required(Metric::AvgDistractionRate),
        max_distraction_rate: values[Metric::MaxDistractionRate as usize],
        min_distraction_rate: values[Metric::MinDistractionRate as usize],
        avg_students_no: required(Metric::AvgStudentsNo),
        max_students_no: required(Metric::MaxStudentsNo),
        min_students_no: required(Metric::MinStudentsNo),
        students_enrolled: required(Metric::StudentsEnrolled),
    })
}

fn lookup<'a>(object: &'a Map<String, Value>, snake: &str, camel: &str) -> Option<&'a Value> {
    object
        .get(snake)
        .or_else(|| object.get(camel))
        .filter(|value| !value.is_null())
}

fn metric_value(object: &Map<String, Value>, metric: Metric) -> Result<Option<f64>, Rejection> {
    let value = match lookup(object, metric.column(), metric.camel_name()).and_then(to_number) {
        Some(value) => value,
        None if metric.is_required() => return Err(Rejection::MissingField(metric.column())),
        None => return Ok(None),
    };

    let in_range = if metric.is_percentage() {
        (0.0..=100.0).contains(&value)
    } else {
        value >= 0.0
    };
    if !in_range {
        return Err(Rejection::OutOfRange(metric.column()));
    }
    Ok(Some(value))
}

/// Number-or-nothing coercion. Numeric strings count; NaN and infinities do not.
pub fn to_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            text.parse::<f64>().ok()?
        }
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    let day = match text.get(..10) {
        Some(day) if text.len() == 10 || matches!(text.as_bytes()[10], b'T' | b' ') => day,
        _ => return None,
    };
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Hour of day from `HH:MM`, `HH:MM:SS`, `H:MM AM`, `H AM` or `HAM` (any case).
pub fn parse_start_hour(start_time: &str) -> Option<u32> {
    let upper = start_time.trim().to_ascii_uppercase();
    let (clock, meridiem) = if let Some(rest) = upper.strip_suffix("AM") {
        (rest.trim_end(), Some(false))
    } else if let Some(rest) = upper.strip_suffix("PM") {
        (rest.trim_end(), Some(true))
    } else {
        (upper.as_str(), None)
    };

    let parts: Vec<&str> = clock.split(':').collect();
    let allowed_parts = if meridiem.is_some() { 1..=2 } else { 2..=3 };
    if !allowed_parts.contains(&parts.len()) {
        return None;
    }

    let hour = parse_clock_part(parts[0], 1..=2)?;
    for part in &parts[1..] {
        if parse_clock_part(part, 2..=2)? > 59 {
            return None;
        }
    }

    match meridiem {
        None if hour <= 23 => Some(hour),
        None => None,
        Some(pm) if (1..=12).contains(&hour) => Some(match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (hour, false) => hour,
            (hour, true) => hour + 12,
        }),
        Some(_) => None,
    }
}

fn parse_clock_part(part: &str, digits: std::ops::RangeInclusive<usize>) -> Option<u32> {
    if !digits.contains(&part.len()) || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}
