use std::collections::HashMap;
use std::hash::Hash;

use chrono::{Datelike, Duration};

use crate::models::{
    CapacityTrend, DayInsight, HourInsight, InsightSummary, SessionRecord, TimeSlotInsight,
    TrendDirection, WeekdayInsight,
};

/// Dashboard summary over raw session records (never over buckets).
/// Pure: the same records always produce the same summary.
pub fn compute_insights(records: &[SessionRecord]) -> InsightSummary {
    let attendance: Vec<f64> = records.iter().map(|r| r.attendance_pct).collect();
    let attention: Vec<f64> = records.iter().map(|r| r.avg_attention_rate).collect();

    let days = group_means(records, |r| r.date);
    let best_day = pick(&days, |g| g.attendance, Pick::Highest).map(day_insight);
    let worst_day = pick(&days, |g| g.attendance, Pick::Lowest).map(day_insight);

    let slots = group_means(records, |r| r.start_time.clone());
    let best_time_slot = pick(&slots, |g| g.attention, Pick::Highest).map(slot_insight);
    let worst_time_slot = pick(&slots, |g| g.attention, Pick::Lowest).map(slot_insight);

    let hours = group_means(records, |r| r.start_hour);
    let peak_hour = pick(&hours, |g| g.attention, Pick::Highest).map(|g| HourInsight {
        hour: g.key,
        attention: g.attention,
    });

    let weekdays = group_means(records, |r| r.date.weekday());
    let best_weekday = pick(&weekdays, |g| g.attention, Pick::Highest).map(|g| WeekdayInsight {
        weekday: g.key,
        attention: g.attention,
    });

    InsightSummary {
        correlation_attendance_attention: pearson(&attendance, &attention),
        best_day,
        worst_day,
        best_time_slot,
        worst_time_slot,
        total_sessions: records.len(),
        overall_attention: mean(&attention),
        overall_attendance: mean(&attendance),
        peak_hour,
        best_weekday,
        capacity_trend: capacity_trend(records),
    }
}

/// Pearson correlation of two series paired by index. Returns 0 when either
/// series is flat or there are fewer than two pairs.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sum_xy += dx * dy;
        sum_xx += dx * dx;
        sum_yy += dy * dy;
    }

    let denominator = (sum_xx * sum_yy).sqrt();
    if denominator <= 1e-12 {
        0.0
    } else {
        (sum_xy / denominator).clamp(-1.0, 1.0)
    }
}

/// Mean `max_students_no` of the week ending at the latest session date
/// against the week before it.
pub fn capacity_trend(records: &[SessionRecord]) -> Option<CapacityTrend> {
    let latest = records.iter().map(|r| r.date).max()?;
    let recent_start = latest - Duration::days(6);
    let previous_start = latest - Duration::days(13);

    let recent: Vec<f64> = records
        .iter()
        .filter(|r| r.date >= recent_start)
        .map(|r| r.max_students_no)
        .collect();
    let previous: Vec<f64> = records
        .iter()
        .filter(|r| r.date >= previous_start && r.date < recent_start)
        .map(|r| r.max_students_no)
        .collect();

    let recent_capacity = mean(&recent).unwrap_or_default();
    let previous_capacity = mean(&previous).unwrap_or_default();
    let direction = if recent_capacity > previous_capacity {
        TrendDirection::Increasing
    } else if recent_capacity < previous_capacity {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    Some(CapacityTrend {
        recent_capacity,
        previous_capacity,
        direction,
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[derive(Debug, Clone)]
struct GroupMean<K> {
    key: K,
    attendance: f64,
    attention: f64,
}

/// Per-key means of attendance and attention, in first-seen key order.
fn group_means<K, F>(records: &[SessionRecord], key_of: F) -> Vec<GroupMean<K>>
where
    K: Eq + Hash + Clone,
    F: Fn(&SessionRecord) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut sums: Vec<(K, f64, f64, usize)> = Vec::new();

    for record in records {
        let key = key_of(record);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            sums.push((key, 0.0, 0.0, 0));
            sums.len() - 1
        });
        let entry = &mut sums[slot];
        entry.1 += record.attendance_pct;
        entry.2 += record.avg_attention_rate;
        entry.3 += 1;
    }

    sums.into_iter()
        .map(|(key, attendance, attention, count)| GroupMean {
            key,
            attendance: attendance / count as f64,
            attention: attention / count as f64,
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum Pick {
    Highest,
    Lowest,
}

/// Ties keep the earliest group.
fn pick<K>(
    groups: &[GroupMean<K>],
    score: impl Fn(&GroupMean<K>) -> f64,
    which: Pick,
) -> Option<&GroupMean<K>> {
    let mut chosen: Option<&GroupMean<K>> = None;
    for group in groups {
        let better = match chosen {
            None => true,
            Some(current) => match which {
                Pick::Highest => score(group) > score(current),
                Pick::Lowest => score(group) < score(current),
            },
        };
        if better {
            chosen = Some(group);
        }
    }
    chosen
}

fn day_insight(group: &GroupMean<chrono::NaiveDate>) -> DayInsight {
    DayInsight {
        date: group.key,
        attendance: group.attendance,
        attention: group.attention,
    }
}

fn slot_insight(group: &GroupMean<String>) -> TimeSlotInsight {
    TimeSlotInsight {
        time: group.key.clone(),
        attention: group.attention,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::sample_record;
    use chrono::{NaiveDate, Weekday};
    use proptest::prelude::*;

    fn day(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn two_day_example_picks_best_and_worst_day() {
        let records = vec![
            sample_record("2024-01-01", "09:00", 80.0, 70.0),
            sample_record("2024-01-02", "09:00", 60.0, 50.0),
        ];

        let summary = compute_insights(&records);
        assert_eq!(
            summary.best_day,
            Some(DayInsight {
                date: day("2024-01-01"),
                attendance: 80.0,
                attention: 70.0
            })
        );
        assert_eq!(
            summary.worst_day,
            Some(DayInsight {
                date: day("2024-01-02"),
                attendance: 60.0,
                attention: 50.0
            })
        );
        assert!(summary.correlation_attendance_attention > 0.0);
        assert_eq!(summary.total_sessions, 2);
    }

    #[test]
    fn empty_input_yields_empty_summary() {
        let summary = compute_insights(&[]);
        assert_eq!(summary.total_sessions, 0);
        assert_eq!(summary.correlation_attendance_attention, 0.0);
        assert!(summary.best_day.is_none());
        assert!(summary.worst_day.is_none());
        assert!(summary.best_time_slot.is_none());
        assert!(summary.worst_time_slot.is_none());
        assert!(summary.overall_attention.is_none());
        assert!(summary.peak_hour.is_none());
        assert!(summary.capacity_trend.is_none());
    }

    #[test]
    fn flat_series_has_zero_correlation() {
        assert_eq!(pearson(&[50.0, 50.0, 50.0], &[10.0, 40.0, 90.0]), 0.0);
        assert_eq!(pearson(&[1.0], &[2.0]), 0.0);
        assert_eq!(pearson(&[], &[]), 0.0);
    }

    #[test]
    fn ties_keep_the_first_encountered_group() {
        let records = vec![
            sample_record("2024-01-03", "10:00", 70.0, 60.0),
            sample_record("2024-01-01", "09:00", 70.0, 60.0),
            sample_record("2024-01-02", "11:00", 50.0, 40.0),
            sample_record("2024-01-04", "12:00", 50.0, 40.0),
        ];

        let summary = compute_insights(&records);
        assert_eq!(summary.best_day.unwrap().date, day("2024-01-03"));
        assert_eq!(summary.worst_day.unwrap().date, day("2024-01-02"));
        assert_eq!(summary.best_time_slot.unwrap().time, "10:00");
        assert_eq!(summary.worst_time_slot.unwrap().time, "11:00");
    }

    #[test]
    fn time_slots_group_by_exact_start_time() {
        let records = vec![
            sample_record("2024-01-01", "09:00", 80.0, 90.0),
            sample_record("2024-01-02", "09:00", 80.0, 70.0),
            sample_record("2024-01-01", "09:30", 80.0, 85.0),
            sample_record("2024-01-01", "14:00", 80.0, 40.0),
        ];

        let summary = compute_insights(&records);
        let best = summary.best_time_slot.unwrap();
        assert_eq!(best.time, "09:30");
        assert_eq!(best.attention, 85.0);
        let worst = summary.worst_time_slot.unwrap();
        assert_eq!(worst.time, "14:00");

        // 09:00 and 09:30 share the hour bucket: (90 + 70 + 85) / 3
        let peak = summary.peak_hour.unwrap();
        assert_eq!(peak.hour, 9);
        assert!((peak.attention - 245.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn overall_means_and_best_weekday() {
        let records = vec![
            sample_record("2024-01-01", "09:00", 90.0, 80.0),
            sample_record("2024-01-02", "09:00", 70.0, 40.0),
            sample_record("2024-01-08", "09:00", 80.0, 60.0),
        ];

        let summary = compute_insights(&records);
        assert!((summary.overall_attendance.unwrap() - 80.0).abs() < 1e-9);
        assert!((summary.overall_attention.unwrap() - 60.0).abs() < 1e-9);
        let weekday = summary.best_weekday.unwrap();
        assert_eq!(weekday.weekday, Weekday::Mon);
        assert!((weekday.attention - 70.0).abs() < 1e-9);
    }

    #[test]
    fn capacity_trend_compares_the_last_two_weeks_of_data() {
        let mut older = sample_record("2024-01-02", "09:00", 80.0, 70.0);
        older.max_students_no = 20.0;
        let mut recent = sample_record("2024-01-10", "09:00", 80.0, 70.0);
        recent.max_students_no = 26.0;
        let mut latest = sample_record("2024-01-14", "09:00", 80.0, 70.0);
        latest.max_students_no = 30.0;
        let mut ancient = sample_record("2023-11-01", "09:00", 80.0, 70.0);
        ancient.max_students_no = 99.0;

        let trend = capacity_trend(&[older, recent, latest, ancient]).unwrap();
        assert_eq!(trend.recent_capacity, 28.0);
        assert_eq!(trend.previous_capacity, 20.0);
        assert_eq!(trend.direction, TrendDirection::Increasing);

        let single = capacity_trend(&[sample_record("2024-01-14", "09:00", 80.0, 70.0)]).unwrap();
        assert_eq!(single.previous_capacity, 0.0);
        assert_eq!(single.direction, TrendDirection::Increasing);
    }

    fn varied_series() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(0.0f64..=100.0, 2..40).prop_filter("series must vary", |xs| {
            let mean = xs.iter().sum::<f64>() / xs.len() as f64;
            xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() > 1e-3
        })
    }

    proptest! {
        #[test]
        fn correlation_is_symmetric(
            pairs in prop::collection::vec((0.0f64..=100.0, 0.0f64..=100.0), 0..40),
        ) {
            let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            let r = pearson(&xs, &ys);
            prop_assert_eq!(r, pearson(&ys, &xs));
            prop_assert!((-1.0..=1.0).contains(&r));
        }

        #[test]
        fn series_against_itself_and_its_negation(xs in varied_series()) {
            let negated: Vec<f64> = xs.iter().map(|x| -x).collect();
            prop_assert!((pearson(&xs, &xs) - 1.0).abs() < 1e-9);
            prop_assert!((pearson(&xs, &negated) + 1.0).abs() < 1e-9);
        }
    }
}
