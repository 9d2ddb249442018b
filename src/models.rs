use chrono::{NaiveDate, Weekday};
use serde::{Serialize, Serializer};

/// One monitored half-hour classroom session that passed sanitization.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: Option<String>,
    /// Hour of day (0-23) parsed from `start_time`.
    pub start_hour: u32,
    pub attendance_pct: f64,
    pub avg_attention_rate: f64,
    pub max_attention_rate: Option<f64>,
    pub min_attention_rate: Option<f64>,
    pub avg_distraction_rate: f64,
    pub max_distraction_rate: Option<f64>,
    pub min_distraction_rate: Option<f64>,
    pub avg_students_no: f64,
    pub max_students_no: f64,
    pub min_students_no: f64,
    pub students_enrolled: f64,
}

/// How a metric folds across the records of one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduce {
    Mean,
    Max,
    Min,
}

/// Numeric session fields, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    AttendancePct,
    AvgAttentionRate,
    MaxAttentionRate,
    MinAttentionRate,
    AvgDistractionRate,
    MaxDistractionRate,
    MinDistractionRate,
    AvgStudentsNo,
    MaxStudentsNo,
    MinStudentsNo,
    StudentsEnrolled,
}

impl Metric {
    pub const ALL: [Metric; 11] = [
        Metric::AttendancePct,
        Metric::AvgAttentionRate,
        Metric::MaxAttentionRate,
        Metric::MinAttentionRate,
        Metric::AvgDistractionRate,
        Metric::MaxDistractionRate,
        Metric::MinDistractionRate,
        Metric::AvgStudentsNo,
        Metric::MaxStudentsNo,
        Metric::MinStudentsNo,
        Metric::StudentsEnrolled,
    ];

    /// Backend column name.
    pub fn column(self) -> &'static str {
        match self {
            Metric::AttendancePct => "attendance_pct",
            Metric::AvgAttentionRate => "avg_attention_rate",
            Metric::MaxAttentionRate => "max_attention_rate",
            Metric::MinAttentionRate => "min_attention_rate",
            Metric::AvgDistractionRate => "avg_distraction_rate",
            Metric::MaxDistractionRate => "max_distraction_rate",
            Metric::MinDistractionRate => "min_distraction_rate",
            Metric::AvgStudentsNo => "avg_students_no",
            Metric::MaxStudentsNo => "max_students_no",
            Metric::MinStudentsNo => "min_students_no",
            Metric::StudentsEnrolled => "students_enrolled",
        }
    }

    /// Field name as used by the dashboard front-end.
    pub fn camel_name(self) -> &'static str {
        match self {
            Metric::AttendancePct => "attendancePct",
            Metric::AvgAttentionRate => "avgAttentionRate",
            Metric::MaxAttentionRate => "maxAttentionRate",
            Metric::MinAttentionRate => "minAttentionRate",
            Metric::AvgDistractionRate => "avgDistractionRate",
            Metric::MaxDistractionRate => "maxDistractionRate",
            Metric::MinDistractionRate => "minDistractionRate",
            Metric::AvgStudentsNo => "avgStudentsNo",
            Metric::MaxStudentsNo => "maxStudentsNo",
            Metric::MinStudentsNo => "minStudentsNo",
            Metric::StudentsEnrolled => "studentsEnrolled",
        }
    }

    pub fn reduce(self) -> Reduce {
        match self {
            Metric::MaxAttentionRate | Metric::MaxDistractionRate | Metric::MaxStudentsNo => {
                Reduce::Max
            }
            Metric::MinAttentionRate | Metric::MinDistractionRate | Metric::MinStudentsNo => {
                Reduce::Min
            }
            _ => Reduce::Mean,
        }
    }

    /// Records missing a required metric are rejected during sanitization.
    pub fn is_required(self) -> bool {
        !matches!(
            self,
            Metric::MaxAttentionRate
                | Metric::MinAttentionRate
                | Metric::MaxDistractionRate
                | Metric::MinDistractionRate
        )
    }

    pub fn is_percentage(self) -> bool {
        !matches!(
            self,
            Metric::AvgStudentsNo
                | Metric::MaxStudentsNo
                | Metric::MinStudentsNo
                | Metric::StudentsEnrolled
        )
    }

    pub fn of_record(self, record: &SessionRecord) -> Option<f64> {
        match self {
            Metric::AttendancePct => Some(record.attendance_pct),
            Metric::AvgAttentionRate => Some(record.avg_attention_rate),
            Metric::MaxAttentionRate => record.max_attention_rate,
            Metric::MinAttentionRate => record.min_attention_rate,
            Metric::AvgDistractionRate => Some(record.avg_distraction_rate),
            Metric::MaxDistractionRate => record.max_distraction_rate,
            Metric::MinDistractionRate => record.min_distraction_rate,
            Metric::AvgStudentsNo => Some(record.avg_students_no),
            Metric::MaxStudentsNo => Some(record.max_students_no),
            Metric::MinStudentsNo => Some(record.min_students_no),
            Metric::StudentsEnrolled => Some(record.students_enrolled),
        }
    }

    pub fn of_bucket(self, bucket: &AggregateBucket) -> Option<f64> {
        match self {
            Metric::AttendancePct => Some(bucket.attendance_pct),
            Metric::AvgAttentionRate => Some(bucket.avg_attention_rate),
            Metric::MaxAttentionRate => bucket.max_attention_rate,
            Metric::MinAttentionRate => bucket.min_attention_rate,
            Metric::AvgDistractionRate => Some(bucket.avg_distraction_rate),
            Metric::MaxDistractionRate => bucket.max_distraction_rate,
            Metric::MinDistractionRate => bucket.min_distraction_rate,
            Metric::AvgStudentsNo => Some(bucket.avg_students_no),
            Metric::MaxStudentsNo => Some(bucket.max_students_no),
            Metric::MinStudentsNo => Some(bucket.min_students_no),
            Metric::StudentsEnrolled => Some(bucket.students_enrolled),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hourly,
    Daily,
    Weekly,
}

/// Time key of a bucket. Keys of one granularity sort in time order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BucketKey {
    Hour(u32),
    Day(NaiveDate),
    Week { year: i32, week: u32 },
}

impl BucketKey {
    pub fn label(&self) -> String {
        match self {
            BucketKey::Hour(hour) => format!("{hour:02}:00"),
            BucketKey::Day(date) => date.format("%Y-%m-%d").to_string(),
            BucketKey::Week { year, week } => format!("{year}-W{week:02}"),
        }
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BucketKey::Hour(hour) => serializer.serialize_u32(*hour),
            BucketKey::Day(_) | BucketKey::Week { .. } => serializer.serialize_str(&self.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateBucket {
    pub key: BucketKey,
    pub attendance_pct: f64,
    pub avg_attention_rate: f64,
    pub max_attention_rate: Option<f64>,
    pub min_attention_rate: Option<f64>,
    pub avg_distraction_rate: f64,
    pub max_distraction_rate: Option<f64>,
    pub min_distraction_rate: Option<f64>,
    pub avg_students_no: f64,
    pub max_students_no: f64,
    pub min_students_no: f64,
    pub students_enrolled: f64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayInsight {
    pub date: NaiveDate,
    pub attendance: f64,
    pub attention: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSlotInsight {
    pub time: String,
    pub attention: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourInsight {
    pub hour: u32,
    pub attention: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayInsight {
    #[serde(serialize_with = "serialize_weekday")]
    pub weekday: Weekday,
    pub attention: f64,
}

fn serialize_weekday<S: Serializer>(weekday: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(weekday_name(*weekday))
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityTrend {
    /// Mean `max_students_no` over the 7 days ending at the latest date.
    pub recent_capacity: f64,
    /// Same mean over the 7 days before that; 0 when that week has no sessions.
    pub previous_capacity: f64,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightSummary {
    pub correlation_attendance_attention: f64,
    pub best_day: Option<DayInsight>,
    pub worst_day: Option<DayInsight>,
    pub best_time_slot: Option<TimeSlotInsight>,
    pub worst_time_slot: Option<TimeSlotInsight>,
    pub total_sessions: usize,
    pub overall_attention: Option<f64>,
    pub overall_attendance: Option<f64>,
    pub peak_hour: Option<HourInsight>,
    pub best_weekday: Option<WeekdayInsight>,
    pub capacity_trend: Option<CapacityTrend>,
}
