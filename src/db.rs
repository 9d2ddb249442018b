use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::error::Result;
use crate::models::Metric;
use crate::source::RecordSource;

// Metric columns are cast so NUMERIC and INTEGER columns all decode as f64.
const SESSION_QUERY: &str = r#"
    SELECT date, start_time, end_time,
           attendance_pct::float8 AS attendance_pct,
           avg_attention_rate::float8 AS avg_attention_rate,
           max_attention_rate::float8 AS max_attention_rate,
           min_attention_rate::float8 AS min_attention_rate,
           avg_distraction_rate::float8 AS avg_distraction_rate,
           max_distraction_rate::float8 AS max_distraction_rate,
           min_distraction_rate::float8 AS min_distraction_rate,
           avg_students_no::float8 AS avg_students_no,
           max_students_no::float8 AS max_students_no,
           min_students_no::float8 AS min_students_no,
           students_enrolled::float8 AS students_enrolled
    FROM classroom_synthetic_data_updated
    ORDER BY date DESC
    LIMIT $1
"#;

/// Reads session rows straight from the analytics database.
pub struct PgSource {
    pool: PgPool,
}

impl PgSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl RecordSource for PgSource {
    async fn fetch(&self, limit: usize) -> Result<Vec<Value>> {
        let rows = sqlx::query(SESSION_QUERY)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(row_to_value).collect())
    }

    fn describe(&self) -> String {
        "postgres classroom_synthetic_data_updated".to_string()
    }
}

/// Columns that fail to decode become null and are judged by the sanitizer.
fn row_to_value(row: &PgRow) -> Value {
    let mut object = Map::new();

    let date: Option<NaiveDate> = row.try_get("date").ok().flatten();
    object.insert(
        "date".to_string(),
        date.map_or(Value::Null, |d| Value::String(d.to_string())),
    );

    for column in ["start_time", "end_time"] {
        let text: Option<String> = row.try_get(column).ok().flatten();
        object.insert(column.to_string(), text.map_or(Value::Null, Value::String));
    }

    for metric in Metric::ALL {
        let value: Option<f64> = row.try_get(metric.column()).ok().flatten();
        object.insert(metric.column().to_string(), Value::from(value));
    }

    Value::Object(object)
}
