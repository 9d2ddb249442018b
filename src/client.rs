//! HTTP source for the analytics backend's `GET /api/classroom-data`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::source::RecordSource;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/api/classroom-data",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl RecordSource for HttpSource {
    async fn fetch(&self, limit: usize) -> Result<Vec<Value>> {
        let url = self.endpoint();
        debug!(%url, limit, "fetching classroom data");

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "analytics backend rejected request");
            return Err(Error::Status {
                status: status.as_u16(),
                url,
            });
        }

        into_rows(response.json().await?)
    }

    fn describe(&self) -> String {
        self.endpoint()
    }
}

fn into_rows(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Array(rows) => Ok(rows),
        Value::Object(_) => Err(Error::Payload("expected a JSON array, got an object".into())),
        other => Err(Error::Payload(format!("expected a JSON array, got `{other}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let source = HttpSource::new("http://localhost:8000/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            source.endpoint(),
            "http://localhost:8000/api/classroom-data"
        );
        let bare = HttpSource::new("http://localhost:8000", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(bare.endpoint(), source.endpoint());
    }

    #[test]
    fn array_bodies_become_rows() {
        let rows = into_rows(json!([{"date": "2024-01-01"}, "junk"])).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn non_array_bodies_are_payload_errors() {
        assert!(matches!(
            into_rows(json!({"detail": "boom"})),
            Err(Error::Payload(_))
        ));
        assert!(matches!(into_rows(json!(null)), Err(Error::Payload(_))));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_fetch_error() {
        let source = HttpSource::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        assert!(matches!(source.fetch(10).await, Err(Error::Http(_))));
    }
}
