use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde_json::Value as JsonValue;
use tokio::time::sleep;
use tracing::warn;

use crate::constants::{
    REGISTRY_FIELDS, RETRY_BACKOFF_CAP_SECONDS, RETRY_BACKOFF_START_SECONDS, RETRY_MAX_ATTEMPTS,
};
use crate::types::{QueryDescriptor, RecordSet, Value};

/// Explicit retry schedule: a fixed attempt budget with exponential backoff
/// between attempts.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_start: Duration,
    pub backoff_cap: Duration,
}

impl RetryPolicy {
    pub fn standard() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            backoff_start: Duration::from_secs(RETRY_BACKOFF_START_SECONDS),
            backoff_cap: Duration::from_secs(RETRY_BACKOFF_CAP_SECONDS),
        }
    }

    /// Delay after the given 1-based failed attempt: start, doubled each
    /// attempt, capped.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.backoff_start
            .saturating_mul(factor)
            .min(self.backoff_cap)
    }
}

/// Runs `op` until it succeeds or the attempt budget is exhausted, sleeping
/// per the policy between attempts. The final error is returned as-is.
pub async fn fetch_with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.max_attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "Attempt {attempt}/{} failed, retrying in {delay:?}: {error:#}",
                    policy.max_attempts
                );
                sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

/// Issues the datastore query and parses `result.records` into a record
/// set with the fixed registry fields.
pub async fn fetch_registry_records(http: &Client, query: &QueryDescriptor) -> Result<RecordSet> {
    let response = http
        .get(&query.url)
        .query(&[("sql", query.sql.as_str())])
        .send()
        .await
        .with_context(|| format!("Request failed for {}", query.url))?;

    if !response.status().is_success() {
        bail!("Request failed ({}) for {}", response.status(), query.url);
    }

    let body: JsonValue = response
        .json()
        .await
        .with_context(|| format!("Failed to parse JSON body from {}", query.url))?;

    let records = body
        .get("result")
        .and_then(|result| result.get("records"))
        .and_then(JsonValue::as_array)
        .cloned()
        .unwrap_or_default();

    Ok(records_from_json(&records))
}

fn records_from_json(records: &[JsonValue]) -> RecordSet {
    let mut out = RecordSet::new(REGISTRY_FIELDS);
    for record in records {
        let row: Vec<Value> = REGISTRY_FIELDS
            .iter()
            .map(|field| cell_from_json(record.get(*field)))
            .collect();
        out.push_row(row);
    }
    out
}

fn cell_from_json(value: Option<&JsonValue>) -> Value {
    match value {
        Some(JsonValue::String(text)) => Value::Text(text.clone()),
        Some(JsonValue::Number(number)) => number
            .as_f64()
            .map(Value::Number)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};

    use super::*;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff_start: Duration::from_millis(1),
            backoff_cap: Duration::from_millis(4),
        }
    }

    #[test]
    fn backoff_starts_at_two_doubles_and_caps_at_ten() {
        let policy = RetryPolicy::standard();
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
        assert_eq!(policy.delay_after(3), Duration::from_secs(8));
        assert_eq!(policy.delay_after(4), Duration::from_secs(10));
        assert_eq!(policy.delay_after(9), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn returns_first_success_without_further_attempts() {
        let attempts = AtomicUsize::new(0);
        let result = fetch_with_retry(fast_policy(), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, anyhow::Error>(42) }
        })
        .await
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt_after_two_failures() {
        let attempts = AtomicUsize::new(0);
        let result = fetch_with_retry(fast_policy(), || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt < 3 {
                    bail!("transient failure on attempt {attempt}");
                }
                Ok("ok")
            }
        })
        .await
        .unwrap();
        assert_eq!(result, "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_exactly_three_attempts() {
        let attempts = AtomicUsize::new(0);
        let result = fetch_with_retry(fast_policy(), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(anyhow::anyhow!("always failing")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    async fn flaky_endpoint(State(hits): State<Arc<AtomicUsize>>) -> axum::response::Response {
        let hit = hits.fetch_add(1, Ordering::SeqCst) + 1;
        if hit < 3 {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        Json(serde_json::json!({
            "result": {
                "records": [
                    {
                        "NomMunicipio": "Belém",
                        "SigUF": "PA",
                        "NomRegiao": "Norte",
                        "lat_str": "-1,45",
                        "lng_str": "-48,49"
                    }
                ]
            }
        }))
        .into_response()
    }

    async fn spawn_server(hits: Arc<AtomicUsize>) -> String {
        let app = Router::new()
            .route("/", get(flaky_endpoint))
            .with_state(hits);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn fetches_registry_records_after_transient_server_errors() {
        let hits = Arc::new(AtomicUsize::new(0));
        let url = spawn_server(hits.clone()).await;

        let http = Client::new();
        let query = QueryDescriptor {
            url,
            sql: "SELECT 1".to_string(),
        };
        let records = fetch_with_retry(fast_policy(), || fetch_registry_records(&http, &query))
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(records.len(), 1);
        assert_eq!(records.text_at(0, "lat_str"), Some("-1,45"));
        assert_eq!(records.text_at(0, "NomMunicipio"), Some("Belém"));
    }
}
