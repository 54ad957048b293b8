use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};

use super::ProviderBackend;
use crate::config::ApifyConfig;
use crate::record::RawRecord;
use crate::{CollectorError, Result};

/// Lifecycle states reported for an actor run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum RunStatus {
    Ready,
    Running,
    Succeeded,
    Failed,
    TimingOut,
    TimedOut,
    Aborting,
    Aborted,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::TimedOut | RunStatus::Aborted
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Ready => "READY",
            RunStatus::Running => "RUNNING",
            RunStatus::Succeeded => "SUCCEEDED",
            RunStatus::Failed => "FAILED",
            RunStatus::TimingOut => "TIMING-OUT",
            RunStatus::TimedOut => "TIMED-OUT",
            RunStatus::Aborting => "ABORTING",
            RunStatus::Aborted => "ABORTED",
            RunStatus::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// An actor run as reported by the platform
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRun {
    pub id: String,
    pub status: RunStatus,
    pub default_dataset_id: String,
}

/// Hosted actor platform client.
///
/// Each provider name is an actor id (`owner/name`). An invocation starts a
/// run, waits for it to finish and reads the run's default dataset.
pub struct ApifyClient {
    client: Client,
    base_url: String,
    token: String,
    run_timeout: Duration,
    poll_interval: Duration,
}

impl ApifyClient {
    pub fn new(config: &ApifyConfig, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            run_timeout: Duration::from_secs(config.run_timeout_secs),
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
        }
    }

    fn actor_runs_url(&self, actor: &str) -> String {
        format!("{}/v2/acts/{}/runs", self.base_url, actor_path(actor))
    }

    /// Start an actor run with the given input
    async fn start_run(&self, actor: &str, input: &Value) -> Result<ActorRun> {
        tracing::debug!("Starting actor run: {}", actor);

        let response = self
            .client
            .post(self.actor_runs_url(actor))
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await
            .with_context(|| format!("Failed to start actor {}", actor))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Starting {} failed: HTTP {} {}", actor, status, body.trim());
        }

        let envelope: Envelope<ActorRun> = response
            .json()
            .await
            .context("Failed to parse actor run response")?;

        Ok(envelope.data)
    }

    /// Wait until the run reaches a terminal state, polling with growing
    /// intervals up to the configured timeout.
    async fn wait_for_run(&self, actor: &str, mut run: ActorRun) -> Result<ActorRun> {
        let start_time = Instant::now();
        let mut check_count: u32 = 0;

        while !run.status.is_terminal() {
            if start_time.elapsed() >= self.run_timeout {
                anyhow::bail!(
                    "Run {} of {} did not finish within {}s",
                    run.id,
                    actor,
                    self.run_timeout.as_secs()
                );
            }

            check_count += 1;
            let wait_secs = std::cmp::min(self.poll_interval.as_secs() * u64::from(check_count), 60);
            run = self.get_run(&run.id, wait_secs).await?;
            tracing::debug!(
                "{} run {} is {} ({}s elapsed)",
                actor,
                run.id,
                run.status.as_str(),
                start_time.elapsed().as_secs()
            );
        }

        if run.status != RunStatus::Succeeded {
            return Err(CollectorError::ProviderRun {
                provider: actor.to_string(),
                status: run.status.as_str().to_string(),
            }
            .into());
        }

        Ok(run)
    }

    /// Fetch run details, letting the server hold the request open for up to
    /// `wait_secs` while the run is still going.
    async fn get_run(&self, run_id: &str, wait_secs: u64) -> Result<ActorRun> {
        let response = self
            .client
            .get(format!("{}/v2/actor-runs/{}", self.base_url, run_id))
            .query(&[("waitForFinish", wait_secs.to_string())])
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to get actor run status")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to get run {}: HTTP {}", run_id, response.status());
        }

        let envelope: Envelope<ActorRun> = response.json().await.context("Failed to parse run status")?;
        Ok(envelope.data)
    }

    /// Read every item of a dataset
    async fn fetch_dataset_items(&self, dataset_id: &str) -> Result<Vec<RawRecord>> {
        let response = self
            .client
            .get(format!("{}/v2/datasets/{}/items", self.base_url, dataset_id))
            .query(&[("clean", "true"), ("format", "json")])
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to download dataset items")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to read dataset {}: HTTP {}", dataset_id, response.status());
        }

        let items: Vec<Value> = response.json().await.context("Failed to parse dataset items")?;
        Ok(records_from_items(items))
    }
}

#[async_trait]
impl ProviderBackend for ApifyClient {
    async fn invoke(&self, provider: &str, request: Value) -> Result<Vec<RawRecord>> {
        let run = self.start_run(provider, &request).await?;
        let run = self.wait_for_run(provider, run).await?;
        self.fetch_dataset_items(&run.default_dataset_id).await
    }

    fn backend_name(&self) -> &'static str {
        "apify"
    }
}

/// `owner/name` actor ids are addressed as `owner~name` in API paths.
fn actor_path(actor: &str) -> String {
    urlencoding::encode(&actor.replace('/', "~")).into_owned()
}

/// Keep object items only; anything else carries no readable fields.
fn records_from_items(items: Vec<Value>) -> Vec<RawRecord> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> ApifyClient {
        let config = ApifyConfig {
            api_key: None,
            base_url: "https://api.example.test/".to_string(),
            run_timeout_secs: 60,
            poll_interval_secs: 5,
        };
        ApifyClient::new(&config, "token")
    }

    #[test]
    fn test_actor_runs_url() {
        assert_eq!(
            client().actor_runs_url("streamers/youtube-scraper"),
            "https://api.example.test/v2/acts/streamers~youtube-scraper/runs"
        );
    }

    #[test]
    fn test_parse_run_envelope() {
        let body = json!({
            "data": {
                "id": "run1",
                "actId": "act",
                "status": "TIMED-OUT",
                "defaultDatasetId": "ds1"
            }
        });
        let envelope: Envelope<ActorRun> = serde_json::from_value(body).unwrap();
        assert_eq!(envelope.data.status, RunStatus::TimedOut);
        assert_eq!(envelope.data.default_dataset_id, "ds1");
        assert!(envelope.data.status.is_terminal());
    }

    #[test]
    fn test_unknown_status_is_not_terminal() {
        let status: RunStatus = serde_json::from_value(json!("PAUSED")).unwrap();
        assert_eq!(status, RunStatus::Unknown);
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_records_from_items_drops_non_objects() {
        let records = records_from_items(vec![json!({"id": "a"}), json!("stray"), json!(null)]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], json!("a"));
    }
}
