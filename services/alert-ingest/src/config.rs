use std::time::Duration;

use ingest_common::{env_flag, env_opt, env_or, env_required};

pub const DEFAULT_BIGQUERY_ENDPOINT: &str = "https://bigquery.googleapis.com/bigquery/v2";
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";
pub const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub port: u16,
    pub table: TableConfig,
    pub notify: NotifyConfig,
    pub bigquery_endpoint: String,
    pub access_token: Option<String>,
    pub metadata_host: String,
    /// Per-request bound for BigQuery and metadata server calls.
    pub storage_timeout: Duration,
}

/// Destination table; `project` is resolved from the metadata server when unset.
#[derive(Clone, Debug)]
pub struct TableConfig {
    pub project: Option<String>,
    pub dataset: String,
    pub table: String,
}

#[derive(Clone, Debug)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
    pub attempts: u32,
    pub timeout: Duration,
    /// Linear backoff increment between attempts.
    pub backoff_step: Duration,
    pub background: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            attempts: 3,
            timeout: Duration::from_secs(5),
            backoff_step: Duration::from_secs(1),
            background: false,
        }
    }
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = NotifyConfig::default();
        Ok(Self {
            port: env_or("PORT", 8080u16),
            table: TableConfig {
                project: env_opt("GOOGLE_CLOUD_PROJECT"),
                dataset: env_required("BQ_DATASET")?,
                table: env_required("BQ_ALERTS_TABLE")?,
            },
            notify: NotifyConfig {
                webhook_url: env_opt("ALERT_WEBHOOK_URL"),
                attempts: env_or("ALERT_NOTIFY_ATTEMPTS", defaults.attempts),
                timeout: Duration::from_secs(env_or(
                    "ALERT_NOTIFY_TIMEOUT_SECS",
                    defaults.timeout.as_secs(),
                )),
                backoff_step: defaults.backoff_step,
                background: env_flag("ALERT_NOTIFY_ASYNC"),
            },
            bigquery_endpoint: env_opt("BIGQUERY_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_BIGQUERY_ENDPOINT.to_string()),
            access_token: env_opt("BIGQUERY_ACCESS_TOKEN"),
            metadata_host: env_opt("GCE_METADATA_HOST")
                .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string()),
            storage_timeout: Duration::from_secs(
                env_or("BIGQUERY_TIMEOUT_SECS", DEFAULT_STORAGE_TIMEOUT_SECS).max(1),
            ),
        })
    }
}
