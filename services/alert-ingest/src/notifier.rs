use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tokio::time::sleep;

use crate::config::NotifyConfig;

/// Best-effort webhook delivery. `notify` reports success as `true` and has
/// no other failure signal: errors are logged and dropped.
#[derive(Clone)]
pub struct Notifier {
    client: Client,
    url: Option<String>,
    attempts: u32,
    timeout: Duration,
    backoff_step: Duration,
}

impl Notifier {
    pub fn new(client: Client, config: &NotifyConfig) -> Self {
        Self {
            client,
            url: config.webhook_url.clone(),
            attempts: config.attempts,
            timeout: config.timeout,
            backoff_step: config.backoff_step,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }

    pub async fn notify<T: Serialize + ?Sized>(&self, message: &T) -> bool {
        deliver(
            &self.client,
            self.url.as_deref().unwrap_or_default(),
            message,
            self.attempts,
            self.timeout,
            self.backoff_step,
        )
        .await
    }
}

/// Delay after the zero-based `attempt`: one step, then two, and so on.
pub fn backoff_delay(step: Duration, attempt: u32) -> Duration {
    step.saturating_mul(attempt.saturating_add(1))
}

pub async fn deliver<T: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    message: &T,
    attempts: u32,
    timeout: Duration,
    backoff_step: Duration,
) -> bool {
    if url.trim().is_empty() {
        return false;
    }

    for attempt in 0..attempts {
        match client.post(url).timeout(timeout).json(message).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(attempt, status = response.status().as_u16(), "notification delivered");
                return true;
            }
            Ok(response) => {
                tracing::warn!(attempt, status = response.status().as_u16(), "notification rejected");
            }
            Err(err) => {
                tracing::warn!(attempt, error = %err, "notification failed");
            }
        }
        if attempt + 1 < attempts {
            sleep(backoff_delay(backoff_step, attempt)).await;
        }
    }

    tracing::warn!(attempts, "notification dropped after retries");
    false
}
