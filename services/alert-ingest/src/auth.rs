use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

// Refresh a little before the server-side expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Bearer tokens for the BigQuery API.
pub enum TokenSource {
    Static(String),
    Metadata(MetadataTokens),
}

impl TokenSource {
    pub async fn token(&self) -> Result<String, String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Metadata(metadata) => metadata.token().await,
        }
    }
}

pub struct MetadataTokens {
    client: Client,
    base_url: String,
    timeout: Duration,
    cached: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

impl MetadataTokens {
    pub fn new(client: Client, metadata_host: &str, timeout: Duration) -> Self {
        Self {
            client,
            base_url: metadata_base_url(metadata_host),
            timeout,
            cached: Mutex::new(None),
        }
    }

    // The lock is held across the fetch so concurrent requests share one
    // refresh; `timeout` bounds how long they can queue behind it.
    async fn token(&self) -> Result<String, String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(token.value.clone());
            }
        }

        let url = format!("{}/instance/service-accounts/default/token", self.base_url);
        let response = self
            .client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| format!("metadata token request failed: {err}"))?;
        if !response.status().is_success() {
            return Err(format!(
                "metadata token request returned {}",
                response.status().as_u16()
            ));
        }
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|err| format!("decode metadata token failed: {err}"))?;

        tracing::debug!(expires_in = body.expires_in, "access token refreshed");
        // An expiry past what Instant can represent is not cached.
        *cached = Instant::now()
            .checked_add(Duration::from_secs(body.expires_in))
            .map(|expires_at| CachedToken {
                value: body.access_token.clone(),
                expires_at,
            });
        Ok(body.access_token)
    }
}

/// Project the service runs in, as reported by the metadata server.
pub async fn metadata_project_id(
    client: &Client,
    metadata_host: &str,
    timeout: Duration,
) -> Result<String, String> {
    let url = format!("{}/project/project-id", metadata_base_url(metadata_host));
    let response = client
        .get(url)
        .header("Metadata-Flavor", "Google")
        .timeout(timeout)
        .send()
        .await
        .map_err(|err| format!("metadata project request failed: {err}"))?;
    if !response.status().is_success() {
        return Err(format!(
            "metadata project request returned {}",
            response.status().as_u16()
        ));
    }
    let project = response
        .text()
        .await
        .map_err(|err| format!("read metadata project failed: {err}"))?;
    let project = project.trim();
    if project.is_empty() {
        return Err("metadata server returned an empty project id".to_string());
    }
    Ok(project.to_string())
}

fn metadata_base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{host}/computeMetadata/v1")
    } else {
        format!("http://{host}/computeMetadata/v1")
    }
}
