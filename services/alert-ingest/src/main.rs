mod app;
mod auth;
mod bigquery;
mod config;
mod handlers;
mod models;
mod notifier;
mod state;
mod store;

use std::sync::Arc;

use ingest_common::{bind_listener, init_tracing, shutdown_signal};
use reqwest::Client;

use crate::auth::{metadata_project_id, MetadataTokens, TokenSource};
use crate::bigquery::BigQueryStore;
use crate::config::IngestConfig;
use crate::notifier::Notifier;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    let _guards = init_tracing("alert-ingest");

    let config = match IngestConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    // One client for BigQuery, the metadata server and the webhook.
    let client = Client::new();
    let store = build_store(&client, &config).await;
    let notifier = Notifier::new(client, &config.notify);
    if !notifier.is_enabled() {
        tracing::info!("ALERT_WEBHOOK_URL not set; notifications disabled");
    }

    let state = AppState::new(Arc::new(store), notifier, config.notify.background);
    let app = app::build_router(state);
    let listener = bind_listener(config.port).await.expect("bind listener");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("serve");
}

async fn build_store(client: &Client, config: &IngestConfig) -> BigQueryStore {
    let project = match config.table.project.clone() {
        Some(project) => project,
        None => match metadata_project_id(client, &config.metadata_host, config.storage_timeout)
            .await
        {
            Ok(project) => project,
            Err(err) => {
                tracing::error!(error = %err, "GOOGLE_CLOUD_PROJECT unset and metadata lookup failed");
                std::process::exit(1);
            }
        },
    };

    let tokens = match config.access_token.clone() {
        Some(token) => TokenSource::Static(token),
        None => TokenSource::Metadata(MetadataTokens::new(
            client.clone(),
            &config.metadata_host,
            config.storage_timeout,
        )),
    };

    let store = BigQueryStore::new(
        client.clone(),
        &config.bigquery_endpoint,
        &project,
        &config.table,
        tokens,
        config.storage_timeout,
    );
    tracing::info!(
        project = %project,
        dataset = %config.table.dataset,
        table = %config.table.table,
        insert_url = store.insert_url(),
        timeout_secs = config.storage_timeout.as_secs(),
        "bigquery store ready"
    );
    store
}
