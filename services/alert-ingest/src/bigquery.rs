use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::TokenSource;
use crate::config::TableConfig;
use crate::models::EventRecord;
use crate::store::{EventStore, InsertError};

/// Streaming inserts through `tabledata.insertAll`.
pub struct BigQueryStore {
    client: Client,
    insert_url: String,
    tokens: TokenSource,
    timeout: Duration,
}

#[derive(Serialize)]
struct InsertAllRequest<'a> {
    rows: [InsertRow<'a>; 1],
}

#[derive(Serialize)]
struct InsertRow<'a> {
    #[serde(rename = "insertId")]
    insert_id: &'a str,
    json: &'a EventRecord,
}

#[derive(Deserialize)]
struct InsertAllResponse {
    #[serde(default, rename = "insertErrors")]
    insert_errors: Vec<Value>,
}

impl BigQueryStore {
    pub fn new(
        client: Client,
        endpoint: &str,
        project: &str,
        table: &TableConfig,
        tokens: TokenSource,
        timeout: Duration,
    ) -> Self {
        let insert_url = format!(
            "{}/projects/{}/datasets/{}/tables/{}/insertAll",
            endpoint.trim_end_matches('/'),
            project,
            table.dataset,
            table.table
        );
        Self {
            client,
            insert_url,
            tokens,
            timeout,
        }
    }

    pub fn insert_url(&self) -> &str {
        &self.insert_url
    }
}

#[async_trait::async_trait]
impl EventStore for BigQueryStore {
    async fn insert(&self, record: &EventRecord) -> Result<(), InsertError> {
        let token = self.tokens.token().await.map_err(InsertError::Auth)?;
        let request = InsertAllRequest {
            rows: [InsertRow {
                insert_id: &record.id,
                json: record,
            }],
        };

        let response = self
            .client
            .post(&self.insert_url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InsertError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: InsertAllResponse = response.json().await?;
        if !body.insert_errors.is_empty() {
            return Err(InsertError::Rejected(body.insert_errors));
        }
        Ok(())
    }
}
