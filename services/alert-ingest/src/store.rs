use serde_json::Value;

use crate::models::EventRecord;

#[derive(Debug, thiserror::Error)]
pub enum InsertError {
    /// The store accepted the request but refused the row.
    #[error("row rejected: {}", render_errors(.0))]
    Rejected(Vec<Value>),
    #[error("insert failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("insert request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("access token unavailable: {0}")]
    Auth(String),
}

fn render_errors(errors: &[Value]) -> String {
    Value::Array(errors.to_vec()).to_string()
}

/// Single-row append into the alerts table.
#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, record: &EventRecord) -> Result<(), InsertError>;
}
