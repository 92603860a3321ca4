use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::{
    parse_body, ErrorResponse, EventRecord, IngestResponse, NotificationMessage, RejectedResponse,
};
use crate::state::AppState;
use crate::store::InsertError;

pub async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

pub async fn readyz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

pub async fn ingest(State(state): State<AppState>, body: Bytes) -> Response {
    let body = parse_body(&body);
    let record = EventRecord::from_body(&body);

    if let Err(err) = state.store.insert(&record).await {
        return insert_failure(&record, err);
    }
    tracing::info!(
        id = %record.id,
        event_type = %record.event_type,
        "event stored"
    );

    notify(&state, &record).await;

    (StatusCode::OK, Json(IngestResponse { status: "ok" })).into_response()
}

fn insert_failure(record: &EventRecord, err: InsertError) -> Response {
    tracing::error!(id = %record.id, error = %err, "event insert failed");
    match err {
        InsertError::Rejected(errors) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RejectedResponse {
                status: "error",
                errors,
            }),
        )
            .into_response(),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                status: "error",
                msg: other.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn notify(state: &AppState, record: &EventRecord) {
    let message = NotificationMessage::for_record(record);
    if state.notify_in_background {
        if !state.notifier.is_enabled() {
            return;
        }
        let notifier = state.notifier.clone();
        tokio::spawn(async move {
            notifier.notify(&message).await;
        });
        return;
    }

    let delivered = state.notifier.notify(&message).await;
    tracing::debug!(id = %record.id, delivered, "notification step finished");
}
