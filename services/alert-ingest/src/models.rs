use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

pub const DEFAULT_EVENT_TYPE: &str = "budget.alert";

/// One row of the alerts table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub id: String,
    pub event_time: String,
    pub event_type: String,
    pub payload: String,
}

impl EventRecord {
    pub fn from_body(body: &Map<String, Value>) -> Self {
        let event_type = match body.get("event_type") {
            None | Some(Value::Null) => DEFAULT_EVENT_TYPE.to_string(),
            Some(Value::String(value)) => value.clone(),
            Some(other) => other.to_string(),
        };
        Self {
            id: Uuid::new_v4().to_string(),
            event_time: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            event_type,
            // Key order and number text survive (`preserve_order`, `arbitrary_precision`).
            payload: Value::Object(body.clone()).to_string(),
        }
    }
}

/// Anything that is not a JSON object is treated as an empty body.
pub fn parse_body(bytes: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationMessage {
    pub text: String,
}

impl NotificationMessage {
    pub fn for_record(record: &EventRecord) -> Self {
        Self {
            text: format!(
                "Alert ingested: {} at {}",
                record.event_type, record.event_time
            ),
        }
    }
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct RejectedResponse {
    pub status: &'static str,
    pub errors: Vec<Value>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_and_non_object_bodies_become_empty() {
        assert!(parse_body(b"").is_empty());
        assert!(parse_body(b"{not json").is_empty());
        assert!(parse_body(b"[1, 2]").is_empty());
        assert!(parse_body(b"\"text\"").is_empty());
        assert_eq!(parse_body(br#"{"a":1}"#).get("a"), Some(&json!(1)));
    }

    #[test]
    fn event_type_defaults_when_missing_or_null() {
        let record = EventRecord::from_body(&Map::new());
        assert_eq!(record.event_type, DEFAULT_EVENT_TYPE);

        let body = parse_body(br#"{"event_type":null}"#);
        assert_eq!(EventRecord::from_body(&body).event_type, "budget.alert");

        let body = parse_body(br#"{"event_type":"cost.spike"}"#);
        assert_eq!(EventRecord::from_body(&body).event_type, "cost.spike");

        let body = parse_body(br#"{"event_type":7}"#);
        assert_eq!(EventRecord::from_body(&body).event_type, "7");
    }

    #[test]
    fn payload_keeps_key_order_and_big_integers() {
        let raw = r#"{"zeta":1,"alpha":2,"amount":123456789012345678901234567890,"ratio":0.1}"#;
        let record = EventRecord::from_body(&parse_body(raw.as_bytes()));
        assert_eq!(record.payload, raw);
    }

    #[test]
    fn payload_round_trips_the_body() {
        let body = parse_body(br#"{"budget":"eng","amount":{"units":120},"tags":["a","b"]}"#);
        let record = EventRecord::from_body(&body);
        let decoded: Value = serde_json::from_str(&record.payload).unwrap();
        assert_eq!(decoded, Value::Object(body));

        let empty = EventRecord::from_body(&Map::new());
        assert_eq!(empty.payload, "{}");
    }

    #[test]
    fn event_time_is_utc_rfc3339() {
        let record = EventRecord::from_body(&Map::new());
        assert!(record.event_time.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&record.event_time).is_ok());
    }

    #[test]
    fn ids_are_unique_across_rapid_calls() {
        let ids: std::collections::HashSet<String> = (0..1000)
            .map(|_| EventRecord::from_body(&Map::new()).id)
            .collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn notification_names_type_and_time() {
        let record = EventRecord {
            id: "1".to_string(),
            event_time: "2026-01-01T00:00:00.000000Z".to_string(),
            event_type: "budget.alert".to_string(),
            payload: "{}".to_string(),
        };
        let message = NotificationMessage::for_record(&record);
        assert_eq!(
            message.text,
            "Alert ingested: budget.alert at 2026-01-01T00:00:00.000000Z"
        );
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"text": "Alert ingested: budget.alert at 2026-01-01T00:00:00.000000Z"})
        );
    }
}
