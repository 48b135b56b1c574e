use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

pub const EVENT_TEST_MCQ_TRY: &str = "test-mcq-try";
pub const EVENT_TEST_SUBMIT: &str = "test-submit";

/// Body of `POST /api/log-attempt`. Answer payloads are stored verbatim, so
/// they stay untyped; clients have sent both strings and arrays here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogAttemptRequest {
    pub session_id: Option<String>,
    pub user_answers: Option<Value>,
    pub correct_answers: Option<Value>,
    pub is_correct: Option<Value>,
    pub question_id: Option<Value>,
    pub module_id: Option<Value>,
    pub student_id: Option<String>,
    pub event_type: Option<String>,
    pub student_group: Option<String>,
}

/// Body of `POST /api/log-interaction` (bot messages, user messages,
/// reveal-answer events).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogInteractionRequest {
    pub session_id: Option<String>,
    pub student_id: Option<String>,
    pub module_id: Option<Value>,
    pub question_id: Option<Value>,
    pub event_type: Option<String>,
    pub message: Option<Value>,
    pub timestamp: Option<Value>,
    pub student_group: Option<String>,
}

/// Body of `POST /api/log-test-event`. Which fields end up stored depends on
/// the event type; the rest are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogTestEventRequest {
    pub session_id: Option<String>,
    pub student_id: Option<String>,
    pub module_id: Option<Value>,
    pub question_id: Option<Value>,
    pub event_type: Option<String>,
    pub user_answer_index: Option<Value>,
    pub user_answer_text: Option<Value>,
    pub correct_answer_index: Option<Value>,
    pub correct_answer_text: Option<Value>,
    pub is_correct: Option<Value>,
    pub user_answers: Option<Value>,
    pub correct_answers: Option<Value>,
    pub reflection_response: Option<Value>,
    pub score: Option<Value>,
    pub test_type: Option<String>,
    pub balanced_test_type: Option<String>,
    pub timestamp: Option<Value>,
    pub student_group: Option<String>,
}

/// Clients send timestamps as RFC 3339 strings or epoch milliseconds.
pub fn parse_client_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|t| t.with_timezone(&Utc))
            .ok(),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_rfc3339_timestamps() {
        let parsed = parse_client_timestamp(&json!("2025-03-14T09:26:53Z")).unwrap();
        assert_eq!(parsed.timestamp(), 1_741_944_413);
    }

    #[test]
    fn parses_epoch_millis() {
        let parsed = parse_client_timestamp(&json!(1_741_944_413_000_i64)).unwrap();
        assert_eq!(parsed.timestamp_millis(), 1_741_944_413_000);
    }

    #[test]
    fn rejects_unusable_shapes() {
        assert!(parse_client_timestamp(&json!("yesterday")).is_none());
        assert!(parse_client_timestamp(&json!({"at": 1})).is_none());
        assert!(parse_client_timestamp(&Value::Null).is_none());
    }
}
