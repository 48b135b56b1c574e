use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

/// Body of `POST /api/student-progress`. Module and question ids are kept
/// untyped because content packs have used both numbers and strings.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    #[validate(length(min = 1, message = "studentId is required"))]
    pub student_id: String,
    pub module_id: Value,
    pub question_id: Value,
    #[serde(default)]
    pub is_checked: bool,
}

/// Body of `POST /api/student-test-progress`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTestProgressRequest {
    #[validate(length(min = 1, message = "studentId is required"))]
    pub student_id: String,
    pub module_id: String,
    pub test_type: String,
    #[serde(default)]
    pub is_checked: bool,
}

/// Body of `POST /api/storeConversation`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StoreConversationRequest {
    #[validate(length(min = 1, message = "studentId is required"))]
    pub student_id: String,
    pub conversation_data: Value,
}

/// Body of `POST /api/storeConsent`. The form fields arrive as whatever the
/// consent UI produced (booleans or yes/no strings) and are stored verbatim.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StoreConsentRequest {
    #[validate(length(min = 1, message = "studentId is required"))]
    pub student_id: String,
    pub age: Value,
    pub understand: Value,
    pub participate: Value,
    #[serde(default)]
    pub eligible: Option<Value>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "rollNumber is required"))]
    pub roll_number: String,
}

/// Body of `POST /api/submit-test`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTestRequest {
    #[validate(length(min = 1, message = "studentId is required"))]
    pub student_id: String,
    #[validate(length(min = 1, message = "testType is required"))]
    pub test_type: String,
    #[validate(length(min = 1, message = "balancedTestType is required"))]
    pub balanced_test_type: String,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub answers: HashMap<String, Value>,
    pub correct_answers: HashMap<String, Value>,
    #[serde(default)]
    pub reflection_response: Option<Value>,
}

impl SubmitTestRequest {
    /// One point per submitted answer whose value matches the expected one.
    /// Values are compared as strings so that a numeric 2 and a "2" from
    /// different question widgets count as the same answer.
    pub fn score(&self) -> i64 {
        self.answers
            .iter()
            .filter(|(question_id, answer)| {
                self.correct_answers
                    .get(*question_id)
                    .map(|expected| value_as_string(answer) == value_as_string(expected))
                    .unwrap_or(false)
            })
            .count() as i64
    }
}

/// Body of `POST /api/reveal-answer`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RevealAnswerRequest {
    #[validate(length(min = 1, message = "studentId is required"))]
    pub student_id: String,
    pub module_id: Value,
    pub question_id: Value,
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
