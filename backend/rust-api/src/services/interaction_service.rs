use anyhow::{Context, Result};
use chrono::Utc;
use mongodb::bson::{doc, Bson, Document};
use mongodb::Database;

use crate::metrics::INTERACTIONS_LOGGED_TOTAL;
use crate::models::interaction::{
    parse_client_timestamp, LogAttemptRequest, LogInteractionRequest, LogTestEventRequest,
    EVENT_TEST_MCQ_TRY, EVENT_TEST_SUBMIT,
};

pub struct InteractionService {
    mongo: Database,
}

impl InteractionService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Records a code or MCQ attempt in `userInteractions`.
    pub async fn log_attempt(&self, req: &LogAttemptRequest) -> Result<()> {
        let collection = self.mongo.collection::<Document>("userInteractions");

        let entry = doc! {
            "sessionId": bson_or_null(&req.session_id),
            "eventType": req.event_type.clone().unwrap_or_else(|| "attempt".to_string()),
            "timestamp": now_bson(),
            "userAnswers": bson_or_null(&req.user_answers),
            "correctAnswers": bson_or_null(&req.correct_answers),
            "isCorrect": bson_or_null(&req.is_correct),
            "questionId": bson_or_null(&req.question_id),
            "moduleId": bson_or_null(&req.module_id),
            "studentId": bson_or_null(&req.student_id),
            "studentGroup": bson_or_null(&req.student_group),
        };

        collection
            .insert_one(entry)
            .await
            .context("Failed to log attempt")?;

        INTERACTIONS_LOGGED_TOTAL
            .with_label_values(&["userInteractions"])
            .inc();
        Ok(())
    }

    /// Records bot messages, user messages and reveal-answer events in
    /// `userInteractions`. A client-supplied timestamp wins over ours.
    pub async fn log_interaction(&self, req: &LogInteractionRequest) -> Result<()> {
        let collection = self.mongo.collection::<Document>("userInteractions");

        let timestamp = req
            .timestamp
            .as_ref()
            .and_then(parse_client_timestamp)
            .map(|t| mongodb::bson::DateTime::from_millis(t.timestamp_millis()))
            .unwrap_or_else(now_bson);

        let entry = doc! {
            "sessionId": bson_or_null(&req.session_id),
            "studentId": bson_or_null(&req.student_id),
            "moduleId": bson_or_null(&req.module_id),
            "questionId": bson_or_null(&req.question_id),
            "eventType": bson_or_null(&req.event_type),
            "message": bson_or_null(&req.message),
            "timestamp": timestamp,
            "studentGroup": bson_or_null(&req.student_group),
        };

        collection
            .insert_one(entry)
            .await
            .context("Failed to log interaction")?;

        INTERACTIONS_LOGGED_TOTAL
            .with_label_values(&["userInteractions"])
            .inc();
        Ok(())
    }

    /// Records per-question tries and whole-test submissions in
    /// `testInteractions`. The stored shape depends on the event type.
    pub async fn log_test_event(&self, req: &LogTestEventRequest) -> Result<()> {
        let collection = self.mongo.collection::<Document>("testInteractions");

        let timestamp = req
            .timestamp
            .as_ref()
            .and_then(parse_client_timestamp)
            .map(|t| mongodb::bson::DateTime::from_millis(t.timestamp_millis()))
            .unwrap_or_else(now_bson);

        let mut entry = doc! {
            "sessionId": bson_or_null(&req.session_id),
            "studentId": bson_or_null(&req.student_id),
            "moduleId": bson_or_null(&req.module_id),
            "eventType": bson_or_null(&req.event_type),
            "timestamp": timestamp,
            "studentGroup": bson_or_null(&req.student_group),
        };

        match req.event_type.as_deref() {
            Some(EVENT_TEST_MCQ_TRY) => {
                entry.extend(doc! {
                    "questionId": bson_or_null(&req.question_id),
                    "userAnswerIndex": bson_or_null(&req.user_answer_index),
                    "userAnswerText": bson_or_null(&req.user_answer_text),
                    "correctAnswerIndex": bson_or_null(&req.correct_answer_index),
                    "correctAnswerText": bson_or_null(&req.correct_answer_text),
                    "isCorrect": bson_or_null(&req.is_correct),
                    "testType": bson_or_null(&req.test_type),
                    "balancedTestType": bson_or_null(&req.balanced_test_type),
                });
            }
            Some(EVENT_TEST_SUBMIT) => {
                entry.extend(doc! {
                    "testType": bson_or_null(&req.test_type),
                    "balancedTestType": bson_or_null(&req.balanced_test_type),
                    "userAnswers": bson_or_null(&req.user_answers),
                    "correctAnswers": bson_or_null(&req.correct_answers),
                    "reflectionResponse": bson_or_null(&req.reflection_response),
                    "score": bson_or_null(&req.score),
                });
            }
            _ => {}
        }

        collection
            .insert_one(entry)
            .await
            .context("Failed to log test event")?;

        INTERACTIONS_LOGGED_TOTAL
            .with_label_values(&["testInteractions"])
            .inc();
        Ok(())
    }
}

fn now_bson() -> mongodb::bson::DateTime {
    mongodb::bson::DateTime::from_millis(Utc::now().timestamp_millis())
}

/// Client payloads are stored verbatim; absent fields become nulls like the
/// document store has always held them.
fn bson_or_null<T: serde::Serialize>(value: &Option<T>) -> Bson {
    value
        .as_ref()
        .and_then(|v| mongodb::bson::to_bson(v).ok())
        .unwrap_or(Bson::Null)
}
