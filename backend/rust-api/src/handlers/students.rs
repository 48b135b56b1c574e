use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document},
    options::UpdateOptions,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    extractors::AppJson,
    models::student::{
        LoginRequest, RevealAnswerRequest, StoreConsentRequest, StoreConversationRequest,
        SubmitTestRequest, UpdateProgressRequest, UpdateTestProgressRequest,
    },
    services::AppState,
};

/// Completed questions for a student, or an empty list.
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<Json<Value>, StudentApiError> {
    let oid = parse_object_id(&student_id)?;

    let student = find_student(&state, doc! { "_id": oid }).await?;
    let completed = student
        .get_array("completedQuestions")
        .cloned()
        .unwrap_or_default();

    Ok(Json(Value::Array(
        completed
            .into_iter()
            .map(|entry| entry.into_relaxed_extjson())
            .collect(),
    )))
}

/// Toggles one question in the completed-questions list.
pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<UpdateProgressRequest>,
) -> Result<Json<Value>, StudentApiError> {
    req.validate()
        .map_err(|e| StudentApiError::bad_request(e.to_string()))?;
    let oid = parse_object_id(&req.student_id)?;

    let student = find_student(&state, doc! { "_id": oid }).await?;

    let module = to_bson(&req.module_id)?;
    let question = to_bson(&req.question_id)?;
    let mut completed = student
        .get_array("completedQuestions")
        .cloned()
        .unwrap_or_default();

    let matches = |entry: &Bson| {
        entry
            .as_document()
            .map(|d| d.get("moduleId") == Some(&module) && d.get("questionId") == Some(&question))
            .unwrap_or(false)
    };

    if req.is_checked {
        if !completed.iter().any(|entry| matches(entry)) {
            completed.push(Bson::Document(doc! {
                "moduleId": module.clone(),
                "questionId": question.clone(),
            }));
        }
    } else {
        completed.retain(|entry| !matches(entry));
    }

    state
        .mongo
        .collection::<Document>("students")
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": { "completedQuestions": Bson::Array(completed.clone()) } },
        )
        .await
        .map_err(|e| StudentApiError::internal(format!("Failed to update progress: {}", e)))?;

    Ok(Json(json!({
        "success": true,
        "completedQuestions": completed
            .into_iter()
            .map(|entry| entry.into_relaxed_extjson())
            .collect::<Vec<_>>(),
    })))
}

/// Per-test completion flags. Accepts a hex ObjectId or a plain studentId.
pub async fn get_test_progress(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<Json<Value>, StudentApiError> {
    let students = state.mongo.collection::<Document>("students");
    let student = students
        .find_one(student_filter(&student_id))
        .await
        .map_err(|e| StudentApiError::internal(format!("Failed to query student: {}", e)))?;

    let Some(student) = student else {
        return Ok(Json(json!({ "message": "No progress found", "tests": {} })));
    };

    let tests = student
        .get("tests")
        .cloned()
        .map(|b| b.into_relaxed_extjson())
        .unwrap_or_else(|| json!({}));

    Ok(Json(json!({ "tests": tests })))
}

pub async fn update_test_progress(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<UpdateTestProgressRequest>,
) -> Result<Json<Value>, StudentApiError> {
    req.validate()
        .map_err(|e| StudentApiError::bad_request(e.to_string()))?;

    let test_field = format!("{}-{}", req.test_type, req.module_id);
    let field_path = format!("tests.{}.completed", test_field);

    state
        .mongo
        .collection::<Document>("students")
        .update_one(
            student_filter(&req.student_id),
            doc! { "$set": { field_path: req.is_checked } },
        )
        .with_options(UpdateOptions::builder().upsert(true).build())
        .await
        .map_err(|e| StudentApiError::internal(format!("Failed to update test progress: {}", e)))?;

    Ok(Json(json!({ "message": "Progress updated successfully" })))
}

/// Profile projection used by the client shell after login.
pub async fn get_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<Json<Value>, StudentApiError> {
    let oid = parse_object_id(&student_id)?;
    let student = find_student(&state, doc! { "_id": oid }).await?;

    let field = |name: &str| {
        student
            .get(name)
            .cloned()
            .map(|b| b.into_relaxed_extjson())
            .unwrap_or(Value::Null)
    };

    Ok(Json(json!({
        "name": field("name"),
        "type": field("type"),
        "preTestScores": field("preTestScores"),
        "postTestScores": field("postTestScores"),
        "conversationHistory": field("conversationHistory"),
    })))
}

/// Appends one conversation transcript to the student document. The raw
/// request is also audit-logged so dropped transcripts can be recovered.
pub async fn store_conversation(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<StoreConversationRequest>,
) -> Result<impl IntoResponse, StudentApiError> {
    req.validate()
        .map_err(|e| StudentApiError::bad_request(e.to_string()))?;
    let oid = parse_object_id(&req.student_id)?;

    let logs = state.mongo.collection::<Document>("api_logs");
    logs.insert_one(doc! {
        "timestamp": now_bson(),
        "rawRequest": doc! {
            "studentId": &req.student_id,
            "conversationData": to_bson(&req.conversation_data)?,
        },
    })
    .await
    .map_err(|e| StudentApiError::internal(format!("Failed to audit-log conversation: {}", e)))?;

    let result = state
        .mongo
        .collection::<Document>("students")
        .update_one(
            doc! { "_id": oid },
            doc! { "$push": { "conversationHistory": to_bson(&req.conversation_data)? } },
        )
        .await
        .map_err(|e| StudentApiError::internal(format!("Failed to store conversation: {}", e)))?;

    if result.matched_count == 0 {
        return Err(StudentApiError::not_found("Student not found"));
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Conversation history saved successfully." })),
    ))
}

pub async fn check_consent(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<Json<Value>, StudentApiError> {
    let oid = parse_object_id(&student_id)?;
    let student = find_student(&state, doc! { "_id": oid }).await?;

    // Consent has always been stored as the string "True".
    let has_consent = matches!(student.get_str("consentForm"), Ok("True"));
    Ok(Json(json!({ "hasConsent": has_consent })))
}

pub async fn store_consent(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<StoreConsentRequest>,
) -> Result<Json<Value>, StudentApiError> {
    req.validate()
        .map_err(|e| StudentApiError::bad_request(e.to_string()))?;
    let oid = parse_object_id(&req.student_id)?;

    let result = state
        .mongo
        .collection::<Document>("students")
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": {
                "consentForm": "True",
                "consentData": doc! {
                    "age": to_bson(&req.age)?,
                    "understand": to_bson(&req.understand)?,
                    "participate": to_bson(&req.participate)?,
                    "eligible": req.eligible.as_ref().map(to_bson).transpose()?.unwrap_or(Bson::Null),
                    "timestamp": now_bson(),
                },
            }},
        )
        .await
        .map_err(|e| StudentApiError::internal(format!("Failed to store consent: {}", e)))?;

    if result.matched_count == 0 {
        return Err(StudentApiError::not_found("Student ID not found."));
    }

    Ok(Json(
        json!({ "message": "Consent form data saved successfully." }),
    ))
}

/// Roll-number login. There are no credentials; the roll number either
/// matches a student document or it doesn't.
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<Value>, StudentApiError> {
    req.validate()
        .map_err(|e| StudentApiError::bad_request(e.to_string()))?;

    let student = state
        .mongo
        .collection::<Document>("students")
        .find_one(doc! { "rollNumber": &req.roll_number })
        .await
        .map_err(|e| StudentApiError::internal(format!("Login query failed: {}", e)))?
        .ok_or_else(|| StudentApiError::unauthorized("Invalid Unique ID"))?;

    Ok(Json(json!({
        "message": "Login successful",
        "user": Bson::Document(student).into_relaxed_extjson(),
    })))
}

/// Scores a submitted test and upserts it under `tests.{testType}-{title}`.
pub async fn submit_test(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SubmitTestRequest>,
) -> Result<Json<Value>, StudentApiError> {
    req.validate()
        .map_err(|e| StudentApiError::bad_request(e.to_string()))?;

    let score = req.score();
    let test_field = format!("{}-{}", req.test_type, req.title);

    let mut test_result = doc! {
        "answers": to_bson(&req.answers)?,
        "score": score,
        "balancedTestType": &req.balanced_test_type,
    };
    if req.test_type == "post-test" {
        if let Some(reflection) = &req.reflection_response {
            test_result.insert("reflection", to_bson(reflection)?);
        }
    }

    state
        .mongo
        .collection::<Document>("students")
        .update_one(
            student_filter(&req.student_id),
            doc! { "$set": { format!("tests.{}", test_field): test_result } },
        )
        .with_options(UpdateOptions::builder().upsert(true).build())
        .await
        .map_err(|e| StudentApiError::internal(format!("Failed to store test result: {}", e)))?;

    tracing::info!(student_id = %req.student_id, test_field = %test_field, score, "Test submitted");

    Ok(Json(
        json!({ "message": "Test submitted successfully", "score": score }),
    ))
}

/// Records a reveal-answer button press on the student document.
pub async fn reveal_answer(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RevealAnswerRequest>,
) -> Result<Json<Value>, StudentApiError> {
    req.validate()
        .map_err(|e| StudentApiError::bad_request(e.to_string()))?;

    let entry = doc! {
        "module": to_bson(&req.module_id)?,
        "question": to_bson(&req.question_id)?,
        "timestamp": now_bson(),
    };

    state
        .mongo
        .collection::<Document>("students")
        .update_one(
            student_filter(&req.student_id),
            doc! { "$push": { "revealAnswers": entry } },
        )
        .with_options(UpdateOptions::builder().upsert(true).build())
        .await
        .map_err(|e| StudentApiError::internal(format!("Failed to record reveal: {}", e)))?;

    Ok(Json(
        json!({ "message": "Reveal answer recorded successfully" }),
    ))
}

#[derive(Debug)]
pub enum StudentApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(String),
}

impl StudentApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        StudentApiError::BadRequest(message.into())
    }

    fn unauthorized(message: impl Into<String>) -> Self {
        StudentApiError::Unauthorized(message.into())
    }

    fn not_found(message: impl Into<String>) -> Self {
        StudentApiError::NotFound(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        StudentApiError::Internal(message.into())
    }
}

impl IntoResponse for StudentApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            StudentApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            StudentApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            StudentApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            StudentApiError::Internal(msg) => {
                tracing::error!("Student route failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn parse_object_id(student_id: &str) -> Result<ObjectId, StudentApiError> {
    ObjectId::parse_str(student_id).map_err(|_| StudentApiError::bad_request("Invalid student ID"))
}

/// Older clients identified students by a plain `studentId` field instead of
/// the document id; both filters stay accepted where the API always did.
fn student_filter(student_id: &str) -> Document {
    match ObjectId::parse_str(student_id) {
        Ok(oid) => doc! { "_id": oid },
        Err(_) => doc! { "studentId": student_id },
    }
}

async fn find_student(state: &AppState, filter: Document) -> Result<Document, StudentApiError> {
    state
        .mongo
        .collection::<Document>("students")
        .find_one(filter)
        .await
        .map_err(|e| StudentApiError::internal(format!("Failed to query student: {}", e)))?
        .ok_or_else(|| StudentApiError::not_found("Student not found"))
}

fn now_bson() -> mongodb::bson::DateTime {
    mongodb::bson::DateTime::from_millis(Utc::now().timestamp_millis())
}

fn to_bson<T: serde::Serialize>(value: &T) -> Result<Bson, StudentApiError> {
    mongodb::bson::to_bson(value)
        .map_err(|e| StudentApiError::internal(format!("Failed to encode value: {}", e)))
}
