use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::question::{Question, QuestionDraft};
use crate::error::ApiError;
use crate::middleware::CurrentUser;

/// GET /questions - List the caller's questions, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Question>>, ApiError> {
    let questions = state.questions.list(&user.uid).await.map_err(|e| {
        tracing::error!(owner = %user.uid, "Failed to list questions: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(questions))
}

/// POST /questions - Create a question owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Question>), ApiError> {
    let draft = parse_draft(body)?;

    let question = state.questions.create(&user.uid, draft).await.map_err(|e| {
        tracing::warn!(owner = %user.uid, "Failed to create question: {}", e);
        ApiError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// PUT /questions/:id - Update a question the caller owns
pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Question>, ApiError> {
    let id = parse_question_id(&id)?;
    let draft = parse_draft(body)?;

    let question = state
        .questions
        .update(&user.uid, id, draft)
        .await
        .map_err(|e| {
            tracing::warn!(owner = %user.uid, question = %id, "Failed to update question: {}", e);
            ApiError::from(e)
        })?;

    Ok(Json(question))
}

/// DELETE /questions/:id - Delete a question the caller owns.
/// Deleting an id that no longer exists reports 404, not success.
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_question_id(&id)?;

    state.questions.delete(&user.uid, id).await.map_err(|e| {
        tracing::warn!(owner = %user.uid, question = %id, "Failed to delete question: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(json!({ "message": "Question deleted successfully" })))
}

fn parse_draft(body: Value) -> Result<QuestionDraft, ApiError> {
    serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))
}

/// Ids are opaque to callers; one that does not parse cannot name an
/// existing record, so it is reported like any other missing id.
fn parse_question_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse::<Uuid>()
        .map_err(|_| ApiError::not_found("Question not found"))
}
