use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::{Extension, Router};
use tracing::instrument;

use crate::AppState;
use crate::db::DbError;
use crate::dtos::{CreateFeedbackDto, FeedbackQueryParams};
use crate::error::{ErrorMessage, HttpError};
use crate::extract::{ValidatedJson, ValidatedQuery};
use crate::middleware::JWTAuthMiddleware;

pub fn feedback_handler() -> Router<AppState> {
    Router::new().route("/", get(get_feedback).post(create_feedback))
}

/// Query params: ?project_id (required)
#[instrument(skip(app_state, params))]
pub async fn get_feedback(
    ValidatedQuery(params): ValidatedQuery<FeedbackQueryParams>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let project_id = params.project_id.ok_or_else(|| HttpError {
        details: Some(serde_json::json!({ "project_id": ["project_id is required"] })),
        ..HttpError::bad_request(ErrorMessage::ValidationFailed.to_string())
    })?;

    let feedback = app_state
        .db_client
        .get_project_feedback(project_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting feedback: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(Json(feedback))
}

/// Any signed-in user can rate a project, optionally pinned to one of its chapters.
#[instrument(skip(app_state, jwt, body), fields(user_id = %jwt.user.id, project_id = %body.project_id))]
pub async fn create_feedback(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    ValidatedJson(body): ValidatedJson<CreateFeedbackDto>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .get_project(body.project_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting project: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ProjectNotFound.to_string()))?;

    if let Some(chapter_id) = body.chapter_id {
        let chapter = app_state
            .db_client
            .get_chapter(chapter_id)
            .await
            .map_err(|e| {
                tracing::error!("DB error, getting chapter: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?;

        if chapter.is_none_or(|c| c.project_id != body.project_id) {
            return Err(HttpError::not_found(
                ErrorMessage::ChapterNotFound.to_string(),
            ));
        }
    }

    let feedback = app_state
        .db_client
        .create_feedback(jwt.user.id, &body)
        .await
        .map_err(|e| match e {
            DbError::ForeignKeyViolation(_) => {
                HttpError::not_found(ErrorMessage::ProjectNotFound.to_string())
            }
            e => {
                tracing::error!("DB error, creating feedback: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!(feedback_id = %feedback.id, "create_feedback successful");
    Ok((StatusCode::CREATED, Json(feedback)))
}
