use axum::extract::State;
use axum::response::{IntoResponse, Json};
use axum::routing::post;
use axum::{Extension, Router, middleware};
use tracing::instrument;
use uuid::Uuid;

use crate::AppState;
use crate::db::DbError;
use crate::error::{ErrorMessage, HttpError};
use crate::extract::ValidatedPath;
use crate::middleware::{JWTAuthMiddleware, role_check};
use crate::models::{ChapterStatus, UserRole};

pub fn final_chapter_handler() -> Router<AppState> {
    Router::new().route(
        "/{final_chapter_id}/approve",
        post(approve_final_chapter).route_layer(middleware::from_fn(|req, next| {
            role_check(req, next, vec![UserRole::Reviewer, UserRole::Admin])
        })),
    )
}

/// Reviewer sign-off. Finalizing the chapter again clears it.
#[instrument(skip(app_state, jwt), fields(user_id = %jwt.user.id))]
pub async fn approve_final_chapter(
    ValidatedPath(final_chapter_id): ValidatedPath<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let final_chapter = app_state
        .db_client
        .approve_final_chapter(final_chapter_id, jwt.user.id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => {
                HttpError::not_found(ErrorMessage::FinalChapterNotFound.to_string())
            }
            e => {
                tracing::error!("DB error, approving final chapter: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    if let Err(e) = app_state
        .db_client
        .update_chapter_progress(final_chapter.chapter_id, Some(ChapterStatus::Approved), None)
        .await
    {
        tracing::warn!("Failed to mark chapter approved: {}", e);
    }

    tracing::info!("approve_final_chapter successful");
    Ok(Json(final_chapter))
}
