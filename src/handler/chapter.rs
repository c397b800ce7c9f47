use std::collections::HashMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::{Extension, Router};
use tracing::instrument;
use uuid::Uuid;

use crate::AppState;
use crate::access;
use crate::db::DbError;
use crate::dtos::{
    BulkCreateChaptersDto, ChapterDetailDto, ChapterWithDraftsDto, ChaptersQueryParams,
    CreateChapterDto, DEFAULT_TARGET_WORD_COUNT, MessageResponse, UpdateChapterDto,
};
use crate::error::{ErrorMessage, HttpError};
use crate::extract::{ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::middleware::JWTAuthMiddleware;
use crate::models::{AiDraft, FinalChapter};

pub fn chapter_handler() -> Router<AppState> {
    Router::new()
        .route("/", get(get_chapters).post(create_chapter))
        .route("/bulk", post(create_chapters_bulk))
        .route(
            "/{chapter_id}",
            get(get_chapter).put(update_chapter).delete(delete_chapter),
        )
        .route("/{chapter_id}/drafts", get(get_chapter_drafts))
}

/// Store errors on chapter writes: a taken chapter_number is a 409, a vanished
/// row or parent a 404.
fn chapter_write_error(context: &str, e: DbError) -> HttpError {
    match e {
        DbError::UniqueViolation(_) => {
            tracing::warn!("DB error, {}, unique_violation: {}", context, e);
            HttpError::unique_constraint_violation(
                ErrorMessage::DuplicateChapterNumber.to_string(),
            )
        }
        DbError::NotFound => HttpError::not_found(ErrorMessage::ChapterNotFound.to_string()),
        DbError::ForeignKeyViolation(_) => {
            HttpError::not_found(ErrorMessage::ProjectNotFound.to_string())
        }
        e => {
            tracing::error!("DB error, {}: {}", context, e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        }
    }
}

/// A project's chapters by chapter_number, each with its drafts and final text.
///
/// Query params: ?project_id (required) &status
#[instrument(skip(app_state, params))]
pub async fn get_chapters(
    ValidatedQuery(params): ValidatedQuery<ChaptersQueryParams>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let project_id = params.project_id.ok_or_else(|| HttpError {
        details: Some(serde_json::json!({ "project_id": ["project_id is required"] })),
        ..HttpError::bad_request(ErrorMessage::ValidationFailed.to_string())
    })?;

    let chapters = app_state
        .db_client
        .get_chapters(project_id, params.status)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting chapters: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let chapter_ids: Vec<Uuid> = chapters.iter().map(|c| c.id).collect();

    let drafts = app_state
        .db_client
        .get_drafts_for_chapters(&chapter_ids)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting chapter drafts: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let final_chapters = app_state
        .db_client
        .get_final_chapters_for_chapters(&chapter_ids)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting final chapters: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let mut drafts_by_chapter: HashMap<Uuid, Vec<AiDraft>> = HashMap::new();
    for draft in drafts {
        drafts_by_chapter.entry(draft.chapter_id).or_default().push(draft);
    }
    let mut finals_by_chapter: HashMap<Uuid, Vec<FinalChapter>> = HashMap::new();
    for final_chapter in final_chapters {
        finals_by_chapter
            .entry(final_chapter.chapter_id)
            .or_default()
            .push(final_chapter);
    }

    let response: Vec<ChapterWithDraftsDto> = chapters
        .into_iter()
        .map(|chapter| ChapterWithDraftsDto {
            ai_drafts: drafts_by_chapter.remove(&chapter.id).unwrap_or_default(),
            final_chapters: finals_by_chapter.remove(&chapter.id).unwrap_or_default(),
            chapter,
        })
        .collect();

    tracing::info!(count = response.len(), "get_chapters successful");
    Ok(Json(response))
}

#[instrument(skip(app_state, jwt, body), fields(user_id = %jwt.user.id, project_id = %body.project_id, chapter_number = body.chapter_number))]
pub async fn create_chapter(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    ValidatedJson(body): ValidatedJson<CreateChapterDto>,
) -> Result<impl IntoResponse, HttpError> {
    access::require_owned_project(app_state.db_client.as_ref(), &jwt.user, body.project_id)
        .await?;

    let chapter = app_state
        .db_client
        .create_chapter(&body)
        .await
        .map_err(|e| chapter_write_error("creating chapter", e))?;

    tracing::info!(chapter_id = %chapter.id, "create_chapter successful");
    Ok((StatusCode::CREATED, Json(chapter)))
}

/// Chapters 1..=chapter_count titled "Chapter {n}". All or nothing.
#[instrument(skip(app_state, jwt, body), fields(user_id = %jwt.user.id, project_id = %body.project_id, count = body.chapter_count))]
pub async fn create_chapters_bulk(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    ValidatedJson(body): ValidatedJson<BulkCreateChaptersDto>,
) -> Result<impl IntoResponse, HttpError> {
    access::require_owned_project(app_state.db_client.as_ref(), &jwt.user, body.project_id)
        .await?;

    let target_word_count = body.target_word_count.unwrap_or(DEFAULT_TARGET_WORD_COUNT);

    let chapters = app_state
        .db_client
        .create_chapters_bulk(body.project_id, body.chapter_count, target_word_count)
        .await
        .map_err(|e| chapter_write_error("creating chapters in bulk", e))?;

    tracing::info!("create_chapters_bulk successful");
    Ok((StatusCode::CREATED, Json(chapters)))
}

/// Chapter with its project, drafts (highest pass first) and final text
#[instrument(skip(app_state))]
pub async fn get_chapter(
    ValidatedPath(chapter_id): ValidatedPath<Uuid>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let chapter = app_state
        .db_client
        .get_chapter(chapter_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting chapter: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ChapterNotFound.to_string()))?;

    let project = app_state
        .db_client
        .get_project(chapter.project_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting project: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ProjectNotFound.to_string()))?;

    let ai_drafts = app_state
        .db_client
        .get_chapter_drafts(chapter_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting chapter drafts: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let final_chapter = app_state
        .db_client
        .get_final_chapter_for_chapter(chapter_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting final chapter: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!("get_chapter successful");
    Ok(Json(ChapterDetailDto {
        chapter,
        project,
        ai_drafts,
        final_chapters: final_chapter.into_iter().collect(),
    }))
}

#[instrument(skip(app_state))]
pub async fn get_chapter_drafts(
    ValidatedPath(chapter_id): ValidatedPath<Uuid>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .get_chapter(chapter_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting chapter: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ChapterNotFound.to_string()))?;

    let drafts = app_state
        .db_client
        .get_chapter_drafts(chapter_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting chapter drafts: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(Json(drafts))
}

#[instrument(skip(app_state, jwt, body), fields(user_id = %jwt.user.id))]
pub async fn update_chapter(
    ValidatedPath(chapter_id): ValidatedPath<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    ValidatedJson(body): ValidatedJson<UpdateChapterDto>,
) -> Result<impl IntoResponse, HttpError> {
    access::authorize_chapter(app_state.db_client.as_ref(), &jwt.user, chapter_id).await?;

    let chapter = app_state
        .db_client
        .update_chapter(chapter_id, &body)
        .await
        .map_err(|e| chapter_write_error("updating chapter", e))?;

    tracing::info!("update_chapter successful");
    Ok(Json(chapter))
}

/// Drafts and the final chapter go with it.
#[instrument(skip(app_state, jwt), fields(user_id = %jwt.user.id))]
pub async fn delete_chapter(
    ValidatedPath(chapter_id): ValidatedPath<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    access::authorize_chapter(app_state.db_client.as_ref(), &jwt.user, chapter_id).await?;

    app_state
        .db_client
        .delete_chapter(chapter_id)
        .await
        .map_err(|e| chapter_write_error("deleting chapter", e))?;

    tracing::info!("delete_chapter successful");
    Ok(Json(MessageResponse::new("Chapter deleted successfully")))
}
