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
use crate::db::{DbError, DraftFilter};
use crate::dtos::{
    ChapterWithProjectDto, CreateDraftDto, DraftDetailDto, DraftWithChapterDto, DraftsQueryParams,
    FinalizeResponseDto, MessageResponse, NewDraft,
};
use crate::error::{ErrorMessage, HttpError};
use crate::extract::{ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::middleware::JWTAuthMiddleware;
use crate::models::{Chapter, ChapterStatus};
use crate::utils::text::word_count;

const DEFAULT_DRAFT_LIMIT: i64 = 10;

pub fn draft_handler() -> Router<AppState> {
    Router::new()
        .route("/", get(get_drafts).post(create_draft))
        .route("/{draft_id}", get(get_draft).delete(delete_draft))
        .route("/{draft_id}/finalize", post(finalize_draft))
}

/// Newest first, each with its chapter. Query params: ?chapter_id&project_id&limit=10
#[instrument(skip(app_state, params))]
pub async fn get_drafts(
    ValidatedQuery(params): ValidatedQuery<DraftsQueryParams>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let filter = DraftFilter {
        chapter_id: params.chapter_id,
        project_id: params.project_id,
    };
    let limit = params.limit.unwrap_or(DEFAULT_DRAFT_LIMIT);

    let drafts = app_state
        .db_client
        .get_drafts(&filter, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting drafts: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let mut chapter_ids: Vec<Uuid> = drafts.iter().map(|d| d.chapter_id).collect();
    chapter_ids.sort_unstable();
    chapter_ids.dedup();

    let chapters: HashMap<Uuid, Chapter> = app_state
        .db_client
        .get_chapters_by_ids(&chapter_ids)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting draft chapters: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let response: Vec<DraftWithChapterDto> = drafts
        .into_iter()
        .filter_map(|draft| {
            let chapter = chapters.get(&draft.chapter_id)?.clone();
            Some(DraftWithChapterDto { draft, chapter })
        })
        .collect();

    tracing::info!(count = response.len(), "get_drafts successful");
    Ok(Json(response))
}

/// Save a draft by hand. Without an explicit pass_number the draft becomes the
/// chapter's next pass.
#[instrument(skip(app_state, jwt, body), fields(user_id = %jwt.user.id, chapter_id = %body.chapter_id))]
pub async fn create_draft(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    ValidatedJson(body): ValidatedJson<CreateDraftDto>,
) -> Result<impl IntoResponse, HttpError> {
    let (chapter, _) =
        access::require_owned_chapter(app_state.db_client.as_ref(), &jwt.user, body.chapter_id)
            .await?;

    let pass_number = match body.pass_number {
        Some(pass_number) => pass_number,
        None => {
            app_state
                .db_client
                .get_max_pass_number(chapter.id)
                .await
                .map_err(|e| {
                    tracing::error!("DB error, getting max pass number: {}", e);
                    HttpError::server_error(ErrorMessage::ServerError.to_string())
                })?
                .unwrap_or(0)
                + 1
        }
    };

    let new_draft = NewDraft {
        chapter_id: chapter.id,
        content: body.content,
        model_used: body.model_used,
        pass_number,
        prompt_tokens: body.prompt_tokens,
        completion_tokens: body.completion_tokens,
        total_cost: body.total_cost.unwrap_or(0.0),
    };

    let draft = app_state
        .db_client
        .create_draft(&new_draft)
        .await
        .map_err(|e| match e {
            DbError::ForeignKeyViolation(_) => {
                HttpError::not_found(ErrorMessage::ChapterNotFound.to_string())
            }
            e => {
                tracing::error!("DB error, creating draft: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    // The draft is saved; chapter bookkeeping below is best-effort.
    if let Err(e) = app_state.db_client.mark_chapter_started(chapter.id).await {
        tracing::warn!("Failed to mark chapter started: {}", e);
    }
    if let Err(e) = app_state
        .db_client
        .update_chapter_progress(chapter.id, None, Some(word_count(&draft.content)))
        .await
    {
        tracing::warn!("Failed to update chapter word count: {}", e);
    }

    tracing::info!(draft_id = %draft.id, pass_number = draft.pass_number, "create_draft successful");
    Ok((StatusCode::CREATED, Json(draft)))
}

/// Draft with its chapter and that chapter's project
#[instrument(skip(app_state))]
pub async fn get_draft(
    ValidatedPath(draft_id): ValidatedPath<Uuid>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let draft = app_state
        .db_client
        .get_draft(draft_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting draft: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::DraftNotFound.to_string()))?;

    let chapter = app_state
        .db_client
        .get_chapter(draft.chapter_id)
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

    Ok(Json(DraftDetailDto {
        draft,
        chapter: ChapterWithProjectDto { chapter, project },
    }))
}

#[instrument(skip(app_state, jwt), fields(user_id = %jwt.user.id))]
pub async fn delete_draft(
    ValidatedPath(draft_id): ValidatedPath<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    access::authorize_draft(app_state.db_client.as_ref(), &jwt.user, draft_id).await?;

    app_state
        .db_client
        .delete_draft(draft_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => HttpError::not_found(ErrorMessage::DraftNotFound.to_string()),
            e => {
                tracing::error!("DB error, deleting draft: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!("delete_draft successful");
    Ok(Json(MessageResponse::new("Draft deleted successfully")))
}

/// Promote a draft to the chapter's final text.
///
/// The chapter keeps a single final_chapter row: finalizing again overwrites its
/// content and clears any approval.
#[instrument(skip(app_state, jwt), fields(user_id = %jwt.user.id))]
pub async fn finalize_draft(
    ValidatedPath(draft_id): ValidatedPath<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let (draft, chapter) =
        access::authorize_draft(app_state.db_client.as_ref(), &jwt.user, draft_id).await?;

    let final_chapter = app_state
        .db_client
        .upsert_final_chapter(chapter.id, &draft.content, word_count(&draft.content))
        .await
        .map_err(|e| {
            tracing::error!("DB error, saving final chapter: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    if let Err(e) = app_state
        .db_client
        .update_chapter_progress(chapter.id, Some(ChapterStatus::DraftComplete), None)
        .await
    {
        tracing::warn!("Failed to mark chapter draft_complete: {}", e);
    }

    tracing::info!(final_chapter_id = %final_chapter.id, "finalize_draft successful");
    Ok(Json(FinalizeResponseDto {
        message: "Draft finalized successfully".to_string(),
        final_chapter,
    }))
}
