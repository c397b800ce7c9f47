use axum::extract::State;
use axum::response::{IntoResponse, Json};
use axum::routing::post;
use axum::{Extension, Router};
use tracing::instrument;

use crate::AppState;
use crate::access;
use crate::dtos::{GenerateDraftDto, GenerateDraftResponseDto, NewDraft};
use crate::error::{ErrorMessage, HttpError};
use crate::extract::ValidatedJson;
use crate::http::GenerationRequest;
use crate::middleware::JWTAuthMiddleware;
use crate::models::{Chapter, ChapterStatus};
use crate::utils::pricing::estimate_cost;
use crate::utils::prompt::{MAX_OUTPUT_TOKENS, PromptTemplate, SYSTEM_PERSONA, TEMPERATURE};
use crate::utils::text::{continuity_excerpt, word_count};

pub fn ai_draft_handler() -> Router<AppState> {
    Router::new().route("/", post(generate_draft))
}

/// Opening of the previous chapter's highest-pass draft, if there is one.
async fn previous_chapter_context(
    app_state: &AppState,
    chapter: &Chapter,
) -> Result<Option<String>, HttpError> {
    if chapter.chapter_number <= 1 {
        return Ok(None);
    }

    let previous = app_state
        .db_client
        .get_chapter_by_number(chapter.project_id, chapter.chapter_number - 1)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting previous chapter: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let Some(previous) = previous else {
        return Ok(None);
    };

    let latest = app_state
        .db_client
        .get_latest_draft(previous.id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting previous chapter draft: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(latest.map(|draft| continuity_excerpt(&draft.content)))
}

/// Generate the next pass of a chapter.
///
/// The draft row is the success contract. The chapter progress and project cost
/// updates that follow are best-effort and only logged on failure.
#[instrument(skip(app_state, jwt, body), fields(user_id = %jwt.user.id, chapter_id = %body.chapter_id, project_id = %body.project_id))]
pub async fn generate_draft(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    ValidatedJson(body): ValidatedJson<GenerateDraftDto>,
) -> Result<impl IntoResponse, HttpError> {
    let chapter = app_state
        .db_client
        .get_chapter(body.chapter_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting chapter: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ChapterNotFound.to_string()))?;

    let project = app_state
        .db_client
        .get_project(body.project_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting project: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ProjectNotFound.to_string()))?;

    if chapter.project_id != project.id {
        tracing::warn!("Chapter does not belong to the given project");
        return Err(HttpError::not_found(
            ErrorMessage::ChapterNotFound.to_string(),
        ));
    }

    access::ensure_owner(&jwt.user, &project)?;

    let pass_number = app_state
        .db_client
        .get_max_pass_number(chapter.id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting max pass number: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .unwrap_or(0)
        + 1;

    let context = previous_chapter_context(&app_state, &chapter).await?;

    let prompt = PromptTemplate::new(&project, &chapter, context.as_deref()).render();
    let model = app_state.generator.model_name().to_string();

    let request = GenerationRequest {
        system: SYSTEM_PERSONA.to_string(),
        prompt,
        model: model.clone(),
        temperature: TEMPERATURE,
        max_tokens: MAX_OUTPUT_TOKENS,
    };

    let generation = app_state.generator.generate(&request).await.map_err(|e| {
        tracing::error!("Generation error: {}", e);
        HttpError::server_error(ErrorMessage::GenerationFailed.to_string())
    })?;

    let total_cost = estimate_cost(
        &model,
        generation.prompt_tokens,
        generation.completion_tokens,
    );

    let new_draft = NewDraft {
        chapter_id: chapter.id,
        content: generation.content,
        model_used: model,
        pass_number,
        prompt_tokens: Some(generation.prompt_tokens.try_into().unwrap_or(i32::MAX)),
        completion_tokens: Some(generation.completion_tokens.try_into().unwrap_or(i32::MAX)),
        total_cost,
    };

    let draft = app_state
        .db_client
        .create_draft(&new_draft)
        .await
        .map_err(|e| {
            tracing::error!("DB error, saving generated draft: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    if let Err(e) = app_state
        .db_client
        .update_chapter_progress(
            chapter.id,
            Some(ChapterStatus::AiDraft),
            Some(word_count(&draft.content)),
        )
        .await
    {
        tracing::warn!("Failed to update chapter after generation: {}", e);
    }

    if let Err(e) = app_state
        .db_client
        .add_project_cost(project.id, draft.total_cost)
        .await
    {
        tracing::warn!("Failed to add generation cost to project: {}", e);
    }

    tracing::info!(
        draft_id = %draft.id,
        pass_number = draft.pass_number,
        cost = draft.total_cost,
        "generate_draft successful"
    );

    let message = format!("AI draft generated successfully (Pass {})", draft.pass_number);
    Ok(Json(GenerateDraftResponseDto {
        success: true,
        draft,
        message,
    }))
}
