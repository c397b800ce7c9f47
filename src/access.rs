use uuid::Uuid;

use crate::{
    db::{DbError, Store},
    error::{ErrorMessage, HttpError},
    models::{AiDraft, Chapter, Project, User, UserRole},
};

/// Admins may change anything; everyone else only projects they created.
pub fn can_modify(user: &User, created_by: Option<Uuid>) -> bool {
    user.role == UserRole::Admin || created_by == Some(user.id)
}

pub fn ensure_owner(user: &User, project: &Project) -> Result<(), HttpError> {
    if can_modify(user, project.created_by) {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, project_id = %project.id, "Ownership check failed");
        Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()))
    }
}

/// A missing target looks the same as a forbidden one unless the caller is an admin.
fn missing(user: &User, message: ErrorMessage) -> HttpError {
    if user.role == UserRole::Admin {
        HttpError::not_found(message.to_string())
    } else {
        HttpError::forbidden(ErrorMessage::PermissionDenied.to_string())
    }
}

fn store_failure(context: &str, e: DbError) -> HttpError {
    tracing::error!("DB error, {}: {}", context, e);
    HttpError::server_error(ErrorMessage::ServerError.to_string())
}

async fn load_project(store: &dyn Store, project_id: Uuid) -> Result<Option<Project>, HttpError> {
    store
        .get_project(project_id)
        .await
        .map_err(|e| store_failure("getting project", e))
}

async fn load_chapter(store: &dyn Store, chapter_id: Uuid) -> Result<Option<Chapter>, HttpError> {
    store
        .get_chapter(chapter_id)
        .await
        .map_err(|e| store_failure("getting chapter", e))
}

// Parent lookups for creates. The parent must exist (404) before ownership is checked (403).

pub async fn require_owned_project(
    store: &dyn Store,
    user: &User,
    project_id: Uuid,
) -> Result<Project, HttpError> {
    let project = load_project(store, project_id)
        .await?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ProjectNotFound.to_string()))?;
    ensure_owner(user, &project)?;
    Ok(project)
}

pub async fn require_owned_chapter(
    store: &dyn Store,
    user: &User,
    chapter_id: Uuid,
) -> Result<(Chapter, Project), HttpError> {
    let chapter = load_chapter(store, chapter_id)
        .await?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ChapterNotFound.to_string()))?;
    let project = require_owned_project(store, user, chapter.project_id).await?;
    Ok((chapter, project))
}

// Mutations addressed by the resource's own id. The chain is walked
// draft -> chapter -> project -> created_by.

pub async fn authorize_project(
    store: &dyn Store,
    user: &User,
    project_id: Uuid,
) -> Result<Project, HttpError> {
    let project = load_project(store, project_id)
        .await?
        .ok_or_else(|| missing(user, ErrorMessage::ProjectNotFound))?;
    ensure_owner(user, &project)?;
    Ok(project)
}

pub async fn authorize_chapter(
    store: &dyn Store,
    user: &User,
    chapter_id: Uuid,
) -> Result<(Chapter, Project), HttpError> {
    let chapter = load_chapter(store, chapter_id)
        .await?
        .ok_or_else(|| missing(user, ErrorMessage::ChapterNotFound))?;
    let project = load_project(store, chapter.project_id)
        .await?
        .ok_or_else(|| missing(user, ErrorMessage::ProjectNotFound))?;
    ensure_owner(user, &project)?;
    Ok((chapter, project))
}

pub async fn authorize_draft(
    store: &dyn Store,
    user: &User,
    draft_id: Uuid,
) -> Result<(AiDraft, Chapter), HttpError> {
    let draft = store
        .get_draft(draft_id)
        .await
        .map_err(|e| store_failure("getting draft", e))?
        .ok_or_else(|| missing(user, ErrorMessage::DraftNotFound))?;
    let (chapter, _) = authorize_chapter(store, user, draft.chapter_id).await?;
    Ok((draft, chapter))
}
