use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::{Extension, Router};
use tracing::instrument;
use uuid::Uuid;

use crate::AppState;
use crate::access;
use crate::db::{DbError, ProjectFilter};
use crate::dtos::{
    CreateProjectDto, MessageResponse, ProjectDetailDto, ProjectsQueryParams, UpdateProjectDto,
};
use crate::error::{ErrorMessage, HttpError};
use crate::extract::{ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::middleware::JWTAuthMiddleware;

const DEFAULT_PAGE_SIZE: i64 = 50;

pub fn project_handler() -> Router<AppState> {
    Router::new()
        .route("/", get(get_projects).post(create_project))
        .route(
            "/{project_id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/{project_id}/overview", get(get_project_overview))
}

/// Newest first. Query params: ?status&genre&created_by&limit=50&offset=0
#[instrument(skip(app_state, params))]
pub async fn get_projects(
    ValidatedQuery(params): ValidatedQuery<ProjectsQueryParams>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let filter = ProjectFilter {
        status: params.status,
        genre: params.genre,
        created_by: params.created_by,
    };
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0);

    let projects = app_state
        .db_client
        .get_projects(&filter, limit, offset)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting projects: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!(count = projects.len(), "get_projects successful");
    Ok(Json(projects))
}

#[instrument(skip(app_state, jwt, body), fields(user_id = %jwt.user.id, title = %body.title))]
pub async fn create_project(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    ValidatedJson(body): ValidatedJson<CreateProjectDto>,
) -> Result<impl IntoResponse, HttpError> {
    let project = app_state
        .db_client
        .create_project(jwt.user.id, &body)
        .await
        .map_err(|e| {
            tracing::error!("DB error, creating project: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!(project_id = %project.id, "create_project successful");
    Ok((StatusCode::CREATED, Json(project)))
}

/// Project with its chapters (reading order) and feedback
#[instrument(skip(app_state))]
pub async fn get_project(
    ValidatedPath(project_id): ValidatedPath<Uuid>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let project = app_state
        .db_client
        .get_project(project_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting project: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ProjectNotFound.to_string()))?;

    let chapters = app_state
        .db_client
        .get_chapters(project_id, None)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting project chapters: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let feedback = app_state
        .db_client
        .get_project_feedback(project_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting project feedback: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!("get_project successful");
    Ok(Json(ProjectDetailDto {
        project,
        chapters,
        feedback,
    }))
}

#[instrument(skip(app_state))]
pub async fn get_project_overview(
    ValidatedPath(project_id): ValidatedPath<Uuid>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let overview = app_state
        .db_client
        .get_project_overview(project_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => HttpError::not_found(ErrorMessage::ProjectNotFound.to_string()),
            e => {
                tracing::error!("DB error, getting project overview: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    Ok(Json(overview))
}

#[instrument(skip(app_state, jwt, body), fields(user_id = %jwt.user.id))]
pub async fn update_project(
    ValidatedPath(project_id): ValidatedPath<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    ValidatedJson(body): ValidatedJson<UpdateProjectDto>,
) -> Result<impl IntoResponse, HttpError> {
    access::authorize_project(app_state.db_client.as_ref(), &jwt.user, project_id).await?;

    let project = app_state
        .db_client
        .update_project(project_id, &body)
        .await
        .map_err(|e| match e {
            DbError::NotFound => HttpError::not_found(ErrorMessage::ProjectNotFound.to_string()),
            e => {
                tracing::error!("DB error, updating project: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!("update_project successful");
    Ok(Json(project))
}

/// Chapters, drafts, final chapters and feedback are removed with the project.
#[instrument(skip(app_state, jwt), fields(user_id = %jwt.user.id))]
pub async fn delete_project(
    ValidatedPath(project_id): ValidatedPath<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    access::authorize_project(app_state.db_client.as_ref(), &jwt.user, project_id).await?;

    app_state
        .db_client
        .delete_project(project_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => HttpError::not_found(ErrorMessage::ProjectNotFound.to_string()),
            e => {
                tracing::error!("DB error, deleting project: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!("delete_project successful");
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}
