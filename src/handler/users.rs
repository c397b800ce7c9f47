use crate::{
    AppState,
    db::DbError,
    dtos::{FilterUserDto, NameUpdateDto, RequestQueryDto, RoleUpdateDto},
    error::{ErrorMessage, HttpError},
    extract::{ValidatedJson, ValidatedPath, ValidatedQuery},
    middleware::{JWTAuthMiddleware, role_check},
    models::UserRole,
};
use axum::{
    Extension, Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, put},
};
use tracing::instrument;
use uuid::Uuid;

/// Router for user management endpoints
///
/// All routes are protected by the auth middleware (applied in routes.rs).
/// Listing users and changing roles are admin only.
pub fn users_handler() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).put(update_me))
        .route(
            "/",
            get(get_users).route_layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Admin])
            })),
        )
        .route(
            "/{user_id}/role",
            put(update_user_role).route_layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Admin])
            })),
        )
}

#[instrument(skip(user), fields(user_id = %user.user.id))]
pub async fn get_me(
    Extension(user): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    tracing::info!("get_me successful");
    Ok(Json(FilterUserDto::filter_user(&user.user)))
}

/// Update the caller's display name
#[instrument(skip(app_state, user, body), fields(user_id = %user.user.id))]
pub async fn update_me(
    State(app_state): State<AppState>,
    Extension(user): Extension<JWTAuthMiddleware>,
    ValidatedJson(body): ValidatedJson<NameUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    let updated = app_state
        .db_client
        .update_user_name(user.user.id, &body.name)
        .await
        .map_err(|e| {
            tracing::error!("DB error, updating user name: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!("update_me successful");
    Ok(Json(FilterUserDto::filter_user(&updated)))
}

/// Paginated list of all users (admin only)
///
/// Query params: ?page=1&limit=10
#[instrument(skip(app_state))]
pub async fn get_users(
    ValidatedQuery(query_params): ValidatedQuery<RequestQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(10);

    let users = app_state
        .db_client
        .get_users(page as u32, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting users: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!("get_users successful");
    Ok(Json(FilterUserDto::filter_users(&users)))
}

/// Change another user's role (admin only)
#[instrument(skip(app_state, body))]
pub async fn update_user_role(
    ValidatedPath(user_id): ValidatedPath<Uuid>,
    State(app_state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RoleUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    let updated = app_state
        .db_client
        .update_user_role(user_id, body.role)
        .await
        .map_err(|e| match e {
            DbError::NotFound => HttpError::not_found(ErrorMessage::UserNotFound.to_string()),
            e => {
                tracing::error!("DB error, updating user role: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!(role = updated.role.to_str(), "update_user_role successful");
    Ok(Json(FilterUserDto::filter_user(&updated)))
}
