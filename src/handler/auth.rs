use crate::{
    AppState,
    db::DbError,
    dtos::{FilterUserDto, LoginUserDto, RegisterUserDto, UserLoginResponseDto},
    error::{ErrorMessage, HttpError},
    extract::ValidatedJson,
    models::UserRole,
    utils::{password, token},
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use tracing::instrument;

/// Router for authentication endpoints. Sign-out is done client-side by
/// discarding the token.
pub fn auth_handler() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Create an account. New users are generation agents unless they ask for the
/// reviewer role; admin cannot be self-assigned.
#[instrument(skip(app_state, body), fields(email = %body.email))]
pub async fn register(
    State(app_state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    let role = body.role.unwrap_or(UserRole::GenerationAgent);
    if role == UserRole::Admin {
        tracing::warn!("Attempt to self-register as admin");
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let hash_password = password::hash(&body.password).map_err(|e| {
        tracing::error!("Password hashing error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let user = app_state
        .db_client
        .save_user(&body.name, &body.email, &hash_password, role)
        .await
        .map_err(|e| match e {
            DbError::UniqueViolation(_) => {
                tracing::error!("DB error, saving user, unique_violation: {}", e);
                HttpError::unique_constraint_violation(ErrorMessage::EmailExist.to_string())
            }
            e => {
                tracing::error!("DB error, saving user: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!(user_id = %user.id, "Register Successful");
    Ok((StatusCode::CREATED, Json(FilterUserDto::filter_user(&user))))
}

/// Exchange credentials for a bearer token.
#[instrument(skip(app_state, body), fields(email = %body.email))]
pub async fn login(
    State(app_state): State<AppState>,
    ValidatedJson(body): ValidatedJson<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .get_user_by_email(&body.email)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| {
            tracing::error!("User not found");
            HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string())
        })?;

    let password_matched = password::compare(&body.password, &user.password).map_err(|e| {
        tracing::error!("Password error: {}", e);
        HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string())
    })?;

    if !password_matched {
        tracing::error!("Wrong password");
        return Err(HttpError::unauthorized(
            ErrorMessage::WrongCredentials.to_string(),
        ));
    }

    let access_token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| {
        tracing::error!("Access token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    tracing::info!(user_id = %user.id, "Login Successful");
    Ok(Json(UserLoginResponseDto {
        token: access_token,
        user: FilterUserDto::filter_user(&user),
    }))
}
