use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::ValidationErrors;

/// Error body sent to clients.
///
/// ```json
/// { "error": "Validation error", "details": { "title": ["length"] } }
/// ```
///
/// `details` is only present for validation failures. Internal causes are logged
/// server-side and never copied into this struct.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Fixed client-facing messages.
#[derive(Debug, PartialEq)]
pub enum ErrorMessage {
    // Password
    EmptyPassword,
    ExceededMaxPasswordLength(usize),
    InvalidHashFormat,
    HashingError,

    // Authentication
    InvalidToken,
    TokenNotProvided,
    UserNotAuthenticated,
    UserNoLongerExist,
    WrongCredentials,

    // Authorization
    PermissionDenied,

    // Resources
    ProjectNotFound,
    ChapterNotFound,
    DraftNotFound,
    FinalChapterNotFound,
    UserNotFound,
    DuplicateChapterNumber,
    EmailExist,

    ValidationFailed,
    GenerationFailed,
    ServerError,
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorMessage::EmptyPassword => "Password cannot be empty".to_string(),
            ErrorMessage::ExceededMaxPasswordLength(max_length) => {
                format!("Password must not be more than {} characters", max_length)
            }
            ErrorMessage::InvalidHashFormat => "Invalid password hash format".to_string(),
            ErrorMessage::HashingError => "Error while hashing password".to_string(),
            ErrorMessage::InvalidToken => "Token is invalid or expired".to_string(),
            ErrorMessage::TokenNotProvided => {
                "You are not logged in, please provide a token".to_string()
            }
            ErrorMessage::UserNotAuthenticated => "Unauthorized".to_string(),
            ErrorMessage::UserNoLongerExist => {
                "User belonging to this token no longer exists".to_string()
            }
            ErrorMessage::WrongCredentials => "Email or password is wrong".to_string(),
            ErrorMessage::PermissionDenied => "Forbidden".to_string(),
            ErrorMessage::ProjectNotFound => "Project not found".to_string(),
            ErrorMessage::ChapterNotFound => "Chapter not found".to_string(),
            ErrorMessage::DraftNotFound => "Draft not found".to_string(),
            ErrorMessage::FinalChapterNotFound => "Final chapter not found".to_string(),
            ErrorMessage::UserNotFound => "User not found".to_string(),
            ErrorMessage::DuplicateChapterNumber => {
                "Chapter with this number already exists for this project".to_string()
            }
            ErrorMessage::EmailExist => "An account with this email already exists".to_string(),
            ErrorMessage::ValidationFailed => "Validation error".to_string(),
            ErrorMessage::GenerationFailed => "Failed to generate AI draft".to_string(),
            ErrorMessage::ServerError => "Internal server error".to_string(),
        };
        write!(f, "{}", message)
    }
}

/// Error type returned by every handler and middleware.
///
/// Bundles the client message with its status code so the two can't drift apart.
/// `details` carries the per-field report of a failed validation.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub status: StatusCode,
    pub details: Option<serde_json::Value>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        HttpError {
            message: message.into(),
            status,
            details: None,
        }
    }

    /// 500. Use for store failures and anything unexpected; callers log the cause
    /// and pass `ErrorMessage::ServerError` so nothing internal leaks.
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    /// 409, for unique constraint violations.
    pub fn unique_constraint_violation(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::CONFLICT)
    }

    /// 401: no resolvable caller identity.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::UNAUTHORIZED)
    }

    /// 403: authenticated but not the owner and not an admin.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::FORBIDDEN)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::NOT_FOUND)
    }

    /// 400 with every field-level violation listed under `details`.
    pub fn validation(errors: &ValidationErrors) -> Self {
        HttpError {
            message: ErrorMessage::ValidationFailed.to_string(),
            status: StatusCode::BAD_REQUEST,
            details: Some(validation_details(errors)),
        }
    }

    /// 400 for a body that failed to deserialize (wrong type, unknown enum value,
    /// missing required field).
    pub fn malformed_body(reason: impl Into<String>) -> Self {
        HttpError {
            message: ErrorMessage::ValidationFailed.to_string(),
            status: StatusCode::BAD_REQUEST,
            details: Some(serde_json::json!({ "body": [reason.into()] })),
        }
    }

    /// 400 for an id segment that isn't a valid UUID.
    pub fn malformed_path(reason: impl Into<String>) -> Self {
        HttpError {
            message: ErrorMessage::ValidationFailed.to_string(),
            status: StatusCode::BAD_REQUEST,
            details: Some(serde_json::json!({ "path": [reason.into()] })),
        }
    }

    pub fn into_http_response(self) -> Response {
        let json_response = Json(ErrorResponse {
            error: self.message,
            details: self.details,
        });

        (self.status, json_response).into_response()
    }
}

/// Flattens `ValidationErrors` into `{ field: [message, ...] }`.
///
/// Nested structs and lists are reported under their parent field name.
fn validation_details(errors: &ValidationErrors) -> serde_json::Value {
    let mut fields = serde_json::Map::new();

    for (field, kind) in errors.errors() {
        let messages: Vec<serde_json::Value> = match kind {
            validator::ValidationErrorsKind::Field(errs) => errs
                .iter()
                .map(|e| {
                    let text = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    serde_json::Value::String(text)
                })
                .collect(),
            validator::ValidationErrorsKind::Struct(inner) => vec![validation_details(inner)],
            validator::ValidationErrorsKind::List(items) => items
                .values()
                .map(|inner| validation_details(inner))
                .collect(),
        };
        fields.insert(field.to_string(), serde_json::Value::Array(messages));
    }

    serde_json::Value::Object(fields)
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpError: message: {}, status: {}",
            self.message, self.status
        )
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}
