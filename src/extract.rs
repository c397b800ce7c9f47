use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::HttpError;

/// JSON body that has been deserialized and validated.
///
/// Shape errors (bad JSON, wrong type, unknown enum value) and rule violations
/// both come back as 400 with the problems listed under `details`, before the
/// handler body runs.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::error!("Malformed request body: {}", rejection.body_text());
            HttpError::malformed_body(rejection.body_text())
        })?;

        value.validate().map_err(|e| {
            tracing::error!("Invalid request body: {}", e);
            HttpError::validation(&e)
        })?;

        Ok(ValidatedJson(value))
    }
}

/// Query string counterpart of `ValidatedJson`.
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::error!("Malformed query string: {}", rejection.body_text());
                HttpError::malformed_body(rejection.body_text())
            })?;

        value.validate().map_err(|e| {
            tracing::error!("Invalid query parameters: {}", e);
            HttpError::validation(&e)
        })?;

        Ok(ValidatedQuery(value))
    }
}

/// Path parameters (resource ids). A value that doesn't parse is a 400 in the
/// usual error shape instead of axum's plain-text rejection.
#[derive(Debug, Clone)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::warn!("Malformed path parameter: {}", rejection.body_text());
                HttpError::malformed_path(rejection.body_text())
            })?;

        Ok(ValidatedPath(value))
    }
}
