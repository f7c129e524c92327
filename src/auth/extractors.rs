use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::{auth::services::AuthService, error::AppError};

/// Extracts the bearer JWT and resolves it to a user that still exists.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| AppError::unauthorized("Invalid Authorization header"))?;

        let user = AuthService::from_ref(state)
            .verify_token(token)
            .await
            .map_err(|e| match e {
                AppError::Unauthorized(_) => {
                    warn!("invalid or expired token");
                    AppError::unauthorized("Invalid or expired token")
                }
                other => other,
            })?;

        Ok(AuthUser(user.id))
    }
}
