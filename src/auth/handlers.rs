use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, GoogleAuthRequest, LoginRequest, RegisterRequest, ValidateTokenRequest},
        extractors::AuthUser,
    },
    error::AppResult,
    extract::AppJson,
    state::AppState,
    users::dto::{Profile, PublicUser},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/google", post(google))
        .route("/auth/profile", get(profile))
        .route("/auth/validate", post(validate))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let res = state.auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    Ok(Json(state.auth.login(payload).await?))
}

#[instrument(skip(state, payload))]
pub async fn google(
    State(state): State<AppState>,
    AppJson(payload): AppJson<GoogleAuthRequest>,
) -> AppResult<Json<AuthResponse>> {
    Ok(Json(state.auth.external_login(payload).await?))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Profile>> {
    Ok(Json(state.auth.get_profile(user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn validate(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ValidateTokenRequest>,
) -> AppResult<Json<PublicUser>> {
    Ok(Json(state.auth.verify_token(&payload.token).await?))
}
