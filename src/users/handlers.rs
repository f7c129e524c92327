use axum::{
    extract::State,
    http::StatusCode,
    routing::patch,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    extract::AppJson,
    state::AppState,
    users::dto::{PublicUser, UpdateProfileRequest},
};

pub fn users_routes() -> Router<AppState> {
    Router::new().route("/users/me", patch(update_me).delete(delete_me))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<PublicUser>> {
    let user = state.users.update(user_id, payload).await?;
    info!(user_id = %user.id, "profile updated");
    Ok(Json(PublicUser::from(&user)))
}

#[instrument(skip(state))]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<StatusCode> {
    state.users.delete(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
