use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    extract::{AppJson, AppPath},
    pantry::{
        dto::{
            AddIngredientsRequest, CreatePantryItemRequest, MessageResponse,
            UpdatePantryItemRequest,
        },
        repo_types::PantryItem,
        services::EXPIRING_SOON_DAYS,
    },
    state::AppState,
};

pub fn pantry_routes() -> Router<AppState> {
    Router::new()
        .route("/pantry", get(list).post(create).delete(delete_all))
        .route("/pantry/batch", post(create_many))
        .route("/pantry/expiring", get(expiring))
        .route("/pantry/:id", get(get_one).patch(update).delete(delete_one))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreatePantryItemRequest>,
) -> AppResult<(StatusCode, Json<PantryItem>)> {
    let item = state.pantry.create(user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state, payload))]
pub async fn create_many(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<AddIngredientsRequest>,
) -> AppResult<(StatusCode, Json<Vec<PantryItem>>)> {
    let items = state.pantry.create_many(user_id, payload.ingredients).await?;
    Ok((StatusCode::CREATED, Json(items)))
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<PantryItem>>> {
    Ok(Json(state.pantry.list_by_user(user_id).await?))
}

#[instrument(skip(state))]
pub async fn expiring(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<PantryItem>>> {
    Ok(Json(
        state
            .pantry
            .list_expiring_soon(user_id, EXPIRING_SOON_DAYS)
            .await?,
    ))
}

#[instrument(skip(state))]
pub async fn get_one(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<PantryItem>> {
    Ok(Json(state.pantry.get_by_id(id, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdatePantryItemRequest>,
) -> AppResult<Json<PantryItem>> {
    Ok(Json(state.pantry.update(id, user_id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_one(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state.pantry.delete(id, user_id).await?;
    Ok(Json(MessageResponse::new("Pantry item deleted")))
}

#[instrument(skip(state))]
pub async fn delete_all(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<MessageResponse>> {
    state.pantry.delete_all(user_id).await?;
    Ok(Json(MessageResponse::new("All pantry items deleted")))
}
