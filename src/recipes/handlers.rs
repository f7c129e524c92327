use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    recipes::{
        dto::{CreateCommentRequest, CreateRecipeRequest, FeedPage, UpdateRecipeRequest},
        feed::FeedQuery,
        repo_types::{Comment, Recipe},
    },
    state::AppState,
};

pub fn recipes_routes() -> Router<AppState> {
    Router::new()
        // public
        .route("/recipes/public/feed", get(public_feed))
        .route("/recipes/public/:id", get(get_public))
        // owner
        .route("/recipes", get(list_own).post(create))
        .route("/recipes/my", get(list_own))
        .route("/recipes/favorites", get(list_favorites))
        .route("/recipes/category/:category", get(list_by_category))
        .route(
            "/recipes/:id",
            get(get_own).patch(update).delete(delete_recipe),
        )
        // social
        .route("/recipes/:id/like", post(toggle_like))
        .route("/recipes/:id/comments", get(list_comments).post(add_comment))
        .route("/recipes/:id/comments/:comment_id", delete(delete_comment))
}

#[instrument(skip(state))]
pub async fn public_feed(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<FeedQuery>,
) -> AppResult<Json<FeedPage>> {
    Ok(Json(state.recipes.list_public_feed(query).await?))
}

#[instrument(skip(state))]
pub async fn get_public(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Recipe>> {
    Ok(Json(state.recipes.get_public(id).await?))
}

#[instrument(skip(state))]
pub async fn list_own(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<Recipe>>> {
    Ok(Json(state.recipes.list_own(user_id).await?))
}

#[instrument(skip(state))]
pub async fn list_favorites(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<Recipe>>> {
    Ok(Json(state.recipes.list_favorites(user_id).await?))
}

#[instrument(skip(state))]
pub async fn list_by_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(category): AppPath<String>,
) -> AppResult<Json<Vec<Recipe>>> {
    Ok(Json(state.recipes.list_by_category(user_id, &category).await?))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateRecipeRequest>,
) -> AppResult<(StatusCode, Json<Recipe>)> {
    let recipe = state.recipes.create(user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

#[instrument(skip(state))]
pub async fn get_own(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Recipe>> {
    Ok(Json(state.recipes.get_own(id, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateRecipeRequest>,
) -> AppResult<Json<Recipe>> {
    Ok(Json(state.recipes.update(id, user_id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    state.recipes.delete(id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Recipe>> {
    Ok(Json(state.recipes.toggle_like(id, user_id).await?))
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Vec<Comment>>> {
    Ok(Json(state.recipes.list_comments(id).await?))
}

#[instrument(skip(state, payload))]
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<Recipe>)> {
    let recipe = state.recipes.add_comment(id, user_id, &payload.text).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath((id, comment_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Json<Recipe>> {
    Ok(Json(
        state.recipes.delete_comment(id, comment_id, user_id).await?,
    ))
}
