use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod feed;
pub mod handlers;
pub mod nutrition;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::recipes_routes()
}
