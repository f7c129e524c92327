use serde::{Deserialize, Serialize};

use crate::recipes::repo_types::{Ingredient, Recipe};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeRequest {
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub prep_time: i32,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update. Unknown fields such as `likes` or `comments` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub prep_time: Option<i32>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub steps: Option<Vec<String>>,
    /// `null` removes the image.
    #[serde(default, deserialize_with = "crate::patch::nullable")]
    pub image: Option<Option<String>>,
    pub is_favorite: Option<bool>,
    pub is_public: Option<bool>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub recipes: Vec<Recipe>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}
