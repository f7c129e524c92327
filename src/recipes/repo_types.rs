use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// One ingredient line. Macro values are per 100 units of `quantity`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_id: Option<String>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
}

/// Comment embedded in a recipe's `comments` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionTotals {
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_fat: f64,
    pub total_carbs: f64,
}

#[derive(Debug, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub prep_time: i32,
    pub ingredients: Json<Vec<Ingredient>>,
    pub steps: Vec<String>,
    pub image: Option<String>,
    pub is_favorite: bool,
    pub is_public: bool,
    pub likes: i32,
    pub liked_by: Vec<Uuid>,
    pub views: i32,
    pub tags: Vec<String>,
    pub comments: Json<Vec<Comment>>,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_fat: f64,
    pub total_carbs: f64,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub prep_time: i32,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<String>,
    pub image: Option<String>,
    pub is_favorite: bool,
    pub is_public: bool,
    pub likes: i32,
    pub liked_by: Vec<Uuid>,
    pub views: i32,
    pub tags: Vec<String>,
    pub comments: Vec<Comment>,
    #[serde(flatten)]
    pub nutrition: NutritionTotals,
    pub author_name: String,
    pub author_avatar: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<RecipeRow> for Recipe {
    fn from(r: RecipeRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            category: r.category,
            difficulty: r.difficulty,
            prep_time: r.prep_time,
            ingredients: r.ingredients.0,
            steps: r.steps,
            image: r.image,
            is_favorite: r.is_favorite,
            is_public: r.is_public,
            likes: r.likes,
            liked_by: r.liked_by,
            views: r.views,
            tags: r.tags,
            comments: r.comments.0,
            nutrition: NutritionTotals {
                total_calories: r.total_calories,
                total_protein: r.total_protein,
                total_fat: r.total_fat,
                total_carbs: r.total_carbs,
            },
            author_name: r.author_name,
            author_avatar: r.author_avatar,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub user_id: Uuid,
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub prep_time: i32,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<String>,
    pub image: Option<String>,
    pub is_favorite: bool,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub nutrition: NutritionTotals,
    pub author_name: String,
    pub author_avatar: Option<String>,
}

/// Field-wise update. Social fields (likes, comments, views) are not reachable from here.
#[derive(Debug, Clone, Default)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub prep_time: Option<i32>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub steps: Option<Vec<String>>,
    pub image: Option<Option<String>>,
    pub is_favorite: Option<bool>,
    pub is_public: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub nutrition: Option<NutritionTotals>,
}

/// Owner-scoped listing filter.
#[derive(Debug, Clone, Default)]
pub struct OwnerFilter {
    pub category: Option<String>,
    pub favorites_only: bool,
}
