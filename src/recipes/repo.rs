use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::recipes::{
    feed::FeedFilter,
    repo_types::{Comment, NewRecipe, OwnerFilter, Recipe, RecipePatch, RecipeRow},
};

pub const RECIPE_COLUMNS: &str = "id, user_id, title, category, difficulty, prep_time, \
    ingredients, steps, image, is_favorite, is_public, likes, liked_by, views, tags, comments, \
    total_calories, total_protein, total_fat, total_carbs, author_name, author_avatar, \
    created_at, updated_at";

/// Recipe persistence. Social mutations are single atomic statements so
/// concurrent likes or comments on one recipe never overwrite each other.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn insert(&self, recipe: NewRecipe) -> anyhow::Result<Recipe>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Recipe>>;
    /// Owner's recipes, newest first.
    async fn list_by_owner(&self, owner: Uuid, filter: &OwnerFilter) -> anyhow::Result<Vec<Recipe>>;
    async fn update(&self, id: Uuid, patch: RecipePatch) -> anyhow::Result<Option<Recipe>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Returns the recipe only if public, bumping its view counter.
    async fn fetch_public_and_count_view(&self, id: Uuid) -> anyhow::Result<Option<Recipe>>;
    /// One page of matches plus the total match count.
    async fn search_public(&self, filter: &FeedFilter) -> anyhow::Result<(Vec<Recipe>, i64)>;
    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Recipe>>;
    /// Appends to a public recipe; `None` if absent or private.
    async fn push_comment(&self, id: Uuid, comment: Comment) -> anyhow::Result<Option<Recipe>>;
    async fn pull_comment(&self, id: Uuid, comment_id: Uuid) -> anyhow::Result<Option<Recipe>>;
}

#[derive(Clone)]
pub struct PgRecipeStore {
    db: PgPool,
}

impl PgRecipeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn insert(&self, r: NewRecipe) -> anyhow::Result<Recipe> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            INSERT INTO recipes (user_id, title, category, difficulty, prep_time, ingredients,
                                 steps, image, is_favorite, is_public, tags,
                                 total_calories, total_protein, total_fat, total_carbs,
                                 author_name, author_avatar)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(r.user_id)
        .bind(&r.title)
        .bind(&r.category)
        .bind(&r.difficulty)
        .bind(r.prep_time)
        .bind(Json(&r.ingredients))
        .bind(&r.steps)
        .bind(&r.image)
        .bind(r.is_favorite)
        .bind(r.is_public)
        .bind(&r.tags)
        .bind(r.nutrition.total_calories)
        .bind(r.nutrition.total_protein)
        .bind(r.nutrition.total_fat)
        .bind(r.nutrition.total_carbs)
        .bind(&r.author_name)
        .bind(&r.author_avatar)
        .fetch_one(&self.db)
        .await
        .context("insert recipe")?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find recipe")?;
        Ok(row.map(Into::into))
    }

    async fn list_by_owner(&self, owner: Uuid, filter: &OwnerFilter) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            SELECT {RECIPE_COLUMNS}
              FROM recipes
             WHERE user_id = $1
               AND ($2::text IS NULL OR category = $2)
               AND (NOT $3 OR is_favorite)
             ORDER BY created_at DESC
            "#
        ))
        .bind(owner)
        .bind(&filter.category)
        .bind(filter.favorites_only)
        .fetch_all(&self.db)
        .await
        .context("list recipes by owner")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, id: Uuid, p: RecipePatch) -> anyhow::Result<Option<Recipe>> {
        let nutrition = p.nutrition;
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            UPDATE recipes
               SET title          = COALESCE($2, title),
                   category       = COALESCE($3, category),
                   difficulty     = COALESCE($4, difficulty),
                   prep_time      = COALESCE($5, prep_time),
                   ingredients    = COALESCE($6, ingredients),
                   steps          = COALESCE($7, steps),
                   image          = CASE WHEN $8 THEN $16 ELSE image END,
                   is_favorite    = COALESCE($9, is_favorite),
                   is_public      = COALESCE($10, is_public),
                   tags           = COALESCE($11, tags),
                   total_calories = COALESCE($12, total_calories),
                   total_protein  = COALESCE($13, total_protein),
                   total_fat      = COALESCE($14, total_fat),
                   total_carbs    = COALESCE($15, total_carbs),
                   updated_at     = now()
             WHERE id = $1
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(p.title)
        .bind(p.category)
        .bind(p.difficulty)
        .bind(p.prep_time)
        .bind(p.ingredients.map(Json))
        .bind(p.steps)
        .bind(p.image.is_some())
        .bind(p.is_favorite)
        .bind(p.is_public)
        .bind(p.tags)
        .bind(nutrition.map(|n| n.total_calories))
        .bind(nutrition.map(|n| n.total_protein))
        .bind(nutrition.map(|n| n.total_fat))
        .bind(nutrition.map(|n| n.total_carbs))
        .bind(p.image.flatten())
        .fetch_optional(&self.db)
        .await
        .context("update recipe")?;
        Ok(row.map(Into::into))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete recipe")?;
        Ok(res.rows_affected() > 0)
    }

    async fn fetch_public_and_count_view(&self, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            UPDATE recipes
               SET views = views + 1
             WHERE id = $1 AND is_public = TRUE
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("fetch public recipe")?;
        Ok(row.map(Into::into))
    }

    async fn search_public(&self, filter: &FeedFilter) -> anyhow::Result<(Vec<Recipe>, i64)> {
        let (total,) = filter
            .count_query()
            .build_query_as::<(i64,)>()
            .fetch_one(&self.db)
            .await
            .context("count public feed")?;

        let rows = filter
            .page_query()
            .build_query_as::<RecipeRow>()
            .fetch_all(&self.db)
            .await
            .context("page public feed")?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Recipe>> {
        // both CASE arms read the pre-update row, so add/remove and the counter agree
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            UPDATE recipes
               SET liked_by = CASE WHEN $2 = ANY(liked_by)
                                   THEN array_remove(liked_by, $2)
                                   ELSE array_append(liked_by, $2) END,
                   likes    = CASE WHEN $2 = ANY(liked_by)
                                   THEN GREATEST(likes - 1, 0)
                                   ELSE likes + 1 END,
                   updated_at = now()
             WHERE id = $1
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("toggle recipe like")?;
        Ok(row.map(Into::into))
    }

    async fn push_comment(&self, id: Uuid, comment: Comment) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            UPDATE recipes
               SET comments = comments || jsonb_build_array($2::jsonb),
                   updated_at = now()
             WHERE id = $1 AND is_public = TRUE
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(Json(comment))
        .fetch_optional(&self.db)
        .await
        .context("push recipe comment")?;
        Ok(row.map(Into::into))
    }

    async fn pull_comment(&self, id: Uuid, comment_id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            UPDATE recipes
               SET comments = COALESCE(
                       (SELECT jsonb_agg(e.c ORDER BY e.ord)
                          FROM jsonb_array_elements(comments) WITH ORDINALITY AS e(c, ord)
                         WHERE e.c->>'id' <> $2),
                       '[]'::jsonb),
                   updated_at = now()
             WHERE id = $1
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(comment_id.to_string())
        .fetch_optional(&self.db)
        .await
        .context("pull recipe comment")?;
        Ok(row.map(Into::into))
    }
}
