use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    recipes::{
        dto::{CreateRecipeRequest, FeedPage, UpdateRecipeRequest},
        feed::{total_pages, FeedFilter, FeedQuery},
        nutrition::compute_totals,
        repo::RecipeStore,
        repo_types::{Comment, NewRecipe, OwnerFilter, Recipe, RecipePatch},
    },
    users::services::UserService,
};

pub const MAX_COMMENT_LEN: usize = 500;

#[derive(Clone)]
pub struct RecipeService {
    store: Arc<dyn RecipeStore>,
    users: UserService,
}

impl RecipeService {
    pub fn new(store: Arc<dyn RecipeStore>, users: UserService) -> Self {
        Self { store, users }
    }

    pub async fn create(&self, user_id: Uuid, req: CreateRecipeRequest) -> AppResult<Recipe> {
        let title = required("title", &req.title)?;
        let category = required("category", &req.category)?;
        let difficulty = required("difficulty", &req.difficulty)?;
        if req.prep_time < 0 {
            return Err(AppError::validation("prepTime must not be negative"));
        }

        let author = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;

        let recipe = self
            .store
            .insert(NewRecipe {
                user_id,
                title,
                category,
                difficulty,
                prep_time: req.prep_time,
                nutrition: compute_totals(&req.ingredients),
                ingredients: req.ingredients,
                steps: req.steps,
                image: req.image,
                is_favorite: req.is_favorite,
                is_public: req.is_public,
                tags: clean_tags(req.tags),
                author_name: author.name,
                author_avatar: author.avatar,
            })
            .await?;

        info!(recipe_id = %recipe.id, user_id = %user_id, "recipe created");
        Ok(recipe)
    }

    pub async fn list_own(&self, user_id: Uuid) -> AppResult<Vec<Recipe>> {
        Ok(self
            .store
            .list_by_owner(user_id, &OwnerFilter::default())
            .await?)
    }

    pub async fn list_by_category(&self, user_id: Uuid, category: &str) -> AppResult<Vec<Recipe>> {
        let filter = OwnerFilter {
            category: Some(category.to_string()),
            ..OwnerFilter::default()
        };
        Ok(self.store.list_by_owner(user_id, &filter).await?)
    }

    pub async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<Recipe>> {
        let filter = OwnerFilter {
            favorites_only: true,
            ..OwnerFilter::default()
        };
        Ok(self.store.list_by_owner(user_id, &filter).await?)
    }

    pub async fn get_own(&self, id: Uuid, user_id: Uuid) -> AppResult<Recipe> {
        self.owned(id, user_id).await
    }

    /// Every call counts as a view.
    pub async fn get_public(&self, id: Uuid) -> AppResult<Recipe> {
        self.store
            .fetch_public_and_count_view(id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe not found"))
    }

    pub async fn list_public_feed(&self, query: FeedQuery) -> AppResult<FeedPage> {
        let filter = FeedFilter::from(query);
        let (recipes, total) = self.store.search_public(&filter).await?;
        Ok(FeedPage {
            recipes,
            total,
            page: filter.page,
            total_pages: total_pages(total, filter.limit),
        })
    }

    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        req: UpdateRecipeRequest,
    ) -> AppResult<Recipe> {
        self.owned(id, user_id).await?;

        let patch = RecipePatch {
            title: optional_required("title", req.title)?,
            category: optional_required("category", req.category)?,
            difficulty: optional_required("difficulty", req.difficulty)?,
            prep_time: match req.prep_time {
                Some(t) if t < 0 => {
                    return Err(AppError::validation("prepTime must not be negative"));
                }
                other => other,
            },
            nutrition: req.ingredients.as_deref().map(compute_totals),
            ingredients: req.ingredients,
            steps: req.steps,
            image: req.image,
            is_favorite: req.is_favorite,
            is_public: req.is_public,
            tags: req.tags.map(clean_tags),
        };

        let recipe = self
            .store
            .update(id, patch)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe not found"))?;
        info!(recipe_id = %id, "recipe updated");
        Ok(recipe)
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.owned(id, user_id).await?;
        if !self.store.delete(id).await? {
            return Err(AppError::not_found("Recipe not found"));
        }
        info!(recipe_id = %id, "recipe deleted");
        Ok(())
    }

    /// Adds or removes the caller's like. Private recipes only accept their owner's like.
    pub async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> AppResult<Recipe> {
        let recipe = self.find(id).await?;
        if !recipe.is_public && recipe.user_id != user_id {
            return Err(AppError::forbidden("This recipe is not public"));
        }

        let recipe = self
            .store
            .toggle_like(id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe not found"))?;
        info!(
            recipe_id = %id,
            user_id = %user_id,
            liked = recipe.liked_by.contains(&user_id),
            likes = recipe.likes,
            "recipe like toggled"
        );
        Ok(recipe)
    }

    pub async fn add_comment(&self, id: Uuid, user_id: Uuid, text: &str) -> AppResult<Recipe> {
        let text = text.trim();
        if text.is_empty() || text.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::validation(
                "Comment must be between 1 and 500 characters",
            ));
        }

        let recipe = self.find(id).await?;
        if !recipe.is_public {
            warn!(recipe_id = %id, user_id = %user_id, "comment on private recipe");
            return Err(AppError::forbidden("Comments are only allowed on public recipes"));
        }

        let author = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;

        let comment = Comment {
            id: Uuid::new_v4(),
            user_id,
            user_name: author.name,
            user_avatar: author.avatar,
            text: text.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        let comment_id = comment.id;

        let recipe = self
            .store
            .push_comment(id, comment)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe not found"))?;
        info!(recipe_id = %id, comment_id = %comment_id, "comment added");
        Ok(recipe)
    }

    /// Allowed for the comment's author and for the recipe's owner.
    pub async fn delete_comment(
        &self,
        id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Recipe> {
        let recipe = self.find(id).await?;
        let comment = recipe
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| AppError::not_found("Comment not found"))?;

        if comment.user_id != user_id && recipe.user_id != user_id {
            warn!(recipe_id = %id, comment_id = %comment_id, user_id = %user_id, "foreign comment delete");
            return Err(AppError::forbidden("You cannot delete this comment"));
        }

        let recipe = self
            .store
            .pull_comment(id, comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe not found"))?;
        info!(recipe_id = %id, comment_id = %comment_id, "comment deleted");
        Ok(recipe)
    }

    pub async fn list_comments(&self, id: Uuid) -> AppResult<Vec<Comment>> {
        let recipe = self.find(id).await?;
        if !recipe.is_public {
            return Err(AppError::not_found("Recipe not found"));
        }
        Ok(recipe.comments)
    }

    async fn find(&self, id: Uuid) -> AppResult<Recipe> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe not found"))
    }

    /// Existence first, then ownership: 404 before 403.
    async fn owned(&self, id: Uuid, user_id: Uuid) -> AppResult<Recipe> {
        let recipe = self.find(id).await?;
        if recipe.user_id != user_id {
            warn!(recipe_id = %id, user_id = %user_id, "recipe owned by someone else");
            return Err(AppError::forbidden("You do not have access to this recipe"));
        }
        Ok(recipe)
    }
}

fn required(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

fn optional_required(field: &str, value: Option<String>) -> AppResult<Option<String>> {
    value.map(|v| required(field, &v)).transpose()
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
