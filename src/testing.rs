//! In-memory stores and storage used by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    pantry::{
        repo::PantryStore,
        repo_types::{NewPantryItem, PantryItem, PantryPatch},
    },
    recipes::{
        feed::{FeedFilter, SortBy},
        repo::RecipeStore,
        repo_types::{Comment, NewRecipe, OwnerFilter, Recipe, RecipePatch},
    },
    storage::StorageClient,
    users::{
        repo::UserStore,
        repo_types::{NewUser, User, UserPatch},
    },
};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, new: NewUser) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let taken = users.iter().any(|u| {
            u.email == new.email
                || (new.external_id.is_some() && u.external_id == new.external_id)
        });
        if taken {
            return Ok(None);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            external_id: new.external_id,
            avatar: new.avatar,
            provider: new.provider,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(Some(user))
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(avatar) = patch.avatar {
            user.avatar = Some(avatar);
        }
        if let Some(hash) = patch.password_hash {
            user.password_hash = Some(hash);
        }
        if let Some(external_id) = patch.external_id {
            user.external_id = Some(external_id);
        }
        if let Some(provider) = patch.provider {
            user.provider = provider;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryRecipeStore {
    recipes: Mutex<Vec<Recipe>>,
}

impl MemoryRecipeStore {
    fn with_recipe<F>(&self, id: Uuid, f: F) -> Option<Recipe>
    where
        F: FnOnce(&mut Recipe) -> bool,
    {
        let mut recipes = self.recipes.lock().unwrap();
        let recipe = recipes.iter_mut().find(|r| r.id == id)?;
        f(recipe).then(|| recipe.clone())
    }
}

fn matches_feed(r: &Recipe, f: &FeedFilter) -> bool {
    if !r.is_public {
        return false;
    }
    if f.category.as_ref().is_some_and(|c| &r.category != c)
        || f.difficulty.as_ref().is_some_and(|d| &r.difficulty != d)
        || f.tag.as_ref().is_some_and(|t| !r.tags.contains(t))
    {
        return false;
    }
    match &f.search {
        None => true,
        Some(term) => {
            let term = term.to_lowercase();
            let hit = |s: &str| s.to_lowercase().contains(&term);
            hit(&r.title)
                || r.ingredients.iter().any(|i| hit(&i.name))
                || r.tags.iter().any(|t| hit(t))
        }
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn insert(&self, r: NewRecipe) -> anyhow::Result<Recipe> {
        let now = OffsetDateTime::now_utc();
        let recipe = Recipe {
            id: Uuid::new_v4(),
            user_id: r.user_id,
            title: r.title,
            category: r.category,
            difficulty: r.difficulty,
            prep_time: r.prep_time,
            ingredients: r.ingredients,
            steps: r.steps,
            image: r.image,
            is_favorite: r.is_favorite,
            is_public: r.is_public,
            likes: 0,
            liked_by: Vec::new(),
            views: 0,
            tags: r.tags,
            comments: Vec::new(),
            nutrition: r.nutrition,
            author_name: r.author_name,
            author_avatar: r.author_avatar,
            created_at: now,
            updated_at: now,
        };
        self.recipes.lock().unwrap().push(recipe.clone());
        Ok(recipe)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let recipes = self.recipes.lock().unwrap();
        Ok(recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn list_by_owner(&self, owner: Uuid, filter: &OwnerFilter) -> anyhow::Result<Vec<Recipe>> {
        let recipes = self.recipes.lock().unwrap();
        // reversed so equal timestamps still list the latest insert first
        let mut out: Vec<Recipe> = recipes
            .iter()
            .rev()
            .filter(|r| r.user_id == owner)
            .filter(|r| filter.category.as_ref().map_or(true, |c| &r.category == c))
            .filter(|r| !filter.favorites_only || r.is_favorite)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn update(&self, id: Uuid, p: RecipePatch) -> anyhow::Result<Option<Recipe>> {
        Ok(self.with_recipe(id, |r| {
            if let Some(v) = p.title {
                r.title = v;
            }
            if let Some(v) = p.category {
                r.category = v;
            }
            if let Some(v) = p.difficulty {
                r.difficulty = v;
            }
            if let Some(v) = p.prep_time {
                r.prep_time = v;
            }
            if let Some(v) = p.ingredients {
                r.ingredients = v;
            }
            if let Some(v) = p.steps {
                r.steps = v;
            }
            if let Some(v) = p.image {
                r.image = v;
            }
            if let Some(v) = p.is_favorite {
                r.is_favorite = v;
            }
            if let Some(v) = p.is_public {
                r.is_public = v;
            }
            if let Some(v) = p.tags {
                r.tags = v;
            }
            if let Some(v) = p.nutrition {
                r.nutrition = v;
            }
            r.updated_at = OffsetDateTime::now_utc();
            true
        }))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut recipes = self.recipes.lock().unwrap();
        let before = recipes.len();
        recipes.retain(|r| r.id != id);
        Ok(recipes.len() < before)
    }

    async fn fetch_public_and_count_view(&self, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        Ok(self.with_recipe(id, |r| {
            if r.is_public {
                r.views += 1;
            }
            r.is_public
        }))
    }

    async fn search_public(&self, filter: &FeedFilter) -> anyhow::Result<(Vec<Recipe>, i64)> {
        let recipes = self.recipes.lock().unwrap();
        let mut hits: Vec<Recipe> = recipes
            .iter()
            .rev()
            .filter(|r| matches_feed(r, filter))
            .cloned()
            .collect();
        match filter.sort_by {
            SortBy::Newest => hits.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortBy::Popular => {
                hits.sort_by(|a, b| b.likes.cmp(&a.likes).then(b.views.cmp(&a.views)))
            }
            SortBy::Trending => hits.sort_by(|a, b| {
                b.likes
                    .cmp(&a.likes)
                    .then(b.created_at.cmp(&a.created_at))
            }),
        }
        let total = hits.len() as i64;
        let page = hits
            .into_iter()
            .skip(usize::try_from(filter.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(filter.limit).unwrap_or(usize::MAX))
            .collect();
        Ok((page, total))
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Recipe>> {
        Ok(self.with_recipe(id, |r| {
            if r.liked_by.contains(&user_id) {
                r.liked_by.retain(|u| *u != user_id);
            } else {
                r.liked_by.push(user_id);
            }
            r.likes = r.liked_by.len() as i32;
            true
        }))
    }

    async fn push_comment(&self, id: Uuid, comment: Comment) -> anyhow::Result<Option<Recipe>> {
        Ok(self.with_recipe(id, |r| {
            if r.is_public {
                r.comments.push(comment);
            }
            r.is_public
        }))
    }

    async fn pull_comment(&self, id: Uuid, comment_id: Uuid) -> anyhow::Result<Option<Recipe>> {
        Ok(self.with_recipe(id, |r| {
            r.comments.retain(|c| c.id != comment_id);
            true
        }))
    }
}

#[derive(Default)]
pub struct MemoryPantryStore {
    items: Mutex<Vec<PantryItem>>,
}

impl MemoryPantryStore {
    fn materialize(new: NewPantryItem) -> PantryItem {
        PantryItem {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            name: new.name,
            quantity: new.quantity,
            unit: new.unit,
            category: new.category,
            expiry_date: new.expiry_date,
            image_url: new.image_url,
            added_at: OffsetDateTime::now_utc(),
            is_expired: false,
        }
    }
}

#[async_trait]
impl PantryStore for MemoryPantryStore {
    async fn insert(&self, new: NewPantryItem) -> anyhow::Result<PantryItem> {
        let item = Self::materialize(new);
        self.items.lock().unwrap().push(item.clone());
        Ok(item)
    }

    async fn insert_many(&self, items: Vec<NewPantryItem>) -> anyhow::Result<Vec<PantryItem>> {
        let created: Vec<PantryItem> = items.into_iter().map(Self::materialize).collect();
        self.items.lock().unwrap().extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<PantryItem>> {
        let items = self.items.lock().unwrap();
        let mut out: Vec<PantryItem> = items
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(out)
    }

    async fn mark_expired(&self, user_id: Uuid, ids: &[Uuid]) -> anyhow::Result<u64> {
        let mut items = self.items.lock().unwrap();
        let mut n = 0;
        for item in items
            .iter_mut()
            .filter(|i| i.user_id == user_id && ids.contains(&i.id))
        {
            item.is_expired = true;
            n += 1;
        }
        Ok(n)
    }

    async fn find(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<PantryItem>> {
        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .find(|i| i.id == id && i.user_id == user_id)
            .cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        p: PantryPatch,
    ) -> anyhow::Result<Option<PantryItem>> {
        let mut items = self.items.lock().unwrap();
        let Some(item) = items
            .iter_mut()
            .find(|i| i.id == id && i.user_id == user_id)
        else {
            return Ok(None);
        };
        if let Some(v) = p.name {
            item.name = v;
        }
        if let Some(v) = p.quantity {
            item.quantity = v;
        }
        if let Some(v) = p.unit {
            item.unit = v;
        }
        if let Some(v) = p.category {
            item.category = v;
        }
        if let Some(v) = p.expiry_date {
            item.expiry_date = v;
        }
        if let Some(v) = p.image_url {
            item.image_url = v;
        }
        if let Some(v) = p.is_expired {
            item.is_expired = v;
        }
        Ok(Some(item.clone()))
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|i| !(i.id == id && i.user_id == user_id));
        Ok(items.len() < before)
    }

    async fn delete_all(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|i| i.user_id != user_id);
        Ok((before - items.len()) as u64)
    }

    async fn list_expiring(
        &self,
        user_id: Uuid,
        from: OffsetDateTime,
        until: OffsetDateTime,
    ) -> anyhow::Result<Vec<PantryItem>> {
        let items = self.items.lock().unwrap();
        let mut out: Vec<PantryItem> = items
            .iter()
            .filter(|i| i.user_id == user_id && !i.is_expired)
            .filter(|i| matches!(i.expiry_date, Some(d) if d >= from && d <= until))
            .cloned()
            .collect();
        out.sort_by_key(|i| i.expiry_date);
        Ok(out)
    }
}

/// Records keys instead of talking to S3.
#[derive(Default)]
pub struct FakeStorage {
    keys: Mutex<Vec<String>>,
}

impl FakeStorage {
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, key: &str, _body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        self.keys.lock().unwrap().push(key.to_string());
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("https://fake.local/{}", key)
    }
}
