use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    users::{
        dto::UpdateProfileRequest,
        password,
        repo::UserStore,
        repo_types::{NewUser, Provider, User, UserPatch},
    },
};

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Input for account creation; the password is plain text and hashed here.
#[derive(Debug, Clone, Default)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub password: Option<String>,
    pub external_id: Option<String>,
    pub avatar: Option<String>,
    pub provider: Option<Provider>,
}

/// Lookup and lifecycle of user accounts.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.store.find_by_email(email).await?)
    }

    pub async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<User>> {
        Ok(self.store.find_by_external_id(external_id).await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.store.find_by_id(id).await?)
    }

    pub async fn create(&self, input: CreateUser) -> AppResult<User> {
        if self.store.find_by_email(&input.email).await?.is_some() {
            warn!(email = %input.email, "email already registered");
            return Err(AppError::conflict("A user with this email already exists"));
        }

        let password_hash = match input.password.as_deref() {
            Some(plain) => Some(password::hash_password(plain)?),
            None => None,
        };
        let provider = input.provider.unwrap_or(if input.external_id.is_some() {
            Provider::Google
        } else {
            Provider::Local
        });

        let user = self
            .store
            .insert(NewUser {
                email: input.email,
                name: input.name,
                password_hash,
                external_id: input.external_id,
                avatar: input.avatar,
                provider,
            })
            .await?
            .ok_or_else(|| AppError::conflict("A user with this email already exists"))?;

        info!(user_id = %user.id, provider = ?user.provider, "user created");
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, req: UpdateProfileRequest) -> AppResult<User> {
        let name = req.name.map(|n| n.trim().to_string());
        if matches!(&name, Some(n) if n.chars().count() < MIN_NAME_LEN) {
            return Err(AppError::validation("Name must be at least 2 characters"));
        }
        let password_hash = match req.password.as_deref() {
            Some(p) if p.len() < MIN_PASSWORD_LEN => {
                return Err(AppError::validation("Password must be at least 6 characters"));
            }
            Some(p) => Some(password::hash_password(p)?),
            None => None,
        };

        let patch = UserPatch {
            name,
            avatar: req.avatar,
            password_hash,
            ..UserPatch::default()
        };
        self.store
            .update(id, patch)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Recipes and pantry items of the user are left in place.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.store.delete(id).await? {
            return Err(AppError::not_found("User not found"));
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    pub async fn set_avatar(&self, id: Uuid, avatar: String) -> AppResult<User> {
        let patch = UserPatch {
            avatar: Some(avatar),
            ..UserPatch::default()
        };
        self.store
            .update(id, patch)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    pub async fn link_external_account(
        &self,
        user_id: Uuid,
        external_id: &str,
        avatar: Option<String>,
    ) -> AppResult<User> {
        if self.store.find_by_id(user_id).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }

        if let Some(bound) = self.store.find_by_external_id(external_id).await? {
            if bound.id != user_id {
                warn!(user_id = %user_id, other = %bound.id, "external account already linked");
                return Err(AppError::conflict(
                    "This Google account is already linked to another user",
                ));
            }
        }

        let patch = UserPatch {
            external_id: Some(external_id.to_string()),
            provider: Some(Provider::Google),
            avatar,
            ..UserPatch::default()
        };
        let user = self
            .store
            .update(user_id, patch)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        info!(user_id = %user.id, "google account linked");
        Ok(user)
    }

    /// `false` for accounts without a local password.
    pub fn verify_password(&self, user: &User, plain: &str) -> AppResult<bool> {
        match user.password_hash.as_deref() {
            None => Ok(false),
            Some(hash) => Ok(password::verify_password(plain, hash)?),
        }
    }
}
