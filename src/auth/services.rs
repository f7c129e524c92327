use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, GoogleAuthRequest, LoginRequest, RegisterRequest},
        jwt::JwtKeys,
    },
    error::{AppError, AppResult},
    state::AppState,
    users::{
        dto::{Profile, PublicUser},
        repo_types::{Provider, User},
        services::{CreateUser, UserService, MIN_NAME_LEN, MIN_PASSWORD_LEN},
    },
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }
    Ok(email)
}

/// Credential checks and token issuance on top of [`UserService`].
#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    keys: JwtKeys,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl AuthService {
    pub fn new(users: UserService, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    pub async fn register(&self, req: RegisterRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&req.email)?;
        let name = req.name.trim().to_string();
        if name.chars().count() < MIN_NAME_LEN {
            return Err(AppError::validation("Name must be at least 2 characters"));
        }
        if req.password.len() < MIN_PASSWORD_LEN {
            warn!("password too short");
            return Err(AppError::validation("Password must be at least 6 characters"));
        }

        let user = self
            .users
            .create(CreateUser {
                email,
                name,
                password: Some(req.password),
                provider: Some(Provider::Local),
                ..CreateUser::default()
            })
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => e,
                other => {
                    error!(error = %other, "create user failed");
                    AppError::bad_request("Failed to create account")
                }
            })?;

        info!(user_id = %user.id, email = %user.email, "user registered");
        self.respond(&user)
    }

    pub async fn login(&self, req: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&req.email)?;

        let Some(user) = self.users.find_by_email(&email).await? else {
            warn!(email = %email, "login unknown email");
            return Err(AppError::unauthorized("Invalid email or password"));
        };

        if user.password_hash.is_none() {
            warn!(user_id = %user.id, "password login on google-only account");
            return Err(AppError::unauthorized(
                "This account uses Google sign-in. Please log in with Google.",
            ));
        }

        if !self.users.verify_password(&user, &req.password)? {
            warn!(email = %email, user_id = %user.id, "login invalid password");
            return Err(AppError::unauthorized("Invalid email or password"));
        }

        info!(user_id = %user.id, email = %user.email, "user logged in");
        self.respond(&user)
    }

    pub async fn external_login(&self, req: GoogleAuthRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&req.email)?;
        let user = self
            .resolve_external_user(email, req)
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => e,
                other => {
                    error!(error = %other, "google auth failed");
                    AppError::bad_request("Google sign-in failed")
                }
            })?;

        info!(user_id = %user.id, email = %user.email, "user signed in with google");
        self.respond(&user)
    }

    async fn resolve_external_user(&self, email: String, req: GoogleAuthRequest) -> AppResult<User> {
        if let Some(user) = self.users.find_by_external_id(&req.external_id).await? {
            return match req.avatar {
                Some(avatar) if user.avatar.as_deref() != Some(avatar.as_str()) => {
                    self.users.set_avatar(user.id, avatar).await
                }
                _ => Ok(user),
            };
        }

        if let Some(existing) = self.users.find_by_email(&email).await? {
            info!(user_id = %existing.id, "linking google account to existing user");
            return self
                .users
                .link_external_account(existing.id, &req.external_id, req.avatar)
                .await;
        }

        info!(email = %email, "creating google user");
        self.users
            .create(CreateUser {
                email,
                name: req.name.trim().to_string(),
                external_id: Some(req.external_id),
                avatar: req.avatar,
                provider: Some(Provider::Google),
                ..CreateUser::default()
            })
            .await
    }

    pub fn issue_token(&self, user: &User) -> AppResult<String> {
        Ok(self.keys.sign(user)?)
    }

    /// Decodes the token and resolves the user it was issued to.
    pub async fn verify_token(&self, token: &str) -> AppResult<PublicUser> {
        let claims = self.keys.verify(token).map_err(|e| {
            warn!(error = %e, "token rejected");
            AppError::unauthorized("Invalid token")
        })?;
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;
        Ok(PublicUser::from(&user))
    }

    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<Profile> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;
        Ok(Profile::from(&user))
    }

    fn respond(&self, user: &User) -> AppResult<AuthResponse> {
        Ok(AuthResponse {
            access_token: self.issue_token(user)?,
            user: PublicUser::from(user),
        })
    }
}
