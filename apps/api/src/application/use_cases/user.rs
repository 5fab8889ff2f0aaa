use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use secrecy::SecretString;
use serde::Deserialize;
use time::Duration;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::user::{Role, User, UserStatus},
    jwt,
    policy::{self, Capability},
    use_cases::{Page, PageRequest},
    validators::normalize_email,
};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub search: Option<String>,
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create(&self, user: &NewUser) -> AppResult<User>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn list(&self, filter: &UserFilter, page: PageRequest) -> AppResult<Page<User>>;
    async fn set_role(&self, id: Uuid, role: Role) -> AppResult<User>;
    async fn set_status(&self, id: Uuid, status: UserStatus) -> AppResult<User>;
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "The password must be at least 8 characters."))]
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "The password field is required."))]
    pub password: String,
}

/// Issued on successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub access_token: String,
}

#[derive(Clone)]
pub struct UserUseCases {
    repo: Arc<dyn UserRepo>,
    jwt_secret: SecretString,
    access_token_ttl: Duration,
}

impl UserUseCases {
    pub fn new(repo: Arc<dyn UserRepo>, jwt_secret: SecretString, access_token_ttl: Duration) -> Self {
        Self {
            repo,
            jwt_secret,
            access_token_ttl,
        }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> AppResult<User> {
        input.validate()?;

        let role = match input.role.as_deref() {
            None => Role::Buyer,
            Some(raw) => raw
                .parse::<Role>()
                .ok()
                .filter(Role::is_self_assignable)
                .ok_or_else(|| AppError::field("role", "The selected role is invalid."))?,
        };

        let email = normalize_email(&input.email);
        if self.repo.get_by_email(&email).await?.is_some() {
            return Err(AppError::field("email", "The email has already been taken."));
        }

        let user = self
            .repo
            .create(&NewUser {
                name: input.name.trim().to_string(),
                email,
                password_hash: hash_password(&input.password)?,
                role,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> AppResult<Session> {
        input.validate()?;

        let email = normalize_email(&input.email);
        let user = self
            .repo
            .get_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(&input.password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "Login failed: invalid password");
            return Err(AppError::InvalidCredentials);
        }
        if user.is_banned() {
            tracing::warn!(user_id = %user.id, "Login refused: account banned");
            return Err(AppError::Forbidden);
        }

        let access_token = jwt::issue(user.id, user.role, &self.jwt_secret, self.access_token_ttl)?;
        Ok(Session { user, access_token })
    }

    /// Resolves a bearer token to a live, non-banned user.
    pub async fn authenticate(&self, token: &str) -> AppResult<User> {
        let claims = jwt::verify(token, &self.jwt_secret)?;
        let user = self
            .repo
            .get_by_id(claims.user_id()?)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        if user.is_banned() {
            return Err(AppError::Forbidden);
        }
        Ok(user)
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    #[instrument(skip(self, admin))]
    pub async fn list_users(
        &self,
        admin: &User,
        filter: UserFilter,
        page: PageRequest,
    ) -> AppResult<Page<User>> {
        policy::require(admin, Capability::ManageUsers)?;
        self.repo.list(&filter, page).await
    }

    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn change_role(&self, admin: &User, user_id: Uuid, role: Role) -> AppResult<User> {
        policy::require(admin, Capability::ManageUsers)?;
        if admin.id == user_id {
            return Err(AppError::BusinessRule("You cannot change your own role".into()));
        }
        self.repo
            .get_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let user = self.repo.set_role(user_id, role).await?;
        tracing::info!(user_id = %user.id, role = %role, "User role changed");
        Ok(user)
    }

    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn set_status(
        &self,
        admin: &User,
        user_id: Uuid,
        status: UserStatus,
    ) -> AppResult<User> {
        policy::require(admin, Capability::ManageUsers)?;
        if admin.id == user_id && status == UserStatus::Banned {
            return Err(AppError::BusinessRule("You cannot ban yourself".into()));
        }
        self.repo
            .get_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let user = self.repo.set_status(user_id, status).await?;
        tracing::info!(user_id = %user.id, status = ?status, "User status changed");
        Ok(user)
    }
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("stored password hash is malformed: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
