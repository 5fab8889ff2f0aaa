use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, like_pattern, push_page},
    app_error::{AppError, AppResult},
    domain::entities::user::{Role, User, UserStatus},
    use_cases::{
        Page, PageRequest,
        user::{NewUser, UserFilter, UserRepo},
    },
};

const SELECT_COLS: &str = "id, name, email, password_hash, role, status, created_at, updated_at";

fn push_user_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    if let Some(role) = filter.role {
        builder.push(" AND role = ").push_bind(role);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn create(&self, user: &NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {SELECT_COLS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(AppError::from)
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {SELECT_COLS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn list(&self, filter: &UserFilter, page: PageRequest) -> AppResult<Page<User>> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM users WHERE TRUE");
        push_user_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(AppError::from)?;

        let mut data_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {SELECT_COLS} FROM users WHERE TRUE"));
        push_user_filters(&mut data_builder, filter);
        data_builder.push(" ORDER BY created_at DESC");
        push_page(&mut data_builder, page);

        let items = data_builder
            .build_query_as::<User>()
            .fetch_all(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(Page { items, total })
    }

    async fn set_role(&self, id: Uuid, role: Role) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {SELECT_COLS}"
        ))
        .bind(id)
        .bind(role)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn set_status(&self, id: Uuid, status: UserStatus) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {SELECT_COLS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }
}
