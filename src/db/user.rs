use super::{DBClient, DbResult};
use crate::models::{User, UserRole};
use async_trait::async_trait;
use uuid::Uuid;

/// User database operations trait
#[async_trait]
pub trait UserExt {
    /// Get a user by id; `None` when the row is gone
    async fn get_user(&self, user_id: Uuid) -> DbResult<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> DbResult<Option<User>>;

    /// Paginated list, newest accounts first
    async fn get_users(&self, page: u32, limit: usize) -> DbResult<Vec<User>>;

    /// Create a user; a taken email surfaces as `UniqueViolation`
    async fn save_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> DbResult<User>;

    async fn update_user_name(&self, user_id: Uuid, name: &str) -> DbResult<User>;

    async fn update_user_role(&self, user_id: Uuid, role: UserRole) -> DbResult<User>;
}

const USER_COLUMNS: &str = "id, name, email, password, role, created_at, updated_at";

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(&self, user_id: Uuid) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_users(&self, page: u32, limit: usize) -> DbResult<Vec<User>> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn save_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> DbResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password, role) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user_name(&self, user_id: Uuid, name: &str) -> DbResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = $1, updated_at = NOW() WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user_role(&self, user_id: Uuid, role: UserRole) -> DbResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(role)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}
