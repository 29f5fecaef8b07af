use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::UserGateway;
use crate::domain::{Role, User};

/// Row shape of the `users` table
#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

fn role_from_db(role: &str) -> Result<Role> {
    match role {
        "NORMAL" => Ok(Role::Normal),
        "ADMIN" => Ok(Role::Admin),
        other => bail!("unknown role {other}"),
    }
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = role_from_db(&row.role)
            .with_context(|| format!("bad role on user {}", row.id))?;
        Ok(User::restore(
            row.id,
            row.name,
            row.email,
            row.password_hash,
            role,
            row.created_at,
        ))
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";

/// PostgreSQL user store
#[derive(Clone)]
pub struct PgUserGateway {
    pool: PgPool,
}

impl PgUserGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserGateway for PgUserGateway {
    async fn find_users(&self, query: Option<&str>) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE $1::TEXT IS NULL OR name ILIKE '%' || $1 || '%'
            ORDER BY created_at ASC
            "#
        ))
        .bind(query)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users")?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load user")?;

        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load user by email")?;

        row.map(User::try_from).transpose()
    }

    async fn insert_user(&self, user: &User) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user.id())
        .bind(user.name())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.role().to_string())
        .bind(user.created_at())
        .execute(&self.pool)
        .await
        .context("Failed to insert user")?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_user(&self, user: &User) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = $4, role = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id())
        .bind(user.name())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.role().to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update user")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected() > 0)
    }
}
