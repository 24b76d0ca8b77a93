mod memory;

pub use memory::MemoryUserStore;

use crate::models::{NewUser, User, UserChanges};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

/// Persistence operations the seeder needs from a user store
#[async_trait]
pub trait UserStore: Send + Sync {
    /// First user with this email, if any.
    ///
    /// Email is not unique at the schema level; when duplicates exist the
    /// earliest created row wins.
    async fn find_first_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Insert a user; the store assigns id and timestamps
    async fn create(&self, user: NewUser) -> Result<User>;

    /// Overwrite name, password hash and status of an existing user
    async fn update(&self, id: &str, changes: UserChanges) -> Result<User>;

    /// Release the underlying connection(s)
    async fn close(&self);
}

const USER_COLUMNS: &str = "id, name, email, password, status, created_at, updated_at";

/// PostgreSQL-backed user store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Parse a `users` row
    fn user_from_row(row: &PgRow) -> Result<User> {
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_first_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!(
            "SELECT {} FROM users WHERE email = $1 ORDER BY created_at ASC, id ASC LIMIT 1",
            USER_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let query = format!(
            r#"
            INSERT INTO users (name, email, password, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.status)
            .fetch_one(&self.pool)
            .await?;

        Self::user_from_row(&row)
    }

    async fn update(&self, id: &str, changes: UserChanges) -> Result<User> {
        let query = format!(
            r#"
            UPDATE users
            SET name = $2, password = $3, status = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(&changes.name)
            .bind(&changes.password_hash)
            .bind(changes.status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| anyhow!("User {} not found", id))?;

        Self::user_from_row(&row)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
