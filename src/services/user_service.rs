use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::{Admin, User};

/// Database access for user and admin accounts
#[derive(Debug, Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Insert a user. The password must already be hashed.
    ///
    /// Returns `None` when the email is taken.
    pub async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING user_id, name, email, password_hash, created_at, last_active
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await
        .context("Failed to create user")?;

        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, name, email, password_hash, created_at, last_active FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("Failed to fetch user by email")?;

        Ok(user)
    }

    pub async fn touch_last_active(&self, user_id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET last_active = NOW() WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("Failed to update last_active")?;

        Ok(())
    }

    /// Look an admin up by username first, then by email
    pub async fn find_admin(&self, username: Option<&str>, email: Option<&str>) -> Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            SELECT admin_id, username, email, password_hash, role, last_login
            FROM admin
            WHERE ($1::TEXT IS NOT NULL AND username = $1)
               OR ($1::TEXT IS NULL AND $2::TEXT IS NOT NULL AND email = $2)
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("Failed to fetch admin")?;

        Ok(admin)
    }

    pub async fn touch_last_login(&self, admin_id: i64) -> Result<()> {
        sqlx::query("UPDATE admin SET last_login = NOW() WHERE admin_id = $1")
            .bind(admin_id)
            .execute(&self.db)
            .await
            .context("Failed to update last_login")?;

        Ok(())
    }

    /// Create an admin or reset the email and password of an existing one
    pub async fn upsert_admin(&self, username: &str, email: &str, password_hash: &str) -> Result<Admin> {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admin (username, email, password_hash, role)
            VALUES ($1, $2, $3, 'admin')
            ON CONFLICT (username)
            DO UPDATE SET email = EXCLUDED.email, password_hash = EXCLUDED.password_hash
            RETURNING admin_id, username, email, password_hash, role, last_login
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .context("Failed to upsert admin")?;

        Ok(admin)
    }
}
