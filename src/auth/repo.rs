use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::auth::repo_types::{NewUser, ProfileUpdate, UserProfileRow, UserRecord};

/// Credential store behind the orchestrator. Every lookup excludes
/// soft-deleted users; activation state is left to the caller to interpret.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn username_exists(&self, username: &str) -> anyhow::Result<bool>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<UserRecord>>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<UserRecord>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>>;
    async fn find_by_reset_token(&self, token: &str) -> anyhow::Result<Option<UserRecord>>;
    /// Insert the user and its profile in one transaction.
    async fn create(&self, new_user: NewUser<'_>) -> anyhow::Result<UserRecord>;
    /// Shift the current hash into previous, store the new hash, and clear
    /// any pending reset token, all in one statement.
    async fn rotate_password(&self, id: i64, new_hash: &str) -> anyhow::Result<()>;
    /// Token and expiry are written together; they are never set one at a time.
    async fn set_reset_token(
        &self,
        id: i64,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()>;
    async fn clear_reset_token(&self, id: i64) -> anyhow::Result<()>;
    async fn update_profile(&self, id: i64, update: ProfileUpdate<'_>) -> anyhow::Result<()>;
}

const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.password_hash, u.previous_password_hash,
           u.reset_token, u.reset_token_expires_at, u.is_active,
           u.created_at, u.updated_at,
           p.first_name, p.last_name, p.email, p.phone, p.role
    FROM users u
    JOIN profiles p ON p.user_id = u.id
"#;

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        condition: &str,
        bind: &str,
    ) -> anyhow::Result<Option<UserRecord>> {
        let sql = format!("{USER_SELECT} WHERE u.deleted_at IS NULL AND {condition}");
        let row = sqlx::query_as::<_, UserProfileRow>(&sql)
            .bind(bind)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(UserRecord::from))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn username_exists(&self, username: &str) -> anyhow::Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users WHERE username = $1 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<UserRecord>> {
        self.fetch_one_where("u.username = $1", username).await
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<UserRecord>> {
        let sql = format!("{USER_SELECT} WHERE u.deleted_at IS NULL AND u.id = $1");
        let row = sqlx::query_as::<_, UserProfileRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(UserRecord::from))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        self.fetch_one_where("p.email = $1", email).await
    }

    async fn find_by_reset_token(&self, token: &str) -> anyhow::Result<Option<UserRecord>> {
        self.fetch_one_where("u.reset_token = $1", token).await
    }

    async fn create(&self, new_user: NewUser<'_>) -> anyhow::Result<UserRecord> {
        let mut tx = self.pool.begin().await?;

        let (id, created_at): (i64, OffsetDateTime) = sqlx::query_as(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, created_at
            "#,
        )
        .bind(new_user.username)
        .bind(new_user.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, first_name, last_name, email, phone, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.email)
        .bind(new_user.phone)
        .bind(new_user.role.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(UserRecord {
            id,
            username: new_user.username.to_string(),
            password_hash: new_user.password_hash.to_string(),
            previous_password_hash: None,
            reset_token: None,
            reset_token_expires_at: None,
            is_active: true,
            created_at,
            updated_at: None,
            profile: crate::auth::repo_types::ProfileRecord {
                first_name: new_user.first_name.to_string(),
                last_name: new_user.last_name.to_string(),
                email: new_user.email.to_string(),
                phone: new_user.phone.to_string(),
                role: new_user.role,
            },
        })
    }

    async fn rotate_password(&self, id: i64, new_hash: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET previous_password_hash = password_hash,
                password_hash = $2,
                reset_token = NULL,
                reset_token_expires_at = NULL,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(new_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: i64,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token = $2, reset_token_expires_at = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_reset_token(&self, id: i64) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token = NULL, reset_token_expires_at = NULL, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate<'_>) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE users SET username = $2, updated_at = now() WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.username)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE profiles
            SET first_name = $2, last_name = $3, email = $4, phone = $5, updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.email)
        .bind(update.phone)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
