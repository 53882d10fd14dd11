use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::posts::repo::PostWithAuthor;

#[derive(Debug, FromRow)]
pub struct UserListRow {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

/// Every user, soft-deleted ones included, for the moderation dashboard.
pub async fn list_users(db: &PgPool) -> anyhow::Result<Vec<UserListRow>> {
    let rows = sqlx::query_as::<_, UserListRow>(
        r#"
        SELECT u.id, u.username, u.is_active, u.created_at,
               p.first_name, p.last_name, p.email, p.phone, p.role
        FROM users u
        JOIN profiles p ON p.user_id = u.id
        ORDER BY u.created_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Soft-delete a user. The profile and every post of the user are deactivated
/// in the same transaction so the write is a single auditable cascade.
pub async fn soft_delete_user(db: &PgPool, id: i64) -> anyhow::Result<bool> {
    let mut tx = db.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE users
        SET is_active = FALSE, deleted_at = now(), updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query(
        r#"
        UPDATE profiles SET is_active = FALSE, updated_at = now() WHERE user_id = $1
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE posts SET is_active = FALSE, updated_at = now() WHERE user_id = $1
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}

/// Flip a user's activation state, cascading to the profile and posts.
/// Re-activation clears the deletion timestamp. Returns the new state.
pub async fn toggle_user_status(db: &PgPool, id: i64) -> anyhow::Result<Option<bool>> {
    let mut tx = db.begin().await?;

    let row: Option<(bool,)> =
        sqlx::query_as("SELECT is_active FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some((was_active,)) = row else {
        return Ok(None);
    };
    let now_active = !was_active;

    sqlx::query(
        r#"
        UPDATE users
        SET is_active = $2,
            updated_at = now(),
            deleted_at = CASE WHEN $2 THEN NULL ELSE now() END
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(now_active)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE profiles SET is_active = $2, updated_at = now() WHERE user_id = $1
        "#,
    )
    .bind(id)
    .bind(now_active)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE posts SET is_active = $2, updated_at = now() WHERE user_id = $1
        "#,
    )
    .bind(id)
    .bind(now_active)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(now_active))
}

pub async fn list_posts(db: &PgPool) -> anyhow::Result<Vec<PostWithAuthor>> {
    let rows = sqlx::query_as::<_, PostWithAuthor>(
        r#"
        SELECT p.id, p.user_id, u.username, p.body, p.image_data, p.is_active, p.created_at
        FROM posts p
        JOIN users u ON u.id = p.user_id
        WHERE p.is_active
        ORDER BY p.created_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn soft_delete_post(db: &PgPool, id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE posts
        SET is_active = FALSE, deleted_at = now(), updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
