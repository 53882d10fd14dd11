use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub body: String,
    pub image_data: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

/// Post row joined with its author's username for feed rendering.
#[derive(Debug, Clone, FromRow)]
pub struct PostWithAuthor {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub body: String,
    pub image_data: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

impl Post {
    pub async fn create(
        db: &PgPool,
        user_id: i64,
        body: &str,
        image_data: Option<&str>,
    ) -> anyhow::Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (user_id, body, image_data)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, body, image_data, is_active, created_at
            "#,
        )
        .bind(user_id)
        .bind(body)
        .bind(image_data)
        .fetch_one(db)
        .await?;
        Ok(post)
    }

    /// Public feed: active posts only, newest first.
    pub async fn list_active(
        db: &PgPool,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<PostWithAuthor>> {
        let rows = sqlx::query_as::<_, PostWithAuthor>(
            r#"
            SELECT p.id, p.user_id, u.username, p.body, p.image_data, p.is_active, p.created_at
            FROM posts p
            JOIN users u ON u.id = p.user_id
            WHERE p.is_active AND p.deleted_at IS NULL
            ORDER BY p.created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_by_user(
        db: &PgPool,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<PostWithAuthor>> {
        let rows = sqlx::query_as::<_, PostWithAuthor>(
            r#"
            SELECT p.id, p.user_id, u.username, p.body, p.image_data, p.is_active, p.created_at
            FROM posts p
            JOIN users u ON u.id = p.user_id
            WHERE p.user_id = $1 AND p.deleted_at IS NULL
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
