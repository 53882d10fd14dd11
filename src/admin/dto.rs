use serde::Serialize;
use time::OffsetDateTime;

use crate::auth::dto::Role;
use crate::posts::repo::PostWithAuthor;

#[derive(Debug, Serialize)]
pub struct UserListItem {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Feed row as the moderation dashboard sees it, activation flag included.
#[derive(Debug, Serialize)]
pub struct AdminPostItem {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub body: String,
    pub image_base64: Option<String>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<PostWithAuthor> for AdminPostItem {
    fn from(p: PostWithAuthor) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            username: p.username,
            body: p.body,
            image_base64: p.image_data,
            is_active: p.is_active,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub is_active: bool,
}
