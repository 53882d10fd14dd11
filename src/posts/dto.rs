use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::posts::repo::PostWithAuthor;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub body: String,
    pub image_base64: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub body: String,
    pub image_base64: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<PostWithAuthor> for PostResponse {
    fn from(p: PostWithAuthor) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            username: p.username,
            body: p.body,
            image_base64: p.image_data,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.limit, 20);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn post_response_serialization() {
        let response = PostResponse {
            id: 7,
            user_id: 1,
            username: "ada".into(),
            body: "hello world".into(),
            image_base64: None,
            created_at: time::macros::datetime!(2025-06-01 12:00:00 UTC),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("hello world"));
        assert!(json.contains("\"username\":\"ada\""));
        assert!(json.contains("2025-06-01T12:00:00Z"));
    }
}
