use crate::auth::repo::UserRepository;
use crate::error::AppError;
use crate::posts::dto::{CreatePostRequest, PostResponse};
use crate::posts::repo::Post;
use crate::state::AppState;
use tracing::info;

pub async fn create_post(
    state: &AppState,
    user_id: i64,
    req: CreatePostRequest,
) -> Result<PostResponse, AppError> {
    if req.body.trim().is_empty() {
        return Err(AppError::Validation(vec!["post body is required".into()]));
    }

    let author = state
        .users
        .find_by_id(user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    let post = Post::create(&state.db, user_id, &req.body, req.image_base64.as_deref()).await?;
    info!(post_id = post.id, user_id, "post created");

    Ok(PostResponse {
        id: post.id,
        user_id: post.user_id,
        username: author.username,
        body: post.body,
        image_base64: post.image_data,
        created_at: post.created_at,
    })
}
