use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::jwt::AuthUser,
    error::AppError,
    posts::{
        dto::{CreatePostRequest, Pagination, PostResponse},
        repo::Post,
        services,
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/mine", get(my_posts))
}

#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, HeaderMap, Json<PostResponse>), AppError> {
    let post = services::create_post(&state, auth.user_id, payload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/posts/{}", post.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }

    Ok((StatusCode::CREATED, headers, Json(post)))
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let posts = Post::list_active(&state.db, p.limit, p.offset).await?;
    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn my_posts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let posts = Post::list_by_user(&state.db, auth.user_id, p.limit, p.offset).await?;
    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}
