use axum::{
    extract::{FromRef, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    admin::{
        dto::{AdminPostItem, ToggleResponse, UserListItem},
        repo, services::AdminService,
    },
    auth::dto::{LoginRequest, LoginResponse, MessageResponse, Role},
    auth::jwt::AdminUser,
    error::AppError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(admin_login))
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", delete(delete_user))
        .route("/admin/users/:id/toggle", post(toggle_user))
        .route("/admin/posts", get(list_posts))
        .route("/admin/posts/:id", delete(delete_post))
}

#[instrument(skip(state, payload))]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AdminService::from_ref(&state).login(payload).await?;
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserListItem>>, AppError> {
    let users = repo::list_users(&state.db).await?;
    let items = users
        .into_iter()
        .map(|u| UserListItem {
            id: u.id,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            phone: u.phone,
            role: Role::from(u.role.as_str()),
            is_active: u.is_active,
            created_at: u.created_at,
        })
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    if !repo::soft_delete_user(&state.db, id).await? {
        return Err(AppError::NotFound("user not found".to_string()));
    }
    info!(admin_id = admin.user_id, user_id = id, "user soft-deleted");
    Ok(Json(MessageResponse {
        message: "user deleted".into(),
    }))
}

#[instrument(skip(state))]
pub async fn toggle_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ToggleResponse>, AppError> {
    let is_active = repo::toggle_user_status(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
    info!(admin_id = admin.user_id, user_id = id, is_active, "user status toggled");
    Ok(Json(ToggleResponse { is_active }))
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<AdminPostItem>>, AppError> {
    let posts = repo::list_posts(&state.db).await?;
    Ok(Json(posts.into_iter().map(AdminPostItem::from).collect()))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    if !repo::soft_delete_post(&state.db, id).await? {
        return Err(AppError::NotFound("post not found".to_string()));
    }
    info!(admin_id = admin.user_id, post_id = id, "post soft-deleted");
    Ok(Json(MessageResponse {
        message: "post deleted".into(),
    }))
}
