use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse,
            MessageResponse, ProfileResponse, RegisterRequest, ResetPasswordRequest,
            UpdateProfileRequest, ValidateResetTokenQuery, ValidateResetTokenResponse,
        },
        jwt::AuthUser,
        services::AuthService,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/change-password", put(change_password))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/validate-reset-token", get(validate_reset_token))
        .route("/auth/reset-password", post(reset_password))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users/me/profile", put(update_profile))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    AuthService::from_ref(&state).register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "registration successful".into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthService::from_ref(&state).login(payload).await?;
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::from_ref(&state)
        .change_password(auth.user_id, payload)
        .await?;
    Ok(Json(MessageResponse {
        message: "password changed".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::from_ref(&state)
        .forgot_password(&payload.email)
        .await?;
    Ok(Json(MessageResponse {
        message: "if the address is registered, a reset link has been sent".into(),
    }))
}

#[instrument(skip(state, query))]
pub async fn validate_reset_token(
    State(state): State<AppState>,
    Query(query): Query<ValidateResetTokenQuery>,
) -> Result<Json<ValidateResetTokenResponse>, AppError> {
    let valid = AuthService::from_ref(&state)
        .validate_reset_token(&query.token)
        .await?;
    Ok(Json(ValidateResetTokenResponse { valid }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::from_ref(&state).reset_password(payload).await?;
    Ok(Json(MessageResponse {
        message: "password reset".into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = AuthService::from_ref(&state).profile(auth.user_id).await?;
    Ok(Json(profile))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::from_ref(&state)
        .update_profile(auth.user_id, payload)
        .await?;
    Ok(Json(MessageResponse {
        message: "profile updated".into(),
    }))
}
