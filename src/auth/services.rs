use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::auth::dto::{
    ChangePasswordRequest, LoginRequest, LoginResponse, ProfileResponse, RegisterRequest,
    ResetPasswordRequest, Role, UpdateProfileRequest,
};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::UserRepository;
use crate::auth::repo_types::{NewUser, ProfileUpdate, UserRecord};
use crate::auth::reset::generate_reset_token;
use crate::email::Mailer;
use crate::error::AppError;
use crate::state::AppState;

const MAX_NAME_LEN: usize = 50;
const MIN_PASSWORD_LEN: usize = 8;
const RESET_TOKEN_TTL: Duration = Duration::hours(24);

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_name(errors: &mut Vec<String>, value: &str, field: &str) {
    if value.trim().is_empty() {
        errors.push(format!("{field} is required"));
    } else if value.len() > MAX_NAME_LEN {
        errors.push(format!("{field} must be at most {MAX_NAME_LEN} characters"));
    }
}

fn check_new_password(errors: &mut Vec<String>, password: &str, confirmation: &str) {
    if password.len() < MIN_PASSWORD_LEN {
        errors.push(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    if password != confirmation {
        errors.push("passwords do not match".to_string());
    }
}

/// Coordinates the credential store, hasher, token issuer, reset-token
/// generator and mailer for the account lifecycle.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    mailer: Arc<dyn Mailer>,
    jwt: JwtKeys,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            mailer: state.mailer.clone(),
            jwt: JwtKeys::from_ref(state),
        }
    }
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, mailer: Arc<dyn Mailer>, jwt: JwtKeys) -> Self {
        Self { users, mailer, jwt }
    }

    /// Both unknown-user and wrong-password paths report exactly this, so a
    /// caller cannot probe which usernames exist.
    fn invalid_credentials() -> AppError {
        AppError::Unauthorized("invalid username or password".to_string())
    }

    pub async fn register(&self, mut req: RegisterRequest) -> Result<(), AppError> {
        req.username = req.username.trim().to_string();
        req.email = req.email.trim().to_lowercase();

        let mut errors = Vec::new();
        check_name(&mut errors, &req.first_name, "first name");
        check_name(&mut errors, &req.last_name, "last name");
        check_name(&mut errors, &req.username, "username");
        check_new_password(&mut errors, &req.password, &req.password_confirmation);
        if req.email.is_empty() {
            errors.push("email is required".to_string());
        } else if !is_valid_email(&req.email) {
            errors.push("email is not a valid address".to_string());
        }
        if req.phone.trim().is_empty() {
            errors.push("phone is required".to_string());
        }
        if !errors.is_empty() {
            warn!(username = %req.username, "registration rejected by validation");
            return Err(AppError::Validation(errors));
        }

        if self.users.username_exists(&req.username).await? {
            warn!(username = %req.username, "registration with taken username");
            return Err(AppError::Conflict("username already exists".to_string()));
        }

        let password_hash = hash_password(&req.password)?;
        let user = self
            .users
            .create(NewUser {
                username: &req.username,
                password_hash: &password_hash,
                first_name: &req.first_name,
                last_name: &req.last_name,
                email: &req.email,
                phone: &req.phone,
                role: Role::User,
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(())
    }

    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let user = match self.users.find_by_username(req.username.trim()).await? {
            Some(user) if user.is_active => user,
            _ => {
                warn!(username = %req.username, "login failed");
                return Err(Self::invalid_credentials());
            }
        };

        if !verify_password(&req.password, &user.password_hash)? {
            warn!(user_id = user.id, "login with wrong password");
            return Err(Self::invalid_credentials());
        }

        let (token, expiry) = self.jwt.sign(user.id, &user.username, user.profile.role)?;
        info!(user_id = user.id, "user logged in");
        Ok(LoginResponse {
            token,
            expiry,
            role: user.profile.role,
        })
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        req: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        if req.new_password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(vec![format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )]));
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        if !verify_password(&req.current_password, &user.password_hash)? {
            warn!(user_id = user.id, "password change with wrong current password");
            return Err(AppError::Unauthorized(
                "current password is incorrect".to_string(),
            ));
        }

        self.reject_recent_password(&user, &req.new_password)?;

        let new_hash = hash_password(&req.new_password)?;
        self.users.rotate_password(user.id, &new_hash).await?;
        info!(user_id = user.id, "password changed");
        Ok(())
    }

    /// A new password may not match the current hash or the one before it.
    fn reject_recent_password(&self, user: &UserRecord, new_password: &str) -> Result<(), AppError> {
        if verify_password(new_password, &user.password_hash)? {
            return Err(AppError::Conflict(
                "new password must differ from the current password".to_string(),
            ));
        }
        if let Some(previous) = &user.previous_password_hash {
            if verify_password(new_password, previous)? {
                return Err(AppError::Conflict(
                    "new password must differ from the previous password".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.users.find_by_email(&email).await? else {
            // deliberately indistinguishable from the known-email case
            info!("password reset requested for unknown email");
            return Ok(());
        };

        let token = generate_reset_token();
        let expires_at = OffsetDateTime::now_utc() + RESET_TOKEN_TTL;
        self.users
            .set_reset_token(user.id, &token, expires_at)
            .await?;

        if let Err(e) = self
            .mailer
            .send_password_reset(&user.profile.email, &token)
            .await
        {
            // the token must not stay live if its owner never received it
            self.users.clear_reset_token(user.id).await?;
            warn!(user_id = user.id, error = %e, "reset email undeliverable, token revoked");
            return Err(AppError::Delivery(e.to_string()));
        }

        info!(user_id = user.id, "password reset token issued");
        Ok(())
    }

    pub async fn validate_reset_token(&self, token: &str) -> Result<bool, AppError> {
        Ok(self.find_user_with_live_token(token).await?.is_some())
    }

    /// An elapsed token is treated exactly like no token at all.
    async fn find_user_with_live_token(
        &self,
        token: &str,
    ) -> Result<Option<UserRecord>, AppError> {
        let Some(user) = self.users.find_by_reset_token(token).await? else {
            return Ok(None);
        };
        match user.reset_token_expires_at {
            Some(expiry) if expiry > OffsetDateTime::now_utc() => Ok(Some(user)),
            _ => Ok(None),
        }
    }

    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<(), AppError> {
        let mut errors = Vec::new();
        check_new_password(&mut errors, &req.new_password, &req.password_confirmation);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let user = self
            .find_user_with_live_token(&req.token)
            .await?
            .ok_or_else(|| {
                warn!("password reset with invalid or expired token");
                AppError::Unauthorized("invalid or expired reset token".to_string())
            })?;

        self.reject_recent_password(&user, &req.new_password)?;

        let new_hash = hash_password(&req.new_password)?;
        // rotate_password also clears the token pair
        self.users.rotate_password(user.id, &new_hash).await?;
        info!(user_id = user.id, "password reset completed");
        Ok(())
    }

    pub async fn profile(&self, user_id: i64) -> Result<ProfileResponse, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
        Ok(ProfileResponse {
            id: user.id,
            username: user.username,
            first_name: user.profile.first_name,
            last_name: user.profile.last_name,
            email: user.profile.email,
            phone: user.profile.phone,
            role: user.profile.role,
            created_at: user.created_at,
        })
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        mut req: UpdateProfileRequest,
    ) -> Result<(), AppError> {
        req.username = req.username.trim().to_string();
        req.email = req.email.trim().to_lowercase();

        let mut errors = Vec::new();
        check_name(&mut errors, &req.first_name, "first name");
        check_name(&mut errors, &req.last_name, "last name");
        check_name(&mut errors, &req.username, "username");
        if req.email.is_empty() {
            errors.push("email is required".to_string());
        } else if !is_valid_email(&req.email) {
            errors.push("email is not a valid address".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        if user.username != req.username && self.users.username_exists(&req.username).await? {
            return Err(AppError::Conflict("username already exists".to_string()));
        }

        self.users
            .update_profile(
                user.id,
                ProfileUpdate {
                    username: &req.username,
                    first_name: &req.first_name,
                    last_name: &req.last_name,
                    email: &req.email,
                    phone: &req.phone,
                },
            )
            .await?;
        info!(user_id = user.id, "profile updated");
        Ok(())
    }
}
