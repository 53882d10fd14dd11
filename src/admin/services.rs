use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{info, warn};

use crate::auth::dto::{LoginRequest, LoginResponse, Role};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::verify_password;
use crate::auth::repo::UserRepository;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Clone)]
pub struct AdminService {
    users: Arc<dyn UserRepository>,
    jwt: JwtKeys,
}

impl FromRef<AppState> for AdminService {
    fn from_ref(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            jwt: JwtKeys::from_ref(state),
        }
    }
}

impl AdminService {
    pub fn new(users: Arc<dyn UserRepository>, jwt: JwtKeys) -> Self {
        Self { users, jwt }
    }

    /// Credentials are checked before the role so that a non-admin probing
    /// this endpoint with a wrong password still gets the generic error.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let user = match self.users.find_by_username(req.username.trim()).await? {
            Some(user) if user.is_active => user,
            _ => {
                warn!(username = %req.username, "admin login failed");
                return Err(AppError::Unauthorized(
                    "invalid username or password".to_string(),
                ));
            }
        };

        if !verify_password(&req.password, &user.password_hash)? {
            warn!(user_id = user.id, "admin login with wrong password");
            return Err(AppError::Unauthorized(
                "invalid username or password".to_string(),
            ));
        }

        if user.profile.role != Role::Admin {
            warn!(user_id = user.id, "admin login by non-admin account");
            return Err(AppError::Forbidden("admin privileges required".to_string()));
        }

        let (token, expiry) = self.jwt.sign(user.id, &user.username, user.profile.role)?;
        info!(user_id = user.id, "admin logged in");
        Ok(LoginResponse {
            token,
            expiry,
            role: user.profile.role,
        })
    }
}
