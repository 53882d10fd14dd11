use sqlx::FromRow;
use time::OffsetDateTime;

use crate::auth::dto::Role;

/// Identity record as the service layer sees it: credentials plus the
/// reset-token pair, with the 1:1 profile attached.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub previous_password_hash: Option<String>,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<OffsetDateTime>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
    pub profile: ProfileRecord,
}

#[derive(Debug, Clone)]
pub struct ProfileRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
}

/// Flat row shape produced by the users/profiles join.
#[derive(Debug, FromRow)]
pub struct UserProfileRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub previous_password_hash: Option<String>,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<OffsetDateTime>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
}

impl From<UserProfileRow> for UserRecord {
    fn from(r: UserProfileRow) -> Self {
        Self {
            id: r.id,
            username: r.username,
            password_hash: r.password_hash,
            previous_password_hash: r.previous_password_hash,
            reset_token: r.reset_token,
            reset_token_expires_at: r.reset_token_expires_at,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
            profile: ProfileRecord {
                first_name: r.first_name,
                last_name: r.last_name,
                email: r.email,
                phone: r.phone,
                role: Role::from(r.role.as_str()),
            },
        }
    }
}

#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub role: Role,
}

#[derive(Debug)]
pub struct ProfileUpdate<'a> {
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
}
