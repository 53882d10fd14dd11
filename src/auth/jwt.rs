use std::time::Duration;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{auth::dto::Role, config::JwtConfig, state::AppState};

/// Fixed claim set embedded in every issued token. Kept strongly typed so a
/// misspelled claim key is a compile error, not a silent auth hole.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub jti: Uuid,
    pub username: String,
    pub user_id: i64,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::from_secs((config.expiry_minutes as u64) * 60),
        }
    }

    /// Sign a token for the given identity; returns the token together with
    /// its absolute expiry.
    pub fn sign(
        &self,
        user_id: i64,
        username: &str,
        role: Role,
    ) -> anyhow::Result<(String, OffsetDateTime)> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: username.to_string(),
            jti: Uuid::new_v4(),
            username: username.to_string(),
            user_id,
            role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, role = %role, "jwt signed");
        Ok((token, exp))
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

/// Authenticated caller extracted from the bearer header.
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

fn bearer_claims<S>(parts: &mut Parts, state: &S) -> Result<Claims, (StatusCode, String)>
where
    JwtKeys: FromRef<S>,
{
    let keys = JwtKeys::from_ref(state);
    let auth_header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing Authorization header".to_string(),
        ))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or((
        StatusCode::UNAUTHORIZED,
        "Invalid Authorization header".to_string(),
    ))?;

    match keys.verify(token) {
        Ok(claims) => Ok(claims),
        Err(_) => {
            warn!("invalid or expired token");
            Err((
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token".to_string(),
            ))
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.username,
            role: claims.role,
        })
    }
}

/// Like [`AuthUser`], but only admits tokens carrying the admin role.
#[derive(Debug)]
pub struct AdminUser {
    pub user_id: i64,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.role != Role::Admin {
            warn!(user_id = claims.user_id, "admin route rejected non-admin token");
            return Err((
                StatusCode::FORBIDDEN,
                "Admin privileges required".to_string(),
            ));
        }
        Ok(AdminUser {
            user_id: claims.user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            expiry_minutes: 30,
        })
    }

    #[test]
    fn sign_and_verify_preserves_claims() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let (token, expiry) = keys.sign(42, "ada", Role::User).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, "ada");
        assert_eq!(claims.username, "ada");
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp as i64, expiry.unix_timestamp());
    }

    #[test]
    fn expiry_matches_configured_ttl() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let (token, _) = keys.sign(1, "ada", Role::User).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn tokens_get_unique_ids() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let (a, _) = keys.sign(1, "ada", Role::User).expect("sign");
        let (b, _) = keys.sign(1, "ada", Role::User).expect("sign");
        let claims_a = keys.verify(&a).expect("verify");
        let claims_b = keys.verify(&b).expect("verify");
        assert_ne!(claims_a.jti, claims_b.jti);
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let (token, _) = keys.sign(1, "ada", Role::User).expect("sign");
        let mut tampered = token.clone();
        // flip a character in the payload segment
        let mid = token.len() / 2;
        let replacement = if &token[mid..mid + 1] == "A" { "B" } else { "A" };
        tampered.replace_range(mid..mid + 1, replacement);
        assert!(keys.verify(&tampered).is_err());
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good_keys = make_keys("same-secret", "good-iss", "good-aud");
        let bad_keys = make_keys("same-secret", "bad-iss", "bad-aud");
        let (token, _) = good_keys.sign(1, "ada", Role::Admin).expect("sign");
        assert!(bad_keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let keys = make_keys("secret-one", "iss", "aud");
        let other = make_keys("secret-two", "iss", "aud");
        let (token, _) = keys.sign(1, "ada", Role::User).expect("sign");
        assert!(other.verify(&token).is_err());
    }
}
