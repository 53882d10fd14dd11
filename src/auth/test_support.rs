//! In-memory stand-ins for the credential store and the mailer, used by
//! service-level tests across modules.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};

use crate::auth::repo::UserRepository;
use crate::auth::repo_types::{NewUser, ProfileRecord, ProfileUpdate, UserRecord};
use crate::email::Mailer;

#[derive(Default)]
pub(crate) struct InMemoryUsers {
    rows: Mutex<Vec<UserRecord>>,
}

impl InMemoryUsers {
    pub(crate) fn get(&self, username: &str) -> Option<UserRecord> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    pub(crate) fn set_active(&self, username: &str, active: bool) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| u.username == username) {
            user.is_active = active;
        }
    }

    pub(crate) fn expire_reset_token(&self, username: &str) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| u.username == username) {
            if user.reset_token.is_some() {
                user.reset_token_expires_at =
                    Some(OffsetDateTime::now_utc() - Duration::hours(1));
            }
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn username_exists(&self, username: &str) -> anyhow::Result<bool> {
        Ok(self.get(username).is_some())
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<UserRecord>> {
        Ok(self.get(username))
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<UserRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.profile.email == email)
            .cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> anyhow::Result<Option<UserRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn create(&self, new_user: NewUser<'_>) -> anyhow::Result<UserRecord> {
        let mut rows = self.rows.lock().unwrap();
        let user = UserRecord {
            id: rows.len() as i64 + 1,
            username: new_user.username.to_string(),
            password_hash: new_user.password_hash.to_string(),
            previous_password_hash: None,
            reset_token: None,
            reset_token_expires_at: None,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
            profile: ProfileRecord {
                first_name: new_user.first_name.to_string(),
                last_name: new_user.last_name.to_string(),
                email: new_user.email.to_string(),
                phone: new_user.phone.to_string(),
                role: new_user.role,
            },
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn rotate_password(&self, id: i64, new_hash: &str) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| u.id == id) {
            user.previous_password_hash = Some(user.password_hash.clone());
            user.password_hash = new_hash.to_string();
            user.reset_token = None;
            user.reset_token_expires_at = None;
            user.updated_at = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: i64,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| u.id == id) {
            user.reset_token = Some(token.to_string());
            user.reset_token_expires_at = Some(expires_at);
            user.updated_at = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }

    async fn clear_reset_token(&self, id: i64) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| u.id == id) {
            user.reset_token = None;
            user.reset_token_expires_at = None;
        }
        Ok(())
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate<'_>) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| u.id == id) {
            user.username = update.username.to_string();
            user.profile.first_name = update.first_name.to_string();
            user.profile.last_name = update.last_name.to_string();
            user.profile.email = update.email.to_string();
            user.profile.phone = update.phone.to_string();
            user.updated_at = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }
}

/// Captures outgoing reset mails as `(recipient, token)` pairs; flip `fail`
/// to simulate a dead SMTP relay.
#[derive(Default)]
pub(crate) struct RecordingMailer {
    pub(crate) sent: Mutex<Vec<(String, String)>>,
    pub(crate) fail: AtomicBool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, to: &str, reset_token: &str) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("smtp connection refused");
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), reset_token.to_string()));
        Ok(())
    }
}
