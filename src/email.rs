use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::SmtpConfig;

/// Outbound notification channel. The orchestrator only ever needs this one
/// send operation; transport wiring stays behind the trait.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, reset_token: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    frontend_url: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, frontend_url: &str) -> anyhow::Result<Self> {
        // No credentials means a local relay (Mailpit, MailHog, ...)
        let transport = if config.username.is_empty() {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .build()
        } else {
            let creds = Credentials::new(config.username.clone(), config.password.clone());
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
                .port(config.port)
                .credentials(creds)
                .build()
        };

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_password_reset(&self, to: &str, reset_token: &str) -> anyhow::Result<()> {
        let reset_url = format!("{}/reset-password?token={}", self.frontend_url, reset_token);

        let body = format!(
            r#"We received a request to reset the password for your account.

Open the link below to choose a new password:

{}

The link is valid for 24 hours.

If you did not request a password reset, you can ignore this email.
"#,
            reset_url
        );

        let email = Message::builder()
            .from(self.from_address.parse()?)
            .to(to.parse()?)
            .subject("Password reset request")
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.transport.send(email).await?;
        info!(to = %to, "password reset email sent");
        Ok(())
    }
}
