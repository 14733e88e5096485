//! Outbound email
//!
//! Welcome mail on registration. Delivery is best-effort and never holds
//! up a response; failures are logged and otherwise ignored.

use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::warn;

use crate::config::MailConfig;

#[derive(Clone)]
pub struct Mailer {
    config: MailConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Result<Self> {
        let transport = if config.enabled {
            let mut builder =
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                    .context("Failed to build SMTP transport")?
                    .port(config.smtp_port);

            if !config.smtp_username.is_empty() {
                builder = builder.credentials(Credentials::new(
                    config.smtp_username.clone(),
                    config.smtp_password.clone(),
                ));
            }

            Some(builder.build())
        } else {
            None
        };

        Ok(Self { config, transport })
    }

    /// Send the post-registration welcome message.
    pub async fn send_welcome(&self, recipient: &str, first_name: &str) -> Result<()> {
        let Some(transport) = &self.transport else {
            return Ok(());
        };

        let body = format!(
            "Hello {},\n\n\
             Welcome to {}! Your account has been created.\n\n\
             The {} team",
            first_name, self.config.from_name, self.config.from_name
        );

        let message = Message::builder()
            .from(
                format!("{} <{}>", self.config.from_name, self.config.from_address)
                    .parse()
                    .context("Invalid sender address")?,
            )
            .to(recipient.parse().context("Invalid recipient address")?)
            .subject(format!("Welcome to {}", self.config.from_name))
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .context("Failed to build welcome message")?;

        transport
            .send(message)
            .await
            .context("Failed to send welcome message")?;

        Ok(())
    }

    /// Fire-and-forget variant used by the registration handlers.
    pub fn send_welcome_detached(&self, recipient: String, first_name: String) {
        let mailer = self.clone();
        tokio::spawn(async move {
            if let Err(error) = mailer.send_welcome(&recipient, &first_name).await {
                warn!(recipient = %recipient, "Failed to send welcome email: {:#}", error);
            }
        });
    }
}
