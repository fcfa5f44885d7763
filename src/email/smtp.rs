use super::{EmailBackend, OutgoingEmail};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use cms_core::EmailConfiguration;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::debug;

const SENDER_NAME: &str = "ASOMAP";

/// SMTP delivery through lettre. A transport is built per message from the
/// configuration row, since admins can edit it at any time.
#[derive(Debug, Clone)]
pub struct SmtpBackend {
    timeout: Duration,
}

impl Default for SmtpBackend {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl SmtpBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn transport(&self, config: &EmailConfiguration) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| AppError::Email(format!("Invalid SMTP host {}: {e}", config.host)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        Ok(builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(self.timeout))
            .build())
    }

    fn message(email: &OutgoingEmail) -> Result<Message> {
        let from: Mailbox = format!("{SENDER_NAME} <{}>", email.from)
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid sender {}: {e}", email.from)))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid recipient {}: {e}", email.to)))?;

        let builder = Message::builder().from(from).to(to).subject(&email.subject);
        let message = match &email.html {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                html.clone(),
            )),
            None => builder.body(email.text.clone()),
        };
        message.map_err(|e| AppError::Email(format!("Failed to build message: {e}")))
    }
}

#[async_trait]
impl EmailBackend for SmtpBackend {
    async fn send(&self, config: &EmailConfiguration, email: &OutgoingEmail) -> Result<()> {
        let message = Self::message(email)?;
        let transport = self.transport(config)?;

        debug!(
            "Sending '{}' to {} via {}:{}",
            email.subject, email.to, config.host, config.port
        );
        transport
            .send(message)
            .await
            .map_err(|e| AppError::Email(format!("SMTP delivery failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(to: &str) -> OutgoingEmail {
        OutgoingEmail {
            from: "notificaciones@asomap.com.do".to_string(),
            to: to.to_string(),
            subject: "Solicitud #4 recibida".to_string(),
            text: "Hola".to_string(),
            html: Some("<p>Hola</p>".to_string()),
        }
    }

    #[test]
    fn builds_multipart_message() {
        assert!(SmtpBackend::message(&email("ana@example.com")).is_ok());
    }

    #[test]
    fn rejects_malformed_recipient() {
        let err = SmtpBackend::message(&email("no es un correo")).unwrap_err();
        assert!(matches!(err, AppError::Email(_)));
    }
}
