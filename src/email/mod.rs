//! Outgoing mail.
//!
//! Every send goes through [`send_email_with_config`], which writes an
//! [`EmailLog`](cms_core::EmailLog) row before touching the network and
//! updates it with the outcome.

pub mod memory;
pub mod sender;
pub mod smtp;
pub mod templates;

pub use memory::MemoryBackend;
pub use sender::{
    active_configuration, send_claim_confirmation, send_email_with_config,
    send_fraud_confirmation, send_suggestion_confirmation, send_test_email, EmailRequest,
};
pub use smtp::SmtpBackend;

use crate::error::Result;
use async_trait::async_trait;
use cms_core::EmailConfiguration;

/// A rendered message ready to hand to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

#[async_trait]
pub trait EmailBackend: Send + Sync {
    async fn send(&self, config: &EmailConfiguration, email: &OutgoingEmail) -> Result<()>;
}
