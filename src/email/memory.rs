use super::{EmailBackend, OutgoingEmail};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use cms_core::EmailConfiguration;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Keeps messages in memory instead of sending them. Used by tests and by
/// local runs without SMTP credentials.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    outbox: Arc<Mutex<Vec<OutgoingEmail>>>,
    failure: Option<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose every send fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outbox: Arc::default(),
            failure: Some(reason.into()),
        }
    }

    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox.lock().await.clone()
    }
}

#[async_trait]
impl EmailBackend for MemoryBackend {
    async fn send(&self, _config: &EmailConfiguration, email: &OutgoingEmail) -> Result<()> {
        if let Some(reason) = &self.failure {
            return Err(AppError::Email(reason.clone()));
        }
        self.outbox.lock().await.push(email.clone());
        Ok(())
    }
}
