use crate::config::Config;
use crate::email::EmailBackend;
use crate::security::SecurityGuard;
use cms_core::storage::Storage;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Bearer tokens issued by `/admin/login/`. Process-local; a restart logs
/// everyone out.
#[derive(Default)]
pub struct AdminSessions {
    tokens: Mutex<HashMap<String, Instant>>,
}

impl AdminSessions {
    pub async fn issue(&self) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        let mut tokens = self.tokens.lock().await;
        let now = Instant::now();
        tokens.retain(|_, issued| now.duration_since(*issued) < SESSION_TTL);
        tokens.insert(token.clone(), now);
        token
    }

    pub async fn is_valid(&self, token: &str) -> bool {
        let tokens = self.tokens.lock().await;
        tokens
            .get(token)
            .is_some_and(|issued| issued.elapsed() < SESSION_TTL)
    }
}

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub config: Arc<Config>,
    pub mailer: Arc<dyn EmailBackend>,
    pub security: Arc<SecurityGuard>,
    pub sessions: Arc<AdminSessions>,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn Storage>, mailer: Arc<dyn EmailBackend>) -> Self {
        let security = Arc::new(SecurityGuard::new(config.security.clone()));
        Self {
            storage,
            config: Arc::new(config),
            mailer,
            security,
            sessions: Arc::new(AdminSessions::default()),
        }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Absolute URL for a stored media path; `None` when the path is empty.
    pub fn media_url(&self, path: &str) -> Option<String> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.to_string());
        }
        Some(format!(
            "{}/{}",
            self.config.media.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::MemoryBackend;
    use cms_core::storage::InMemoryStorage;

    fn state() -> AppState {
        AppState::new(
            Config::default(),
            Arc::new(InMemoryStorage::new()),
            Arc::new(MemoryBackend::new()),
        )
    }

    #[test]
    fn media_urls_are_absolute() {
        let state = state();
        assert_eq!(
            state.media_url("/about/hero.jpg").as_deref(),
            Some("http://localhost:8000/media/about/hero.jpg")
        );
        assert_eq!(
            state.media_url("https://res.cloudinary.com/x.png").as_deref(),
            Some("https://res.cloudinary.com/x.png")
        );
        assert_eq!(state.media_url("  "), None);
    }

    #[tokio::test]
    async fn issued_tokens_validate() {
        let sessions = AdminSessions::default();
        let token = sessions.issue().await;
        assert!(sessions.is_valid(&token).await);
        assert!(!sessions.is_valid("forged").await);
    }
}
