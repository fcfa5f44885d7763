use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
    pub security: SecurityConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// `url` is a local database file or a `libsql://` URL. Unset means the
/// process keeps everything in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub auth_token: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: Some("asomap_cms.db".to_string()),
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub root: PathBuf,
    pub base_url: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("media"),
            base_url: "http://localhost:8000/media".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Requests allowed per client IP and window on `/admin/` paths.
    pub rate_limit: u32,
    pub rate_window_secs: u64,
    pub max_login_attempts: u32,
    pub login_block_secs: u64,
    pub allowed_origins: Vec<String>,
    /// Take the client IP from `X-Forwarded-For`. Only safe behind a proxy
    /// that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            rate_limit: 100,
            rate_window_secs: 60,
            max_login_attempts: 5,
            login_block_secs: 300,
            allowed_origins: Vec::new(),
            trust_forwarded_for: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            file_name: "asomap_cms.log".to_string(),
        }
    }
}

impl Config {
    /// Reads `config.toml` when present, falling back to defaults, then
    /// applies `.env` and environment overrides.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let config = if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::read(Path::new(DEFAULT_CONFIG_PATH))?
        } else {
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    /// Like [`Config::load`], but the file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        dotenv::dotenv().ok();
        Ok(Self::read(path)?.with_env_overrides())
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = non_empty("ASOMAP_PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(url) = non_empty("LIBSQL_URL") {
            self.database.url = Some(url);
        }
        if let Some(token) = non_empty("LIBSQL_AUTH_TOKEN") {
            self.database.auth_token = Some(token);
        }
        if let Some(root) = non_empty("MEDIA_ROOT") {
            self.media.root = PathBuf::from(root);
        }
        if let Some(base_url) = non_empty("MEDIA_BASE_URL") {
            self.media.base_url = base_url;
        }
        if let Some(username) = non_empty("ADMIN_USERNAME") {
            self.admin.username = username;
        }
        if let Some(password) = non_empty("ADMIN_PASSWORD") {
            self.admin.password = password;
        }
        if let Some(trust) = non_empty("TRUST_FORWARDED_FOR").and_then(|v| v.trim().parse().ok()) {
            self.security.trust_forwarded_for = trust;
        }
        if let Some(dir) = non_empty("LOG_DIR") {
            self.logging.dir = PathBuf::from(dir);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn sparse_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9100

            [security]
            rate_limit = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.security.rate_limit, 20);
        assert_eq!(config.security.max_login_attempts, 5);
        assert_eq!(config.media.base_url, "http://localhost:8000/media");
    }

    #[test]
    fn environment_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            ("ASOMAP_PORT", "8088"),
            ("LIBSQL_URL", "libsql://cms.turso.io"),
            ("MEDIA_BASE_URL", "https://cdn.asomap.com.do/media"),
            ("ADMIN_PASSWORD", "s3creto"),
            ("LOG_DIR", "  "),
        ]
        .into_iter()
        .collect();

        let config = Config::default().with_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.database.url.as_deref(), Some("libsql://cms.turso.io"));
        assert_eq!(config.media.base_url, "https://cdn.asomap.com.do/media");
        assert_eq!(config.admin.password, "s3creto");
        assert_eq!(config.logging.dir, PathBuf::from("logs"));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::read(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[admin]\nusername = \"editor\"").unwrap();
        let config = Config::read(file.path()).unwrap();
        assert_eq!(config.admin.username, "editor");
    }
}
