use crate::common::error::{CmsError, Result};
use libsql::{Builder, Connection, Database};
use tracing::info;

/// Owns the libSQL handle. Works against a local file or a remote Turso URL.
pub struct DatabaseManager {
    db: Database,
    local: bool,
}

fn is_remote_url(url: &str) -> bool {
    ["libsql://", "https://", "http://", "wss://", "ws://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

impl DatabaseManager {
    /// Connect to `url`. Remote URLs need an auth token; anything else is
    /// treated as a local database file path.
    pub async fn new(url: &str, auth_token: Option<&str>) -> Result<Self> {
        if is_remote_url(url) {
            let auth_token = auth_token.filter(|t| !t.is_empty()).ok_or_else(|| CmsError::Database {
                message: "LIBSQL_AUTH_TOKEN is required for remote databases".to_string(),
            })?;

            info!("Connecting to Turso database at {}", url);
            let db = Builder::new_remote(url.to_string(), auth_token.to_string())
                .build()
                .await
                .map_err(|e| CmsError::Database {
                    message: format!("Failed to connect to database: {e}"),
                })?;
            return Ok(Self { db, local: false });
        }

        info!("Opening local database at {}", url);
        let db = Builder::new_local(url)
            .build()
            .await
            .map_err(|e| CmsError::Database {
                message: format!("Failed to open database file {url}: {e}"),
            })?;
        Ok(Self { db, local: true })
    }

    /// Get a connection to the database
    pub async fn get_connection(&self) -> Result<Connection> {
        let conn = self.db.connect().map_err(|e| CmsError::Database {
            message: format!("Failed to get database connection: {e}"),
        })?;

        if self.local {
            // Writers wait on each other instead of failing with SQLITE_BUSY.
            conn.execute_batch("PRAGMA busy_timeout = 5000;")
                .await
                .map_err(|e| CmsError::Database {
                    message: format!("Failed to set busy timeout: {e}"),
                })?;
        }

        Ok(conn)
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.get_connection().await?;

        let migration_sql_001 = include_str!("../migrations/001_create_records.sql");
        conn.execute_batch(migration_sql_001)
            .await
            .map_err(|e| CmsError::Database {
                message: format!("Failed to run base migration: {e}"),
            })?;

        let migration_sql_002 = include_str!("../migrations/002_indexes.sql");
        conn.execute_batch(migration_sql_002)
            .await
            .map_err(|e| CmsError::Database {
                message: format!("Failed to run index migration: {e}"),
            })?;

        if self.local {
            conn.execute_batch("PRAGMA journal_mode = WAL;")
                .await
                .map_err(|e| CmsError::Database {
                    message: format!("Failed to enable WAL: {e}"),
                })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_urls_are_recognized() {
        assert!(is_remote_url("libsql://asomap-cms.turso.io"));
        assert!(is_remote_url("https://asomap-cms.turso.io"));
        assert!(!is_remote_url("data/asomap.db"));
        assert!(!is_remote_url("/var/lib/asomap/cms.db"));
    }

    #[tokio::test]
    async fn remote_without_token_is_rejected() {
        let result = DatabaseManager::new("libsql://asomap-cms.turso.io", None).await;
        assert!(matches!(result, Err(CmsError::Database { .. })));
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cms.db");
        let manager = DatabaseManager::new(path.to_str().unwrap(), None).await.unwrap();
        manager.run_migrations().await.unwrap();
        manager.run_migrations().await.unwrap();
    }
}
