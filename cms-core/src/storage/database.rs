use super::document::{flag_is_set, scope_text, strip_id, with_id};
use super::traits::Storage;
use crate::common::error::{CmsError, Result};
use crate::database::DatabaseManager;
use crate::domain::ExclusiveRule;
use async_trait::async_trait;
use libsql::{Connection, TransactionBehavior};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

fn db_error(context: &'static str) -> impl FnOnce(libsql::Error) -> CmsError {
    move |e| CmsError::Database {
        message: format!("{context}: {e}"),
    }
}

fn decode_row(row: &libsql::Row) -> Result<Value> {
    let id: i64 = row.get(0).map_err(db_error("Failed to get id"))?;
    let data: String = row.get(1).map_err(db_error("Failed to get data"))?;
    let value: Value = serde_json::from_str(&data)?;
    Ok(with_id(value, id))
}

/// libSQL-backed storage. Each call takes a fresh connection from the manager.
#[derive(Clone)]
pub struct DatabaseStorage {
    manager: Arc<DatabaseManager>,
}

impl DatabaseStorage {
    pub fn new(manager: DatabaseManager) -> Self {
        Self {
            manager: Arc::new(manager),
        }
    }

    pub fn manager(&self) -> &DatabaseManager {
        &self.manager
    }

    async fn insert_on(conn: &Connection, kind: &str, text: &str) -> Result<i64> {
        let mut rows = conn
            .query(
                "INSERT INTO records (kind, data, created_at, updated_at)
                 VALUES (?1, ?2, datetime('now'), datetime('now'))
                 RETURNING id",
                libsql::params![kind, text],
            )
            .await
            .map_err(db_error("Failed to insert record"))?;

        let row = rows
            .next()
            .await
            .map_err(db_error("Failed to read inserted id"))?
            .ok_or_else(|| CmsError::Database {
                message: "Insert returned no id".to_string(),
            })?;
        row.get::<i64>(0).map_err(db_error("Failed to get inserted id"))
    }

    async fn update_on(conn: &Connection, kind: &str, id: i64, text: &str) -> Result<()> {
        let changed = conn
            .execute(
                "UPDATE records SET data = ?1, updated_at = datetime('now')
                 WHERE kind = ?2 AND id = ?3",
                libsql::params![text, kind, id],
            )
            .await
            .map_err(db_error("Failed to update record"))?;

        if changed == 0 {
            return Err(CmsError::NotFound {
                kind: kind.to_string(),
                id,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn insert_record(&self, kind: &str, data: Value) -> Result<i64> {
        let conn = self.manager.get_connection().await?;
        let text = serde_json::to_string(&strip_id(data))?;
        let id = Self::insert_on(&conn, kind, &text).await?;
        debug!("Inserted {} row {}", kind, id);
        Ok(id)
    }

    async fn update_record(&self, kind: &str, id: i64, data: Value) -> Result<()> {
        let conn = self.manager.get_connection().await?;
        let text = serde_json::to_string(&strip_id(data))?;
        Self::update_on(&conn, kind, id, &text).await?;
        debug!("Updated {} row {}", kind, id);
        Ok(())
    }

    async fn get_record(&self, kind: &str, id: i64) -> Result<Option<Value>> {
        let conn = self.manager.get_connection().await?;
        let mut rows = conn
            .query(
                "SELECT id, data FROM records WHERE kind = ?1 AND id = ?2",
                libsql::params![kind, id],
            )
            .await
            .map_err(db_error("Failed to query record"))?;

        match rows.next().await.map_err(db_error("Failed to read row"))? {
            Some(row) => Ok(Some(decode_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_records(&self, kind: &str) -> Result<Vec<Value>> {
        let conn = self.manager.get_connection().await?;
        let mut rows = conn
            .query(
                "SELECT id, data FROM records WHERE kind = ?1 ORDER BY id",
                libsql::params![kind],
            )
            .await
            .map_err(db_error("Failed to query records"))?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_error("Failed to read row"))? {
            results.push(decode_row(&row)?);
        }
        Ok(results)
    }

    async fn delete_record(&self, kind: &str, id: i64) -> Result<bool> {
        let conn = self.manager.get_connection().await?;
        let changed = conn
            .execute(
                "DELETE FROM records WHERE kind = ?1 AND id = ?2",
                libsql::params![kind, id],
            )
            .await
            .map_err(db_error("Failed to delete record"))?;
        Ok(changed > 0)
    }

    async fn save_exclusive(
        &self,
        kind: &str,
        id: Option<i64>,
        data: Value,
        rule: &ExclusiveRule,
    ) -> Result<i64> {
        let claims_flag = flag_is_set(&data, rule.flag);
        let scope_value = rule.scope.and_then(|field| scope_text(&data, field));
        let text = serde_json::to_string(&strip_id(data))?;

        let conn = self.manager.get_connection().await?;
        // IMMEDIATE takes the write lock up front so no other writer can slip
        // an active row in between the save and the clear.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let saved = match id {
            Some(id) => {
                Self::update_on(&tx, kind, id, &text).await?;
                id
            }
            None => Self::insert_on(&tx, kind, &text).await?,
        };

        if claims_flag {
            let flag_path = format!("$.{}", rule.flag);
            let cleared = match (rule.scope, scope_value) {
                (None, _) => {
                    tx.execute(
                        "UPDATE records
                         SET data = json_set(data, ?1, json('false')), updated_at = datetime('now')
                         WHERE kind = ?2 AND id != ?3",
                        libsql::params![flag_path, kind, saved],
                    )
                    .await
                }
                (Some(field), Some(value)) => {
                    tx.execute(
                        "UPDATE records
                         SET data = json_set(data, ?1, json('false')), updated_at = datetime('now')
                         WHERE kind = ?2 AND id != ?3
                           AND CAST(json_extract(data, ?4) AS TEXT) = ?5",
                        libsql::params![flag_path, kind, saved, format!("$.{field}"), value],
                    )
                    .await
                }
                (Some(field), None) => {
                    tx.execute(
                        "UPDATE records
                         SET data = json_set(data, ?1, json('false')), updated_at = datetime('now')
                         WHERE kind = ?2 AND id != ?3
                           AND json_extract(data, ?4) IS NULL",
                        libsql::params![flag_path, kind, saved, format!("$.{field}")],
                    )
                    .await
                }
            }
            .map_err(db_error("Failed to clear exclusive flag"))?;
            debug!("Cleared {} on {} other {} rows", rule.flag, cleared, kind);
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Ok(saved)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.manager.get_connection().await?;
        conn.execute("DELETE FROM records", libsql::params![])
            .await
            .map_err(db_error("Failed to clear records"))?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let conn = self.manager.get_connection().await?;
        let mut rows = conn
            .query("SELECT 1", libsql::params![])
            .await
            .map_err(db_error("Ping failed"))?;
        rows.next().await.map_err(db_error("Ping failed"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn storage() -> (tempfile::TempDir, DatabaseStorage) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cms.db");
        let manager = DatabaseManager::new(path.to_str().unwrap(), None).await.unwrap();
        manager.run_migrations().await.unwrap();
        (dir, DatabaseStorage::new(manager))
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let (_dir, storage) = storage().await;
        let id = storage
            .insert_record("about.mision", json!({"title": "Misión", "is_active": true}))
            .await
            .unwrap();
        storage
            .update_record("about.mision", id, json!({"title": "Nuestra misión", "is_active": true}))
            .await
            .unwrap();

        let row = storage.get_record("about.mision", id).await.unwrap().unwrap();
        assert_eq!(row["id"], json!(id));
        assert_eq!(row["title"], "Nuestra misión");
        assert!(storage.get_record("about.vision", id).await.unwrap().is_none());

        assert!(storage.delete_record("about.mision", id).await.unwrap());
        assert!(!storage.delete_record("about.mision", id).await.unwrap());
    }

    #[tokio::test]
    async fn exclusive_save_leaves_one_active_row() {
        let (_dir, storage) = storage().await;
        let kind = "header.exchange_rate";
        for _ in 0..3 {
            storage
                .save_exclusive(kind, None, json!({"is_active": true}), &ExclusiveRule::ACTIVE)
                .await
                .unwrap();
        }
        let active = storage
            .list_records(kind)
            .await
            .unwrap()
            .into_iter()
            .filter(|row| row["is_active"] == json!(true))
            .count();
        assert_eq!(active, 1);
    }

    #[tokio::test]
    async fn scoped_exclusive_save_keeps_other_scopes() {
        let (_dir, storage) = storage().await;
        let kind = "user_support.rights_and_duties_section";
        let rule = ExclusiveRule::scoped("is_active", "section_id");
        let other = storage
            .save_exclusive(kind, None, json!({"section_id": "otherRights", "is_active": true}), &rule)
            .await
            .unwrap();
        storage
            .save_exclusive(kind, None, json!({"section_id": "rightsAndDuties", "is_active": true}), &rule)
            .await
            .unwrap();
        let row = storage.get_record(kind, other).await.unwrap().unwrap();
        assert_eq!(row["is_active"], json!(true));
    }

    #[tokio::test]
    async fn ping_succeeds_on_open_database() {
        let (_dir, storage) = storage().await;
        storage.ping().await.unwrap();
    }
}
