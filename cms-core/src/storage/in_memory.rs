use super::document::{flag_is_set, scope_matches, strip_id, with_id};
use super::traits::Storage;
use crate::common::error::{CmsError, Result};
use crate::domain::ExclusiveRule;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct Tables {
    next_id: i64,
    rows: HashMap<String, BTreeMap<i64, Value>>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn write(&mut self, kind: &str, id: Option<i64>, data: Value) -> Result<i64> {
        let data = strip_id(data);
        match id {
            Some(id) => {
                let slot = self
                    .rows
                    .get_mut(kind)
                    .and_then(|rows| rows.get_mut(&id))
                    .ok_or_else(|| CmsError::NotFound {
                        kind: kind.to_string(),
                        id,
                    })?;
                *slot = data;
                Ok(id)
            }
            None => {
                let id = self.allocate_id();
                self.rows.entry(kind.to_string()).or_default().insert(id, data);
                Ok(id)
            }
        }
    }
}

/// In-memory storage for development and tests.
///
/// One lock guards every table, so `save_exclusive` is atomic.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn insert_record(&self, kind: &str, data: Value) -> Result<i64> {
        let mut tables = self.tables.lock().await;
        let id = tables.write(kind, None, data)?;
        debug!("Inserted {} row {}", kind, id);
        Ok(id)
    }

    async fn update_record(&self, kind: &str, id: i64, data: Value) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables.write(kind, Some(id), data)?;
        debug!("Updated {} row {}", kind, id);
        Ok(())
    }

    async fn get_record(&self, kind: &str, id: i64) -> Result<Option<Value>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .rows
            .get(kind)
            .and_then(|rows| rows.get(&id))
            .map(|data| with_id(data.clone(), id)))
    }

    async fn list_records(&self, kind: &str) -> Result<Vec<Value>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .rows
            .get(kind)
            .map(|rows| {
                rows.iter()
                    .map(|(id, data)| with_id(data.clone(), *id))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_record(&self, kind: &str, id: i64) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let removed = tables
            .rows
            .get_mut(kind)
            .and_then(|rows| rows.remove(&id))
            .is_some();
        if removed {
            debug!("Deleted {} row {}", kind, id);
        }
        Ok(removed)
    }

    async fn save_exclusive(
        &self,
        kind: &str,
        id: Option<i64>,
        data: Value,
        rule: &ExclusiveRule,
    ) -> Result<i64> {
        let mut tables = self.tables.lock().await;
        let claims_flag = flag_is_set(&data, rule.flag);
        let saved = tables.write(kind, id, data)?;

        if claims_flag {
            let scope_source = tables
                .rows
                .get(kind)
                .and_then(|rows| rows.get(&saved))
                .cloned()
                .unwrap_or(Value::Null);
            if let Some(rows) = tables.rows.get_mut(kind) {
                for (other_id, other) in rows.iter_mut() {
                    if *other_id == saved || !scope_matches(&scope_source, other, rule.scope) {
                        continue;
                    }
                    if let Some(obj) = other.as_object_mut() {
                        obj.insert(rule.flag.to_string(), Value::Bool(false));
                    }
                }
            }
            debug!("Saved {} row {} as the only {}", kind, saved, rule.flag);
        }

        Ok(saved)
    }

    async fn clear(&self) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables.rows.clear();
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn ids_are_injected_and_ignored_on_input() {
        let storage = InMemoryStorage::new();
        let id = storage
            .insert_record("about.hero", json!({"id": 999, "title": "Hola"}))
            .await
            .unwrap();
        let row = storage.get_record("about.hero", id).await.unwrap().unwrap();
        assert_eq!(row["id"], json!(id));
        assert_eq!(row["title"], "Hola");
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let storage = InMemoryStorage::new();
        let err = storage
            .update_record("about.hero", 4, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::NotFound { id: 4, .. }));
    }

    #[tokio::test]
    async fn exclusive_save_only_touches_matching_scope() {
        let storage = InMemoryStorage::new();
        let rule = ExclusiveRule::scoped("is_active", "section_id");
        let kind = "user_support.rights_and_duties_section";
        let a = storage
            .save_exclusive(kind, None, json!({"section_id": "rightsAndDuties", "is_active": true}), &rule)
            .await
            .unwrap();
        let b = storage
            .save_exclusive(kind, None, json!({"section_id": "otherRights", "is_active": true}), &rule)
            .await
            .unwrap();
        let c = storage
            .save_exclusive(kind, None, json!({"section_id": "rightsAndDuties", "is_active": true}), &rule)
            .await
            .unwrap();

        let active = |id| {
            let storage = storage.clone();
            async move {
                storage.get_record(kind, id).await.unwrap().unwrap()["is_active"] == json!(true)
            }
        };
        assert!(!active(a).await);
        assert!(active(b).await);
        assert!(active(c).await);
    }

    #[tokio::test]
    async fn clear_empties_every_kind() {
        let storage = InMemoryStorage::new();
        storage.insert_record("a", json!({})).await.unwrap();
        storage.insert_record("b", json!({})).await.unwrap();
        storage.clear().await.unwrap();
        assert!(storage.list_records("a").await.unwrap().is_empty());
        assert!(storage.list_records("b").await.unwrap().is_empty());
    }
}
