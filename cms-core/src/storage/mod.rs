//! Record persistence.
//!
//! [`Storage`] moves JSON documents; the free functions in this module add
//! the typed layer on top: timestamps, `before_save` hooks, validation, and
//! routing of singleton kinds through [`Storage::save_exclusive`].

pub mod document;
pub mod in_memory;
pub mod traits;

#[cfg(feature = "db")]
pub mod database;

pub use in_memory::InMemoryStorage;
pub use traits::Storage;

#[cfg(feature = "db")]
pub use database::DatabaseStorage;

use crate::common::error::{CmsError, Result};
use crate::domain::Record;
use chrono::Utc;
use serde_json::Value;

pub fn decode<T: Record>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

/// Inserts or updates `record` (by `meta.id`, 0 meaning new) and writes the
/// assigned id back into it.
pub async fn save<T: Record>(storage: &dyn Storage, record: &mut T) -> Result<i64> {
    record.before_save();
    record.validate()?;

    let now = Utc::now();
    let meta = record.meta_mut();
    if meta.created_at.is_none() {
        meta.created_at = Some(now);
    }
    meta.updated_at = Some(now);

    let existing = match record.id() {
        0 => None,
        id => Some(id),
    };
    let data = serde_json::to_value(&*record)?;

    let id = match (T::EXCLUSIVE, existing) {
        (Some(rule), _) => storage.save_exclusive(T::KIND, existing, data, &rule).await?,
        (None, Some(id)) => {
            storage.update_record(T::KIND, id, data).await?;
            id
        }
        (None, None) => storage.insert_record(T::KIND, data).await?,
    };

    record.meta_mut().id = id;
    Ok(id)
}

pub async fn get<T: Record>(storage: &dyn Storage, id: i64) -> Result<Option<T>> {
    storage
        .get_record(T::KIND, id)
        .await?
        .map(decode::<T>)
        .transpose()
}

/// Like [`get`], but a missing row is `NotFound`.
pub async fn require<T: Record>(storage: &dyn Storage, id: i64) -> Result<T> {
    get::<T>(storage, id).await?.ok_or_else(|| CmsError::NotFound {
        kind: T::KIND.to_string(),
        id,
    })
}

pub async fn get_active<T: Record>(storage: &dyn Storage, id: i64) -> Result<Option<T>> {
    Ok(get::<T>(storage, id).await?.filter(|r| r.is_active()))
}

/// Every row, ascending by id.
pub async fn list<T: Record>(storage: &dyn Storage) -> Result<Vec<T>> {
    storage
        .list_records(T::KIND)
        .await?
        .into_iter()
        .map(decode::<T>)
        .collect()
}

pub async fn list_active<T: Record>(storage: &dyn Storage) -> Result<Vec<T>> {
    let mut rows = list::<T>(storage).await?;
    rows.retain(|r| r.is_active());
    Ok(rows)
}

/// Active rows, most recently updated first.
pub async fn list_active_newest<T: Record>(storage: &dyn Storage) -> Result<Vec<T>> {
    let mut rows = list_active::<T>(storage).await?;
    rows.sort_by(|a, b| {
        (b.meta().updated_at, b.id()).cmp(&(a.meta().updated_at, a.id()))
    });
    Ok(rows)
}

/// The most recently updated active row.
pub async fn first_active<T: Record>(storage: &dyn Storage) -> Result<Option<T>> {
    Ok(list_active_newest::<T>(storage).await?.into_iter().next())
}

/// Deactivates the row and stamps `deleted_at` for soft-deletable kinds,
/// removes it otherwise. Returns whether the row existed.
pub async fn delete<T: Record>(storage: &dyn Storage, id: i64) -> Result<bool> {
    if !T::SOFT_DELETE {
        return storage.delete_record(T::KIND, id).await;
    }

    let Some(mut record) = get::<T>(storage, id).await? else {
        return Ok(false);
    };
    let meta = record.meta_mut();
    meta.is_active = false;
    meta.deleted_at = Some(Utc::now());
    save(storage, &mut record).await?;
    Ok(true)
}

/// Reactivates a soft-deleted row. For singleton kinds this deactivates the
/// row that was active until now.
pub async fn restore<T: Record>(storage: &dyn Storage, id: i64) -> Result<T> {
    let mut record = require::<T>(storage, id).await?;
    let meta = record.meta_mut();
    meta.is_active = true;
    meta.deleted_at = None;
    save(storage, &mut record).await?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::*;

    #[tokio::test]
    async fn save_assigns_id_and_timestamps() {
        let storage = InMemoryStorage::new();
        let mut hero = Hero {
            title: "Bienvenidos".to_string(),
            ..Default::default()
        };
        let id = save(&storage, &mut hero).await.unwrap();
        assert_eq!(hero.meta.id, id);
        assert!(hero.meta.created_at.is_some());

        let stored: Hero = require(&storage, id).await.unwrap();
        assert_eq!(stored.title, "Bienvenidos");
        assert_eq!(stored.meta.created_at, hero.meta.created_at);
    }

    #[tokio::test]
    async fn singleton_kinds_keep_one_active_row() {
        let storage = InMemoryStorage::new();
        for title in ["Uno", "Dos", "Tres"] {
            let mut config = PolicyConfig {
                title: title.to_string(),
                ..Default::default()
            };
            save(&storage, &mut config).await.unwrap();
        }
        let active = list_active::<PolicyConfig>(&storage).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "Tres");
        assert_eq!(list::<PolicyConfig>(&storage).await.unwrap().len(), 3);
    }

    async fn assert_one_active<T: Record + Default>(storage: &InMemoryStorage) {
        let mut ids = Vec::new();
        for _ in 0..2 {
            ids.push(save(storage, &mut T::default()).await.unwrap());
        }
        let active = list_active::<T>(storage).await.unwrap();
        assert_eq!(active.len(), 1, "{}", T::KIND);
        assert_eq!(active[0].id(), ids[1], "{}", T::KIND);
    }

    #[tokio::test]
    async fn every_singleton_kind_keeps_one_active_row() {
        let storage = InMemoryStorage::new();
        assert_one_active::<FinancialStatementsConfig>(&storage).await;
        assert_one_active::<MemoryConfig>(&storage).await;
        assert_one_active::<PolicyConfig>(&storage).await;
        assert_one_active::<ExchangeRate>(&storage).await;
        assert_one_active::<EducationSection>(&storage).await;
        assert_one_active::<PeKeAccountSummary>(&storage).await;
        assert_one_active::<ProductSection>(&storage).await;
        assert_one_active::<ServicesPage>(&storage).await;
        assert_one_active::<AbandonedAccountsSection>(&storage).await;
        assert_one_active::<AccountContractsSection>(&storage).await;
        assert_one_active::<ServiceRatesPage>(&storage).await;
        assert_one_active::<RightsAndDutiesPage>(&storage).await;
        assert_one_active::<SuggestionBoxPage>(&storage).await;
        assert_one_active::<FraudReportPage>(&storage).await;
        assert_one_active::<ClaimRequestPage>(&storage).await;
    }

    #[tokio::test]
    async fn email_configuration_is_exclusive_on_default_flag() {
        let storage = InMemoryStorage::new();
        let mut first = EmailConfiguration {
            name: "Primaria".to_string(),
            is_default: true,
            ..Default::default()
        };
        save(&storage, &mut first).await.unwrap();
        let mut second = EmailConfiguration {
            name: "Respaldo".to_string(),
            is_default: true,
            ..Default::default()
        };
        save(&storage, &mut second).await.unwrap();

        let rows = list::<EmailConfiguration>(&storage).await.unwrap();
        assert_eq!(rows.iter().filter(|c| c.is_default).count(), 1);
        assert_eq!(rows.iter().filter(|c| c.is_active()).count(), 2);
    }

    #[tokio::test]
    async fn validation_failure_does_not_persist() {
        let storage = InMemoryStorage::new();
        let mut claim = ClaimRequest::default();
        let err = save(&storage, &mut claim).await.unwrap_err();
        assert!(matches!(err, CmsError::Validation(_)));
        assert!(list::<ClaimRequest>(&storage).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn soft_delete_and_restore() {
        let storage = InMemoryStorage::new();
        let mut valor = Valor {
            title: "Integridad".to_string(),
            ..Default::default()
        };
        let id = save(&storage, &mut valor).await.unwrap();

        assert!(delete::<Valor>(&storage, id).await.unwrap());
        let deleted: Valor = require(&storage, id).await.unwrap();
        assert!(!deleted.is_active());
        assert!(deleted.meta.deleted_at.is_some());
        assert!(get_active::<Valor>(&storage, id).await.unwrap().is_none());

        let restored = restore::<Valor>(&storage, id).await.unwrap();
        assert!(restored.is_active());
        assert!(restored.meta.deleted_at.is_none());
    }

    #[tokio::test]
    async fn hard_delete_for_email_logs() {
        let storage = InMemoryStorage::new();
        let mut log = EmailLog::default();
        let id = save(&storage, &mut log).await.unwrap();
        assert!(delete::<EmailLog>(&storage, id).await.unwrap());
        assert!(get::<EmailLog>(&storage, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn first_active_prefers_latest_update() {
        let storage = InMemoryStorage::new();
        let mut older = Mision {
            title: "Antigua".to_string(),
            ..Default::default()
        };
        save(&storage, &mut older).await.unwrap();
        let mut newer = Mision {
            title: "Nueva".to_string(),
            ..Default::default()
        };
        save(&storage, &mut newer).await.unwrap();

        let first = first_active::<Mision>(&storage).await.unwrap().unwrap();
        assert_eq!(first.title, "Nueva");
    }
}
