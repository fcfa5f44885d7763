use crate::common::error::Result;
use crate::domain::ExclusiveRule;
use async_trait::async_trait;
use serde_json::Value;

/// Document storage for content records.
///
/// Rows are JSON objects grouped by kind and addressed by an auto-increment
/// id. Implementations inject `"id"` into every object they return and ignore
/// any `"id"` found in the data they are given.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn insert_record(&self, kind: &str, data: Value) -> Result<i64>;

    /// Fails with `NotFound` when the row does not exist.
    async fn update_record(&self, kind: &str, id: i64, data: Value) -> Result<()>;

    async fn get_record(&self, kind: &str, id: i64) -> Result<Option<Value>>;

    /// Every row of the kind, ascending by id.
    async fn list_records(&self, kind: &str) -> Result<Vec<Value>>;

    /// Returns whether a row was removed.
    async fn delete_record(&self, kind: &str, id: i64) -> Result<bool>;

    /// Inserts (`id == None`) or updates a row and, when the row carries
    /// `rule.flag == true`, clears that flag on every other row of the kind
    /// sharing the same `rule.scope` value. Both steps commit together.
    async fn save_exclusive(
        &self,
        kind: &str,
        id: Option<i64>,
        data: Value,
        rule: &ExclusiveRule,
    ) -> Result<i64>;

    /// Removes every row of every kind.
    async fn clear(&self) -> Result<()>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()>;
}
