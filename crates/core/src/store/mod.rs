//! Record store adapter.
//!
//! [`RecordStore`] is the single seam between the controllers and the hosted backend. The
//! production implementation is [`RestStore`]; [`MemoryStore`] backs tests and local runs.

mod memory;
mod rest;

pub use memory::{MemoryStore, StoreOp};
pub use rest::RestStore;

use crate::error::{StoreError, StoreResult};
use crate::record::{Fields, Record, RecordId};
use crate::schema::EntityType;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// CRUD access to entity collections.
///
/// Implementations must return lists newest-first by `created_at`, assign `id` and
/// `created_at` on insert, and report missing rows as [`StoreError::NotFound`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All rows of `entity`, newest first.
    async fn list(&self, entity: EntityType) -> StoreResult<Vec<Record>>;

    async fn get(&self, entity: EntityType, id: &RecordId) -> StoreResult<Record>;

    /// Inserts a row and returns it with its store-assigned `id` and `created_at`.
    async fn insert(&self, entity: EntityType, fields: Fields) -> StoreResult<Record>;

    /// Overwrites the given fields of one row. Fields not named are left untouched.
    async fn update(&self, entity: EntityType, id: &RecordId, fields: Fields) -> StoreResult<()>;

    async fn delete(&self, entity: EntityType, id: &RecordId) -> StoreResult<()>;

    /// The oldest row of `entity`, if any. Used for singleton lookups.
    async fn first(&self, entity: EntityType) -> StoreResult<Option<Record>> {
        Ok(self.list(entity).await?.pop())
    }

    /// Rows of `entity` whose `field` equals `value`, newest first.
    async fn list_where(
        &self,
        entity: EntityType,
        field: &str,
        value: &str,
    ) -> StoreResult<Vec<Record>> {
        let mut rows = self.list(entity).await?;
        rows.retain(|record| record.draft_text(field) == value);
        Ok(rows)
    }

    /// Deletes every row of `entity` whose `field` equals `value` and returns how many went.
    /// Matching nothing is not an error.
    async fn delete_where(
        &self,
        entity: EntityType,
        field: &str,
        value: &str,
    ) -> StoreResult<usize> {
        let rows = self.list_where(entity, field, value).await?;
        for record in &rows {
            self.delete(entity, &record.id).await?;
        }
        Ok(rows.len())
    }
}

/// Bounds a store call by `limit`, mapping expiry to [`StoreError::Timeout`].
///
/// The pending call is dropped on expiry, which cancels any in-flight request.
pub async fn with_deadline<T, F>(entity: EntityType, limit: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                collection = entity.collection(),
                limit_ms = limit.as_millis() as u64,
                "store call timed out"
            );
            Err(StoreError::Timeout {
                collection: entity.collection(),
                limit,
            })
        }
    }
}
