//! Finding or creating the single row of a singleton entity.

use super::store_failure;
use crate::config::CoreConfig;
use crate::error::{Action, PhrError, PhrResult};
use crate::record::{Fields, Record};
use crate::schema::EntityType;
use crate::store::{with_deadline, RecordStore};
use crate::summary::{section_summaries, SectionSummary};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Finds or creates the single row of a singleton entity.
///
/// Concurrent loads of the same entity through one controller are serialised so that only
/// one of them can create the row. Share the controller (e.g. behind an `Arc`) rather than
/// building one per request.
pub struct SingletonController<S: ?Sized> {
    store: Arc<S>,
    cfg: Arc<CoreConfig>,
    guards: HashMap<EntityType, Mutex<()>>,
}

impl<S: RecordStore + ?Sized> SingletonController<S> {
    pub fn new(store: Arc<S>, cfg: Arc<CoreConfig>) -> Self {
        let guards = EntityType::ALL
            .into_iter()
            .filter(|entity| entity.is_singleton())
            .map(|entity| (entity, Mutex::new(())))
            .collect();
        Self { store, cfg, guards }
    }

    /// Returns the entity's row, inserting an empty one if none exists.
    ///
    /// # Errors
    ///
    /// - `PhrError::InvalidInput` if `entity` is not a singleton.
    /// - `PhrError::Store` with "Failed to fetch <entity>" or "Failed to add <entity>" if
    ///   the lookup or creation fails or times out.
    pub async fn load(&self, entity: EntityType) -> PhrResult<Record> {
        let guard = self.guards.get(&entity).ok_or_else(|| {
            PhrError::InvalidInput(format!("{entity} is not a singleton entity"))
        })?;
        let _held = guard.lock().await;
        let limit = self.cfg.request_timeout();

        let existing = with_deadline(entity, limit, self.store.first(entity))
            .await
            .map_err(|e| store_failure(Action::Fetch, entity, e))?;
        if let Some(record) = existing {
            return Ok(record);
        }

        let record = with_deadline(entity, limit, self.store.insert(entity, Fields::new()))
            .await
            .map_err(|e| store_failure(Action::Add, entity, e))?;
        tracing::info!(collection = entity.collection(), id = %record.id, "created singleton row");
        Ok(record)
    }

    /// Loads the row and renders every section summary.
    pub async fn summaries(&self, entity: EntityType) -> PhrResult<(Record, Vec<SectionSummary>)> {
        let record = self.load(entity).await?;
        let summaries = section_summaries(entity.schema(), &record);
        Ok((record, summaries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::{cfg, fields, store};
    use crate::store::{MemoryStore, StoreOp};
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_load_creates_empty_row_once() {
        let store = store();
        let controller = SingletonController::new(store.clone(), cfg());

        let first = controller.load(EntityType::SocialHistory).await.unwrap();
        let second = controller.load(EntityType::SocialHistory).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(first.fields.is_empty());
        assert_eq!(store.calls(StoreOp::Insert), 1);
    }

    #[tokio::test]
    async fn test_load_returns_existing_row() {
        let store = store();
        let existing = store
            .seed(
                EntityType::PersonalInformation,
                fields(json!({"first_name": "Ada"})),
            )
            .await;

        let (record, summaries) = SingletonController::new(store.clone(), cfg())
            .summaries(EntityType::PersonalInformation)
            .await
            .unwrap();
        assert_eq!(record.id, existing.id);
        assert_eq!(summaries[0].key, "name");
        assert_eq!(summaries[0].text, "Ada");
        assert_eq!(store.calls(StoreOp::Insert), 0);
    }

    #[tokio::test]
    async fn test_concurrent_loads_create_a_single_row() {
        let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(20)));
        let controller = Arc::new(SingletonController::new(store.clone(), cfg()));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let controller = controller.clone();
            handles.push(tokio::spawn(async move {
                controller.load(EntityType::SocialHistory).await
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.expect("task").expect("load").id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.rows(EntityType::SocialHistory).await.len(), 1);
    }

    #[tokio::test]
    async fn test_collection_entities_are_rejected() {
        let err = SingletonController::new(store(), cfg())
            .load(EntityType::Medications)
            .await
            .expect_err("not a singleton");
        assert!(matches!(err, PhrError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_creation_failure_is_reported() {
        let store = store();
        store.fail(StoreOp::Insert);
        let err = SingletonController::new(store, cfg())
            .load(EntityType::PersonalInformation)
            .await
            .expect_err("insert fails");
        assert_eq!(err.to_string(), "Failed to add personal information");
    }
}
