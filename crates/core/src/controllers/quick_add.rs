//! Adding a record from its name alone, with duplicate detection.

use super::list::ListSnapshot;
use super::store_failure;
use crate::config::CoreConfig;
use crate::error::{Action, PhrError, PhrResult};
use crate::record::{Fields, Record};
use crate::store::{with_deadline, RecordStore};
use phr_types::NonEmptyText;
use serde_json::Value;
use std::sync::Arc;

/// Inserts a record from a single name on a list screen.
pub struct QuickAddController<S: ?Sized> {
    store: Arc<S>,
    cfg: Arc<CoreConfig>,
}

impl<S: RecordStore + ?Sized> QuickAddController<S> {
    pub fn new(store: Arc<S>, cfg: Arc<CoreConfig>) -> Self {
        Self { store, cfg }
    }

    /// Adds a record named by `input` to the snapshot's entity.
    ///
    /// Blank input is a no-op and returns `Ok(None)`. On success the new record is placed at
    /// the top of `snapshot` and `input` is cleared. On any failure `input` is left as typed
    /// so the user can retry.
    ///
    /// # Errors
    ///
    /// - `PhrError::InvalidInput` if the entity does not support quick add.
    /// - `PhrError::Duplicate` if the snapshot already holds a record with the same name,
    ///   ignoring case. No store call is made.
    /// - `PhrError::Store` with "Failed to add <entity>" if the insert fails or times out.
    pub async fn submit(
        &self,
        snapshot: &mut ListSnapshot,
        input: &mut String,
    ) -> PhrResult<Option<Record>> {
        let entity = snapshot.entity();
        let schema = entity.schema();
        let title_field = match schema.title_field {
            Some(field) if schema.quick_add => field,
            _ => {
                return Err(PhrError::InvalidInput(format!(
                    "{entity} does not support quick add"
                )))
            }
        };

        let Ok(name) = NonEmptyText::new(input.as_str()) else {
            return Ok(None);
        };

        if snapshot.contains_title(&name) {
            tracing::info!(collection = entity.collection(), "quick add rejected as duplicate");
            return Err(PhrError::Duplicate(entity));
        }

        let mut fields = Fields::new();
        fields.insert(title_field.to_owned(), Value::String(name.into_inner()));

        let record = with_deadline(
            entity,
            self.cfg.request_timeout(),
            self.store.insert(entity, fields),
        )
        .await
        .map_err(|e| store_failure(Action::Add, entity, e))?;

        tracing::info!(collection = entity.collection(), id = %record.id, "quick added record");
        snapshot.prepend(record.clone());
        input.clear();
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::{cfg, fields, store};
    use crate::controllers::ListController;
    use crate::schema::EntityType;
    use crate::store::StoreOp;
    use serde_json::json;

    #[tokio::test]
    async fn test_quick_add_prepends_and_clears_input() {
        let store = store();
        store
            .seed(EntityType::Medications, fields(json!({"name": "Aspirin"})))
            .await;
        let mut snapshot = ListController::new(store.clone(), cfg())
            .load(EntityType::Medications)
            .await
            .unwrap();

        let controller = QuickAddController::new(store.clone(), cfg());
        let mut input = "  Ibuprofen ".to_string();
        let added = controller
            .submit(&mut snapshot, &mut input)
            .await
            .expect("quick add")
            .expect("record inserted");

        assert_eq!(added.text("name"), Some("Ibuprofen"));
        assert!(input.is_empty());
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.records()[0].id, added.id);
        assert_eq!(store.rows(EntityType::Medications).await.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_input_is_a_no_op() {
        let store = store();
        let mut snapshot = ListSnapshot::new(EntityType::Supplements, Vec::new());
        let mut input = "   ".to_string();

        let result = QuickAddController::new(store.clone(), cfg())
            .submit(&mut snapshot, &mut input)
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(input, "   ");
        assert_eq!(store.calls(StoreOp::Insert), 0);
    }

    #[tokio::test]
    async fn test_duplicate_name_makes_no_store_call() {
        let store = store();
        store
            .seed(EntityType::Allergies, fields(json!({"name": "Aspirin"})))
            .await;
        let mut snapshot = ListController::new(store.clone(), cfg())
            .load(EntityType::Allergies)
            .await
            .unwrap();

        let mut input = "aspirin".to_string();
        let err = QuickAddController::new(store.clone(), cfg())
            .submit(&mut snapshot, &mut input)
            .await
            .expect_err("duplicate");
        assert_eq!(err.to_string(), "This allergy already exists");
        assert_eq!(input, "aspirin");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.calls(StoreOp::Insert), 0);
    }

    #[tokio::test]
    async fn test_store_failure_keeps_input() {
        let store = store();
        store.fail(StoreOp::Insert);
        let mut snapshot = ListSnapshot::new(EntityType::Conditions, Vec::new());
        let mut input = "Asthma".to_string();

        let err = QuickAddController::new(store.clone(), cfg())
            .submit(&mut snapshot, &mut input)
            .await
            .expect_err("insert fails");
        assert_eq!(err.to_string(), "Failed to add condition");
        assert_eq!(input, "Asthma");
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_entities_without_quick_add_are_rejected() {
        let mut snapshot = ListSnapshot::new(EntityType::Surgeries, Vec::new());
        let mut input = "Appendectomy".to_string();
        let err = QuickAddController::new(store(), cfg())
            .submit(&mut snapshot, &mut input)
            .await
            .expect_err("no quick add");
        assert!(matches!(err, PhrError::InvalidInput(_)));
    }
}
