//! Read-only detail views and confirmed deletion.

use super::{store_failure, Navigation};
use crate::config::CoreConfig;
use crate::error::{Action, PhrError, PhrResult};
use crate::record::{Record, RecordId};
use crate::schema::{EntitySchema, EntityType, FieldKind, FieldSpec, Visibility};
use crate::store::{with_deadline, RecordStore};
use std::sync::Arc;

/// One labelled value in a read view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetailRow {
    pub field: &'static str,
    pub label: &'static str,
    /// Display text, `"N/a"` when blank.
    pub value: String,
    /// True for fields revealed by "Show more".
    pub deferred: bool,
}

/// Read-only view of one record.
#[derive(Clone, Debug)]
pub struct DetailView {
    entity: EntityType,
    record: Record,
    show_more: bool,
}

impl DetailView {
    pub fn new(entity: EntityType, record: Record) -> Self {
        Self {
            entity,
            record,
            show_more: false,
        }
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.entity.schema()
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn id(&self) -> &RecordId {
        &self.record.id
    }

    pub fn title(&self) -> &str {
        self.schema().record_title(&self.record)
    }

    pub fn incomplete(&self) -> bool {
        self.schema().is_incomplete(&self.record)
    }

    pub fn show_more(&self) -> bool {
        self.show_more
    }

    pub fn toggle_show_more(&mut self) -> bool {
        self.show_more = !self.show_more;
        self.show_more
    }

    /// Rows to display, honouring "Show more" and conditional visibility.
    pub fn rows(&self) -> Vec<DetailRow> {
        self.schema()
            .fields
            .iter()
            .filter(|spec| match spec.visibility {
                Visibility::Always => true,
                Visibility::ShowMore => self.show_more,
                Visibility::When(condition) => {
                    condition.holds(&self.record.draft_text(condition.field))
                }
            })
            .map(|spec| DetailRow {
                field: spec.name,
                label: spec.label,
                value: display_value(spec, &self.record),
                deferred: spec.visibility == Visibility::ShowMore,
            })
            .collect()
    }

    /// Text of the confirmation prompt shown before deletion.
    pub fn delete_prompt(&self) -> String {
        let noun = match self.entity {
            EntityType::Surgeries => "surgery record",
            other => other.singular(),
        };
        format!("Are you sure you want to delete this {noun}?")
    }
}

/// Option labels stand in for stored option values where they differ.
fn display_value(spec: &FieldSpec, record: &Record) -> String {
    if spec.kind.has_options() {
        if let Some(label) = record.text(spec.name).and_then(|v| spec.option_label(v)) {
            return label.to_owned();
        }
    }
    if spec.kind == FieldKind::Toggle {
        return if record.flag(spec.name) { "Yes" } else { "No" }.to_owned();
    }
    record.display_or_blank(spec.name)
}

/// Result of a delete request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined; nothing was sent to the store.
    Cancelled,
    Deleted(Navigation),
}

/// Loads detail views and deletes records.
pub struct DetailController<S: ?Sized> {
    store: Arc<S>,
    cfg: Arc<CoreConfig>,
}

impl<S: RecordStore + ?Sized> DetailController<S> {
    pub fn new(store: Arc<S>, cfg: Arc<CoreConfig>) -> Self {
        Self { store, cfg }
    }

    /// Fetch one record for display.
    ///
    /// # Errors
    ///
    /// - `PhrError::NotFound` if no record has `id`; callers render a terminal
    ///   "<Entity> not found" state.
    /// - `PhrError::Store` if the fetch fails or times out.
    pub async fn load(&self, entity: EntityType, id: &RecordId) -> PhrResult<DetailView> {
        let record = with_deadline(entity, self.cfg.request_timeout(), self.store.get(entity, id))
            .await
            .map_err(|e| store_failure(Action::Fetch, entity, e))?;
        Ok(DetailView::new(entity, record))
    }

    /// Delete the viewed record after asking `confirm`.
    ///
    /// `confirm` receives the prompt text and blocks until the user answers. Declining
    /// returns [`DeleteOutcome::Cancelled`] without touching the store.
    ///
    /// # Errors
    ///
    /// Returns `PhrError::Store` with "Failed to delete <entity>" (or `PhrError::NotFound`)
    /// when the store call fails. The failure is logged and the view stays valid.
    pub async fn delete<F>(&self, view: &DetailView, confirm: F) -> PhrResult<DeleteOutcome>
    where
        F: FnOnce(&str) -> bool,
    {
        let entity = view.entity();
        if entity.is_singleton() {
            return Err(PhrError::InvalidInput(format!(
                "{entity} is a singleton and cannot be deleted"
            )));
        }

        if !confirm(&view.delete_prompt()) {
            tracing::debug!(collection = entity.collection(), id = %view.id(), "delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        with_deadline(
            entity,
            self.cfg.request_timeout(),
            self.store.delete(entity, view.id()),
        )
        .await
        .map_err(|e| store_failure(Action::Delete, entity, e))?;

        tracing::info!(collection = entity.collection(), id = %view.id(), "deleted record");
        Ok(DeleteOutcome::Deleted(Navigation::List { entity }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::{cfg, fields, store};
    use crate::store::StoreOp;
    use serde_json::json;

    #[tokio::test]
    async fn test_rows_split_by_show_more_with_placeholders() {
        let store = store();
        let record = store
            .seed(
                EntityType::Conditions,
                fields(json!({"name": "Asthma", "type": "chronic", "details": ""})),
            )
            .await;

        let mut view = DetailController::new(store, cfg())
            .load(EntityType::Conditions, &record.id)
            .await
            .unwrap();
        assert_eq!(view.title(), "Asthma");
        assert!(!view.incomplete());

        let rows = view.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].value, "Chronic");

        view.toggle_show_more();
        let rows = view.rows();
        assert_eq!(rows.len(), 4);
        let details = rows.iter().find(|r| r.field == "details").unwrap();
        assert_eq!(details.value, "N/a");
        assert!(details.deferred);
    }

    #[tokio::test]
    async fn test_load_missing_record_is_not_found() {
        let err = DetailController::new(store(), cfg())
            .load(EntityType::Documents, &RecordId::new("gone"))
            .await
            .expect_err("missing");
        assert_eq!(err.to_string(), "Document not found");
    }

    #[tokio::test]
    async fn test_declined_delete_makes_no_store_call() {
        let store = store();
        let record = store
            .seed(EntityType::Surgeries, fields(json!({"name": "Tonsillectomy"})))
            .await;
        let controller = DetailController::new(store.clone(), cfg());
        let view = controller.load(EntityType::Surgeries, &record.id).await.unwrap();

        let mut asked = None;
        let outcome = controller
            .delete(&view, |prompt| {
                asked = Some(prompt.to_owned());
                false
            })
            .await
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert_eq!(
            asked.as_deref(),
            Some("Are you sure you want to delete this surgery record?")
        );
        assert_eq!(store.calls(StoreOp::Delete), 0);
        assert_eq!(store.rows(EntityType::Surgeries).await.len(), 1);
    }

    #[tokio::test]
    async fn test_confirmed_delete_removes_and_navigates_to_list() {
        let store = store();
        let record = store
            .seed(EntityType::Medications, fields(json!({"name": "Aspirin"})))
            .await;
        let controller = DetailController::new(store.clone(), cfg());
        let view = controller.load(EntityType::Medications, &record.id).await.unwrap();
        assert!(view.incomplete());

        let outcome = controller.delete(&view, |_| true).await.unwrap();
        assert_eq!(
            outcome,
            DeleteOutcome::Deleted(Navigation::List {
                entity: EntityType::Medications
            })
        );
        assert!(store.rows(EntityType::Medications).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_is_surfaced() {
        let store = store();
        let record = store
            .seed(EntityType::Allergies, fields(json!({"name": "Latex"})))
            .await;
        let controller = DetailController::new(store.clone(), cfg());
        let view = controller.load(EntityType::Allergies, &record.id).await.unwrap();

        store.fail(StoreOp::Delete);
        let err = controller
            .delete(&view, |_| true)
            .await
            .expect_err("delete fails");
        assert_eq!(err.to_string(), "Failed to delete allergy");
        assert_eq!(store.rows(EntityType::Allergies).await.len(), 1);
    }

    #[test]
    fn test_delete_prompts_use_entity_nouns() {
        let record: Record = serde_json::from_value(json!({
            "id": 1, "created_at": "2024-01-01T00:00:00Z", "relative": "Aunt"
        }))
        .unwrap();
        let view = DetailView::new(EntityType::FamilyHistory, record);
        assert_eq!(
            view.delete_prompt(),
            "Are you sure you want to delete this family member?"
        );
        assert_eq!(view.title(), "Aunt");
    }
}
