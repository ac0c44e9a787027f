//! Newest-first list snapshots, grouped into buckets for display.

use super::store_failure;
use crate::config::CoreConfig;
use crate::error::{Action, PhrResult};
use crate::record::{Record, RecordId};
use crate::schema::{EntitySchema, EntityType};
use crate::store::{with_deadline, RecordStore};
use crate::PhrError;
use phr_types::NonEmptyText;
use std::sync::Arc;

/// Summary of one record as shown on a list card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordCard {
    pub id: RecordId,
    pub title: String,
    pub subtitle: Option<String>,
    pub incomplete: bool,
}

/// One group of cards on a partitioned list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketView {
    pub key: &'static str,
    pub label: &'static str,
    pub cards: Vec<RecordCard>,
}

/// Records of one entity, newest first, as last loaded.
#[derive(Clone, Debug)]
pub struct ListSnapshot {
    entity: EntityType,
    records: Vec<Record>,
}

impl ListSnapshot {
    pub fn new(entity: EntityType, mut records: Vec<Record>) -> Self {
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self { entity, records }
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.entity.schema()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Places a freshly inserted record at the top.
    pub(crate) fn prepend(&mut self, record: Record) {
        self.records.insert(0, record);
    }

    /// True when any record's title matches `title` ignoring case.
    pub fn contains_title(&self, title: &NonEmptyText) -> bool {
        let Some(field) = self.schema().title_field else {
            return false;
        };
        self.records
            .iter()
            .filter_map(|record| record.text(field))
            .any(|existing| title.eq_ignore_case(existing))
    }

    pub fn cards(&self) -> Vec<RecordCard> {
        let schema = self.schema();
        self.records.iter().map(|r| card(schema, r)).collect()
    }

    /// Cards grouped by the schema's partition.
    ///
    /// Buckets appear in fixed order with the fallback last; empty buckets are kept so a
    /// screen can render its headings. Unpartitioned entities yield a single bucket.
    pub fn buckets(&self) -> Vec<BucketView> {
        let schema = self.schema();
        let Some(partition) = schema.partition else {
            return vec![BucketView {
                key: "all",
                label: schema.title,
                cards: self.cards(),
            }];
        };

        let mut views: Vec<BucketView> = partition
            .buckets
            .iter()
            .chain(std::iter::once(&partition.fallback))
            .map(|bucket| BucketView {
                key: bucket.key,
                label: bucket.label,
                cards: Vec::new(),
            })
            .collect();

        for record in &self.records {
            let bucket = partition.bucket_for(record);
            if let Some(view) = views.iter_mut().find(|v| v.key == bucket.key) {
                view.cards.push(card(schema, record));
            }
        }
        views
    }
}

fn card(schema: &EntitySchema, record: &Record) -> RecordCard {
    RecordCard {
        id: record.id.clone(),
        title: schema.record_title(record).to_owned(),
        subtitle: schema.subtitle.and_then(|subtitle| subtitle(record)),
        incomplete: schema.is_incomplete(record),
    }
}

/// Loads list snapshots for collection entities.
pub struct ListController<S: ?Sized> {
    store: Arc<S>,
    cfg: Arc<CoreConfig>,
}

impl<S: RecordStore + ?Sized> ListController<S> {
    pub fn new(store: Arc<S>, cfg: Arc<CoreConfig>) -> Self {
        Self { store, cfg }
    }

    /// Fetch all records of `entity`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `PhrError::InvalidInput` for singleton entities and `PhrError::Store` with
    /// "Failed to fetch <entities>" when the store call fails or times out.
    pub async fn load(&self, entity: EntityType) -> PhrResult<ListSnapshot> {
        if entity.is_singleton() {
            return Err(PhrError::InvalidInput(format!(
                "{entity} is a singleton and has no list"
            )));
        }

        let records = with_deadline(entity, self.cfg.request_timeout(), self.store.list(entity))
            .await
            .map_err(|e| store_failure(Action::FetchList, entity, e))?;

        tracing::debug!(collection = entity.collection(), count = records.len(), "loaded list");
        Ok(ListSnapshot::new(entity, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::{cfg, fields, short_timeout, store};
    use crate::store::{MemoryStore, StoreOp};
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_load_returns_newest_first_with_incomplete_flags() {
        let store = store();
        store
            .seed(
                EntityType::Medications,
                fields(json!({"name": "Aspirin", "dosage": "81mg", "frequency": "1 time a day"})),
            )
            .await;
        store
            .seed(EntityType::Medications, fields(json!({"name": "Metformin"})))
            .await;

        let controller = ListController::new(store.clone(), cfg());
        let snapshot = controller.load(EntityType::Medications).await.unwrap();

        let cards = snapshot.cards();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].title, "Metformin");
        assert!(cards[0].incomplete);
        assert_eq!(cards[0].subtitle, None);
        assert_eq!(cards[1].title, "Aspirin");
        assert!(!cards[1].incomplete);
        assert_eq!(cards[1].subtitle.as_deref(), Some("81mg, 1 time a day"));
    }

    #[tokio::test]
    async fn test_conditions_partition_in_fixed_order() {
        let store = store();
        for (name, kind) in [
            ("Asthma", json!("chronic")),
            ("Flu", json!("transient_resolved")),
            ("Migraine", json!("transient_recurrent")),
            ("Rash", json!(null)),
        ] {
            store
                .seed(EntityType::Conditions, fields(json!({"name": name, "type": kind})))
                .await;
        }

        let snapshot = ListController::new(store, cfg())
            .load(EntityType::Conditions)
            .await
            .unwrap();
        let buckets = snapshot.buckets();
        let keys: Vec<&str> = buckets.iter().map(|b| b.key).collect();
        assert_eq!(keys, vec!["chronic", "transient", "unclassified"]);

        let titles = |i: usize| -> Vec<String> {
            buckets[i].cards.iter().map(|c| c.title.clone()).collect()
        };
        assert_eq!(titles(0), vec!["Asthma"]);
        assert_eq!(titles(1), vec!["Migraine", "Flu"]);
        assert_eq!(titles(2), vec!["Rash"]);
        assert!(buckets[2].cards[0].incomplete);
    }

    #[tokio::test]
    async fn test_unpartitioned_entities_have_one_bucket() {
        let store = store();
        store
            .seed(EntityType::Surgeries, fields(json!({"name": "Appendectomy"})))
            .await;
        let snapshot = ListController::new(store, cfg())
            .load(EntityType::Surgeries)
            .await
            .unwrap();
        let buckets = snapshot.buckets();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].label, "Surgeries");
        assert_eq!(buckets[0].cards.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_reports_plural_message() {
        let store = store();
        store.fail(StoreOp::List);
        let err = ListController::new(store, cfg())
            .load(EntityType::Allergies)
            .await
            .expect_err("list should fail");
        assert_eq!(err.to_string(), "Failed to fetch allergies");
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(200)));
        let err = ListController::new(store, short_timeout())
            .load(EntityType::Medications)
            .await
            .expect_err("should time out");
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Failed to fetch medications");
    }

    #[tokio::test]
    async fn test_singletons_have_no_list() {
        let err = ListController::new(store(), cfg())
            .load(EntityType::SocialHistory)
            .await
            .expect_err("singleton list");
        assert!(matches!(err, PhrError::InvalidInput(_)));
    }

    #[test]
    fn test_contains_title_ignores_case() {
        let record: Record = serde_json::from_value(json!({
            "id": 1, "created_at": "2024-01-01T00:00:00Z", "name": "Aspirin"
        }))
        .unwrap();
        let snapshot = ListSnapshot::new(EntityType::Medications, vec![record]);
        assert!(snapshot.contains_title(&NonEmptyText::new("aspirin").unwrap()));
        assert!(!snapshot.contains_title(&NonEmptyText::new("Tylenol").unwrap()));
    }
}
