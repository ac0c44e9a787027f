//! In-memory [`RecordStore`] for tests.
//!
//! Counts calls per operation and can inject latency or failures.

use super::RecordStore;
use crate::error::{StoreError, StoreResult};
use crate::record::{Fields, Record, RecordId};
use crate::schema::EntityType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Store operations, used to count calls and inject failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Get,
    Insert,
    Update,
    Delete,
}

impl StoreOp {
    fn index(self) -> usize {
        self as usize
    }

    fn bit(self) -> u8 {
        1 << self.index()
    }
}

#[derive(Default)]
struct Rows {
    by_entity: HashMap<EntityType, Vec<Record>>,
    last_created: Option<DateTime<Utc>>,
}

/// In-process [`RecordStore`].
///
/// Rows live in memory with uuid ids and strictly increasing `created_at`. Every trait call is
/// counted per [`StoreOp`]; individual operations can be made to fail and all of them can be
/// slowed down, which lets controller tests observe store traffic and timeouts.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Rows>,
    calls: [AtomicU64; 5],
    failing: AtomicU8,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every trait call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes subsequent `op` calls fail with [`StoreError::Unavailable`].
    pub fn fail(&self, op: StoreOp) {
        self.failing.fetch_or(op.bit(), Ordering::SeqCst);
    }

    pub fn recover(&self, op: StoreOp) {
        self.failing.fetch_and(!op.bit(), Ordering::SeqCst);
    }

    /// Number of trait calls made for `op`, including failed ones.
    pub fn calls(&self, op: StoreOp) -> u64 {
        self.calls[op.index()].load(Ordering::SeqCst)
    }

    /// Inserts a row directly, bypassing counters, latency and failure injection.
    pub async fn seed(&self, entity: EntityType, fields: Fields) -> Record {
        let mut rows = self.rows.lock().await;
        insert_row(&mut rows, entity, fields)
    }

    /// Rows of `entity`, newest first, bypassing counters.
    pub async fn rows(&self, entity: EntityType) -> Vec<Record> {
        let rows = self.rows.lock().await;
        newest_first(&rows, entity)
    }

    async fn enter(&self, op: StoreOp) -> StoreResult<()> {
        self.calls[op.index()].fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::SeqCst) & op.bit() != 0 {
            return Err(StoreError::Unavailable(format!("{op:?} is failing")));
        }
        Ok(())
    }
}

fn newest_first(rows: &Rows, entity: EntityType) -> Vec<Record> {
    rows.by_entity
        .get(&entity)
        .map(|records| records.iter().rev().cloned().collect())
        .unwrap_or_default()
}

fn insert_row(rows: &mut Rows, entity: EntityType, fields: Fields) -> Record {
    let now = Utc::now();
    let created_at = match rows.last_created {
        Some(last) if now <= last => last + chrono::Duration::microseconds(1),
        _ => now,
    };
    rows.last_created = Some(created_at);

    let record = Record::new(
        RecordId::new(uuid::Uuid::new_v4().to_string()),
        created_at,
        fields,
    );
    rows.by_entity
        .entry(entity)
        .or_default()
        .push(record.clone());
    record
}

fn not_found(entity: EntityType, id: &RecordId) -> StoreError {
    StoreError::NotFound {
        collection: entity.collection(),
        id: id.clone(),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, entity: EntityType) -> StoreResult<Vec<Record>> {
        self.enter(StoreOp::List).await?;
        let rows = self.rows.lock().await;
        Ok(newest_first(&rows, entity))
    }

    async fn get(&self, entity: EntityType, id: &RecordId) -> StoreResult<Record> {
        self.enter(StoreOp::Get).await?;
        let rows = self.rows.lock().await;
        rows.by_entity
            .get(&entity)
            .and_then(|records| records.iter().find(|r| &r.id == id))
            .cloned()
            .ok_or_else(|| not_found(entity, id))
    }

    async fn insert(&self, entity: EntityType, fields: Fields) -> StoreResult<Record> {
        self.enter(StoreOp::Insert).await?;
        let mut rows = self.rows.lock().await;
        Ok(insert_row(&mut rows, entity, fields))
    }

    async fn update(&self, entity: EntityType, id: &RecordId, fields: Fields) -> StoreResult<()> {
        self.enter(StoreOp::Update).await?;
        let mut rows = self.rows.lock().await;
        let record = rows
            .by_entity
            .get_mut(&entity)
            .and_then(|records| records.iter_mut().find(|r| &r.id == id))
            .ok_or_else(|| not_found(entity, id))?;

        let patch = Record::new(record.id.clone(), record.created_at, fields);
        record.fields.extend(patch.fields);
        Ok(())
    }

    async fn delete(&self, entity: EntityType, id: &RecordId) -> StoreResult<()> {
        self.enter(StoreOp::Delete).await?;
        let mut rows = self.rows.lock().await;
        let records = rows
            .by_entity
            .get_mut(&entity)
            .ok_or_else(|| not_found(entity, id))?;
        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            return Err(not_found(entity, id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = MemoryStore::new();
        let first = store
            .insert(EntityType::Medications, fields(json!({"name": "A"})))
            .await
            .unwrap();
        let second = store
            .insert(EntityType::Medications, fields(json!({"name": "B"})))
            .await
            .unwrap();
        assert!(second.created_at > first.created_at);

        let listed = store.list(EntityType::Medications).await.unwrap();
        let names: Vec<&str> = listed.iter().filter_map(|r| r.text("name")).collect();
        assert_eq!(names, vec!["B", "A"]);

        let oldest = store.first(EntityType::Medications).await.unwrap();
        assert_eq!(oldest.map(|r| r.id), Some(first.id));
        assert_eq!(store.calls(StoreOp::List), 2);
    }

    #[tokio::test]
    async fn test_insert_then_get_round_trips() {
        let store = MemoryStore::new();
        let inserted = store
            .insert(
                EntityType::Allergies,
                fields(json!({"name": "Peanuts", "category": "other"})),
            )
            .await
            .unwrap();

        let fetched = store
            .get(EntityType::Allergies, &inserted.id)
            .await
            .unwrap();
        assert_eq!(fetched, inserted);
        assert_eq!(fetched.text("category"), Some("other"));
    }

    #[tokio::test]
    async fn test_update_merges_and_delete_removes() {
        let store = MemoryStore::new();
        let record = store
            .seed(
                EntityType::Supplements,
                fields(json!({"name": "Zinc", "dosage": "10mg"})),
            )
            .await;

        store
            .update(
                EntityType::Supplements,
                &record.id,
                fields(json!({"dosage": null, "frequency": "Daily", "id": "forged"})),
            )
            .await
            .unwrap();
        let updated = store.get(EntityType::Supplements, &record.id).await.unwrap();
        assert_eq!(updated.id, record.id);
        assert_eq!(updated.text("name"), Some("Zinc"));
        assert!(updated.is_blank("dosage"));
        assert_eq!(updated.text("frequency"), Some("Daily"));

        store.delete(EntityType::Supplements, &record.id).await.unwrap();
        let err = store
            .get(EntityType::Supplements, &record.id)
            .await
            .expect_err("deleted row");
        assert!(matches!(err, StoreError::NotFound { .. }));
        let err = store
            .delete(EntityType::Supplements, &record.id)
            .await
            .expect_err("already deleted");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_failure_injection_is_per_operation() {
        let store = MemoryStore::new();
        store.fail(StoreOp::Insert);
        let err = store
            .insert(EntityType::Conditions, Fields::new())
            .await
            .expect_err("insert should fail");
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(store.list(EntityType::Conditions).await.unwrap().is_empty());

        store.recover(StoreOp::Insert);
        store
            .insert(EntityType::Conditions, Fields::new())
            .await
            .expect("insert should succeed after recovery");
        assert_eq!(store.calls(StoreOp::Insert), 2);
    }
}
