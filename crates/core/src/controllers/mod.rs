//! Generic screen controllers.
//!
//! Each controller is parameterised by an [`EntityType`] and drives one kind of screen for
//! every entity the registry describes:
//!
//! - [`ListController`] loads a newest-first snapshot and groups it for display.
//! - [`QuickAddController`] inserts a record from a single name field.
//! - [`DetailForm`] edits a full record (or one singleton section) with validation.
//! - [`DetailController`] loads a read-only view and performs confirmed deletion.
//! - [`SingletonController`] finds or creates the one row of a singleton entity.
//!
//! Controllers hold an `Arc` to the store and to [`CoreConfig`](crate::config::CoreConfig);
//! every store call is bounded by the configured request timeout.

mod detail;
mod form;
mod list;
mod quick_add;
mod singleton;

pub use detail::{DeleteOutcome, DetailController, DetailRow, DetailView};
pub use form::{DetailForm, Draft, FormMode, FormPhase};
pub use list::{BucketView, ListController, ListSnapshot, RecordCard};
pub use quick_add::QuickAddController;
pub use singleton::SingletonController;

use crate::error::{Action, PhrError, StoreError};
use crate::record::RecordId;
use crate::schema::EntityType;
use serde::Serialize;

/// Screen the caller should show after a successful operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Navigation {
    List { entity: EntityType },
    Detail { entity: EntityType, id: RecordId },
    Singleton { entity: EntityType },
}

/// Converts a store failure into the user-facing error for `action`.
///
/// Missing rows become [`PhrError::NotFound`]; everything else keeps the store error as its
/// source behind a fixed message.
pub(crate) fn store_failure(action: Action, entity: EntityType, err: StoreError) -> PhrError {
    match err {
        StoreError::NotFound { id, .. } => PhrError::NotFound(entity, id),
        other => {
            tracing::error!(
                collection = entity.collection(),
                ?action,
                error = %other,
                "store call failed"
            );
            PhrError::store(action, entity, other)
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::CoreConfig;
    use crate::record::Fields;
    use crate::store::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    pub fn cfg() -> Arc<CoreConfig> {
        Arc::new(CoreConfig::new(Duration::from_secs(2)).expect("valid config"))
    }

    pub fn short_timeout() -> Arc<CoreConfig> {
        Arc::new(CoreConfig::new(Duration::from_millis(20)).expect("valid config"))
    }

    pub fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new())
    }

    pub fn fields(value: serde_json::Value) -> Fields {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }
}
