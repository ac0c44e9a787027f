use crate::record::RecordId;
use crate::schema::EntityType;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Failures reported by a [`RecordStore`](crate::store::RecordStore) implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no {collection} row with id {id}")]
    NotFound {
        collection: &'static str,
        id: RecordId,
    },
    #[error("request to {collection} timed out after {limit:?}")]
    Timeout {
        collection: &'static str,
        limit: Duration,
    },
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("store rejected request with status {status}: {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("failed to decode store response: {0}")]
    Decode(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Store operation a controller was performing when it failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Add,
    Update,
    Delete,
    Fetch,
    FetchList,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Fetch | Action::FetchList => "fetch",
        }
    }
}

/// Field-scoped validation messages keyed by field name.
///
/// The distinguished [`SUBMIT_ERROR_FIELD`](crate::constants::SUBMIT_ERROR_FIELD) key carries
/// whole-form failures.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.0.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.0.values().map(String::as_str).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Errors surfaced by the PHR controllers.
///
/// Every store failure is converted into one of these kinds at the controller boundary, so
/// the `Display` text is always a short message suitable for showing to the user.
#[derive(Debug, thiserror::Error)]
pub enum PhrError {
    #[error("{0}")]
    Validation(FieldErrors),

    #[error("This {} already exists", .0.singular())]
    Duplicate(EntityType),

    #[error("{} not found", .0.display_name())]
    NotFound(EntityType, RecordId),

    #[error("{message}")]
    Store {
        action: Action,
        entity: EntityType,
        message: String,
        #[source]
        source: StoreError,
    },

    #[error("Deleting this {} requires confirmation", .0.singular())]
    ConfirmationRequired(EntityType),

    #[error("unknown entity type: {0}")]
    UnknownEntity(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PhrError {
    /// Wraps a store failure with the fixed "Failed to <action> <entity>" message.
    pub fn store(action: Action, entity: EntityType, source: StoreError) -> Self {
        let noun = match action {
            Action::FetchList => entity.plural(),
            _ => entity.singular(),
        };
        PhrError::Store {
            action,
            entity,
            message: format!("Failed to {} {}", action.verb(), noun),
            source,
        }
    }

    /// True when the underlying store call ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            PhrError::Store {
                source: StoreError::Timeout { .. },
                ..
            }
        )
    }
}

pub type PhrResult<T> = std::result::Result<T, PhrError>;
