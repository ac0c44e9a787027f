//! # PHR Core
//!
//! Core logic for the personal health record client.
//!
//! This crate holds everything between a screen and the hosted backend:
//! - Entity schemas and the registry describing each kind of health record
//! - The [`store::RecordStore`] seam with REST and in-memory implementations
//! - Generic controllers for lists, quick add, detail forms, detail views and singletons
//! - Display summaries for list cards and singleton sections
//!
//! **No API concerns**: HTTP servers and command-line front ends belong in `api-rest`,
//! `api-shared` and `phr-cli`.

pub mod config;
pub mod constants;
pub mod controllers;
pub mod error;
pub mod record;
pub mod registry;
pub mod schema;
pub mod store;
pub mod summary;

pub use config::{CoreConfig, StoreConfig};
pub use controllers::{
    BucketView, DeleteOutcome, DetailController, DetailForm, DetailRow, DetailView, Draft,
    FormMode, FormPhase, ListController, ListSnapshot, Navigation, QuickAddController,
    RecordCard, SingletonController,
};
pub use error::{Action, FieldErrors, PhrError, PhrResult, StoreError, StoreResult};
pub use phr_types::{NonEmptyText, TextError};
pub use record::{Fields, Record, RecordId};
pub use schema::{ChildGroup, EntitySchema, EntityType, FieldKind, FieldSpec, Visibility};
pub use store::{MemoryStore, RecordStore, RestStore, StoreOp};
pub use summary::SectionSummary;
