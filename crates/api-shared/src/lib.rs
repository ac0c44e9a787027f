//! # API Shared
//!
//! Shared definitions for the PHR front ends.
//!
//! Contains:
//! - Wire DTOs (`dto` module) used by the REST API
//! - Shared services like `HealthService`
//!
//! Kept free of core dependencies so clients can depend on it alone.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::{HealthRes, HealthService};
