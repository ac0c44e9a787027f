//! Constants used throughout the PHR core crate.
//!
//! Fixed user-facing strings and wire names live here so every entity screen renders the
//! same wording.

/// Default bound on a single store call when no explicit timeout is configured.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Path segment under the store base URL where collections are served.
pub const REST_PATH_PREFIX: &str = "rest/v1/";

/// Wire name of the store-assigned identifier column.
pub const ID_FIELD: &str = "id";

/// Wire name of the store-assigned creation timestamp column.
pub const CREATED_AT_FIELD: &str = "created_at";

/// Pseudo-field carrying whole-form failures in a form's error map.
pub const SUBMIT_ERROR_FIELD: &str = "submit";

/// Suffix appended to a field label when a required value is missing.
pub const INCOMPLETE_SUFFIX: &str = "(Incomplete)";

/// Placeholder shown for blank values in a read view.
pub const BLANK_DISPLAY: &str = "N/a";

/// Placeholder shown for unset singleton sections.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Accepted date format for date fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
