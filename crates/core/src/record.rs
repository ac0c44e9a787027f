//! Stored rows and their field values.
//!
//! A [`Record`] is the JSON object the backend returns for one row: the store-assigned `id`
//! and `created_at` plus entity-specific fields. Field values stay as loose JSON because the
//! backend may hand back numbers, strings, booleans or nulls for the same column over time.

use crate::constants::{BLANK_DISPLAY, CREATED_AT_FIELD, ID_FIELD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entity-specific field values keyed by wire name.
pub type Fields = serde_json::Map<String, Value>;

/// Opaque store-assigned record identifier.
///
/// The backend may assign numeric or textual ids; both are held as text so callers never
/// depend on the representation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Integer(i64),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Text(s) if s.trim().is_empty() => {
                Err(serde::de::Error::custom("record id cannot be empty"))
            }
            Wire::Text(s) => Ok(Self(s)),
            Wire::Integer(n) => Ok(Self(n.to_string())),
        }
    }
}

/// One stored row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Builds a record, dropping any store-assigned keys smuggled in through `fields`.
    pub fn new(id: RecordId, created_at: DateTime<Utc>, mut fields: Fields) -> Self {
        fields.remove(ID_FIELD);
        fields.remove(CREATED_AT_FIELD);
        Self {
            id,
            created_at,
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns the trimmed text of a string field, or `None` when absent, null or blank.
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    /// A field is blank when absent, null, or whitespace-only text.
    pub fn is_blank(&self, field: &str) -> bool {
        self.fields.get(field).is_none_or(value_is_blank)
    }

    /// Renders a field for display, or `None` when blank.
    pub fn display(&self, field: &str) -> Option<String> {
        self.fields.get(field).and_then(render_scalar)
    }

    /// Renders a field for display, falling back to [`BLANK_DISPLAY`].
    pub fn display_or_blank(&self, field: &str) -> String {
        self.display(field)
            .unwrap_or_else(|| BLANK_DISPLAY.to_owned())
    }

    /// Boolean view of a toggle field. Absent or null reads as `false`.
    pub fn flag(&self, field: &str) -> bool {
        match self.fields.get(field) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Value as it should appear in an editable draft: text without display substitution.
    ///
    /// Booleans become `"true"`/`"false"` so toggle drafts round-trip.
    pub fn draft_text(&self, field: &str) -> String {
        match self.fields.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => render_number(n),
            Some(other) => other.to_string(),
        }
    }
}

pub(crate) fn value_is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn render_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_owned()),
        Value::Bool(true) => Some("Yes".to_owned()),
        Value::Bool(false) => Some("No".to_owned()),
        Value::Number(n) => Some(render_number(n)),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Record {
        serde_json::from_value(json!({
            "id": 17,
            "created_at": "2024-03-01T10:00:00Z",
            "name": "  Aspirin ",
            "dosage": "",
            "height_value": 180.0,
            "uses_caffeine": true,
            "details": null
        }))
        .expect("row should decode")
    }

    #[test]
    fn test_numeric_ids_are_normalised_to_text() {
        let record = sample();
        assert_eq!(record.id.as_str(), "17");

        let textual: Record = serde_json::from_value(json!({
            "id": "8f14e45f-ea1c-4a4a-9c3b-1e2a3b4c5d6e",
            "created_at": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(textual.id.as_str(), "8f14e45f-ea1c-4a4a-9c3b-1e2a3b4c5d6e");
    }

    #[test]
    fn test_empty_id_is_rejected() {
        let result = serde_json::from_value::<Record>(json!({
            "id": " ",
            "created_at": "2024-03-01T10:00:00Z"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_detection_and_display() {
        let record = sample();
        assert_eq!(record.text("name"), Some("Aspirin"));
        assert!(record.is_blank("dosage"));
        assert!(record.is_blank("details"));
        assert!(record.is_blank("missing"));
        assert!(!record.is_blank("uses_caffeine"));

        assert_eq!(record.display_or_blank("dosage"), "N/a");
        assert_eq!(record.display("height_value").as_deref(), Some("180"));
        assert_eq!(record.display("uses_caffeine").as_deref(), Some("Yes"));
    }

    #[test]
    fn test_draft_text_keeps_raw_values() {
        let record = sample();
        assert_eq!(record.draft_text("name"), "  Aspirin ");
        assert_eq!(record.draft_text("uses_caffeine"), "true");
        assert_eq!(record.draft_text("details"), "");
        assert_eq!(record.draft_text("height_value"), "180");
        assert!(record.flag("uses_caffeine"));
        assert!(!record.flag("missing"));
    }

    #[test]
    fn test_new_strips_store_assigned_keys() {
        let mut fields = Fields::new();
        fields.insert("id".into(), json!("forged"));
        fields.insert("created_at".into(), json!("1970-01-01T00:00:00Z"));
        fields.insert("name".into(), json!("Ibuprofen"));

        let record = Record::new(RecordId::new("1"), Utc::now(), fields);
        assert_eq!(record.id.as_str(), "1");
        assert!(record.get("id").is_none());
        assert_eq!(record.text("name"), Some("Ibuprofen"));
    }
}
