//! Wire types for the REST API.
//!
//! These mirror the core's view types but stay free of core dependencies so that clients can
//! depend on them alone. Record payloads are passed through as JSON objects.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;

// ============================================================================
// Schema description
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OptionInfo {
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldInfo {
    pub name: String,
    pub label: String,
    /// One of text, textarea, date, select, radio, integer, decimal, toggle.
    pub kind: String,
    pub required: bool,
    /// One of always, show_more, conditional.
    pub visibility: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controlled_by: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shown_when: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SectionInfo {
    pub key: String,
    pub title: String,
    pub fields: Vec<String>,
    /// Child entity whose rows are replaced when this section is saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_entity: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EntityInfo {
    pub entity: String,
    pub title: String,
    pub singleton: bool,
    /// Rows only written through a parent section.
    #[serde(default)]
    pub child: bool,
    pub quick_add: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_field: Option<String>,
    pub fields: Vec<FieldInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListEntitiesRes {
    pub entities: Vec<EntityInfo>,
}

// ============================================================================
// Lists
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CardDto {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub incomplete: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BucketDto {
    pub key: String,
    pub label: String,
    pub cards: Vec<CardDto>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListRecordsRes {
    pub entity: String,
    pub count: usize,
    pub buckets: Vec<BucketDto>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuickAddReq {
    pub name: String,
}

// ============================================================================
// Records and forms
// ============================================================================

/// A stored row as returned by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordRes {
    #[schema(value_type = Object)]
    pub record: Value,
}

/// Draft values keyed by field name, as a user would type them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FormReq {
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    /// Child rows for a section with a child entity. When present they replace the draft
    /// rows loaded from the store; when absent the stored rows are resubmitted as they are.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BTreeMap<String, String>>>,
}

/// Where a client should go after a successful write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NavigationDto {
    /// One of list, detail, singleton.
    pub view: String,
    pub entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SubmitRes {
    pub navigation: NavigationDto,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RowDto {
    pub field: String,
    pub label: String,
    pub value: String,
    pub deferred: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DetailRes {
    pub entity: String,
    pub id: String,
    pub title: String,
    pub incomplete: bool,
    pub rows: Vec<RowDto>,
    #[schema(value_type = Object)]
    pub record: Value,
}

// ============================================================================
// Singletons
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SectionSummaryDto {
    pub key: String,
    pub title: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SingletonRes {
    pub entity: String,
    pub id: String,
    pub sections: Vec<SectionSummaryDto>,
    #[schema(value_type = Object)]
    pub record: Value,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_errors: BTreeMap<String, String>,
}

impl ErrorRes {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_form_req_defaults_to_empty_values() {
        let req: FormReq = serde_json::from_value(json!({})).unwrap();
        assert!(req.values.is_empty());
        assert!(req.children.is_none());
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({ "values": {} }));
    }

    #[test]
    fn test_form_req_accepts_child_rows() {
        let req: FormReq = serde_json::from_value(json!({
            "values": { "uses_recreational_drugs": "true" },
            "children": [{ "drug_type": "cannabis", "frequency": "Weekly" }]
        }))
        .unwrap();
        let rows = req.children.expect("child rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["drug_type"], "cannabis");
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let nav = NavigationDto {
            view: "list".into(),
            entity: "medications".into(),
            id: None,
        };
        assert_eq!(
            serde_json::to_value(&nav).unwrap(),
            json!({"view": "list", "entity": "medications"})
        );
        assert_eq!(
            serde_json::to_value(ErrorRes::new("Medication not found")).unwrap(),
            json!({"message": "Medication not found"})
        );
    }
}
