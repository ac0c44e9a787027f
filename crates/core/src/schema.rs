//! Entity schemas.
//!
//! Each entity kind is described by data rather than code: its fields, which of them are
//! required, which sit behind "Show more", which appear only when another field holds a
//! given value, and how its list screen groups records. The controllers in
//! [`crate::controllers`] are generic over these descriptions.

use crate::error::PhrError;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kinds of health information the client manages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Medications,
    Allergies,
    Conditions,
    Immunizations,
    Surgeries,
    Supplements,
    FamilyHistory,
    SocialHistory,
    PersonalInformation,
    Documents,
    RecreationalDrugs,
}

impl EntityType {
    pub const ALL: [EntityType; 11] = [
        EntityType::Medications,
        EntityType::Allergies,
        EntityType::Conditions,
        EntityType::Immunizations,
        EntityType::Surgeries,
        EntityType::Supplements,
        EntityType::FamilyHistory,
        EntityType::SocialHistory,
        EntityType::PersonalInformation,
        EntityType::Documents,
        EntityType::RecreationalDrugs,
    ];

    /// Backend collection name.
    pub fn collection(self) -> &'static str {
        match self {
            EntityType::Medications => "medications",
            EntityType::Allergies => "allergies",
            EntityType::Conditions => "conditions",
            EntityType::Immunizations => "immunizations",
            EntityType::Surgeries => "surgeries",
            EntityType::Supplements => "supplements",
            EntityType::FamilyHistory => "family_history",
            EntityType::SocialHistory => "social_history",
            EntityType::PersonalInformation => "personal_information",
            EntityType::Documents => "documents",
            EntityType::RecreationalDrugs => "recreational_drugs",
        }
    }

    /// Lower-case singular noun used in messages ("Failed to add medication").
    pub fn singular(self) -> &'static str {
        match self {
            EntityType::Medications => "medication",
            EntityType::Allergies => "allergy",
            EntityType::Conditions => "condition",
            EntityType::Immunizations => "immunization",
            EntityType::Surgeries => "surgery",
            EntityType::Supplements => "supplement",
            EntityType::FamilyHistory => "family member",
            EntityType::SocialHistory => "social history",
            EntityType::PersonalInformation => "personal information",
            EntityType::Documents => "document",
            EntityType::RecreationalDrugs => "recreational drug",
        }
    }

    /// Lower-case plural noun used for list-level messages.
    pub fn plural(self) -> &'static str {
        match self {
            EntityType::Medications => "medications",
            EntityType::Allergies => "allergies",
            EntityType::Conditions => "conditions",
            EntityType::Immunizations => "immunizations",
            EntityType::Surgeries => "surgeries",
            EntityType::Supplements => "supplements",
            EntityType::FamilyHistory => "family history",
            EntityType::SocialHistory => "social history",
            EntityType::PersonalInformation => "personal information",
            EntityType::Documents => "documents",
            EntityType::RecreationalDrugs => "recreational drugs",
        }
    }

    /// Singular noun with a leading capital ("Medication not found").
    pub fn display_name(self) -> String {
        let noun = self.singular();
        let mut chars = noun.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Singleton entities hold at most one row per user.
    pub fn is_singleton(self) -> bool {
        matches!(
            self,
            EntityType::SocialHistory | EntityType::PersonalInformation
        )
    }

    /// Child entities hang off a singleton row and are only written through its sections.
    pub fn is_child(self) -> bool {
        matches!(self, EntityType::RecreationalDrugs)
    }

    pub fn schema(self) -> &'static EntitySchema {
        crate::registry::schema_for(self)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection())
    }
}

impl std::str::FromStr for EntityType {
    type Err = PhrError;

    /// Accepts the collection name with either underscores or hyphens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase().replace('-', "_");
        EntityType::ALL
            .into_iter()
            .find(|entity| entity.collection() == normalised)
            .ok_or_else(|| PhrError::UnknownEntity(s.to_owned()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberKind {
    Integer,
    Decimal,
}

/// How a field is edited and converted on save.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Textarea,
    Date,
    Select,
    Radio,
    Number(NumberKind),
    Toggle,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Date => "date",
            FieldKind::Select => "select",
            FieldKind::Radio => "radio",
            FieldKind::Number(NumberKind::Integer) => "integer",
            FieldKind::Number(NumberKind::Decimal) => "decimal",
            FieldKind::Toggle => "toggle",
        }
    }

    pub fn has_options(self) -> bool {
        matches!(self, FieldKind::Select | FieldKind::Radio)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Shorthand for an option whose stored value is also its label.
pub const fn opt(value: &'static str) -> FieldOption {
    FieldOption {
        value,
        label: value,
    }
}

pub const fn opt_labelled(value: &'static str, label: &'static str) -> FieldOption {
    FieldOption { value, label }
}

/// A field is shown only while `field` holds one of `any_of`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Condition {
    pub field: &'static str,
    pub any_of: &'static [&'static str],
}

impl Condition {
    pub fn holds(&self, controlling_value: &str) -> bool {
        let value = controlling_value.trim();
        self.any_of.iter().any(|candidate| *candidate == value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Always,
    ShowMore,
    When(Condition),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub visibility: Visibility,
    pub options: &'static [FieldOption],
    pub default: Option<&'static str>,
}

impl FieldSpec {
    const fn base(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            visibility: Visibility::Always,
            options: &[],
            default: None,
        }
    }

    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self::base(name, label, FieldKind::Text)
    }

    pub const fn textarea(name: &'static str, label: &'static str) -> Self {
        Self::base(name, label, FieldKind::Textarea)
    }

    pub const fn date(name: &'static str, label: &'static str) -> Self {
        Self::base(name, label, FieldKind::Date)
    }

    pub const fn select(
        name: &'static str,
        label: &'static str,
        options: &'static [FieldOption],
    ) -> Self {
        let mut spec = Self::base(name, label, FieldKind::Select);
        spec.options = options;
        spec
    }

    pub const fn radio(
        name: &'static str,
        label: &'static str,
        options: &'static [FieldOption],
    ) -> Self {
        let mut spec = Self::base(name, label, FieldKind::Radio);
        spec.options = options;
        spec
    }

    pub const fn integer(name: &'static str, label: &'static str) -> Self {
        Self::base(name, label, FieldKind::Number(NumberKind::Integer))
    }

    pub const fn decimal(name: &'static str, label: &'static str) -> Self {
        Self::base(name, label, FieldKind::Number(NumberKind::Decimal))
    }

    pub const fn toggle(name: &'static str, label: &'static str) -> Self {
        Self::base(name, label, FieldKind::Toggle)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn show_more(mut self) -> Self {
        self.visibility = Visibility::ShowMore;
        self
    }

    pub const fn when(mut self, field: &'static str, any_of: &'static [&'static str]) -> Self {
        self.visibility = Visibility::When(Condition { field, any_of });
        self
    }

    pub const fn default_value(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    /// Label for a stored option value, when the value is one of the field's options.
    pub fn option_label(&self, value: &str) -> Option<&'static str> {
        self.options
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bucket {
    pub key: &'static str,
    pub label: &'static str,
    pub values: &'static [&'static str],
}

/// Groups a list by the value of one field, in fixed bucket order with a trailing fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partition {
    pub field: &'static str,
    pub buckets: &'static [Bucket],
    pub fallback: Bucket,
}

impl Partition {
    /// Bucket whose values contain the stored value exactly. Anything else, including
    /// padded or differently cased text, lands in the fallback.
    pub fn bucket_for(&self, record: &Record) -> &Bucket {
        let value = record
            .get(self.field)
            .and_then(Value::as_str)
            .unwrap_or_default();
        self.buckets
            .iter()
            .find(|bucket| bucket.values.contains(&value))
            .unwrap_or(&self.fallback)
    }
}

/// Repeatable child rows edited together with one singleton section.
///
/// On save the parent's existing child rows are replaced. While the `enabled_by` toggle is
/// off no rows are written, so switching it off clears them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildGroup {
    pub entity: EntityType,
    /// Column on each child row holding the parent row's id.
    pub parent_field: &'static str,
    pub enabled_by: &'static str,
}

/// One independently editable slice of a singleton entity.
#[derive(Clone, Copy)]
pub struct Section {
    pub key: &'static str,
    pub title: &'static str,
    pub fields: &'static [&'static str],
    pub children: Option<ChildGroup>,
    pub summary: fn(&Record) -> String,
}

impl std::fmt::Debug for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Section")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("fields", &self.fields)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

pub struct EntitySchema {
    pub entity: EntityType,
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
    /// Field naming a record on list cards and used for quick-add duplicate detection.
    pub title_field: Option<&'static str>,
    pub quick_add: bool,
    pub partition: Option<Partition>,
    /// A record is flagged incomplete when any of these fields is blank.
    pub incomplete_when_blank: &'static [&'static str],
    pub sections: &'static [Section],
    pub subtitle: Option<fn(&Record) -> Option<String>>,
}

impl std::fmt::Debug for EntitySchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitySchema")
            .field("entity", &self.entity)
            .field("fields", &self.fields.len())
            .field("title_field", &self.title_field)
            .field("quick_add", &self.quick_add)
            .finish_non_exhaustive()
    }
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn title_spec(&self) -> Option<&'static FieldSpec> {
        self.title_field.and_then(|name| self.field(name))
    }

    pub fn section(&self, key: &str) -> Option<&'static Section> {
        self.sections.iter().find(|section| section.key == key)
    }

    pub fn always_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields
            .iter()
            .filter(|spec| !matches!(spec.visibility, Visibility::ShowMore))
    }

    pub fn show_more_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields
            .iter()
            .filter(|spec| matches!(spec.visibility, Visibility::ShowMore))
    }

    pub fn is_incomplete(&self, record: &Record) -> bool {
        self.incomplete_when_blank
            .iter()
            .any(|field| record.is_blank(field))
    }

    /// Title text for a record, empty when the title field is blank.
    pub fn record_title<'r>(&self, record: &'r Record) -> &'r str {
        self.title_field
            .and_then(|field| record.text(field))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_parses_collection_names() {
        assert_eq!(
            "family-history".parse::<EntityType>().unwrap(),
            EntityType::FamilyHistory
        );
        assert_eq!(
            "Medications".parse::<EntityType>().unwrap(),
            EntityType::Medications
        );
        let err = "vitals".parse::<EntityType>().expect_err("unknown entity");
        assert!(matches!(err, PhrError::UnknownEntity(name) if name == "vitals"));
    }

    #[test]
    fn test_display_name_capitalises_first_letter() {
        assert_eq!(EntityType::FamilyHistory.display_name(), "Family member");
        assert_eq!(EntityType::Allergies.display_name(), "Allergy");
    }

    #[test]
    fn test_condition_holds_only_for_listed_values() {
        let condition = Condition {
            field: "smoking_status",
            any_of: &["smoker"],
        };
        assert!(condition.holds("smoker"));
        assert!(condition.holds(" smoker "));
        assert!(!condition.holds("quit"));
        assert!(!condition.holds(""));
    }

    #[test]
    fn test_partition_matches_stored_value_exactly() {
        const BUCKETS: &[Bucket] = &[Bucket {
            key: "chronic",
            label: "Chronic",
            values: &["chronic"],
        }];
        let partition = Partition {
            field: "type",
            buckets: BUCKETS,
            fallback: Bucket {
                key: "other",
                label: "Other",
                values: &[],
            },
        };
        let record = |value: &str| {
            let mut fields = crate::record::Fields::new();
            fields.insert("type".into(), Value::String(value.into()));
            Record::new(crate::record::RecordId::new("1"), chrono::Utc::now(), fields)
        };

        assert_eq!(partition.bucket_for(&record("chronic")).key, "chronic");
        assert_eq!(partition.bucket_for(&record(" chronic")).key, "other");
        assert_eq!(partition.bucket_for(&record("Chronic")).key, "other");
    }

    #[test]
    fn test_only_recreational_drugs_is_a_child() {
        let children: Vec<EntityType> = EntityType::ALL
            .into_iter()
            .filter(|e| e.is_child())
            .collect();
        assert_eq!(children, vec![EntityType::RecreationalDrugs]);
        assert!(!EntityType::RecreationalDrugs.is_singleton());
        assert_eq!(
            "recreational-drugs".parse::<EntityType>().unwrap(),
            EntityType::RecreationalDrugs
        );
    }

    #[test]
    fn test_builders_compose() {
        const OPTIONS: &[FieldOption] = &[opt("Mild"), opt_labelled("sev", "Severe")];
        let spec = FieldSpec::select("severity", "Severity", OPTIONS)
            .show_more()
            .default_value("Mild");
        assert_eq!(spec.visibility, Visibility::ShowMore);
        assert_eq!(spec.default, Some("Mild"));
        assert_eq!(spec.option_label("sev"), Some("Severe"));
        assert_eq!(spec.option_label("other"), None);
        assert!(!spec.required);
    }
}
