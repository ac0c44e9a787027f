//! Display summaries for list subtitles and singleton sections.
//!
//! These are pure functions over a [`Record`]; the registry wires them into each schema.

use crate::constants::NOT_SPECIFIED;
use crate::record::Record;
use crate::schema::EntitySchema;

/// A singleton section rendered for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionSummary {
    pub key: &'static str,
    pub title: &'static str,
    pub text: String,
}

/// Renders every section of a singleton record in schema order.
pub fn section_summaries(schema: &EntitySchema, record: &Record) -> Vec<SectionSummary> {
    schema
        .sections
        .iter()
        .map(|section| SectionSummary {
            key: section.key,
            title: section.title,
            text: (section.summary)(record),
        })
        .collect()
}

fn or_not_specified(record: &Record, field: &str) -> String {
    record
        .display(field)
        .unwrap_or_else(|| NOT_SPECIFIED.to_owned())
}

fn join_present(record: &Record, fields: &[&str], separator: &str) -> Option<String> {
    let parts: Vec<String> = fields.iter().filter_map(|f| record.display(f)).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(separator))
    }
}

// ============================================================================
// List subtitles
// ============================================================================

pub fn dosage_and_frequency(record: &Record) -> Option<String> {
    join_present(record, &["dosage", "frequency"], ", ")
}

pub fn severity(record: &Record) -> Option<String> {
    record.display("severity")
}

pub fn immunization_purpose(record: &Record) -> Option<String> {
    record.display("description_purpose")
}

pub fn surgery_date(record: &Record) -> Option<String> {
    record.display("when_date")
}

pub fn document_date(record: &Record) -> Option<String> {
    record.display("document_date")
}

pub fn family_member(record: &Record) -> Option<String> {
    join_present(record, &["status", "conditions"], ", ")
}

// ============================================================================
// Social history
// ============================================================================

pub fn smoking(record: &Record) -> String {
    match record.text("smoking_status") {
        None => NOT_SPECIFIED.to_owned(),
        Some("never") => "No".to_owned(),
        Some("smoker") => record
            .display("smoking_quantity")
            .unwrap_or_else(|| "Smoker".to_owned()),
        Some("quit") => match record.display("smoking_quit_date") {
            Some(date) => format!("Quit ({date})"),
            None => "Quit".to_owned(),
        },
        Some(other) => other.to_owned(),
    }
}

pub fn drinking(record: &Record) -> String {
    let frequency = match record.text("drinking_frequency") {
        None | Some("never") => return "No".to_owned(),
        Some(frequency) => frequency,
    };

    let mut lines = Vec::new();
    match frequency {
        "occasionally" => lines.push("Yes, occasionally".to_owned()),
        "more_than_once_a_week" => lines.push("Yes, on a regular basis".to_owned()),
        _ => {}
    }
    if let (Some(count), Some(kind)) = (record.text("drinks_per_day"), record.text("alcohol_type")) {
        lines.push(format!("{count} {kind} per day"));
    }

    if lines.is_empty() {
        "Yes".to_owned()
    } else {
        lines.join("\n")
    }
}

pub fn recreational_drugs(record: &Record) -> String {
    if record.flag("uses_recreational_drugs") {
        "Yes".to_owned()
    } else {
        "No".to_owned()
    }
}

pub fn caffeine(record: &Record) -> String {
    if !record.flag("uses_caffeine") {
        return "No".to_owned();
    }
    record
        .display("caffeine_quantity_per_day")
        .unwrap_or_else(|| "Yes".to_owned())
}

pub fn living_situation(record: &Record) -> String {
    or_not_specified(record, "living_situation")
}

pub fn occupation(record: &Record) -> String {
    or_not_specified(record, "occupation")
}

// ============================================================================
// Personal information
// ============================================================================

pub fn full_name(record: &Record) -> String {
    join_present(record, &["first_name", "middle_name", "last_name"], " ")
        .unwrap_or_else(|| NOT_SPECIFIED.to_owned())
}

pub fn gender(record: &Record) -> String {
    or_not_specified(record, "gender")
}

pub fn date_of_birth(record: &Record) -> String {
    or_not_specified(record, "date_of_birth")
}

fn measurement(record: &Record, value: &str, unit: &str) -> Option<String> {
    let value = record.display(value)?;
    let unit = record.display(unit)?;
    Some(format!("{value} {unit}"))
}

pub fn height_and_weight(record: &Record) -> String {
    let parts: Vec<String> = [
        measurement(record, "height_value", "height_unit"),
        measurement(record, "weight_value", "weight_unit"),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        NOT_SPECIFIED.to_owned()
    } else {
        parts.join(", ")
    }
}

pub fn mobile_phone(record: &Record) -> String {
    or_not_specified(record, "mobile_phone")
}

pub fn email(record: &Record) -> String {
    or_not_specified(record, "email")
}

pub fn legal_address(record: &Record) -> String {
    or_not_specified(record, "legal_address")
}

pub fn insurance(record: &Record) -> String {
    let Some(number) = record.display("health_insurance_number") else {
        return NOT_SPECIFIED.to_owned();
    };
    match record.display("health_insurance_jurisdiction") {
        Some(jurisdiction) => format!("{number} ({jurisdiction})"),
        None => number,
    }
}

pub fn family_doctor(record: &Record) -> String {
    let Some(name) = record.display("family_doctor_name") else {
        return NOT_SPECIFIED.to_owned();
    };
    match record.display("family_doctor_phone") {
        Some(phone) => format!("{name}\n{phone}"),
        None => name,
    }
}

/// Emergency contact uses "N/A" rather than "Not specified" when unset.
pub fn emergency_contact(record: &Record) -> String {
    let Some(name) = record.display("emergency_contact_name") else {
        return "N/A".to_owned();
    };
    let mut text = name;
    if let Some(relationship) = record.display("emergency_contact_relationship") {
        text.push_str(&format!(" ({relationship})"));
    }
    if let Some(phone) = record.display("emergency_contact_phone") {
        text.push('\n');
        text.push_str(&phone);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntityType;
    use serde_json::{json, Value};

    fn record(fields: Value) -> Record {
        let mut row = json!({ "id": 1, "created_at": "2024-01-01T00:00:00Z" });
        if let (Some(row), Value::Object(extra)) = (row.as_object_mut(), fields) {
            row.extend(extra);
        }
        serde_json::from_value(row).expect("valid row")
    }

    #[test]
    fn test_smoking_summary() {
        assert_eq!(smoking(&record(json!({}))), "Not specified");
        assert_eq!(smoking(&record(json!({"smoking_status": "never"}))), "No");
        assert_eq!(smoking(&record(json!({"smoking_status": "smoker"}))), "Smoker");
        assert_eq!(
            smoking(&record(json!({"smoking_status": "smoker", "smoking_quantity": "1 pack"}))),
            "1 pack"
        );
        assert_eq!(
            smoking(&record(json!({"smoking_status": "quit", "smoking_quit_date": "2020-05-01"}))),
            "Quit (2020-05-01)"
        );
        assert_eq!(smoking(&record(json!({"smoking_status": "quit"}))), "Quit");
    }

    #[test]
    fn test_drinking_summary() {
        assert_eq!(drinking(&record(json!({"drinking_frequency": null}))), "No");
        assert_eq!(drinking(&record(json!({"drinking_frequency": "never"}))), "No");
        assert_eq!(
            drinking(&record(json!({"drinking_frequency": "occasionally"}))),
            "Yes, occasionally"
        );
        assert_eq!(
            drinking(&record(json!({
                "drinking_frequency": "more_than_once_a_week",
                "drinks_per_day": "3-4 drinks",
                "alcohol_type": "Wine"
            }))),
            "Yes, on a regular basis\n3-4 drinks Wine per day"
        );
        assert_eq!(drinking(&record(json!({"drinking_frequency": "daily"}))), "Yes");
    }

    #[test]
    fn test_caffeine_and_drugs_summaries() {
        assert_eq!(caffeine(&record(json!({}))), "No");
        assert_eq!(caffeine(&record(json!({"uses_caffeine": true}))), "Yes");
        assert_eq!(
            caffeine(&record(json!({"uses_caffeine": true, "caffeine_quantity_per_day": "2 cups"}))),
            "2 cups"
        );
        assert_eq!(recreational_drugs(&record(json!({"uses_recreational_drugs": true}))), "Yes");
        assert_eq!(recreational_drugs(&record(json!({}))), "No");
    }

    #[test]
    fn test_personal_information_summaries() {
        let info = record(json!({
            "first_name": "Ada",
            "middle_name": "",
            "last_name": "Lovelace",
            "height_value": 180,
            "height_unit": "cm",
            "weight_value": 72.5,
            "weight_unit": "kg",
            "health_insurance_number": "1234-567",
            "health_insurance_jurisdiction": "ON",
            "family_doctor_name": "Dr. Who",
            "emergency_contact_name": "Charles",
            "emergency_contact_phone": "555-0100"
        }));
        assert_eq!(full_name(&info), "Ada Lovelace");
        assert_eq!(height_and_weight(&info), "180 cm, 72.5 kg");
        assert_eq!(insurance(&info), "1234-567 (ON)");
        assert_eq!(family_doctor(&info), "Dr. Who");
        assert_eq!(emergency_contact(&info), "Charles\n555-0100");
        assert_eq!(email(&info), "Not specified");

        let empty = record(json!({}));
        assert_eq!(full_name(&empty), "Not specified");
        assert_eq!(height_and_weight(&empty), "Not specified");
        assert_eq!(emergency_contact(&empty), "N/A");
    }

    #[test]
    fn test_section_summaries_follow_schema_order() {
        let schema = EntityType::SocialHistory.schema();
        let summaries = section_summaries(schema, &record(json!({"occupation": "Engineer"})));
        let keys: Vec<&str> = summaries.iter().map(|s| s.key).collect();
        assert_eq!(
            keys,
            vec!["smoking", "alcohol", "drugs", "caffeine", "living", "occupation"]
        );
        assert_eq!(summaries[5].text, "Engineer");
        assert_eq!(summaries[0].text, "Not specified");
    }

    #[test]
    fn test_list_subtitles() {
        let med = record(json!({"dosage": "10mg", "frequency": null}));
        assert_eq!(dosage_and_frequency(&med).as_deref(), Some("10mg"));
        assert_eq!(dosage_and_frequency(&record(json!({}))), None);

        let relative = record(json!({"status": "Alive", "conditions": "Diabetes"}));
        assert_eq!(family_member(&relative).as_deref(), Some("Alive, Diabetes"));
    }
}
