//! Schema registry: one static [`EntitySchema`] per [`EntityType`].

use crate::schema::{
    opt, opt_labelled, Bucket, ChildGroup, EntitySchema, EntityType, FieldOption, FieldSpec,
    Partition, Section,
};
use crate::summary;

/// Looks up the schema describing `entity`.
pub fn schema_for(entity: EntityType) -> &'static EntitySchema {
    match entity {
        EntityType::Medications => &MEDICATIONS,
        EntityType::Allergies => &ALLERGIES,
        EntityType::Conditions => &CONDITIONS,
        EntityType::Immunizations => &IMMUNIZATIONS,
        EntityType::Surgeries => &SURGERIES,
        EntityType::Supplements => &SUPPLEMENTS,
        EntityType::FamilyHistory => &FAMILY_HISTORY,
        EntityType::SocialHistory => &SOCIAL_HISTORY,
        EntityType::PersonalInformation => &PERSONAL_INFORMATION,
        EntityType::Documents => &DOCUMENTS,
        EntityType::RecreationalDrugs => &RECREATIONAL_DRUGS,
    }
}

// ============================================================================
// Medications
// ============================================================================

const MEDICATION_FREQUENCY: &[FieldOption] = &[
    opt("1 time a day"),
    opt("2 times a day"),
    opt("3 times a day"),
    opt("4 times a day"),
    opt("As needed"),
];

const MEDICATION_ROUTE: &[FieldOption] = &[
    opt("Oral"),
    opt("Sublingual (SL)"),
    opt("Injection (INJ)"),
    opt("Drops"),
    opt("Inhaler"),
    opt("Topical"),
    opt("Patch"),
    opt("Other"),
];

const MEDICATION_STATUS: &[FieldOption] = &[
    opt("Taking regularly as directed"),
    opt("Taking but not regularly"),
    opt("As needed"),
    opt("Discontinued"),
];

const MEDICATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name", "Name").required(),
    FieldSpec::text("dosage", "Dosage"),
    FieldSpec::select("frequency", "Frequency", MEDICATION_FREQUENCY),
    FieldSpec::select("route", "ORAL/SL/INJ/DROPS", MEDICATION_ROUTE).show_more(),
    FieldSpec::date("start_date", "Prescribed / Start day").show_more(),
    FieldSpec::select("status", "Status", MEDICATION_STATUS).show_more(),
];

static MEDICATIONS: EntitySchema = EntitySchema {
    entity: EntityType::Medications,
    title: "Medications",
    fields: MEDICATION_FIELDS,
    title_field: Some("name"),
    quick_add: true,
    partition: None,
    incomplete_when_blank: &["dosage", "frequency"],
    sections: &[],
    subtitle: Some(summary::dosage_and_frequency),
};

// ============================================================================
// Allergies
// ============================================================================

const ALLERGY_CATEGORY: &[FieldOption] = &[
    opt_labelled("medication", "Medication"),
    opt_labelled("other", "Other"),
];

const ALLERGY_SEVERITY: &[FieldOption] = &[opt("Mild"), opt("Moderate"), opt("Severe")];

const ALLERGY_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name", "Name").required(),
    FieldSpec::radio("category", "Category", ALLERGY_CATEGORY),
    FieldSpec::select("severity", "Severity", ALLERGY_SEVERITY).show_more(),
    FieldSpec::date("onset_date", "Onset date").show_more(),
    FieldSpec::textarea("details", "Details").show_more(),
];

static ALLERGIES: EntitySchema = EntitySchema {
    entity: EntityType::Allergies,
    title: "Allergies",
    fields: ALLERGY_FIELDS,
    title_field: Some("name"),
    quick_add: true,
    partition: Some(Partition {
        field: "category",
        buckets: &[Bucket {
            key: "medication",
            label: "Medication",
            values: &["medication"],
        }],
        fallback: Bucket {
            key: "other",
            label: "Other",
            values: &[],
        },
    }),
    incomplete_when_blank: &["category"],
    sections: &[],
    subtitle: Some(summary::severity),
};

// ============================================================================
// Conditions
// ============================================================================

const CONDITION_TYPE: &[FieldOption] = &[
    opt_labelled("chronic", "Chronic"),
    opt_labelled("transient_recurrent", "Transient-Recurrent"),
    opt_labelled("transient_resolved", "Transient-Resolved"),
];

const CONDITION_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name", "Name").required(),
    FieldSpec::radio("type", "Type", CONDITION_TYPE),
    FieldSpec::date("diagnosis_date", "Diagnosis date").show_more(),
    FieldSpec::textarea("details", "Details").show_more(),
];

static CONDITIONS: EntitySchema = EntitySchema {
    entity: EntityType::Conditions,
    title: "Conditions",
    fields: CONDITION_FIELDS,
    title_field: Some("name"),
    quick_add: true,
    partition: Some(Partition {
        field: "type",
        buckets: &[
            Bucket {
                key: "chronic",
                label: "Chronic",
                values: &["chronic"],
            },
            Bucket {
                key: "transient",
                label: "Transient",
                values: &["transient_recurrent", "transient_resolved"],
            },
        ],
        fallback: Bucket {
            key: "unclassified",
            label: "Unclassified",
            values: &[],
        },
    }),
    incomplete_when_blank: &["type"],
    sections: &[],
    subtitle: None,
};

// ============================================================================
// Immunizations
// ============================================================================

const INJECTION_SITE: &[FieldOption] = &[
    opt("Arm"),
    opt("Gluteal"),
    opt("Arm/gluteal"),
    opt("Thigh"),
    opt("Other"),
];

const IMMUNIZATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name", "Name").required(),
    FieldSpec::text("description_purpose", "Description / Purpose"),
    FieldSpec::date("when_administered", "When administered").show_more(),
    FieldSpec::date("date_administered", "Date administered").show_more(),
    FieldSpec::select("location_administered", "Location administered", INJECTION_SITE)
        .show_more(),
];

static IMMUNIZATIONS: EntitySchema = EntitySchema {
    entity: EntityType::Immunizations,
    title: "Immunizations",
    fields: IMMUNIZATION_FIELDS,
    title_field: Some("name"),
    quick_add: false,
    partition: None,
    incomplete_when_blank: &[],
    sections: &[],
    subtitle: Some(summary::immunization_purpose),
};

// ============================================================================
// Surgeries
// ============================================================================

const SURGERY_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name", "Name").required(),
    FieldSpec::date("when_date", "When (Date)").show_more(),
    FieldSpec::textarea("details", "Details").show_more(),
    FieldSpec::textarea("complications", "Complications").show_more(),
    FieldSpec::text("attending_surgeon", "Attending surgeon").show_more(),
];

static SURGERIES: EntitySchema = EntitySchema {
    entity: EntityType::Surgeries,
    title: "Surgeries",
    fields: SURGERY_FIELDS,
    title_field: Some("name"),
    quick_add: false,
    partition: None,
    incomplete_when_blank: &[],
    sections: &[],
    subtitle: Some(summary::surgery_date),
};

// ============================================================================
// Supplements
// ============================================================================

const SUPPLEMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name", "Name").required(),
    FieldSpec::text("dosage", "Dosage"),
    FieldSpec::text("frequency", "Frequency"),
    FieldSpec::date("start_date", "Start date").show_more(),
    FieldSpec::textarea("details", "Details").show_more(),
];

static SUPPLEMENTS: EntitySchema = EntitySchema {
    entity: EntityType::Supplements,
    title: "Supplements",
    fields: SUPPLEMENT_FIELDS,
    title_field: Some("name"),
    quick_add: true,
    partition: None,
    incomplete_when_blank: &["dosage", "frequency"],
    sections: &[],
    subtitle: Some(summary::dosage_and_frequency),
};

// ============================================================================
// Family history
// ============================================================================

const RELATIVES: &[FieldOption] = &[
    opt("Mother"),
    opt("Father"),
    opt("Sister"),
    opt("Brother"),
    opt("Maternal Grandmother"),
    opt("Maternal Grandfather"),
    opt("Paternal Grandmother"),
    opt("Paternal Grandfather"),
    opt("Aunt"),
    opt("Uncle"),
    opt("Cousin"),
];

const VITAL_STATUS: &[FieldOption] = &[opt("Alive"), opt("Deceased"), opt("Unknown")];

const FAMILY_HISTORY_FIELDS: &[FieldSpec] = &[
    FieldSpec::select("relative", "Relative", RELATIVES).required(),
    FieldSpec::select("status", "Status", VITAL_STATUS).required(),
    FieldSpec::textarea("conditions", "Conditions"),
];

static FAMILY_HISTORY: EntitySchema = EntitySchema {
    entity: EntityType::FamilyHistory,
    title: "Family History",
    fields: FAMILY_HISTORY_FIELDS,
    title_field: Some("relative"),
    quick_add: false,
    partition: None,
    incomplete_when_blank: &["conditions"],
    sections: &[],
    subtitle: Some(summary::family_member),
};

// ============================================================================
// Documents
// ============================================================================

const DOCUMENT_FOLDERS: &[FieldOption] = &[
    opt("Prescriptions"),
    opt("Lab Results"),
    opt("Imaging"),
    opt("Consult"),
    opt("Other"),
];

const DOCUMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name", "Name").required(),
    FieldSpec::select("folder", "Folder", DOCUMENT_FOLDERS),
    FieldSpec::date("document_date", "Document date").show_more(),
    FieldSpec::text("tags", "Tags").show_more(),
];

static DOCUMENTS: EntitySchema = EntitySchema {
    entity: EntityType::Documents,
    title: "Documents",
    fields: DOCUMENT_FIELDS,
    title_field: Some("name"),
    quick_add: false,
    partition: Some(Partition {
        field: "folder",
        buckets: &[
            Bucket {
                key: "prescriptions",
                label: "Prescriptions",
                values: &["Prescriptions"],
            },
            Bucket {
                key: "lab_results",
                label: "Lab Results",
                values: &["Lab Results"],
            },
            Bucket {
                key: "imaging",
                label: "Imaging",
                values: &["Imaging"],
            },
            Bucket {
                key: "consult",
                label: "Consult",
                values: &["Consult"],
            },
            Bucket {
                key: "other",
                label: "Other",
                values: &["Other"],
            },
        ],
        fallback: Bucket {
            key: "inbox",
            label: "Inbox",
            values: &[],
        },
    }),
    incomplete_when_blank: &["folder"],
    sections: &[],
    subtitle: Some(summary::document_date),
};

// ============================================================================
// Social history (singleton)
// ============================================================================

const SMOKING_STATUS: &[FieldOption] = &[
    opt_labelled("smoker", "Smoker"),
    opt_labelled("quit", "Quit"),
    opt_labelled("never", "Never"),
];

const DURATION_UNIT: &[FieldOption] = &[
    opt_labelled("years", "Years"),
    opt_labelled("months", "Months"),
];

const DRINKING_FREQUENCY: &[FieldOption] = &[
    opt_labelled("never", "Never"),
    opt_labelled("occasionally", "Occasionally"),
    opt_labelled("more_than_once_a_week", "More than once a week"),
];

const DRINKS_PER_DAY: &[FieldOption] = &[
    opt("1-2 drinks"),
    opt("3-4 drinks"),
    opt("5-6 drinks"),
    opt("7-9 drinks"),
    opt("10+ drinks"),
];

const ALCOHOL_TYPE: &[FieldOption] = &[
    opt("Beer"),
    opt("Wine"),
    opt("Spirits"),
    opt("Mixed drinks"),
    opt("Other"),
];

const DRINKERS: &[&str] = &["occasionally", "more_than_once_a_week"];

const SOCIAL_HISTORY_FIELDS: &[FieldSpec] = &[
    FieldSpec::radio("smoking_status", "Do you smoke?", SMOKING_STATUS),
    FieldSpec::text("smoking_quantity", "How much do you smoke?")
        .when("smoking_status", &["smoker"]),
    FieldSpec::integer("smoking_duration_value", "For how long?")
        .when("smoking_status", &["smoker"]),
    FieldSpec::radio("smoking_duration_unit", "Duration unit", DURATION_UNIT)
        .when("smoking_status", &["smoker"])
        .default_value("years"),
    FieldSpec::date("smoking_quit_date", "When did you quit?").when("smoking_status", &["quit"]),
    FieldSpec::text("smoking_past_quantity", "How much did you smoke?")
        .when("smoking_status", &["quit"]),
    FieldSpec::radio("drinking_frequency", "Do you drink alcohol?", DRINKING_FREQUENCY),
    FieldSpec::select("drinks_per_day", "How many drinks per day?", DRINKS_PER_DAY)
        .when("drinking_frequency", DRINKERS),
    FieldSpec::select("alcohol_type", "What do you usually drink?", ALCOHOL_TYPE)
        .when("drinking_frequency", DRINKERS),
    FieldSpec::toggle("uses_recreational_drugs", "Do you use recreational drugs?"),
    FieldSpec::toggle("uses_caffeine", "Do you drink caffeine?"),
    FieldSpec::text("caffeine_quantity_per_day", "How much per day?")
        .when("uses_caffeine", &["true"]),
    FieldSpec::textarea("living_situation", "Living situation"),
    FieldSpec::text("occupation", "Occupation"),
];

const SOCIAL_HISTORY_SECTIONS: &[Section] = &[
    Section {
        key: "smoking",
        title: "Smoking",
        fields: &[
            "smoking_status",
            "smoking_quantity",
            "smoking_duration_value",
            "smoking_duration_unit",
            "smoking_quit_date",
            "smoking_past_quantity",
        ],
        children: None,
        summary: summary::smoking,
    },
    Section {
        key: "alcohol",
        title: "Alcohol",
        fields: &["drinking_frequency", "drinks_per_day", "alcohol_type"],
        children: None,
        summary: summary::drinking,
    },
    Section {
        key: "drugs",
        title: "Recreational drugs",
        fields: &["uses_recreational_drugs"],
        children: Some(ChildGroup {
            entity: EntityType::RecreationalDrugs,
            parent_field: "social_history_id",
            enabled_by: "uses_recreational_drugs",
        }),
        summary: summary::recreational_drugs,
    },
    Section {
        key: "caffeine",
        title: "Caffeine",
        fields: &["uses_caffeine", "caffeine_quantity_per_day"],
        children: None,
        summary: summary::caffeine,
    },
    Section {
        key: "living",
        title: "Living situation",
        fields: &["living_situation"],
        children: None,
        summary: summary::living_situation,
    },
    Section {
        key: "occupation",
        title: "Occupation",
        fields: &["occupation"],
        children: None,
        summary: summary::occupation,
    },
];

static SOCIAL_HISTORY: EntitySchema = EntitySchema {
    entity: EntityType::SocialHistory,
    title: "Social History",
    fields: SOCIAL_HISTORY_FIELDS,
    title_field: None,
    quick_add: false,
    partition: None,
    incomplete_when_blank: &[],
    sections: SOCIAL_HISTORY_SECTIONS,
    subtitle: None,
};

// ============================================================================
// Recreational drugs (child rows of social history)
// ============================================================================

const DRUG_TYPES: &[FieldOption] = &[
    opt_labelled("cannabis", "Cannabis"),
    opt_labelled("psychoactive_medications", "Psychoactive medications"),
    opt_labelled("stimulants_mdma", "Stimulants/MDMA"),
    opt_labelled("opioids", "Opioids"),
    opt_labelled("hallucinogens", "Hallucinogens"),
    opt_labelled("cocaine", "Cocaine"),
    opt_labelled("other", "Other"),
];

const DRUG_FREQUENCIES: &[FieldOption] = &[
    opt("Not at all in the past month"),
    opt("Once or twice in the past month"),
    opt("Weekly"),
    opt("Daily or almost daily"),
    opt("Multiple times per day"),
];

const RECREATIONAL_DRUG_FIELDS: &[FieldSpec] = &[
    FieldSpec::select("drug_type", "Drug type", DRUG_TYPES).required(),
    FieldSpec::text("custom_drug_name", "Please specify").when("drug_type", &["other"]),
    FieldSpec::select("frequency", "How often?", DRUG_FREQUENCIES).required(),
];

static RECREATIONAL_DRUGS: EntitySchema = EntitySchema {
    entity: EntityType::RecreationalDrugs,
    title: "Recreational drugs",
    fields: RECREATIONAL_DRUG_FIELDS,
    title_field: Some("drug_type"),
    quick_add: false,
    partition: None,
    incomplete_when_blank: &["frequency"],
    sections: &[],
    subtitle: None,
};

// ============================================================================
// Personal information (singleton)
// ============================================================================

const GENDERS: &[FieldOption] = &[
    opt("Male"),
    opt("Female"),
    opt("Non-binary"),
    opt("Prefer not to say"),
    opt("Other"),
];

const HEIGHT_UNITS: &[FieldOption] = &[opt("cm"), opt("in")];

const WEIGHT_UNITS: &[FieldOption] = &[opt("kg"), opt("lbs")];

const PERSONAL_INFORMATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("first_name", "First name"),
    FieldSpec::text("middle_name", "Middle name"),
    FieldSpec::text("last_name", "Last name"),
    FieldSpec::select("gender", "Gender", GENDERS),
    FieldSpec::date("date_of_birth", "Date of birth"),
    FieldSpec::decimal("height_value", "Height"),
    FieldSpec::select("height_unit", "Height unit", HEIGHT_UNITS).default_value("cm"),
    FieldSpec::decimal("weight_value", "Weight"),
    FieldSpec::select("weight_unit", "Weight unit", WEIGHT_UNITS).default_value("kg"),
    FieldSpec::text("mobile_phone", "Mobile phone"),
    FieldSpec::text("email", "Email"),
    FieldSpec::textarea("legal_address", "Legal address"),
    FieldSpec::text("health_insurance_number", "Health insurance number"),
    FieldSpec::text("health_insurance_jurisdiction", "Jurisdiction"),
    FieldSpec::text("family_doctor_name", "Family doctor"),
    FieldSpec::text("family_doctor_phone", "Family doctor phone"),
    FieldSpec::text("emergency_contact_name", "Emergency contact"),
    FieldSpec::text("emergency_contact_relationship", "Relationship"),
    FieldSpec::text("emergency_contact_phone", "Emergency contact phone"),
];

const PERSONAL_INFORMATION_SECTIONS: &[Section] = &[
    Section {
        key: "name",
        title: "Name",
        fields: &["first_name", "middle_name", "last_name"],
        children: None,
        summary: summary::full_name,
    },
    Section {
        key: "gender",
        title: "Gender",
        fields: &["gender"],
        children: None,
        summary: summary::gender,
    },
    Section {
        key: "dob",
        title: "Date of birth",
        fields: &["date_of_birth"],
        children: None,
        summary: summary::date_of_birth,
    },
    Section {
        key: "height_weight",
        title: "Height & weight",
        fields: &["height_value", "height_unit", "weight_value", "weight_unit"],
        children: None,
        summary: summary::height_and_weight,
    },
    Section {
        key: "phone",
        title: "Mobile phone",
        fields: &["mobile_phone"],
        children: None,
        summary: summary::mobile_phone,
    },
    Section {
        key: "email",
        title: "Email",
        fields: &["email"],
        children: None,
        summary: summary::email,
    },
    Section {
        key: "address",
        title: "Legal address",
        fields: &["legal_address"],
        children: None,
        summary: summary::legal_address,
    },
    Section {
        key: "insurance",
        title: "Health insurance",
        fields: &["health_insurance_number", "health_insurance_jurisdiction"],
        children: None,
        summary: summary::insurance,
    },
    Section {
        key: "doctor",
        title: "Family doctor",
        fields: &["family_doctor_name", "family_doctor_phone"],
        children: None,
        summary: summary::family_doctor,
    },
    Section {
        key: "emergency",
        title: "Emergency contact",
        fields: &[
            "emergency_contact_name",
            "emergency_contact_relationship",
            "emergency_contact_phone",
        ],
        children: None,
        summary: summary::emergency_contact,
    },
];

static PERSONAL_INFORMATION: EntitySchema = EntitySchema {
    entity: EntityType::PersonalInformation,
    title: "Personal Information",
    fields: PERSONAL_INFORMATION_FIELDS,
    title_field: None,
    quick_add: false,
    partition: None,
    incomplete_when_blank: &[],
    sections: PERSONAL_INFORMATION_SECTIONS,
    subtitle: None,
};
