//! Conversions from core view types to wire DTOs.

use api_shared::{
    BucketDto, CardDto, DetailRes, EntityInfo, FieldInfo, NavigationDto, OptionInfo, RowDto,
    SectionInfo, SectionSummaryDto, SingletonRes,
};
use phr_core::summary::SectionSummary;
use phr_core::{BucketView, DetailView, EntitySchema, FieldSpec, Navigation, Record, Visibility};
use serde_json::Value;

pub fn record_value(record: &Record) -> Value {
    serde_json::to_value(record).unwrap_or_default()
}

fn field_info(spec: &FieldSpec) -> FieldInfo {
    let (visibility, controlled_by, shown_when) = match spec.visibility {
        Visibility::Always => ("always", None, Vec::new()),
        Visibility::ShowMore => ("show_more", None, Vec::new()),
        Visibility::When(condition) => (
            "conditional",
            Some(condition.field.to_owned()),
            condition.any_of.iter().map(|v| (*v).to_owned()).collect(),
        ),
    };

    FieldInfo {
        name: spec.name.to_owned(),
        label: spec.label.to_owned(),
        kind: spec.kind.name().to_owned(),
        required: spec.required,
        visibility: visibility.to_owned(),
        controlled_by,
        shown_when,
        options: spec
            .options
            .iter()
            .map(|option| OptionInfo {
                value: option.value.to_owned(),
                label: option.label.to_owned(),
            })
            .collect(),
        default: spec.default.map(str::to_owned),
    }
}

pub fn entity_info(schema: &EntitySchema) -> EntityInfo {
    EntityInfo {
        entity: schema.entity.collection().to_owned(),
        title: schema.title.to_owned(),
        singleton: schema.entity.is_singleton(),
        child: schema.entity.is_child(),
        quick_add: schema.quick_add,
        title_field: schema.title_field.map(str::to_owned),
        fields: schema.fields.iter().map(field_info).collect(),
        sections: schema
            .sections
            .iter()
            .map(|section| SectionInfo {
                key: section.key.to_owned(),
                title: section.title.to_owned(),
                fields: section.fields.iter().map(|f| (*f).to_owned()).collect(),
                child_entity: section
                    .children
                    .map(|group| group.entity.collection().to_owned()),
            })
            .collect(),
    }
}

pub fn bucket_dto(bucket: BucketView) -> BucketDto {
    BucketDto {
        key: bucket.key.to_owned(),
        label: bucket.label.to_owned(),
        cards: bucket
            .cards
            .into_iter()
            .map(|card| CardDto {
                id: card.id.to_string(),
                title: card.title,
                subtitle: card.subtitle,
                incomplete: card.incomplete,
            })
            .collect(),
    }
}

pub fn navigation_dto(navigation: &Navigation) -> NavigationDto {
    match navigation {
        Navigation::List { entity } => NavigationDto {
            view: "list".into(),
            entity: entity.collection().to_owned(),
            id: None,
        },
        Navigation::Detail { entity, id } => NavigationDto {
            view: "detail".into(),
            entity: entity.collection().to_owned(),
            id: Some(id.to_string()),
        },
        Navigation::Singleton { entity } => NavigationDto {
            view: "singleton".into(),
            entity: entity.collection().to_owned(),
            id: None,
        },
    }
}

pub fn detail_res(view: &DetailView) -> DetailRes {
    DetailRes {
        entity: view.entity().collection().to_owned(),
        id: view.id().to_string(),
        title: view.title().to_owned(),
        incomplete: view.incomplete(),
        rows: view
            .rows()
            .into_iter()
            .map(|row| RowDto {
                field: row.field.to_owned(),
                label: row.label.to_owned(),
                value: row.value,
                deferred: row.deferred,
            })
            .collect(),
        record: record_value(view.record()),
    }
}

pub fn singleton_res(record: &Record, summaries: Vec<SectionSummary>, entity: &str) -> SingletonRes {
    SingletonRes {
        entity: entity.to_owned(),
        id: record.id.to_string(),
        sections: summaries
            .into_iter()
            .map(|summary| SectionSummaryDto {
                key: summary.key.to_owned(),
                title: summary.title.to_owned(),
                text: summary.text,
            })
            .collect(),
        record: record_value(record),
    }
}
