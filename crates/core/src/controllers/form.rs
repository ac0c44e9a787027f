//! Add, edit and section forms with validation and conditional fields.
//!
//! A [`DetailForm`] keeps every draft value as text. Values only become typed JSON in
//! [`DetailForm::payload`], where conditional fields whose condition does not hold are nulled.
//! Sections with a [`ChildGroup`] also carry child row drafts that replace the stored child
//! rows on submit.

use super::{store_failure, Navigation};
use crate::config::CoreConfig;
use crate::constants::{DATE_FORMAT, INCOMPLETE_SUFFIX, SUBMIT_ERROR_FIELD};
use crate::error::{Action, FieldErrors, PhrError, PhrResult, StoreError, StoreResult};
use crate::record::{Fields, Record, RecordId};
use crate::schema::{
    ChildGroup, EntitySchema, EntityType, FieldKind, FieldSpec, NumberKind, Visibility,
};
use crate::store::{with_deadline, RecordStore};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Draft values keyed by field name.
pub type Draft = BTreeMap<String, String>;

/// Lifecycle of a [`DetailForm`].
///
/// `ValidationFailed` and `SubmitFailed` persist until the next edit moves the form back to
/// `Editing`. A failed form can be submitted again directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormPhase {
    Empty,
    Editing,
    Validating,
    Submitting,
    ValidationFailed,
    SubmitFailed,
    Success,
}

/// What a form writes on submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit(RecordId),
    /// Edit one section of a singleton row.
    Section { id: RecordId, section: &'static str },
}

/// Editable draft of one record.
///
/// Draft values are kept as text exactly as entered. Conversion to store types happens only
/// when building the payload, so values hidden by a conditional field survive in the draft
/// and reappear if the controlling field is switched back.
pub struct DetailForm<S: ?Sized> {
    store: Arc<S>,
    cfg: Arc<CoreConfig>,
    entity: EntityType,
    mode: FormMode,
    values: Draft,
    /// Drafts of child rows, oldest first, for sections with a [`ChildGroup`].
    children: Vec<Draft>,
    errors: FieldErrors,
    show_more: bool,
    phase: FormPhase,
}

impl<S: RecordStore + ?Sized> DetailForm<S> {
    /// An empty add form for a collection entity, pre-filled with field defaults.
    ///
    /// # Errors
    ///
    /// Returns `PhrError::InvalidInput` for singleton entities.
    pub fn add(store: Arc<S>, cfg: Arc<CoreConfig>, entity: EntityType) -> PhrResult<Self> {
        reject_non_collection(entity)?;

        let values = entity
            .schema()
            .fields
            .iter()
            .filter_map(|spec| spec.default.map(|d| (spec.name.to_owned(), d.to_owned())))
            .collect();

        Ok(Self {
            store,
            cfg,
            entity,
            mode: FormMode::Add,
            values,
            children: Vec::new(),
            errors: FieldErrors::new(),
            show_more: false,
            phase: FormPhase::Empty,
        })
    }

    /// An edit form pre-populated from the stored record.
    ///
    /// # Errors
    ///
    /// - `PhrError::InvalidInput` for singleton entities.
    /// - `PhrError::NotFound` if no record has `id`.
    /// - `PhrError::Store` if the fetch fails or times out.
    pub async fn edit(
        store: Arc<S>,
        cfg: Arc<CoreConfig>,
        entity: EntityType,
        id: RecordId,
    ) -> PhrResult<Self> {
        reject_non_collection(entity)?;

        let record = fetch(store.as_ref(), &cfg, entity, &id).await?;
        let values = draft_from(&record, entity.schema().fields.iter());

        Ok(Self {
            store,
            cfg,
            entity,
            mode: FormMode::Edit(id),
            values,
            children: Vec::new(),
            errors: FieldErrors::new(),
            show_more: false,
            phase: FormPhase::Editing,
        })
    }

    /// An edit form scoped to one section of a singleton row.
    ///
    /// Only the section's fields can be set, and only they are written on submit.
    ///
    /// # Errors
    ///
    /// - `PhrError::InvalidInput` if `section` is not a section of `entity`.
    /// - `PhrError::NotFound` or `PhrError::Store` if the row cannot be fetched.
    pub async fn edit_section(
        store: Arc<S>,
        cfg: Arc<CoreConfig>,
        entity: EntityType,
        id: RecordId,
        section: &str,
    ) -> PhrResult<Self> {
        let section = entity.schema().section(section).ok_or_else(|| {
            PhrError::InvalidInput(format!("{entity} has no section named {section}"))
        })?;

        let record = fetch(store.as_ref(), &cfg, entity, &id).await?;
        let fields = entity
            .schema()
            .fields
            .iter()
            .filter(|spec| section.fields.contains(&spec.name));
        let values = draft_from(&record, fields);

        let children = match section.children {
            Some(group) => {
                let rows = with_deadline(
                    group.entity,
                    cfg.request_timeout(),
                    store.list_where(group.entity, group.parent_field, id.as_str()),
                )
                .await
                .map_err(|e| store_failure(Action::FetchList, group.entity, e))?;
                rows.iter()
                    .rev()
                    .map(|row| draft_from(row, group.entity.schema().fields.iter()))
                    .collect()
            }
            None => Vec::new(),
        };

        Ok(Self {
            store,
            cfg,
            entity,
            mode: FormMode::Section {
                id,
                section: section.key,
            },
            values,
            children,
            errors: FieldErrors::new(),
            show_more: false,
            phase: FormPhase::Editing,
        })
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.entity.schema()
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn values(&self) -> &Draft {
        &self.values
    }

    /// Current draft text of `field`, empty when unset.
    pub fn value(&self, field: &str) -> &str {
        draft_value(&self.values, field)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Fields this form edits: the whole schema, or one section's fields.
    pub fn fields(&self) -> Vec<&'static FieldSpec> {
        let schema = self.schema();
        match &self.mode {
            FormMode::Section { section, .. } => {
                let names = schema.section(section).map(|s| s.fields).unwrap_or_default();
                schema
                    .fields
                    .iter()
                    .filter(|spec| names.contains(&spec.name))
                    .collect()
            }
            _ => schema.fields.iter().collect(),
        }
    }

    fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().into_iter().find(|spec| spec.name == name)
    }

    /// Sets a draft value and clears that field's error.
    ///
    /// Toggle values are normalised to `"true"` or `"false"`.
    ///
    /// # Errors
    ///
    /// Returns `PhrError::InvalidInput` if `field` is not edited by this form.
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> PhrResult<()> {
        let spec = self.field(field).ok_or_else(|| {
            PhrError::InvalidInput(format!("{field} is not a field of this form"))
        })?;

        let mut value = value.into();
        if spec.kind == FieldKind::Toggle {
            value = parse_toggle(&value).to_string();
        }

        self.values.insert(spec.name.to_owned(), value);
        self.errors.remove(spec.name);
        self.phase = FormPhase::Editing;
        Ok(())
    }

    /// True when the field's controlling condition (if any) currently holds.
    fn is_active(&self, spec: &FieldSpec) -> bool {
        is_active_in(&self.values, spec)
    }

    /// The child group edited alongside this form's section, if any.
    pub fn child_group(&self) -> Option<ChildGroup> {
        match &self.mode {
            FormMode::Section { section, .. } => {
                self.schema().section(section).and_then(|s| s.children)
            }
            _ => None,
        }
    }

    fn require_child_group(&self) -> PhrResult<ChildGroup> {
        self.child_group()
            .ok_or_else(|| PhrError::InvalidInput("this form has no child rows".into()))
    }

    pub fn child_rows(&self) -> &[Draft] {
        &self.children
    }

    /// Appends an empty child row pre-filled with field defaults and returns its index.
    ///
    /// # Errors
    ///
    /// Returns `PhrError::InvalidInput` if this form has no child group.
    pub fn add_child_row(&mut self) -> PhrResult<usize> {
        let group = self.require_child_group()?;
        let row = group
            .entity
            .schema()
            .fields
            .iter()
            .filter_map(|spec| spec.default.map(|d| (spec.name.to_owned(), d.to_owned())))
            .collect();
        self.children.push(row);
        self.phase = FormPhase::Editing;
        Ok(self.children.len() - 1)
    }

    /// Sets one value of a child row.
    ///
    /// # Errors
    ///
    /// Returns `PhrError::InvalidInput` if this form has no child group, `index` is out of
    /// range, or `field` is not a field of the child entity.
    pub fn set_child(
        &mut self,
        index: usize,
        field: &str,
        value: impl Into<String>,
    ) -> PhrResult<()> {
        let group = self.require_child_group()?;
        let spec = group.entity.schema().field(field).ok_or_else(|| {
            PhrError::InvalidInput(format!("{field} is not a field of {}", group.entity))
        })?;
        let row = self.children.get_mut(index).ok_or_else(|| {
            PhrError::InvalidInput(format!("no {} row at {index}", group.entity.singular()))
        })?;

        let mut value = value.into();
        if spec.kind == FieldKind::Toggle {
            value = parse_toggle(&value).to_string();
        }
        row.insert(spec.name.to_owned(), value);
        self.phase = FormPhase::Editing;
        Ok(())
    }

    pub fn remove_child_row(&mut self, index: usize) -> PhrResult<()> {
        let group = self.require_child_group()?;
        if index >= self.children.len() {
            return Err(PhrError::InvalidInput(format!(
                "no {} row at {index}",
                group.entity.singular()
            )));
        }
        self.children.remove(index);
        self.phase = FormPhase::Editing;
        Ok(())
    }

    pub fn clear_child_rows(&mut self) -> PhrResult<()> {
        self.require_child_group()?;
        self.children.clear();
        self.phase = FormPhase::Editing;
        Ok(())
    }

    /// Child rows written on submit, each carrying the parent id.
    ///
    /// Empty while the group's enabling toggle is off. Rows missing a required value are left
    /// out rather than reported. Conditional fields whose condition does not hold within the
    /// row are written as null.
    pub fn child_payloads(&self) -> Vec<Fields> {
        let (Some(group), FormMode::Section { id, .. }) = (self.child_group(), &self.mode) else {
            return Vec::new();
        };
        if !parse_toggle(self.value(group.enabled_by)) {
            return Vec::new();
        }

        let fields = group.entity.schema().fields;
        self.children
            .iter()
            .filter(|row| {
                fields.iter().all(|spec| {
                    !spec.required
                        || !is_active_in(row, spec)
                        || !draft_value(row, spec.name).trim().is_empty()
                })
            })
            .map(|row| {
                let mut payload: Fields = fields
                    .iter()
                    .map(|spec| {
                        let value = if is_active_in(row, spec) {
                            convert(spec, draft_value(row, spec.name))
                        } else {
                            Value::Null
                        };
                        (spec.name.to_owned(), value)
                    })
                    .collect();
                payload.insert(
                    group.parent_field.to_owned(),
                    Value::String(id.as_str().to_owned()),
                );
                payload
            })
            .collect()
    }

    pub fn show_more(&self) -> bool {
        self.show_more
    }

    /// Whether this form has optional fields behind "Show more".
    pub fn has_show_more(&self) -> bool {
        self.fields()
            .iter()
            .any(|spec| spec.visibility == Visibility::ShowMore)
    }

    /// Flips "Show more". Presentation only; draft values are untouched.
    pub fn toggle_show_more(&mut self) -> bool {
        self.show_more = !self.show_more;
        self.show_more
    }

    /// Fields currently shown, honouring "Show more" and conditional visibility.
    pub fn visible_fields(&self) -> Vec<&'static FieldSpec> {
        self.fields()
            .into_iter()
            .filter(|spec| match spec.visibility {
                Visibility::ShowMore => self.show_more,
                Visibility::Always | Visibility::When(_) => self.is_active(spec),
            })
            .collect()
    }

    /// Checks required fields, replacing the error map. Returns `true` when valid.
    pub fn validate(&mut self) -> bool {
        let mut errors = FieldErrors::new();
        for spec in self.fields() {
            if spec.required && self.is_active(spec) && self.value(spec.name).trim().is_empty() {
                errors.insert(spec.name, format!("{} {}", spec.label, INCOMPLETE_SUFFIX));
            }
        }
        self.errors = errors;
        self.errors.is_empty()
    }

    /// The store payload for the current draft.
    ///
    /// Text is trimmed and blank values become null. Numbers and dates that do not parse
    /// become null. Conditional fields whose condition does not hold are written as null.
    pub fn payload(&self) -> Fields {
        self.fields()
            .into_iter()
            .map(|spec| {
                let value = if self.is_active(spec) {
                    convert(spec, self.value(spec.name))
                } else {
                    Value::Null
                };
                (spec.name.to_owned(), value)
            })
            .collect()
    }

    /// Validates and writes the draft.
    ///
    /// On success returns where to navigate next: the list after an add, the detail view after
    /// an edit, or the singleton screen after a section edit.
    ///
    /// # Errors
    ///
    /// - `PhrError::Validation` with "<Label> (Incomplete)" per missing required field. No
    ///   store call is made.
    /// - `PhrError::Store` with "Failed to add <entity>" or "Failed to update <entity>" if
    ///   the write fails or times out. The same message is placed under the `submit` error
    ///   key and the draft is kept.
    /// - `PhrError::NotFound` if the record being edited no longer exists.
    pub async fn submit(&mut self) -> PhrResult<Navigation> {
        self.phase = FormPhase::Validating;
        if !self.validate() {
            self.phase = FormPhase::ValidationFailed;
            tracing::debug!(
                collection = self.entity.collection(),
                missing = self.errors.len(),
                "form validation failed"
            );
            return Err(PhrError::Validation(self.errors.clone()));
        }

        self.phase = FormPhase::Submitting;
        let entity = self.entity;
        let limit = self.cfg.request_timeout();
        let payload = self.payload();
        let child_group = self.child_group();
        let child_rows = self.child_payloads();

        let result = match &self.mode {
            FormMode::Add => with_deadline(entity, limit, self.store.insert(entity, payload))
                .await
                .map(|record| {
                    tracing::info!(collection = entity.collection(), id = %record.id, "added record");
                    Navigation::List { entity }
                })
                .map_err(|e| (Action::Add, e)),
            FormMode::Edit(id) => with_deadline(entity, limit, self.store.update(entity, id, payload))
                .await
                .map(|()| {
                    tracing::info!(collection = entity.collection(), %id, "updated record");
                    Navigation::Detail {
                        entity,
                        id: id.clone(),
                    }
                })
                .map_err(|e| (Action::Update, e)),
            FormMode::Section { id, section } => {
                let store = self.store.as_ref();
                let written = async move {
                    with_deadline(entity, limit, store.update(entity, id, payload)).await?;
                    if let Some(group) = child_group {
                        replace_children(store, limit, group, id, child_rows).await?;
                    }
                    Ok::<(), StoreError>(())
                };
                written
                    .await
                    .map(|()| {
                        tracing::info!(collection = entity.collection(), %id, section, "updated section");
                        Navigation::Singleton { entity }
                    })
                    .map_err(|e| (Action::Update, e))
            }
        };

        match result {
            Ok(navigation) => {
                self.phase = FormPhase::Success;
                Ok(navigation)
            }
            Err((action, source)) => {
                let err = store_failure(action, entity, source);
                self.errors.insert(SUBMIT_ERROR_FIELD, err.to_string());
                self.phase = FormPhase::SubmitFailed;
                Err(err)
            }
        }
    }
}

async fn fetch<S: RecordStore + ?Sized>(
    store: &S,
    cfg: &CoreConfig,
    entity: EntityType,
    id: &RecordId,
) -> PhrResult<Record> {
    with_deadline(entity, cfg.request_timeout(), store.get(entity, id))
        .await
        .map_err(|e| store_failure(Action::Fetch, entity, e))
}

/// Deletes the parent's child rows, then inserts `rows`. Each store call gets its own deadline.
async fn replace_children<S: RecordStore + ?Sized>(
    store: &S,
    limit: Duration,
    group: ChildGroup,
    parent: &RecordId,
    rows: Vec<Fields>,
) -> StoreResult<usize> {
    let child = group.entity;
    let removed = with_deadline(
        child,
        limit,
        store.delete_where(child, group.parent_field, parent.as_str()),
    )
    .await?;

    let written = rows.len();
    for row in rows {
        with_deadline(child, limit, store.insert(child, row)).await?;
    }
    tracing::debug!(
        collection = child.collection(),
        %parent,
        removed,
        written,
        "replaced child rows"
    );
    Ok(written)
}

fn reject_non_collection(entity: EntityType) -> PhrResult<()> {
    if entity.is_singleton() {
        return Err(PhrError::InvalidInput(format!(
            "{entity} is a singleton; edit its sections instead"
        )));
    }
    if entity.is_child() {
        return Err(PhrError::InvalidInput(format!(
            "{entity} rows are edited through their parent section"
        )));
    }
    Ok(())
}

fn draft_value<'a>(values: &'a Draft, field: &str) -> &'a str {
    values.get(field).map(String::as_str).unwrap_or_default()
}

/// True when the field's controlling condition (if any) holds in `values`.
fn is_active_in(values: &Draft, spec: &FieldSpec) -> bool {
    match spec.visibility {
        Visibility::When(condition) => condition.holds(draft_value(values, condition.field)),
        Visibility::Always | Visibility::ShowMore => true,
    }
}

fn draft_from<'a>(
    record: &Record,
    fields: impl Iterator<Item = &'a FieldSpec>,
) -> Draft {
    fields
        .map(|spec| {
            let mut value = record.draft_text(spec.name);
            if value.trim().is_empty() {
                if let Some(default) = spec.default {
                    value = default.to_owned();
                }
            }
            (spec.name.to_owned(), value)
        })
        .collect()
}

fn parse_toggle(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "on" | "1"
    )
}

/// Converts draft text into the value written to the store.
fn convert(spec: &FieldSpec, raw: &str) -> Value {
    let trimmed = raw.trim();
    match spec.kind {
        FieldKind::Toggle => Value::Bool(parse_toggle(trimmed)),
        _ if trimmed.is_empty() => Value::Null,
        FieldKind::Number(NumberKind::Integer) => match trimmed.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => {
                tracing::debug!(field = spec.name, "discarding unparsable integer");
                Value::Null
            }
        },
        FieldKind::Number(NumberKind::Decimal) => trimmed
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        FieldKind::Date => match NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
            Ok(date) => Value::String(date.format(DATE_FORMAT).to_string()),
            Err(_) => {
                tracing::debug!(field = spec.name, "discarding unparsable date");
                Value::Null
            }
        },
        FieldKind::Text | FieldKind::Textarea | FieldKind::Select | FieldKind::Radio => {
            Value::String(trimmed.to_owned())
        }
    }
}
