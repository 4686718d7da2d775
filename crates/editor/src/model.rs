// Entity model: the template being edited and its ordered fields.
//
// Readers get shared references; every mutation path is crate-private and
// goes through the gate, lifecycle and sync modules so the navigation guard
// never drifts from the states stored here.

use std::fmt;

use uuid::Uuid;

use proforma_common::types::{FieldAttrs, FieldRecord, FieldType, TemplateAttrs, TemplateSnapshot};

// ── Identity ────────────────────────────────────────────────────────

/// Local identity of a field, stable for the lifetime of an editor session.
///
/// Never sent to the server. Responses are correlated by this key, not by
/// the field's position, because positions shift as fields come and go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey(Uuid);

impl FieldKey {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one hydration of the model. Responses carry the epoch they
/// were issued under so a reload can recognise leftovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionEpoch(Uuid);

impl SessionEpoch {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// The entity an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Template,
    Field(FieldKey),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template => f.write_str("template"),
            Self::Field(key) => write!(f, "field {key}"),
        }
    }
}

// ── Edit state ──────────────────────────────────────────────────────

/// The state an entity returns to when its in-flight request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    Clean,
    Dirty,
    Unpersisted,
}

impl Resume {
    pub fn state(self) -> EditState {
        match self {
            Self::Clean => EditState::Clean,
            Self::Dirty => EditState::Dirty,
            Self::Unpersisted => EditState::Unpersisted,
        }
    }
}

/// Edit state of a template or field.
///
///   Clean ──edit──▶ Dirty ──save──▶ Saving(Dirty) ──ok──▶ Clean
///                                                 └─err─▶ Dirty
///   Unpersisted ──save──▶ Saving(Unpersisted) ──ok──▶ Clean
///   Clean|Dirty ──delete──▶ PendingDelete ──ok──▶ removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Clean,
    Dirty,
    /// Created locally, never saved.
    Unpersisted,
    Saving(Resume),
    PendingDelete(Resume),
}

impl EditState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Dirty => "dirty",
            Self::Unpersisted => "unpersisted",
            Self::Saving(_) => "saving",
            Self::PendingDelete(_) => "pending_delete",
        }
    }

    /// Whether the save control for this entity is enabled.
    pub fn save_enabled(self) -> bool {
        matches!(self, Self::Dirty | Self::Unpersisted)
    }

    /// Whether a request for this entity is awaiting its response.
    pub fn in_flight(self) -> bool {
        matches!(self, Self::Saving(_) | Self::PendingDelete(_))
    }

    /// Whether leaving now would lose work. Entities mid-save still count.
    pub fn is_unsaved(self) -> bool {
        match self {
            Self::Clean => false,
            Self::Dirty | Self::Unpersisted | Self::Saving(_) => true,
            Self::PendingDelete(resume) => resume == Resume::Dirty,
        }
    }
}

// ── Edits ───────────────────────────────────────────────────────────

/// A single user edit to the template's attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateEdit {
    Name(String),
    VerificationChannel(Option<String>),
    ArchiveChannel(Option<String>),
    Role(Option<String>),
    MaxProfileCount(u32),
}

impl TemplateEdit {
    pub(crate) fn apply_to(self, attrs: &mut TemplateAttrs) {
        match self {
            Self::Name(name) => attrs.name = name,
            Self::VerificationChannel(id) => attrs.verification_channel_id = blank_to_none(id),
            Self::ArchiveChannel(id) => attrs.archive_channel_id = blank_to_none(id),
            Self::Role(id) => attrs.role_id = blank_to_none(id),
            Self::MaxProfileCount(count) => attrs.max_profile_count = count,
        }
    }
}

/// A single user edit to one field's attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Name(String),
    Prompt(String),
    Timeout(u32),
    Type(FieldType),
    Optional(bool),
}

impl FieldEdit {
    pub(crate) fn apply_to(self, attrs: &mut FieldAttrs) {
        match self {
            Self::Name(name) => attrs.name = name,
            Self::Prompt(prompt) => attrs.prompt = prompt,
            Self::Timeout(timeout) => attrs.timeout = timeout,
            Self::Type(field_type) => attrs.field_type = field_type,
            Self::Optional(optional) => attrs.optional = optional,
        }
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ── Entities ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub(crate) id: String,
    pub(crate) guild_id: String,
    pub(crate) attrs: TemplateAttrs,
    pub(crate) state: EditState,
}

impl Template {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn guild_id(&self) -> &str {
        &self.guild_id
    }

    pub fn attrs(&self) -> &TemplateAttrs {
        &self.attrs
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn save_enabled(&self) -> bool {
        self.state.save_enabled()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub(crate) key: FieldKey,
    pub(crate) field_id: Option<String>,
    pub(crate) template_id: String,
    pub(crate) index: u32,
    pub(crate) attrs: FieldAttrs,
    pub(crate) state: EditState,
}

impl Field {
    /// A field that exists only locally.
    pub(crate) fn unpersisted(template_id: &str, index: u32) -> Self {
        Self {
            key: FieldKey::new(),
            field_id: None,
            template_id: template_id.to_string(),
            index,
            attrs: FieldAttrs::default(),
            state: EditState::Unpersisted,
        }
    }

    fn hydrated(template_id: &str, record: FieldRecord) -> Self {
        Self {
            key: FieldKey::new(),
            field_id: Some(record.field_id),
            template_id: record.template_id.unwrap_or_else(|| template_id.to_string()),
            index: record.index,
            attrs: record.attrs,
            state: EditState::Clean,
        }
    }

    pub fn key(&self) -> FieldKey {
        self.key
    }

    /// Server-assigned id; `None` until the first successful save.
    pub fn field_id(&self) -> Option<&str> {
        self.field_id.as_deref()
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    /// Server-confirmed order for saved fields, provisional otherwise.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn attrs(&self) -> &FieldAttrs {
        &self.attrs
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn save_enabled(&self) -> bool {
        self.state.save_enabled()
    }

    pub fn is_persisted(&self) -> bool {
        self.field_id.is_some()
    }
}

// ── Model ───────────────────────────────────────────────────────────

/// The template and its ordered field collection for one editor session.
#[derive(Debug, Clone)]
pub struct EntityModel {
    epoch: SessionEpoch,
    template: Template,
    fields: Vec<Field>,
}

impl EntityModel {
    /// Build a model from server state. Every entity starts Clean and fields
    /// are ordered by their server index.
    pub fn hydrate(snapshot: TemplateSnapshot) -> Self {
        let record = snapshot.template;
        let mut fields: Vec<Field> = snapshot
            .fields
            .into_iter()
            .map(|field| Field::hydrated(&record.template_id, field))
            .collect();
        fields.sort_by_key(|field| field.index);

        Self {
            epoch: SessionEpoch::new(),
            template: Template {
                id: record.template_id,
                guild_id: record.guild_id,
                attrs: record.attrs,
                state: EditState::Clean,
            },
            fields,
        }
    }

    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Fields in display order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, key: FieldKey) -> Option<&Field> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn field_by_id(&self, field_id: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.field_id.as_deref() == Some(field_id))
    }

    /// Current display position of a field.
    pub fn position(&self, key: FieldKey) -> Option<usize> {
        self.fields.iter().position(|field| field.key == key)
    }

    pub fn state_of(&self, entity: EntityRef) -> Option<EditState> {
        match entity {
            EntityRef::Template => Some(self.template.state),
            EntityRef::Field(key) => self.field(key).map(Field::state),
        }
    }

    /// Number of entities holding unsaved work, by full scan.
    pub fn unsaved_count(&self) -> usize {
        usize::from(self.template.state.is_unsaved())
            + self.fields.iter().filter(|field| field.state.is_unsaved()).count()
    }

    pub(crate) fn template_mut(&mut self) -> &mut Template {
        &mut self.template
    }

    pub(crate) fn field_mut(&mut self, key: FieldKey) -> Option<&mut Field> {
        self.fields.iter_mut().find(|field| field.key == key)
    }

    pub(crate) fn push_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub(crate) fn remove_field(&mut self, key: FieldKey) -> Option<Field> {
        let position = self.position(key)?;
        Some(self.fields.remove(position))
    }

    /// Move one field to its slot among the saved fields: ahead of the first
    /// saved field with a greater index, else right after the last saved one.
    /// Unsaved fields keep their place relative to each other.
    pub(crate) fn reposition(&mut self, key: FieldKey) -> Option<usize> {
        let field = self.remove_field(key)?;
        let slot = self
            .fields
            .iter()
            .position(|other| other.is_persisted() && other.index > field.index)
            .unwrap_or_else(|| {
                self.fields.iter().rposition(Field::is_persisted).map_or(0, |last| last + 1)
            });
        self.fields.insert(slot, field);
        Some(slot)
    }
}
