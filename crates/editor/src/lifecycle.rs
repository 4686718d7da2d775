// Field lifecycle: local creation, removal and reconciliation with the
// server's view of a field after a save.

use tracing::debug;

use proforma_common::types::FieldRecord;

use crate::error::EditorError;
use crate::gate::{GateError, SubmitGate};
use crate::model::{EntityModel, EntityRef, Field, FieldKey};

/// How a field delete has to be carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DeletePlan {
    /// Never saved: drop it locally.
    Local,
    Remote { field_id: String },
}

/// Append a new, unsaved field with default attributes. No network.
pub(crate) fn create_field(model: &mut EntityModel, gate: &mut SubmitGate) -> FieldKey {
    let index = u32::try_from(model.fields().len()).unwrap_or(u32::MAX);
    let field = Field::unpersisted(model.template().id(), index);
    let key = field.key();
    gate.on_created(EntityRef::Field(key), field.state());
    model.push_field(field);
    debug!(field = %key, index, "field created");
    key
}

pub(crate) fn delete_plan(model: &EntityModel, key: FieldKey) -> Result<DeletePlan, EditorError> {
    let field = model.field(key).ok_or(EditorError::UnknownField(key))?;
    if field.state().in_flight() {
        return Err(GateError::InFlight { entity: EntityRef::Field(key) }.into());
    }
    Ok(match field.field_id() {
        None => DeletePlan::Local,
        Some(field_id) => DeletePlan::Remote { field_id: field_id.to_string() },
    })
}

/// Drop a field from the collection and release its unsaved-work count.
pub(crate) fn remove(
    model: &mut EntityModel,
    gate: &mut SubmitGate,
    key: FieldKey,
) -> Result<Field, EditorError> {
    let field = model.remove_field(key).ok_or(EditorError::UnknownField(key))?;
    gate.on_removed(EntityRef::Field(key), field.state());
    Ok(field)
}

/// Adopt the server's record for a field and move it to its confirmed slot.
/// Does not touch the edit state.
pub(crate) fn reconcile_after_save(
    model: &mut EntityModel,
    key: FieldKey,
    record: FieldRecord,
) -> Result<(), EditorError> {
    let field = model.field_mut(key).ok_or(EditorError::UnknownField(key))?;
    if field.index != record.index {
        debug!(field = %key, from = field.index, to = record.index, "field index reconciled");
    }
    field.field_id = Some(record.field_id);
    field.index = record.index;
    field.attrs = record.attrs;
    if let Some(template_id) = record.template_id {
        field.template_id = template_id;
    }
    model.reposition(key);
    Ok(())
}
