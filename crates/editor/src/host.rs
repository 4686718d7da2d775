// Host interface: the surface embedding the editor (web page, terminal, ...).
//
// The engine never renders anything itself. It reports outcomes through
// `notify`, asks before destructive actions through `confirm`, and tells the
// host to leave once the template is gone.

use crate::model::{EntityRef, FieldKey};

pub const DELETE_TEMPLATE_PROMPT: &str =
    "Are you REALLY SURE that you want to delete this template?";
pub const DELETE_FIELD_PROMPT: &str = "Are you REALLY SURE that you want to delete this field?";

/// Outcome of a remote operation, addressed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    TemplateSaved,
    TemplateSaveFailed { message: String },
    TemplateDeleted,
    TemplateDeleteFailed { message: String },
    FieldSaved { key: FieldKey, field_id: String },
    FieldSaveFailed { key: FieldKey, message: String },
    FieldDeleted { key: FieldKey },
    FieldDeleteFailed { key: FieldKey, message: String },
}

impl Notice {
    pub fn entity(&self) -> EntityRef {
        match self {
            Self::TemplateSaved
            | Self::TemplateSaveFailed { .. }
            | Self::TemplateDeleted
            | Self::TemplateDeleteFailed { .. } => EntityRef::Template,
            Self::FieldSaved { key, .. }
            | Self::FieldSaveFailed { key, .. }
            | Self::FieldDeleted { key }
            | Self::FieldDeleteFailed { key, .. } => EntityRef::Field(*key),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::TemplateSaveFailed { .. }
                | Self::TemplateDeleteFailed { .. }
                | Self::FieldSaveFailed { .. }
                | Self::FieldDeleteFailed { .. }
        )
    }

    /// Text shown to the user.
    pub fn message(&self) -> String {
        match self {
            Self::TemplateSaved => "Template saved!".into(),
            Self::TemplateSaveFailed { message } => {
                format!("There was an error saving the template: {message}")
            }
            Self::TemplateDeleted => "Template deleted!".into(),
            Self::TemplateDeleteFailed { message } => {
                format!("There was an error deleting that template: {message}")
            }
            Self::FieldSaved { .. } => "Field saved!".into(),
            Self::FieldSaveFailed { message, .. } => {
                format!("There was an error saving the field: {message}")
            }
            Self::FieldDeleted { .. } => "Field deleted!".into(),
            Self::FieldDeleteFailed { message, .. } => {
                format!("There was an error deleting that field: {message}")
            }
        }
    }
}

pub trait Host {
    /// Report the outcome of a save or delete. Called for every failure.
    fn notify(&self, notice: Notice);

    /// Ask the user to confirm a destructive action.
    fn confirm(&self, prompt: &str) -> bool;

    /// The template no longer exists; navigate away from the editor.
    fn leave_editor(&self);
}

impl<H: Host + ?Sized> Host for &H {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice)
    }

    fn confirm(&self, prompt: &str) -> bool {
        (**self).confirm(prompt)
    }

    fn leave_editor(&self) {
        (**self).leave_editor()
    }
}
