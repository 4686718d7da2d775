// Serializable views of a session for command output.

use proforma_common::types::{FieldAttrs, TemplateAttrs};
use proforma_editor::model::{Field, Template};
use proforma_editor::{Editor, Host, RemoteStore};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TemplateView {
    pub template_id: String,
    pub guild_id: String,
    #[serde(flatten)]
    pub attrs: TemplateAttrs,
    pub state: &'static str,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub field_id: Option<String>,
    pub index: u32,
    #[serde(flatten)]
    pub attrs: FieldAttrs,
    pub state: &'static str,
}

impl TemplateView {
    pub fn from_editor<S: RemoteStore, H: Host>(editor: &Editor<S, H>) -> Self {
        Self::new(editor.template(), editor.fields())
    }

    pub fn new(template: &Template, fields: &[Field]) -> Self {
        Self {
            template_id: template.id().to_string(),
            guild_id: template.guild_id().to_string(),
            attrs: template.attrs().clone(),
            state: template.state().as_str(),
            fields: fields.iter().map(FieldView::from).collect(),
        }
    }
}

impl From<&Field> for FieldView {
    fn from(field: &Field) -> Self {
        Self {
            field_id: field.field_id().map(str::to_string),
            index: field.index(),
            attrs: field.attrs().clone(),
            state: field.state().as_str(),
        }
    }
}

fn or_unset(id: &Option<String>) -> &str {
    id.as_deref().unwrap_or("(unset)")
}

pub fn format_template(view: &TemplateView) -> String {
    let mut lines = vec![
        format!("# {} ({})", view.attrs.name, view.template_id),
        format!("guild:         {}", view.guild_id),
        format!("verification:  {}", or_unset(&view.attrs.verification_channel_id)),
        format!("archive:       {}", or_unset(&view.attrs.archive_channel_id)),
        format!("role:          {}", or_unset(&view.attrs.role_id)),
        format!("max profiles:  {}", view.attrs.max_profile_count),
    ];
    if view.fields.is_empty() {
        lines.push(String::new());
        lines.push("No fields.".to_string());
        return lines.join("\n");
    }
    lines.push(String::new());
    lines.push(format!(
        "{:<4} {:<10} {:<24} {:<10} {:>7}  {:<8}  PROMPT",
        "IDX", "ID", "NAME", "TYPE", "TIMEOUT", "OPTIONAL"
    ));
    for field in &view.fields {
        lines.push(format_field_row(field));
    }
    lines.join("\n")
}

pub fn format_field_row(field: &FieldView) -> String {
    format!(
        "{:<4} {:<10} {:<24} {:<10} {:>6}s  {:<8}  {}",
        field.index,
        field.field_id.as_deref().unwrap_or("(new)"),
        truncate(&field.attrs.name, 24),
        field.attrs.field_type.as_str(),
        field.attrs.timeout,
        if field.attrs.optional { "yes" } else { "no" },
        truncate(&field.attrs.prompt, 48),
    )
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
