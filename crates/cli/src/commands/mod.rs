// CLI subcommand dispatch.

use anyhow::anyhow;
use clap::Subcommand;
use proforma_editor::model::Field;
use proforma_editor::{Editor, FieldKey, Host, RemoteStore};

use crate::session::Context;

pub mod apply;
pub mod field;
pub mod show;
pub mod template;

#[derive(Subcommand)]
pub enum Command {
    /// Show a template and its fields
    Show(show::ShowArgs),
    /// Change or delete a template
    Template(template::TemplateArgs),
    /// Add, change or delete one field
    Field(field::FieldArgs),
    /// Apply a JSON edit plan and save every change in one batch
    Apply(apply::ApplyArgs),
}

pub fn run(cmd: Command, ctx: &Context) -> anyhow::Result<()> {
    match cmd {
        Command::Show(args) => show::run(args, ctx),
        Command::Template(args) => template::run(args, ctx),
        Command::Field(args) => field::run(args, ctx),
        Command::Apply(args) => apply::run(args, ctx),
    }
}

/// Resolve a server field id to its key in this session.
fn field_key<S: RemoteStore, H: Host>(
    editor: &Editor<S, H>,
    field_id: &str,
) -> anyhow::Result<FieldKey> {
    editor
        .model()
        .field_by_id(field_id)
        .map(Field::key)
        .ok_or_else(|| anyhow!("template {} has no field {field_id}", editor.template().id()))
}
