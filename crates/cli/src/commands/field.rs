// `proforma field`: add, change or delete a single field.

use anyhow::{bail, Context as _};
use clap::{Args, Subcommand};
use proforma_editor::{DeleteOutcome, FieldKey};
use serde::Serialize;

use super::field_key;
use crate::output;
use crate::patch::FieldPatch;
use crate::session::{block_on, Context, Session};
use crate::view::{self, FieldView};

#[derive(Debug, Args)]
pub struct FieldArgs {
    #[command(subcommand)]
    command: FieldCommand,
}

#[derive(Debug, Subcommand)]
enum FieldCommand {
    /// Append a new field to a template and save it
    Add(AddArgs),
    /// Change a field and save it
    Set(SetArgs),
    /// Delete a field
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Template id.
    template_id: String,

    #[command(flatten)]
    patch: FieldPatch,
}

#[derive(Debug, Args)]
struct SetArgs {
    /// Template id.
    template_id: String,

    /// Field id.
    field_id: String,

    #[command(flatten)]
    patch: FieldPatch,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    /// Template id.
    template_id: String,

    /// Field id.
    field_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub template_id: String,
    pub field_id: String,
    pub deleted: bool,
}

pub fn run(args: FieldArgs, ctx: &Context) -> anyhow::Result<()> {
    match args.command {
        FieldCommand::Add(args) => add(args, ctx),
        FieldCommand::Set(args) => set(args, ctx),
        FieldCommand::Delete(args) => delete(args, ctx),
    }
}

fn add(args: AddArgs, ctx: &Context) -> anyhow::Result<()> {
    let host = ctx.host();
    let view = block_on(async {
        let mut editor = ctx.open(&host, &args.template_id).await?;
        let key = editor.create_field()?;
        save_with_edits(&mut editor, key, &args.patch).await
    })??;
    output::print_output(ctx.format, &view, view::format_field_row)?;
    Ok(())
}

fn set(args: SetArgs, ctx: &Context) -> anyhow::Result<()> {
    if args.patch.is_empty() {
        bail!("nothing to change; pass at least one attribute (see --help)");
    }
    let host = ctx.host();
    let view = block_on(async {
        let mut editor = ctx.open(&host, &args.template_id).await?;
        let key = field_key(&editor, &args.field_id)?;
        save_with_edits(&mut editor, key, &args.patch).await
    })??;
    output::print_output(ctx.format, &view, view::format_field_row)?;
    Ok(())
}

async fn save_with_edits(
    editor: &mut Session<'_>,
    key: FieldKey,
    patch: &FieldPatch,
) -> anyhow::Result<FieldView> {
    for edit in patch.edits() {
        editor.edit_field(key, edit)?;
    }
    editor.save_field(key).await.context("failed to save field")?;
    let field = editor.field(key).context("saved field left the session")?;
    Ok(FieldView::from(field))
}

fn delete(args: DeleteArgs, ctx: &Context) -> anyhow::Result<()> {
    let host = ctx.host();
    let outcome = block_on(async {
        let mut editor = ctx.open(&host, &args.template_id).await?;
        let key = field_key(&editor, &args.field_id)?;
        editor
            .delete_field(key)
            .await
            .with_context(|| format!("failed to delete field {}", args.field_id))
    })??;
    let result = DeleteResult {
        template_id: args.template_id,
        field_id: args.field_id,
        deleted: outcome == DeleteOutcome::Removed,
    };
    output::print_output(ctx.format, &result, format_delete)?;
    Ok(())
}

fn format_delete(result: &DeleteResult) -> String {
    if result.deleted {
        format!("Deleted field {} from template {}", result.field_id, result.template_id)
    } else {
        format!("Kept field {}", result.field_id)
    }
}
