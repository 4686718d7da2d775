// `proforma template`: change template settings or delete the template.

use anyhow::{bail, Context as _};
use clap::{Args, Subcommand};
use proforma_editor::DeleteOutcome;
use serde::Serialize;

use crate::output;
use crate::patch::TemplatePatch;
use crate::session::{block_on, Context};
use crate::view::{self, TemplateView};

#[derive(Debug, Args)]
pub struct TemplateArgs {
    #[command(subcommand)]
    command: TemplateCommand,
}

#[derive(Debug, Subcommand)]
enum TemplateCommand {
    /// Change template settings and save them
    Set(SetArgs),
    /// Delete the template and all of its fields
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
struct SetArgs {
    /// Template id.
    template_id: String,

    #[command(flatten)]
    patch: TemplatePatch,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    /// Template id.
    template_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub template_id: String,
    pub deleted: bool,
}

pub fn run(args: TemplateArgs, ctx: &Context) -> anyhow::Result<()> {
    match args.command {
        TemplateCommand::Set(args) => set(args, ctx),
        TemplateCommand::Delete(args) => delete(args, ctx),
    }
}

fn set(args: SetArgs, ctx: &Context) -> anyhow::Result<()> {
    if args.patch.is_empty() {
        bail!("nothing to change; pass at least one setting (see --help)");
    }
    let host = ctx.host();
    let view = block_on(async {
        let mut editor = ctx.open(&host, &args.template_id).await?;
        for edit in args.patch.edits() {
            editor.edit_template(edit)?;
        }
        editor
            .save_template()
            .await
            .with_context(|| format!("failed to save template {}", args.template_id))?;
        anyhow::Ok(TemplateView::from_editor(&editor))
    })??;
    output::print_output(ctx.format, &view, view::format_template)?;
    Ok(())
}

fn delete(args: DeleteArgs, ctx: &Context) -> anyhow::Result<()> {
    let host = ctx.host();
    let outcome = block_on(async {
        let mut editor = ctx.open(&host, &args.template_id).await?;
        editor
            .delete_template()
            .await
            .with_context(|| format!("failed to delete template {}", args.template_id))
    })??;
    let result =
        DeleteResult { template_id: args.template_id, deleted: outcome == DeleteOutcome::Removed };
    output::print_output(ctx.format, &result, format_delete)?;
    Ok(())
}

fn format_delete(result: &DeleteResult) -> String {
    if result.deleted {
        format!("Deleted template {}", result.template_id)
    } else {
        format!("Kept template {}", result.template_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_result_text() {
        let deleted = DeleteResult { template_id: "t1".into(), deleted: true };
        let kept = DeleteResult { template_id: "t1".into(), deleted: false };
        assert_eq!(format_delete(&deleted), "Deleted template t1");
        assert_eq!(format_delete(&kept), "Kept template t1");
    }
}
