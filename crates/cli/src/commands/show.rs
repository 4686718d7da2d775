// `proforma show`: print a template and its fields.

use clap::Args;

use crate::output;
use crate::session::{block_on, Context};
use crate::view::{self, TemplateView};

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Template id.
    pub template_id: String,
}

pub fn run(args: ShowArgs, ctx: &Context) -> anyhow::Result<()> {
    let host = ctx.host();
    let view = block_on(async {
        let editor = ctx.open(&host, &args.template_id).await?;
        anyhow::Ok(TemplateView::from_editor(&editor))
    })??;
    output::print_output(ctx.format, &view, view::format_template)?;
    Ok(())
}
