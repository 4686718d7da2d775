// `proforma apply`: apply a JSON edit plan in one session.
//
// Order: template edits, field edits, new fields, deletions, then a single
// save of everything still changed.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Args;
use proforma_editor::{DeleteOutcome, Editor, EditorError, EntityRef, Host, RemoteStore};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::field_key;
use crate::exit_code::BatchFailed;
use crate::output;
use crate::patch::{FieldPatch, TemplatePatch};
use crate::session::{block_on, Context};
use crate::view::{self, TemplateView};

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Path to the JSON plan, or `-` to read it from stdin.
    pub plan: PathBuf,
}

/// A batch of edits to one template.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    pub template_id: String,
    #[serde(default)]
    pub template: TemplatePatch,
    #[serde(default)]
    pub fields: Vec<FieldChange>,
    #[serde(default)]
    pub new_fields: Vec<FieldPatch>,
    #[serde(default)]
    pub delete_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldChange {
    pub field_id: String,
    #[serde(flatten)]
    pub patch: FieldPatch,
}

impl Plan {
    pub fn parse(json: &str) -> anyhow::Result<Self> {
        let plan: Self = serde_json::from_str(json).context("invalid edit plan")?;
        if plan.template_id.trim().is_empty() {
            anyhow::bail!("invalid edit plan: template_id is empty");
        }
        Ok(plan)
    }

    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let json = if path == Path::new("-") {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("failed to read plan from stdin")?;
            buf
        } else {
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read plan {}", path.display()))?
        };
        Self::parse(&json)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub entity: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub saved: usize,
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
    pub failed: Vec<Failure>,
    pub template: TemplateView,
}

impl ApplyReport {
    fn attempted(&self) -> usize {
        self.saved + self.deleted.len() + self.failed.len()
    }

    /// `Err` when any requested change did not reach the server.
    pub fn check(&self) -> Result<(), BatchFailed> {
        if self.failed.is_empty() {
            Ok(())
        } else {
            Err(BatchFailed { failed: self.failed.len(), attempted: self.attempted() })
        }
    }
}

pub fn run(args: ApplyArgs, ctx: &Context) -> anyhow::Result<()> {
    let plan = Plan::read(&args.plan)?;
    let host = ctx.host();
    let report = block_on(async {
        let mut editor = ctx.open(&host, &plan.template_id).await?;
        execute(&mut editor, &plan).await
    })??;
    output::print_output(ctx.format, &report, format_human)?;
    report.check()?;
    Ok(())
}

async fn execute<S: RemoteStore, H: Host>(
    editor: &mut Editor<S, H>,
    plan: &Plan,
) -> anyhow::Result<ApplyReport> {
    for edit in plan.template.edits() {
        editor.edit_template(edit)?;
    }
    for change in &plan.fields {
        let key = field_key(editor, &change.field_id)?;
        for edit in change.patch.edits() {
            editor.edit_field(key, edit)?;
        }
    }
    for patch in &plan.new_fields {
        let key = editor.create_field()?;
        for edit in patch.edits() {
            editor.edit_field(key, edit)?;
        }
    }
    // Resolve every id before deleting anything.
    let doomed = plan
        .delete_fields
        .iter()
        .map(|field_id| -> anyhow::Result<_> { Ok((field_id, field_key(editor, field_id)?)) })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut deleted = Vec::new();
    let mut kept = Vec::new();
    let mut failed = Vec::new();
    for (field_id, key) in doomed {
        match editor.delete_field(key).await {
            Ok(DeleteOutcome::Removed) => deleted.push(field_id.clone()),
            Ok(DeleteOutcome::Cancelled) => kept.push(field_id.clone()),
            Err(err) => failed.push(Failure {
                entity: format!("field {field_id}"),
                message: describe(&err),
            }),
        }
    }

    let batch = editor.save_all_changed().await?;
    let mut saved = batch.saved.len();
    for (entity, err) in &batch.failed {
        failed.push(Failure { entity: entity_label(editor, *entity), message: describe(err) });
    }
    // The batch leaves the template out when so configured.
    let batched_template = batch.dispatched.contains(&EntityRef::Template)
        || batch.failed.iter().any(|(entity, _)| *entity == EntityRef::Template);
    if !batched_template && editor.save_enabled(EntityRef::Template) {
        match editor.save_template().await {
            Ok(()) => saved += 1,
            Err(err) => failed.push(Failure {
                entity: entity_label(editor, EntityRef::Template),
                message: describe(&err),
            }),
        }
    }
    info!(
        template_id = %plan.template_id,
        saved,
        deleted = deleted.len(),
        failed = failed.len(),
        "plan applied"
    );

    Ok(ApplyReport {
        saved,
        deleted,
        kept,
        failed,
        template: TemplateView::from_editor(editor),
    })
}

fn describe(err: &EditorError) -> String {
    err.remote().map(|remote| remote.user_message()).unwrap_or_else(|| err.to_string())
}

fn entity_label<S: RemoteStore, H: Host>(editor: &Editor<S, H>, entity: EntityRef) -> String {
    match entity {
        EntityRef::Template => "template".to_string(),
        EntityRef::Field(key) => match editor.field(key) {
            Some(field) => match field.field_id() {
                Some(id) => format!("field {id}"),
                None => format!("new field #{}", field.index()),
            },
            None => format!("field {key}"),
        },
    }
}

fn format_human(report: &ApplyReport) -> String {
    let mut lines = vec![format!(
        "Saved {}, deleted {}, failed {}",
        report.saved,
        report.deleted.len(),
        report.failed.len()
    )];
    for field_id in &report.kept {
        lines.push(format!("  kept field {field_id} (deletion not confirmed)"));
    }
    for failure in &report.failed {
        lines.push(format!("  {}: {}", failure.entity, failure.message));
    }
    lines.push(String::new());
    lines.push(view::format_template(&report.template));
    lines.join("\n")
}
