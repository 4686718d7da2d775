// Synchronization orchestrator: one editor session against a remote store.
//
// Every remote operation runs in two phases. `dispatch_*` moves the entity
// into its in-flight state and hands back an `InFlight` future that owns
// everything the request needs; `apply` takes the `Settled` result and
// updates the model. The future never touches the editor, so a host can
// keep several of them in flight and apply results in arrival order. The
// async one-shots (`save_field`, `delete_field`, ...) are dispatch + await
// + apply.
//
// Responses are correlated by entity key and session epoch. A response
// whose epoch is gone (reload, template deleted) or whose entity is no
// longer waiting on it is stale and leaves the model untouched.

mod batch;

pub use batch::BatchReport;

use std::fmt;
use std::future::{Future, IntoFuture};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use proforma_common::protocol::api::{UpsertFieldRequest, UpsertTemplateRequest};
use proforma_common::types::{FieldRecord, TemplateRecord, TemplateSnapshot};

use crate::config::BehaviorConfig;
use crate::error::EditorError;
use crate::gate::{GateError, SubmitGate};
use crate::guard::{LeaveDecision, NavigationGuard};
use crate::host::{Host, Notice, DELETE_FIELD_PROMPT, DELETE_TEMPLATE_PROMPT};
use crate::lifecycle::{self, DeletePlan};
use crate::model::{
    EditState, EntityModel, EntityRef, Field, FieldEdit, FieldKey, SessionEpoch, Template,
    TemplateEdit,
};
use crate::remote::{RemoteError, RemoteStore};

// ── In-flight requests ──────────────────────────────────────────────

/// A dispatched request. Await it (or push it into a `FuturesUnordered`)
/// and hand the result to [`Editor::apply`].
pub struct InFlight {
    entity: EntityRef,
    future: BoxFuture<'static, Settled>,
}

impl InFlight {
    fn new(entity: EntityRef, future: impl Future<Output = Settled> + Send + 'static) -> Self {
        Self { entity, future: Box::pin(future) }
    }

    pub fn entity(&self) -> EntityRef {
        self.entity
    }
}

impl IntoFuture for InFlight {
    type Output = Settled;
    type IntoFuture = BoxFuture<'static, Settled>;

    fn into_future(self) -> Self::IntoFuture {
        self.future
    }
}

impl fmt::Debug for InFlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlight").field("entity", &self.entity).finish_non_exhaustive()
    }
}

/// The remote's answer to one dispatched request.
#[derive(Debug, Clone)]
pub enum Settled {
    TemplateSaved { epoch: SessionEpoch, result: Result<Option<TemplateRecord>, RemoteError> },
    TemplateDeleted { epoch: SessionEpoch, result: Result<(), RemoteError> },
    FieldSaved { epoch: SessionEpoch, key: FieldKey, result: Result<FieldRecord, RemoteError> },
    FieldDeleted { epoch: SessionEpoch, key: FieldKey, result: Result<(), RemoteError> },
}

impl Settled {
    pub fn entity(&self) -> EntityRef {
        match self {
            Self::TemplateSaved { .. } | Self::TemplateDeleted { .. } => EntityRef::Template,
            Self::FieldSaved { key, .. } | Self::FieldDeleted { key, .. } => EntityRef::Field(*key),
        }
    }

    fn epoch(&self) -> SessionEpoch {
        match self {
            Self::TemplateSaved { epoch, .. }
            | Self::TemplateDeleted { epoch, .. }
            | Self::FieldSaved { epoch, .. }
            | Self::FieldDeleted { epoch, .. } => *epoch,
        }
    }
}

/// Result of starting a delete.
#[derive(Debug)]
pub enum Deletion {
    /// Removed without a request (the field was never saved).
    Removed,
    /// The host declined the confirmation prompt.
    Cancelled,
    Pending(InFlight),
}

/// Result of a completed delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    Cancelled,
}

// ── Editor session ──────────────────────────────────────────────────

pub struct Editor<S, H> {
    store: Arc<S>,
    host: H,
    settings: BehaviorConfig,
    model: EntityModel,
    gate: SubmitGate,
    closed: bool,
}

impl<S, H> fmt::Debug for Editor<S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("model", &self.model)
            .field("gate", &self.gate)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl<S: RemoteStore, H: Host> Editor<S, H> {
    /// Fetch a template and open an editor session on it.
    pub async fn open(
        store: Arc<S>,
        host: H,
        settings: BehaviorConfig,
        template_id: &str,
    ) -> Result<Self, EditorError> {
        let snapshot = store.fetch_template(template_id.to_string()).await.map_err(|e| {
            warn!(%template_id, error = %e, "failed to load template");
            EditorError::Load(e)
        })?;
        Ok(Self::from_snapshot(store, host, settings, snapshot))
    }

    /// Open a session on state the host already has.
    pub fn from_snapshot(
        store: Arc<S>,
        host: H,
        settings: BehaviorConfig,
        snapshot: TemplateSnapshot,
    ) -> Self {
        let model = EntityModel::hydrate(snapshot);
        info!(template_id = %model.template().id(), fields = model.fields().len(), "editor opened");
        Self { store, host, settings, model, gate: SubmitGate::default(), closed: false }
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub fn model(&self) -> &EntityModel {
        &self.model
    }

    pub fn template(&self) -> &Template {
        self.model.template()
    }

    pub fn fields(&self) -> &[Field] {
        self.model.fields()
    }

    pub fn field(&self, key: FieldKey) -> Option<&Field> {
        self.model.field(key)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn settings(&self) -> BehaviorConfig {
        self.settings
    }

    /// True once the template has been deleted; every operation is refused.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn guard(&self) -> &NavigationGuard {
        self.gate.guard()
    }

    pub fn has_unsaved_work(&self) -> bool {
        self.gate.guard().has_unsaved_work()
    }

    /// Follow the unsaved-work flag as it changes.
    pub fn unsaved_changes(&self) -> watch::Receiver<bool> {
        self.gate.guard().subscribe()
    }

    /// Whether the save control for `entity` is enabled.
    pub fn save_enabled(&self, entity: EntityRef) -> bool {
        !self.closed && self.model.state_of(entity).is_some_and(EditState::save_enabled)
    }

    /// Ask to leave the editor; prompts through the host only when work
    /// would be lost.
    pub fn check_leave(&self) -> LeaveDecision {
        self.gate.guard().check_leave(&self.host)
    }

    // ── Local edits ─────────────────────────────────────────────────

    pub fn edit_template(&mut self, edit: TemplateEdit) -> Result<(), EditorError> {
        self.ensure_open()?;
        let template = self.model.template_mut();
        self.gate.on_edited(EntityRef::Template, &mut template.state)?;
        edit.apply_to(&mut template.attrs);
        Ok(())
    }

    pub fn edit_field(&mut self, key: FieldKey, edit: FieldEdit) -> Result<(), EditorError> {
        self.ensure_open()?;
        let field = self.model.field_mut(key).ok_or(EditorError::UnknownField(key))?;
        self.gate.on_edited(EntityRef::Field(key), &mut field.state)?;
        edit.apply_to(&mut field.attrs);
        Ok(())
    }

    /// Add a new field at the end of the collection. Nothing is sent until
    /// it is saved.
    pub fn create_field(&mut self) -> Result<FieldKey, EditorError> {
        self.ensure_open()?;
        Ok(lifecycle::create_field(&mut self.model, &mut self.gate))
    }

    // ── Dispatch ────────────────────────────────────────────────────

    pub fn dispatch_save(&mut self, entity: EntityRef) -> Result<InFlight, EditorError> {
        match entity {
            EntityRef::Template => self.dispatch_template_save(),
            EntityRef::Field(key) => self.dispatch_field_save(key),
        }
    }

    pub fn dispatch_template_save(&mut self) -> Result<InFlight, EditorError> {
        self.ensure_open()?;
        let epoch = self.model.epoch();
        let template = self.model.template_mut();
        self.gate.on_save_started(EntityRef::Template, &mut template.state)?;

        let request = UpsertTemplateRequest {
            template_id: template.id.clone(),
            guild_id: Some(template.guild_id.clone()),
            attrs: template.attrs.clone(),
        };
        debug!(template_id = %request.template_id, "template save dispatched");
        let store = Arc::clone(&self.store);
        Ok(InFlight::new(EntityRef::Template, async move {
            Settled::TemplateSaved { epoch, result: store.upsert_template(request).await }
        }))
    }

    pub fn dispatch_field_save(&mut self, key: FieldKey) -> Result<InFlight, EditorError> {
        self.ensure_open()?;
        let epoch = self.model.epoch();
        let field = self.model.field_mut(key).ok_or(EditorError::UnknownField(key))?;
        self.gate.on_save_started(EntityRef::Field(key), &mut field.state)?;

        let request = UpsertFieldRequest {
            template_id: Some(field.template_id.clone()),
            field_id: field.field_id.clone(),
            attrs: field.attrs.clone(),
        };
        debug!(field = %key, field_id = ?request.field_id, "field save dispatched");
        let store = Arc::clone(&self.store);
        Ok(InFlight::new(EntityRef::Field(key), async move {
            Settled::FieldSaved { epoch, key, result: store.upsert_field(request).await }
        }))
    }

    /// Start deleting a field. Unsaved fields are dropped on the spot;
    /// saved ones are confirmed with the host (when configured) and sent.
    pub fn dispatch_field_delete(&mut self, key: FieldKey) -> Result<Deletion, EditorError> {
        self.ensure_open()?;
        let field_id = match lifecycle::delete_plan(&self.model, key)? {
            DeletePlan::Local => {
                lifecycle::remove(&mut self.model, &mut self.gate, key)?;
                info!(field = %key, "unsaved field discarded");
                return Ok(Deletion::Removed);
            }
            DeletePlan::Remote { field_id } => field_id,
        };
        if self.settings.confirm_field_delete && !self.host.confirm(DELETE_FIELD_PROMPT) {
            debug!(field = %key, "field delete cancelled");
            return Ok(Deletion::Cancelled);
        }

        let epoch = self.model.epoch();
        let field = self.model.field_mut(key).ok_or(EditorError::UnknownField(key))?;
        self.gate.on_delete_started(EntityRef::Field(key), &mut field.state)?;
        debug!(field = %key, %field_id, "field delete dispatched");
        let store = Arc::clone(&self.store);
        Ok(Deletion::Pending(InFlight::new(EntityRef::Field(key), async move {
            Settled::FieldDeleted { epoch, key, result: store.delete_field(field_id).await }
        })))
    }

    /// Start deleting the template. Always confirmed with the host.
    pub fn dispatch_template_delete(&mut self) -> Result<Deletion, EditorError> {
        self.ensure_open()?;
        if self.model.template().state().in_flight() {
            return Err(GateError::InFlight { entity: EntityRef::Template }.into());
        }
        if !self.host.confirm(DELETE_TEMPLATE_PROMPT) {
            debug!("template delete cancelled");
            return Ok(Deletion::Cancelled);
        }

        let epoch = self.model.epoch();
        let template = self.model.template_mut();
        self.gate.on_delete_started(EntityRef::Template, &mut template.state)?;
        let template_id = template.id.clone();
        debug!(%template_id, "template delete dispatched");
        let store = Arc::clone(&self.store);
        Ok(Deletion::Pending(InFlight::new(EntityRef::Template, async move {
            Settled::TemplateDeleted { epoch, result: store.delete_template(template_id).await }
        })))
    }

    // ── Apply ───────────────────────────────────────────────────────

    /// Apply a settled request to the model. `Ok` when the remote accepted
    /// it; the remote failure (already reported to the host) otherwise.
    pub fn apply(&mut self, settled: Settled) -> Result<(), EditorError> {
        let entity = settled.entity();
        let expected = match &settled {
            Settled::TemplateSaved { .. } | Settled::FieldSaved { .. } => {
                matches!(self.model.state_of(entity), Some(EditState::Saving(_)))
            }
            Settled::TemplateDeleted { .. } | Settled::FieldDeleted { .. } => {
                matches!(self.model.state_of(entity), Some(EditState::PendingDelete(_)))
            }
        };
        if self.closed || settled.epoch() != self.model.epoch() || !expected {
            warn!(%entity, "discarding stale response");
            return Err(EditorError::StaleResponse { entity });
        }

        match settled {
            Settled::TemplateSaved { result, .. } => self.apply_template_saved(result),
            Settled::TemplateDeleted { result, .. } => self.apply_template_deleted(result),
            Settled::FieldSaved { key, result, .. } => self.apply_field_saved(key, result),
            Settled::FieldDeleted { key, result, .. } => self.apply_field_deleted(key, result),
        }
    }

    fn apply_template_saved(
        &mut self,
        result: Result<Option<TemplateRecord>, RemoteError>,
    ) -> Result<(), EditorError> {
        let entity = EntityRef::Template;
        let template = self.model.template_mut();
        match result {
            Ok(echo) => {
                if let Some(record) = echo {
                    template.attrs = record.attrs;
                }
                self.gate.on_save_succeeded(entity, &mut template.state)?;
                info!(template_id = %template.id, "template saved");
                self.host.notify(Notice::TemplateSaved);
                Ok(())
            }
            Err(source) => {
                self.gate.on_save_failed(entity, &mut template.state)?;
                warn!(template_id = %template.id, error = %source, "template save failed");
                self.host.notify(Notice::TemplateSaveFailed { message: source.user_message() });
                Err(EditorError::SaveFailed { entity, source })
            }
        }
    }

    fn apply_template_deleted(&mut self, result: Result<(), RemoteError>) -> Result<(), EditorError> {
        let entity = EntityRef::Template;
        match result {
            Ok(()) => {
                self.closed = true;
                self.gate.guard_mut().reset_to(0);
                info!(template_id = %self.model.template().id(), "template deleted; session closed");
                self.host.notify(Notice::TemplateDeleted);
                self.host.leave_editor();
                Ok(())
            }
            Err(source) => {
                let template = self.model.template_mut();
                self.gate.on_delete_failed(entity, &mut template.state)?;
                warn!(template_id = %template.id, error = %source, "template delete failed");
                self.host.notify(Notice::TemplateDeleteFailed { message: source.user_message() });
                Err(EditorError::DeleteFailed { entity, source })
            }
        }
    }

    fn apply_field_saved(
        &mut self,
        key: FieldKey,
        result: Result<FieldRecord, RemoteError>,
    ) -> Result<(), EditorError> {
        let entity = EntityRef::Field(key);
        match result {
            Ok(record) => {
                let field_id = record.field_id.clone();
                let index = record.index;
                lifecycle::reconcile_after_save(&mut self.model, key, record)?;
                let field = self.model.field_mut(key).ok_or(EditorError::UnknownField(key))?;
                self.gate.on_save_succeeded(entity, &mut field.state)?;
                info!(field = %key, %field_id, index, "field saved");
                self.host.notify(Notice::FieldSaved { key, field_id });
                Ok(())
            }
            Err(source) => {
                let field = self.model.field_mut(key).ok_or(EditorError::UnknownField(key))?;
                self.gate.on_save_failed(entity, &mut field.state)?;
                warn!(field = %key, error = %source, "field save failed");
                self.host.notify(Notice::FieldSaveFailed { key, message: source.user_message() });
                Err(EditorError::SaveFailed { entity, source })
            }
        }
    }

    fn apply_field_deleted(
        &mut self,
        key: FieldKey,
        result: Result<(), RemoteError>,
    ) -> Result<(), EditorError> {
        let entity = EntityRef::Field(key);
        match result {
            Ok(()) => {
                let field = lifecycle::remove(&mut self.model, &mut self.gate, key)?;
                info!(field = %key, field_id = ?field.field_id(), "field deleted");
                self.host.notify(Notice::FieldDeleted { key });
                Ok(())
            }
            Err(source) => {
                let field = self.model.field_mut(key).ok_or(EditorError::UnknownField(key))?;
                self.gate.on_delete_failed(entity, &mut field.state)?;
                warn!(field = %key, error = %source, "field delete failed");
                self.host.notify(Notice::FieldDeleteFailed { key, message: source.user_message() });
                Err(EditorError::DeleteFailed { entity, source })
            }
        }
    }

    // ── One-shot operations ─────────────────────────────────────────

    pub async fn save_template(&mut self) -> Result<(), EditorError> {
        let settled = self.dispatch_template_save()?.await;
        self.apply(settled)
    }

    pub async fn save_field(&mut self, key: FieldKey) -> Result<(), EditorError> {
        let settled = self.dispatch_field_save(key)?.await;
        self.apply(settled)
    }

    pub async fn delete_field(&mut self, key: FieldKey) -> Result<DeleteOutcome, EditorError> {
        let deletion = self.dispatch_field_delete(key)?;
        self.finish_deletion(deletion).await
    }

    /// Delete the template. On success the host is told to leave and the
    /// session is closed.
    pub async fn delete_template(&mut self) -> Result<DeleteOutcome, EditorError> {
        let deletion = self.dispatch_template_delete()?;
        self.finish_deletion(deletion).await
    }

    async fn finish_deletion(&mut self, deletion: Deletion) -> Result<DeleteOutcome, EditorError> {
        match deletion {
            Deletion::Removed => Ok(DeleteOutcome::Removed),
            Deletion::Cancelled => Ok(DeleteOutcome::Cancelled),
            Deletion::Pending(in_flight) => {
                let settled = in_flight.await;
                self.apply(settled).map(|()| DeleteOutcome::Removed)
            }
        }
    }

    /// Discard every local edit by re-fetching the template. Responses to
    /// requests dispatched before the reload become stale.
    pub async fn reload(&mut self) -> Result<(), EditorError> {
        self.ensure_open()?;
        let template_id = self.model.template().id().to_string();
        let snapshot = self.store.fetch_template(template_id.clone()).await.map_err(|e| {
            warn!(%template_id, error = %e, "failed to reload template");
            EditorError::Load(e)
        })?;
        self.model = EntityModel::hydrate(snapshot);
        self.gate.guard_mut().reset_to(self.model.unsaved_count());
        info!(%template_id, fields = self.model.fields().len(), "editor reloaded");
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), EditorError> {
        if self.closed {
            Err(EditorError::Closed)
        } else {
            Ok(())
        }
    }
}
