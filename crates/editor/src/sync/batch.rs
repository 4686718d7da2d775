// "Save all changed": one save per entity whose save control is enabled,
// all in flight together, applied as they arrive.

use futures_util::stream::{FuturesUnordered, StreamExt};
use std::future::IntoFuture;
use tracing::{info, warn};

use super::Editor;
use crate::error::EditorError;
use crate::host::Host;
use crate::model::EntityRef;
use crate::remote::RemoteStore;

/// Per-entity outcome of [`Editor::save_all_changed`].
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Entities a save was dispatched for, in dispatch order.
    pub dispatched: Vec<EntityRef>,
    /// Entities saved, in arrival order.
    pub saved: Vec<EntityRef>,
    pub failed: Vec<(EntityRef, EditorError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<S: RemoteStore, H: Host> Editor<S, H> {
    /// Save the template (when configured) and every field in collection
    /// order whose save control is enabled. Returns once every dispatched
    /// request has settled. One failure never holds back another.
    pub async fn save_all_changed(&mut self) -> Result<BatchReport, EditorError> {
        self.ensure_open()?;

        let mut targets = Vec::new();
        if self.settings.save_template_with_batch && self.model.template().save_enabled() {
            targets.push(EntityRef::Template);
        }
        targets.extend(
            self.model
                .fields()
                .iter()
                .filter(|field| field.save_enabled())
                .map(|field| EntityRef::Field(field.key())),
        );

        let mut report = BatchReport::default();
        let mut pending = FuturesUnordered::new();
        for entity in targets {
            match self.dispatch_save(entity) {
                Ok(in_flight) => {
                    report.dispatched.push(entity);
                    pending.push(in_flight.into_future());
                }
                Err(error) => {
                    warn!(%entity, error = %error, "batch save not dispatched");
                    report.failed.push((entity, error));
                }
            }
        }
        info!(dispatched = report.dispatched.len(), "batch save started");

        while let Some(settled) = pending.next().await {
            let entity = settled.entity();
            match self.apply(settled) {
                Ok(()) => report.saved.push(entity),
                Err(error) => report.failed.push((entity, error)),
            }
        }

        info!(saved = report.saved.len(), failed = report.failed.len(), "batch save finished");
        Ok(report)
    }
}
