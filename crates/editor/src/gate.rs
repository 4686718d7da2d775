// Submit gate: owns every edit-state transition and therefore whether an
// entity's save control is enabled.
//
// The same gate serves the template and the fields; entities are named by
// `EntityRef`. Each transition is forwarded to the navigation guard so the
// "unsaved work" predicate stays exact without rescanning. The one hard rule
// is that an entity with a request in flight accepts neither edits nor a
// second request.

use thiserror::Error;
use tracing::debug;

use crate::guard::NavigationGuard;
use crate::model::{EditState, EntityRef, Resume};

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("{entity} already has a request in flight")]
    InFlight { entity: EntityRef },
    #[error("{entity} has no changes to save")]
    NothingToSave { entity: EntityRef },
    #[error("{entity} has never been saved")]
    NotPersisted { entity: EntityRef },
    #[error("{entity} is not waiting on a response")]
    NotInFlight { entity: EntityRef },
}

#[derive(Debug, Default)]
pub struct SubmitGate {
    guard: NavigationGuard,
}

impl SubmitGate {
    pub fn new(guard: NavigationGuard) -> Self {
        Self { guard }
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    pub(crate) fn guard_mut(&mut self) -> &mut NavigationGuard {
        &mut self.guard
    }

    /// The user changed one of the entity's inputs.
    pub fn on_edited(&mut self, entity: EntityRef, state: &mut EditState) -> Result<(), GateError> {
        match *state {
            EditState::Clean => {
                self.transition(entity, state, EditState::Dirty);
                Ok(())
            }
            EditState::Dirty | EditState::Unpersisted => Ok(()),
            EditState::Saving(_) | EditState::PendingDelete(_) => {
                Err(GateError::InFlight { entity })
            }
        }
    }

    /// A save request is about to be dispatched.
    pub fn on_save_started(
        &mut self,
        entity: EntityRef,
        state: &mut EditState,
    ) -> Result<(), GateError> {
        let resume = match *state {
            EditState::Dirty => Resume::Dirty,
            EditState::Unpersisted => Resume::Unpersisted,
            EditState::Clean => return Err(GateError::NothingToSave { entity }),
            EditState::Saving(_) | EditState::PendingDelete(_) => {
                return Err(GateError::InFlight { entity })
            }
        };
        self.transition(entity, state, EditState::Saving(resume));
        Ok(())
    }

    pub fn on_save_succeeded(
        &mut self,
        entity: EntityRef,
        state: &mut EditState,
    ) -> Result<(), GateError> {
        match *state {
            EditState::Saving(_) => {
                self.transition(entity, state, EditState::Clean);
                Ok(())
            }
            _ => Err(GateError::NotInFlight { entity }),
        }
    }

    /// Back to the pre-save state; the save control is enabled again.
    pub fn on_save_failed(
        &mut self,
        entity: EntityRef,
        state: &mut EditState,
    ) -> Result<(), GateError> {
        match *state {
            EditState::Saving(resume) => {
                self.transition(entity, state, resume.state());
                Ok(())
            }
            _ => Err(GateError::NotInFlight { entity }),
        }
    }

    /// A delete request is about to be dispatched for a persisted entity.
    pub fn on_delete_started(
        &mut self,
        entity: EntityRef,
        state: &mut EditState,
    ) -> Result<(), GateError> {
        let resume = match *state {
            EditState::Clean => Resume::Clean,
            EditState::Dirty => Resume::Dirty,
            EditState::Unpersisted => return Err(GateError::NotPersisted { entity }),
            EditState::Saving(_) | EditState::PendingDelete(_) => {
                return Err(GateError::InFlight { entity })
            }
        };
        self.transition(entity, state, EditState::PendingDelete(resume));
        Ok(())
    }

    pub fn on_delete_failed(
        &mut self,
        entity: EntityRef,
        state: &mut EditState,
    ) -> Result<(), GateError> {
        match *state {
            EditState::PendingDelete(resume) => {
                self.transition(entity, state, resume.state());
                Ok(())
            }
            _ => Err(GateError::NotInFlight { entity }),
        }
    }

    /// A new entity entered the session in `state`.
    pub fn on_created(&mut self, entity: EntityRef, state: EditState) {
        debug!(%entity, state = state.as_str(), "entity created");
        self.guard.track(state);
    }

    /// An entity left the session while in `state`.
    pub fn on_removed(&mut self, entity: EntityRef, state: EditState) {
        debug!(%entity, state = state.as_str(), "entity removed");
        self.guard.forget(state);
    }

    fn transition(&mut self, entity: EntityRef, state: &mut EditState, next: EditState) {
        let previous = *state;
        *state = next;
        debug!(%entity, from = previous.as_str(), to = next.as_str(), "edit state transition");
        self.guard.record(previous, next);
    }
}
