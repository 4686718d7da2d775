// Navigation guard: "is there unsaved work?" for the whole editor session.
//
// The predicate is maintained incrementally. The submit gate reports every
// state transition, entity creation and removal; the guard keeps a count of
// entities whose state is unsaved and republishes the boolean on a watch
// channel whenever it flips. Nothing here scans the model.

use tokio::sync::watch;
use tracing::debug;

use crate::host::Host;
use crate::model::EditState;

pub const LEAVE_PROMPT: &str = "You have unsaved changes. Leave the editor and discard them?";

/// Outcome of an attempt to leave the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    Leave,
    Stay,
}

#[derive(Debug)]
pub struct NavigationGuard {
    unsaved: usize,
    tx: watch::Sender<bool>,
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationGuard {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { unsaved: 0, tx }
    }

    pub fn has_unsaved_work(&self) -> bool {
        self.unsaved > 0
    }

    /// Number of entities currently holding unsaved work.
    pub fn unsaved_entities(&self) -> usize {
        self.unsaved
    }

    /// Follow the predicate as it changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Decide whether the user may leave. Asks the host only when work
    /// would be lost.
    pub fn check_leave<H: Host + ?Sized>(&self, host: &H) -> LeaveDecision {
        if !self.has_unsaved_work() || host.confirm(LEAVE_PROMPT) {
            LeaveDecision::Leave
        } else {
            LeaveDecision::Stay
        }
    }

    pub(crate) fn record(&mut self, from: EditState, to: EditState) {
        match (from.is_unsaved(), to.is_unsaved()) {
            (false, true) => self.unsaved += 1,
            (true, false) => self.unsaved = self.unsaved.saturating_sub(1),
            _ => return,
        }
        self.publish();
    }

    /// A new entity joined the session.
    pub(crate) fn track(&mut self, state: EditState) {
        if state.is_unsaved() {
            self.unsaved += 1;
            self.publish();
        }
    }

    /// An entity left the session.
    pub(crate) fn forget(&mut self, state: EditState) {
        if state.is_unsaved() {
            self.unsaved = self.unsaved.saturating_sub(1);
            self.publish();
        }
    }

    /// Start over from a freshly hydrated model.
    pub(crate) fn reset_to(&mut self, unsaved: usize) {
        self.unsaved = unsaved;
        self.publish();
    }

    fn publish(&self) {
        let armed = self.unsaved > 0;
        let flipped = self.tx.send_if_modified(|current| {
            if *current == armed {
                return false;
            }
            *current = armed;
            true
        });
        if flipped {
            debug!(armed, unsaved = self.unsaved, "navigation guard changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Resume;
    use std::cell::{Cell, RefCell};

    struct ScriptedHost {
        answer: bool,
        prompts: RefCell<Vec<String>>,
        left: Cell<bool>,
    }

    impl ScriptedHost {
        fn answering(answer: bool) -> Self {
            Self { answer, prompts: RefCell::new(Vec::new()), left: Cell::new(false) }
        }
    }

    impl Host for ScriptedHost {
        fn notify(&self, _notice: crate::host::Notice) {}

        fn confirm(&self, prompt: &str) -> bool {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.answer
        }

        fn leave_editor(&self) {
            self.left.set(true);
        }
    }

    #[test]
    fn starts_disarmed() {
        let guard = NavigationGuard::new();
        assert!(!guard.has_unsaved_work());
        assert!(!*guard.subscribe().borrow());
    }

    #[test]
    fn counts_transitions_into_and_out_of_unsaved() {
        let mut guard = NavigationGuard::new();
        guard.record(EditState::Clean, EditState::Dirty);
        guard.record(EditState::Clean, EditState::Dirty);
        assert_eq!(guard.unsaved_entities(), 2);

        // Dirty → Saving stays unsaved.
        guard.record(EditState::Dirty, EditState::Saving(Resume::Dirty));
        assert_eq!(guard.unsaved_entities(), 2);

        guard.record(EditState::Saving(Resume::Dirty), EditState::Clean);
        assert_eq!(guard.unsaved_entities(), 1);
        assert!(guard.has_unsaved_work());

        guard.record(EditState::Dirty, EditState::Clean);
        assert!(!guard.has_unsaved_work());
    }

    #[test]
    fn track_and_forget_only_count_unsaved_states() {
        let mut guard = NavigationGuard::new();
        guard.track(EditState::Clean);
        assert_eq!(guard.unsaved_entities(), 0);
        guard.track(EditState::Unpersisted);
        assert_eq!(guard.unsaved_entities(), 1);
        guard.forget(EditState::PendingDelete(Resume::Clean));
        assert_eq!(guard.unsaved_entities(), 1);
        guard.forget(EditState::Unpersisted);
        assert_eq!(guard.unsaved_entities(), 0);
    }

    #[test]
    fn watch_channel_follows_flips() {
        let mut guard = NavigationGuard::new();
        let mut rx = guard.subscribe();

        guard.track(EditState::Unpersisted);
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());

        // Second unsaved entity does not flip the flag.
        guard.record(EditState::Clean, EditState::Dirty);
        assert!(!rx.has_changed().unwrap());

        guard.reset_to(0);
        assert!(rx.has_changed().unwrap());
        assert!(!*rx.borrow_and_update());
    }

    #[test]
    fn leaving_without_unsaved_work_never_prompts() {
        let guard = NavigationGuard::new();
        let host = ScriptedHost::answering(false);
        assert_eq!(guard.check_leave(&host), LeaveDecision::Leave);
        assert!(host.prompts.borrow().is_empty());
    }

    #[test]
    fn leaving_with_unsaved_work_requires_confirmation() {
        let mut guard = NavigationGuard::new();
        guard.track(EditState::Unpersisted);

        let refuse = ScriptedHost::answering(false);
        assert_eq!(guard.check_leave(&refuse), LeaveDecision::Stay);
        assert_eq!(refuse.prompts.borrow().as_slice(), [LEAVE_PROMPT]);

        let accept = ScriptedHost::answering(true);
        assert_eq!(guard.check_leave(&accept), LeaveDecision::Leave);
        assert!(!accept.left.get());
    }
}
