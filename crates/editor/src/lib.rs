// proforma-editor: template/field editing sessions against a remote store.

pub mod config;
pub mod error;
pub mod gate;
pub mod guard;
pub mod host;
mod lifecycle;
pub mod model;
pub mod remote;
pub mod sync;

pub use config::{BehaviorConfig, EditorConfig};
pub use error::EditorError;
pub use guard::LeaveDecision;
pub use host::{Host, Notice};
pub use model::{EditState, EntityRef, FieldEdit, FieldKey, TemplateEdit};
pub use remote::{HttpRemoteStore, RemoteError, RemoteStore};
pub use sync::{BatchReport, DeleteOutcome, Deletion, Editor, InFlight, Settled};
