use thiserror::Error;

use crate::gate::GateError;
use crate::model::{EntityRef, FieldKey};
use crate::remote::RemoteError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error("no field with key {0} in this session")]
    UnknownField(FieldKey),
    #[error("the editor session is closed")]
    Closed,
    #[error("response for {entity} does not belong to the current session")]
    StaleResponse { entity: EntityRef },
    #[error("saving {entity} failed: {source}")]
    SaveFailed { entity: EntityRef, source: RemoteError },
    #[error("deleting {entity} failed: {source}")]
    DeleteFailed { entity: EntityRef, source: RemoteError },
    #[error("loading the template failed: {0}")]
    Load(RemoteError),
}

impl EditorError {
    /// The remote failure behind this error, if any.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::SaveFailed { source, .. } | Self::DeleteFailed { source, .. } => Some(source),
            Self::Load(source) => Some(source),
            _ => None,
        }
    }
}
