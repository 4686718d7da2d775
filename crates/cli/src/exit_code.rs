// Consistent exit codes for the proforma CLI.
//
//   0  = success
//   1  = general error
//   2  = usage/argument error
//   3  = configuration error
//   10 = server not reachable
//   11 = server rejected a change
//   12 = some changes in a batch were not saved

use std::fmt;
use std::process;

use proforma_editor::config::ConfigError;
use proforma_editor::{EditorError, RemoteError};

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    Config = 3,
    Unavailable = 10,
    Rejected = 11,
    Partial = 12,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if cause.downcast_ref::<BatchFailed>().is_some() {
                return Self::Partial;
            }
            if cause.downcast_ref::<ConfigError>().is_some() {
                return Self::Config;
            }
            if let Some(editor_err) = cause.downcast_ref::<EditorError>() {
                return Self::from_editor_error(editor_err);
            }
            if let Some(remote_err) = cause.downcast_ref::<RemoteError>() {
                return Self::from_remote_error(remote_err);
            }
        }
        Self::Error
    }

    pub fn from_editor_error(err: &EditorError) -> Self {
        if let Some(remote) = err.remote() {
            return Self::from_remote_error(remote);
        }
        match err {
            EditorError::Gate(_) | EditorError::UnknownField(_) | EditorError::Closed => Self::Usage,
            _ => Self::Error,
        }
    }

    pub fn from_remote_error(err: &RemoteError) -> Self {
        match err {
            RemoteError::Rejected { .. } => Self::Rejected,
            RemoteError::Unavailable(_) | RemoteError::Malformed(_) => Self::Unavailable,
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code() as u8)
    }
}

/// Some entities in a batch were not saved. Their notices were already shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchFailed {
    pub failed: usize,
    pub attempted: usize,
}

impl fmt::Display for BatchFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} changes were not saved", self.failed, self.attempted)
    }
}

impl std::error::Error for BatchFailed {}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;
    use proforma_editor::gate::GateError;
    use proforma_editor::EntityRef;

    #[test]
    fn exit_code_values() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::Error.code(), 1);
        assert_eq!(ExitCode::Usage.code(), 2);
        assert_eq!(ExitCode::Config.code(), 3);
        assert_eq!(ExitCode::Unavailable.code(), 10);
        assert_eq!(ExitCode::Rejected.code(), 11);
        assert_eq!(ExitCode::Partial.code(), 12);
    }

    #[test]
    fn rejected_save_maps_to_rejected() {
        let err = anyhow::Error::new(EditorError::SaveFailed {
            entity: EntityRef::Template,
            source: RemoteError::Rejected { status: 400, message: "Name is required.".into() },
        });
        assert_eq!(ExitCode::from_error(&err), ExitCode::Rejected);
    }

    #[test]
    fn failed_load_maps_to_unavailable() {
        let err = anyhow::Error::new(EditorError::Load(RemoteError::Unavailable("refused".into())))
            .context("failed to open template t1");
        assert_eq!(ExitCode::from_error(&err), ExitCode::Unavailable);
    }

    #[test]
    fn gate_refusal_is_a_usage_error() {
        let err = anyhow::Error::new(EditorError::from(GateError::NothingToSave {
            entity: EntityRef::Template,
        }));
        assert_eq!(ExitCode::from_error(&err), ExitCode::Usage);
    }

    #[test]
    fn config_errors_in_chain() {
        let err: anyhow::Result<()> =
            Err(ConfigError::MissingRemoteUrl).context("no remote configured");
        assert_eq!(ExitCode::from_error(&err.unwrap_err()), ExitCode::Config);
    }

    #[test]
    fn batch_failure_is_partial() {
        let err = anyhow::Error::new(BatchFailed { failed: 1, attempted: 3 });
        assert_eq!(ExitCode::from_error(&err), ExitCode::Partial);
        assert_eq!(err.to_string(), "1 of 3 changes were not saved");
    }

    #[test]
    fn from_error_generic_is_error() {
        let err = anyhow::anyhow!("something went wrong");
        assert_eq!(ExitCode::from_error(&err), ExitCode::Error);
    }

    #[test]
    fn exit_code_to_process_exit_code() {
        let code: process::ExitCode = ExitCode::Partial.into();
        let _ = code;
    }
}
