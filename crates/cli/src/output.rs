// Output format auto-detection for the CLI.
//
// TTY → human-readable text. Piped/redirected → structured JSON.
// `--json` flag forces JSON output regardless of terminal.

use proforma_editor::config::ConfigError;
use proforma_editor::{EditorError, Notice, RemoteError};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

use crate::exit_code::BatchFailed;

const ANSI_RED: &str = "\x1b[31m";
const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_RESET: &str = "\x1b[0m";

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON (one object per response).
    Json,
}

impl OutputFormat {
    /// Auto-detect format: JSON if `--json` was passed or stdout is not a TTY.
    pub fn detect(json_flag: bool) -> Self {
        if json_flag {
            return Self::Json;
        }
        Self::detect_from_terminal(io::stdout().is_terminal())
    }

    /// Testable variant that takes an explicit `is_tty` flag.
    pub fn detect_from_terminal(is_tty: bool) -> Self {
        if is_tty {
            Self::Human
        } else {
            Self::Json
        }
    }
}

/// Write a value to stdout in the selected format.
pub fn print_output<T, F>(format: OutputFormat, value: &T, human_fn: F) -> io::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    write_output(&mut io::stdout().lock(), format, value, human_fn)
}

/// Write a value to a provided writer (useful for testing).
pub fn write_output<W, T, F>(
    writer: &mut W,
    format: OutputFormat,
    value: &T,
    human_fn: F,
) -> io::Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Human => {
            writeln!(writer, "{}", human_fn(value))
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut *writer, value).map_err(io::Error::other)?;
            writeln!(writer)
        }
    }
}

/// Write a host notice to stderr in the selected format.
pub fn print_notice(format: OutputFormat, notice: &Notice) {
    let mut err = io::stderr().lock();
    let _ = write_notice(&mut err, format, notice, io::stderr().is_terminal());
}

fn write_notice<W: Write>(
    writer: &mut W,
    format: OutputFormat,
    notice: &Notice,
    is_tty: bool,
) -> io::Result<()> {
    match format {
        OutputFormat::Human => {
            let line = if notice.is_failure() {
                render_human_stderr_line("error", &notice.message(), is_tty, ANSI_RED)
            } else {
                render_human_stderr_line("ok", &notice.message(), is_tty, ANSI_GREEN)
            };
            writeln!(writer, "{line}")
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "notice": {
                    "entity": notice.entity().to_string(),
                    "ok": !notice.is_failure(),
                    "message": notice.message(),
                }
            });
            serde_json::to_writer(&mut *writer, &obj).map_err(io::Error::other)?;
            writeln!(writer)
        }
    }
}

/// Write an error to stderr in the selected format.
pub fn print_error(format: OutputFormat, code: &str, message: &str) {
    let mut err = io::stderr().lock();
    match format {
        OutputFormat::Human => {
            let line =
                render_human_stderr_line("error", message, io::stderr().is_terminal(), ANSI_RED);
            let _ = writeln!(err, "{line}");
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "error": {
                    "code": code,
                    "message": message,
                }
            });
            let _ = serde_json::to_writer(&mut err, &obj);
            let _ = writeln!(err);
        }
    }
}

/// Print a mapped, actionable error for a command failure.
pub fn print_anyhow_error(format: OutputFormat, error: &anyhow::Error) {
    let (code, message) = actionable_error(error);
    print_error(format, code, &message);
}

fn actionable_error(error: &anyhow::Error) -> (&'static str, String) {
    let message = format!("{error:#}");

    for cause in error.chain() {
        if cause.downcast_ref::<BatchFailed>().is_some() {
            return ("PARTIAL_SAVE", message);
        }
        if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
            return match config_err {
                ConfigError::MissingRemoteUrl => (
                    "NO_REMOTE",
                    "No server configured. Set PROFORMA_REMOTE_URL or [remote] base_url in \
                     ~/.proforma/config.toml"
                        .to_string(),
                ),
                _ => ("CONFIG_ERROR", message),
            };
        }
        let remote = cause
            .downcast_ref::<EditorError>()
            .and_then(EditorError::remote)
            .or_else(|| cause.downcast_ref::<RemoteError>());
        if let Some(remote) = remote {
            return match remote {
                RemoteError::Rejected { .. } => ("REJECTED", remote.user_message()),
                RemoteError::Unavailable(_) => (
                    "SERVER_UNREACHABLE",
                    "Could not reach the server. Check [remote] base_url in \
                     ~/.proforma/config.toml"
                        .to_string(),
                ),
                RemoteError::Malformed(_) => ("BAD_RESPONSE", remote.user_message()),
            };
        }
        if cause.downcast_ref::<EditorError>().is_some() {
            return ("EDITOR_ERROR", message);
        }
    }

    ("ERROR", message)
}

fn render_human_stderr_line(label: &str, message: &str, is_tty: bool, color: &str) -> String {
    if is_tty {
        format!("{color}{label}:{ANSI_RESET} {message}")
    } else {
        format!("{label}: {message}")
    }
}
