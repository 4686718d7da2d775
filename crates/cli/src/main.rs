// proforma CLI entry point.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context as _;
use clap::Parser;
use proforma_editor::EditorConfig;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_code;
mod host;
mod output;
mod patch;
mod session;
mod view;

use exit_code::ExitCode;
use output::OutputFormat;
use session::Context;

#[derive(Parser)]
#[command(name = "proforma", about = "Edit profile templates and their fields")]
struct Cli {
    /// Force JSON output.
    #[arg(long, global = true)]
    json: bool,

    /// Answer yes to every confirmation prompt.
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    /// Read configuration from this file instead of ~/.proforma/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> process::ExitCode {
    let cli = Cli::parse();
    let format = OutputFormat::detect(cli.json);
    match run(cli, format) {
        Ok(()) => ExitCode::Success.into(),
        Err(error) => {
            output::print_anyhow_error(format, &error);
            ExitCode::from_error(&error).into()
        }
    }
}

fn run(cli: Cli, format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.log_filter);
    let ctx = Context::new(format, cli.yes, config);
    commands::run(cli.command, &ctx)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EditorConfig> {
    match path {
        Some(path) => {
            let mut config = EditorConfig::load_from(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            config.apply_env();
            Ok(config)
        }
        None => EditorConfig::load().context("failed to load configuration"),
    }
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// the configured filter.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}
