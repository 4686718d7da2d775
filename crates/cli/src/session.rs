// One editor session per invocation: config → HTTP store → hydrated editor.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context as _;
use proforma_editor::{EditorConfig, Editor, HttpRemoteStore};
use tracing::debug;

use crate::host::TerminalHost;
use crate::output::OutputFormat;

pub type Session<'h> = Editor<HttpRemoteStore, &'h TerminalHost>;

/// Everything a command needs besides its own arguments.
pub struct Context {
    pub format: OutputFormat,
    pub assume_yes: bool,
    pub config: EditorConfig,
}

impl Context {
    pub fn new(format: OutputFormat, assume_yes: bool, config: EditorConfig) -> Self {
        Self { format, assume_yes, config }
    }

    pub fn host(&self) -> TerminalHost {
        TerminalHost::new(self.format, self.assume_yes)
    }

    pub fn store(&self) -> anyhow::Result<Arc<HttpRemoteStore>> {
        let base_url = self.config.remote_url().context("no usable server address")?;
        let store = HttpRemoteStore::from_config(base_url, &self.config.remote)
            .context("failed to build HTTP client")?;
        Ok(Arc::new(store))
    }

    /// Fetch `template_id` and hydrate a session around it.
    pub async fn open<'h>(
        &self,
        host: &'h TerminalHost,
        template_id: &str,
    ) -> anyhow::Result<Session<'h>> {
        let store = self.store()?;
        debug!(template_id, base_url = %store.base_url(), "opening session");
        Editor::open(store, host, self.config.editor, template_id)
            .await
            .with_context(|| format!("failed to open template {template_id}"))
    }
}

/// Run a command body on a current-thread runtime.
pub fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}
