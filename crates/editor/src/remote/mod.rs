// Remote store: persistence of templates and fields.
//
// The editor only ever talks to a `RemoteStore`. Production uses the HTTP
// adapter in `http`; tests substitute scripted doubles.

pub mod http;

use std::future::Future;

use thiserror::Error;

use proforma_common::protocol::api::{UpsertFieldRequest, UpsertTemplateRequest};
use proforma_common::types::{FieldRecord, TemplateRecord, TemplateSnapshot};

pub use http::HttpRemoteStore;

/// Abstraction over the template store API. Trait-based for testability.
///
/// All methods return `Send` futures so requests can be driven from any
/// tokio runtime.
pub trait RemoteStore: Send + Sync + 'static {
    /// Fetch a template together with all of its fields.
    fn fetch_template(
        &self,
        template_id: String,
    ) -> impl Future<Output = Result<TemplateSnapshot, RemoteError>> + Send;

    /// Create or update a template. The server may echo its canonical record.
    fn upsert_template(
        &self,
        request: UpsertTemplateRequest,
    ) -> impl Future<Output = Result<Option<TemplateRecord>, RemoteError>> + Send;

    /// Delete a template and, server side, all of its fields.
    fn delete_template(
        &self,
        template_id: String,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Create (no `field_id`) or update a field; returns the authoritative record.
    fn upsert_field(
        &self,
        request: UpsertFieldRequest,
    ) -> impl Future<Output = Result<FieldRecord, RemoteError>> + Send;

    fn delete_field(&self, field_id: String) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// Errors from the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The server refused the request (validation, conflict, missing entity).
    #[error("rejected by server ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// Network unreachable, connection refused, timed out.
    #[error("remote unavailable: {0}")]
    Unavailable(String),
    /// The server answered with something we could not decode.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Text for the user. Server messages are shown verbatim; transport
    /// details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Unavailable(_) => "the server could not be reached".into(),
            Self::Malformed(_) => "the server sent an unexpected response".into(),
        }
    }
}
