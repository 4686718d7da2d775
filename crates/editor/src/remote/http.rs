// HTTP adapter for the template store API.
//
// JSON bodies both ways; every response is an `Envelope`. A request is
// rejected when the status is not 2xx or when the envelope carries a
// non-empty `error`.

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use proforma_common::protocol::api::{
    DeleteFieldRequest, DeleteTemplateRequest, Envelope, UpsertFieldRequest,
    UpsertTemplateRequest, TEMPLATES_PATH, UPDATE_TEMPLATE_FIELD_PATH, UPDATE_TEMPLATE_PATH,
};
use proforma_common::types::{FieldRecord, TemplateRecord, TemplateSnapshot};

use super::{RemoteError, RemoteStore};
use crate::config::RemoteConfig;

#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpRemoteStore {
    /// `base_url` is the site root; API paths are resolved beneath it.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn from_config(base_url: Url, config: &RemoteConfig) -> Result<Self, reqwest::Error> {
        Self::new(base_url, config.request_timeout())
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| RemoteError::Malformed(format!("invalid request url for {path}: {e}")))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, RemoteError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.error_message().map(str::to_string))
                .unwrap_or_else(|| fallback_message(status, &body));
            warn!(status = status.as_u16(), error = %message, "remote rejected request");
            return Err(RemoteError::Rejected { status: status.as_u16(), message });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }
        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| RemoteError::Malformed(e.to_string()))?;
        if let Some(message) = envelope.error_message() {
            warn!(status = status.as_u16(), error = %message, "remote reported error");
            return Err(RemoteError::Rejected {
                status: status.as_u16(),
                message: message.to_string(),
            });
        }
        Ok(envelope.data)
    }
}

impl RemoteStore for HttpRemoteStore {
    async fn fetch_template(&self, template_id: String) -> Result<TemplateSnapshot, RemoteError> {
        let mut url = self.endpoint(TEMPLATES_PATH)?;
        url.path_segments_mut()
            .map_err(|()| RemoteError::Malformed("base url cannot carry a path".into()))?
            .push(&template_id);
        debug!(%url, "fetching template");

        self.send(self.client.get(url))
            .await?
            .ok_or_else(|| RemoteError::Malformed("snapshot response carried no data".into()))
    }

    async fn upsert_template(
        &self,
        request: UpsertTemplateRequest,
    ) -> Result<Option<TemplateRecord>, RemoteError> {
        let url = self.endpoint(UPDATE_TEMPLATE_PATH)?;
        debug!(%url, template_id = %request.template_id, "saving template");

        // An undecodable echo counts as no echo.
        let echo: Option<serde_json::Value> = self.send(self.client.post(url).json(&request)).await?;
        Ok(echo.and_then(|value| match serde_json::from_value::<TemplateRecord>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, "ignoring undecodable template echo");
                None
            }
        }))
    }

    async fn delete_template(&self, template_id: String) -> Result<(), RemoteError> {
        let url = self.endpoint(UPDATE_TEMPLATE_PATH)?;
        debug!(%url, %template_id, "deleting template");
        let body = DeleteTemplateRequest { template_id };
        self.send::<serde_json::Value>(self.client.delete(url).json(&body)).await?;
        Ok(())
    }

    async fn upsert_field(&self, request: UpsertFieldRequest) -> Result<FieldRecord, RemoteError> {
        let url = self.endpoint(UPDATE_TEMPLATE_FIELD_PATH)?;
        debug!(%url, field_id = ?request.field_id, "saving field");
        self.send(self.client.post(url).json(&request))
            .await?
            .ok_or_else(|| RemoteError::Malformed("field response carried no data".into()))
    }

    async fn delete_field(&self, field_id: String) -> Result<(), RemoteError> {
        let url = self.endpoint(UPDATE_TEMPLATE_FIELD_PATH)?;
        debug!(%url, %field_id, "deleting field");
        let body = DeleteFieldRequest { field_id };
        self.send::<serde_json::Value>(self.client.delete(url).json(&body)).await?;
        Ok(())
    }
}

fn transport_error(error: reqwest::Error) -> RemoteError {
    warn!(error = %error, "remote request failed");
    if error.is_decode() {
        RemoteError::Malformed(error.to_string())
    } else {
        RemoteError::Unavailable(error.to_string())
    }
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status.canonical_reason().map_or_else(|| status.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base: &str) -> HttpRemoteStore {
        HttpRemoteStore::with_client(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn endpoints_resolve_under_base_path() {
        let root = store("http://localhost:5000");
        assert_eq!(
            root.endpoint(UPDATE_TEMPLATE_PATH).unwrap().as_str(),
            "http://localhost:5000/api/update_template"
        );

        let nested = store("https://example.com/forms");
        assert_eq!(nested.base_url().as_str(), "https://example.com/forms/");
        assert_eq!(
            nested.endpoint(UPDATE_TEMPLATE_FIELD_PATH).unwrap().as_str(),
            "https://example.com/forms/api/update_template_field"
        );
    }

    #[test]
    fn fallback_prefers_body_then_reason() {
        assert_eq!(fallback_message(StatusCode::BAD_GATEWAY, " upstream down \n"), "upstream down");
        assert_eq!(fallback_message(StatusCode::NOT_FOUND, ""), "Not Found");
    }
}
