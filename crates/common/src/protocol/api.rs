// Request/response bodies for the template store HTTP API.
//
// Upserts and deletes share a path and differ by method:
//   POST   /api/update_template         upsert template
//   DELETE /api/update_template         delete template (cascades)
//   POST   /api/update_template_field   upsert field
//   DELETE /api/update_template_field   delete field
//   GET    /api/templates/{id}          template snapshot with fields
//
// Every response body is an `Envelope`: `error` is empty on success.

use serde::{Deserialize, Serialize};

use crate::types::{FieldAttrs, TemplateAttrs};

pub const UPDATE_TEMPLATE_PATH: &str = "/api/update_template";
pub const UPDATE_TEMPLATE_FIELD_PATH: &str = "/api/update_template_field";
pub const TEMPLATES_PATH: &str = "/api/templates";

/// Path of the snapshot endpoint for one template.
pub fn template_path(template_id: &str) -> String {
    format!("{TEMPLATES_PATH}/{template_id}")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpsertTemplateRequest {
    pub template_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    #[serde(flatten)]
    pub attrs: TemplateAttrs,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteTemplateRequest {
    pub template_id: String,
}

/// Creates the field when `field_id` is absent, otherwise updates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpsertFieldRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(flatten)]
    pub attrs: FieldAttrs,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteFieldRequest {
    pub field_id: String,
}

/// Response wrapper used by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope<T> {
    #[serde(default)]
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// The server's error message, if it reported one.
    pub fn error_message(&self) -> Option<&str> {
        let message = self.error.trim();
        (!message.is_empty()).then_some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;
    use serde_json::json;

    #[test]
    fn new_field_request_omits_field_id() {
        let request = UpsertFieldRequest {
            template_id: Some("t1".into()),
            field_id: None,
            attrs: FieldAttrs { name: "Age".into(), ..FieldAttrs::default() },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("field_id").is_none());
        assert_eq!(value["template_id"], "t1");
        assert_eq!(value["type"], "1000-CHAR");
        assert_eq!(value["timeout"], 300);
    }

    #[test]
    fn existing_field_request_carries_field_id() {
        let request = UpsertFieldRequest {
            template_id: Some("t1".into()),
            field_id: Some("f1".into()),
            attrs: FieldAttrs { field_type: FieldType::Image, ..FieldAttrs::default() },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["field_id"], "f1");
        assert_eq!(value["type"], "IMAGE");
    }

    #[test]
    fn envelope_error_message_ignores_blank() {
        let ok: Envelope<()> = serde_json::from_value(json!({ "error": "" })).unwrap();
        assert_eq!(ok.error_message(), None);

        let failed: Envelope<()> =
            serde_json::from_value(json!({ "error": "Template does not exist." })).unwrap();
        assert_eq!(failed.error_message(), Some("Template does not exist."));
    }

    #[test]
    fn template_path_appends_id() {
        assert_eq!(template_path("abc"), "/api/templates/abc");
    }
}
