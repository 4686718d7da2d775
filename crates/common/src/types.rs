// Core domain records shared by the editor engine and its hosts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Timeout given to a freshly created field, in seconds.
pub const DEFAULT_FIELD_TIMEOUT_SECS: u32 = 300;

/// Editable attributes of a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TemplateAttrs {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// Channel that submitted profiles are sent to for approval.
    #[serde(default, deserialize_with = "optional_id")]
    pub verification_channel_id: Option<String>,
    /// Channel that approved profiles are archived to.
    #[serde(default, deserialize_with = "optional_id")]
    pub archive_channel_id: Option<String>,
    /// Role given to members once a profile is approved.
    #[serde(default, deserialize_with = "optional_id")]
    pub role_id: Option<String>,
    #[serde(default)]
    pub max_profile_count: u32,
}

/// The kind of answer a field accepts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum FieldType {
    #[default]
    #[serde(rename = "1000-CHAR")]
    Text,
    #[serde(rename = "INT")]
    Number,
    #[serde(rename = "IMAGE")]
    Image,
    #[serde(rename = "BOOLEAN")]
    Boolean,
}

impl FieldType {
    pub const ALL: [FieldType; 4] = [Self::Text, Self::Number, Self::Image, Self::Boolean];

    /// Wire name, as stored by the server.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "1000-CHAR",
            Self::Number => "INT",
            Self::Image => "IMAGE",
            Self::Boolean => "BOOLEAN",
        }
    }

    /// Accepts both wire names and the friendly names used on the command line.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1000-char" | "text" => Some(Self::Text),
            "int" | "number" => Some(Self::Number),
            "image" => Some(Self::Image),
            "boolean" | "bool" => Some(Self::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown field type `{0}` (expected text, number, image or boolean)")]
pub struct UnknownFieldType(pub String);

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownFieldType(s.to_string()))
    }
}

/// Editable attributes of a field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldAttrs {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub prompt: String,
    /// Seconds the member has to answer the prompt.
    pub timeout: u32,
    // The server's column is `field_type`; requests use `type`.
    #[serde(rename = "type", alias = "field_type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub optional: bool,
}

impl Default for FieldAttrs {
    fn default() -> Self {
        Self {
            name: String::new(),
            prompt: String::new(),
            timeout: DEFAULT_FIELD_TIMEOUT_SECS,
            field_type: FieldType::Text,
            optional: false,
        }
    }
}

/// A persisted template as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateRecord {
    #[serde(deserialize_with = "required_id")]
    pub template_id: String,
    #[serde(deserialize_with = "required_id")]
    pub guild_id: String,
    #[serde(flatten)]
    pub attrs: TemplateAttrs,
}

/// A persisted field as returned by the server. `index` is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldRecord {
    #[serde(deserialize_with = "required_id")]
    pub field_id: String,
    #[serde(default, deserialize_with = "optional_id", skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub index: u32,
    #[serde(flatten)]
    pub attrs: FieldAttrs,
}

/// Everything needed to hydrate an editor session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateSnapshot {
    #[serde(flatten)]
    pub template: TemplateRecord,
    #[serde(default)]
    pub fields: Vec<FieldRecord>,
}

// ── Lenient id decoding ─────────────────────────────────────────────
//
// Discord snowflakes are stored as bigints server-side and may arrive as
// JSON numbers; blank strings mean "unset".

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Number(number) => number.to_string(),
        }
    }
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawId>::deserialize(deserializer)?;
    Ok(raw.map(RawId::into_string).filter(|id| !id.is_empty()))
}

fn required_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(RawId::into_string)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_type_uses_server_names() {
        assert_eq!(serde_json::to_value(FieldType::Text).unwrap(), json!("1000-CHAR"));
        assert_eq!(serde_json::to_value(FieldType::Boolean).unwrap(), json!("BOOLEAN"));
        let parsed: FieldType = serde_json::from_value(json!("INT")).unwrap();
        assert_eq!(parsed, FieldType::Number);
    }

    #[test]
    fn field_type_parses_friendly_names() {
        assert_eq!("text".parse::<FieldType>(), Ok(FieldType::Text));
        assert_eq!(" Number ".parse::<FieldType>(), Ok(FieldType::Number));
        assert_eq!("bool".parse::<FieldType>(), Ok(FieldType::Boolean));
        assert_eq!("1000-CHAR".parse::<FieldType>(), Ok(FieldType::Text));
        assert!("colour".parse::<FieldType>().is_err());
    }

    #[test]
    fn field_attrs_default_is_blank_text_field() {
        let attrs = FieldAttrs::default();
        assert!(attrs.name.is_empty());
        assert!(attrs.prompt.is_empty());
        assert_eq!(attrs.timeout, DEFAULT_FIELD_TIMEOUT_SECS);
        assert_eq!(attrs.field_type, FieldType::Text);
        assert!(!attrs.optional);
    }

    #[test]
    fn field_record_accepts_server_row() {
        // Shape of a `RETURNING *` row from the field table.
        let row = json!({
            "field_id": "f2",
            "template_id": "t1",
            "index": 1,
            "name": "Age",
            "prompt": null,
            "timeout": 120,
            "field_type": "INT",
            "optional": true,
            "deleted": false
        });
        let record: FieldRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.field_id, "f2");
        assert_eq!(record.template_id.as_deref(), Some("t1"));
        assert_eq!(record.index, 1);
        assert_eq!(record.attrs.name, "Age");
        assert_eq!(record.attrs.prompt, "");
        assert_eq!(record.attrs.field_type, FieldType::Number);
        assert!(record.attrs.optional);
    }

    #[test]
    fn template_record_accepts_numeric_snowflakes() {
        let row = json!({
            "template_id": "t1",
            "guild_id": 208895639164026880u64,
            "name": "Intro",
            "verification_channel_id": 123,
            "archive_channel_id": "",
            "role_id": null,
            "max_profile_count": 3
        });
        let record: TemplateRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.guild_id, "208895639164026880");
        assert_eq!(record.attrs.verification_channel_id.as_deref(), Some("123"));
        assert_eq!(record.attrs.archive_channel_id, None);
        assert_eq!(record.attrs.role_id, None);
        assert_eq!(record.attrs.max_profile_count, 3);
    }

    #[test]
    fn snapshot_without_fields_is_empty_collection() {
        let snapshot: TemplateSnapshot = serde_json::from_value(json!({
            "template_id": "t1",
            "guild_id": "g1",
            "name": "Intro",
            "max_profile_count": 1
        }))
        .unwrap();
        assert!(snapshot.fields.is_empty());
        assert_eq!(snapshot.template.attrs.name, "Intro");
    }
}
