// Attribute patches shared by the flag-driven commands and `apply` plans.

use clap::Args;
use proforma_common::types::FieldType;
use proforma_editor::{FieldEdit, TemplateEdit};
use serde::{de, Deserialize, Deserializer};

/// Template settings to change. Empty ids clear a channel or role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatePatch {
    /// New template name.
    #[arg(long)]
    pub name: Option<String>,

    /// Channel that receives profiles for approval ("" to clear).
    #[arg(long = "verification-channel", value_name = "CHANNEL_ID")]
    pub verification_channel_id: Option<String>,

    /// Channel that approved profiles are archived to ("" to clear).
    #[arg(long = "archive-channel", value_name = "CHANNEL_ID")]
    pub archive_channel_id: Option<String>,

    /// Role granted once a profile is approved ("" to clear).
    #[arg(long = "role", value_name = "ROLE_ID")]
    pub role_id: Option<String>,

    /// How many profiles one member may keep.
    #[arg(long = "max-profiles", value_name = "COUNT")]
    pub max_profile_count: Option<u32>,
}

impl TemplatePatch {
    pub fn is_empty(&self) -> bool {
        self.edits().is_empty()
    }

    pub fn edits(&self) -> Vec<TemplateEdit> {
        let mut edits = Vec::new();
        if let Some(name) = &self.name {
            edits.push(TemplateEdit::Name(name.clone()));
        }
        if let Some(id) = &self.verification_channel_id {
            edits.push(TemplateEdit::VerificationChannel(snowflake(id)));
        }
        if let Some(id) = &self.archive_channel_id {
            edits.push(TemplateEdit::ArchiveChannel(snowflake(id)));
        }
        if let Some(id) = &self.role_id {
            edits.push(TemplateEdit::Role(snowflake(id)));
        }
        if let Some(count) = self.max_profile_count {
            edits.push(TemplateEdit::MaxProfileCount(count));
        }
        edits
    }
}

/// Field attributes to change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args, Deserialize)]
#[serde(default)]
pub struct FieldPatch {
    /// Field name shown on the profile.
    #[arg(long)]
    pub name: Option<String>,

    /// Question the member is asked.
    #[arg(long)]
    pub prompt: Option<String>,

    /// Seconds the member has to answer.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u32>,

    /// Answer kind: text, number, image or boolean.
    #[arg(long = "type", value_name = "TYPE")]
    #[serde(rename = "type", deserialize_with = "field_type")]
    pub field_type: Option<FieldType>,

    /// Whether the member may skip the question.
    #[arg(long, value_name = "BOOL")]
    pub optional: Option<bool>,
}

impl FieldPatch {
    pub fn is_empty(&self) -> bool {
        self.edits().is_empty()
    }

    pub fn edits(&self) -> Vec<FieldEdit> {
        let mut edits = Vec::new();
        if let Some(name) = &self.name {
            edits.push(FieldEdit::Name(name.clone()));
        }
        if let Some(prompt) = &self.prompt {
            edits.push(FieldEdit::Prompt(prompt.clone()));
        }
        if let Some(timeout) = self.timeout {
            edits.push(FieldEdit::Timeout(timeout));
        }
        if let Some(field_type) = self.field_type {
            edits.push(FieldEdit::Type(field_type));
        }
        if let Some(optional) = self.optional {
            edits.push(FieldEdit::Optional(optional));
        }
        edits
    }
}

fn snowflake(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// Plans accept the friendly names as well as the wire names.
fn field_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<FieldType>, D::Error> {
    Option::<String>::deserialize(deserializer)?
        .map(|raw| raw.parse().map_err(de::Error::custom))
        .transpose()
}
