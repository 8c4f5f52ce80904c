//! Wire types for the upstream feature API.
//!
//! The upstream is loose about its payloads: `fields` and `extensions` may be
//! missing or `null`, attachment arrays may be `null`, and scalar fields are
//! not always the type the schema suggests. Deserialization here is lenient
//! so a single odd value does not reject the whole feature.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// One feature object as the upstream returns it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteFeature {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_string_or_empty")]
    pub geom: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub version: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: RemoteFields,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extensions: RemoteExtensions,
    #[serde(default, deserialize_with = "lenient_attachments")]
    pub attachments: Vec<RemoteAttachment>,
}

impl RemoteFeature {
    /// Parses a feature out of an arbitrary JSON value.
    ///
    /// Fails only when the value is not an object or has no usable `id`.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| format!("expected a feature object, got {}", json_kind(value)))?;
        match obj.get("id") {
            None | Some(Value::Null) => return Err("feature has no id".to_string()),
            Some(id) if id.as_i64().is_none() => {
                return Err(format!("feature id is not an integer: {id}"));
            }
            Some(_) => {}
        }
        serde_json::from_value(value.clone()).map_err(|e| e.to_string())
    }

    /// Both attachment sources in wire order: top-level first, then
    /// `extensions.attachment`.
    pub fn attachment_candidates(&self) -> impl Iterator<Item = &RemoteAttachment> {
        self.attachments
            .iter()
            .chain(self.extensions.attachment.iter().flatten())
    }
}

/// Flat attribute block of a feature.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteFields {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub fid_1: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub num: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub n_raion: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub fio: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub years: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub kontrakt: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub nagrads: Option<String>,
    /// Upstream fields this gateway does not project; passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteExtensions {
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_attachments")]
    pub attachment: Option<Vec<RemoteAttachment>>,
}

/// Attachment metadata as listed on a feature.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteAttachment {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub keyname: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64_or_zero")]
    pub size: i64,
    #[serde(default, deserialize_with = "lenient_string_or_empty")]
    pub mime_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_image: bool,
    #[serde(default)]
    pub file_meta: Value,
}

/// Body the gateway sends on create/update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureDraft {
    pub geom: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: RemoteFields,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extensions: RemoteExtensions,
}

/// `{id, version}` returned by create and update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureWriteResponse {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub version: Option<i64>,
}

/// One entry of `upload_meta` from the file-upload component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadMeta {
    pub id: String,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Short JSON kind name for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Lenient deserializers ──

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    })
}

fn lenient_string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_i64_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_i64(deserializer)?.unwrap_or(0))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Null => Ok(false),
        Value::Number(n) => Ok(n.as_i64().is_some_and(|v| v != 0)),
        Value::String(s) => match s.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            other => Err(de::Error::custom(format!("not a boolean: {other}"))),
        },
        other => Err(de::Error::custom(format!(
            "not a boolean: {}",
            json_kind(&other)
        ))),
    }
}

fn lenient_attachments<'de, D>(deserializer: D) -> Result<Vec<RemoteAttachment>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_attachments(deserializer)?.unwrap_or_default())
}

/// Keeps every entry that parses; logs and drops the rest.
fn lenient_optional_attachments<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<RemoteAttachment>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(None),
        Value::Array(items) => items,
        other => {
            warn!(kind = json_kind(&other), "attachment list is not an array, ignoring");
            return Ok(None);
        }
    };
    let parsed = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(att) => Some(att),
            Err(e) => {
                warn!(index, error = %e, "skipping unparseable attachment entry");
                None
            }
        })
        .collect();
    Ok(Some(parsed))
}
