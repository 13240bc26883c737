//! On-disk representation of entries and of the journal profile.
//!
//! Each entry is a pair of files named after its date: `YYYY-MM-DD.json` holds the
//! metadata document, `YYYY-MM-DD.md` the raw body. The profile lives in `config.json`.

use crate::dates::{date_key, parse_date_key};
use crate::entry::{JournalEntry, JournalEntryWithBody, Mood, WeatherContext};
use crate::error::{StoreError, StoreResult};
use crate::session::Profile;
use crate::tag::{Tag, parse_tag_list};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

pub const METADATA_EXT: &str = "json";
pub const CONTENT_EXT: &str = "md";
pub const PROFILE_FILE: &str = "config.json";

pub fn metadata_file_name(date: NaiveDate) -> String {
    format!("{}.{METADATA_EXT}", date_key(date))
}

pub fn content_file_name(date: NaiveDate) -> String {
    format!("{}.{CONTENT_EXT}", date_key(date))
}

/// Recognizes `YYYY-MM-DD.json`. The profile and any foreign file yield `None`.
pub fn date_of_metadata_file(name: &str) -> Option<NaiveDate> {
    if name == PROFILE_FILE {
        return None;
    }
    let stem = name.strip_suffix(METADATA_EXT)?.strip_suffix('.')?;
    parse_date_key(stem)
}

/// Wire shape of the metadata document. Everything is optional here so that a missing
/// field can be reported instead of failing the whole parse; optional fields stay loose
/// JSON values so one malformed optional field cannot reject the entry.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tags: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weather_context: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<Value>,
}

/// Serializes an entry into its metadata document and content blob.
pub fn encode(record: &JournalEntryWithBody) -> StoreResult<(Vec<u8>, Vec<u8>)> {
    let entry = &record.entry;
    let name = metadata_file_name(entry.date);
    let weather_context = entry
        .weather_context
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| StoreError::storage(&name, e))?;
    let doc = MetadataDocument {
        title: Some(entry.title.clone()),
        mood: Some(entry.mood.to_string()),
        timestamp: Some(entry.timestamp.to_rfc3339()),
        tags: Some(Value::from(
            entry.tags.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
        )),
        weather_context,
        created_at: entry.created_at.map(|t| Value::from(t.to_rfc3339())),
        updated_at: entry.updated_at.map(|t| Value::from(t.to_rfc3339())),
    };
    let metadata = serde_json::to_vec_pretty(&doc).map_err(|e| StoreError::storage(&name, e))?;
    Ok((metadata, record.body.as_bytes().to_vec()))
}

/// Decodes a metadata document for `date`.
///
/// Missing or malformed `title`, `mood` or `timestamp` is a [`StoreError::CorruptEntry`].
/// Optional fields that are absent or unreadable are logged and left absent (or empty
/// for `tags`); they never make the entry corrupt.
pub fn decode_metadata(date: NaiveDate, bytes: &[u8]) -> StoreResult<JournalEntry> {
    let name = metadata_file_name(date);
    let doc: MetadataDocument =
        serde_json::from_slice(bytes).map_err(|e| StoreError::corrupt(&name, e))?;

    let title = doc
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| StoreError::corrupt(&name, "missing title"))?;
    let mood = doc
        .mood
        .ok_or_else(|| StoreError::corrupt(&name, "missing mood"))
        .and_then(|m| {
            Mood::from_str(&m).map_err(|_| StoreError::corrupt(&name, format!("unknown mood {m:?}")))
        })?;
    let timestamp = doc
        .timestamp
        .as_deref()
        .and_then(parse_instant)
        .ok_or_else(|| StoreError::corrupt(&name, "missing or invalid timestamp"))?;

    Ok(JournalEntry {
        date,
        title,
        mood,
        timestamp,
        tags: doc.tags.map(|v| decode_tags(&name, v)).unwrap_or_default(),
        weather_context: doc.weather_context.and_then(|v| decode_weather(&name, v)),
        created_at: doc.created_at.and_then(|v| decode_instant(&name, "createdAt", v)),
        updated_at: doc.updated_at.and_then(|v| decode_instant(&name, "updatedAt", v)),
    })
}

/// String elements become tags; anything else is dropped with a warning.
fn decode_tags(name: &str, value: Value) -> Vec<Tag> {
    let Value::Array(items) = value else {
        tracing::warn!(file = %name, "ignoring tags that are not a list");
        return Vec::new();
    };
    let total = items.len();
    let raw: Vec<String> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect();
    if raw.len() != total {
        tracing::warn!(file = %name, dropped = total - raw.len(), "ignoring non-text tags");
    }
    parse_tag_list(raw)
}

fn decode_weather(name: &str, value: Value) -> Option<WeatherContext> {
    match serde_json::from_value(value) {
        Ok(context) => Some(context),
        Err(error) => {
            tracing::warn!(file = %name, error = %error, "ignoring unreadable weather context");
            None
        }
    }
}

fn decode_instant(name: &str, field: &str, value: Value) -> Option<DateTime<Utc>> {
    let parsed = value.as_str().and_then(parse_instant);
    if parsed.is_none() {
        tracing::warn!(file = %name, field, "ignoring unreadable timestamp");
    }
    parsed
}

/// Decodes a full record. The body is treated as opaque text.
pub fn decode(date: NaiveDate, metadata: &[u8], content: &[u8]) -> StoreResult<JournalEntryWithBody> {
    let entry = decode_metadata(date, metadata)?;
    Ok(JournalEntryWithBody {
        entry,
        body: String::from_utf8_lossy(content).into_owned(),
    })
}

pub fn encode_profile(profile: &Profile) -> StoreResult<Vec<u8>> {
    serde_json::to_vec_pretty(profile).map_err(|e| StoreError::storage(PROFILE_FILE, e))
}

pub fn decode_profile(bytes: &[u8]) -> StoreResult<Profile> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::corrupt(PROFILE_FILE, e))
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
