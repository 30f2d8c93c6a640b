//! Tag column encoding.
//!
//! Rows written by different clients store `tags` either as a native JSON
//! array or as a string holding a Postgres array literal (`{a,b}`) or a JSON
//! array (`["a","b"]`). Everything decodes to an ordered list of unique
//! tags, and any other JSON decodes to no tags. Writes are always a native
//! array.

use serde::{Deserialize, Serialize};

/// The tags column as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonicalTagValue {
    List(Vec<String>),
    ScalarString(String),
    /// Any other JSON (numbers, objects, mixed arrays); decodes to no tags
    Other(serde_json::Value),
}

impl CanonicalTagValue {
    /// Normalize to an ordered list of unique, non-blank tags. Never fails.
    pub fn into_list(self) -> Vec<String> {
        let list = match self {
            CanonicalTagValue::List(list) => list,
            CanonicalTagValue::ScalarString(raw) => decode_scalar(&raw),
            CanonicalTagValue::Other(value) => {
                tracing::debug!("Ignoring non-string tags value: {value}");
                Vec::new()
            }
        };
        merge_unique(&list, &[])
    }
}

/// Decode a nullable tags column.
pub fn decode(value: Option<CanonicalTagValue>) -> Vec<String> {
    value.map(CanonicalTagValue::into_list).unwrap_or_default()
}

/// Encode tags for writing: always the native list form.
pub fn encode(tags: &[String]) -> CanonicalTagValue {
    CanonicalTagValue::List(tags.to_vec())
}

fn decode_scalar(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if let Some(inner) = trimmed
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
    {
        return inner
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(String::from)
            .collect();
    }

    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        match serde_json::from_str::<Vec<String>>(trimmed) {
            Ok(list) => return list,
            Err(e) => tracing::debug!("Tags look like JSON but failed to parse: {e}"),
        }
    }

    vec![raw.to_string()]
}

/// Append `extra` tags not already present, keeping first-seen order.
pub fn merge_unique(existing: &[String], extra: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + extra.len());
    for tag in existing.iter().chain(extra) {
        let tag = tag.trim();
        if !tag.is_empty() && !merged.iter().any(|t| t == tag) {
            merged.push(tag.to_string());
        }
    }
    merged
}
