//! Canonical parse/serialize pair for task tags.
//!
//! Tags are entered as a single comma-separated string and stored as a JSON
//! list. Older rows may still hold the delimited string form, so every read
//! goes through [`from_stored`] and nothing downstream ever sees anything
//! other than a `Vec<String>`.

use serde::Deserialize;
use serde_json::Value;

/// Tags as they arrive from a form or an API payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    /// `"work, urgent"`
    Delimited(String),
    /// `["work", "urgent"]`
    List(Vec<String>),
}

impl Default for TagsInput {
    fn default() -> Self {
        TagsInput::List(Vec::new())
    }
}

impl TagsInput {
    /// Normalizes the input into a trimmed tag list.
    ///
    /// Already-list values pass through unchanged.
    pub fn into_tags(self) -> Vec<String> {
        match self {
            TagsInput::Delimited(text) => parse_tags(&text),
            TagsInput::List(tags) => tags,
        }
    }
}

impl From<&str> for TagsInput {
    fn from(text: &str) -> Self {
        TagsInput::Delimited(text.to_string())
    }
}

/// Splits a comma-separated string into trimmed tags, skipping blank entries.
pub fn parse_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins tags back into the form used by the edit form.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}

/// Encodes tags for the `tags` column.
pub fn to_stored(tags: &[String]) -> Value {
    Value::Array(tags.iter().cloned().map(Value::String).collect())
}

/// Decodes the `tags` column, accepting both the list and the delimited form.
///
/// Returns `None` when the value is neither.
pub fn from_stored(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Null => Some(Vec::new()),
        Value::String(text) => Some(parse_tags(text)),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}
