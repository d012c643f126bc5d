//! Shared types used across all pipeline stages.
//!
//! Document data flows through the build as an ordered map of frontmatter
//! keys to YAML values. Keeping the YAML value type (rather than converting
//! to JSON) preserves tagged values such as `!meta {...}`, which the head
//! composer treats as pre-built metadata objects.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

/// Ordered document data: frontmatter, configured defaults, computed fields.
pub type Data = IndexMap<String, serde_yaml::Value>;

/// Overlay data layers in order. Later layers override earlier ones key by
/// key; a key keeps the position where it first appeared.
pub fn overlay(layers: &[&Data]) -> Data {
    let mut merged = Data::new();
    for layer in layers {
        for (key, value) in layer.iter() {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Read a scalar field as a string.
///
/// Strings are returned as-is, numbers and booleans are stringified. Null,
/// sequences, mappings and tagged values yield `None`.
pub fn scalar_str(value: &serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A successfully built, published article.
///
/// Serializes as its effective document data only; the extracted fields are
/// kept alongside for sorting and URL filtering.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct BuildRecord {
    /// Source path relative to the content root (`posts/a.md`).
    #[serde(skip)]
    pub source: String,
    /// Site-relative output directory (`posts/a/`).
    #[serde(skip)]
    pub generated_url: String,
    /// `site_url` joined with `generated_url`.
    #[serde(skip)]
    pub absolute_url: String,
    /// Parsed `modified` timestamp, the list sort key.
    #[serde(skip)]
    pub modified: Option<DateTime<Utc>>,
    pub data: Data,
}
