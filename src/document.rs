//! Content file loading and effective document data.
//!
//! A content file is an optional YAML frontmatter block followed by a
//! markdown body:
//!
//! ```text
//! ---
//! title: Hello
//! published: 2020-01-01
//! ---
//! # Body in *markdown*
//! ```
//!
//! Effective data is layered: configured defaults, then frontmatter, then
//! caller overrides (URLs, canonical), then the computed `description`,
//! `content` and `header` fields. Later layers win.

use crate::assets::Asset;
use crate::config::BuildSettings;
use crate::date::DateError;
use crate::head::{self, HeadError, HeadOptions, HeadTags};
use crate::markdown::Converter;
use crate::render::{RenderError, Renderer};
use crate::types::{Data, overlay, scalar_str};
use chrono::{DateTime, Utc};
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

const DELIMITER: &str = "---";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid frontmatter: {0}")]
    Frontmatter(#[from] serde_yaml::Error),
    #[error("Frontmatter must be a mapping")]
    NotAMapping,
    #[error(transparent)]
    Date(#[from] DateError),
    #[error(transparent)]
    Head(#[from] HeadError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A content file split into metadata and body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceDocument {
    pub matter: Data,
    pub body: String,
}

/// Shared, read-only state for computing documents.
pub struct BuildContext<'a> {
    pub settings: &'a BuildSettings,
    pub converter: &'a dyn Converter,
    pub renderer: &'a dyn Renderer,
    pub assets: &'a [Asset],
    /// Build time every publish and release decision is measured against.
    pub now: DateTime<Utc>,
}

impl BuildContext<'_> {
    pub fn head_options(&self) -> HeadOptions<'_> {
        HeadOptions {
            date_format: &self.settings.date_format,
            default_locale: self.settings.default_locale.as_deref(),
            assets: self.assets,
        }
    }
}

/// Split text into frontmatter and body.
///
/// Frontmatter must start on the first line and be closed by a second `---`
/// line. Otherwise the whole text is body.
pub fn split_frontmatter(text: &str) -> (Option<&str>, &str) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let first_end = text.find('\n').map_or(text.len(), |i| i + 1);
    if !is_delimiter(&text[..first_end]) {
        return (None, text);
    }
    let rest = &text[first_end..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if is_delimiter(line) {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, text)
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches(['\r', '\n']) == DELIMITER
}

/// Parse a frontmatter block into ordered data.
pub fn parse_matter(matter: &str) -> Result<Data, DocumentError> {
    if matter.trim().is_empty() {
        return Ok(Data::new());
    }
    match serde_yaml::from_str::<Value>(matter)? {
        Value::Null => Ok(Data::new()),
        Value::Mapping(mapping) => Ok(mapping
            .into_iter()
            .map(|(key, value)| (key_string(&key), value))
            .collect()),
        _ => Err(DocumentError::NotAMapping),
    }
}

fn key_string(key: &Value) -> String {
    scalar_str(key).unwrap_or_else(|| {
        serde_yaml::to_string(key)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default()
    })
}

/// Parse a whole content file.
pub fn parse(text: &str) -> Result<SourceDocument, DocumentError> {
    let (matter, body) = split_frontmatter(text);
    let matter = match matter {
        Some(matter) => parse_matter(matter)?,
        None => Data::new(),
    };
    Ok(SourceDocument {
        matter,
        body: body.to_string(),
    })
}

/// Read and parse a content file.
pub fn load(path: &Path) -> Result<SourceDocument, DocumentError> {
    parse(&fs::read_to_string(path)?)
}

impl SourceDocument {
    /// Defaults overlaid with frontmatter and then `overrides`.
    pub fn layered(&self, defaults: &Data, overrides: &Data) -> Data {
        overlay(&[defaults, &self.matter, overrides])
    }
}

/// Add the computed fields to layered document data.
///
/// `header` is composed from `data` as passed in, before `description` is
/// replaced by its converted form.
pub fn finish(
    ctx: &BuildContext,
    tags: &mut HeadTags,
    mut data: Data,
    body: &str,
) -> Result<Data, DocumentError> {
    let header = head::compose(tags, &data, &ctx.head_options())?;
    let description = data
        .get("description")
        .and_then(scalar_str)
        .map(|d| ctx.converter.convert(&d))
        .unwrap_or_default();
    data.insert("description".into(), Value::String(description));
    data.insert("content".into(), Value::String(ctx.converter.convert(body)));
    data.insert("header".into(), Value::String(header));
    Ok(data)
}
