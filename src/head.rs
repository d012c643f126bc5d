//! Head metadata composition.
//!
//! Every generated document gets a block of `<head>` tags assembled from its
//! data in a fixed order:
//!
//! 1. **Structured objects**: top-level YAML-tagged values, passed through.
//!    ```yaml
//!    author: !meta { name: author, content: Jane }
//!    feed: !link { rel: alternate, href: /feed.xml }
//!    ```
//!    Recognized tags are `!meta`, `!og`, `!twitter`, `!article`, `!link`
//!    and `!script`. Other tags are ignored.
//! 2. **Allow-listed fields** ([`HeadField`]): scalars `charset`, `viewport`,
//!    `title`, `description`, `image`, `canonical` and maps `og`, `twitter`,
//!    `meta`. Any other key, or a listed key with the wrong shape, is ignored.
//! 3. **Derived tags**, in this order: `keywords`, `published`, `modified`,
//!    `canonical` and `hreflang` alternates.
//! 4. **Build assets** from the asset manifest, when enabled.
//!
//! Tags accumulate in a [`HeadTags`] value owned by the caller. [`compose`]
//! empties it before and after each document, so one accumulator can be
//! reused across documents on the same worker without leaking tags.

use crate::assets::{Asset, AssetKind};
use crate::date::{self, DateError};
use crate::types::{Data, scalar_str};
use maud::html;
use serde_yaml::Value;
use serde_yaml::value::TaggedValue;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeadError {
    #[error("Malformed !{tag} metadata: missing '{field}'")]
    MalformedStruct { tag: String, field: &'static str },
    #[error(transparent)]
    Date(#[from] DateError),
}

/// A single head element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadTag {
    Charset(String),
    Title(String),
    /// `<meta name=.. content=..>`
    Meta { name: String, content: String },
    /// `<meta property=.. content=..>`
    Property { property: String, content: String },
    Link {
        rel: String,
        href: String,
        hreflang: Option<String>,
    },
    Script { src: String },
}

impl HeadTag {
    fn meta(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Meta {
            name: name.into(),
            content: content.into(),
        }
    }

    fn property(property: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Property {
            property: property.into(),
            content: content.into(),
        }
    }

    fn alternate(hreflang: impl Into<String>, href: impl Into<String>) -> Self {
        Self::Link {
            rel: "alternate".into(),
            href: href.into(),
            hreflang: Some(hreflang.into()),
        }
    }

    fn render(&self) -> String {
        let markup = match self {
            Self::Charset(charset) => html! { meta charset=(charset); },
            Self::Title(title) => html! { title { (title) } },
            Self::Meta { name, content } => html! { meta name=(name) content=(content); },
            Self::Property { property, content } => {
                html! { meta property=(property) content=(content); }
            }
            Self::Link { rel, href, hreflang } => {
                html! { link rel=(rel) href=(href) hreflang=[hreflang.as_deref()]; }
            }
            Self::Script { src } => html! { script src=(src) {} },
        };
        markup.into_string()
    }
}

/// Shape a field must have to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    Map,
}

/// Document fields that map directly onto head tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadField {
    Charset,
    Viewport,
    Title,
    Description,
    Image,
    Canonical,
    Og,
    Twitter,
    Meta,
}

impl HeadField {
    pub const ALL: [HeadField; 9] = [
        HeadField::Charset,
        HeadField::Viewport,
        HeadField::Title,
        HeadField::Description,
        HeadField::Image,
        HeadField::Canonical,
        HeadField::Og,
        HeadField::Twitter,
        HeadField::Meta,
    ];

    pub fn key(self) -> &'static str {
        match self {
            HeadField::Charset => "charset",
            HeadField::Viewport => "viewport",
            HeadField::Title => "title",
            HeadField::Description => "description",
            HeadField::Image => "image",
            HeadField::Canonical => "canonical",
            HeadField::Og => "og",
            HeadField::Twitter => "twitter",
            HeadField::Meta => "meta",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    pub fn kind(self) -> FieldKind {
        match self {
            HeadField::Og | HeadField::Twitter | HeadField::Meta => FieldKind::Map,
            _ => FieldKind::Scalar,
        }
    }

    fn scalar_tags(self, value: String) -> Vec<HeadTag> {
        match self {
            HeadField::Charset => vec![HeadTag::Charset(value)],
            HeadField::Viewport => vec![HeadTag::meta("viewport", value)],
            HeadField::Title => vec![HeadTag::Title(value)],
            HeadField::Description => vec![HeadTag::meta("description", value)],
            HeadField::Image => vec![
                HeadTag::property("og:image", value.clone()),
                HeadTag::meta("twitter:image", value),
            ],
            HeadField::Canonical => vec![HeadTag::Link {
                rel: "canonical".into(),
                href: value,
                hreflang: None,
            }],
            HeadField::Og | HeadField::Twitter | HeadField::Meta => Vec::new(),
        }
    }

    fn map_entry_tag(self, key: &str, value: String) -> Option<HeadTag> {
        match self {
            HeadField::Og => Some(HeadTag::property(prefixed("og", key), value)),
            HeadField::Twitter => Some(HeadTag::meta(prefixed("twitter", key), value)),
            HeadField::Meta => Some(HeadTag::meta(key, value)),
            _ => None,
        }
    }
}

fn prefixed(namespace: &str, key: &str) -> String {
    if key.starts_with(&format!("{namespace}:")) {
        key.to_string()
    } else {
        format!("{namespace}:{key}")
    }
}

/// Settings the composer needs beyond the document itself.
#[derive(Debug, Clone, Copy)]
pub struct HeadOptions<'a> {
    pub date_format: &'a str,
    pub default_locale: Option<&'a str>,
    pub assets: &'a [Asset],
}

/// Per-document tag accumulator.
#[derive(Debug, Default)]
pub struct HeadTags {
    tags: Vec<HeadTag>,
}

impl HeadTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tag: HeadTag) {
        self.tags.push(tag);
    }

    pub fn tags(&self) -> &[HeadTag] {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Add a tagged structured-metadata object.
    ///
    /// Returns `Ok(false)` for tags the composer does not know.
    pub fn add_struct(&mut self, tagged: &TaggedValue) -> Result<bool, HeadError> {
        let tag = tagged.tag.to_string();
        let tag = tag.trim_start_matches('!');
        let field = |name: &'static str| -> Result<String, HeadError> {
            tagged
                .value
                .get(name)
                .and_then(scalar_str)
                .ok_or_else(|| HeadError::MalformedStruct {
                    tag: tag.to_string(),
                    field: name,
                })
        };
        let head_tag = match tag {
            "meta" => HeadTag::meta(field("name")?, field("content")?),
            "og" => HeadTag::property(prefixed("og", &field("property")?), field("content")?),
            "twitter" => HeadTag::meta(prefixed("twitter", &field("name")?), field("content")?),
            "article" => {
                HeadTag::property(prefixed("article", &field("property")?), field("content")?)
            }
            "link" => HeadTag::Link {
                rel: field("rel")?,
                href: field("href")?,
                hreflang: tagged.value.get("hreflang").and_then(scalar_str),
            },
            "script" => HeadTag::Script { src: field("src")? },
            _ => return Ok(false),
        };
        self.add(head_tag);
        Ok(true)
    }

    /// Add tags for every allow-listed field in `data`, in data order.
    pub fn add_from_allowlist(&mut self, data: &Data) {
        for (key, value) in data {
            let Some(field) = HeadField::from_key(key) else {
                continue;
            };
            match (field.kind(), value) {
                (FieldKind::Map, Value::Mapping(map)) => {
                    for (entry_key, entry_value) in map {
                        let (Some(entry_key), Some(entry_value)) =
                            (entry_key.as_str(), scalar_str(entry_value))
                        else {
                            continue;
                        };
                        if let Some(tag) = field.map_entry_tag(entry_key, entry_value) {
                            self.add(tag);
                        }
                    }
                }
                (FieldKind::Scalar, value) => {
                    if let Some(value) = scalar_str(value) {
                        for tag in field.scalar_tags(value) {
                            self.add(tag);
                        }
                    }
                }
                (FieldKind::Map, _) => {}
            }
        }
    }

    /// Render all tags, one per line.
    pub fn render(&self) -> String {
        self.tags
            .iter()
            .map(HeadTag::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn reset(&mut self) {
        self.tags.clear();
    }
}

/// Compose and render the head block for one document.
///
/// The accumulator is empty when this returns, whether or not it succeeded.
pub fn compose(
    tags: &mut HeadTags,
    data: &Data,
    options: &HeadOptions,
) -> Result<String, HeadError> {
    tags.reset();
    let result = fill(tags, data, options).map(|()| tags.render());
    tags.reset();
    result
}

fn fill(tags: &mut HeadTags, data: &Data, options: &HeadOptions) -> Result<(), HeadError> {
    for value in data.values() {
        if let Value::Tagged(tagged) = value {
            tags.add_struct(tagged)?;
        }
    }

    tags.add_from_allowlist(data);
    add_derived(tags, data, options)?;

    for asset in options.assets {
        tags.add(match asset.kind {
            AssetKind::Style => HeadTag::Link {
                rel: "stylesheet".into(),
                href: asset.url.clone(),
                hreflang: None,
            },
            AssetKind::Script => HeadTag::Script {
                src: asset.url.clone(),
            },
        });
    }
    Ok(())
}

fn add_derived(tags: &mut HeadTags, data: &Data, options: &HeadOptions) -> Result<(), HeadError> {
    if let Some(keywords) = data.get("keywords").and_then(keywords) {
        tags.add(HeadTag::meta("keywords", keywords));
    }

    if let Some(published) = date::read_field(data, "published", options.date_format)? {
        tags.add(HeadTag::property(
            "article:published_time",
            date::to_wire(&published),
        ));
    }

    if let Some(modified) = date::read_field(data, "modified", options.date_format)? {
        let wire = date::to_wire(&modified);
        tags.add(HeadTag::property("article:modified_time", wire.clone()));
        tags.add(HeadTag::property("og:updated_time", wire));
    }

    let canonical = data.get("canonical").and_then(scalar_str);
    if let Some(canonical) = &canonical {
        tags.add(HeadTag::property("og:url", canonical.clone()));
        tags.add(HeadTag::meta("twitter:url", canonical.clone()));
    }

    if let Some(Value::Mapping(hreflang)) = data.get("hreflang") {
        let mut alternates: Vec<(String, String)> = hreflang
            .iter()
            .filter_map(|(locale, url)| Some((locale.as_str()?.to_string(), scalar_str(url)?)))
            .collect();
        let own_locale = data.get("locale").and_then(scalar_str);
        if let (Some(locale), Some(canonical)) = (own_locale, canonical) {
            if !alternates.iter().any(|(l, _)| *l == locale) {
                alternates.push((locale, canonical));
            }
        }
        for (locale, url) in &alternates {
            tags.add(HeadTag::alternate(locale.clone(), url.clone()));
        }
        let default_url = options
            .default_locale
            .and_then(|default| alternates.iter().find(|(l, _)| l == default));
        if let Some((_, url)) = default_url {
            tags.add(HeadTag::alternate("x-default", url.clone()));
        }
    }
    Ok(())
}

fn keywords(value: &Value) -> Option<String> {
    match value {
        Value::Sequence(items) => {
            let words: Vec<String> = items.iter().filter_map(scalar_str).collect();
            (!words.is_empty()).then(|| words.join(", "))
        }
        other => scalar_str(other),
    }
}
