//! Article building: publish gate, URL derivation, rendering.
//!
//! Computing an article ([`prepare_article`]) and writing it
//! ([`write_article`]) are separate steps. Preparation reads the source file
//! and returns the rendered document plus its [`BuildRecord`]; writing puts
//! the document into the output tree and removes the mirrored markdown.

use crate::date::{self, DateError};
use crate::document::{self, BuildContext, DocumentError};
use crate::head::HeadTags;
use crate::naming;
use crate::scan::ContentFile;
use crate::sink::OutputSink;
use crate::types::{BuildRecord, Data};
use chrono::{DateTime, Utc};
use serde_yaml::Value;
use std::io;

/// Where an article lives in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleUrls {
    /// Site-relative directory URL, `posts/a/`.
    pub generated_url: String,
    /// `site_url` + `generated_url`.
    pub absolute_url: String,
    /// Output-relative file, `posts/a/index.htm`.
    pub output_file: String,
}

/// Derive URLs for a source path relative to the content root.
pub fn derive_urls(relative: &str, site_url: &str) -> ArticleUrls {
    let generated_url = naming::article_url(relative);
    ArticleUrls {
        absolute_url: naming::absolute_url(site_url, &generated_url),
        output_file: naming::output_file(&generated_url),
        generated_url,
    }
}

/// An article is published when it declares `published` and that time has
/// been reached.
pub fn is_published(data: &Data, now: DateTime<Utc>, date_format: &str) -> Result<bool, DateError> {
    Ok(date::read_field(data, "published", date_format)?.is_some_and(|published| published <= now))
}

/// A rendered article ready to be written.
#[derive(Debug, Clone)]
pub struct RenderedArticle {
    pub output_file: String,
    pub document: Vec<u8>,
    pub record: BuildRecord,
}

/// Compute one article. Returns `Ok(None)` when it is not yet published.
pub fn prepare_article(
    ctx: &BuildContext,
    tags: &mut HeadTags,
    file: &ContentFile,
) -> Result<Option<RenderedArticle>, DocumentError> {
    let source = document::load(&file.path)?;
    let settings = ctx.settings;

    let gate = source.layered(&settings.defaults, &Data::new());
    if !is_published(&gate, ctx.now, &settings.date_format)? {
        log::debug!("skipping unpublished {}", file.relative);
        return Ok(None);
    }

    let urls = derive_urls(&file.relative, &settings.site_url);
    let mut overrides = Data::new();
    overrides.insert(
        "absolute_url".into(),
        Value::String(urls.absolute_url.clone()),
    );
    overrides.insert(
        "generated_url".into(),
        Value::String(urls.generated_url.clone()),
    );

    let layered = source.layered(&settings.defaults, &overrides);
    let data = document::finish(ctx, tags, layered, &source.body)?;
    let modified = date::read_field(&data, "modified", &settings.date_format)?;
    let rendered = ctx.renderer.render(&settings.article_template, &data)?;
    log::info!("Converting Article {}", file.relative);

    Ok(Some(RenderedArticle {
        output_file: urls.output_file,
        document: rendered,
        record: BuildRecord {
            source: file.relative.clone(),
            generated_url: urls.generated_url,
            absolute_url: urls.absolute_url,
            modified,
            data,
        },
    }))
}

/// Write a prepared article (if any) and drop the mirrored source copy.
pub fn write_article(
    sink: &dyn OutputSink,
    file: &ContentFile,
    rendered: Option<&RenderedArticle>,
) -> io::Result<()> {
    if let Some(article) = rendered {
        sink.write(&article.output_file, &article.document)?;
    }
    sink.remove(&file.relative)
}
