//! Paginated list pages.
//!
//! An `index.md` governs every article whose URL starts with its directory
//! prefix, nested directories included. Matching records are sorted by
//! `modified`, newest first, and split into pages:
//!
//! ```text
//! posts/index.htm      page 1
//! posts/1/index.htm    page 1 again, byte-identical
//! posts/2/index.htm    page 2
//! ```
//!
//! Records with equal `modified` keep their scan order; records without a
//! `modified` timestamp come last.

use crate::document::{self, BuildContext, DocumentError};
use crate::head::HeadTags;
use crate::naming;
use crate::scan::ContentFile;
use crate::sink::OutputSink;
use crate::types::{BuildRecord, Data};
use serde_yaml::{Mapping, Value};
use std::io;

/// Records governed by `prefix`, newest first.
pub fn select_records<'a>(records: &'a [BuildRecord], prefix: &str) -> Vec<&'a BuildRecord> {
    let mut selected: Vec<&BuildRecord> = records
        .iter()
        .filter(|record| record.generated_url.starts_with(prefix))
        .collect();
    selected.sort_by(|a, b| b.modified.cmp(&a.modified));
    selected
}

/// One page of a list.
#[derive(Debug, Clone, Copy)]
pub struct PageChunk<'a> {
    /// 1-based page number.
    pub page: usize,
    pub total_pages: usize,
    pub records: &'a [&'a BuildRecord],
}

/// Split sorted records into pages of `per_page`.
pub fn paginate<'a>(records: &'a [&'a BuildRecord], per_page: usize) -> Vec<PageChunk<'a>> {
    let chunks: Vec<&[&BuildRecord]> = records.chunks(per_page.max(1)).collect();
    let total_pages = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, records)| PageChunk {
            page: index + 1,
            total_pages,
            records,
        })
        .collect()
}

/// A rendered list page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub page: usize,
    /// Site-relative URL of the page.
    pub url: String,
    pub output_file: String,
    /// Second location of the first page.
    pub alias_file: Option<String>,
    pub document: Vec<u8>,
}

/// All pages of one list.
#[derive(Debug, Clone)]
pub struct RenderedList {
    pub source: String,
    pub prefix: String,
    pub article_count: usize,
    pub pages: Vec<RenderedPage>,
}

/// Compute every page of a list from the completed article records.
pub fn prepare_list(
    ctx: &BuildContext,
    tags: &mut HeadTags,
    file: &ContentFile,
    records: &[BuildRecord],
) -> Result<RenderedList, DocumentError> {
    let source = document::load(&file.path)?;
    let settings = ctx.settings;
    let prefix = naming::list_prefix(&file.relative);
    let selected = select_records(records, &prefix);
    let chunks = paginate(&selected, settings.per_page);
    let base_url = naming::absolute_url(&settings.site_url, &prefix);

    if chunks.is_empty() {
        log::warn!(
            "list {} matches no published articles, no pages written",
            file.relative
        );
    }

    let mut pages = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        log::info!(
            "Creating page {} of {} for {}",
            chunk.page,
            chunk.total_pages,
            file.relative
        );
        let url = naming::page_url(&prefix, chunk.page - 1);
        let mut overrides = Data::new();
        overrides.insert(
            "canonical".into(),
            Value::String(naming::absolute_url(&settings.site_url, &url)),
        );
        let mut layered = source.layered(&settings.defaults, &overrides);
        if chunk.page > 1 {
            layered.shift_remove("hreflang");
        }

        let mut data = document::finish(ctx, tags, layered, &source.body)?;
        data.insert("base_url".into(), Value::String(base_url.clone()));
        data.insert("articles".into(), articles_value(chunk.records));
        data.insert("total_pages".into(), number(chunk.total_pages));
        data.insert("current_page".into(), number(chunk.page));

        let rendered = ctx.renderer.render(&settings.list_template, &data)?;
        pages.push(RenderedPage {
            page: chunk.page,
            output_file: naming::output_file(&url),
            alias_file: (chunk.page == 1).then(|| naming::output_file(&format!("{prefix}1/"))),
            url,
            document: rendered,
        });
    }

    Ok(RenderedList {
        source: file.relative.clone(),
        prefix,
        article_count: selected.len(),
        pages,
    })
}

/// Write every page, the first-page alias, and drop the mirrored source.
pub fn write_list(sink: &dyn OutputSink, list: &RenderedList) -> io::Result<()> {
    for page in &list.pages {
        sink.write(&page.output_file, &page.document)?;
        if let Some(alias) = &page.alias_file {
            sink.duplicate(&page.output_file, alias)?;
        }
    }
    sink.remove(&list.source)
}

fn articles_value(records: &[&BuildRecord]) -> Value {
    Value::Sequence(
        records
            .iter()
            .map(|record| {
                Value::Mapping(
                    record
                        .data
                        .iter()
                        .map(|(k, v)| (Value::String(k.clone()), v.clone()))
                        .collect::<Mapping>(),
                )
            })
            .collect(),
    )
}

fn number(n: usize) -> Value {
    Value::Number((n as u64).into())
}
