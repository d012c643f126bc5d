//! The build pipeline.
//!
//! ```text
//! release   promote due scheduled files in the source tree
//! scan      classify content files
//! mirror    copy the source tree (minus scheduled files) into the output
//! phase 1   every article: gate, render, write         → ArticleSet
//! phase 2   every list: filter, sort, paginate, write  (reads ArticleSet)
//! cache     store the article records under the configured key
//! ```
//!
//! Both phases run on the rayon pool. Phase 1 collects its records in scan
//! order into an [`ArticleSet`]; phase 2 only starts once that value exists.
//! The first error aborts the run. Output already written stays.

use crate::article::{self, RenderedArticle};
use crate::assets::{self, Asset, AssetError};
use crate::cache::{self, CacheError, CacheStore, FileCache};
use crate::config::{BuildSettings, ConfigError};
use crate::date;
use crate::document::{self, BuildContext, DocumentError};
use crate::head::HeadTags;
use crate::list;
use crate::markdown::{Converter, MarkdownConverter};
use crate::release::{self, Promotion, ReleaseError, Scheduled};
use crate::render::{RenderError, Renderer, TemplateRenderer};
use crate::scan::{self, ContentFile, ScanError};
use crate::sink::{FsSink, OutputSink};
use crate::types::{BuildRecord, Data};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Release error: {0}")]
    Release(#[from] ReleaseError),
    #[error("{path}: {source}")]
    Content {
        path: String,
        source: DocumentError,
    },
    #[error("Template error: {0}")]
    Template(#[from] RenderError),
    #[error("Asset manifest error: {0}")]
    Assets(#[from] AssetError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Records of every published article, in scan order.
///
/// Produced once phase 1 has finished for all articles; list building takes
/// it by reference.
#[derive(Debug, Default)]
pub struct ArticleSet {
    records: Vec<BuildRecord>,
    skipped: Vec<String>,
}

impl ArticleSet {
    pub fn records(&self) -> &[BuildRecord] {
        &self.records
    }

    /// Source paths of articles held back by the publish gate.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

/// Outcome of one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSummary {
    pub source: String,
    pub prefix: String,
    pub articles: usize,
    pub pages: usize,
}

/// What a build did.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub promotions: Vec<Promotion>,
    /// Generated URLs of built articles, in scan order.
    pub built: Vec<String>,
    pub skipped: Vec<String>,
    pub lists: Vec<ListSummary>,
    pub cache_key: Option<String>,
}

/// A configured build over its collaborators.
pub struct Pipeline<'a> {
    pub settings: &'a BuildSettings,
    pub converter: &'a dyn Converter,
    pub renderer: &'a dyn Renderer,
    pub sink: &'a dyn OutputSink,
    pub cache: &'a dyn CacheStore,
    pub now: DateTime<Utc>,
}

impl Pipeline<'_> {
    pub fn run(&self) -> Result<BuildReport, BuildError> {
        let settings = self.settings;
        let promotions = release::promote(&settings.source, self.now, &settings.date_format)?;

        let content = scan::scan(&settings.source)?;
        self.mirror()?;
        let assets = self.load_assets()?;

        let ctx = BuildContext {
            settings,
            converter: self.converter,
            renderer: self.renderer,
            assets: &assets,
            now: self.now,
        };

        let articles = build_articles(&ctx, self.sink, &content.articles)?;
        let lists = build_lists(&ctx, self.sink, &content.lists, &articles)?;
        let cache_key = cache::publish(self.cache, &settings.cache, articles.records())?;

        Ok(BuildReport {
            promotions,
            built: articles
                .records()
                .iter()
                .map(|r| r.generated_url.clone())
                .collect(),
            skipped: articles.skipped().to_vec(),
            lists,
            cache_key,
        })
    }

    fn mirror(&self) -> Result<(), BuildError> {
        let files = scan::mirror_files(&self.settings.source)?;
        for file in &files {
            self.sink.copy_in(&file.relative, &file.path)?;
        }
        log::debug!("mirrored {} files", files.len());
        Ok(())
    }

    fn load_assets(&self) -> Result<Vec<Asset>, BuildError> {
        match &self.settings.asset_manifest {
            Some(path) => Ok(assets::load_manifest(path, &self.settings.site_url)?),
            None => Ok(Vec::new()),
        }
    }
}

/// Phase 1: build every article and collect the published records.
pub fn build_articles(
    ctx: &BuildContext,
    sink: &dyn OutputSink,
    files: &[ContentFile],
) -> Result<ArticleSet, BuildError> {
    let outcomes: Vec<Option<BuildRecord>> = files
        .par_iter()
        .map_init(HeadTags::new, |tags, file| -> Result<_, BuildError> {
            let rendered = article::prepare_article(ctx, tags, file)
                .map_err(|source| content_error(file, source))?;
            article::write_article(sink, file, rendered.as_ref())?;
            Ok(rendered.map(|RenderedArticle { record, .. }| record))
        })
        .collect::<Result<_, BuildError>>()?;

    let mut set = ArticleSet::default();
    for (file, outcome) in files.iter().zip(outcomes) {
        match outcome {
            Some(record) => set.records.push(record),
            None => set.skipped.push(file.relative.clone()),
        }
    }
    Ok(set)
}

/// Phase 2: build every list from the completed article set.
pub fn build_lists(
    ctx: &BuildContext,
    sink: &dyn OutputSink,
    files: &[ContentFile],
    articles: &ArticleSet,
) -> Result<Vec<ListSummary>, BuildError> {
    files
        .par_iter()
        .map_init(HeadTags::new, |tags, file| -> Result<_, BuildError> {
            let list = list::prepare_list(ctx, tags, file, articles.records())
                .map_err(|source| content_error(file, source))?;
            list::write_list(sink, &list)?;
            Ok(ListSummary {
                source: list.source,
                prefix: list.prefix,
                articles: list.article_count,
                pages: list.pages.len(),
            })
        })
        .collect()
}

fn content_error(file: &ContentFile, source: DocumentError) -> BuildError {
    BuildError::Content {
        path: file.relative.clone(),
        source,
    }
}

/// Converter and renderer built from settings, templates checked.
///
/// Fails on configuration problems before anything is read or written.
fn collaborators(
    settings: &BuildSettings,
) -> Result<(MarkdownConverter, TemplateRenderer), BuildError> {
    let converter = MarkdownConverter::new(&settings.markdown)?;
    let renderer = TemplateRenderer::from_dir(&settings.template_dir);
    renderer.check(&[
        settings.article_template.as_str(),
        settings.list_template.as_str(),
    ])?;
    Ok((converter, renderer))
}

/// Run a full build to disk.
pub fn build(settings: &BuildSettings, now: DateTime<Utc>) -> Result<BuildReport, BuildError> {
    let (converter, renderer) = collaborators(settings)?;
    let sink = FsSink::new(&settings.output);
    let cache = FileCache::new(&settings.cache.dir, now);
    Pipeline {
        settings,
        converter: &converter,
        renderer: &renderer,
        sink: &sink,
        cache: &cache,
        now,
    }
    .run()
}

/// What a check found.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub articles: usize,
    /// Articles that would pass the publish gate now.
    pub publishable: usize,
    pub lists: usize,
    pub scheduled: Vec<Scheduled>,
    /// Scheduled files that would be promoted now.
    pub due: usize,
}

/// Validate settings, templates and every content file without writing.
pub fn check(settings: &BuildSettings, now: DateTime<Utc>) -> Result<CheckReport, BuildError> {
    collaborators(settings)?;
    let content = scan::scan(&settings.source)?;
    let scheduled = release::schedule(&content.embargoed, &settings.date_format)?;
    let due = release::plan_releases(&scheduled, now).len();

    let mut publishable = 0;
    for file in content.articles.iter().chain(&content.lists) {
        let doc = document::load(&file.path).map_err(|source| content_error(file, source))?;
        let data = doc.layered(&settings.defaults, &Data::new());
        date::read_field(&data, "modified", &settings.date_format)
            .map_err(|e| content_error(file, e.into()))?;
        let published = article::is_published(&data, now, &settings.date_format)
            .map_err(|e| content_error(file, e.into()))?;
        if published && content.articles.contains(file) {
            publishable += 1;
        }
    }

    Ok(CheckReport {
        articles: content.articles.len(),
        publishable,
        lists: content.lists.len(),
        scheduled,
        due,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::test_helpers::{TestSite, fixed_now, write_file};
    use std::cell::RefCell;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingCache {
        puts: RefCell<Vec<(String, serde_json::Value)>>,
    }

    impl CacheStore for RecordingCache {
        fn put(
            &self,
            key: &str,
            value: &serde_json::Value,
            _ttl: Duration,
        ) -> Result<(), CacheError> {
            self.puts.borrow_mut().push((key.to_string(), value.clone()));
            Ok(())
        }
    }

    fn run(site: &TestSite, sink: &MemorySink, cache: &RecordingCache) -> BuildReport {
        Pipeline {
            settings: &site.settings,
            converter: &site.converter,
            renderer: &site.renderer,
            sink,
            cache,
            now: fixed_now(),
        }
        .run()
        .unwrap()
    }

    fn blog() -> TestSite {
        let site = TestSite::new();
        site.content("posts/a.md", "---\ntitle: A\npublished: 2020-01-01\n---\nA body");
        site.content("posts/b.md", "---\ntitle: B\npublished: 2999-01-01\n---\nB body");
        site.content("posts/index.md", "---\ntitle: Posts\n---\n");
        site
    }

    #[test]
    fn published_article_and_list_are_written() {
        let site = blog();
        let sink = MemorySink::new();
        let report = run(&site, &sink, &RecordingCache::default());

        assert_eq!(report.built, vec!["posts/a/"]);
        assert_eq!(report.skipped, vec!["posts/b.md"]);
        assert_eq!(
            sink.paths(),
            vec!["posts/1/index.htm", "posts/a/index.htm", "posts/index.htm"]
        );
        let listing = sink.text("posts/index.htm").unwrap();
        assert!(listing.contains("[posts/a/]"));
        assert!(!listing.contains("posts/b/"));
        assert_eq!(sink.get("posts/index.htm"), sink.get("posts/1/index.htm"));
    }

    #[test]
    fn non_content_files_are_mirrored() {
        let site = blog();
        write_file(site.source.path(), "css/site.css", "body{}");
        let sink = MemorySink::new();
        run(&site, &sink, &RecordingCache::default());
        assert_eq!(sink.text("css/site.css").as_deref(), Some("body{}"));
    }

    #[test]
    fn records_reach_cache_in_scan_order() {
        let mut site = blog();
        site.content("posts/c.md", "---\ntitle: C\npublished: 2021-01-01\n---\n");
        site.settings.cache.key = Some("blog.articles".into());
        let cache = RecordingCache::default();
        let report = run(&site, &MemorySink::new(), &cache);

        assert_eq!(report.cache_key.as_deref(), Some("blog.articles"));
        let puts = cache.puts.borrow();
        let titles: Vec<&str> = puts[0]
            .1
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["A", "C"]);
    }

    #[test]
    fn no_cache_key_no_put() {
        let site = blog();
        let cache = RecordingCache::default();
        let report = run(&site, &MemorySink::new(), &cache);
        assert!(report.cache_key.is_none());
        assert!(cache.puts.borrow().is_empty());
    }

    #[test]
    fn lists_see_all_articles() {
        let mut site = TestSite::new();
        site.settings.per_page = 1;
        for i in 0..5 {
            site.content(
                &format!("posts/p{i}.md"),
                &format!("---\npublished: 2020-01-01\nmodified: 2020-01-0{}\n---\n", i + 1),
            );
        }
        site.content("posts/index.md", "");
        let sink = MemorySink::new();
        let report = run(&site, &sink, &RecordingCache::default());

        assert_eq!(
            report.lists,
            vec![ListSummary {
                source: "posts/index.md".into(),
                prefix: "posts/".into(),
                articles: 5,
                pages: 5,
            }]
        );
        assert!(sink.text("posts/index.htm").unwrap().contains("[posts/p4/]"));
        assert!(sink.text("posts/5/index.htm").unwrap().contains("[posts/p0/]"));
    }

    #[test]
    fn embargoed_release_is_built() {
        let site = TestSite::new();
        site.content("posts/c.1.emb.md", "---\nmodified: 2020-01-01\npublished: 2020-01-01\n---\nnow");
        site.content("posts/c.2.emb.md", "---\nmodified: 2099-01-01\npublished: 2099-01-01\n---\nlater");
        let sink = MemorySink::new();
        let report = run(&site, &sink, &RecordingCache::default());

        assert_eq!(report.promotions.len(), 1);
        assert!(site.source.path().join("posts/c.md").exists());
        assert!(site.source.path().join("posts/c.2.emb.md").exists());
        assert!(sink.contains("posts/c/index.htm"));
        assert!(!sink.paths().iter().any(|p| p.contains(".emb.")));
    }

    #[test]
    fn bad_frontmatter_aborts_with_path() {
        let site = blog();
        site.content("posts/z.md", "---\n[broken\n---\n");
        let result = Pipeline {
            settings: &site.settings,
            converter: &site.converter,
            renderer: &site.renderer,
            sink: &MemorySink::new(),
            cache: &RecordingCache::default(),
            now: fixed_now(),
        }
        .run();
        match result {
            Err(BuildError::Content { path, .. }) => assert_eq!(path, "posts/z.md"),
            other => panic!("expected content error, got {other:?}"),
        }
    }

    #[test]
    fn rerun_is_idempotent() {
        let site = blog();
        let first = run(&site, &MemorySink::new(), &RecordingCache::default());
        let second = run(&site, &MemorySink::new(), &RecordingCache::default());
        assert_eq!(first.built, second.built);
        assert_eq!(first.skipped, second.skipped);
    }

    // =========================================================================
    // check
    // =========================================================================

    #[test]
    fn check_counts_without_writing() {
        let site = blog();
        site.content("posts/d.1.emb.md", "---\nmodified: 2020-01-01\n---\n");
        let tmp = tempfile::TempDir::new().unwrap();
        write_file(tmp.path(), "article.html", "{{ content }}");
        write_file(tmp.path(), "list.html", "{{ content }}");
        let mut settings = site.settings.clone();
        settings.template_dir = tmp.path().to_path_buf();
        settings.output = tmp.path().join("public");

        let report = check(&settings, fixed_now()).unwrap();
        assert_eq!(report.articles, 2);
        assert_eq!(report.publishable, 1);
        assert_eq!(report.lists, 1);
        assert_eq!(report.scheduled.len(), 1);
        assert_eq!(report.due, 1);
        assert!(!settings.output.exists());
        assert!(site.source.path().join("posts/d.1.emb.md").exists());
    }

    #[test]
    fn check_missing_template_is_error() {
        let site = blog();
        let mut settings = site.settings.clone();
        settings.template_dir = site.source.path().join("no-templates");
        assert!(matches!(
            check(&settings, fixed_now()),
            Err(BuildError::Template(_))
        ));
    }

    #[test]
    fn check_unknown_extension_is_config_error() {
        let site = blog();
        let mut settings = site.settings.clone();
        settings.markdown.extensions = vec!["wikilinks".into()];
        assert!(matches!(
            check(&settings, fixed_now()),
            Err(BuildError::Config(_))
        ));
    }
}
