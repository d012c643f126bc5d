//! End-to-end build over the fixture site.
//!
//! Copies `fixtures/content/` into a temp directory, builds it to disk with
//! the fixture templates, and checks the output tree.
//!
//! Run with: cargo test --test build_pipeline

use chrono::{DateTime, TimeZone, Utc};
use inkpress::config::{BuildSettings, SiteConfig};
use inkpress::pipeline::{self, BuildError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn build_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

struct Site {
    _tmp: TempDir,
    settings: BuildSettings,
}

impl Site {
    fn new(configure: impl FnOnce(&mut SiteConfig)) -> Self {
        let tmp = TempDir::new().unwrap();
        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let source = tmp.path().join("content");
        fs::create_dir_all(&source).unwrap();
        copy_dir_recursive(&fixtures.join("content"), &source).unwrap();

        let mut config = SiteConfig::default();
        config.source_path = Some(source.to_string_lossy().into_owned());
        config.output_path = tmp.path().join("public").to_string_lossy().into_owned();
        config.site_url = "https://blog.example.com".into();
        config.default_locale = Some("en".into());
        config.templates.dir = fixtures.join("templates").to_string_lossy().into_owned();
        config.templates.article = Some("article.html".into());
        config.templates.list = Some("list.html".into());
        config.cache.dir = tmp.path().join("cache").to_string_lossy().into_owned();
        configure(&mut config);
        let settings = config.resolve(None).unwrap();
        Site {
            _tmp: tmp,
            settings,
        }
    }

    fn output(&self, relative: &str) -> String {
        fs::read_to_string(self.settings.output.join(relative))
            .unwrap_or_else(|e| panic!("{relative}: {e}"))
    }

    fn exists(&self, relative: &str) -> bool {
        self.settings.output.join(relative).exists()
    }
}

#[test]
fn builds_published_articles_only() {
    let site = Site::new(|_| {});
    let report = pipeline::build(&site.settings, build_time()).unwrap();

    assert_eq!(report.built, vec!["about/", "posts/a/", "posts/c/"]);
    assert_eq!(report.skipped, vec!["posts/b.md"]);
    assert!(site.exists("posts/a/index.htm"));
    assert!(!site.exists("posts/b"));
    assert!(!site.exists("posts/a.md"));
    assert!(!site.exists("posts/b.md"));
    assert!(site.exists("css/site.css"));
}

#[test]
fn article_head_and_body() {
    let site = Site::new(|_| {});
    pipeline::build(&site.settings, build_time()).unwrap();
    let about = site.output("about/index.htm");

    assert!(about.contains(r#"<meta name="author" content="Demo Writer">"#));
    assert!(about.contains("<title>About</title>"));
    assert!(about.contains(r#"<meta name="keywords" content="about, demo">"#));
    assert!(about.contains(
        r#"<meta property="article:published_time" content="2019-05-01T09:00:00+00:00">"#
    ));
    assert!(about.contains(r#"<meta name="twitter:url" content="https://blog.example.com/about/">"#));
    assert!(about.contains("<h1>About</h1>"));
}

#[test]
fn list_pages_and_alias() {
    let site = Site::new(|_| {});
    let report = pipeline::build(&site.settings, build_time()).unwrap();

    let posts = site.output("posts/index.htm");
    assert_eq!(posts, site.output("posts/1/index.htm"));
    let first = posts.find("First Post").unwrap();
    let scheduled = posts.find("Scheduled Post").unwrap();
    assert!(first < scheduled, "newest modified comes first");
    assert!(!posts.contains("Future Post"));
    assert!(posts.contains(r#"<link rel="canonical" href="https://blog.example.com/posts/">"#));
    assert!(posts.contains(
        r#"<link rel="alternate" href="https://blog.example.com/posts/" hreflang="x-default">"#
    ));
    assert!(!site.exists("posts/index.md"));

    let root = site.output("index.htm");
    assert!(root.contains("About"));
    assert!(root.contains("First Post"));
    assert_eq!(report.lists.len(), 2);
}

#[test]
fn pagination_splits_pages() {
    let site = Site::new(|config| config.list.per_page = 1);
    pipeline::build(&site.settings, build_time()).unwrap();

    assert!(site.output("posts/index.htm").contains("First Post"));
    let second = site.output("posts/2/index.htm");
    assert!(second.contains("Scheduled Post"));
    assert!(second.contains("Page 2 of 2"));
    assert!(!second.contains("hreflang"));
    assert!(!site.exists("posts/3/index.htm"));
}

#[test]
fn scheduled_release_promotes_due_slot() {
    let site = Site::new(|_| {});
    let report = pipeline::build(&site.settings, build_time()).unwrap();

    assert_eq!(report.promotions.len(), 1);
    let source = &site.settings.source;
    assert!(source.join("posts/c.md").exists());
    assert!(!source.join("posts/c.1.emb.md").exists());
    assert!(source.join("posts/c.2.emb.md").exists());
    assert!(site.output("posts/c/index.htm").contains("Released revision."));
    assert!(!site.exists("posts/c.2.emb.md"));
}

#[test]
fn rebuild_is_stable() {
    let site = Site::new(|_| {});
    let first = pipeline::build(&site.settings, build_time()).unwrap();
    let first_posts = site.output("posts/index.htm");
    let second = pipeline::build(&site.settings, build_time()).unwrap();

    assert_eq!(first.built, second.built);
    assert!(second.promotions.is_empty());
    assert_eq!(first_posts, site.output("posts/index.htm"));
}

#[test]
fn cache_entry_written_when_keyed() {
    let site = Site::new(|config| config.cache.key = Some("blog.articles".into()));
    let report = pipeline::build(&site.settings, build_time()).unwrap();
    assert_eq!(report.cache_key.as_deref(), Some("blog.articles"));

    let cache = inkpress::cache::FileCache::new(&site.settings.cache.dir, build_time());
    let value = cache.get("blog.articles").unwrap();
    assert_eq!(value.as_array().unwrap().len(), 3);
    assert_eq!(value[0]["generated_url"], "about/");
}

#[test]
fn missing_template_fails_before_writing() {
    let site = Site::new(|config| config.templates.list = Some("missing.html".into()));
    let result = pipeline::build(&site.settings, build_time());
    assert!(matches!(result, Err(BuildError::Template(_))));
    assert!(!site.settings.output.exists());
    assert!(site.settings.source.join("posts/c.1.emb.md").exists());
}

#[test]
fn hidden_static_files_are_mirrored() {
    let site = Site::new(|_| {});
    let source = &site.settings.source;
    fs::write(source.join(".htaccess"), "Options -Indexes").unwrap();
    fs::create_dir_all(source.join(".well-known")).unwrap();
    fs::write(source.join(".well-known/security.txt"), "Contact: x").unwrap();
    pipeline::build(&site.settings, build_time()).unwrap();

    assert_eq!(site.output(".htaccess"), "Options -Indexes");
    assert_eq!(site.output(".well-known/security.txt"), "Contact: x");
    assert!(site.exists("posts/a/index.htm"));
}

#[test]
fn asset_manifest_from_output_reaches_every_head() {
    let site = Site::new(|config| config.assets.active = true);
    fs::write(
        site.settings.source.join("mix-manifest.json"),
        r#"{"/js/app.js": "/js/app.js?id=2", "/css/app.css": "/css/app.css?id=1", "/img/x.png": "/img/x.png"}"#,
    )
    .unwrap();
    assert_eq!(
        site.settings.asset_manifest,
        Some(site.settings.output.join("mix-manifest.json"))
    );
    pipeline::build(&site.settings, build_time()).unwrap();

    let style = r#"<link rel="stylesheet" href="https://blog.example.com/css/app.css?id=1">"#;
    let script = r#"<script src="https://blog.example.com/js/app.js?id=2"></script>"#;
    for page in ["about/index.htm", "posts/a/index.htm", "posts/index.htm", "index.htm"] {
        let html = site.output(page);
        let style_at = html.find(style).unwrap_or_else(|| panic!("{page}: no stylesheet"));
        let script_at = html.find(script).unwrap_or_else(|| panic!("{page}: no script"));
        assert!(style_at < script_at, "{page}: assets out of order");
        assert!(!html.contains("x.png"));
    }
}

#[test]
fn active_assets_without_manifest_fail() {
    let site = Site::new(|config| config.assets.active = true);
    let result = pipeline::build(&site.settings, build_time());
    assert!(matches!(result, Err(BuildError::Assets(_))));
}
