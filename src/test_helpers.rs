//! Shared test utilities for the inkpress test suite.
//!
//! Provides file setup helpers, a fixed build clock, and [`TestSite`], a
//! temporary source tree with resolved settings and in-memory templates that
//! hands out a ready [`BuildContext`].
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = TestSite::new();
//! let file = site.content("posts/a.md", "---\npublished: 2020-01-01\n---\nHi");
//! let ctx = site.context();
//! let article = prepare_article(&ctx, &mut HeadTags::new(), &file);
//! ```

use std::fs;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use crate::config::{BuildSettings, SiteConfig};
use crate::document::BuildContext;
use crate::markdown::MarkdownConverter;
use crate::naming;
use crate::render::TemplateRenderer;
use crate::scan::ContentFile;

pub const ARTICLE_TEMPLATE: &str =
    "<html><head>{{ header|safe }}</head><body>{{ content|safe }}</body></html>";

pub const LIST_TEMPLATE: &str = "<html><head>{{ header|safe }}</head><body>\
page {{ current_page }}/{{ total_pages }} of {{ base_url|safe }}\
{% for a in articles %}[{{ a.generated_url|safe }}]{% endfor %}</body></html>";

// =========================================================================
// File helpers
// =========================================================================

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// The build clock used throughout the tests: 2024-06-01 12:00:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

// =========================================================================
// Test site
// =========================================================================

/// A temporary source tree with settings and collaborators.
pub struct TestSite {
    pub source: TempDir,
    pub settings: BuildSettings,
    pub converter: MarkdownConverter,
    pub renderer: TemplateRenderer,
}

impl TestSite {
    pub fn new() -> Self {
        let source = TempDir::new().unwrap();
        let settings = test_settings(source.path());
        let renderer = TemplateRenderer::with_templates(&[
            ("article.html", ARTICLE_TEMPLATE),
            ("list.html", LIST_TEMPLATE),
        ])
        .unwrap();
        Self {
            source,
            settings,
            converter: MarkdownConverter::default(),
            renderer,
        }
    }

    /// Write a content file and return it classified.
    pub fn content(&self, relative: &str, text: &str) -> ContentFile {
        write_file(self.source.path(), relative, text);
        let name = relative.rsplit('/').next().unwrap();
        ContentFile {
            relative: relative.to_string(),
            path: self.source.path().join(relative),
            role: naming::classify(name).unwrap(),
        }
    }

    pub fn context(&self) -> BuildContext<'_> {
        BuildContext {
            settings: &self.settings,
            converter: &self.converter,
            renderer: &self.renderer,
            assets: &[],
            now: fixed_now(),
        }
    }
}

/// Settings for a source tree at `source` with empty defaults.
pub fn test_settings(source: &Path) -> BuildSettings {
    let mut config = SiteConfig::default();
    config.source_path = Some(source.to_string_lossy().into_owned());
    config.site_url = "https://example.com".into();
    config.templates.article = Some("article.html".into());
    config.templates.list = Some("list.html".into());
    config.defaults.clear();
    config.resolve(None).unwrap()
}
