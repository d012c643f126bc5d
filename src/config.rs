//! Build configuration.
//!
//! Handles loading, validating, and merging the `inkpress.toml` file. The
//! user's file is sparse: it is merged over the stock defaults and then
//! deserialized with unknown keys rejected.
//!
//! ## Configuration Options
//!
//! ```toml
//! source_path = "content"            # Overridden by the CLI positional argument
//! output_path = "public"
//! site_url = "https://example.com/"
//! date_format = "%Y-%m-%d %H:%M:%S"  # chrono strftime pattern
//! default_locale = "en"              # Target of hreflang x-default
//!
//! [templates]
//! dir = "templates"
//! article = "article.html"
//! list = "list.html"
//!
//! [list]
//! per_page = 12
//!
//! [defaults]                         # Frontmatter defaults, overridden per file
//! charset = "utf-8"
//!
//! [markdown]
//! extensions = ["tables", "footnotes"]
//! options = { html_input = "allow" }
//!
//! [assets]
//! active = false
//! manifest_path = "public/mix-manifest.json"
//!
//! [cache]
//! key = "blog.articles"
//! ttl = 86400
//! dir = ".inkpress-cache"
//!
//! [processing]
//! max_processes = 4
//! ```
//!
//! A loaded [`SiteConfig`] is only checked for well-formed values. The
//! settings a build cannot run without (source path, templates, page size)
//! are resolved separately into [`BuildSettings`], before any file is touched.

use crate::types::Data;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "inkpress.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("No source path defined.")]
    MissingSourcePath,
    #[error("No {0} template defined.")]
    MissingTemplate(&'static str),
    #[error("No list per_page count defined.")]
    MissingPageSize,
}

/// Site configuration loaded from `inkpress.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Content directory. The CLI argument takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    /// Output root that receives the mirrored and rendered tree.
    pub output_path: String,
    /// Site origin used for absolute URLs and asset references.
    pub site_url: String,
    /// strftime pattern for `published` / `modified` values.
    pub date_format: String,
    /// Locale whose alternate URL becomes the hreflang `x-default`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_locale: Option<String>,
    pub templates: TemplatesConfig,
    pub list: ListConfig,
    /// Default frontmatter values; file-level values override them.
    pub defaults: toml::Table,
    pub markdown: MarkdownConfig,
    pub assets: AssetsConfig,
    pub cache: CacheConfig,
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let mut defaults = toml::Table::new();
        defaults.insert("charset".into(), toml::Value::String("utf-8".into()));
        defaults.insert(
            "viewport".into(),
            toml::Value::String("width=device-width, initial-scale=1".into()),
        );
        Self {
            source_path: None,
            output_path: "public".to_string(),
            site_url: "http://localhost/".to_string(),
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
            default_locale: None,
            templates: TemplatesConfig::default(),
            list: ListConfig::default(),
            defaults,
            markdown: MarkdownConfig::default(),
            assets: AssetsConfig::default(),
            cache: CacheConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are well-formed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.site_url.starts_with("http://") || self.site_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "site_url must be an http(s) origin, got '{}'",
                self.site_url
            )));
        }
        if self.date_format.trim().is_empty() {
            return Err(ConfigError::Validation(
                "date_format must not be empty".into(),
            ));
        }
        if self.output_path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output_path must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Resolve everything a build needs, failing on the first missing piece.
    ///
    /// `cli_source` overrides `source_path`. No filesystem access happens here.
    pub fn resolve(&self, cli_source: Option<&Path>) -> Result<BuildSettings, ConfigError> {
        let source = cli_source
            .map(Path::to_path_buf)
            .or_else(|| self.source_path.as_ref().map(PathBuf::from))
            .ok_or(ConfigError::MissingSourcePath)?;
        let article_template = self
            .templates
            .article
            .clone()
            .ok_or(ConfigError::MissingTemplate("article"))?;
        let list_template = self
            .templates
            .list
            .clone()
            .ok_or(ConfigError::MissingTemplate("list"))?;
        if self.list.per_page == 0 {
            return Err(ConfigError::MissingPageSize);
        }

        let output = PathBuf::from(&self.output_path);
        let manifest_path = self
            .assets
            .manifest_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| output.join("mix-manifest.json"));

        Ok(BuildSettings {
            source,
            output,
            site_url: finish_slash(&self.site_url),
            date_format: self.date_format.clone(),
            default_locale: self.default_locale.clone(),
            template_dir: PathBuf::from(&self.templates.dir),
            article_template,
            list_template,
            per_page: self.list.per_page,
            defaults: defaults_data(&self.defaults),
            markdown: self.markdown.clone(),
            asset_manifest: self.assets.active.then_some(manifest_path),
            cache: self.cache.clone(),
        })
    }
}

/// Template identifiers and lookup directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Directory template identifiers are resolved against.
    pub dir: String,
    /// Template used for every article.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,
    /// Template used for every list page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<String>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: "templates".to_string(),
            article: None,
            list: None,
        }
    }
}

/// List pagination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListConfig {
    /// Articles per list page. Zero counts as not configured.
    pub per_page: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self { per_page: 12 }
    }
}

/// Markdown converter settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Named converter extensions, see [`crate::markdown::Extension`].
    pub extensions: Vec<String>,
    /// Converter-specific options (`html_input = "allow" | "escape" | "strip"`).
    pub options: toml::Table,
}

/// Build asset manifest settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    /// Emit stylesheet/script tags from the asset manifest.
    pub active: bool,
    /// Manifest location; defaults to `<output_path>/mix-manifest.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<String>,
}

/// Build record cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Cache key; when absent no records are cached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Time to live in seconds.
    pub ttl: u64,
    /// Directory backing the file cache store.
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key: None,
            ttl: 86400,
            dir: ".inkpress-cache".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel document workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Everything a build run needs, resolved and checked up front.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Site origin, always ending in `/`.
    pub site_url: String,
    pub date_format: String,
    pub default_locale: Option<String>,
    pub template_dir: PathBuf,
    pub article_template: String,
    pub list_template: String,
    pub per_page: usize,
    pub defaults: Data,
    pub markdown: MarkdownConfig,
    /// Asset manifest to read, when asset references are enabled.
    pub asset_manifest: Option<PathBuf>,
    pub cache: CacheConfig,
}

/// Append a trailing `/` unless one is already present.
pub fn finish_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Convert the `[defaults]` table into document data.
fn defaults_data(table: &toml::Table) -> Data {
    table
        .iter()
        .map(|(key, value)| (key.clone(), toml_to_yaml(value)))
        .collect()
}

fn toml_to_yaml(value: &toml::Value) -> serde_yaml::Value {
    use serde_yaml::Value;
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Number((*i).into()),
        toml::Value::Float(f) => Value::Number((*f).into()),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Sequence(items.iter().map(toml_to_yaml).collect()),
        toml::Value::Table(table) => Value::Mapping(
            table
                .iter()
                .map(|(k, v)| (Value::String(k.clone()), toml_to_yaml(v)))
                .collect(),
        ),
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when the
/// file does not exist.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `inkpress.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Inkpress Configuration
# ======================
# All settings are optional unless noted. Values shown are the defaults.
# Unknown keys will cause an error.

# Content directory. The positional argument of `inkpress build` wins.
# source_path = "content"

# Output root. The content tree is mirrored here and every markdown file is
# replaced by a directory holding an index.htm.
output_path = "public"

# Site origin, used for absolute URLs, canonical links and asset references.
site_url = "http://localhost/"

# strftime pattern for `published` and `modified`. Plain dates (2020-01-01)
# and RFC 3339 timestamps are always accepted as well.
date_format = "%Y-%m-%d %H:%M:%S"

# Locale used as hreflang x-default when a page declares it as an alternate.
# default_locale = "en"

# ---------------------------------------------------------------------------
# Templates (required)
# ---------------------------------------------------------------------------
[templates]
dir = "templates"
# article = "article.html"
# list = "list.html"

# ---------------------------------------------------------------------------
# List pages
# ---------------------------------------------------------------------------
[list]
per_page = 12

# ---------------------------------------------------------------------------
# Frontmatter defaults, overridden by values in each file
# ---------------------------------------------------------------------------
[defaults]
charset = "utf-8"
viewport = "width=device-width, initial-scale=1"

# ---------------------------------------------------------------------------
# Markdown conversion
# ---------------------------------------------------------------------------
[markdown]
# Available: tables, footnotes, strikethrough, tasklists,
#            smart_punctuation, heading_attributes
extensions = []

[markdown.options]
# html_input = "allow"   # allow | escape | strip

# ---------------------------------------------------------------------------
# Build assets (stylesheet/script tags from a mix-style manifest)
# ---------------------------------------------------------------------------
[assets]
active = false
# manifest_path = "public/mix-manifest.json"

# ---------------------------------------------------------------------------
# Build record cache
# ---------------------------------------------------------------------------
[cache]
# key = "blog.articles"
ttl = 86400
dir = ".inkpress-cache"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel document workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
