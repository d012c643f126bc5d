//! Markdown to HTML conversion.
//!
//! [`Converter`] is the seam the document loader calls through; the stock
//! implementation wraps pulldown-cmark with named extensions enabled from
//! `[markdown]` in the config.

use crate::config::{ConfigError, MarkdownConfig};
use pulldown_cmark::{Event, Options, Parser, html as md_html};

/// Converts a markdown string to an HTML fragment.
pub trait Converter: Sync {
    fn convert(&self, markdown: &str) -> String;
}

/// Named converter extensions accepted in `markdown.extensions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Tables,
    Footnotes,
    Strikethrough,
    Tasklists,
    SmartPunctuation,
    HeadingAttributes,
}

impl Extension {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "tables" => Self::Tables,
            "footnotes" => Self::Footnotes,
            "strikethrough" => Self::Strikethrough,
            "tasklists" => Self::Tasklists,
            "smart_punctuation" => Self::SmartPunctuation,
            "heading_attributes" => Self::HeadingAttributes,
            _ => return None,
        })
    }

    fn option(self) -> Options {
        match self {
            Self::Tables => Options::ENABLE_TABLES,
            Self::Footnotes => Options::ENABLE_FOOTNOTES,
            Self::Strikethrough => Options::ENABLE_STRIKETHROUGH,
            Self::Tasklists => Options::ENABLE_TASKLISTS,
            Self::SmartPunctuation => Options::ENABLE_SMART_PUNCTUATION,
            Self::HeadingAttributes => Options::ENABLE_HEADING_ATTRIBUTES,
        }
    }
}

/// Treatment of raw HTML found in markdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HtmlInput {
    /// Pass through untouched.
    #[default]
    Allow,
    /// Emit as escaped text.
    Escape,
    /// Drop entirely.
    Strip,
}

/// pulldown-cmark backed converter.
#[derive(Debug, Clone)]
pub struct MarkdownConverter {
    options: Options,
    html_input: HtmlInput,
}

impl MarkdownConverter {
    /// Build a converter from config. Unknown extension names and unknown
    /// option keys or values are configuration errors.
    pub fn new(config: &MarkdownConfig) -> Result<Self, ConfigError> {
        let mut options = Options::empty();
        for name in &config.extensions {
            let ext = Extension::from_name(name).ok_or_else(|| {
                ConfigError::Validation(format!("unknown markdown extension '{name}'"))
            })?;
            options.insert(ext.option());
        }

        let mut html_input = HtmlInput::default();
        for (key, value) in &config.options {
            match (key.as_str(), value.as_str()) {
                ("html_input", Some("allow")) => html_input = HtmlInput::Allow,
                ("html_input", Some("escape")) => html_input = HtmlInput::Escape,
                ("html_input", Some("strip")) => html_input = HtmlInput::Strip,
                ("html_input", _) => {
                    return Err(ConfigError::Validation(format!(
                        "markdown html_input must be allow, escape or strip, got {value}"
                    )));
                }
                _ => {
                    return Err(ConfigError::Validation(format!(
                        "unknown markdown option '{key}'"
                    )));
                }
            }
        }

        Ok(Self {
            options,
            html_input,
        })
    }
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self {
            options: Options::empty(),
            html_input: HtmlInput::Allow,
        }
    }
}

impl Converter for MarkdownConverter {
    fn convert(&self, markdown: &str) -> String {
        let html_input = self.html_input;
        let parser = Parser::new_ext(markdown, self.options).filter_map(move |event| {
            match (event, html_input) {
                (Event::Html(raw) | Event::InlineHtml(raw), HtmlInput::Escape) => {
                    Some(Event::Text(raw))
                }
                (Event::Html(_) | Event::InlineHtml(_), HtmlInput::Strip) => None,
                (event, _) => Some(event),
            }
        });
        let mut html = String::new();
        md_html::push_html(&mut html, parser);
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(extensions: &[&str], options: &str) -> MarkdownConfig {
        MarkdownConfig {
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
            options: toml::from_str(options).unwrap(),
        }
    }

    #[test]
    fn converts_basic_markdown() {
        let html = MarkdownConverter::default().convert("# Title\n\nSome *text*.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>text</em>"));
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(MarkdownConverter::default().convert(""), "");
    }

    #[test]
    fn tables_need_extension() {
        let md = "| a | b |\n|---|---|\n| 1 | 2 |\n";
        assert!(!MarkdownConverter::default().convert(md).contains("<table>"));

        let converter = MarkdownConverter::new(&config(&["tables"], "")).unwrap();
        assert!(converter.convert(md).contains("<table>"));
    }

    #[test]
    fn strikethrough_extension() {
        let converter = MarkdownConverter::new(&config(&["strikethrough"], "")).unwrap();
        assert!(converter.convert("~~gone~~").contains("<del>gone</del>"));
    }

    #[test]
    fn unknown_extension_is_config_error() {
        let result = MarkdownConverter::new(&config(&["emoji"], ""));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn html_allowed_by_default() {
        let html = MarkdownConverter::default().convert("<div class=\"x\">hi</div>\n");
        assert!(html.contains("<div class=\"x\">hi</div>"));
    }

    #[test]
    fn html_input_escape() {
        let converter =
            MarkdownConverter::new(&config(&[], "html_input = \"escape\"")).unwrap();
        let html = converter.convert("a <b>bold</b> move");
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn html_input_strip() {
        let converter =
            MarkdownConverter::new(&config(&[], "html_input = \"strip\"")).unwrap();
        let html = converter.convert("a <b>bold</b> move");
        assert!(!html.contains("<b>"));
        assert!(html.contains("bold"));
    }

    #[test]
    fn bad_html_input_value_is_error() {
        assert!(MarkdownConverter::new(&config(&[], "html_input = \"maybe\"")).is_err());
        assert!(MarkdownConverter::new(&config(&[], "unsafe = true")).is_err());
    }
}
