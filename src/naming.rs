//! Filename conventions for content files and their output locations.
//!
//! A content file's role is decided by its name alone:
//! - `index.md` → list index for its directory and everything below it
//! - `<stem>.<N>.emb.md` → scheduled release for `<stem>.md`, slot `N`
//! - any other `*.md` → article
//!
//! Output URLs are directory-style: `posts/a.md` is written to
//! `posts/a/index.htm` and addressed as `posts/a/`.

/// Content file extension.
pub const CONTENT_EXT: &str = "md";
/// File name of a list index.
pub const LIST_INDEX: &str = "index.md";
/// File name every generated document is written as.
pub const OUTPUT_INDEX: &str = "index.htm";

const EMBARGO_MARKER: &str = "emb";

/// Role of a content file, derived from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRole {
    Article,
    ListIndex,
    Embargoed { slot: u32 },
}

/// Classify a file name. Returns `None` for non-content files.
///
/// - `"index.md"` → `ListIndex`
/// - `"c.1.emb.md"` → `Embargoed { slot: 1 }`
/// - `"a.md"`, `"my.notes.md"` → `Article`
/// - `"style.css"` → `None`
pub fn classify(file_name: &str) -> Option<ContentRole> {
    let stem = file_name.strip_suffix(".md")?;
    if file_name == LIST_INDEX {
        return Some(ContentRole::ListIndex);
    }
    if let Some((_, slot)) = parse_embargo_name(file_name) {
        return Some(ContentRole::Embargoed { slot });
    }
    if stem.is_empty() {
        return None;
    }
    Some(ContentRole::Article)
}

/// Split a scheduled-release file name into its canonical name and slot.
///
/// `"c.1.emb.md"` → `("c.md", 1)`. The stem must be non-empty and the slot
/// a non-negative integer.
pub fn parse_embargo_name(file_name: &str) -> Option<(String, u32)> {
    let stem = file_name.strip_suffix(".md")?;
    let rest = stem.strip_suffix(EMBARGO_MARKER)?.strip_suffix('.')?;
    let (canonical_stem, slot) = rest.rsplit_once('.')?;
    if canonical_stem.is_empty() || slot.is_empty() || !slot.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let slot = slot.parse::<u32>().ok()?;
    Some((format!("{canonical_stem}.{CONTENT_EXT}"), slot))
}

/// Site-relative URL of an article: `"posts/a.md"` → `"posts/a/"`.
pub fn article_url(relative: &str) -> String {
    let stem = relative.strip_suffix(".md").unwrap_or(relative);
    format!("{stem}/")
}

/// URL prefix governed by a list index: `"posts/index.md"` → `"posts/"`,
/// `"index.md"` → `""`.
pub fn list_prefix(relative: &str) -> String {
    relative
        .strip_suffix(LIST_INDEX)
        .unwrap_or(relative)
        .to_string()
}

/// URL of a zero-based list page: the prefix itself for the first page,
/// `prefix + "<i+1>/"` for the rest.
pub fn page_url(prefix: &str, index: usize) -> String {
    if index == 0 {
        prefix.to_string()
    } else {
        format!("{prefix}{}/", index + 1)
    }
}

/// Output file for a site-relative directory URL.
pub fn output_file(url: &str) -> String {
    format!("{url}{OUTPUT_INDEX}")
}

/// Join the site origin (ending in `/`) with a site-relative URL.
pub fn absolute_url(site_url: &str, url: &str) -> String {
    format!("{site_url}{}", url.trim_start_matches('/'))
}
