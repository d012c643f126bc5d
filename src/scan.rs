//! Content discovery and classification.
//!
//! Walks the source tree depth-first in lexicographic order and classifies
//! every `.md` file by name (see [`crate::naming::classify`]). Hidden entries
//! (names starting with `.`) are skipped along with everything below them.
//!
//! The output mirror is a separate walk: it keeps hidden files such as
//! `.htaccess` or `.well-known/` and follows symlinks, so linked files are
//! copied by content.
//!
//! ```text
//! content/
//! ├── index.md            # ListIndex, prefix ""
//! ├── about.md            # Article → about/
//! ├── style.css           # not content, mirrored as-is
//! └── posts/
//!     ├── index.md        # ListIndex, prefix "posts/"
//!     ├── a.md            # Article → posts/a/
//!     ├── c.1.emb.md      # Embargoed slot 1 for posts/c.md
//!     └── c.2.emb.md      # Embargoed slot 2 for posts/c.md
//! ```
//!
//! The main pass and the release pass see disjoint sets: [`scan`] never
//! returns embargoed files in `articles` or `lists`.

use crate::naming::{self, ContentRole};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot walk source tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source path does not exist: {0}")]
    MissingRoot(PathBuf),
}

/// A discovered file under the source root.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Path relative to the source root, `/`-separated.
    pub relative: String,
    /// Absolute (or root-joined) path on disk.
    pub path: PathBuf,
}

/// A classified content file.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentFile {
    pub relative: String,
    pub path: PathBuf,
    pub role: ContentRole,
}

impl ContentFile {
    /// File name component of the relative path.
    pub fn file_name(&self) -> &str {
        self.relative.rsplit('/').next().unwrap_or(&self.relative)
    }
}

/// Result of a main scan, each group in scan order.
#[derive(Debug, Default)]
pub struct ContentSet {
    pub articles: Vec<ContentFile>,
    pub lists: Vec<ContentFile>,
    pub embargoed: Vec<ContentFile>,
}

/// Scan the source tree and group content files by role.
pub fn scan(root: &Path) -> Result<ContentSet, ScanError> {
    let mut set = ContentSet::default();
    for file in classified(root)? {
        match file.role {
            ContentRole::Article => set.articles.push(file),
            ContentRole::ListIndex => set.lists.push(file),
            ContentRole::Embargoed { .. } => set.embargoed.push(file),
        }
    }
    log::debug!(
        "scanned {}: {} articles, {} lists, {} embargoed",
        root.display(),
        set.articles.len(),
        set.lists.len(),
        set.embargoed.len()
    );
    Ok(set)
}

/// Scan only the scheduled-release files.
pub fn scan_embargoed(root: &Path) -> Result<Vec<ContentFile>, ScanError> {
    Ok(classified(root)?
        .into_iter()
        .filter(|file| matches!(file.role, ContentRole::Embargoed { .. }))
        .collect())
}

/// Every file that is copied into the output tree: all files, hidden or
/// linked ones included, except scheduled releases.
pub fn mirror_files(root: &Path) -> Result<Vec<SourceFile>, ScanError> {
    Ok(walk(root, Walk::Mirror)?
        .into_iter()
        .filter(|file| {
            let name = file.relative.rsplit('/').next().unwrap_or(&file.relative);
            !matches!(
                naming::classify(name),
                Some(ContentRole::Embargoed { .. })
            )
        })
        .collect())
}

fn classified(root: &Path) -> Result<Vec<ContentFile>, ScanError> {
    Ok(walk(root, Walk::Content)?
        .into_iter()
        .filter_map(|file| {
            let name = file.relative.rsplit('/').next().unwrap_or(&file.relative);
            naming::classify(name).map(|role| ContentFile {
                relative: file.relative,
                path: file.path,
                role,
            })
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    /// Content discovery: hidden entries skipped, links not followed.
    Content,
    /// Output mirror: everything, links followed.
    Mirror,
}

fn walk(root: &Path, mode: Walk) -> Result<Vec<SourceFile>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(mode == Walk::Mirror)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            mode == Walk::Mirror || entry.depth() == 0 || !is_hidden(entry.file_name())
        });
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map(relative_string)
            .unwrap_or_default();
        files.push(SourceFile {
            relative,
            path: entry.into_path(),
        });
    }
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

fn relative_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
