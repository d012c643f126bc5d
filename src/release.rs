//! Scheduled releases.
//!
//! A file named `<stem>.<N>.emb.md` is held back until its scheduling
//! timestamp passes, then renamed to `<stem>.md` in the source tree before
//! the main build pass. The timestamp is `modified`, falling back to
//! `published`; a file with neither is never due.
//!
//! Several slots may target the same canonical file. Due slots are renamed
//! from the highest slot number down, so the lowest due slot is the one left
//! at the canonical path.

use crate::date;
use crate::document::{self, DocumentError};
use crate::naming;
use crate::scan::{self, ContentFile, ScanError};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Cannot read scheduled release {path}: {source}")]
    Document {
        path: PathBuf,
        source: DocumentError,
    },
    #[error("Cannot promote {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

/// A scheduled release with its resolved target and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheduled {
    pub relative: String,
    /// Relative path the file is promoted to.
    pub canonical: String,
    pub slot: u32,
    pub due_at: Option<DateTime<Utc>>,
}

/// A rename carried out (or planned) by the promoter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub from: String,
    pub to: String,
    pub slot: u32,
}

/// Read the scheduling timestamp of every embargoed file.
pub fn schedule(files: &[ContentFile], date_format: &str) -> Result<Vec<Scheduled>, ReleaseError> {
    files
        .iter()
        .filter_map(|file| {
            let (canonical_name, slot) = naming::parse_embargo_name(file.file_name())?;
            Some(read_schedule(file, canonical_name, slot, date_format))
        })
        .collect()
}

fn read_schedule(
    file: &ContentFile,
    canonical_name: String,
    slot: u32,
    date_format: &str,
) -> Result<Scheduled, ReleaseError> {
    let wrap = |source: DocumentError| ReleaseError::Document {
        path: file.path.clone(),
        source,
    };
    let doc = document::load(&file.path).map_err(wrap)?;
    let due_at = match date::read_field(&doc.matter, "modified", date_format)
        .map_err(|e| wrap(e.into()))?
    {
        Some(ts) => Some(ts),
        None => date::read_field(&doc.matter, "published", date_format)
            .map_err(|e| wrap(e.into()))?,
    };
    if due_at.is_none() {
        log::warn!(
            "{} has no modified or published timestamp and stays embargoed",
            file.relative
        );
    }
    let canonical = match file.relative.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{canonical_name}"),
        None => canonical_name,
    };
    Ok(Scheduled {
        relative: file.relative.clone(),
        canonical,
        slot,
        due_at,
    })
}

/// Pick the due releases and order them for renaming: by canonical path,
/// then by descending slot.
pub fn plan_releases(scheduled: &[Scheduled], now: DateTime<Utc>) -> Vec<Promotion> {
    let mut due: Vec<&Scheduled> = scheduled
        .iter()
        .filter(|s| s.due_at.is_some_and(|at| at <= now))
        .collect();
    due.sort_by(|a, b| {
        a.canonical
            .cmp(&b.canonical)
            .then_with(|| b.slot.cmp(&a.slot))
    });
    due.into_iter()
        .map(|s| Promotion {
            from: s.relative.clone(),
            to: s.canonical.clone(),
            slot: s.slot,
        })
        .collect()
}

/// Promote every due release under `root`.
pub fn promote(
    root: &Path,
    now: DateTime<Utc>,
    date_format: &str,
) -> Result<Vec<Promotion>, ReleaseError> {
    let files = scan::scan_embargoed(root)?;
    let scheduled = schedule(&files, date_format)?;
    let plan = plan_releases(&scheduled, now);
    for promotion in &plan {
        let from = root.join(&promotion.from);
        let to = root.join(&promotion.to);
        fs::rename(&from, &to).map_err(|source| ReleaseError::Rename {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
        log::info!(
            "released {} → {} (slot {})",
            promotion.from,
            promotion.to,
            promotion.slot
        );
    }
    Ok(plan)
}
