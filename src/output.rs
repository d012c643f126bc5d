//! CLI output formatting for build and check runs.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Released
//!     posts/c.1.emb.md → posts/c.md (slot 1)
//!
//! Articles
//! 001 posts/a/
//! 002 posts/c/
//!     Skipped: posts/b.md
//!
//! Lists
//! 001 posts/ (2 articles, 1 page)
//!     Source: posts/index.md
//!
//! Cached under blog.articles
//! Built 2 articles, 1 list page → public
//! ```
//!
//! ## Check
//!
//! ```text
//! Articles: 3 (2 published)
//! Lists: 1
//! Scheduled: 2 (1 due)
//!     posts/c.1.emb.md → posts/c.md (slot 1, due)
//!     posts/c.2.emb.md → posts/c.md (slot 2, 2099-01-01T00:00:00+00:00)
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::date;
use crate::pipeline::{BuildReport, CheckReport};
use chrono::{DateTime, Utc};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 article`, `2 articles`.
fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format a finished build.
pub fn format_build_report(report: &BuildReport, output: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.promotions.is_empty() {
        lines.push("Released".to_string());
        for p in &report.promotions {
            lines.push(format!(
                "{}{} → {} (slot {})",
                indent(1),
                p.from,
                p.to,
                p.slot
            ));
        }
        lines.push(String::new());
    }

    lines.push("Articles".to_string());
    for (i, url) in report.built.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), url));
    }
    for skipped in &report.skipped {
        lines.push(format!("{}Skipped: {}", indent(1), skipped));
    }

    if !report.lists.is_empty() {
        lines.push(String::new());
        lines.push("Lists".to_string());
        for (i, list) in report.lists.iter().enumerate() {
            let prefix = if list.prefix.is_empty() {
                "/"
            } else {
                list.prefix.as_str()
            };
            lines.push(format!(
                "{} {} ({}, {})",
                format_index(i + 1),
                prefix,
                plural(list.articles, "article"),
                plural(list.pages, "page")
            ));
            lines.push(format!("{}Source: {}", indent(1), list.source));
        }
    }

    lines.push(String::new());
    if let Some(key) = &report.cache_key {
        lines.push(format!("Cached under {key}"));
    }
    let pages: usize = report.lists.iter().map(|l| l.pages).sum();
    lines.push(format!(
        "Built {}, {} → {}",
        plural(report.built.len(), "article"),
        plural(pages, "list page"),
        output.display()
    ));
    lines
}

pub fn print_build_report(report: &BuildReport, output: &Path) {
    for line in format_build_report(report, output) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format a content check.
pub fn format_check_report(report: &CheckReport, now: DateTime<Utc>) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Articles: {} ({} published)",
            report.articles, report.publishable
        ),
        format!("Lists: {}", report.lists),
    ];
    if !report.scheduled.is_empty() {
        lines.push(format!(
            "Scheduled: {} ({} due)",
            report.scheduled.len(),
            report.due
        ));
        for s in &report.scheduled {
            let when = match s.due_at {
                Some(at) if at <= now => "due".to_string(),
                Some(at) => date::to_wire(&at),
                None => "no timestamp".to_string(),
            };
            lines.push(format!(
                "{}{} → {} (slot {}, {})",
                indent(1),
                s.relative,
                s.canonical,
                s.slot,
                when
            ));
        }
    }
    lines
}

pub fn print_check_report(report: &CheckReport, now: DateTime<Utc>) {
    for line in format_check_report(report, now) {
        println!("{}", line);
    }
}
