//! # Inkpress
//!
//! A static blog builder. A tree of markdown files with YAML frontmatter goes
//! in; a deployable tree of HTML documents with SEO head tags and paginated
//! list pages comes out, in one pass.
//!
//! # Architecture: Two-Phase Pipeline
//!
//! ```text
//! 1. Release   due  *.N.emb.md  →  *.md         (source tree, before anything else)
//! 2. Mirror    content/         →  public/      (every file except scheduled ones)
//! 3. Articles  *.md             →  */index.htm  (parallel; yields an ArticleSet)
//! 4. Lists     index.md         →  index.htm, 1/index.htm, 2/index.htm, …
//! 5. Cache     ArticleSet       →  cache store  (when a key is configured)
//! ```
//!
//! Lists aggregate articles, so phase 4 reads the finished [`pipeline::ArticleSet`]
//! from phase 3 rather than sharing a collection that grows while
//! articles are still being built.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Orchestrates a build or check run; owns the phase barrier |
//! | [`scan`] | Walks the source tree and classifies content files |
//! | [`naming`] | File name roles and output URL derivation |
//! | [`release`] | Promotes due scheduled-release files |
//! | [`document`] | Frontmatter splitting and effective document data |
//! | [`article`] | Publish gate, article rendering and writing |
//! | [`list`] | Record selection, pagination, list rendering and writing |
//! | [`head`] | Ordered head tag composition with a per-document accumulator |
//! | [`markdown`] | Markdown converter seam and pulldown-cmark implementation |
//! | [`render`] | Template renderer seam and minijinja implementation |
//! | [`sink`] | Output writes: filesystem and in-memory sinks |
//! | [`cache`] | Build record cache store |
//! | [`assets`] | Build asset manifest for stylesheet and script tags |
//! | [`config`] | `inkpress.toml` loading, validation and build settings |
//! | [`date`] | Timestamp parsing for `published` and `modified` |
//! | [`types`] | Document data and build records |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Directory-Style URLs
//!
//! `posts/hello.md` is written to `posts/hello/index.htm` so every page is
//! addressed as a directory (`posts/hello/`) on any static file server. A
//! list's first page also exists at `1/index.htm`, which lets templates link
//! to page `n` as `<base_url><n>/` without special-casing page one.
//!
//! ## Everything Is Decided at Build Time
//!
//! Publishing is a pure function of the build clock: an article with a
//! future `published` is skipped, a scheduled release with a future
//! `modified` stays put. Rebuilding on a schedule is all it takes to publish.
//!
//! ## Computation Separate From Writes
//!
//! Article and list preparation return rendered bytes plus records; writing
//! goes through [`sink::OutputSink`]. Tests run whole builds against
//! [`sink::MemorySink`] without an output directory.

pub mod article;
pub mod assets;
pub mod cache;
pub mod config;
pub mod date;
pub mod document;
pub mod head;
pub mod list;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod release;
pub mod render;
pub mod scan;
pub mod sink;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
