//! Build asset manifest.
//!
//! A front-end build writes a JSON object mapping logical asset paths to
//! their versioned public paths:
//!
//! ```json
//! { "/css/app.css": "/css/app.css?id=1a2b", "/js/app.js": "/js/app.js?id=3c4d" }
//! ```
//!
//! Stylesheets and scripts become head tags on every document; other entries
//! are ignored.

use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Asset manifest is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Asset manifest must be a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Style,
    Script,
}

/// A referenced build asset with its absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub url: String,
    pub kind: AssetKind,
}

/// Read the manifest at `path` and resolve URLs against `site_url`.
pub fn load_manifest(path: &Path, site_url: &str) -> Result<Vec<Asset>, AssetError> {
    let content = fs::read_to_string(path)?;
    let assets = parse_manifest(&content, site_url)?;
    log::debug!("loaded {} assets from {}", assets.len(), path.display());
    Ok(assets)
}

/// Parse manifest JSON. Assets come out sorted by logical path.
pub fn parse_manifest(json: &str, site_url: &str) -> Result<Vec<Asset>, AssetError> {
    let manifest: Value = serde_json::from_str(json)?;
    let entries = manifest.as_object().ok_or(AssetError::NotAnObject)?;
    let origin = site_url.trim_end_matches('/');

    Ok(entries
        .iter()
        .filter_map(|(logical, public)| {
            let kind = kind_of(logical)?;
            let public = public.as_str()?;
            let url = if public.starts_with('/') {
                format!("{origin}{public}")
            } else {
                format!("{origin}/{public}")
            };
            Some(Asset { url, kind })
        })
        .collect())
}

fn kind_of(logical: &str) -> Option<AssetKind> {
    let path = logical.split(['?', '#']).next().unwrap_or(logical);
    if path.ends_with(".css") {
        Some(AssetKind::Style)
    } else if path.ends_with(".js") {
        Some(AssetKind::Script)
    } else {
        None
    }
}
