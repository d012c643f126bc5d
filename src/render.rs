//! Template rendering.
//!
//! The pipeline hands effective document data to a [`Renderer`] by template
//! identifier and writes whatever bytes come back. [`TemplateRenderer`]
//! resolves identifiers against the configured template directory with
//! minijinja. Templates named `*.html` are auto-escaped, so the pre-rendered
//! `header` and `content` fields are emitted with `|safe`.

use crate::types::Data;
use minijinja::{Environment, Value, path_loader};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Renders a named template with document data.
pub trait Renderer: Sync {
    fn render(&self, template: &str, data: &Data) -> Result<Vec<u8>, RenderError>;
}

/// minijinja backed renderer.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// Load templates lazily from a directory.
    pub fn from_dir(dir: &Path) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(dir));
        Self { env }
    }

    /// Build from in-memory `(name, source)` pairs.
    pub fn with_templates(templates: &[(&str, &str)]) -> Result<Self, RenderError> {
        let mut env = Environment::new();
        for (name, source) in templates {
            env.add_template_owned(name.to_string(), source.to_string())?;
        }
        Ok(Self { env })
    }

    /// Make sure every named template exists and compiles.
    pub fn check(&self, names: &[&str]) -> Result<(), RenderError> {
        for name in names {
            self.env.get_template(name)?;
        }
        Ok(())
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, template: &str, data: &Data) -> Result<Vec<u8>, RenderError> {
        let template = self.env.get_template(template)?;
        let html = template.render(Value::from_serialize(data))?;
        Ok(html.into_bytes())
    }
}
