//! The render collaborator seam.
//!
//! Rendering is a pure function from blueprint source text to HTML; the
//! pipeline never passes options through, so implementations own their own
//! configuration.

use once_cell::sync::Lazy;
use thiserror::Error;

/// Raised when a renderer cannot produce HTML for the given source.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RendererError(String);

impl RendererError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub trait BlueprintRenderer: Send + Sync {
    fn render(&self, source: &str) -> Result<String, RendererError>;
}

static BLUEPRINT_OPTIONS: Lazy<comrak::Options<'static>> = Lazy::new(|| {
    let mut options = comrak::Options::default();
    // API blueprint is a markdown dialect; tables and bare links are common
    // in the resource sections.
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.strikethrough = true;
    // Blueprint sources routinely embed raw HTML snippets for examples.
    options.render.unsafe_ = true;
    options
});

/// Comrak-backed production renderer.
#[derive(Debug, Default)]
pub struct MarkdownBlueprintRenderer;

impl MarkdownBlueprintRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl BlueprintRenderer for MarkdownBlueprintRenderer {
    fn render(&self, source: &str) -> Result<String, RendererError> {
        Ok(comrak::markdown_to_html(source, &BLUEPRINT_OPTIONS))
    }
}
