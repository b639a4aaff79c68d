//! Markup rendering of synced documents

use crate::error::RenderError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pulldown_cmark::{html, Options, Parser};

/// Turns document text into HTML
pub trait MarkupRenderer: Send + Sync {
    fn render(&self, text: &str) -> Result<String, RenderError>;
}

/// GitHub-flavored markdown renderer
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    gfm: bool,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self { gfm: true }
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    fn options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_FOOTNOTES
        } else {
            Options::empty()
        }
    }
}

impl MarkupRenderer for MarkdownRenderer {
    fn render(&self, text: &str) -> Result<String, RenderError> {
        if text.contains('\0') {
            return Err(RenderError::Markup("binary content".to_string()));
        }
        let parser = Parser::new_ext(text, self.options());
        let mut out = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut out, parser);
        Ok(out)
    }
}

/// Decode a base64 payload as returned by the contents API (line-wrapped).
pub fn decode_content(encoded: &str) -> Result<String, RenderError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact.as_bytes())?;
    Ok(String::from_utf8(bytes)?)
}
