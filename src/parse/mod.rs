//! Page parsing and text extraction
//!
//! This module handles:
//! - HTML title, visible text and link extraction
//! - Whitespace normalization
//! - Sentence segmentation for snippets

mod html;
mod text;

pub use html::*;
pub use text::*;

/// A parsed HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Content of the `<title>` element, if any
    pub title: Option<String>,

    /// Visible body text with whitespace collapsed
    pub text: String,

    /// Absolute link targets in document order
    pub links: Vec<String>,
}

impl ParsedPage {
    /// Text fed to the lemmatizer: title followed by body text
    pub fn indexable_text(&self) -> String {
        match &self.title {
            Some(title) if !title.is_empty() => format!("{} {}", title, self.text),
            _ => self.text.clone(),
        }
    }
}
