//! Page-bounded text extraction.

use std::path::Path;

use crate::errors::ExtractFailure;

/// Pulls text out of a downloaded document.
///
/// Implementations are synchronous; the orchestrator runs them on the
/// blocking thread pool.
pub trait TextExtractor: Send + Sync {
    /// Returns the text of the leading pages, in page order.
    fn extract_text(&self, path: &Path) -> Result<String, ExtractFailure>;
}

/// [`TextExtractor`] backed by `lopdf`.
#[derive(Debug, Clone, Copy)]
pub struct LopdfExtractor {
    max_pages: usize,
}

impl Default for LopdfExtractor {
    fn default() -> Self {
        Self { max_pages: 5 }
    }
}

impl LopdfExtractor {
    /// Reads at most `max_pages` pages per document.
    #[must_use]
    pub fn new(max_pages: usize) -> Self {
        Self { max_pages }
    }
}

impl TextExtractor for LopdfExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractFailure> {
        let document =
            lopdf::Document::load(path).map_err(|e| ExtractFailure::Unreadable(e.to_string()))?;

        let pages: Vec<u32> = document
            .get_pages()
            .keys()
            .copied()
            .take(self.max_pages)
            .collect();
        if pages.is_empty() {
            return Err(ExtractFailure::Empty);
        }

        let mut text = String::new();
        let mut last_error = None;
        let mut decoded = 0usize;
        for page in &pages {
            match document.extract_text(&[*page]) {
                Ok(page_text) => {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(&page_text);
                    decoded += 1;
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), page, error = %e, "Page text not decodable");
                    last_error = Some(e.to_string());
                }
            }
        }

        match (decoded, last_error) {
            (0, Some(err)) => Err(ExtractFailure::Decode(err)),
            _ => Ok(text),
        }
    }
}
