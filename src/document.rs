//! Document extraction: turns an uploaded resume into plain text.

use async_trait::async_trait;

use crate::error::ExtractionError;

/// MIME type accepted for resume uploads.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Extracts plain text from binary document content.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract_text(&self, bytes: Vec<u8>) -> Result<String, ExtractionError>;
}

/// PDF text extraction backed by `pdf-extract`.
///
/// Parsing is CPU-bound and may panic on hostile input, so it runs on the
/// blocking pool where a panic surfaces as a join error.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract_text(&self, bytes: Vec<u8>) -> Result<String, ExtractionError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(ExtractionError::Malformed("missing %PDF header".to_string()));
        }

        let size = bytes.len();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))?
            .map_err(|e| ExtractionError::Malformed(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(ExtractionError::Empty);
        }

        tracing::debug!(bytes = size, chars = text.chars().count(), "Extracted PDF text");
        Ok(text)
    }
}

/// Keep at most `budget` characters of `text`.
pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_pdf_bytes() {
        let result = PdfExtractor::new()
            .extract_text(b"PK\x03\x04 this is a zip".to_vec())
            .await;
        assert!(matches!(result, Err(ExtractionError::Malformed(_))));
    }

    #[tokio::test]
    async fn rejects_truncated_pdf() {
        let result = PdfExtractor::new()
            .extract_text(b"%PDF-1.4\n1 0 obj\n".to_vec())
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_chars("short", 20_000), "short");
    }

    #[test]
    fn truncate_cuts_at_budget() {
        let text = "a".repeat(25_000);
        assert_eq!(truncate_chars(&text, 20_000).len(), 20_000);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("✅✅✅", 3), "✅✅✅");
        assert_eq!(truncate_chars("", 0), "");
    }
}
