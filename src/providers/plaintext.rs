//! Built-in extractor for plain-text documents.

use async_trait::async_trait;

use super::TextExtractor;
use crate::document::Document;
use crate::error::ExtractionError;

/// [`TextExtractor`] for `text/*` documents.
///
/// Decodes the document bytes as UTF-8. Every other media type is rejected
/// with a hint to inject a custom extractor: OCR for PDFs and images is a
/// collaborator concern, not something this crate bundles.
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract_text(&self, document: &Document) -> Result<String, ExtractionError> {
        let media_type = document.media_type();
        if !media_type.starts_with("text/") {
            return Err(ExtractionError::new(format!(
                "Unsupported media type '{media_type}' for '{}'.\n\
                 PlainTextExtractor handles text/* only; inject a custom \
                 TextExtractor for other formats.",
                document.name()
            )));
        }

        String::from_utf8(document.data().to_vec()).map_err(|e| {
            ExtractionError::new(format!(
                "Document '{}' is not valid UTF-8: {e}",
                document.name()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn decodes_plain_text() {
        let doc = Document::from_text("syllabus.txt", "Week 1: Intro");
        let text = PlainTextExtractor.extract_text(&doc).await.unwrap();
        assert_eq!(text, "Week 1: Intro");
    }

    #[tokio::test]
    async fn accepts_any_text_subtype() {
        let doc = Document::from_bytes("notes.md", "text/markdown", b"# Notes".to_vec());
        let text = PlainTextExtractor.extract_text(&doc).await.unwrap();
        assert_eq!(text, "# Notes");
    }

    #[tokio::test]
    async fn rejects_non_text_media_types() {
        let doc = Document::from_bytes("slides.pdf", "application/pdf", vec![0x25, 0x50]);
        let err = PlainTextExtractor.extract_text(&doc).await.unwrap_err();
        assert!(err.to_string().contains("application/pdf"), "got: {err}");
        assert!(err.to_string().contains("custom"), "got: {err}");
    }

    #[tokio::test]
    async fn rejects_invalid_utf8() {
        let doc = Document::from_bytes("weird.txt", "text/plain", vec![0xff, 0xfe, 0x00]);
        let err = PlainTextExtractor.extract_text(&doc).await.unwrap_err();
        assert!(err.to_string().contains("UTF-8"), "got: {err}");
    }
}
