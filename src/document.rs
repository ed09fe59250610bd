//! Document handles.
//!
//! A [`Document`] is the unit of work for one run: a display name, a media
//! type and the raw bytes, all behind a single shared allocation. Cloning is
//! cheap and preserves identity — every clone of one upload answers `true` to
//! [`Document::same_handle`], which is what the pipeline's duplicate guard
//! keys on. Constructing twice from the same path yields *different* handles
//! on purpose: identity tracks the upload event, not the content.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// An immutable uploaded document.
///
/// Created once per upload via [`Document::from_text`],
/// [`Document::from_bytes`] or [`Document::from_path`], then handed to
/// [`crate::controller::StudyPipeline::run`]. The extraction collaborator is
/// responsible for turning the bytes into text.
#[derive(Clone)]
pub struct Document {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    media_type: String,
    data: Vec<u8>,
}

impl Document {
    /// Wrap an already-extracted text as a `text/plain` document.
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::from_bytes(name, "text/plain", text.into().into_bytes())
    }

    /// Wrap raw bytes with an explicit media type.
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                media_type: media_type.into(),
                data,
            }),
        }
    }

    /// Read a file from disk, inferring the media type from its extension.
    ///
    /// Unknown extensions fall back to `application/octet-stream`; the
    /// extraction collaborator decides whether it can handle those.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = media_type_for_extension(
            path.extension().and_then(|e| e.to_str()).unwrap_or(""),
        );
        Ok(Self::from_bytes(name, media_type, data))
    }

    /// Display name of the document (typically the file name).
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Declared media type, e.g. `text/plain`.
    pub fn media_type(&self) -> &str {
        &self.inner.media_type
    }

    /// Raw document bytes.
    pub fn data(&self) -> &[u8] {
        &self.inner.data
    }

    /// Whether `self` and `other` are clones of the same upload.
    ///
    /// Pointer identity, not content equality: two separately constructed
    /// documents with identical bytes are distinct handles.
    pub fn same_handle(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// Raw bytes are elided: a dump of the whole file helps nobody in a log line.
impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.inner.name)
            .field("media_type", &self.inner.media_type)
            .field("len", &self.inner.data.len())
            .finish()
    }
}

fn media_type_for_extension(ext: &str) -> String {
    let mt = match ext.to_ascii_lowercase().as_str() {
        "txt" | "text" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    };
    mt.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn from_text_is_plain_text() {
        let doc = Document::from_text("syllabus.txt", "Week 1: Intro");
        assert_eq!(doc.name(), "syllabus.txt");
        assert_eq!(doc.media_type(), "text/plain");
        assert_eq!(doc.data(), b"Week 1: Intro");
    }

    #[test]
    fn clones_share_identity() {
        let a = Document::from_text("a.txt", "same");
        let b = a.clone();
        assert!(a.same_handle(&b));
    }

    #[test]
    fn equal_content_is_not_same_handle() {
        let a = Document::from_text("a.txt", "same");
        let b = Document::from_text("a.txt", "same");
        assert!(!a.same_handle(&b));
    }

    #[test]
    fn media_type_inference() {
        assert_eq!(media_type_for_extension("TXT"), "text/plain");
        assert_eq!(media_type_for_extension("md"), "text/markdown");
        assert_eq!(media_type_for_extension("pdf"), "application/pdf");
        assert_eq!(media_type_for_extension("bin"), "application/octet-stream");
    }

    #[tokio::test]
    async fn from_path_reads_and_infers() {
        let mut tmp = tempfile::Builder::new()
            .suffix(".md")
            .tempfile()
            .unwrap();
        tmp.write_all(b"# Course Outline").unwrap();

        let doc = Document::from_path(tmp.path()).await.unwrap();
        assert_eq!(doc.media_type(), "text/markdown");
        assert_eq!(doc.data(), b"# Course Outline");
        assert!(doc.name().ends_with(".md"));
    }

    #[tokio::test]
    async fn from_path_missing_file_errors() {
        let err = Document::from_path("/definitely/not/here.txt")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
