//! Collaborator contracts and their default implementations.
//!
//! The pipeline core treats its three external dependencies as injected
//! trait objects:
//!
//! - [`TextExtractor`] — document bytes to text
//! - [`TextGenerator`] — prompt to free-form model response
//! - [`VideoSearch`] — search query to best-match video URL
//!
//! Default implementations ship alongside ([`gemini::GeminiGenerator`],
//! [`youtube::YouTubeSearchClient`], [`plaintext::PlainTextExtractor`]) so
//! the crate works out of the box, but anything implementing the traits
//! plugs in: tests inject scripted collaborators, and a host application can
//! substitute its own OCR extractor or a different search backend without
//! touching the pipeline.

pub mod gemini;
pub mod plaintext;
pub mod youtube;

pub use gemini::{GeminiGenerator, DEFAULT_GEMINI_MODEL};
pub use plaintext::PlainTextExtractor;
pub use youtube::YouTubeSearchClient;

use async_trait::async_trait;

use crate::document::Document;
use crate::error::{ExtractionError, GenerationCallError, LookupError};

/// Produces text from an uploaded document.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the full text of `document`.
    ///
    /// Blank output (empty or whitespace-only) is not an error at this
    /// level; the controller turns it into an empty-result failure.
    async fn extract_text(&self, document: &Document) -> Result<String, ExtractionError>;
}

/// Opaque text-generation collaborator: one prompt in, free-form text out.
///
/// The pipeline never asks for structured output here. Isolating and
/// validating the payload embedded in the response is
/// [`crate::pipeline::generate`]'s job.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationCallError>;
}

/// Resolves a search query to a single video URL.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Best-match URL for `query`, or an empty string when nothing matches.
    ///
    /// Errors are advisory: the enrichment fan-out logs them and degrades
    /// the affected recommendation instead of failing the run.
    async fn lookup_video_url(&self, query: &str) -> Result<String, LookupError>;
}
