//! Error types for the doc2study library.
//!
//! Two distinct tiers reflect two distinct failure modes:
//!
//! * [`PipelineError`] — **Fatal**: the run cannot produce study materials
//!   (unreadable document, malformed generation output, cancelled run).
//!   Returned as `Err(PipelineError)` from
//!   [`crate::controller::StudyPipeline::run`] and carried by the terminal
//!   `Failed` stage event.
//!
//! * [`LookupError`] — **Non-fatal**: a single video lookup failed (HTTP
//!   error, timeout, unexpected payload) but every other recommendation is
//!   fine. Recovered inside the enrichment fan-out: the affected entry keeps
//!   an empty `videoUrl` and the run continues.
//!
//! The separation keeps enrichment degradation invisible to callers while
//! every generation failure aborts loudly, tagged with the stage it arose in
//! via [`PipelineError::stage`].

use thiserror::Error;

use crate::pipeline::payload::PayloadKind;
use crate::progress::PipelineStage;

/// All fatal errors returned by the doc2study library.
///
/// Per-lookup failures use [`LookupError`] and are absorbed by the
/// enrichment fan-out rather than propagated here.
#[derive(Debug, Error)]
pub enum PipelineError {
    // ── Document errors ───────────────────────────────────────────────────
    /// The extraction collaborator could not produce text for the document.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// A stage produced an empty result where content is required.
    #[error("{kind}")]
    EmptyResult { kind: EmptyKind },

    // ── Generation errors ─────────────────────────────────────────────────
    /// The text-generation collaborator call itself failed.
    #[error("Generation call failed while producing the {kind}: {source}")]
    GenerationCall {
        kind: PayloadKind,
        #[source]
        source: GenerationCallError,
    },

    /// The model response contains no balanced payload of the expected shape.
    #[error(
        "No {kind} payload found in the model response.\n\
         Response began with: {response_preview:?}"
    )]
    ExtractionSpan {
        kind: PayloadKind,
        response_preview: String,
    },

    /// A payload span was located but is not well-formed JSON.
    #[error("The {kind} payload is not valid JSON: {source}")]
    Parse {
        kind: PayloadKind,
        #[source]
        source: serde_json::Error,
    },

    /// The payload parsed but fails the required-field checks.
    #[error("The {kind} payload failed validation: {message}")]
    Validation { kind: PayloadKind, message: String },

    // ── Lifecycle errors ──────────────────────────────────────────────────
    /// The caller cancelled the run.
    #[error("Processing was cancelled during the '{during}' stage")]
    Cancelled { during: PipelineStage },

    /// A different document was submitted while a run is in flight.
    #[error(
        "Pipeline is already processing another document.\n\
         Create one StudyPipeline per document."
    )]
    Busy,

    /// A different document was submitted after the run reached a terminal
    /// stage.
    #[error(
        "Pipeline already finished (stage '{stage}').\n\
         Create one StudyPipeline per document."
    )]
    AlreadyFinished { stage: PipelineStage },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    /// The pipeline stage during which this error arises.
    ///
    /// Lets callers render "failed while generating the study guide" without
    /// tracking stages themselves. Lifecycle misuse ([`PipelineError::Busy`],
    /// [`PipelineError::AlreadyFinished`]) and config errors happen outside
    /// any run and map to [`PipelineStage::Idle`].
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Extraction(_) => PipelineStage::Extracting,
            Self::EmptyResult {
                kind: EmptyKind::BlankText,
            } => PipelineStage::Extracting,
            Self::EmptyResult {
                kind: EmptyKind::NoSections,
            } => PipelineStage::GeneratingGuide,
            Self::GenerationCall { kind, .. }
            | Self::ExtractionSpan { kind, .. }
            | Self::Parse { kind, .. }
            | Self::Validation { kind, .. } => kind.stage(),
            Self::Cancelled { during } => *during,
            Self::Busy | Self::AlreadyFinished { .. } | Self::InvalidConfig(_) => {
                PipelineStage::Idle
            }
        }
    }
}

/// What was empty in a [`PipelineError::EmptyResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyKind {
    /// Extraction succeeded but returned only whitespace.
    BlankText,
    /// The generated study guide has zero sections.
    NoSections,
}

impl std::fmt::Display for EmptyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::BlankText => "No text could be extracted from the document.",
            Self::NoSections => "Study guide generation failed or returned no sections.",
        };
        f.write_str(msg)
    }
}

/// Failure reported by a [`crate::providers::TextExtractor`].
///
/// Wrapped into [`PipelineError::Extraction`] by the controller; extractor
/// implementations build it with [`ExtractionError::new`].
#[derive(Debug, Error)]
#[error("Text extraction failed: {message}")]
pub struct ExtractionError {
    pub message: String,
}

impl ExtractionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure reported by a [`crate::providers::TextGenerator`].
///
/// Wrapped into [`PipelineError::GenerationCall`] together with the payload
/// kind being produced at the time.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct GenerationCallError {
    pub message: String,
}

impl GenerationCallError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A non-fatal error for a single video lookup.
///
/// The enrichment fan-out logs it at warn level and degrades the affected
/// recommendation to an empty `videoUrl`. The run never fails because of one.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum LookupError {
    /// The search request failed at the HTTP level (connect error, non-2xx).
    #[error("Video search request failed: {detail}")]
    RequestFailed { detail: String },

    /// The search request exceeded the client timeout.
    #[error("Video search timed out")]
    Timeout,

    /// The response decoded but did not have the expected shape.
    #[error("Video search returned an unexpected payload: {detail}")]
    MalformedResponse { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_display_matches_user_message() {
        let e = PipelineError::EmptyResult {
            kind: EmptyKind::BlankText,
        };
        assert_eq!(e.to_string(), "No text could be extracted from the document.");
    }

    #[test]
    fn no_sections_maps_to_guide_stage() {
        let e = PipelineError::EmptyResult {
            kind: EmptyKind::NoSections,
        };
        assert_eq!(e.stage(), PipelineStage::GeneratingGuide);
        assert!(e.to_string().contains("no sections"), "got: {e}");
    }

    #[test]
    fn validation_display_names_payload_kind() {
        let e = PipelineError::Validation {
            kind: PayloadKind::VideoList,
            message: "entry 2: topicOrder must be an integer".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("video list"), "got: {msg}");
        assert!(msg.contains("topicOrder"), "got: {msg}");
    }

    #[test]
    fn extraction_span_display_carries_preview() {
        let e = PipelineError::ExtractionSpan {
            kind: PayloadKind::StudyGuide,
            response_preview: "I'm sorry, I can't".into(),
        };
        assert!(e.to_string().contains("I'm sorry"), "got: {e}");
        assert_eq!(e.stage(), PipelineStage::GeneratingGuide);
    }

    #[test]
    fn cancelled_display_names_stage() {
        let e = PipelineError::Cancelled {
            during: PipelineStage::GeneratingVideos,
        };
        assert!(e.to_string().contains("generating_videos"), "got: {e}");
        assert_eq!(e.stage(), PipelineStage::GeneratingVideos);
    }

    #[test]
    fn generation_errors_map_stage_by_kind() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let e = PipelineError::Parse {
            kind: PayloadKind::VideoList,
            source: parse_err,
        };
        assert_eq!(e.stage(), PipelineStage::GeneratingVideos);
    }

    #[test]
    fn lifecycle_errors_map_to_idle() {
        assert_eq!(PipelineError::Busy.stage(), PipelineStage::Idle);
        let e = PipelineError::AlreadyFinished {
            stage: PipelineStage::Done,
        };
        assert_eq!(e.stage(), PipelineStage::Idle);
        assert!(e.to_string().contains("done"), "got: {e}");
    }
}
