//! Pipeline stages for document-to-study-materials generation.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. replace the recommendation lookup) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ generate ──▶ enrich
//! (document)  (LLM JSON)   (video URLs)
//! ```
//!
//! 1. extraction — turn the uploaded [`crate::document::Document`] into plain
//!    text; lives behind [`crate::providers::TextExtractor`] so callers can
//!    plug in format-specific extractors
//! 2. [`generate`] — drive the two LLM calls (study guide, video stubs),
//!    isolate the JSON payload out of the prose the model wraps around it,
//!    and validate the result; [`payload`] holds the isolation scanner
//! 3. [`enrich`] — resolve one video URL per stub concurrently, degrading
//!    per item instead of failing the run

pub mod enrich;
pub mod generate;
pub mod payload;
