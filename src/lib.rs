//! # doc2study
//!
//! Turn an uploaded course document into a structured study guide with
//! enriched video recommendations, using an LLM plus a video search API.
//!
//! ## Why this crate?
//!
//! Syllabi and course outlines are written for humans, not revision plans.
//! Students end up re-deriving the same structure by hand: what the units
//! are, what each topic means, what to watch to go deeper. This crate runs
//! that transformation as a small, observable pipeline: extract the text,
//! ask an LLM for a study guide and a topic-ordered video list as JSON, then
//! resolve every recommendation to a real watch URL concurrently. Models
//! wrap JSON in prose and markdown fences, so payload isolation and
//! validation are explicit stages rather than a hopeful `from_str`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Document
//!  │
//!  ├─ 1. Extract   pull plain text out of the uploaded bytes
//!  ├─ 2. Guide     one LLM call → JSON study guide (sections → topics)
//!  ├─ 3. Videos    one LLM call → recommendation stubs per topic
//!  ├─ 4. Enrich    concurrent video-search lookups fill in watch URLs
//!  └─ 5. Output    StudyMaterials: guide + ordered recommendations + stats
//! ```
//!
//! The pipeline is a forward-only stage machine ([`PipelineStage`]);
//! observers see every transition synchronously, and [`run_streamed`] turns
//! the same run into an async stream of events.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use doc2study::{Document, PipelineConfig, RunOutcome, StudyPipeline};
//! use doc2study::providers::{GeminiGenerator, PlainTextExtractor, YouTubeSearchClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = StudyPipeline::new(
//!         Arc::new(PlainTextExtractor),
//!         Arc::new(GeminiGenerator::new(std::env::var("GEMINI_API_KEY")?)),
//!         Arc::new(YouTubeSearchClient::new(std::env::var("YOUTUBE_API_KEY").ok())),
//!         PipelineConfig::default(),
//!     );
//!
//!     let doc = Document::from_path("syllabus.txt").await?;
//!     if let RunOutcome::Completed(materials) = pipeline.run(&doc).await? {
//!         println!("{}", materials.guide.title);
//!         eprintln!("videos: {} ({} resolved)",
//!             materials.stats.video_count,
//!             materials.stats.resolved_video_count);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2study` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! doc2study = { version = "0.1", default-features = false }
//! ```
//!
//! ## Bring Your Own Collaborators
//!
//! Every external dependency sits behind a trait in [`providers`]:
//!
//! | Trait | Bundled impl | Swap in |
//! |-------|--------------|---------|
//! | [`providers::TextExtractor`] | [`providers::PlainTextExtractor`] | PDF/OCR extractors |
//! | [`providers::TextGenerator`] | [`providers::GeminiGenerator`] | any text-completion client |
//! | [`providers::VideoSearch`] | [`providers::YouTubeSearchClient`] | an internal video catalogue |
//!
//! Tests inject scripted collaborators the same way; no HTTP mocking needed.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod providers;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use controller::{RunOutcome, StudyPipeline};
pub use document::Document;
pub use error::{
    EmptyKind, ExtractionError, GenerationCallError, LookupError, PipelineError,
};
pub use output::{
    RecommendationStub, RunStats, StudyGuide, StudyMaterials, StudySection, StudyTopic,
    VideoRecommendation,
};
pub use pipeline::payload::PayloadKind;
pub use progress::{
    NoopStageObserver, ObserverHandle, PipelineStage, StageObserver, StageProgress,
    TOTAL_DISPLAY_STAGES,
};
pub use stream::{run_streamed, EventStream, StageEvent};
