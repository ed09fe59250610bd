//! Pipeline stages and the observer trait for stage-transition events.
//!
//! Inject an [`Arc<dyn StageObserver>`] via
//! [`crate::config::PipelineConfigBuilder::observer`] (or
//! [`crate::controller::StudyPipeline::register_observer`]) to receive every
//! stage transition as the pipeline processes a document.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a Tokio channel, a WebSocket, a database record, or a
//! terminal progress bar — without the library knowing anything about how the
//! host application communicates. [`crate::stream::run_streamed`] is exactly
//! such a forwarder, built on this trait. Observers are invoked synchronously
//! on the run task before the next stage's work begins, so the event order is
//! always consistent with the state machine.
//!
//! # Example
//!
//! ```rust
//! use doc2study::{PipelineConfig, PipelineError, PipelineStage, StageObserver};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     transitions: Arc<AtomicUsize>,
//! }
//!
//! impl StageObserver for CountingObserver {
//!     fn on_stage(&self, stage: PipelineStage, _error: Option<&PipelineError>) {
//!         self.transitions.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("entered stage: {stage}");
//!     }
//! }
//!
//! let observer = Arc::new(CountingObserver {
//!     transitions: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = PipelineConfig::builder()
//!     .observer(observer as Arc<dyn StageObserver>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::PipelineError;
use crate::output::StudyMaterials;

/// Number of stages shown to users (Extracting through Done).
///
/// `Idle` and `Failed` are not display stages; see [`PipelineStage::progress`].
pub const TOTAL_DISPLAY_STAGES: usize = 4;

/// The pipeline's state machine.
///
/// Exactly one stage is current per run. Transitions move strictly forward
/// (`Idle → Extracting → GeneratingGuide → GeneratingVideos → Done`), except
/// that `Failed` is reachable from any non-terminal stage. `Done` and
/// `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Constructed, no document submitted yet.
    Idle,
    /// The extraction collaborator is producing text from the document.
    Extracting,
    /// The study guide is being generated and validated.
    GeneratingGuide,
    /// Recommendations are being generated and enriched with URLs.
    GeneratingVideos,
    /// Terminal: study materials are ready.
    Done,
    /// Terminal: the run aborted with a [`PipelineError`].
    Failed,
}

impl PipelineStage {
    /// Whether the stage is terminal (`Done` or `Failed`).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Projection into a bounded ordinal for progress display.
    ///
    /// `Idle` and `Failed` return `None` — the progress indicator should be
    /// hidden for them. The mapping is a pure function of the stage: no
    /// internal state, recomputed on every transition.
    pub fn progress(self) -> Option<StageProgress> {
        let (step, label) = match self {
            Self::Idle | Self::Failed => return None,
            Self::Extracting => (1, "Extracting text from syllabus..."),
            Self::GeneratingGuide => (2, "Generating study guide..."),
            Self::GeneratingVideos => (3, "Finding relevant videos..."),
            Self::Done => (4, "Processing complete!"),
        };
        Some(StageProgress {
            step,
            total_steps: TOTAL_DISPLAY_STAGES,
            label,
        })
    }
}

// Stable machine-readable keys, e.g. for log fields and CLI output.
impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            Self::Idle => "idle",
            Self::Extracting => "extracting",
            Self::GeneratingGuide => "generating_guide",
            Self::GeneratingVideos => "generating_videos",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(key)
    }
}

/// One stage projected onto the display scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageProgress {
    /// 1-based ordinal of the current display stage.
    pub step: usize,
    /// Always [`TOTAL_DISPLAY_STAGES`].
    pub total_steps: usize,
    /// Human-readable stage label.
    pub label: &'static str,
}

impl StageProgress {
    /// Completion percentage for a simple progress bar.
    pub fn percent(&self) -> u8 {
        ((self.step * 100) / self.total_steps) as u8
    }
}

/// Called by the pipeline as a run moves through its stages.
///
/// Implementations must be `Send + Sync`. All methods have default no-op
/// implementations so callers only override what they care about.
///
/// # Thread safety
///
/// `on_stage` and `on_run_complete` are invoked from the run task in stage
/// order. `on_lookup_complete` may be called from concurrently completing
/// lookups in arbitrary order; implementations must protect shared mutable
/// state with appropriate synchronisation primitives (e.g. `Mutex`,
/// `AtomicUsize`).
pub trait StageObserver: Send + Sync {
    /// Called on every stage transition, before the stage's work begins.
    ///
    /// # Arguments
    /// * `stage` — the stage just entered
    /// * `error` — the fatal error when `stage` is `Failed`; `None` otherwise
    fn on_stage(&self, stage: PipelineStage, error: Option<&PipelineError>) {
        let _ = (stage, error);
    }

    /// Called as each video lookup resolves, in completion order.
    ///
    /// # Arguments
    /// * `index` — 0-indexed position of the stub in the recommendation list
    /// * `total` — number of stubs being enriched
    /// * `found` — whether the lookup produced a non-empty URL
    fn on_lookup_complete(&self, index: usize, total: usize, found: bool) {
        let _ = (index, total, found);
    }

    /// Called once when the run reaches `Done`, after the final transition.
    ///
    /// # Arguments
    /// * `materials` — the completed study materials about to be returned
    fn on_run_complete(&self, materials: &StudyMaterials) {
        let _ = materials;
    }
}

/// A no-op implementation for callers that don't need stage events.
pub struct NoopStageObserver;

impl StageObserver for NoopStageObserver {}

/// Convenience alias matching the type stored in
/// [`crate::config::PipelineConfig`].
pub type ObserverHandle = Arc<dyn StageObserver>;
