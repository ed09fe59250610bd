//! Pipeline orchestration: stage machine, run lifecycle, cancellation.
//!
//! ## Why a stage machine?
//!
//! The pipeline runs three collaborator-backed steps in a fixed order, and
//! callers (UIs, CLIs, tests) need to know where a run currently is and why
//! it stopped. [`StudyPipeline`] keeps that answer in one place: a single
//! [`PipelineStage`] that only ever moves forward, observable synchronously
//! through [`StageObserver`](crate::progress::StageObserver) callbacks or
//! polled via [`StudyPipeline::stage`].
//!
//! A pipeline instance owns one run. Submitting the same [`Document`] handle
//! again is a harmless no-op ([`RunOutcome::Duplicate`]); submitting a
//! different document while a run is live or finished is an error. Build a
//! fresh pipeline per document when processing several.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::document::Document;
use crate::error::{EmptyKind, PipelineError};
use crate::output::{RunStats, StudyMaterials};
use crate::pipeline::{enrich, generate};
use crate::progress::{ObserverHandle, PipelineStage};
use crate::providers::{TextExtractor, TextGenerator, VideoSearch};

/// Result of [`StudyPipeline::run`].
#[derive(Debug)]
pub enum RunOutcome {
    /// The run executed to completion and produced materials.
    Completed(StudyMaterials),
    /// The same document handle was already submitted; nothing happened.
    Duplicate,
}

impl RunOutcome {
    /// The produced materials, if this outcome carries any.
    pub fn into_materials(self) -> Option<StudyMaterials> {
        match self {
            RunOutcome::Completed(materials) => Some(materials),
            RunOutcome::Duplicate => None,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, RunOutcome::Duplicate)
    }
}

/// Outcome of claiming the pipeline for a document, before any work runs.
pub(crate) enum Claim {
    /// The document was accepted; the caller must drive the run.
    Started,
    /// Same handle as the active/finished run; do nothing.
    Duplicate,
}

struct RunState {
    stage: PipelineStage,
    active_doc: Option<Document>,
}

/// Orchestrates one document's journey from raw bytes to study materials.
///
/// # Example
/// ```rust,no_run
/// use std::sync::Arc;
/// use doc2study::{Document, PipelineConfig, StudyPipeline};
/// use doc2study::providers::{GeminiGenerator, PlainTextExtractor, YouTubeSearchClient};
///
/// # async fn demo() -> Result<(), doc2study::PipelineError> {
/// let pipeline = StudyPipeline::new(
///     Arc::new(PlainTextExtractor),
///     Arc::new(GeminiGenerator::new("gemini-key")),
///     Arc::new(YouTubeSearchClient::new(Some("youtube-key".into()))),
///     PipelineConfig::default(),
/// );
///
/// let doc = Document::from_text("syllabus.txt", "Week 1: Intro to Rust.");
/// let outcome = pipeline.run(&doc).await?;
/// # let _ = outcome;
/// # Ok(())
/// # }
/// ```
pub struct StudyPipeline {
    extractor: Arc<dyn TextExtractor>,
    generator: Arc<dyn TextGenerator>,
    lookup: Arc<dyn VideoSearch>,
    config: PipelineConfig,
    cancel: CancellationToken,
    state: Mutex<RunState>,
    observers: Mutex<Vec<ObserverHandle>>,
}

impl fmt::Debug for StudyPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudyPipeline")
            .field("extractor", &"<dyn TextExtractor>")
            .field("generator", &"<dyn TextGenerator>")
            .field("lookup", &"<dyn VideoSearch>")
            .field("config", &self.config)
            .field("stage", &self.stage())
            .finish()
    }
}

impl StudyPipeline {
    /// Create a pipeline from its three collaborators and a configuration.
    ///
    /// Observers seeded via [`PipelineConfig::observers`] are registered
    /// before the pipeline can emit any event.
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        generator: Arc<dyn TextGenerator>,
        lookup: Arc<dyn VideoSearch>,
        mut config: PipelineConfig,
    ) -> Self {
        let seeded = std::mem::take(&mut config.observers);
        Self {
            extractor,
            generator,
            lookup,
            config,
            cancel: CancellationToken::new(),
            state: Mutex::new(RunState {
                stage: PipelineStage::Idle,
                active_doc: None,
            }),
            observers: Mutex::new(seeded),
        }
    }

    /// Register an observer for stage and lookup events.
    ///
    /// Observers added after a stage transition has fired will not see that
    /// transition retroactively.
    pub fn register_observer(&self, observer: ObserverHandle) {
        self.lock_observers().push(observer);
    }

    /// Request cancellation of the active run.
    ///
    /// Safe to call from any thread, any number of times, including before
    /// [`run`](Self::run) starts. The run observes the request at the next
    /// stage boundary or while awaiting a collaborator, and fails with
    /// [`PipelineError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The stage the pipeline is currently in.
    pub fn stage(&self) -> PipelineStage {
        self.lock_state().stage
    }

    /// Run the full pipeline for `document`.
    ///
    /// # Returns
    /// * `Ok(RunOutcome::Completed(_))` — the document was processed.
    /// * `Ok(RunOutcome::Duplicate)` — this exact handle was already
    ///   submitted; no stage transition happened.
    ///
    /// # Errors
    /// * [`PipelineError::Busy`] — a different document is being processed.
    /// * [`PipelineError::AlreadyFinished`] — the pipeline already reached a
    ///   terminal stage for another document.
    /// * Any stage failure, after the pipeline has moved to
    ///   [`PipelineStage::Failed`] and notified observers.
    pub async fn run(&self, document: &Document) -> Result<RunOutcome, PipelineError> {
        match self.try_claim(document)? {
            Claim::Duplicate => Ok(RunOutcome::Duplicate),
            Claim::Started => self
                .run_claimed(document)
                .await
                .map(RunOutcome::Completed),
        }
    }

    /// Reserve the pipeline for `document` without doing any work.
    ///
    /// Lifecycle errors (`Busy`, `AlreadyFinished`) and duplicates are
    /// decided here, synchronously, so callers such as
    /// [`crate::stream::run_streamed`] can react before attaching observers.
    pub(crate) fn try_claim(&self, document: &Document) -> Result<Claim, PipelineError> {
        let mut state = self.lock_state();
        let same_doc = state
            .active_doc
            .as_ref()
            .is_some_and(|active| active.same_handle(document));

        match state.stage {
            PipelineStage::Idle if state.active_doc.is_none() => {
                state.active_doc = Some(document.clone());
                Ok(Claim::Started)
            }
            // Re-submission of the exact same handle is always a no-op,
            // whether the run is live or already finished.
            _ if same_doc => Ok(Claim::Duplicate),
            stage if stage.is_terminal() => Err(PipelineError::AlreadyFinished { stage }),
            _ => Err(PipelineError::Busy),
        }
    }

    /// Drive a run that [`try_claim`](Self::try_claim) already accepted.
    pub(crate) async fn run_claimed(
        &self,
        document: &Document,
    ) -> Result<StudyMaterials, PipelineError> {
        let started = Instant::now();
        let result = self.execute(document, started).await;
        match &result {
            Ok(materials) => {
                self.transition(PipelineStage::Done, None);
                for observer in self.observer_snapshot() {
                    observer.on_run_complete(materials);
                }
            }
            Err(e) => {
                error!("Pipeline failed: {}", e);
                self.transition(PipelineStage::Failed, Some(e));
            }
        }
        result
    }

    async fn execute(
        &self,
        document: &Document,
        started: Instant,
    ) -> Result<StudyMaterials, PipelineError> {
        // Cancellation requested before any work: fail without ever leaving
        // Idle in the error payload.
        self.ensure_not_cancelled()?;
        info!("Starting run for \"{}\"", document.name());

        // ── Stage 1: Extract text ────────────────────────────────────────
        self.transition(PipelineStage::Extracting, None);
        let text = self.guard(self.extractor.extract_text(document)).await??;
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyResult {
                kind: EmptyKind::BlankText,
            });
        }
        let extracted_chars = text.chars().count();
        info!("Extracted {} chars from \"{}\"", extracted_chars, document.name());

        // ── Stage 2: Study guide ─────────────────────────────────────────
        self.ensure_not_cancelled()?;
        self.transition(PipelineStage::GeneratingGuide, None);
        let guide = self
            .guard(generate::study_guide(
                &self.generator,
                self.config.guide_template(),
                &text,
            ))
            .await??;
        if guide.sections.is_empty() {
            return Err(PipelineError::EmptyResult {
                kind: EmptyKind::NoSections,
            });
        }
        info!(
            "Study guide \"{}\": {} sections, {} topics",
            guide.title,
            guide.sections.len(),
            guide.topic_count()
        );

        // ── Stage 3: Video recommendations ───────────────────────────────
        self.ensure_not_cancelled()?;
        self.transition(PipelineStage::GeneratingVideos, None);
        let topic_names: Vec<&str> = guide
            .flattened_topics()
            .map(|topic| topic.name.as_str())
            .collect();

        let videos = if topic_names.is_empty() {
            // Sections without topics is unusual but valid output; there is
            // simply nothing to search for.
            warn!("Study guide has no topics; skipping video recommendations");
            Vec::new()
        } else {
            let mut stubs = self
                .guard(generate::video_stubs(
                    &self.generator,
                    self.config.video_template(),
                    &topic_names,
                    self.config.max_videos,
                ))
                .await??;
            if self.config.enforce_video_cap && stubs.len() > self.config.max_videos {
                warn!(
                    "Generator returned {} recommendations, capping at {}",
                    stubs.len(),
                    self.config.max_videos
                );
                stubs.truncate(self.config.max_videos);
            }
            let observers = self.observer_snapshot();
            self.guard(enrich::resolve_urls(&self.lookup, &observers, stubs))
                .await?
        };

        let stats = RunStats {
            extracted_chars,
            section_count: guide.sections.len(),
            topic_count: guide.topic_count(),
            video_count: videos.len(),
            resolved_video_count: videos.iter().filter(|v| !v.video_url.is_empty()).count(),
            total_duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "Run finished in {}ms: {} videos ({} resolved)",
            stats.total_duration_ms, stats.video_count, stats.resolved_video_count
        );

        Ok(StudyMaterials {
            guide,
            videos,
            stats,
        })
    }

    /// Race a stage future against the cancellation token.
    ///
    /// When cancellation wins, the stage future is dropped, which also
    /// aborts any in-flight collaborator requests it owns.
    async fn guard<T>(&self, fut: impl Future<Output = T>) -> Result<T, PipelineError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PipelineError::Cancelled {
                during: self.stage(),
            }),
            value = fut => Ok(value),
        }
    }

    fn ensure_not_cancelled(&self) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            Err(PipelineError::Cancelled {
                during: self.stage(),
            })
        } else {
            Ok(())
        }
    }

    /// Move to `stage` and notify observers, outside the state lock.
    fn transition(&self, stage: PipelineStage, error: Option<&PipelineError>) {
        {
            let mut state = self.lock_state();
            state.stage = stage;
        }
        if let Some(progress) = stage.progress() {
            info!("[{}/{}] {}", progress.step, progress.total_steps, progress.label);
        }
        for observer in self.observer_snapshot() {
            observer.on_stage(stage, error);
        }
    }

    fn observer_snapshot(&self) -> Vec<ObserverHandle> {
        self.lock_observers().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_observers(&self) -> MutexGuard<'_, Vec<ObserverHandle>> {
        self.observers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractionError, GenerationCallError, LookupError};
    use async_trait::async_trait;

    struct StubExtractor;

    #[async_trait]
    impl TextExtractor for StubExtractor {
        async fn extract_text(&self, _document: &Document) -> Result<String, ExtractionError> {
            Ok("stub".into())
        }
    }

    struct StubGenerator;

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate_text(&self, _prompt: &str) -> Result<String, GenerationCallError> {
            Ok("{}".into())
        }
    }

    struct StubLookup;

    #[async_trait]
    impl VideoSearch for StubLookup {
        async fn lookup_video_url(&self, _query: &str) -> Result<String, LookupError> {
            Ok(String::new())
        }
    }

    fn pipeline() -> StudyPipeline {
        StudyPipeline::new(
            Arc::new(StubExtractor),
            Arc::new(StubGenerator),
            Arc::new(StubLookup),
            PipelineConfig::default(),
        )
    }

    fn set_stage(pipeline: &StudyPipeline, stage: PipelineStage) {
        pipeline.lock_state().stage = stage;
    }

    #[test]
    fn fresh_pipeline_is_idle() {
        assert_eq!(pipeline().stage(), PipelineStage::Idle);
    }

    #[test]
    fn first_claim_starts_the_run() {
        let p = pipeline();
        let doc = Document::from_text("a.txt", "text");
        assert!(matches!(p.try_claim(&doc), Ok(Claim::Started)));
    }

    #[test]
    fn same_handle_is_a_duplicate_while_running() {
        let p = pipeline();
        let doc = Document::from_text("a.txt", "text");
        assert!(matches!(p.try_claim(&doc), Ok(Claim::Started)));
        set_stage(&p, PipelineStage::GeneratingGuide);
        assert!(matches!(p.try_claim(&doc), Ok(Claim::Duplicate)));
    }

    #[test]
    fn same_handle_is_a_duplicate_after_terminal() {
        let p = pipeline();
        let doc = Document::from_text("a.txt", "text");
        assert!(matches!(p.try_claim(&doc), Ok(Claim::Started)));
        set_stage(&p, PipelineStage::Done);
        assert!(matches!(p.try_claim(&doc), Ok(Claim::Duplicate)));
    }

    #[test]
    fn equal_content_is_not_the_same_handle() {
        let p = pipeline();
        let doc = Document::from_text("a.txt", "text");
        let twin = Document::from_text("a.txt", "text");
        assert!(matches!(p.try_claim(&doc), Ok(Claim::Started)));
        set_stage(&p, PipelineStage::Extracting);
        assert!(matches!(p.try_claim(&twin), Err(PipelineError::Busy)));
    }

    #[test]
    fn different_doc_after_terminal_reports_the_stage() {
        let p = pipeline();
        let doc = Document::from_text("a.txt", "text");
        let other = Document::from_text("b.txt", "other");
        assert!(matches!(p.try_claim(&doc), Ok(Claim::Started)));
        set_stage(&p, PipelineStage::Failed);
        match p.try_claim(&other) {
            Err(PipelineError::AlreadyFinished { stage }) => {
                assert_eq!(stage, PipelineStage::Failed);
            }
            other => panic!("expected AlreadyFinished, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn lifecycle_errors_do_not_touch_the_stage() {
        let p = pipeline();
        let doc = Document::from_text("a.txt", "text");
        let other = Document::from_text("b.txt", "other");
        assert!(matches!(p.try_claim(&doc), Ok(Claim::Started)));
        set_stage(&p, PipelineStage::Extracting);
        let _ = p.try_claim(&other);
        assert_eq!(p.stage(), PipelineStage::Extracting);
    }

    #[tokio::test]
    async fn cancel_before_run_fails_from_idle() {
        let p = pipeline();
        p.cancel();
        let doc = Document::from_text("a.txt", "text");
        match p.run(&doc).await {
            Err(PipelineError::Cancelled { during }) => {
                assert_eq!(during, PipelineStage::Idle);
            }
            other => panic!("expected Cancelled, got {other:?}"),
        }
        assert_eq!(p.stage(), PipelineStage::Failed);
    }

    #[test]
    fn debug_elides_collaborators() {
        let rendered = format!("{:?}", pipeline());
        assert!(rendered.contains("<dyn TextGenerator>"));
        assert!(!rendered.contains("StubGenerator"));
    }
}
