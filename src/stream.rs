//! Streaming run API: stage events as they happen.
//!
//! ## Why stream?
//!
//! A run crosses three collaborator calls and can take tens of seconds.
//! [`run_streamed`] turns the observer callbacks into an async [`Stream`] of
//! [`StageEvent`]s, which composes naturally with `while let` loops, UI
//! update tasks, and `select!` blocks. Unlike the eager
//! [`StudyPipeline::run`], which returns only at the end, the stream yields
//! each stage transition the moment it happens and closes after the terminal
//! event.
//!
//! The stream is a view, not a second pipeline: observers registered on the
//! pipeline keep firing, and the run's outcome is identical to calling
//! `run` directly.

use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;

use crate::controller::{Claim, StudyPipeline};
use crate::document::Document;
use crate::error::PipelineError;
use crate::output::StudyMaterials;
use crate::progress::{PipelineStage, StageObserver};

/// One event on a streamed run.
///
/// Non-terminal stage entries arrive as [`StageEvent::Transition`]; the run
/// then ends with exactly one [`StageEvent::Done`] or [`StageEvent::Failed`]
/// carrying the full payload, after which the stream closes.
#[derive(Debug, Clone)]
pub enum StageEvent {
    /// The run entered a non-terminal stage.
    Transition(PipelineStage),
    /// The run finished; here are the materials.
    Done(Arc<StudyMaterials>),
    /// The run stopped; here is why.
    Failed(Arc<PipelineError>),
}

impl StageEvent {
    /// The stage this event corresponds to.
    pub fn stage(&self) -> PipelineStage {
        match self {
            StageEvent::Transition(stage) => *stage,
            StageEvent::Done(_) => PipelineStage::Done,
            StageEvent::Failed(_) => PipelineStage::Failed,
        }
    }

    /// The failure payload, for [`StageEvent::Failed`] events.
    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            StageEvent::Failed(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// A boxed stream of run events.
pub type EventStream = Pin<Box<dyn Stream<Item = StageEvent> + Send>>;

/// Run the pipeline for `document`, yielding stage events as they happen.
///
/// Semantics match [`StudyPipeline::run`]:
/// * a duplicate submission of the same handle yields an empty stream;
/// * `Busy` / `AlreadyFinished` yield a single [`StageEvent::Failed`]
///   without touching the pipeline's stage;
/// * an accepted run yields its transitions followed by one terminal event.
///
/// The run is driven by a spawned task, so dropping the stream early does
/// not cancel it; use [`StudyPipeline::cancel`] for that.
///
/// # Example
/// ```rust,no_run
/// use std::sync::Arc;
/// use doc2study::{run_streamed, Document, PipelineConfig, StudyPipeline};
/// use doc2study::providers::{GeminiGenerator, PlainTextExtractor, YouTubeSearchClient};
/// use futures::StreamExt;
///
/// # async fn demo() {
/// let pipeline = Arc::new(StudyPipeline::new(
///     Arc::new(PlainTextExtractor),
///     Arc::new(GeminiGenerator::new("gemini-key")),
///     Arc::new(YouTubeSearchClient::new(None)),
///     PipelineConfig::default(),
/// ));
/// let doc = Document::from_text("syllabus.txt", "Week 1: Ownership.");
///
/// let mut events = run_streamed(Arc::clone(&pipeline), doc);
/// while let Some(event) = events.next().await {
///     println!("{}", event.stage());
/// }
/// # }
/// ```
pub fn run_streamed(pipeline: Arc<StudyPipeline>, document: Document) -> EventStream {
    let (tx, rx) = mpsc::unbounded_channel();

    match pipeline.try_claim(&document) {
        Ok(Claim::Duplicate) => {
            // Mirror run()'s silent no-op: close without emitting anything.
            drop(tx);
        }
        Err(e) => {
            let _ = tx.send(StageEvent::Failed(Arc::new(e)));
            drop(tx);
        }
        Ok(Claim::Started) => {
            pipeline.register_observer(Arc::new(ForwardingObserver {
                tx: Mutex::new(Some(tx.clone())),
            }));
            tokio::spawn(async move {
                let event = match pipeline.run_claimed(&document).await {
                    Ok(materials) => StageEvent::Done(Arc::new(materials)),
                    Err(e) => StageEvent::Failed(Arc::new(e)),
                };
                let _ = tx.send(event);
            });
        }
    }

    Box::pin(UnboundedReceiverStream::new(rx))
}

/// Observer that forwards non-terminal transitions into the event channel.
struct ForwardingObserver {
    tx: Mutex<Option<mpsc::UnboundedSender<StageEvent>>>,
}

impl StageObserver for ForwardingObserver {
    fn on_stage(&self, stage: PipelineStage, _error: Option<&PipelineError>) {
        let mut slot = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        if stage.is_terminal() {
            // The driving task sends the terminal event with its payload.
            // Dropping our sender here lets the stream close once that
            // payload has been consumed.
            slot.take();
        } else if let Some(tx) = slot.as_ref() {
            let _ = tx.send(StageEvent::Transition(stage));
        }
    }
}
