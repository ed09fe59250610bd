//! Content generation: one model call, one validated domain object.
//!
//! Both generation stages run the same path: build the prompt, call the
//! collaborator once, isolate the payload span, parse it leniently, then
//! validate required fields. The module is intentionally thin on prompt
//! text — all templates live in [`crate::prompts`].
//!
//! ## Error taxonomy
//!
//! The three failure classes stay distinct so callers can tell "the model
//! refused" from "the model emitted garbage" from "the model came close":
//!
//! 1. No balanced span of the expected kind → [`PipelineError::ExtractionSpan`]
//! 2. The span is not well-formed JSON → [`PipelineError::Parse`]
//! 3. The JSON parses but a required field is missing or empty →
//!    [`PipelineError::Validation`]
//!
//! Parsing goes through lenient `Raw*` shapes (every field optional) rather
//! than the strict output types, so a guide without a `title` surfaces as a
//! validation failure naming the field, not as a serde error pointing at a
//! byte offset. For the same reason `topicOrder` is read as a raw JSON
//! number first: `2.5` is *well-formed* JSON and must fail validation, not
//! parsing.
//!
//! There is no retry at this level. One attempt per call; a failed call is a
//! failed stage.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::PipelineError;
use crate::output::{RecommendationStub, StudyGuide, StudySection, StudyTopic};
use crate::pipeline::payload::{extract_balanced_span, PayloadKind};
use crate::prompts;
use crate::providers::TextGenerator;

/// Generate and validate the study guide for one syllabus text.
pub async fn study_guide(
    generator: &Arc<dyn TextGenerator>,
    template: &str,
    syllabus_text: &str,
) -> Result<StudyGuide, PipelineError> {
    let kind = PayloadKind::StudyGuide;
    let prompt = prompts::build_guide_prompt(template, syllabus_text);
    let response = call(generator, kind, &prompt).await?;

    let span = locate(&response, kind)?;
    let raw: RawGuide = parse(span, kind)?;
    validate_guide(raw)
}

/// Generate and validate recommendation stubs for a flattened topic list.
///
/// The stubs carry no URLs; enrichment happens afterwards in
/// [`crate::pipeline::enrich`].
pub async fn video_stubs(
    generator: &Arc<dyn TextGenerator>,
    template: &str,
    topic_names: &[&str],
    max_videos: usize,
) -> Result<Vec<RecommendationStub>, PipelineError> {
    let kind = PayloadKind::VideoList;
    let topic_list = prompts::format_topic_list(topic_names.iter().copied());
    let prompt = prompts::build_video_prompt(template, &topic_list, max_videos);
    let response = call(generator, kind, &prompt).await?;

    let span = locate(&response, kind)?;
    let raw: Vec<RawStub> = parse(span, kind)?;
    validate_stubs(raw)
}

async fn call(
    generator: &Arc<dyn TextGenerator>,
    kind: PayloadKind,
    prompt: &str,
) -> Result<String, PipelineError> {
    debug!("{}: prompt built ({} chars)", kind.as_str(), prompt.len());
    let response = generator
        .generate_text(prompt)
        .await
        .map_err(|source| PipelineError::GenerationCall { kind, source })?;
    debug!("{}: response received ({} chars)", kind.as_str(), response.len());
    Ok(response)
}

fn locate(response: &str, kind: PayloadKind) -> Result<&str, PipelineError> {
    extract_balanced_span(response, kind).ok_or_else(|| PipelineError::ExtractionSpan {
        kind,
        response_preview: preview(response),
    })
}

fn parse<T: DeserializeOwned>(span: &str, kind: PayloadKind) -> Result<T, PipelineError> {
    serde_json::from_str(span).map_err(|source| PipelineError::Parse { kind, source })
}

/// First 120 chars of the response, for error context.
fn preview(response: &str) -> String {
    const MAX: usize = 120;
    let trimmed = response.trim();
    if trimmed.len() <= MAX {
        return trimmed.to_string();
    }
    let mut end = MAX;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}

// ── Lenient wire shapes ──────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGuide {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    sections: Vec<RawSection>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSection {
    #[serde(default)]
    section_title: Option<String>,
    #[serde(default)]
    topics: Vec<RawTopic>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTopic {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    learning_objectives: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStub {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    topic_order: Option<serde_json::Number>,
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Required-field checks for a guide: `title` must be present and non-blank.
///
/// Section and topic fields are accepted as given (missing ones become empty
/// strings); a guide with zero sections is also accepted here — the
/// controller treats that case as an empty-result failure with its own error.
fn validate_guide(raw: RawGuide) -> Result<StudyGuide, PipelineError> {
    let title = require_text(raw.title, "title", PayloadKind::StudyGuide)?;

    let sections = raw
        .sections
        .into_iter()
        .map(|s| StudySection {
            section_title: s.section_title.unwrap_or_default(),
            topics: s
                .topics
                .into_iter()
                .map(|t| StudyTopic {
                    name: t.name.unwrap_or_default(),
                    explanation: t.explanation.unwrap_or_default(),
                    learning_objectives: t.learning_objectives,
                })
                .collect(),
        })
        .collect();

    Ok(StudyGuide { title, sections })
}

/// Required-field checks for stubs: non-blank `title` and `description`,
/// integer `topicOrder`. An empty list is valid.
fn validate_stubs(raw: Vec<RawStub>) -> Result<Vec<RecommendationStub>, PipelineError> {
    let kind = PayloadKind::VideoList;
    raw.into_iter()
        .enumerate()
        .map(|(i, stub)| {
            let title = require_text(stub.title, &format!("entry {i}: title"), kind)?;
            let description =
                require_text(stub.description, &format!("entry {i}: description"), kind)?;
            let order = stub.topic_order.ok_or_else(|| PipelineError::Validation {
                kind,
                message: format!("entry {i}: topicOrder is required"),
            })?;
            let topic_order = order.as_i64().ok_or_else(|| PipelineError::Validation {
                kind,
                message: format!("entry {i}: topicOrder must be an integer, got {order}"),
            })?;
            Ok(RecommendationStub {
                title,
                description,
                topic_order,
            })
        })
        .collect()
}

fn require_text(
    value: Option<String>,
    field: &str,
    kind: PayloadKind,
) -> Result<String, PipelineError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(PipelineError::Validation {
            kind,
            message: format!("{field} must be a non-empty string"),
        }),
    }
}
