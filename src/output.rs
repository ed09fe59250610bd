//! Output types: the study-guide domain model and per-run statistics.
//!
//! The guide and recommendation types serialise with the exact camelCase
//! field names the generation prompts instruct the model to emit
//! (`sectionTitle`, `learningObjectives`, `topicOrder`, ...). The parsed
//! payload, the library API and any JSON re-export therefore share one shape.

use serde::{Deserialize, Serialize};

/// A single topic inside a study-guide section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyTopic {
    pub name: String,
    /// Concise explanation of the topic, aimed at a student.
    pub explanation: String,
    /// Actionable objectives; empty when the model omits them.
    #[serde(default)]
    pub learning_objectives: Vec<String>,
}

/// One section of the study guide, in course order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySection {
    pub section_title: String,
    pub topics: Vec<StudyTopic>,
}

/// The generated study guide.
///
/// Section order is semantically meaningful (chronological course order) and
/// is preserved end-to-end. A guide with zero sections is treated by the
/// controller as a generation failure, never as a valid empty result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyGuide {
    pub title: String,
    pub sections: Vec<StudySection>,
}

impl StudyGuide {
    /// All topics across all sections, flattened in display order.
    ///
    /// The flattened position (1-based) is what recommendation stubs refer to
    /// through their `topicOrder` field.
    pub fn flattened_topics(&self) -> impl Iterator<Item = &StudyTopic> {
        self.sections.iter().flat_map(|s| s.topics.iter())
    }

    /// Total topic count across all sections.
    pub fn topic_count(&self) -> usize {
        self.sections.iter().map(|s| s.topics.len()).sum()
    }
}

/// A video recommendation before URL enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationStub {
    /// Searchable video title; doubles as the enrichment lookup query.
    pub title: String,
    pub description: String,
    /// 1-based position in the flattened topic sequence. Display ordering
    /// only, never dereferenced as an index.
    pub topic_order: i64,
}

impl RecommendationStub {
    /// Attach a resolved URL, producing the enriched recommendation.
    pub fn with_url(self, video_url: impl Into<String>) -> VideoRecommendation {
        VideoRecommendation {
            title: self.title,
            description: self.description,
            topic_order: self.topic_order,
            video_url: video_url.into(),
        }
    }
}

/// A fully enriched video recommendation.
///
/// `video_url` may be empty, meaning "no video found" — a valid terminal
/// value, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecommendation {
    pub title: String,
    pub description: String,
    pub topic_order: i64,
    pub video_url: String,
}

/// Everything a successful run produces.
///
/// Handed to the caller exactly once, when the pipeline reaches `Done`; the
/// controller keeps no copy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyMaterials {
    pub guide: StudyGuide,
    /// Ordered by original stub index, independent of lookup completion order.
    pub videos: Vec<VideoRecommendation>,
    pub stats: RunStats,
}

/// Statistics about a completed run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    /// Characters of text the extraction collaborator produced.
    pub extracted_chars: usize,
    pub section_count: usize,
    pub topic_count: usize,
    /// Recommendations returned by generation (after any cap enforcement).
    pub video_count: usize,
    /// Recommendations whose lookup produced a non-empty URL.
    pub resolved_video_count: usize,
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_guide() -> StudyGuide {
        StudyGuide {
            title: "CS 101".into(),
            sections: vec![
                StudySection {
                    section_title: "Week 1".into(),
                    topics: vec![StudyTopic {
                        name: "Intro".into(),
                        explanation: "What programming is.".into(),
                        learning_objectives: vec!["Explain what a program is".into()],
                    }],
                },
                StudySection {
                    section_title: "Week 2".into(),
                    topics: vec![
                        StudyTopic {
                            name: "Arrays".into(),
                            explanation: "Contiguous storage.".into(),
                            learning_objectives: vec![],
                        },
                        StudyTopic {
                            name: "Loops".into(),
                            explanation: "Repetition.".into(),
                            learning_objectives: vec![],
                        },
                    ],
                },
            ],
        }
    }

    #[test]
    fn serialises_with_camel_case_wire_names() {
        let json = serde_json::to_string(&sample_guide()).unwrap();
        assert!(json.contains("\"sectionTitle\""), "got: {json}");
        assert!(json.contains("\"learningObjectives\""), "got: {json}");
        assert!(!json.contains("section_title"), "got: {json}");
    }

    #[test]
    fn missing_learning_objectives_defaults_to_empty() {
        let topic: StudyTopic =
            serde_json::from_str(r#"{"name":"Graphs","explanation":"Nodes and edges."}"#)
                .unwrap();
        assert!(topic.learning_objectives.is_empty());
    }

    #[test]
    fn flattened_topics_preserves_section_order() {
        let guide = sample_guide();
        let names: Vec<&str> = guide.flattened_topics().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Intro", "Arrays", "Loops"]);
        assert_eq!(guide.topic_count(), 3);
    }

    #[test]
    fn stub_keeps_order_through_enrichment() {
        let stub = RecommendationStub {
            title: "Arrays explained".into(),
            description: "Intro to arrays".into(),
            topic_order: 2,
        };
        let rec = stub.with_url("https://www.youtube.com/watch?v=abc");
        assert_eq!(rec.topic_order, 2);
        assert_eq!(rec.video_url, "https://www.youtube.com/watch?v=abc");

        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"topicOrder\":2"), "got: {json}");
        assert!(json.contains("\"videoUrl\""), "got: {json}");
    }
}
