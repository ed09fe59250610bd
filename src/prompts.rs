//! Instruction templates for the two generation calls.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the embedded JSON schema is the de facto
//!    interchange contract with the generation collaborator; changing a field
//!    name means editing exactly one place (and `src/output.rs` to match).
//!
//! 2. **Testability** — unit tests can inspect the built prompts directly
//!    without spinning up a real model, making template regressions easy to
//!    catch.
//!
//! Callers can override both templates via
//! [`crate::config::PipelineConfigBuilder::guide_template`] and
//! [`crate::config::PipelineConfigBuilder::video_template`]; the constants
//! here are used when no override is provided. Overrides must keep the
//! placeholder tokens — the config builder enforces this.

/// Placeholder in [`STUDY_GUIDE_TEMPLATE`] replaced by the extracted text.
pub const SYLLABUS_PLACEHOLDER: &str = "{SYLLABUS_TEXT}";

/// Placeholder in [`VIDEO_LIST_TEMPLATE`] replaced by the numbered topic list.
pub const TOPIC_LIST_PLACEHOLDER: &str = "{TOPIC_LIST}";

/// Placeholder in [`VIDEO_LIST_TEMPLATE`] replaced by the recommendation cap.
pub const MAX_VIDEOS_PLACEHOLDER: &str = "{MAX_VIDEOS}";

/// Default instruction template for study-guide generation.
///
/// The response must contain a JSON object matching the schema shown in the
/// template; the pipeline isolates it with a balanced-span scan, so
/// surrounding prose is tolerated.
pub const STUDY_GUIDE_TEMPLATE: &str = r#"Here is a syllabus text:

{SYLLABUS_TEXT}

Based on this syllabus, create a comprehensive study guide that:
1. Identifies the distinct modules, weeks, or logical sections presented in the syllabus.
2. For EACH distinct module/week/section identified, creates a separate entry in the "sections" array below.
3. Within each section entry, outlines the key topics covered in that specific module/week/section in chronological order.
4. Provides explanations for each topic.
5. Includes learning objectives for each topic (if available in the syllabus or inferrable).

Return the result as a JSON object with the following format. Ensure EACH logical unit (module, week, etc.) from the syllabus gets its own object within the "sections" array:
{
  "title": "Study Guide for [Course Name Based on Syllabus]",
  "sections": [
    {
      "sectionTitle": "Section title",
      "topics": [
        {
          "name": "Topic name",
          "explanation": "Detailed explanation",
          "learningObjectives": ["objective 1", "objective 2"]
        }
      ]
    }
  ]
}"#;

/// Default instruction template for video-recommendation generation.
///
/// Asks for stubs only — the `videoUrl` field is explicitly excluded because
/// real URLs come from the enrichment lookup, never from the model.
pub const VIDEO_LIST_TEMPLATE: &str = r#"Based on the following list of course topics extracted from a study guide:

--- Topic List ---
{TOPIC_LIST}
--- End Topic List ---

Generate a list of relevant YouTube video titles and descriptions that would help someone learn these specific topics.
Distribute approximately {MAX_VIDEOS} video recommendations across these topics, focusing on the most helpful resources.
Maintain the original chronological order of the topics provided.

Return the results as a JSON array with the following format (Do NOT include the videoUrl field):
[
  {
    "title": "Video title (related to one of the topics above)",
    "description": "Short description explaining how this video relates to the specific topic",
    "topicOrder": 1 // Sequential order reflecting the provided topic list
  }
]"#;

/// Build the study-guide prompt for one extracted syllabus text.
pub fn build_guide_prompt(template: &str, syllabus_text: &str) -> String {
    template.replace(SYLLABUS_PLACEHOLDER, syllabus_text)
}

/// Build the video-recommendation prompt from a pre-rendered topic list.
pub fn build_video_prompt(template: &str, topic_list: &str, max_videos: usize) -> String {
    template
        .replace(TOPIC_LIST_PLACEHOLDER, topic_list)
        .replace(MAX_VIDEOS_PLACEHOLDER, &max_videos.to_string())
}

/// Render topic names as the numbered list the video template embeds.
///
/// One topic per line, 1-based: `1. Topic name`. The numbering is what
/// recommendation stubs echo back through their `topicOrder` field.
pub fn format_topic_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| format!("{}. {}", i + 1, name))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_carry_their_placeholders() {
        assert!(STUDY_GUIDE_TEMPLATE.contains(SYLLABUS_PLACEHOLDER));
        assert!(VIDEO_LIST_TEMPLATE.contains(TOPIC_LIST_PLACEHOLDER));
        assert!(VIDEO_LIST_TEMPLATE.contains(MAX_VIDEOS_PLACEHOLDER));
    }

    #[test]
    fn guide_prompt_embeds_syllabus_text() {
        let prompt = build_guide_prompt(STUDY_GUIDE_TEMPLATE, "Week 1: Intro to Rust");
        assert!(prompt.contains("Week 1: Intro to Rust"));
        assert!(!prompt.contains(SYLLABUS_PLACEHOLDER));
        // The schema example must survive substitution untouched.
        assert!(prompt.contains("\"sectionTitle\""));
    }

    #[test]
    fn topic_list_is_numbered_from_one() {
        let list = format_topic_list(["Ownership", "Borrowing", "Lifetimes"]);
        assert_eq!(list, "1. Ownership\n2. Borrowing\n3. Lifetimes");
    }

    #[test]
    fn video_prompt_embeds_topics_and_cap() {
        let list = format_topic_list(["Ownership", "Borrowing"]);
        let prompt = build_video_prompt(VIDEO_LIST_TEMPLATE, &list, 20);
        assert!(prompt.contains("1. Ownership"));
        assert!(prompt.contains("approximately 20 video recommendations"));
        assert!(!prompt.contains(MAX_VIDEOS_PLACEHOLDER));
        assert!(prompt.contains("Do NOT include the videoUrl field"));
    }

    #[test]
    fn empty_topic_list_renders_empty() {
        assert_eq!(format_topic_list(std::iter::empty::<&str>()), "");
    }
}
