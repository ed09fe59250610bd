//! Configuration types for the study-material pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`] and handed to
//! [`crate::controller::StudyPipeline::new`] together with the collaborator
//! clients. Everything is explicit at construction: no environment lookups,
//! no module-scope singletons.
//!
//! # Design choice: builder over constructor
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest, and gives validation a single
//! place to live.

use std::fmt;

use crate::error::PipelineError;
use crate::progress::ObserverHandle;
use crate::prompts;

/// Configuration for one study-material pipeline.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`]. Collaborator options (model names, API
/// keys, request timeouts) belong to the provider constructors in
/// [`crate::providers`], not here.
///
/// # Example
/// ```rust
/// use doc2study::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .max_videos(10)
///     .enforce_video_cap(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Recommendation cap requested from the generation collaborator. Default: 20.
    ///
    /// The video prompt asks for "approximately" this many recommendations
    /// distributed across the topics. Nothing forces the model to comply —
    /// see [`PipelineConfig::enforce_video_cap`] when the cap must be hard.
    pub max_videos: usize,

    /// Truncate the validated stub list to `max_videos` before enrichment. Default: false.
    ///
    /// Off by default: the model usually respects the prompt, and silently
    /// dropping valid recommendations is more surprising than an over-long
    /// list. Turn it on when downstream storage or display has a hard limit.
    pub enforce_video_cap: bool,

    /// Custom study-guide instruction template. If None, uses the built-in
    /// [`crate::prompts::STUDY_GUIDE_TEMPLATE`].
    ///
    /// Overrides must contain the `{SYLLABUS_TEXT}` placeholder; `build()`
    /// rejects templates that lost it.
    pub guide_template: Option<String>,

    /// Custom video-recommendation template. If None, uses the built-in
    /// [`crate::prompts::VIDEO_LIST_TEMPLATE`].
    ///
    /// Overrides must contain the `{TOPIC_LIST}` and `{MAX_VIDEOS}`
    /// placeholders; `build()` rejects templates that lost them.
    pub video_template: Option<String>,

    /// Observers notified of every stage transition. Default: empty.
    ///
    /// Seeding observers here guarantees they are registered before `run()`
    /// can emit anything. More can be added later via
    /// [`crate::controller::StudyPipeline::register_observer`].
    pub observers: Vec<ObserverHandle>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_videos: 20,
            enforce_video_cap: false,
            guide_template: None,
            video_template: None,
            observers: Vec::new(),
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("max_videos", &self.max_videos)
            .field("enforce_video_cap", &self.enforce_video_cap)
            .field("guide_template", &self.guide_template.as_ref().map(|_| "<custom>"))
            .field("video_template", &self.video_template.as_ref().map(|_| "<custom>"))
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// The guide template in effect (override or built-in).
    pub fn guide_template(&self) -> &str {
        self.guide_template
            .as_deref()
            .unwrap_or(prompts::STUDY_GUIDE_TEMPLATE)
    }

    /// The video template in effect (override or built-in).
    pub fn video_template(&self) -> &str {
        self.video_template
            .as_deref()
            .unwrap_or(prompts::VIDEO_LIST_TEMPLATE)
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn max_videos(mut self, n: usize) -> Self {
        self.config.max_videos = n.max(1);
        self
    }

    pub fn enforce_video_cap(mut self, v: bool) -> Self {
        self.config.enforce_video_cap = v;
        self
    }

    pub fn guide_template(mut self, template: impl Into<String>) -> Self {
        self.config.guide_template = Some(template.into());
        self
    }

    pub fn video_template(mut self, template: impl Into<String>) -> Self {
        self.config.video_template = Some(template.into());
        self
    }

    /// Register an observer; may be called multiple times.
    pub fn observer(mut self, observer: ObserverHandle) -> Self {
        self.config.observers.push(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        let c = &self.config;
        if c.max_videos == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_videos must be ≥ 1".into(),
            ));
        }
        if let Some(t) = &c.guide_template {
            if !t.contains(prompts::SYLLABUS_PLACEHOLDER) {
                return Err(PipelineError::InvalidConfig(format!(
                    "guide template must contain the {} placeholder",
                    prompts::SYLLABUS_PLACEHOLDER
                )));
            }
        }
        if let Some(t) = &c.video_template {
            for placeholder in [prompts::TOPIC_LIST_PLACEHOLDER, prompts::MAX_VIDEOS_PLACEHOLDER] {
                if !t.contains(placeholder) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "video template must contain the {placeholder} placeholder"
                    )));
                }
            }
        }
        Ok(self.config)
    }
}
