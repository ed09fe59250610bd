//! CLI binary for doc2study.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PipelineConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use doc2study::providers::{GeminiGenerator, PlainTextExtractor, YouTubeSearchClient};
use doc2study::{
    Document, ObserverHandle, PipelineConfig, PipelineError, PipelineStage, StageObserver,
    StudyMaterials, StudyPipeline, TOTAL_DISPLAY_STAGES,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI stage observer using indicatif ───────────────────────────────────────

/// Terminal observer: renders a live stage bar plus per-lookup log lines
/// using [indicatif]. Lookup lines may arrive out of original order
/// (enrichment is concurrent).
struct CliStageObserver {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
}

impl CliStageObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(TOTAL_DISPLAY_STAGES as u64);

        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:30.green/238}] {pos}/{len}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Processing");
        bar.set_message("Starting…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl StageObserver for CliStageObserver {
    fn on_stage(&self, stage: PipelineStage, _error: Option<&PipelineError>) {
        match stage {
            PipelineStage::Done => {
                self.bar.finish_and_clear();
                eprintln!("{} {}", green("✔"), bold("Processing complete!"));
            }
            PipelineStage::Failed => {
                // main reports the error; just get the bar out of the way.
                self.bar.finish_and_clear();
            }
            _ => {
                if let Some(progress) = stage.progress() {
                    self.bar.set_position(progress.step.saturating_sub(1) as u64);
                    self.bar.set_message(progress.label);
                    self.bar.println(format!(
                        "{} {}",
                        cyan("◆"),
                        bold(&format!(
                            "[{}/{}] {}",
                            progress.step, progress.total_steps, progress.label
                        ))
                    ));
                }
            }
        }
    }

    fn on_lookup_complete(&self, index: usize, total: usize, found: bool) {
        let (mark, note) = if found {
            (green("✓"), dim("resolved"))
        } else {
            (dim("·"), dim("no link found"))
        };
        self.bar.println(format!(
            "  {} Video {:>2}/{:<2}  {}",
            mark,
            index + 1,
            total,
            note
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic run (rendered study guide to stdout)
  doc2study syllabus.txt

  # Write the rendered study guide to a file
  doc2study syllabus.txt -o guide.md

  # Full structured output as JSON
  doc2study --json syllabus.txt > materials.json

  # Ask for more recommendations and enforce the cap strictly
  doc2study --max-videos 30 --enforce-video-cap syllabus.txt

  # Use a different Gemini model
  doc2study --model gemini-1.5-pro-latest syllabus.txt

  # Custom study-guide instructions from a file
  doc2study --guide-prompt prompts/guide.txt syllabus.txt

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY     Google Gemini API key (required)
  YOUTUBE_API_KEY    YouTube Data API v3 key; without it recommendations
                     are still generated but their URLs stay blank

SETUP:
  1. Set API keys:    export GEMINI_API_KEY=...  YOUTUBE_API_KEY=...
  2. Run:             doc2study syllabus.txt -o guide.md

  Press Ctrl-C during a run to cancel; the pipeline stops at the next
  await point and reports the stage it was cancelled in.
"#;

/// Turn a course document into a study guide with video recommendations.
#[derive(Parser, Debug)]
#[command(
    name = "doc2study",
    version,
    about = "Turn a course document into a study guide with video recommendations",
    long_about = "Generate a structured study guide (sections, topics, learning objectives) \
plus topic-ordered YouTube recommendations from a syllabus or course outline, using \
Google Gemini for generation and the YouTube Data API for link resolution.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the course document (plain text or markdown).
    input: PathBuf,

    /// Write the rendered study guide to this file instead of stdout.
    #[arg(short, long, env = "DOC2STUDY_OUTPUT")]
    output: Option<PathBuf>,

    /// Gemini model ID.
    #[arg(
        long,
        env = "DOC2STUDY_MODEL",
        long_help = "Gemini model to use. Default: gemini-1.5-flash-latest (fast, cheap).\n\
          Any text-capable Gemini model works, e.g. gemini-1.5-pro-latest."
    )]
    model: Option<String>,

    /// Google Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: String,

    /// YouTube Data API v3 key (optional).
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    youtube_api_key: Option<String>,

    /// Approximate number of video recommendations to request.
    #[arg(long, env = "DOC2STUDY_MAX_VIDEOS", default_value_t = 20,
          value_parser = clap::value_parser!(u64).range(1..))]
    max_videos: u64,

    /// Hard-truncate the recommendation list to --max-videos.
    #[arg(long, env = "DOC2STUDY_ENFORCE_CAP")]
    enforce_video_cap: bool,

    /// Path to a text file with a custom study-guide template.
    #[arg(long, env = "DOC2STUDY_GUIDE_PROMPT")]
    guide_prompt: Option<PathBuf>,

    /// Path to a text file with a custom video-recommendation template.
    #[arg(long, env = "DOC2STUDY_VIDEO_PROMPT")]
    video_prompt: Option<PathBuf>,

    /// Output structured JSON (StudyMaterials) instead of rendered Markdown.
    #[arg(long, env = "DOC2STUDY_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "DOC2STUDY_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2STUDY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "DOC2STUDY_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config and collaborators ───────────────────────────────────
    let observer: Option<ObserverHandle> = if show_progress {
        Some(CliStageObserver::new() as Arc<dyn StageObserver>)
    } else {
        None
    };
    let config = build_config(&cli, observer).await?;

    let generator = match cli.model.as_deref() {
        Some(model) => GeminiGenerator::with_model(&cli.gemini_api_key, model),
        None => GeminiGenerator::new(&cli.gemini_api_key),
    };
    if cli.youtube_api_key.is_none() && !cli.quiet {
        eprintln!(
            "{}",
            dim("No YOUTUBE_API_KEY set; video URLs will be left blank.")
        );
    }

    let pipeline = Arc::new(StudyPipeline::new(
        Arc::new(PlainTextExtractor),
        Arc::new(generator),
        Arc::new(YouTubeSearchClient::new(cli.youtube_api_key.clone())),
        config,
    ));

    // ── Ctrl-C cancels the active run ────────────────────────────────────
    let canceller = Arc::clone(&pipeline);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling…");
            canceller.cancel();
        }
    });

    // ── Run the pipeline ─────────────────────────────────────────────────
    let doc = Document::from_path(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    let outcome = pipeline.run(&doc).await.context("Processing failed")?;
    let Some(materials) = outcome.into_materials() else {
        return Ok(());
    };

    // ── Print results ────────────────────────────────────────────────────
    if cli.json {
        let json =
            serde_json::to_string_pretty(&materials).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let rendered = render_markdown(&materials);
        if let Some(ref output_path) = cli.output {
            tokio::fs::write(output_path, &rendered)
                .await
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            if !cli.quiet {
                eprintln!(
                    "{}  {}",
                    green("✔"),
                    bold(&output_path.display().to_string())
                );
            }
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }

    if !cli.quiet && !cli.json {
        let stats = &materials.stats;
        eprintln!(
            "   {} sections / {} topics / {} videos ({} resolved)  {}",
            dim(&stats.section_count.to_string()),
            dim(&stats.topic_count.to_string()),
            dim(&stats.video_count.to_string()),
            dim(&stats.resolved_video_count.to_string()),
            dim(&format!("{}ms total", stats.total_duration_ms)),
        );
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
async fn build_config(cli: &Cli, observer: Option<ObserverHandle>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .max_videos(cli.max_videos as usize)
        .enforce_video_cap(cli.enforce_video_cap);

    if let Some(ref path) = cli.guide_prompt {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read guide template from {:?}", path))?;
        builder = builder.guide_template(template);
    }
    if let Some(ref path) = cli.video_prompt {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read video template from {:?}", path))?;
        builder = builder.video_template(template);
    }
    if let Some(observer) = observer {
        builder = builder.observer(observer);
    }

    builder.build().context("Invalid configuration")
}

/// Render the study materials as a Markdown document.
fn render_markdown(materials: &StudyMaterials) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", materials.guide.title);

    for section in &materials.guide.sections {
        let _ = writeln!(out, "## {}\n", section.section_title);
        for topic in &section.topics {
            let _ = writeln!(out, "### {}\n", topic.name);
            let _ = writeln!(out, "{}\n", topic.explanation);
            if !topic.learning_objectives.is_empty() {
                let _ = writeln!(out, "**Learning objectives:**\n");
                for objective in &topic.learning_objectives {
                    let _ = writeln!(out, "- {objective}");
                }
                let _ = writeln!(out);
            }
        }
    }

    if !materials.videos.is_empty() {
        let _ = writeln!(out, "## Recommended Videos\n");
        for video in &materials.videos {
            if video.video_url.is_empty() {
                let _ = writeln!(out, "- {}: {}", video.title, video.description);
            } else {
                let _ = writeln!(
                    out,
                    "- [{}]({}): {}",
                    video.title, video.video_url, video.description
                );
            }
        }
    }

    out
}
