//! PresentationEngine — the plan-then-stream generation pipeline.
//!
//! One job: topic in, themed multi-slide presentation out, streamed into
//! shared state as it forms. The pipeline is sequential over slide content
//! (outline order is the published order) and detached over visuals: each
//! slide's image generation is spawned fire-and-forget and patches its
//! result back into state by slide id whenever it resolves. Per-slide
//! content failures degrade to a skip; only a plan failure or an
//! unclassified error ends the job early.

pub mod markup;
pub mod progress;
pub mod provider;
pub mod retry;
pub mod state;
pub mod types;

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::config::EngineSettings;
use crate::error::EngineError;

use self::provider::{SlideWriter, VisualArtist};
use self::retry::{RetryPolicy, MAX_SLIDE_ATTEMPTS};
use self::state::SessionState;
use self::types::{AspectRatio, ImageResolution, JobMetadata, Role, SlideData};

/// Terminal apology sent exactly once when a job fails.
const JOB_FAILURE_MESSAGE: &str =
    "Sorry, I encountered an error while creating the presentation. Please try again.";
/// Reply used when the chat collaborator is unreachable.
const CHAT_FAILURE_MESSAGE: &str = "I'm having trouble connecting right now.";

/// The pipeline orchestrator. Owns the collaborators, the settings, and the
/// shared session state; tracks detached visual tasks.
pub struct PresentationEngine {
    writer: Arc<dyn SlideWriter>,
    artist: Arc<dyn VisualArtist>,
    settings: Mutex<EngineSettings>,
    state: Arc<SessionState>,
    /// Handles of in-flight visual tasks. Never awaited by the slide loop;
    /// drained by `join_visual_tasks`.
    visual_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl PresentationEngine {
    pub fn new(
        writer: Arc<dyn SlideWriter>,
        artist: Arc<dyn VisualArtist>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            writer,
            artist,
            settings: Mutex::new(settings),
            state: Arc::new(SessionState::new()),
            visual_tasks: Mutex::new(Vec::new()),
        }
    }

    /// Engine wired to the Gemini collaborator for both roles.
    pub fn gemini(settings: EngineSettings) -> Result<Self, EngineError> {
        let client = Arc::new(provider::gemini::GeminiClient::new(&settings)?);
        Ok(Self::new(client.clone(), client, settings))
    }

    /// The shared session state (watch subscriptions, snapshots).
    pub fn state(&self) -> Arc<SessionState> {
        self.state.clone()
    }

    /// Change the resolution tier for subsequent jobs. A running job keeps
    /// the tier it read at start.
    pub fn set_image_resolution(&self, resolution: ImageResolution) {
        self.settings.lock().expect("settings poisoned").image_resolution = resolution;
    }

    // =========================================================================
    // Job pipeline
    // =========================================================================

    /// Run one generation job. All output is streamed through the session
    /// state; this future resolves when the slide loop is done (visual
    /// tasks may still be in flight).
    pub async fn run_job(&self, topic: &str) {
        let (resolution, aspect_ratio) = {
            let settings = self.settings.lock().expect("settings poisoned");
            (settings.image_resolution, settings.aspect_ratio)
        };

        self.state.push_message(
            Role::User,
            format!("Create a presentation about {}", topic),
            false,
        );
        self.state.begin_job(topic);
        self.state.push_message(
            Role::Model,
            format!(
                "I'll create a unique presentation about \"{}\". \
                 My Creative Director is defining the visual strategy now.",
                topic
            ),
            true,
        );

        tracing::info!(topic = %topic, resolution = resolution.as_str(), "Job started");

        match self.run_pipeline(topic, resolution, aspect_ratio).await {
            Ok(visual_theme) => {
                self.state.finish();
                self.state.log("System: All tasks completed.");
                self.state.push_message(
                    Role::Model,
                    format!(
                        "Presentation ready! I've designed a custom visual theme: \"{}\". \
                         Review the slides below.",
                        visual_theme
                    ),
                    false,
                );
                tracing::info!(topic = %topic, "Job completed");
            }
            Err(e) => {
                tracing::error!(topic = %topic, error = %e, kind = e.kind(), "Job failed");
                self.state.log(format!("Error: Process failed - {}", e));
                self.state.push_message(Role::Model, JOB_FAILURE_MESSAGE, false);
                self.state.fail();
            }
        }
    }

    /// The fallible body of a job. Returns the plan's visual theme for the
    /// closing transcript message.
    async fn run_pipeline(
        &self,
        topic: &str,
        resolution: ImageResolution,
        aspect_ratio: AspectRatio,
    ) -> Result<String, EngineError> {
        // Stage 1: plan. No retry — failure aborts the job.
        self.state.advance_step(1);
        let plan = self.writer.generate_plan(topic).await?;

        // Publish the shell immediately: the job is observable before any
        // slide content exists.
        self.state.publish_shell(&plan.title, &plan.topic);
        self.state.log(format!(
            "System: Presentation shell created. Theme: \"{}\"",
            plan.visual_theme
        ));

        // Stage 2: stream slides in outline order.
        self.state.advance_step(2);
        let meta = JobMetadata::from_plan(&plan);
        let total = plan.slides.len();

        for (i, outline) in plan.slides.iter().enumerate() {
            self.state.log(format!(
                "Designer: Creating Slide {}/{}: \"{}\"...",
                i + 1,
                total,
                outline.title
            ));

            let attempt_result = RetryPolicy::default()
                .run(
                    || self.writer.generate_slide(outline, i, &meta),
                    |next_attempt| {
                        self.state.log(format!(
                            "Designer: Retrying slide {} (attempt {}/{})...",
                            i + 1,
                            next_attempt,
                            MAX_SLIDE_ATTEMPTS
                        ));
                    },
                )
                .await;

            let content = match attempt_result {
                Ok(content) => content,
                Err(e) => {
                    tracing::error!(slide = i + 1, error = %e, "Slide exhausted its retry budget");
                    self.state.log(format!(
                        "System: ⚠ Skipped slide {} after {} attempts",
                        i + 1,
                        MAX_SLIDE_ATTEMPTS
                    ));
                    continue;
                }
            };

            self.state
                .log(format!("Designer: ✓ Slide {} content generated", i + 1));

            let slide = SlideData::from_content(content, i, &plan.accent_color);
            let slide_id = slide.id.clone();
            let image_prompt = slide.image_prompt.clone();
            self.state.push_slide(slide);

            self.state
                .log(format!("Artist: Generating visual for Slide {}...", i + 1));
            self.spawn_visual_task(slide_id, image_prompt, i + 1, aspect_ratio, resolution);
        }

        Ok(plan.visual_theme)
    }

    /// Fire-and-forget visual generation for one slide. The task patches
    /// the slide by id when it resolves; the slide loop never waits on it.
    fn spawn_visual_task(
        &self,
        slide_id: String,
        prompt: String,
        position: usize,
        aspect_ratio: AspectRatio,
        resolution: ImageResolution,
    ) {
        let artist = self.artist.clone();
        let state = self.state.clone();

        let handle = tokio::spawn(async move {
            let image_url = artist
                .generate_image(&prompt, aspect_ratio, resolution)
                .await;
            if state.patch_slide_image(&slide_id, &image_url) {
                state.log(format!("Artist: ✓ Visual rendered for Slide {}", position));
            } else {
                // Slides are never removed in this pipeline, so this only
                // fires if the visual outlives its whole session.
                tracing::warn!(
                    slide_id = %slide_id,
                    "Visual resolved for a slide no longer present, dropping",
                );
            }
        });

        self.visual_tasks
            .lock()
            .expect("visual task list poisoned")
            .push(handle);
    }

    /// Wait for every spawned visual task to settle. A panicked task logs a
    /// warning and leaves its slide on the markup's substitution fallback.
    pub async fn join_visual_tasks(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut tasks = self.visual_tasks.lock().expect("visual task list poisoned");
            tasks.drain(..).collect()
        };
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Visual task did not complete");
                self.state
                    .log("Artist: ⚠ Visual failed - using placeholder".to_string());
            }
        }
    }

    // =========================================================================
    // Non-creation chat path
    // =========================================================================

    /// Answer an operator message outside the creation flow. The reply (or
    /// a fixed fallback on collaborator error) is appended to the
    /// transcript and returned.
    pub async fn chat(&self, message: &str) -> String {
        // History is captured before the new message is appended; the
        // collaborator receives the message separately.
        let history = self.state.transcript();
        self.state.push_message(Role::User, message, false);

        let snapshot = match self.state.presentation() {
            Some(p) => serde_json::to_string(&p).unwrap_or_else(|_| "null".into()),
            None => "null".into(),
        };

        match self.writer.chat(&history, message, &snapshot).await {
            Ok(reply) => {
                self.state.push_message(Role::Model, &reply, false);
                reply
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat collaborator failed");
                self.state.push_message(Role::Model, CHAT_FAILURE_MESSAGE, false);
                CHAT_FAILURE_MESSAGE.to_string()
            }
        }
    }
}
