//! End-to-end pipeline tests against scripted collaborators.
//!
//! The clock is paused (`start_paused`), so retry delays and attempt
//! timeouts elapse instantly while still exercising the real policy.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use deckgen::engine::markup::{has_placeholder, FALLBACK_IMAGE_URL, SLIDE_IMAGE_TOKEN};
use deckgen::engine::provider::{SlideWriter, VisualArtist};
use deckgen::engine::state::SessionState;
use deckgen::{
    AgentStatus, AspectRatio, ChatMessage, EngineError, EngineSettings, ImageResolution,
    PresentationEngine, PresentationOutline, SlideContent, SlideOutline,
};

// =============================================================================
// Scripted collaborators
// =============================================================================

fn make_plan(slide_count: usize, accent: &str) -> PresentationOutline {
    PresentationOutline {
        topic: "Impact of AI on Healthcare".into(),
        title: "AI in the Clinic".into(),
        subtitle: "From triage to treatment".into(),
        target_audience: "Hospital executives".into(),
        presentation_goal: "Inform".into(),
        tone: "Confident".into(),
        visual_theme: "Swiss Minimalist".into(),
        accent_color: accent.into(),
        research_context: "scripted".into(),
        slides: (0..slide_count)
            .map(|i| SlideOutline {
                title: format!("Section {}", i + 1),
                purpose: format!("Purpose {}", i + 1),
                visual_advice: "Split screen".into(),
            })
            .collect(),
    }
}

#[derive(Default)]
struct ScriptedWriter {
    plan: Option<PresentationOutline>,
    /// Outline indices whose content generation always errors.
    fail_always: HashSet<usize>,
    /// Outline index -> number of leading attempts that error.
    fail_first: HashMap<usize, u32>,
    /// Outline index -> number of leading attempts that hang past the
    /// attempt timeout.
    hang_first: HashMap<usize, u32>,
    calls: Mutex<HashMap<usize, u32>>,
    /// Slide counts observed in shared state at each content call, used to
    /// assert the shell is published before any content work.
    observed_counts: Mutex<Vec<Option<usize>>>,
    session: Mutex<Option<Arc<SessionState>>>,
}

impl ScriptedWriter {
    fn with_plan(plan: PresentationOutline) -> Self {
        Self {
            plan: Some(plan),
            ..Default::default()
        }
    }

    fn attach(&self, session: Arc<SessionState>) {
        *self.session.lock().unwrap() = Some(session);
    }

    fn calls_for(&self, index: usize) -> u32 {
        self.calls.lock().unwrap().get(&index).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl SlideWriter for ScriptedWriter {
    async fn generate_plan(&self, _topic: &str) -> Result<PresentationOutline, EngineError> {
        self.plan
            .clone()
            .ok_or_else(|| EngineError::Plan("scripted planner outage".into()))
    }

    async fn generate_slide(
        &self,
        outline: &SlideOutline,
        index: usize,
        _meta: &deckgen::engine::types::JobMetadata,
    ) -> Result<SlideContent, EngineError> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            let n = calls.entry(index).or_insert(0);
            *n += 1;
            *n
        };

        if let Some(session) = self.session.lock().unwrap().clone() {
            self.observed_counts
                .lock()
                .unwrap()
                .push(session.presentation().map(|p| p.slides.len()));
        }

        if self.hang_first.get(&index).is_some_and(|&n| attempt <= n) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_always.contains(&index)
            || self.fail_first.get(&index).is_some_and(|&n| attempt <= n)
        {
            return Err(EngineError::SlideGeneration(format!(
                "scripted failure for slide {}",
                index
            )));
        }

        Ok(SlideContent {
            title: outline.title.clone(),
            subtitle: None,
            content: vec![format!("Point for {}", outline.title)],
            stats: None,
            timeline: None,
            design_directive: "bold typography".into(),
            html_content: format!(
                "<div class=\"w-[1280px] h-[720px]\"><img src=\"{}\"></div>",
                SLIDE_IMAGE_TOKEN
            ),
            image_prompt: format!("prompt-{}", index),
            notes: None,
        })
    }

    async fn chat(
        &self,
        _history: &[ChatMessage],
        message: &str,
        _presentation_json: &str,
    ) -> Result<String, EngineError> {
        Ok(format!("scripted reply to: {}", message))
    }
}

struct ScriptedArtist {
    delay: Option<Duration>,
    degraded: bool,
}

impl ScriptedArtist {
    fn instant() -> Self {
        Self {
            delay: None,
            degraded: false,
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            degraded: false,
        }
    }
}

#[async_trait]
impl VisualArtist for ScriptedArtist {
    async fn generate_image(
        &self,
        prompt: &str,
        _aspect_ratio: AspectRatio,
        _resolution: ImageResolution,
    ) -> String {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.degraded {
            FALLBACK_IMAGE_URL.to_string()
        } else {
            format!("https://img.test/{}.png", prompt)
        }
    }
}

fn engine_with(writer: Arc<ScriptedWriter>, artist: ScriptedArtist) -> PresentationEngine {
    let engine = PresentationEngine::new(writer.clone(), Arc::new(artist), EngineSettings::default());
    writer.attach(engine.state());
    engine
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test(start_paused = true)]
async fn full_success_streams_six_slides_in_order() {
    let writer = Arc::new(ScriptedWriter::with_plan(make_plan(6, "#2563eb")));
    let engine = engine_with(writer.clone(), ScriptedArtist::instant());

    engine.run_job("Impact of AI on Healthcare").await;
    engine.join_visual_tasks().await;

    // Shell existed with zero slides before the first content call.
    let observed = writer.observed_counts.lock().unwrap().clone();
    assert_eq!(observed.first(), Some(&Some(0)));

    let state = engine.state();
    let presentation = state.presentation().expect("presentation published");
    assert_eq!(presentation.title, "AI in the Clinic");
    assert_eq!(presentation.slides.len(), 6);
    for (i, slide) in presentation.slides.iter().enumerate() {
        assert!(slide.id.starts_with(&format!("slide-{}-", i)));
        assert_eq!(slide.accent_color, "#2563eb");
        assert_eq!(
            slide.image_url.as_deref(),
            Some(format!("https://img.test/prompt-{}.png", i).as_str())
        );
        assert!(!has_placeholder(&slide.html_content));
    }

    let progress = state.progress().unwrap();
    assert_eq!(progress.status, AgentStatus::Completed);
    assert!(progress.steps.iter().all(|s| s.completed));
    assert_eq!(progress.current_step(), None);
}

#[tokio::test(start_paused = true)]
async fn exhausted_slide_is_skipped_without_renumbering() {
    let mut writer = ScriptedWriter::with_plan(make_plan(4, "#2563eb"));
    writer.fail_always.insert(2);
    let writer = Arc::new(writer);
    let engine = engine_with(writer.clone(), ScriptedArtist::instant());

    engine.run_job("Impact of AI on Healthcare").await;
    engine.join_visual_tasks().await;

    let state = engine.state();
    let presentation = state.presentation().unwrap();
    assert_eq!(presentation.slides.len(), 3);
    // Survivors keep their outline indices: 0, 1, 3.
    assert!(presentation.slides[0].id.starts_with("slide-0-"));
    assert!(presentation.slides[1].id.starts_with("slide-1-"));
    assert!(presentation.slides[2].id.starts_with("slide-3-"));

    // Exactly 3 attempts for the failing entry, never a 4th.
    assert_eq!(writer.calls_for(2), 3);

    let progress = state.progress().unwrap();
    assert_eq!(progress.status, AgentStatus::Completed);
    let skips: Vec<&String> = progress
        .logs
        .iter()
        .filter(|l| l.contains("Skipped slide 3"))
        .collect();
    assert_eq!(skips.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn plan_failure_aborts_before_any_slide_work() {
    let writer = Arc::new(ScriptedWriter::default()); // no plan: planner errors
    let engine = engine_with(writer.clone(), ScriptedArtist::instant());

    engine.run_job("Impact of AI on Healthcare").await;

    let state = engine.state();
    assert!(state.presentation().is_none());
    assert_eq!(state.progress().unwrap().status, AgentStatus::Error);
    assert_eq!(writer.total_calls(), 0);

    let apologies = state
        .transcript()
        .iter()
        .filter(|m| m.text.contains("Sorry, I encountered an error"))
        .count();
    assert_eq!(apologies, 1);
}

#[tokio::test(start_paused = true)]
async fn late_visual_patches_by_id_without_reordering() {
    let writer = Arc::new(ScriptedWriter::with_plan(make_plan(2, "#2563eb")));
    // Visuals resolve long after all content generation is done.
    let engine = engine_with(writer.clone(), ScriptedArtist::slow(Duration::from_secs(60)));

    engine.run_job("Impact of AI on Healthcare").await;

    // The slide loop never waited on visuals: both slides are published,
    // neither has an image yet.
    let before = engine.state().presentation().unwrap();
    assert_eq!(before.slides.len(), 2);
    assert!(before.slides.iter().all(|s| s.image_url.is_none()));
    assert!(before.slides.iter().all(|s| has_placeholder(&s.html_content)));

    engine.join_visual_tasks().await;

    let after = engine.state().presentation().unwrap();
    assert!(after.slides[0].id.starts_with("slide-0-"));
    assert!(after.slides[1].id.starts_with("slide-1-"));
    assert_eq!(
        after.slides[0].image_url.as_deref(),
        Some("https://img.test/prompt-0.png")
    );
    assert_eq!(
        after.slides[1].image_url.as_deref(),
        Some("https://img.test/prompt-1.png")
    );
    assert!(after.slides.iter().all(|s| !has_placeholder(&s.html_content)));
}

// =============================================================================
// Policy properties
// =============================================================================

#[tokio::test(start_paused = true)]
async fn flaky_slide_recovers_within_budget_and_logs_retries() {
    let mut writer = ScriptedWriter::with_plan(make_plan(2, "#2563eb"));
    writer.fail_first.insert(1, 2); // two failures, success on the third
    let writer = Arc::new(writer);
    let engine = engine_with(writer.clone(), ScriptedArtist::instant());

    let start = tokio::time::Instant::now();
    engine.run_job("Impact of AI on Healthcare").await;
    engine.join_visual_tasks().await;

    assert_eq!(writer.calls_for(1), 3);
    assert_eq!(engine.state().presentation().unwrap().slides.len(), 2);
    // Two inter-attempt waits of 2s each for the flaky slide.
    assert!(start.elapsed() >= Duration::from_secs(4));

    let progress = engine.state().progress().unwrap();
    let retries: Vec<&String> = progress
        .logs
        .iter()
        .filter(|l| l.contains("Retrying slide 2"))
        .collect();
    assert_eq!(retries.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn hung_attempt_times_out_and_next_attempt_succeeds() {
    let mut writer = ScriptedWriter::with_plan(make_plan(1, "#2563eb"));
    writer.hang_first.insert(0, 1); // first attempt exceeds the 30s budget
    let writer = Arc::new(writer);
    let engine = engine_with(writer.clone(), ScriptedArtist::instant());

    engine.run_job("Impact of AI on Healthcare").await;
    engine.join_visual_tasks().await;

    assert_eq!(writer.calls_for(0), 2);
    assert_eq!(engine.state().presentation().unwrap().slides.len(), 1);
    assert_eq!(engine.state().progress().unwrap().status, AgentStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn every_attempt_hanging_skips_the_slide() {
    let mut writer = ScriptedWriter::with_plan(make_plan(1, "#2563eb"));
    writer.hang_first.insert(0, 3);
    let writer = Arc::new(writer);
    let engine = engine_with(writer.clone(), ScriptedArtist::instant());

    engine.run_job("Impact of AI on Healthcare").await;

    assert_eq!(writer.calls_for(0), 3);
    let state = engine.state();
    assert_eq!(state.presentation().unwrap().slides.len(), 0);
    assert_eq!(state.progress().unwrap().status, AgentStatus::Completed);
    assert!(state
        .progress()
        .unwrap()
        .logs
        .iter()
        .any(|l| l.contains("Skipped slide 1")));
}

// =============================================================================
// Chat path
// =============================================================================

#[tokio::test(start_paused = true)]
async fn chat_appends_both_sides_of_the_exchange() {
    let writer = Arc::new(ScriptedWriter::with_plan(make_plan(1, "#2563eb")));
    let engine = engine_with(writer.clone(), ScriptedArtist::instant());

    let reply = engine.chat("Make slide one shorter").await;
    assert_eq!(reply, "scripted reply to: Make slide one shorter");

    let transcript = engine.state().transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].text, "Make slide one shorter");
    assert_eq!(transcript[1].text, reply);
}
