//! Shared session state with single-writer discipline.
//!
//! `SessionState` owns the presentation, the progress view, and the chat
//! transcript for one operator session. The sequential pipeline appends
//! slides; detached visual tasks patch slides by id. Both paths go through
//! the methods here, which serialize every read-modify-write under one lock
//! so no mutation can interleave with another and lose an update.
//!
//! Observers never reach into the state: each mutation publishes a fresh
//! snapshot through `tokio::sync::watch` channels, and a renderer draws the
//! latest value it receives.

use std::sync::Mutex;

use tokio::sync::watch;

use super::markup;
use super::progress::ProgressState;
use super::types::{ChatMessage, Presentation, Role, SlideData};

struct Inner {
    presentation: Option<Presentation>,
    progress: Option<ProgressState>,
    transcript: Vec<ChatMessage>,
}

/// Shared state container for one operator session.
pub struct SessionState {
    inner: Mutex<Inner>,
    presentation_tx: watch::Sender<Option<Presentation>>,
    progress_tx: watch::Sender<Option<ProgressState>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        let (presentation_tx, _) = watch::channel(None);
        let (progress_tx, _) = watch::channel(None);
        Self {
            inner: Mutex::new(Inner {
                presentation: None,
                progress: None,
                transcript: Vec::new(),
            }),
            presentation_tx,
            progress_tx,
        }
    }

    // =========================================================================
    // Observer boundary
    // =========================================================================

    /// Subscribe to presentation snapshots. The receiver always holds the
    /// latest published value.
    pub fn watch_presentation(&self) -> watch::Receiver<Option<Presentation>> {
        self.presentation_tx.subscribe()
    }

    /// Subscribe to progress snapshots.
    pub fn watch_progress(&self) -> watch::Receiver<Option<ProgressState>> {
        self.progress_tx.subscribe()
    }

    /// Current presentation snapshot, if a shell has been published.
    pub fn presentation(&self) -> Option<Presentation> {
        self.inner.lock().expect("session state poisoned").presentation.clone()
    }

    /// Current progress snapshot, if a job has started.
    pub fn progress(&self) -> Option<ProgressState> {
        self.inner.lock().expect("session state poisoned").progress.clone()
    }

    /// Transcript snapshot, oldest first.
    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.inner.lock().expect("session state poisoned").transcript.clone()
    }

    // =========================================================================
    // Progress mutations
    // =========================================================================

    /// Reset progress for a new job and clear any previous presentation.
    /// The presentation stays unset until the plan stage publishes a shell.
    pub fn begin_job(&self, topic: &str) {
        let mut inner = self.inner.lock().expect("session state poisoned");
        inner.progress = Some(ProgressState::new_job(topic));
        inner.presentation = None;
        self.progress_tx.send_replace(inner.progress.clone());
        self.presentation_tx.send_replace(None);
    }

    /// Advance the checklist; publishes the updated progress snapshot.
    pub fn advance_step(&self, n: usize) {
        self.mutate_progress(|p| p.advance_to_step(n));
    }

    /// Append a progress log line; publishes the updated snapshot.
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        self.mutate_progress(|p| p.append_log(message));
    }

    /// Terminal success: all steps completed, status Completed.
    pub fn finish(&self) {
        self.mutate_progress(|p| p.finish());
    }

    /// Terminal failure: status Error, checklist frozen.
    pub fn fail(&self) {
        self.mutate_progress(|p| p.fail());
    }

    fn mutate_progress(&self, f: impl FnOnce(&mut ProgressState)) {
        let mut inner = self.inner.lock().expect("session state poisoned");
        if let Some(progress) = inner.progress.as_mut() {
            f(progress);
            self.progress_tx.send_replace(inner.progress.clone());
        }
    }

    // =========================================================================
    // Presentation mutations
    // =========================================================================

    /// Publish the presentation shell: title and topic, zero slides. Makes
    /// the job observable before any slide content exists.
    pub fn publish_shell(&self, title: &str, topic: &str) {
        let mut inner = self.inner.lock().expect("session state poisoned");
        inner.presentation = Some(Presentation {
            title: title.to_string(),
            topic: topic.to_string(),
            slides: Vec::new(),
        });
        self.presentation_tx.send_replace(inner.presentation.clone());
    }

    /// Append a completed slide. Slides are only ever pushed to the end, in
    /// outline order; they are never reordered or removed.
    pub fn push_slide(&self, slide: SlideData) {
        let mut inner = self.inner.lock().expect("session state poisoned");
        if let Some(presentation) = inner.presentation.as_mut() {
            presentation.slides.push(slide);
            self.presentation_tx.send_replace(inner.presentation.clone());
        } else {
            tracing::warn!(slide_id = %slide.id, "Dropping slide: no presentation shell published");
        }
    }

    /// Patch a slide's resolved image by id: substitute every placeholder
    /// token in its markup and set the image field. Returns `false` (no-op)
    /// if no slide with that id is present.
    pub fn patch_slide_image(&self, slide_id: &str, image_url: &str) -> bool {
        let mut inner = self.inner.lock().expect("session state poisoned");
        let Some(presentation) = inner.presentation.as_mut() else {
            return false;
        };
        let Some(slide) = presentation.slides.iter_mut().find(|s| s.id == slide_id) else {
            return false;
        };
        slide.html_content = markup::apply_image(&slide.html_content, image_url);
        slide.image_url = Some(image_url.to_string());
        self.presentation_tx.send_replace(inner.presentation.clone());
        true
    }

    // =========================================================================
    // Transcript mutations
    // =========================================================================

    /// Append a transcript entry and return it.
    pub fn push_message(
        &self,
        role: Role,
        text: impl Into<String>,
        is_agent_status: bool,
    ) -> ChatMessage {
        let message = ChatMessage::new(role, text, is_agent_status);
        let mut inner = self.inner.lock().expect("session state poisoned");
        inner.transcript.push(message.clone());
        message
    }
}
