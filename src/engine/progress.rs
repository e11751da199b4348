//! Progress tracking — the operator-visible view of pipeline status.
//!
//! A job carries one `ProgressState`: a coarse status, a fixed 5-step
//! checklist, and an append-only log. Mutation rules:
//! - at most one step is `current` at any time
//! - a step once `completed` never reverts
//! - every step before the current one is completed
//! - logs are append-only, never reordered

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Status
// =============================================================================

/// Coarse pipeline stage, derived from the current checklist step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Planning,
    GeneratingContent,
    GeneratingImages,
    Completed,
    Error,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Planning => "planning",
            AgentStatus::GeneratingContent => "generating_content",
            AgentStatus::GeneratingImages => "generating_images",
            AgentStatus::Completed => "completed",
            AgentStatus::Error => "error",
        }
    }

    /// Terminal statuses end the job; nothing advances past them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentStatus::Completed | AgentStatus::Error)
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Checklist
// =============================================================================

/// One checklist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub label: String,
    pub completed: bool,
    pub current: bool,
}

/// Fixed step labels for a generation job, in order.
pub const STEP_LABELS: [&str; 5] = [
    "Initializing project",
    "Director: Visual Strategy & Brief",
    "Designer: Streaming Slides",
    "Artist: Rendering Visuals",
    "Finalizing presentation",
];

// =============================================================================
// ProgressState
// =============================================================================

/// Mutable progress view for one job. Owned by the orchestrator; observers
/// only ever see published snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressState {
    pub status: AgentStatus,
    pub steps: Vec<Step>,
    pub logs: Vec<String>,
}

impl ProgressState {
    /// Fresh state for a new job: all steps incomplete, the first current,
    /// status Planning, one opening log line.
    pub fn new_job(topic: &str) -> Self {
        let steps = STEP_LABELS
            .iter()
            .enumerate()
            .map(|(i, label)| Step {
                label: (*label).to_string(),
                completed: false,
                current: i == 0,
            })
            .collect();
        Self {
            status: AgentStatus::Planning,
            steps,
            logs: vec![format!("System: Starting new project \"{}\"...", topic)],
        }
    }

    /// Advance the checklist to step `n`: every step before `n` becomes
    /// completed and not current; step `n`, if it exists, becomes current.
    /// Idempotent — advancing to the same step twice changes nothing.
    pub fn advance_to_step(&mut self, n: usize) {
        for step in self.steps.iter_mut().take(n) {
            step.completed = true;
            step.current = false;
        }
        for (i, step) in self.steps.iter_mut().enumerate().skip(n) {
            step.current = i == n;
        }
        self.status = match n {
            0 => self.status,
            1 => AgentStatus::Planning,
            2 => AgentStatus::GeneratingContent,
            3 => AgentStatus::GeneratingImages,
            _ => AgentStatus::Completed,
        };
        tracing::debug!(step = n, status = %self.status, "Progress: advanced checklist");
    }

    /// Append a human-readable event. Entries are never removed or reordered.
    pub fn append_log(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(log = %message, "Progress: event");
        self.logs.push(message);
    }

    /// Terminal success: every step completed, none current.
    pub fn finish(&mut self) {
        for step in &mut self.steps {
            step.completed = true;
            step.current = false;
        }
        self.status = AgentStatus::Completed;
    }

    /// Terminal failure. Completed steps keep their state; the checklist
    /// freezes where it was.
    pub fn fail(&mut self) {
        self.status = AgentStatus::Error;
    }

    /// Index of the current step, if any.
    pub fn current_step(&self) -> Option<usize> {
        self.steps.iter().position(|s| s.current)
    }
}
