pub mod gemini;

use async_trait::async_trait;

use crate::engine::types::{
    AspectRatio, ChatMessage, ImageResolution, JobMetadata, PresentationOutline, SlideContent,
    SlideOutline,
};
use crate::error::EngineError;

// =============================================================================
// Collaborator contracts
// =============================================================================

/// Text-generation collaborator: plans the deck, writes individual slides,
/// and answers follow-up chat.
///
/// `generate_slide` is idempotent and side-effect-free from the caller's
/// perspective, so the orchestrator may retry it freely.
#[async_trait]
pub trait SlideWriter: Send + Sync {
    /// One call per job: produce the structured outline for a topic.
    /// No retry — failure here aborts the job.
    async fn generate_plan(&self, topic: &str) -> Result<PresentationOutline, EngineError>;

    /// One call per outline entry: produce structured slide content whose
    /// markup references images only through the reserved placeholder token.
    async fn generate_slide(
        &self,
        outline: &SlideOutline,
        index: usize,
        meta: &JobMetadata,
    ) -> Result<SlideContent, EngineError>;

    /// Non-creation chat path: answer the operator with the current
    /// presentation snapshot as context.
    async fn chat(
        &self,
        history: &[ChatMessage],
        message: &str,
        presentation_json: &str,
    ) -> Result<String, EngineError>;
}

/// Image-generation collaborator.
///
/// Never errors to the caller: internal failure degrades to a placeholder
/// reference, so the orchestrator's detached callback always has a value to
/// apply. Callers must not infer failure from the result and retry.
#[async_trait]
pub trait VisualArtist: Send + Sync {
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        resolution: ImageResolution,
    ) -> String;
}
