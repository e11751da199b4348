//! deckgen — agentic presentation generation.
//!
//! Given a topic, the engine requests a structured plan from a text
//! collaborator, streams each slide's content into observable state under a
//! bounded timeout/retry policy, and fires detached image generation per
//! slide that patches itself back in when it resolves. Partial failure
//! degrades gracefully: a slide that exhausts its retries is skipped, and
//! the published prefix is never rolled back.
//!
//! ```no_run
//! use deckgen::{EngineSettings, PresentationEngine};
//!
//! # async fn demo() -> Result<(), deckgen::EngineError> {
//! deckgen::logging::init();
//! let engine = PresentationEngine::gemini(EngineSettings::from_env())?;
//! let mut presentation = engine.state().watch_presentation();
//! engine.run_job("Impact of AI on Healthcare").await;
//! println!("{:?}", presentation.borrow_and_update().as_ref().map(|p| p.slides.len()));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;

pub use config::EngineSettings;
pub use engine::progress::{AgentStatus, ProgressState, Step};
pub use engine::provider::{SlideWriter, VisualArtist};
pub use engine::state::SessionState;
pub use engine::types::{
    AspectRatio, ChatMessage, ImageResolution, JobMetadata, Presentation, PresentationOutline,
    Role, SlideContent, SlideData, SlideLayout, SlideOutline, SlideStat, TimelineEvent,
    INITIAL_SUGGESTIONS,
};
pub use engine::PresentationEngine;
pub use error::EngineError;
