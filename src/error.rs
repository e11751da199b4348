use serde::Serialize;

/// Engine-wide error type. Every fallible function returns
/// `Result<T, EngineError>`. Serializes as `{ error, kind }` so observers
/// get structured error payloads.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Plan-stage failure. Fatal to the job: no slide work runs after it.
    #[error("Plan generation failed: {0}")]
    Plan(String),

    /// Per-slide content failure. Recoverable up to the retry budget.
    #[error("Slide generation failed: {0}")]
    SlideGeneration(String),

    /// A content-generation attempt exceeded its time budget.
    #[error("Generation attempt timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Collaborator response was missing or blanked a required field.
    #[error("Collaborator response missing required field: {0}")]
    MissingField(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),
}

impl EngineError {
    /// Stable machine-readable kind tag.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Plan(_) => "plan",
            EngineError::SlideGeneration(_) => "slide_generation",
            EngineError::Timeout { .. } => "timeout",
            EngineError::MissingField(_) => "missing_field",
            EngineError::Http(_) => "http",
            EngineError::Serde(_) => "serde",
            EngineError::Config(_) => "config",
            EngineError::Internal(_) => "internal",
        }
    }
}

impl Serialize for EngineError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("EngineError", 2)?;
        s.serialize_field("error", &self.to_string())?;
        s.serialize_field("kind", self.kind())?;
        s.end()
    }
}
