use serde::{Deserialize, Serialize};

use crate::engine::types::{AspectRatio, ImageResolution};
use crate::error::EngineError;

/// Default text-generation model for plan, slide, and chat calls.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-pro-preview";
/// Default image-generation model for slide visuals.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

/// Engine configuration. The resolution tier is read at job start, so a
/// settings change applies to the next job, not a running one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    pub image_resolution: ImageResolution,
    pub aspect_ratio: AspectRatio,
    pub text_model: String,
    pub image_model: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            image_resolution: ImageResolution::OneK,
            aspect_ratio: AspectRatio::Wide,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            api_key: None,
        }
    }
}

impl EngineSettings {
    /// Load settings from the environment, reading `.env` first if present.
    ///
    /// Recognized variables:
    /// - `GEMINI_API_KEY` (required for the Gemini collaborator)
    /// - `DECKGEN_IMAGE_RESOLUTION` ("1K" | "2K" | "4K", default 1K)
    /// - `DECKGEN_TEXT_MODEL`, `DECKGEN_IMAGE_MODEL` (model overrides)
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut settings = Self::default();
        settings.api_key = std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        if let Ok(res) = std::env::var("DECKGEN_IMAGE_RESOLUTION") {
            settings.image_resolution = ImageResolution::from_setting(&res);
        }
        if let Ok(model) = std::env::var("DECKGEN_TEXT_MODEL") {
            if !model.is_empty() {
                settings.text_model = model;
            }
        }
        if let Ok(model) = std::env::var("DECKGEN_IMAGE_MODEL") {
            if !model.is_empty() {
                settings.image_model = model;
            }
        }
        settings
    }

    /// The API key, or a config error naming the missing variable.
    pub fn require_api_key(&self) -> Result<&str, EngineError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| EngineError::Config("GEMINI_API_KEY is not set".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.image_resolution, ImageResolution::OneK);
        assert_eq!(settings.aspect_ratio, AspectRatio::Wide);
        assert_eq!(settings.text_model, DEFAULT_TEXT_MODEL);
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn test_require_api_key_errors_when_unset() {
        let settings = EngineSettings::default();
        let err = settings.require_api_key().unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_require_api_key_returns_key() {
        let settings = EngineSettings {
            api_key: Some("test-key".into()),
            ..Default::default()
        };
        assert_eq!(settings.require_api_key().unwrap(), "test-key");
    }
}
