//! Gemini REST collaborator — the concrete `SlideWriter` and `VisualArtist`.
//!
//! All text calls use `generateContent` with a JSON response mime type and a
//! response schema, so the model's reply parses directly into the domain
//! types. The image call degrades internally: any failure returns the fixed
//! placeholder reference instead of an error.

use async_trait::async_trait;
use serde_json::{json, Value};
use url::Url;

use crate::config::EngineSettings;
use crate::engine::markup::{FALLBACK_IMAGE_URL, SLIDE_IMAGE_TOKEN};
use crate::engine::types::{
    AspectRatio, ChatMessage, ImageResolution, JobMetadata, PresentationOutline, SlideContent,
    SlideOutline,
};
use crate::error::EngineError;

/// Default Gemini API root.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Gemini REST client. One instance serves both collaborator roles.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(settings: &EngineSettings) -> Result<Self, EngineError> {
        let api_key = settings.require_api_key()?.to_string();
        let base_url = Url::parse(GEMINI_API_BASE)
            .map_err(|e| EngineError::Config(format!("Invalid API base URL: {}", e)))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
            text_model: settings.text_model.clone(),
            image_model: settings.image_model.clone(),
        })
    }

    /// Override the API base URL (local proxies, test servers).
    pub fn with_base_url(mut self, base: &str) -> Result<Self, EngineError> {
        self.base_url = Url::parse(base)
            .map_err(|e| EngineError::Config(format!("Invalid API base URL: {}", e)))?;
        Ok(self)
    }

    fn endpoint(&self, model: &str) -> Result<Url, EngineError> {
        self.base_url
            .join(&format!("models/{}:generateContent", model))
            .map_err(|e| EngineError::Config(format!("Invalid model endpoint: {}", e)))
    }

    async fn generate_content(&self, model: &str, body: Value) -> Result<Value, EngineError> {
        let url = self.endpoint(model)?;
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

// =============================================================================
// Response picking
// =============================================================================

/// Concatenated text parts of the first candidate, if any.
fn extract_text(response: &Value) -> Option<String> {
    let parts = response.pointer("/candidates/0/content/parts")?.as_array()?;
    let mut out = String::new();
    for part in parts {
        if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
            out.push_str(text);
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// First inline image of the first candidate as a data URI, if any.
fn extract_inline_image(response: &Value) -> Option<String> {
    let parts = response.pointer("/candidates/0/content/parts")?.as_array()?;
    for part in parts {
        if let Some(inline) = part.get("inlineData") {
            let mime = inline.get("mimeType").and_then(|m| m.as_str())?;
            let data = inline.get("data").and_then(|d| d.as_str())?;
            return Some(format!("data:{};base64,{}", mime, data));
        }
    }
    None
}

/// Reject slide content whose required fields are missing or blank.
fn validate_slide_content(content: &SlideContent) -> Result<(), EngineError> {
    if content.title.trim().is_empty() {
        return Err(EngineError::MissingField("title"));
    }
    if content.content.is_empty() {
        return Err(EngineError::MissingField("content"));
    }
    if content.image_prompt.trim().is_empty() {
        return Err(EngineError::MissingField("imagePrompt"));
    }
    if content.html_content.trim().is_empty() {
        return Err(EngineError::MissingField("htmlContent"));
    }
    Ok(())
}

/// Append the photorealistic qualifier suffix unless the prompt already
/// carries one.
fn enhance_image_prompt(prompt: &str) -> String {
    let lower = prompt.to_lowercase();
    if lower.contains("8k") || lower.contains("photorealistic") {
        prompt.to_string()
    } else {
        format!(
            "{}, 8k, photorealistic, cinematic lighting, highly detailed, trending on artstation",
            prompt
        )
    }
}

// =============================================================================
// Prompts and response schemas
// =============================================================================

fn plan_prompt(topic: &str) -> String {
    format!(
        r#"Role: Senior Creative Director & Strategist.

Your Goal: Design the narrative and VISUAL DIRECTION for a presentation on "{topic}".

**Phase 1: Strategy**
1. Define Audience, Goal, and Tone.
2. Choose a sophisticated 'visualTheme' (e.g., "Swiss Minimalist", "Cyberpunk Data", "Editorial Fashion", "Corporate Clean", "Neo-Brutalism").
3. Select a distinct 'accentColor' hex code that matches the theme.

**Phase 2: The Outline (Art Direction)**
Create 6-8 slides. For each slide, you provide the 'visualAdvice'.

**CRITICAL - VISUAL ADVICE GUIDE**:
Do NOT ask for standard layouts. Describe the scene like a movie director or magazine editor.
Examples of 'visualAdvice':
- "Split screen. Left side is deep black with massive white typography. Right side is the image."
- "A floating glass card in the center containing data, over a blurred full-screen background."
- "Typography driven. Huge letters filling the screen, accent color used sparingly for lines."
- "Grid layout with 4 distinct quadrants, highly structured, thin borders."

Output JSON."#
    )
}

fn plan_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "topic": { "type": "STRING" },
            "title": { "type": "STRING" },
            "subtitle": { "type": "STRING" },
            "targetAudience": { "type": "STRING" },
            "presentationGoal": { "type": "STRING" },
            "tone": { "type": "STRING" },
            "visualTheme": { "type": "STRING" },
            "accentColor": { "type": "STRING" },
            "researchContext": { "type": "STRING" },
            "slides": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "purpose": { "type": "STRING" },
                        "visualAdvice": {
                            "type": "STRING",
                            "description": "Description of the composition, layout, and visual vibe for the designer."
                        }
                    },
                    "required": ["title", "purpose", "visualAdvice"]
                }
            }
        },
        "required": [
            "topic", "title", "slides", "researchContext", "targetAudience",
            "presentationGoal", "tone", "visualTheme", "accentColor"
        ]
    })
}

fn slide_prompt(outline: &SlideOutline, index: usize, meta: &JobMetadata) -> String {
    format!(
        r#"Role: Expert Frontend Developer & UI Designer.

**Project Context**:
Topic: "{topic}"
Theme: "{theme}"
Tone: "{tone}"
Accent Color: "{accent}"

**Current Task**: Design Slide #{number}.

**Slide Brief (from Art Director)**:
Title: "{title}"
Purpose: "{purpose}"
Visual Direction: "{advice}"

**HTML/CSS RULES**:
1. **Container**: Root element MUST be `<div class="w-[1280px] h-[720px] overflow-hidden relative ...">`.
2. **Styling**: Tailwind CSS only. Use specific pixel values or % for layout to fit 1280x720 exactly.
3. **Images**: If the slide needs an image, use `<img>` with `src="{token}"` and `class="object-cover ..."`.
4. **Typography**: Use 'font-sans' (Inter). Use bold, massive typography for impact.
5. **Colors**: Use the accent color "{accent}" intelligently.

Output JSON containing the content data and the 'htmlContent'."#,
        topic = meta.topic,
        theme = meta.theme,
        tone = meta.tone,
        accent = meta.accent_color,
        number = index + 1,
        title = outline.title,
        purpose = outline.purpose,
        advice = outline.visual_advice,
        token = SLIDE_IMAGE_TOKEN,
    )
}

fn slide_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "subtitle": { "type": "STRING" },
            "content": { "type": "ARRAY", "items": { "type": "STRING" } },
            "imagePrompt": { "type": "STRING" },
            "htmlContent": {
                "type": "STRING",
                "description": "The complete raw HTML string for this slide (1280x720 div)"
            },
            "designDirective": { "type": "STRING" },
            "stats": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "value": { "type": "STRING" },
                        "label": { "type": "STRING" }
                    }
                }
            }
        },
        "required": ["title", "content", "imagePrompt", "htmlContent"]
    })
}

// =============================================================================
// Collaborator impls
// =============================================================================

#[async_trait]
impl super::SlideWriter for GeminiClient {
    async fn generate_plan(&self, topic: &str) -> Result<PresentationOutline, EngineError> {
        tracing::info!(topic = %topic, model = %self.text_model, "Requesting presentation plan");

        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": plan_prompt(topic) }] }],
            "tools": [{ "googleSearch": {} }],
            "generationConfig": {
                "thinkingConfig": { "thinkingBudget": 2048 },
                "responseMimeType": "application/json",
                "responseSchema": plan_response_schema(),
            }
        });

        let response = self
            .generate_content(&self.text_model, body)
            .await
            .map_err(|e| EngineError::Plan(e.to_string()))?;
        let text = extract_text(&response)
            .ok_or_else(|| EngineError::Plan("No text response from planner".into()))?;
        let plan: PresentationOutline = serde_json::from_str(&text)
            .map_err(|e| EngineError::Plan(format!("Malformed outline: {}", e)))?;
        if plan.slides.is_empty() {
            return Err(EngineError::Plan("Outline contained no slides".into()));
        }

        tracing::info!(
            theme = %plan.visual_theme,
            tone = %plan.tone,
            slides = plan.slides.len(),
            "Plan received",
        );
        Ok(plan)
    }

    async fn generate_slide(
        &self,
        outline: &SlideOutline,
        index: usize,
        meta: &JobMetadata,
    ) -> Result<SlideContent, EngineError> {
        tracing::debug!(slide = index + 1, title = %outline.title, "Requesting slide content");

        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": slide_prompt(outline, index, meta) }] }],
            "generationConfig": {
                // Lower budget than the plan call for per-slide speed.
                "thinkingConfig": { "thinkingBudget": 1024 },
                "responseMimeType": "application/json",
                "responseSchema": slide_response_schema(),
            }
        });

        let response = self
            .generate_content(&self.text_model, body)
            .await
            .map_err(|e| EngineError::SlideGeneration(e.to_string()))?;
        let text = extract_text(&response)
            .ok_or_else(|| EngineError::SlideGeneration("No text response from designer".into()))?;
        let content: SlideContent = serde_json::from_str(&text)
            .map_err(|e| EngineError::SlideGeneration(format!("Malformed slide content: {}", e)))?;
        validate_slide_content(&content)?;
        Ok(content)
    }

    async fn chat(
        &self,
        history: &[ChatMessage],
        message: &str,
        presentation_json: &str,
    ) -> Result<String, EngineError> {
        let system_instruction = format!(
            "You are a helpful presentation assistant. \
             You have access to the current presentation content in JSON format: {}. \
             Help the user refine the content, answer questions about the topic, or suggest improvements. \
             Keep answers concise and helpful.",
            presentation_json
        );

        let mut contents: Vec<Value> = history
            .iter()
            .map(|m| {
                json!({
                    "role": m.role.as_str(),
                    "parts": [{ "text": m.text }]
                })
            })
            .collect();
        contents.push(json!({ "role": "user", "parts": [{ "text": message }] }));

        let body = json!({
            "systemInstruction": { "parts": [{ "text": system_instruction }] },
            "contents": contents,
        });

        let response = self.generate_content(&self.text_model, body).await?;
        Ok(extract_text(&response)
            .unwrap_or_else(|| "I couldn't generate a response.".to_string()))
    }
}

#[async_trait]
impl super::VisualArtist for GeminiClient {
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        resolution: ImageResolution,
    ) -> String {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": enhance_image_prompt(prompt) }] }],
            "generationConfig": {
                "imageConfig": {
                    "aspectRatio": aspect_ratio.as_str(),
                    "imageSize": resolution.as_str(),
                }
            }
        });

        match self.generate_content(&self.image_model, body).await {
            Ok(response) => match extract_inline_image(&response) {
                Some(data_uri) => data_uri,
                None => {
                    tracing::warn!("Image response carried no inline data, using placeholder");
                    FALLBACK_IMAGE_URL.to_string()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Image generation failed, using placeholder");
                FALLBACK_IMAGE_URL.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_concatenates_parts() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] }
            }]
        });
        assert_eq!(extract_text(&response).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_extract_text_empty_candidates() {
        assert!(extract_text(&json!({ "candidates": [] })).is_none());
        assert!(extract_text(&json!({})).is_none());
    }

    #[test]
    fn test_extract_inline_image_builds_data_uri() {
        let response = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "here is your image" },
                        { "inlineData": { "mimeType": "image/png", "data": "QUJD" } }
                    ]
                }
            }]
        });
        assert_eq!(
            extract_inline_image(&response).unwrap(),
            "data:image/png;base64,QUJD"
        );
    }

    #[test]
    fn test_extract_inline_image_absent() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": "no image" }] } }]
        });
        assert!(extract_inline_image(&response).is_none());
    }

    #[test]
    fn test_enhance_prompt_appends_qualifiers() {
        let enhanced = enhance_image_prompt("a city skyline at dusk");
        assert!(enhanced.starts_with("a city skyline at dusk,"));
        assert!(enhanced.contains("photorealistic"));
    }

    #[test]
    fn test_enhance_prompt_keeps_already_qualified() {
        let prompt = "a city skyline, 8K render";
        assert_eq!(enhance_image_prompt(prompt), prompt);
        let prompt = "Photorealistic forest";
        assert_eq!(enhance_image_prompt(prompt), prompt);
    }

    #[test]
    fn test_validate_rejects_blank_required_fields() {
        let mut content = SlideContent {
            title: "T".into(),
            subtitle: None,
            content: vec!["p".into()],
            stats: None,
            timeline: None,
            design_directive: String::new(),
            html_content: "<div></div>".into(),
            image_prompt: "prompt".into(),
            notes: None,
        };
        assert!(validate_slide_content(&content).is_ok());

        content.html_content = "   ".into();
        match validate_slide_content(&content).unwrap_err() {
            EngineError::MissingField(f) => assert_eq!(f, "htmlContent"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_slide_prompt_embeds_brief_and_token() {
        let outline = SlideOutline {
            title: "Opening".into(),
            purpose: "Hook the audience".into(),
            visual_advice: "Split screen".into(),
        };
        let meta = JobMetadata {
            topic: "AI".into(),
            theme: "Swiss Minimalist".into(),
            accent_color: "#2563eb".into(),
            tone: "Confident".into(),
        };
        let prompt = slide_prompt(&outline, 0, &meta);
        assert!(prompt.contains("Design Slide #1"));
        assert!(prompt.contains("Split screen"));
        assert!(prompt.contains(SLIDE_IMAGE_TOKEN));
        assert!(prompt.contains("#2563eb"));
    }

    #[test]
    fn test_plan_schema_requires_accent_color() {
        let schema = plan_response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert!(required.contains(&"accentColor"));
        assert!(required.contains(&"slides"));
    }

    #[test]
    fn test_endpoint_joins_model_path() {
        let settings = EngineSettings {
            api_key: Some("k".into()),
            ..Default::default()
        };
        let client = GeminiClient::new(&settings).unwrap();
        let url = client.endpoint("gemini-3-pro-preview").unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-pro-preview:generateContent"
        );
    }
}
