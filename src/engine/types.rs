use serde::{Deserialize, Serialize};

/// Initial topic suggestions surfaced to the operator before any job runs.
pub const INITIAL_SUGGESTIONS: [&str; 4] = [
    "The History of Tesla Motors",
    "Impact of AI on Healthcare",
    "Sustainable Urban Planning 2030",
    "The Rise of Space Tourism",
];

// =============================================================================
// Outline (stage 1 output)
// =============================================================================

/// One slide brief from the planner: what the slide should say and how it
/// should look, prior to content generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideOutline {
    pub title: String,
    pub purpose: String,
    pub visual_advice: String,
}

/// The structured plan produced once per job. Immutable after the plan stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationOutline {
    pub topic: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub target_audience: String,
    pub presentation_goal: String,
    pub tone: String,
    pub visual_theme: String,
    pub accent_color: String,
    pub research_context: String,
    pub slides: Vec<SlideOutline>,
}

// =============================================================================
// Slide content (stage 2 output) and published slides
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideStat {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub year: String,
    pub description: String,
}

/// Raw slide content as returned by the text collaborator, before the
/// orchestrator assigns identity, layout, and theme fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideContent {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub content: Vec<String>,
    #[serde(default)]
    pub stats: Option<Vec<SlideStat>>,
    #[serde(default)]
    pub timeline: Option<Vec<TimelineEvent>>,
    #[serde(default)]
    pub design_directive: String,
    pub html_content: String,
    pub image_prompt: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Slide layout tag. Generated slides all carry free-form markup, so there
/// is a single layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideLayout {
    Generative,
}

/// A fully-formed slide in the published presentation.
///
/// Created once content generation for its outline entry succeeds; mutated
/// exactly once more (by id) when its visual resolves. Never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideData {
    pub id: String,
    pub layout: SlideLayout,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub content: Vec<String>,
    #[serde(default)]
    pub stats: Option<Vec<SlideStat>>,
    #[serde(default)]
    pub timeline: Option<Vec<TimelineEvent>>,
    pub design_directive: String,
    pub html_content: String,
    pub image_prompt: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub accent_color: String,
}

impl SlideData {
    /// Promote raw collaborator content into a published slide.
    ///
    /// The id embeds the outline index and a creation timestamp so skipped
    /// entries leave a visible gap rather than renumbering survivors.
    pub fn from_content(content: SlideContent, index: usize, accent_color: &str) -> Self {
        Self {
            id: format!(
                "slide-{}-{}",
                index,
                chrono::Utc::now().timestamp_millis()
            ),
            layout: SlideLayout::Generative,
            title: content.title,
            subtitle: content.subtitle,
            content: content.content,
            stats: content.stats,
            timeline: content.timeline,
            design_directive: content.design_directive,
            html_content: content.html_content,
            image_prompt: content.image_prompt,
            image_url: None,
            notes: content.notes,
            accent_color: accent_color.to_string(),
        }
    }
}

/// The shared, continuously-rendered result of one job. Slides are only
/// ever pushed to the end in outline order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentation {
    pub title: String,
    pub topic: String,
    pub slides: Vec<SlideData>,
}

// =============================================================================
// Transcript
// =============================================================================

/// Transcript author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One transcript entry. Append-only; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: i64,
    /// Links this entry to the live progress card for rendering.
    pub is_agent_status: bool,
}

impl ChatMessage {
    pub fn new(role: Role, text: impl Into<String>, is_agent_status: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            is_agent_status,
        }
    }
}

// =============================================================================
// Image generation settings
// =============================================================================

/// Configured quality tier for generated visuals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageResolution {
    #[default]
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl ImageResolution {
    /// Parse from a settings string. Falls back to 1K if unrecognized.
    pub fn from_setting(s: &str) -> Self {
        match s {
            "2K" => ImageResolution::TwoK,
            "4K" => ImageResolution::FourK,
            _ => ImageResolution::OneK,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageResolution::OneK => "1K",
            ImageResolution::TwoK => "2K",
            ImageResolution::FourK => "4K",
        }
    }
}

/// Aspect ratio of generated visuals. Slides always request Wide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Wide => "16:9",
            AspectRatio::Standard => "4:3",
            AspectRatio::Square => "1:1",
        }
    }
}

// =============================================================================
// Job metadata
// =============================================================================

/// Shared theme context handed to the slide collaborator alongside each
/// outline entry. Derived from the plan once, cloned per slide.
#[derive(Debug, Clone)]
pub struct JobMetadata {
    pub topic: String,
    pub theme: String,
    pub accent_color: String,
    pub tone: String,
}

impl JobMetadata {
    pub fn from_plan(plan: &PresentationOutline) -> Self {
        Self {
            topic: plan.topic.clone(),
            theme: plan.visual_theme.clone(),
            accent_color: plan.accent_color.clone(),
            tone: plan.tone.clone(),
        }
    }
}
