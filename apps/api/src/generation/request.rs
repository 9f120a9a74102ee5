//! Request and result value types for every generation task.
//!
//! Requests double as the HTTP bodies, so field names follow the public API.
//! `validate()` enforces the request invariants before any upstream call.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::prompts::DEFAULT_ASSISTANT_PROMPT;
use crate::models::conversation::ConversationHistory;

// ────────────────────────────────────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct BlogRequest {
    pub topic: String,
    pub difficulty: String,
    /// Target length in words. Must be > 0.
    pub word_count: u32,
    pub include_code: bool,
    #[serde(default)]
    pub include_diagrams: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TutorRequest {
    pub message: String,
    #[serde(default)]
    pub history: ConversationHistory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantRequest {
    pub message: String,
    #[serde(default)]
    pub history: ConversationHistory,
    /// Base instruction. Style rules are appended to it, never substituted for it.
    #[serde(default = "default_assistant_prompt")]
    pub system_prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizRequest {
    /// Source material the questions are drawn from.
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageRequest {
    /// Short user prompt, enhanced by the LLM before rendering.
    pub prompt: String,
}

fn default_assistant_prompt() -> String {
    DEFAULT_ASSISTANT_PROMPT.to_string()
}

/// One variant per task.
#[derive(Debug, Clone)]
pub enum GenerationRequest {
    Blog(BlogRequest),
    Tutor(TutorRequest),
    Assistant(AssistantRequest),
    Quiz(QuizRequest),
    Image(ImageRequest),
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl BlogRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("topic", &self.topic)?;
        require_text("difficulty", &self.difficulty)?;
        if self.word_count == 0 {
            return Err(AppError::Validation(
                "word_count must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl TutorRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("message", &self.message)
    }
}

impl AssistantRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("message", &self.message)?;
        require_text("system_prompt", &self.system_prompt)
    }
}

impl QuizRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("content", &self.content)
    }
}

impl ImageRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("prompt", &self.prompt)
    }
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            GenerationRequest::Blog(r) => r.validate(),
            GenerationRequest::Tutor(r) => r.validate(),
            GenerationRequest::Assistant(r) => r.validate(),
            GenerationRequest::Quiz(r) => r.validate(),
            GenerationRequest::Image(r) => r.validate(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Results
// ────────────────────────────────────────────────────────────────────────────

/// Generated blog post. `degraded` is true only when the upstream call or the
/// parse failed and a synthetic post was substituted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogResult {
    pub title: String,
    /// Markdown.
    pub content: String,
    pub seo_title: String,
    pub seo_description: String,
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageResult {
    pub rendered_url: String,
    pub enhanced_prompt: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Blog(BlogResult),
    Tutor(String),
    Assistant(String),
    Quiz(Vec<QuizQuestion>),
    Image(ImageResult),
}

impl GenerationResult {
    pub fn task(&self) -> &'static str {
        match self {
            GenerationResult::Blog(_) => "blog",
            GenerationResult::Tutor(_) => "tutor",
            GenerationResult::Assistant(_) => "assistant",
            GenerationResult::Quiz(_) => "quiz",
            GenerationResult::Image(_) => "image",
        }
    }
}
