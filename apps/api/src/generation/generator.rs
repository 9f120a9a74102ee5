//! Generation Orchestrators: one entry point per task.
//!
//! Flow: validate → compose → complete → normalize (JSON tasks) → result.
//!
//! Content tasks (blog, tutor, assistant, quiz) never return an upstream or
//! parse failure: each attempt yields `Result<_, GenerationFailure>` and the
//! `Err` branch maps to that task's fallback. Only `AppError::Validation`
//! escapes, and it is raised before any upstream call. Image generation is
//! the exception; see `generation::image`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::generation::composer::{ComposedPrompt, PromptComposer};
use crate::generation::normalizer::{normalize_object, normalize_quiz, NormalizeError};
use crate::generation::prompts::QUIZ_OPTION_COUNT;
use crate::generation::request::{
    BlogRequest, BlogResult, GenerationRequest, GenerationResult, QuizQuestion,
};
use crate::llm_client::{CompletionProvider, LlmError};

/// Placeholder used for every field of the synthetic quiz question.
pub const QUIZ_PLACEHOLDER: &str = "-";

/// Why a generation attempt produced nothing usable.
#[derive(Debug, Error)]
pub enum GenerationFailure {
    #[error("{0}")]
    Upstream(#[from] LlmError),

    #[error("{0}")]
    Parse(#[from] NormalizeError),
}

/// Where the image pipeline points its URLs.
#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub origin: String,
    pub width: u32,
    pub height: u32,
}

/// Holds the completion capability and composes prompts for every task.
///
/// Built once at startup and carried in `AppState`. It has no mutable state,
/// so concurrent calls cannot observe each other.
#[derive(Clone)]
pub struct ContentGenerator {
    llm: Arc<dyn CompletionProvider>,
    composer: PromptComposer,
    pub(crate) image: ImageSettings,
}

impl ContentGenerator {
    pub fn new(llm: Arc<dyn CompletionProvider>, image: ImageSettings) -> Self {
        Self {
            composer: PromptComposer::new(&image.origin),
            llm,
            image,
        }
    }

    pub fn from_config(llm: Arc<dyn CompletionProvider>, config: &Config) -> Self {
        Self::new(
            llm,
            ImageSettings {
                origin: config.image_origin.clone(),
                width: config.image_width,
                height: config.image_height,
            },
        )
    }

    /// Runs one generation task end to end.
    ///
    /// The request is validated and composed exactly once, then handed to the
    /// task's orchestrator. Validation errors return before any upstream call.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult, AppError> {
        request.validate()?;
        let prompt = self.composer.compose(&request);

        let result = match request {
            GenerationRequest::Blog(r) => {
                GenerationResult::Blog(self.generate_blog(&r, &prompt).await)
            }
            GenerationRequest::Tutor(_) => {
                GenerationResult::Tutor(self.chat_reply(&prompt, "AI Tutor").await)
            }
            GenerationRequest::Assistant(_) => {
                GenerationResult::Assistant(self.chat_reply(&prompt, "AI Assistant").await)
            }
            GenerationRequest::Quiz(_) => GenerationResult::Quiz(self.generate_quiz(&prompt).await),
            GenerationRequest::Image(r) => {
                GenerationResult::Image(self.generate_image(&r, &prompt).await?)
            }
        };
        Ok(result)
    }

    pub(crate) async fn complete(
        &self,
        prompt: &ComposedPrompt,
        json_mode: bool,
    ) -> Result<String, LlmError> {
        self.llm
            .complete(&prompt.system_prompt, &prompt.turns, json_mode)
            .await
    }

    // ────────────────────────────────────────────────────────────────────────
    // Blog
    // ────────────────────────────────────────────────────────────────────────

    async fn generate_blog(&self, request: &BlogRequest, prompt: &ComposedPrompt) -> BlogResult {
        match self.draft_blog(request, prompt).await {
            Ok(result) => {
                info!("Generated blog post '{}'", result.title);
                result
            }
            Err(failure) => {
                warn!(
                    "Blog generation for '{}' degraded: {failure}",
                    request.topic.trim()
                );
                blog_fallback(request, &failure)
            }
        }
    }

    async fn draft_blog(
        &self,
        request: &BlogRequest,
        prompt: &ComposedPrompt,
    ) -> Result<BlogResult, GenerationFailure> {
        let raw = self.complete(prompt, true).await?;
        let object = normalize_object(&raw, &blog_defaults(request))?;
        let draft: BlogDraft =
            serde_json::from_value(Value::Object(object)).map_err(NormalizeError::from)?;

        Ok(BlogResult {
            title: draft.title,
            content: draft.content,
            seo_title: draft.seo_title,
            seo_description: draft.seo_description,
            degraded: false,
        })
    }

    // ────────────────────────────────────────────────────────────────────────
    // Chat turns
    // ────────────────────────────────────────────────────────────────────────

    /// History is only read. On failure the reply itself states the error.
    async fn chat_reply(&self, prompt: &ComposedPrompt, label: &str) -> String {
        match self.complete(prompt, false).await {
            Ok(reply) => reply,
            Err(e) => {
                let failure = GenerationFailure::from(e);
                warn!("{label} reply degraded: {failure}");
                chat_fallback(label, &failure)
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Quiz
    // ────────────────────────────────────────────────────────────────────────

    async fn generate_quiz(&self, prompt: &ComposedPrompt) -> Vec<QuizQuestion> {
        match self.draft_quiz(prompt).await {
            Ok(questions) => {
                info!("Generated quiz with {} questions", questions.len());
                questions
            }
            Err(failure) => {
                warn!("Quiz generation degraded: {failure}");
                quiz_fallback(&failure)
            }
        }
    }

    async fn draft_quiz(
        &self,
        prompt: &ComposedPrompt,
    ) -> Result<Vec<QuizQuestion>, GenerationFailure> {
        let raw = self.complete(prompt, true).await?;
        Ok(normalize_quiz(&raw)?)
    }
}

#[derive(Debug, Deserialize)]
struct BlogDraft {
    title: String,
    content: String,
    seo_title: String,
    seo_description: String,
}

/// Back-fill values for keys the model leaves out.
fn blog_defaults(request: &BlogRequest) -> Vec<(&'static str, String)> {
    let topic = request.topic.trim();
    let difficulty = request.difficulty.trim();
    vec![
        ("title", format!("Mastering {topic}")),
        (
            "content",
            format!("# {topic}\n\nThis is a {difficulty} level guide to {topic}."),
        ),
        ("seo_title", format!("Guide to {topic}")),
        ("seo_description", format!("Learn about {topic}.")),
    ]
}

fn blog_fallback(request: &BlogRequest, failure: &GenerationFailure) -> BlogResult {
    let topic = request.topic.trim();
    let difficulty = request.difficulty.trim();
    BlogResult {
        title: format!("Mastering {topic} (Draft)"),
        content: format!(
            "# {topic}\n\n[Generation failed: {failure}]\n\nThis is a {difficulty} level guide to {topic}..."
        ),
        seo_title: format!("Guide to {topic}"),
        seo_description: format!("Learn about {topic}."),
        degraded: true,
    }
}

fn chat_fallback(label: &str, failure: &GenerationFailure) -> String {
    format!("Error connecting to {label}: {failure}")
}

/// Single synthetic question so callers always get a list of 4-option questions.
fn quiz_fallback(failure: &GenerationFailure) -> Vec<QuizQuestion> {
    vec![QuizQuestion {
        question: format!("Error: {failure}"),
        options: vec![QUIZ_PLACEHOLDER.to_string(); QUIZ_OPTION_COUNT],
        answer: QUIZ_PLACEHOLDER.to_string(),
    }]
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
