//! Axum route handlers for the AI API.
//!
//! Thin adapters: extract the body, call the `ContentGenerator`, shape the
//! response the frontend expects.

use anyhow::anyhow;
use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::generation::request::{
    AssistantRequest, BlogRequest, GenerationRequest, GenerationResult, ImageRequest,
    QuizQuestion, QuizRequest, TutorRequest,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

/// Blog draft in the shape the blog editor saves.
#[derive(Debug, Serialize)]
pub struct BlogDraftResponse {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub seo_title: String,
    pub seo_description: String,
    pub degraded: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub quiz: Vec<QuizQuestion>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub url: String,
    pub prompt: String,
}

/// The generator answered a request with another task's result.
fn mismatched(expected: &str, result: &GenerationResult) -> AppError {
    AppError::Internal(anyhow!(
        "{expected} request produced a {} result",
        result.task()
    ))
}

/// Lowercase topic with spaces turned into dashes.
fn slugify(topic: &str) -> String {
    topic.trim().to_lowercase().replace(' ', "-")
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /ai/generate-blog
pub async fn handle_generate_blog(
    State(state): State<AppState>,
    Json(request): Json<BlogRequest>,
) -> Result<Json<BlogDraftResponse>, AppError> {
    let slug = slugify(&request.topic);
    let blog = match state.generator.generate(GenerationRequest::Blog(request)).await? {
        GenerationResult::Blog(blog) => blog,
        other => return Err(mismatched("blog", &other)),
    };

    Ok(Json(BlogDraftResponse {
        title: blog.title,
        slug,
        content: blog.content,
        category: "AI Generated".to_string(),
        tags: vec!["AI".to_string()],
        seo_title: blog.seo_title,
        seo_description: blog.seo_description,
        degraded: blog.degraded,
    }))
}

/// POST /ai/tutor
pub async fn handle_tutor(
    State(state): State<AppState>,
    Json(request): Json<TutorRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    match state.generator.generate(GenerationRequest::Tutor(request)).await? {
        GenerationResult::Tutor(response) => Ok(Json(ChatResponse { response })),
        other => Err(mismatched("tutor", &other)),
    }
}

/// POST /ai/assistant
pub async fn handle_assistant(
    State(state): State<AppState>,
    Json(request): Json<AssistantRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    match state.generator.generate(GenerationRequest::Assistant(request)).await? {
        GenerationResult::Assistant(response) => Ok(Json(ChatResponse { response })),
        other => Err(mismatched("assistant", &other)),
    }
}

/// POST /ai/generate-quiz
pub async fn handle_generate_quiz(
    State(state): State<AppState>,
    Json(request): Json<QuizRequest>,
) -> Result<Json<QuizResponse>, AppError> {
    match state.generator.generate(GenerationRequest::Quiz(request)).await? {
        GenerationResult::Quiz(quiz) => Ok(Json(QuizResponse { quiz })),
        other => Err(mismatched("quiz", &other)),
    }
}

/// POST /ai/generate-image
///
/// Returns 502 with the failure message when prompt enhancement fails.
pub async fn handle_generate_image(
    State(state): State<AppState>,
    Json(request): Json<ImageRequest>,
) -> Result<Json<ImageResponse>, AppError> {
    match state.generator.generate(GenerationRequest::Image(request)).await? {
        GenerationResult::Image(image) => Ok(Json(ImageResponse {
            url: image.rendered_url,
            prompt: image.enhanced_prompt,
        })),
        other => Err(mismatched("image", &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_result_is_internal_error() {
        let err = mismatched("quiz", &GenerationResult::Tutor("hi".to_string()));
        match err {
            AppError::Internal(e) => {
                assert_eq!(e.to_string(), "quiz request produced a tutor result")
            }
            other => panic!("expected internal error, got {other:?}"),
        }
    }

    #[test]
    fn test_slugify_lowercases_and_dashes() {
        assert_eq!(slugify("Intro to Machine Learning"), "intro-to-machine-learning");
        assert_eq!(slugify("  Rust  "), "rust");
    }
}
