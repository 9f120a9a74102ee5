pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::generation::handlers;
use crate::state::AppState;

async fn not_found() -> AppError {
    AppError::NotFound("No such route".to_string())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // AI content API
        .route("/ai/generate-blog", post(handlers::handle_generate_blog))
        .route("/ai/tutor", post(handlers::handle_tutor))
        .route("/ai/assistant", post(handlers::handle_assistant))
        .route("/ai/generate-quiz", post(handlers::handle_generate_quiz))
        .route("/ai/generate-image", post(handlers::handle_generate_image))
        .fallback(not_found)
        .with_state(state)
}
